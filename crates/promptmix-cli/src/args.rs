use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "promptmix")]
#[command(about = "Randomized prompt assembly from curated concept lists")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.promptmix)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sample concepts of one kind through the blacklist
    Sample {
        /// Concept kind (e.g., concepts, locations, dress, art-styles)
        kind: String,

        /// Minimum number of concepts
        #[arg(short, long, default_value = "1")]
        low: usize,

        /// Maximum number of concepts
        #[arg(short = 'H', long, default_value = "3")]
        high: usize,

        /// Scale both bounds (0 disables the kind)
        #[arg(short, long, default_value = "1.0")]
        multiplier: f64,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Build random phrases from the background dictionary
    Words {
        /// Minimum number of words
        #[arg(short, long, default_value = "1")]
        low: usize,

        /// Maximum number of words
        #[arg(short = 'H', long, default_value = "5")]
        high: usize,

        /// Scale both bounds (0 disables random words)
        #[arg(short, long, default_value = "1.0")]
        multiplier: f64,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// List concept categories and their files
    Categories,

    /// Manage the blacklist
    Blacklist {
        #[command(subcommand)]
        action: BlacklistAction,
    },

    /// Edit concept list files
    Concept {
        #[command(subcommand)]
        action: ConceptAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum BlacklistAction {
    /// List blacklist entries
    List,

    /// Add an entry (replaces an entry with the same pattern)
    Add {
        /// Pattern text
        pattern: String,

        /// Treat the pattern as a glob (`*` wildcard)
        #[arg(short, long)]
        regex: bool,

        /// Match anywhere, not only at word starts
        #[arg(long)]
        no_word_boundary: bool,

        /// Add the entry disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Remove an entry
    Remove {
        /// Pattern text (case-insensitive)
        pattern: String,
    },

    /// Enable an entry
    Enable {
        /// Pattern text (case-insensitive)
        pattern: String,
    },

    /// Disable an entry (keep it but don't match)
    Disable {
        /// Pattern text (case-insensitive)
        pattern: String,
    },

    /// Remove all entries
    Clear,

    /// Import entries from a .txt, .csv or .json file
    Import {
        /// File to import
        path: PathBuf,
    },

    /// Export entries (to stdout unless a path is given)
    Export {
        /// Output file; the format follows its extension
        path: Option<PathBuf>,

        /// Format for stdout output (txt, csv, json)
        #[arg(short, long, default_value = "txt")]
        format: String,
    },

    /// Report which tags of a comma-separated prompt are blacklisted
    Check {
        /// Prompt text
        text: String,
    },
}

#[derive(Subcommand)]
pub enum ConceptAction {
    /// Insert concepts into a list, keeping comments and order
    Add {
        /// List file name in the concepts directory (e.g., animals.txt)
        file: String,

        /// Concepts to add
        #[arg(required = true)]
        concepts: Vec<String>,
    },

    /// Remove concepts from a list
    Remove {
        /// List file name in the concepts directory
        file: String,

        /// Concepts to remove
        #[arg(required = true)]
        concepts: Vec<String>,
    },

    /// Show the concepts of a list, or every list file when none is given
    List {
        /// List file name in the concepts directory
        file: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., concepts.categories)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., phrases.max_attempts)
        key: String,

        /// Value to set (e.g., "SFW,NSFW" or "[SFW, Art Styles]")
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}
