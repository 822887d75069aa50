use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use promptmix_core::concepts::{ConceptFile, ConceptFileEditor, ConceptKind, BUILTIN_CATEGORIES};
use promptmix_core::{
    BlacklistFormat, BlacklistItem, BlacklistRegistry, ConceptGenerator, Config, PromptMixError,
    Result, Sampler,
};

mod args;
use args::{BlacklistAction, Cli, Commands, ConceptAction, ConfigAction, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.base_dir);
    debug!(base_dir = %base_dir.display(), "resolved base directory");

    let result = match cli.command {
        Some(Commands::Sample {
            kind,
            low,
            high,
            multiplier,
            seed,
            json,
        }) => handle_sample(&base_dir, &kind, low, high, multiplier, seed, json),
        Some(Commands::Words {
            low,
            high,
            multiplier,
            seed,
            json,
        }) => handle_words(&base_dir, low, high, multiplier, seed, json),
        Some(Commands::Categories) => handle_categories(&base_dir),
        Some(Commands::Blacklist { action }) => handle_blacklist(action, &base_dir),
        Some(Commands::Concept { action }) => handle_concept(action, &base_dir),
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "promptmix", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("PROMPTMIX_BASE") {
        return PathBuf::from(base);
    }

    Config::default_base_dir().unwrap_or_else(|_| PathBuf::from(".promptmix"))
}

fn new_sampler(seed: Option<u64>) -> Sampler {
    seed.map(Sampler::seeded).unwrap_or_default()
}

fn print_concepts(concepts: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(concepts)?);
    } else {
        println!("{}", concepts.join(", "));
    }
    Ok(())
}

fn handle_sample(
    base_dir: &Path,
    kind: &str,
    low: usize,
    high: usize,
    multiplier: f64,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let kind: ConceptKind = kind.parse()?;
    let config = Config::load(base_dir)?;
    let store = config.open_store(base_dir)?;
    let registry = BlacklistRegistry::load(base_dir)?;

    let mut generator = ConceptGenerator::new(&store, &registry).with_sampler(new_sampler(seed));
    let concepts = generator.get(kind, low, high, multiplier)?;
    print_concepts(&concepts, json)
}

fn handle_words(
    base_dir: &Path,
    low: usize,
    high: usize,
    multiplier: f64,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let store = config.open_store(base_dir)?;
    let registry = BlacklistRegistry::load(base_dir)?;

    let mut generator = ConceptGenerator::new(&store, &registry)
        .with_sampler(new_sampler(seed))
        .with_phrase_settings(config.phrase_settings());
    let phrases = generator.get_random_words(low, high, multiplier)?;
    print_concepts(&phrases, json)
}

fn handle_categories(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir)?;

    println!();
    for category in BUILTIN_CATEGORIES {
        let enabled = config
            .concepts
            .categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category.name));
        let marker = if enabled {
            "[on] ".green()
        } else {
            "[off]".dimmed()
        };
        println!(
            "{} {} - {}",
            marker,
            category.name.cyan().bold(),
            category.description
        );
        for source in category.sources {
            let weight = source
                .weight
                .map(|w| format!(" (weight {})", w))
                .unwrap_or_default();
            println!(
                "      {:<13} {}{}",
                source.kind.as_str(),
                source.file,
                weight.dimmed()
            );
        }
    }
    println!();
    Ok(())
}

fn handle_blacklist(action: BlacklistAction, base_dir: &Path) -> Result<()> {
    let mut registry = BlacklistRegistry::load(base_dir)?;

    match action {
        BlacklistAction::List => {
            if registry.is_empty() {
                println!("{}", "Blacklist is empty".yellow());
                return Ok(());
            }
            println!();
            for item in registry.items() {
                let mut flags = Vec::new();
                if item.use_regex() {
                    flags.push("glob");
                }
                if !item.use_word_boundary() {
                    flags.push("anywhere");
                }
                let pattern = if item.is_enabled() {
                    item.pattern().normal()
                } else {
                    item.pattern().dimmed()
                };
                if flags.is_empty() {
                    println!("  {}", pattern);
                } else {
                    println!("  {} {}", pattern, format!("[{}]", flags.join(", ")).cyan());
                }
            }
            println!();
            println!("{} {} entries", "Total:".bold(), registry.len());
        }
        BlacklistAction::Add {
            pattern,
            regex,
            no_word_boundary,
            disabled,
        } => {
            let item = BlacklistItem::with_flags(&pattern, !disabled, regex, !no_word_boundary);
            registry.add(item);
            registry.save(base_dir)?;
            println!("{} {}", "Added:".green(), pattern);
        }
        BlacklistAction::Remove { pattern } => {
            match registry.remove(&pattern) {
                Some(item) => {
                    registry.save(base_dir)?;
                    println!("{} {}", "Removed:".green(), item.pattern());
                }
                None => println!("{} {}", "Not found:".yellow(), pattern),
            }
        }
        BlacklistAction::Enable { pattern } => {
            toggle(&mut registry, base_dir, &pattern, true)?;
        }
        BlacklistAction::Disable { pattern } => {
            toggle(&mut registry, base_dir, &pattern, false)?;
        }
        BlacklistAction::Clear => {
            let count = registry.len();
            registry.clear();
            registry.save(base_dir)?;
            println!("{} {} entries", "Cleared:".green(), count);
        }
        BlacklistAction::Import { path } => {
            let count = registry.import_file(&path)?;
            registry.save(base_dir)?;
            println!(
                "{} {} new entries from {}",
                "Imported:".green(),
                count,
                path.display()
            );
        }
        BlacklistAction::Export { path, format } => match path {
            Some(path) => {
                registry.export_file(&path)?;
                println!("{} {}", "Exported:".green(), path.display());
            }
            None => {
                let format: BlacklistFormat = format.parse()?;
                print!("{}", registry.export(format)?);
            }
        },
        BlacklistAction::Check { text } => {
            let violations = registry.find_violations(&text);
            if violations.is_empty() {
                println!("{}", "No blacklisted tags".green());
                return Ok(());
            }
            let mut tags: Vec<_> = violations.into_iter().collect();
            tags.sort();
            for (tag, pattern) in tags {
                println!("  {} {} {}", tag.red(), "matched".dimmed(), pattern);
            }
        }
    }

    Ok(())
}

fn toggle(
    registry: &mut BlacklistRegistry,
    base_dir: &Path,
    pattern: &str,
    enabled: bool,
) -> Result<()> {
    if registry.set_enabled(pattern, enabled) {
        registry.save(base_dir)?;
        let label = if enabled { "Enabled:" } else { "Disabled:" };
        println!("{} {}", label.green(), pattern);
    } else {
        println!("{} {}", "Not found:".yellow(), pattern);
    }
    Ok(())
}

fn handle_concept(action: ConceptAction, base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir)?;
    let concepts_dir = config.concepts_dir(base_dir);

    match action {
        ConceptAction::Add { file, concepts } => {
            let mut editor = ConceptFileEditor::open(&concepts_dir.join(&file))?;
            for concept in &concepts {
                if editor.add_concept(concept) {
                    println!("{} {}", "Added:".green(), concept);
                } else {
                    println!("{} {}", "Exists:".yellow(), concept);
                }
            }
            editor.write()?;
        }
        ConceptAction::Remove { file, concepts } => {
            let path = concepts_dir.join(&file);
            if !path.exists() {
                return Err(PromptMixError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("concept file not found: {}", path.display()),
                )));
            }
            let mut editor = ConceptFileEditor::open(&path)?;
            for concept in &concepts {
                if editor.remove_concept(concept) {
                    println!("{} {}", "Removed:".green(), concept);
                } else {
                    println!("{} {}", "Not found:".yellow(), concept);
                }
            }
            editor.write()?;
        }
        ConceptAction::List { file: Some(file) } => {
            let list = ConceptFile::load(&concepts_dir.join(&file))?;
            for concept in list.concepts() {
                println!("{}", concept);
            }
        }
        ConceptAction::List { file: None } => {
            let store = config.open_store(base_dir)?;
            for path in store.concept_files()? {
                let count = ConceptFile::load(&path)?.concepts().len();
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                println!("  {} {}", format!("{:<28}", name).cyan(), count);
            }
        }
    }

    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(PromptMixError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
