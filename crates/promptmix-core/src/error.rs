use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptMixError {
    #[error("Concepts directory does not exist or is not a directory: {path}")]
    InvalidConceptsDir { path: PathBuf },

    #[error("Not enough concepts to sample: requested at least {requested}, {available} available after filtering")]
    PopulationExhausted { requested: usize, available: usize },

    #[error("Invalid blacklist import: {message}")]
    ImportFormat { message: String },

    #[error("Unsupported blacklist format for file: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid config value for {key}: {message}")]
    ConfigValue { key: String, message: String },

    #[error("Unknown concept kind: {name}")]
    UnknownKind { name: String },

    #[error("Unknown category: {name}")]
    UnknownCategory { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Home directory not found")]
    HomeNotFound,
}

pub type Result<T> = std::result::Result<T, PromptMixError>;

impl PromptMixError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConceptsDir { .. } => 2,
            Self::PopulationExhausted { .. } => 3,
            Self::ImportFormat { .. } | Self::UnsupportedFormat { .. } => 4,
            Self::ConfigParse { .. } | Self::ConfigKeyNotFound { .. } | Self::ConfigValue { .. } => {
                5
            }
            Self::UnknownKind { .. } | Self::UnknownCategory { .. } => 6,
            _ => 1,
        }
    }
}
