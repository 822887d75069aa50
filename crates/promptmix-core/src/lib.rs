pub mod blacklist;
pub mod concepts;
pub mod config;
pub mod error;
pub mod generator;
pub mod phrase;
pub mod sampler;

pub use blacklist::{
    BlacklistFormat, BlacklistItem, BlacklistRecord, BlacklistRegistry, FilterOutcome,
};
pub use concepts::{
    BuiltinCategory, ConceptFile, ConceptFileEditor, ConceptKind, ConceptsStore,
    BUILTIN_CATEGORIES,
};
pub use config::{Config, ConceptsConfig};
pub use error::{PromptMixError, Result};
pub use generator::ConceptGenerator;
pub use phrase::{PhraseCombiner, PhraseSettings};
pub use sampler::{adjust_range, Population, Sampler};
