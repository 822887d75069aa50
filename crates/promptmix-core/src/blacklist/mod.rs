//! # Blacklist Module
//!
//! Patterns that keep unwanted concepts out of generated prompts.
//!
//! - `item`: a single pattern with its matching flags
//! - `registry`: the ordered collection used for filtering
//! - `exchange`: text / CSV / JSON import and export
//!
//! ```rust
//! use promptmix_core::blacklist::{BlacklistItem, BlacklistRegistry};
//!
//! let mut registry = BlacklistRegistry::new();
//! registry.add(BlacklistItem::new("cat"));
//!
//! let outcome = registry.filter(&["black cat", "scat", "dog"]);
//! assert_eq!(outcome.whitelist, vec!["scat", "dog"]);
//! ```

mod exchange;
mod item;
mod registry;

pub use exchange::BlacklistFormat;
pub use item::{BlacklistItem, BlacklistRecord};
pub use registry::{BlacklistRegistry, FilterOutcome};
