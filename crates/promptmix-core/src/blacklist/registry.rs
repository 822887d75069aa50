//! Blacklist registry
//!
//! Ordered set of blacklist items, cached in ~/.promptmix/blacklist.json

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;

use super::exchange::{self, BlacklistFormat};
use super::item::BlacklistItem;

/// Result of running concepts through the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Concepts that passed, in input order
    pub whitelist: Vec<String>,
    /// Rejected concept -> pattern that caught it
    pub filtered: HashMap<String, String>,
}

impl FilterOutcome {
    pub fn is_clean(&self) -> bool {
        self.filtered.is_empty()
    }
}

/// Blacklist registry
///
/// Items are unique by lowercased pattern and kept sorted by pattern.
#[derive(Debug, Clone, Default)]
pub struct BlacklistRegistry {
    items: Vec<BlacklistItem>,
}

impl BlacklistRegistry {
    const FILENAME: &'static str = "blacklist.json";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = BlacklistItem>) -> Self {
        let mut registry = Self::new();
        registry.set(items);
        registry
    }

    /// Load the user blacklist cache from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = Self::path(base_dir);
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path)?;
        let items = exchange::parse(&content, BlacklistFormat::Json)?;
        debug!(path = %path.display(), count = items.len(), "loaded blacklist");
        Ok(Self::from_items(items))
    }

    /// Save the user blacklist cache to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        fs::create_dir_all(base_dir)?;
        let content = exchange::render(&self.items, BlacklistFormat::Json)?;
        fs::write(Self::path(base_dir), content)?;
        Ok(())
    }

    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(Self::FILENAME)
    }

    /// Add an item, replacing any item with the same pattern
    pub fn add(&mut self, item: BlacklistItem) {
        match self.items.iter().position(|i| i == &item) {
            Some(idx) => self.items[idx] = item,
            None => self.items.push(item),
        }
        self.sort();
    }

    /// Remove an item by pattern (case-insensitive)
    pub fn remove(&mut self, pattern: &str) -> Option<BlacklistItem> {
        let key = pattern.to_lowercase();
        let idx = self.items.iter().position(|i| i.key() == key)?;
        Some(self.items.remove(idx))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace every item. Later duplicates win.
    pub fn set(&mut self, items: impl IntoIterator<Item = BlacklistItem>) {
        self.items.clear();
        for item in items {
            match self.items.iter().position(|i| i == &item) {
                Some(idx) => self.items[idx] = item,
                None => self.items.push(item),
            }
        }
        self.sort();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[BlacklistItem] {
        &self.items
    }

    pub fn get(&self, pattern: &str) -> Option<&BlacklistItem> {
        let key = pattern.to_lowercase();
        self.items.iter().find(|i| i.key() == key)
    }

    /// Enable or disable an item. Returns false when no such pattern exists.
    pub fn set_enabled(&mut self, pattern: &str, enabled: bool) -> bool {
        let key = pattern.to_lowercase();
        match self.items.iter_mut().find(|i| i.key() == key) {
            Some(item) => {
                item.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn enabled_items(&self) -> impl Iterator<Item = &BlacklistItem> {
        self.items.iter().filter(|i| i.is_enabled())
    }

    /// First enabled item catching `tag`, in stored order
    pub fn first_match(&self, tag: &str) -> Option<&BlacklistItem> {
        self.enabled_items().find(|i| i.matches(tag))
    }

    /// Split concepts into a whitelist and a map of rejected concepts
    pub fn filter<S: AsRef<str>>(&self, concepts: &[S]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for concept in concepts {
            let concept = concept.as_ref();
            match self.first_match(concept) {
                Some(item) => {
                    outcome
                        .filtered
                        .insert(concept.to_string(), item.pattern().to_string());
                }
                None => outcome.whitelist.push(concept.to_string()),
            }
        }

        if !outcome.filtered.is_empty() {
            debug!(
                total = concepts.len(),
                filtered = outcome.filtered.len(),
                "blacklist filtered concepts"
            );
        }
        outcome
    }

    /// Find blacklisted tags in comma-separated prompt text.
    ///
    /// Emphasis decoration such as `((tag))` or `[tag]` is stripped before
    /// matching. Returns tag -> pattern.
    pub fn find_violations(&self, text: &str) -> HashMap<String, String> {
        let mut violations = HashMap::new();

        for tag in text.split(',').map(clean_tag).filter(|t| !t.is_empty()) {
            if let Some(item) = self.first_match(tag) {
                violations.insert(tag.to_string(), item.pattern().to_string());
            }
        }

        violations
    }

    /// Import items from exchange content.
    ///
    /// Items with a known pattern replace the stored one. Returns the number
    /// of patterns that were not in the registry before.
    pub fn import(&mut self, content: &str, format: BlacklistFormat) -> Result<usize> {
        let items = exchange::parse(content, format)?;
        let read = items.len();
        let before = self.items.len();
        for item in items {
            self.add(item);
        }
        let added = self.items.len() - before;
        info!(read, added, %format, "imported blacklist items");
        Ok(added)
    }

    pub fn export(&self, format: BlacklistFormat) -> Result<String> {
        exchange::render(&self.items, format)
    }

    /// Import from a file; the format follows the extension
    pub fn import_file(&mut self, path: &Path) -> Result<usize> {
        let format = BlacklistFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        self.import(&content, format)
    }

    /// Export to a file; the format follows the extension
    pub fn export_file(&self, path: &Path) -> Result<()> {
        let format = BlacklistFormat::from_path(path)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.export(format)?)?;
        Ok(())
    }

    fn sort(&mut self) {
        self.items.sort_by(|a, b| a.key().cmp(b.key()));
    }
}

fn clean_tag(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']'])
        .trim()
}
