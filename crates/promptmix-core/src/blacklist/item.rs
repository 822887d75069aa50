//! Blacklist item
//!
//! A single pattern plus its matching flags. Matching is always
//! case-insensitive; identity is the lowercased pattern.

use std::hash::{Hash, Hasher};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Persisted shape of a blacklist item.
///
/// Older records carry only `pattern` and `enabled`; the matching flags then
/// default to literal matching anchored at word starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistRecord {
    pub pattern: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default = "default_true")]
    pub use_word_boundary: bool,
}

fn default_true() -> bool {
    true
}

/// A blacklist pattern with its compiled matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BlacklistRecord", into = "BlacklistRecord")]
pub struct BlacklistItem {
    pattern: String,
    enabled: bool,
    use_regex: bool,
    use_word_boundary: bool,
    key: String,
    glob: Option<Regex>,
}

impl BlacklistItem {
    /// Enabled, literal, word-boundary anchored item
    pub fn new(pattern: impl Into<String>) -> Self {
        Self::with_flags(pattern, true, false, true)
    }

    pub fn with_flags(
        pattern: impl Into<String>,
        enabled: bool,
        use_regex: bool,
        use_word_boundary: bool,
    ) -> Self {
        let pattern = pattern.into();
        let key = pattern.to_lowercase();
        let glob = if use_regex {
            compile_glob(&key, use_word_boundary)
        } else {
            None
        };

        Self {
            pattern,
            enabled,
            use_regex,
            use_word_boundary,
            key,
            glob,
        }
    }

    /// Item from a bare pattern string (text import, JSON string elements).
    ///
    /// A `*` anywhere in the pattern switches on glob matching.
    pub fn from_bare(pattern: impl Into<String>, enabled: bool) -> Self {
        let pattern = pattern.into();
        let use_regex = pattern.contains('*');
        Self::with_flags(pattern, enabled, use_regex, true)
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    pub fn with_regex(self, use_regex: bool) -> Self {
        Self::with_flags(self.pattern, self.enabled, use_regex, self.use_word_boundary)
    }

    pub fn with_word_boundary(self, use_word_boundary: bool) -> Self {
        Self::with_flags(self.pattern, self.enabled, self.use_regex, use_word_boundary)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Lowercased pattern used for identity and ordering
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn use_regex(&self) -> bool {
        self.use_regex
    }

    pub fn use_word_boundary(&self) -> bool {
        self.use_word_boundary
    }

    /// Check whether `tag` is caught by this item.
    ///
    /// Literal patterns are prefix tests, so the naive plural forms
    /// `pattern + "s"` and `pattern + "es"` are caught as well. Only the start
    /// of a match is anchored; trailing context is never checked.
    pub fn matches(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();

        if self.use_regex {
            return match &self.glob {
                Some(re) => re.is_match(&tag),
                None => false,
            };
        }

        if self.use_word_boundary {
            word_starts(&tag).any(|start| tag[start..].starts_with(self.key.as_str()))
        } else {
            tag.contains(self.key.as_str())
        }
    }

    pub fn to_record(&self) -> BlacklistRecord {
        BlacklistRecord {
            pattern: self.pattern.clone(),
            enabled: self.enabled,
            use_regex: self.use_regex,
            use_word_boundary: self.use_word_boundary,
        }
    }
}

impl From<BlacklistRecord> for BlacklistItem {
    fn from(record: BlacklistRecord) -> Self {
        Self::with_flags(
            record.pattern,
            record.enabled,
            record.use_regex,
            record.use_word_boundary,
        )
    }
}

impl From<BlacklistItem> for BlacklistRecord {
    fn from(item: BlacklistItem) -> Self {
        BlacklistRecord {
            pattern: item.pattern,
            enabled: item.enabled,
            use_regex: item.use_regex,
            use_word_boundary: item.use_word_boundary,
        }
    }
}

impl PartialEq for BlacklistItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for BlacklistItem {}

impl Hash for BlacklistItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offsets where a word may start: position 0 and every position
/// directly after a non-word character.
fn word_starts(tag: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(
        tag.char_indices()
            .filter(|(_, c)| !is_word_char(*c))
            .map(|(i, c)| i + c.len_utf8()),
    )
}

/// Compile a glob where only `*` is special.
fn compile_glob(pattern: &str, use_word_boundary: bool) -> Option<Regex> {
    let mut body = String::with_capacity(pattern.len() * 2);
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        if ch == '*' {
            body.push_str(".*");
        } else {
            body.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
        }
    }

    let expr = if use_word_boundary {
        format!(r"(?:^|\W){}", body)
    } else {
        body
    };

    match Regex::new(&expr) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern, error = %e, "failed to compile blacklist glob");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_default_matches_prefix_at_word_start() {
        let item = BlacklistItem::new("cat");
        assert!(item.matches("cat"));
        assert!(item.matches("cats"));
        assert!(item.matches("catch"));
        assert!(item.matches("black cat"));
        assert!(!item.matches("scat"));
        assert!(!item.matches("blackcat"));
    }

    #[test]
    fn literal_plural_forms() {
        let item = BlacklistItem::new("fox");
        assert!(item.matches("foxes"));
        assert!(item.matches("two foxes running"));
        assert!(item.matches("red-fox"));
    }

    #[test]
    fn literal_without_word_boundary_matches_anywhere() {
        let item = BlacklistItem::new("cat").with_word_boundary(false);
        assert!(item.matches("scat"));
        assert!(item.matches("blackcat"));
        assert!(!item.matches("dog"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let item = BlacklistItem::new("Cat");
        assert!(item.matches("BLACK CAT"));
        assert!(item.matches("cAtS"));
    }

    #[test]
    fn glob_with_stars_matches_inside_words() {
        let item = BlacklistItem::new("*cat*").with_regex(true);
        assert!(item.matches("blackcat"));
        assert!(item.matches("cat"));
    }

    #[test]
    fn glob_with_word_boundary_is_start_anchored() {
        let item = BlacklistItem::with_flags("cat", true, true, true);
        assert!(item.matches("cat"));
        assert!(item.matches("black cat"));
        assert!(item.matches("(cat)"));
        assert!(!item.matches("blackcat"));
        assert!(!item.matches("scat"));
        // trailing context is not constrained
        assert!(item.matches("catalog"));
    }

    #[test]
    fn glob_without_word_boundary_matches_substrings() {
        let item = BlacklistItem::with_flags("cat", true, true, false);
        assert!(item.matches("blackcat"));
        assert!(item.matches("scat"));
    }

    #[test]
    fn glob_escapes_everything_but_star() {
        let item = BlacklistItem::with_flags("a.b?[c]", true, true, false);
        assert!(item.matches("xa.b?[c]x"));
        assert!(!item.matches("axb?[c]"));

        let item = BlacklistItem::with_flags("big*dog", true, true, true);
        assert!(item.matches("a big brown dog"));
        assert!(!item.matches("bigot"));
    }

    #[test]
    fn empty_pattern_matches_everything() {
        assert!(BlacklistItem::new("").matches("anything"));
        assert!(BlacklistItem::new("").with_word_boundary(false).matches("x"));
        assert!(BlacklistItem::new("").with_regex(true).matches("x"));
        assert!(BlacklistItem::new("").matches(""));
    }

    #[test]
    fn equality_is_by_lowercased_pattern() {
        let a = BlacklistItem::new("Cat");
        let b = BlacklistItem::with_flags("cat", false, true, false);
        assert_eq!(a, b);
        assert_ne!(a, BlacklistItem::new("cats"));
    }

    #[test]
    fn from_bare_detects_globs() {
        assert!(BlacklistItem::from_bare("*gore*", true).use_regex());
        assert!(!BlacklistItem::from_bare("gore", true).use_regex());
        assert!(!BlacklistItem::from_bare("gore", false).is_enabled());
    }

    #[test]
    fn deserialize_fills_missing_flags() {
        let item: BlacklistItem =
            serde_json::from_str(r#"{"pattern": "Cat", "enabled": false}"#).unwrap();
        assert_eq!(item.pattern(), "Cat");
        assert!(!item.is_enabled());
        assert!(!item.use_regex());
        assert!(item.use_word_boundary());
        assert!(item.matches("black cat"));
    }

    #[test]
    fn serialize_writes_all_fields() {
        let item = BlacklistItem::with_flags("*cat", true, true, false);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "pattern": "*cat",
                "enabled": true,
                "use_regex": true,
                "use_word_boundary": false
            })
        );
    }
}
