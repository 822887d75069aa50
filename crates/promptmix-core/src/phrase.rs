//! Random phrase combination
//!
//! Joins words from an already whitelisted pool into short phrases. Each word
//! passed the blacklist on its own, so only the joined phrase is checked.
//! Suppressed phrases are replaced by resampling; the number of passes is
//! capped, so a few suppressed combinations may simply go missing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blacklist::BlacklistRegistry;
use crate::sampler::Sampler;

pub const DEFAULT_MAX_ATTEMPTS: usize = 10;
pub const DEFAULT_FIRST_PASS_CLOSE_PROBABILITY: f64 = 0.25;
pub const DEFAULT_RETRY_CLOSE_PROBABILITY: f64 = 0.75;

/// Phrase combination settings (`[phrases]` in config.toml)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhraseSettings {
    /// Chance that a phrase ends after each word on the first pass
    #[serde(default = "default_first_pass")]
    pub first_pass_close_probability: f64,
    /// Same chance on replacement passes
    #[serde(default = "default_retry")]
    pub retry_close_probability: f64,
    /// Total passes including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_first_pass() -> f64 {
    DEFAULT_FIRST_PASS_CLOSE_PROBABILITY
}

fn default_retry() -> f64 {
    DEFAULT_RETRY_CLOSE_PROBABILITY
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for PhraseSettings {
    fn default() -> Self {
        Self {
            first_pass_close_probability: DEFAULT_FIRST_PASS_CLOSE_PROBABILITY,
            retry_close_probability: DEFAULT_RETRY_CLOSE_PROBABILITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Builds multi-word phrases without recreating blacklisted phrases
pub struct PhraseCombiner<'a> {
    registry: &'a BlacklistRegistry,
    settings: PhraseSettings,
}

impl<'a> PhraseCombiner<'a> {
    pub fn new(registry: &'a BlacklistRegistry) -> Self {
        Self::with_settings(registry, PhraseSettings::default())
    }

    pub fn with_settings(registry: &'a BlacklistRegistry, settings: PhraseSettings) -> Self {
        Self { registry, settings }
    }

    pub fn settings(&self) -> &PhraseSettings {
        &self.settings
    }

    /// Draw `low..=high` words from `pool` and combine them into phrases.
    ///
    /// `pool` must already be whitelisted word by word.
    pub fn combine(
        &self,
        sampler: &mut Sampler,
        pool: &[String],
        low: usize,
        high: usize,
    ) -> Vec<String> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut phrases = Vec::new();
        let mut words = sampler.sample(pool, low, high);
        let mut close_probability = self.settings.first_pass_close_probability;

        for attempt in 1..=max_attempts {
            let owed = self.combine_pass(sampler, &words, close_probability, &mut phrases);
            if owed == 0 {
                break;
            }
            if attempt == max_attempts {
                debug!(attempt, owed, "phrase retry limit reached, keeping result");
                break;
            }

            debug!(attempt, owed, "combined phrase hit blacklist, resampling");
            words = sampler.sample(pool, owed, owed);
            close_probability = self.settings.retry_close_probability;
        }

        phrases
    }

    /// One pass over `words`. Returns how many words went into suppressed
    /// phrases.
    fn combine_pass(
        &self,
        sampler: &mut Sampler,
        words: &[String],
        close_probability: f64,
        phrases: &mut Vec<String>,
    ) -> usize {
        let mut owed = 0;
        let mut current: Vec<&str> = Vec::new();

        for word in words {
            current.push(word);
            if sampler.chance(close_probability) {
                owed += self.emit(&current, phrases);
                current.clear();
            }
        }

        if !current.is_empty() {
            owed += self.emit(&current, phrases);
        }

        owed
    }

    fn emit(&self, words: &[&str], phrases: &mut Vec<String>) -> usize {
        let phrase = words.join(" ");

        let violations = self.registry.find_violations(&phrase);
        if !violations.is_empty() {
            debug!(%phrase, ?violations, "suppressed blacklisted combination");
            return words.len();
        }

        if !phrases.contains(&phrase) {
            phrases.push(phrase);
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::BlacklistItem;
    use std::collections::HashSet;

    fn pool(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn settings(first: f64, retry: f64) -> PhraseSettings {
        PhraseSettings {
            first_pass_close_probability: first,
            retry_close_probability: retry,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    #[test]
    fn always_closing_yields_single_words() {
        let registry = BlacklistRegistry::new();
        let combiner = PhraseCombiner::with_settings(&registry, settings(1.0, 1.0));
        let words = pool(&["red", "green", "blue", "violet", "amber"]);
        let mut sampler = Sampler::seeded(4);

        let phrases = combiner.combine(&mut sampler, &words, 5, 5);
        let drawn: HashSet<_> = phrases.iter().map(String::as_str).collect();
        assert_eq!(phrases.len(), 5);
        assert!(drawn.iter().all(|w| words.iter().any(|p| p == w)));
    }

    #[test]
    fn never_closing_yields_one_phrase() {
        let registry = BlacklistRegistry::new();
        let combiner = PhraseCombiner::with_settings(&registry, settings(0.0, 0.0));
        let words = pool(&["red", "green", "blue", "violet"]);
        let mut sampler = Sampler::seeded(4);

        let phrases = combiner.combine(&mut sampler, &words, 3, 3);
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].split(' ').count(), 3);
    }

    #[test]
    fn emitted_phrases_never_violate() {
        let registry = BlacklistRegistry::from_items([
            BlacklistItem::new("big cat"),
            BlacklistItem::with_flags("red*blue", true, true, true),
        ]);
        let words = pool(&["big", "cat", "red", "blue", "small", "dog", "green"]);
        let combiner = PhraseCombiner::new(&registry);

        for seed in 0..200 {
            let mut sampler = Sampler::seeded(seed);
            for phrase in combiner.combine(&mut sampler, &words, 1, 6) {
                assert!(
                    registry.find_violations(&phrase).is_empty(),
                    "seed {} produced {}",
                    seed,
                    phrase
                );
            }
        }
    }

    #[test]
    fn retries_are_bounded() {
        // any phrase with a space is blacklisted, so multi-word phrases keep
        // getting suppressed
        let registry =
            BlacklistRegistry::from_items([BlacklistItem::with_flags("* *", true, true, false)]);
        let words = pool(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let combiner = PhraseCombiner::with_settings(&registry, settings(0.0, 0.0));
        let mut sampler = Sampler::seeded(1);

        let phrases = combiner.combine(&mut sampler, &words, 4, 6);
        assert!(phrases.is_empty());
    }

    #[test]
    fn duplicates_are_dropped() {
        let registry = BlacklistRegistry::new();
        let combiner = PhraseCombiner::with_settings(&registry, settings(1.0, 1.0));
        let mut sampler = Sampler::seeded(2);

        let words = pool(&["same", "same", "same"]);
        let phrases = combiner.combine(&mut sampler, &words, 3, 3);
        assert_eq!(phrases, vec!["same"]);
    }

    #[test]
    fn empty_request() {
        let registry = BlacklistRegistry::new();
        let combiner = PhraseCombiner::new(&registry);
        let mut sampler = Sampler::seeded(2);
        assert!(combiner
            .combine(&mut sampler, &pool(&["a", "b"]), 0, 0)
            .is_empty());
    }
}
