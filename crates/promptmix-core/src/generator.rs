//! Concept generator
//!
//! Entry points used by prompt assembly: each `get_*` call scales the
//! requested range, loads the population fresh from disk and samples what
//! survives the blacklist.

use tracing::debug;

use crate::blacklist::BlacklistRegistry;
use crate::concepts::{ConceptKind, ConceptsStore};
use crate::error::{PromptMixError, Result};
use crate::phrase::{PhraseCombiner, PhraseSettings};
use crate::sampler::{adjust_range, Sampler};

/// Samples concepts for one prompt generation job
pub struct ConceptGenerator<'a> {
    store: &'a ConceptsStore,
    registry: &'a BlacklistRegistry,
    sampler: Sampler,
    phrase_settings: PhraseSettings,
}

impl<'a> ConceptGenerator<'a> {
    pub fn new(store: &'a ConceptsStore, registry: &'a BlacklistRegistry) -> Self {
        Self {
            store,
            registry,
            sampler: Sampler::new(),
            phrase_settings: PhraseSettings::default(),
        }
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_phrase_settings(mut self, settings: PhraseSettings) -> Self {
        self.phrase_settings = settings;
        self
    }

    pub fn sampler_mut(&mut self) -> &mut Sampler {
        &mut self.sampler
    }

    /// Sample `low..=high` (scaled by `multiplier`) concepts of a kind
    pub fn get(
        &mut self,
        kind: ConceptKind,
        low: usize,
        high: usize,
        multiplier: f64,
    ) -> Result<Vec<String>> {
        let (low, high) = adjust_range(low, high, multiplier);
        if low == 0 && high == 0 {
            return Ok(Vec::new());
        }

        let population = self.store.population(kind);
        let picked = self
            .sampler
            .sample_whitelisted(self.registry, &population, low, high)?;
        debug!(%kind, low, high, count = picked.len(), "generated concepts");
        Ok(picked)
    }

    pub fn get_concepts(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Concepts, low, high, multiplier)
    }

    pub fn get_positions(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Positions, low, high, multiplier)
    }

    pub fn get_locations(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Locations, low, high, multiplier)
    }

    pub fn get_animals(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Animals, low, high, multiplier)
    }

    pub fn get_colors(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Colors, low, high, multiplier)
    }

    pub fn get_times(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Times, low, high, multiplier)
    }

    pub fn get_dress(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Dress, low, high, multiplier)
    }

    pub fn get_expressions(
        &mut self,
        low: usize,
        high: usize,
        multiplier: f64,
    ) -> Result<Vec<String>> {
        self.get(ConceptKind::Expressions, low, high, multiplier)
    }

    pub fn get_actions(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Actions, low, high, multiplier)
    }

    pub fn get_descriptions(
        &mut self,
        low: usize,
        high: usize,
        multiplier: f64,
    ) -> Result<Vec<String>> {
        self.get(ConceptKind::Descriptions, low, high, multiplier)
    }

    pub fn get_characters(
        &mut self,
        low: usize,
        high: usize,
        multiplier: f64,
    ) -> Result<Vec<String>> {
        self.get(ConceptKind::Characters, low, high, multiplier)
    }

    pub fn get_artists(&mut self, low: usize, high: usize, multiplier: f64) -> Result<Vec<String>> {
        self.get(ConceptKind::Artists, low, high, multiplier)
    }

    pub fn get_art_styles(
        &mut self,
        low: usize,
        high: usize,
        multiplier: f64,
    ) -> Result<Vec<String>> {
        self.get(ConceptKind::ArtStyles, low, high, multiplier)
    }

    /// Random phrases built from the background dictionary.
    ///
    /// Words are whitelisted one by one before any are combined.
    pub fn get_random_words(
        &mut self,
        low: usize,
        high: usize,
        multiplier: f64,
    ) -> Result<Vec<String>> {
        let (low, high) = adjust_range(low, high, multiplier);
        if low == 0 && high == 0 {
            return Ok(Vec::new());
        }

        let pool = self.registry.filter(self.store.dictionary()).whitelist;
        if pool.is_empty() && low > 0 {
            return Err(PromptMixError::PopulationExhausted {
                requested: low,
                available: 0,
            });
        }

        let combiner = PhraseCombiner::with_settings(self.registry, self.phrase_settings);
        Ok(combiner.combine(&mut self.sampler, &pool, low, high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::BlacklistItem;
    use crate::concepts::DICTIONARY_FILE;
    use std::fs;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &str)]) -> (TempDir, ConceptsStore) {
        let tmp = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        let store = ConceptsStore::new(tmp.path()).unwrap();
        (tmp, store)
    }

    #[test]
    fn get_filters_blacklisted_concepts() {
        let (_tmp, store) = setup(&[("animals.txt", "cat\ndog\nbird\nblack cat\nfish\n")]);
        let registry = BlacklistRegistry::from_items([BlacklistItem::new("cat")]);
        let mut generator =
            ConceptGenerator::new(&store, &registry).with_sampler(Sampler::seeded(3));

        for _ in 0..20 {
            let animals = generator.get_animals(1, 3, 1.0).unwrap();
            assert!((1..=3).contains(&animals.len()));
            assert!(animals.iter().all(|a| !a.contains("cat")));
        }
    }

    #[test]
    fn get_zero_multiplier_is_empty() {
        let (_tmp, store) = setup(&[("colors.txt", "red\nblue\n")]);
        let registry = BlacklistRegistry::new();
        let mut generator = ConceptGenerator::new(&store, &registry);
        assert!(generator.get_colors(1, 2, 0.0).unwrap().is_empty());
    }

    #[test]
    fn get_missing_file_fails_when_required() {
        let (_tmp, store) = setup(&[]);
        let registry = BlacklistRegistry::new();
        let mut generator = ConceptGenerator::new(&store, &registry);
        let err = generator.get_times(1, 2, 1.0).unwrap_err();
        assert!(matches!(err, PromptMixError::PopulationExhausted { .. }));
    }

    #[test]
    fn get_weighted_kind() {
        let (_tmp, store) = setup(&[
            ("dress.txt", "shirt\ncoat\n"),
            ("dress_specific.txt", "red silk shirt\n"),
        ]);
        let registry = BlacklistRegistry::from_items([BlacklistItem::new("red")]);
        let mut generator =
            ConceptGenerator::new(&store, &registry).with_sampler(Sampler::seeded(8));
        for _ in 0..10 {
            let dress = generator.get_dress(2, 2, 1.0).unwrap();
            assert_eq!(dress.len(), 2);
            assert!(!dress.contains(&"red silk shirt".to_string()));
        }
    }

    #[test]
    fn random_words_zero_range_is_empty() {
        let (_tmp, store) = setup(&[(DICTIONARY_FILE, "alpha\nbeta\n")]);
        let registry = BlacklistRegistry::new();
        let mut generator = ConceptGenerator::new(&store, &registry);
        assert!(generator.get_random_words(0, 0, 1.0).unwrap().is_empty());
    }

    #[test]
    fn random_words_never_contain_blacklisted_word() {
        let (_tmp, store) = setup(&[(
            DICTIONARY_FILE,
            "alpha\nbeta\ngamma\ndelta\nforbidden\nepsilon\nzeta\neta\ntheta\n",
        )]);
        let registry = BlacklistRegistry::from_items([BlacklistItem::new("forbidden")]);
        let mut generator =
            ConceptGenerator::new(&store, &registry).with_sampler(Sampler::seeded(21));

        for _ in 0..50 {
            for phrase in generator.get_random_words(2, 6, 1.0).unwrap() {
                assert!(!phrase.contains("forbidden"), "got {}", phrase);
            }
        }
    }

    #[test]
    fn random_words_with_fully_blacklisted_dictionary_fails() {
        let (_tmp, store) = setup(&[(DICTIONARY_FILE, "forbidden\n")]);
        let registry = BlacklistRegistry::from_items([BlacklistItem::new("forbidden")]);
        let mut generator = ConceptGenerator::new(&store, &registry);
        assert!(generator.get_random_words(1, 2, 1.0).is_err());
    }
}
