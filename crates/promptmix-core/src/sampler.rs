//! Sampling without replacement
//!
//! Uniform and weighted draws over concept populations, plus the blacklist
//! aware entry point used by the generator.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::blacklist::BlacklistRegistry;
use crate::error::{PromptMixError, Result};

/// Concepts to draw from
#[derive(Debug, Clone, PartialEq)]
pub enum Population {
    Plain(Vec<String>),
    /// Concept and inclusion weight, in source order
    Weighted(Vec<(String, f64)>),
}

impl Population {
    pub fn len(&self) -> usize {
        match self {
            Self::Plain(items) => items.len(),
            Self::Weighted(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_weighted(&self) -> bool {
        matches!(self, Self::Weighted(_))
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Plain(items) => items.iter().map(String::as_str).collect(),
            Self::Weighted(items) => items.iter().map(|(c, _)| c.as_str()).collect(),
        }
    }
}

impl Default for Population {
    fn default() -> Self {
        Self::Plain(Vec::new())
    }
}

impl From<Vec<String>> for Population {
    fn from(items: Vec<String>) -> Self {
        Self::Plain(items)
    }
}

/// Random sampler
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sampler
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Draw between `low` and `high` distinct elements uniformly.
    ///
    /// When `high` exceeds the population size it is clamped to
    /// `size - 1`, one below what could be drawn. Callers' range shrinking
    /// relies on this, so it is kept as is. When `low > high` exactly `high`
    /// elements are drawn.
    pub fn sample<T: Clone>(&mut self, population: &[T], low: usize, high: usize) -> Vec<T> {
        let k = self.pick_count(population.len(), low, high);
        index::sample(&mut self.rng, population.len(), k)
            .into_iter()
            .map(|i| population[i].clone())
            .collect()
    }

    /// Draw `k` distinct elements, each draw weighted by the weights of the
    /// elements not yet drawn.
    ///
    /// Drawn elements get their weight zeroed. Once every remaining weight is
    /// zero the rest are drawn uniformly, so `k == population.len()` always
    /// returns every element exactly once.
    pub fn weighted_sample_without_replacement<T: Clone>(
        &mut self,
        population: &[T],
        weights: &[f64],
        k: usize,
    ) -> Vec<T> {
        let len = population.len();
        let k = k.min(len);
        let mut current: Vec<f64> = (0..len)
            .map(|i| match weights.get(i) {
                Some(w) if w.is_finite() && *w > 0.0 => *w,
                _ => 0.0,
            })
            .collect();
        let mut drawn = vec![false; len];
        let mut picked = Vec::with_capacity(k);

        while picked.len() < k {
            let idx = self.weighted_index(&current, &drawn);
            current[idx] = 0.0;
            drawn[idx] = true;
            picked.push(population[idx].clone());
        }

        picked
    }

    /// Weighted counterpart of [`Sampler::sample`], same range rules
    pub fn sample_weighted(
        &mut self,
        population: &[(String, f64)],
        low: usize,
        high: usize,
    ) -> Vec<String> {
        let k = self.pick_count(population.len(), low, high);
        let (names, weights): (Vec<String>, Vec<f64>) = population.iter().cloned().unzip();
        self.weighted_sample_without_replacement(&names, &weights, k)
    }

    pub fn sample_population(
        &mut self,
        population: &Population,
        low: usize,
        high: usize,
    ) -> Vec<String> {
        match population {
            Population::Plain(items) => self.sample(items, low, high),
            Population::Weighted(items) => self.sample_weighted(items, low, high),
        }
    }

    /// Sample concepts that pass the blacklist.
    ///
    /// When fewer than `low` concepts survive filtering the range shrinks to
    /// what is left. Fails when `low > 0` and nothing survives.
    pub fn sample_whitelisted(
        &mut self,
        registry: &BlacklistRegistry,
        population: &Population,
        low: usize,
        high: usize,
    ) -> Result<Vec<String>> {
        if low == 0 && high == 0 {
            return Ok(Vec::new());
        }
        if population.is_empty() && low > 0 {
            return Err(PromptMixError::PopulationExhausted {
                requested: low,
                available: 0,
            });
        }
        if registry.is_empty() {
            return Ok(self.sample_population(population, low, high));
        }

        let outcome = registry.filter(&population.names());
        let available = outcome.whitelist.len();

        if available == 0 && low > 0 {
            return Err(PromptMixError::PopulationExhausted {
                requested: low,
                available,
            });
        }

        let (low, high) = if available < low {
            info!(
                requested_low = low,
                requested_high = high,
                available,
                filtered = outcome.filtered.len(),
                "not enough concepts after blacklist filtering, shrinking range"
            );
            (low.min(available), high.min(available))
        } else {
            (low, high)
        };

        let sampled = match population {
            Population::Plain(_) => self.sample(&outcome.whitelist, low, high),
            Population::Weighted(items) => {
                let survivors: Vec<(String, f64)> = items
                    .iter()
                    .filter(|(c, _)| !outcome.filtered.contains_key(c))
                    .cloned()
                    .collect();
                self.sample_weighted(&survivors, low, high)
            }
        };

        debug!(low, high, count = sampled.len(), "sampled whitelisted concepts");
        Ok(sampled)
    }

    fn pick_count(&mut self, len: usize, low: usize, high: usize) -> usize {
        let high = if high > len {
            len.saturating_sub(1)
        } else {
            high
        };

        if low > high {
            high
        } else {
            self.rng.gen_range(low..=high)
        }
    }

    fn weighted_index(&mut self, weights: &[f64], drawn: &[bool]) -> usize {
        let total: f64 = weights.iter().sum();
        if !total.is_finite() {
            // rescale so large finite weights cannot overflow the sum
            let max = weights.iter().copied().fold(0.0, f64::max);
            let scaled: Vec<f64> = weights.iter().map(|w| w / max).collect();
            return self.weighted_index(&scaled, drawn);
        }

        if total > 0.0 {
            let target = self.rng.gen_range(0.0..total);
            let mut acc = 0.0;
            let mut last_positive = 0;
            for (i, w) in weights.iter().enumerate() {
                if *w <= 0.0 {
                    continue;
                }
                acc += w;
                last_positive = i;
                if target < acc {
                    return i;
                }
            }
            // float rounding left target at the very top
            return last_positive;
        }

        let remaining: Vec<usize> = (0..drawn.len()).filter(|i| !drawn[*i]).collect();
        remaining[self.rng.gen_range(0..remaining.len())]
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale a requested range by a multiplier.
///
/// `0` disables the request and `1` leaves it unchanged. Otherwise both the
/// lower bound and the span are scaled and floored; a non-zero bound never
/// scales down to zero.
pub fn adjust_range(low: usize, high: usize, multiplier: f64) -> (usize, usize) {
    if multiplier.is_nan() || multiplier <= 0.0 {
        return (0, 0);
    }
    if (multiplier - 1.0).abs() < f64::EPSILON {
        return (low, high);
    }

    let span = high.saturating_sub(low);
    let scaled_span = (span as f64 * multiplier).floor() as usize;

    let mut new_low = (low as f64 * multiplier).floor().max(0.0) as usize;
    if low > 0 && new_low == 0 {
        new_low = 1;
    }

    let mut new_high = new_low + scaled_span;
    if high > 0 && new_high == 0 {
        new_high = 1;
    }

    (new_low, new_high)
}
