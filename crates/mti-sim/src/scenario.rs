//! Ground-truth population generation.

use mti_types::{Epc, SimulationConfig, Tag};
use serde::{Deserialize, Serialize};

use crate::SimRng;

/// A reproducible tag population.
///
/// EPCs are sequential from `base_epc`; after a seeded shuffle the first
/// `floor(total_tags * missing_rate)` tags are marked absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub total_tags: usize,
    pub missing_rate: f64,
    pub base_epc: Epc,
    pub seed: u64,
    /// Inclusive-exclusive range for per-tag signal strength.
    pub rssi_range_dbm: (f64, f64),
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            total_tags: 1000,
            missing_rate: 0.0,
            base_epc: Epc::new(Self::DEFAULT_BASE_EPC),
            seed: 0,
            rssi_range_dbm: (-80.0, -40.0),
        }
    }
}

impl Scenario {
    pub const DEFAULT_BASE_EPC: u128 = 0xE200_001D_4500_0000_0000_0000;

    pub fn new(total_tags: usize, missing_rate: f64) -> Self {
        Self {
            total_tags,
            missing_rate,
            ..Self::default()
        }
    }

    /// Takes the population size, missing rate and seed from a run config.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.total_tags, config.missing_rate).with_seed(config.seed)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_base_epc(mut self, base_epc: Epc) -> Self {
        self.base_epc = base_epc;
        self
    }

    pub fn missing_count(&self) -> usize {
        ((self.total_tags as f64 * self.missing_rate).floor() as usize).min(self.total_tags)
    }

    /// Generates the population.
    ///
    /// # Panics
    ///
    /// Panics if the sequence runs past the 96-bit EPC space.
    pub fn generate(&self) -> Vec<Tag> {
        let mut rng = SimRng::new(self.seed);
        let base = self.base_epc.value();
        let mut epcs: Vec<Epc> = (0..self.total_tags as u128)
            .map(|offset| Epc::new(base + offset))
            .collect();
        rng.shuffle(&mut epcs);

        let missing = self.missing_count();
        let (low, high) = self.rssi_range_dbm;
        let tags: Vec<Tag> = epcs
            .into_iter()
            .enumerate()
            .map(|(i, epc)| Tag::new(epc, i >= missing, rng.uniform_f64(low, high)))
            .collect();

        tracing::debug!(
            total = self.total_tags,
            missing,
            seed = self.seed,
            "generated scenario"
        );
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn marks_exactly_the_missing_fraction() {
        let tags = Scenario::new(100, 0.25).generate();
        assert_eq!(tags.len(), 100);
        assert_eq!(tags.iter().filter(|t| !t.present).count(), 25);
    }

    #[test]
    fn epcs_are_sequential_and_unique() {
        let tags = Scenario::new(50, 0.0).generate();
        let epcs: BTreeSet<Epc> = tags.iter().map(|t| t.epc).collect();
        assert_eq!(epcs.len(), 50);
        assert_eq!(
            epcs.first().copied(),
            Some(Epc::new(Scenario::DEFAULT_BASE_EPC))
        );
        assert_eq!(
            epcs.last().copied(),
            Some(Epc::new(Scenario::DEFAULT_BASE_EPC + 49))
        );
    }

    #[test]
    fn same_seed_same_population() {
        let a = Scenario::new(64, 0.5).with_seed(3).generate();
        let b = Scenario::new(64, 0.5).with_seed(3).generate();
        let c = Scenario::new(64, 0.5).with_seed(4).generate();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rssi_within_range() {
        let tags = Scenario::new(200, 0.0).generate();
        assert!(
            tags.iter()
                .all(|t| (-80.0..-40.0).contains(&t.rssi_dbm))
        );
    }

    #[test]
    fn floor_of_missing_count() {
        assert_eq!(Scenario::new(10, 0.19).missing_count(), 1);
        assert_eq!(Scenario::new(10, 1.0).missing_count(), 10);
        assert_eq!(Scenario::new(0, 0.5).missing_count(), 0);
    }
}
