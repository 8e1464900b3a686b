//! Channel and run configuration.

use serde::{Deserialize, Serialize};

/// Upper bound on burst erasure and jitter lengths, in bits.
///
/// Sixteen times the default 256-bit reply ceiling.
pub const MAX_STRUCTURAL_BITS: u32 = 4096;

/// Environment toggles for one simulation run.
///
/// A pure configuration object: every impairment is independently switchable
/// and the kernel reads it without modifying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Size of the expected population (scenario generation only).
    pub total_tags: usize,
    /// Fraction of the population that is physically absent (scenario generation only).
    pub missing_rate: f64,
    /// Enables packet loss and random bit errors.
    pub noise_enabled: bool,
    /// Probability that a whole reply is lost (preamble not detected).
    pub packet_error_rate: f64,
    /// Independent per-bit flip probability.
    pub bit_error_rate: f64,
    /// Resolve collisions in favor of a sufficiently stronger reply.
    pub capture_effect: bool,
    /// Required margin of the strongest over the second-strongest reply.
    pub capture_margin_db: f64,
    /// Account tag-side energy.
    pub energy_tracking: bool,
    /// Relative clock drift between reader and tags (0 disables).
    pub clock_drift_rate: f64,
    /// Length of a contiguous deep-fade erasure, in bits (0 disables).
    pub burst_erasure_bits: u32,
    /// Uniform sampling offset, in bits (0 disables).
    pub jitter_offset_bits: u32,
    /// Guard time between concatenated tag replies, in bit times.
    pub guard_interval_bits: f64,
    /// Seed for every random draw in the run.
    pub seed: u64,
    /// Circuit breaker: a run issuing more slots than this is aborted.
    pub max_slots: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_tags: 1000,
            missing_rate: 0.0,
            noise_enabled: false,
            packet_error_rate: 0.0,
            bit_error_rate: 0.0,
            capture_effect: false,
            capture_margin_db: 3.0,
            energy_tracking: false,
            clock_drift_rate: 0.0,
            burst_erasure_bits: 0,
            jitter_offset_bits: 0,
            guard_interval_bits: 0.0,
            seed: 0,
            max_slots: 200_000,
        }
    }
}

/// A configuration value outside its physical range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid simulation config: {field} = {value} ({reason})")]
pub struct ConfigInvalid {
    pub field: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl SimulationConfig {
    /// Creates an impairment-free configuration.
    pub fn ideal() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_population(mut self, total_tags: usize, missing_rate: f64) -> Self {
        self.total_tags = total_tags;
        self.missing_rate = missing_rate;
        self
    }

    /// Enables channel noise with the given packet-loss and bit-error rates.
    pub fn with_noise(mut self, packet_error_rate: f64, bit_error_rate: f64) -> Self {
        self.noise_enabled = true;
        self.packet_error_rate = packet_error_rate;
        self.bit_error_rate = bit_error_rate;
        self
    }

    pub fn with_capture_effect(mut self, margin_db: f64) -> Self {
        self.capture_effect = true;
        self.capture_margin_db = margin_db;
        self
    }

    pub fn with_energy_tracking(mut self) -> Self {
        self.energy_tracking = true;
        self
    }

    pub fn with_clock_drift(mut self, rate: f64) -> Self {
        self.clock_drift_rate = rate;
        self
    }

    pub fn with_burst_erasure(mut self, bits: u32) -> Self {
        self.burst_erasure_bits = bits;
        self
    }

    pub fn with_jitter(mut self, bits: u32) -> Self {
        self.jitter_offset_bits = bits;
        self
    }

    pub fn with_guard_interval(mut self, bits: f64) -> Self {
        self.guard_interval_bits = bits;
        self
    }

    pub fn with_max_slots(mut self, max_slots: u64) -> Self {
        self.max_slots = max_slots;
        self
    }

    /// Returns true if burst erasure or jitter is configured.
    pub fn has_structural_impairments(&self) -> bool {
        self.burst_erasure_bits > 0 || self.jitter_offset_bits > 0
    }

    /// Checks that every rate is a probability and every length non-negative.
    pub fn validate(&self) -> Result<(), ConfigInvalid> {
        let probabilities = [
            ("missing_rate", self.missing_rate),
            ("packet_error_rate", self.packet_error_rate),
            ("bit_error_rate", self.bit_error_rate),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigInvalid {
                    field,
                    value: value.to_string(),
                    reason: "must be within [0, 1]",
                });
            }
        }
        let non_negative = [
            ("clock_drift_rate", self.clock_drift_rate),
            ("guard_interval_bits", self.guard_interval_bits),
            ("capture_margin_db", self.capture_margin_db),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigInvalid {
                    field,
                    value: value.to_string(),
                    reason: "must be finite and non-negative",
                });
            }
        }
        let structural = [
            ("burst_erasure_bits", self.burst_erasure_bits),
            ("jitter_offset_bits", self.jitter_offset_bits),
        ];
        for (field, value) in structural {
            if value > MAX_STRUCTURAL_BITS {
                return Err(ConfigInvalid {
                    field,
                    value: value.to_string(),
                    reason: "must not exceed 4096 bits",
                });
            }
        }
        if self.max_slots == 0 {
            return Err(ConfigInvalid {
                field: "max_slots",
                value: "0".to_string(),
                reason: "must allow at least one slot",
            });
        }
        Ok(())
    }
}
