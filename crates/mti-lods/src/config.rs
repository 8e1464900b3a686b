//! Engine configuration and the published variants.

use serde::{Deserialize, Serialize};

/// How the redundancy factor evolves during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Adaptation {
    /// Start robust, then switch between robust and fast after each group
    /// depending on its imperfect-check fraction.
    Adaptive,
    /// Use the same redundancy for every group.
    Fixed { rho: u32 },
}

/// How many bits of a sub-field must be observed set to confirm presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Voting {
    /// A strict majority: `rho / 2 + 1` bits.
    Majority,
    /// Every bit of the sub-field.
    Strict,
}

impl Voting {
    pub fn threshold(self, rho: u32) -> u32 {
        match self {
            Self::Majority => rho / 2 + 1,
            Self::Strict => rho,
        }
    }
}

/// Which group sizes the slicer may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grouping {
    /// Any size up to the bound.
    Contiguous,
    /// Only powers of two, so tags can reduce their hash with a bit mask.
    PowerOfTwo,
}

impl Grouping {
    pub fn allows(self, size: usize) -> bool {
        match self {
            Self::Contiguous => size > 0,
            Self::PowerOfTwo => size.is_power_of_two(),
        }
    }
}

/// Tunables of [`crate::LodsEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodsConfig {
    /// Upper bound on tags per group.
    pub max_group_size: usize,
    /// Reply ceiling in bits; halved for the group after a degraded read.
    pub max_reply_bits: u32,
    /// Redundancy used when the channel looks bad.
    pub robust_rho: u32,
    /// Redundancy used when the channel looks good.
    pub fast_rho: u32,
    /// Largest imperfect-check fraction still considered a good channel.
    pub tolerance: f64,
    /// Consecutive groups that must call for the other redundancy before it
    /// is adopted. 1 reacts to every group.
    pub switch_after: u32,
    pub voting: Voting,
    pub grouping: Grouping,
    /// Number of hash seeds tried before shrinking a group.
    pub seed_space: u32,
    /// Tell the kernel how many replies a command concatenates, so guard
    /// intervals are charged.
    pub report_concatenation: bool,
    /// Decode replies carrying burst erasure or sampling offset instead of
    /// losing the slot.
    pub accept_phy_impairments: bool,
    /// Command header bits on top of the prefix (opcode and seed).
    pub command_overhead_bits: u32,
    /// Must stay the last field: TOML emits tables after scalars.
    pub adaptation: Adaptation,
}

impl Default for LodsConfig {
    fn default() -> Self {
        Self {
            max_group_size: 128,
            max_reply_bits: 256,
            robust_rho: 4,
            fast_rho: 2,
            tolerance: 0.30,
            switch_after: 1,
            adaptation: Adaptation::Adaptive,
            voting: Voting::Majority,
            grouping: Grouping::Contiguous,
            seed_space: 16,
            report_concatenation: false,
            accept_phy_impairments: false,
            command_overhead_bits: 8,
        }
    }
}

/// A configuration the engine cannot run with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodsConfigError {
    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: u64,
        value: u64,
    },

    #[error("tolerance must be within [0, 1], got {0}")]
    Tolerance(f64),

    #[error(
        "reply ceiling of {max_reply_bits} bits cannot hold two robust sub-fields of {rho} bits"
    )]
    CeilingTooSmall { max_reply_bits: u32, rho: u32 },
}

impl LodsConfig {
    // ========================================================================
    // Presets
    // ========================================================================

    /// Fixed robust redundancy with a 128-bit reply ceiling.
    pub fn fixed_robust() -> Self {
        Self {
            adaptation: Adaptation::Fixed { rho: 4 },
            max_reply_bits: 128,
            ..Self::default()
        }
    }

    /// Decodes raw structural impairments.
    pub fn phy_aware() -> Self {
        Self {
            accept_phy_impairments: true,
            ..Self::default()
        }
    }

    /// Reports concatenation so guard intervals are charged.
    pub fn guard_aware() -> Self {
        Self {
            report_concatenation: true,
            ..Self::default()
        }
    }

    /// Requires every sub-field bit to confirm presence, with groups of at
    /// most 32 tags.
    pub fn strict() -> Self {
        Self {
            voting: Voting::Strict,
            max_group_size: 32,
            ..Self::default()
        }
    }

    /// Restricts groups to power-of-two sizes.
    pub fn power_of_two() -> Self {
        Self {
            grouping: Grouping::PowerOfTwo,
            ..Self::default()
        }
    }

    // ========================================================================
    // Builders
    // ========================================================================

    pub fn with_fixed_rho(mut self, rho: u32) -> Self {
        self.adaptation = Adaptation::Fixed { rho };
        self
    }

    pub fn with_max_group_size(mut self, size: usize) -> Self {
        self.max_group_size = size;
        self
    }

    pub fn with_max_reply_bits(mut self, bits: u32) -> Self {
        self.max_reply_bits = bits;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_switch_after(mut self, groups: u32) -> Self {
        self.switch_after = groups;
        self
    }

    /// Redundancy the first group of a run uses.
    pub fn initial_rho(&self) -> u32 {
        match self.adaptation {
            Adaptation::Adaptive => self.robust_rho,
            Adaptation::Fixed { rho } => rho,
        }
    }

    /// Largest redundancy this configuration can ever select.
    pub fn max_rho(&self) -> u32 {
        match self.adaptation {
            Adaptation::Adaptive => self.robust_rho.max(self.fast_rho),
            Adaptation::Fixed { rho } => rho,
        }
    }

    /// Checks that every tunable is usable.
    pub fn validate(&self) -> Result<(), LodsConfigError> {
        let minimums = [
            ("max_group_size", self.max_group_size as u64, 1),
            ("robust_rho", u64::from(self.robust_rho), 1),
            ("fast_rho", u64::from(self.fast_rho), 1),
            ("initial_rho", u64::from(self.initial_rho()), 1),
            ("seed_space", u64::from(self.seed_space), 1),
            ("switch_after", u64::from(self.switch_after), 1),
            ("max_reply_bits", u64::from(self.max_reply_bits), 4),
        ];
        for (field, value, min) in minimums {
            if value < min {
                return Err(LodsConfigError::TooSmall { field, min, value });
            }
        }

        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(LodsConfigError::Tolerance(self.tolerance));
        }

        // The stressed ceiling is half the configured one and must still fit
        // a sub-field of the largest redundancy.
        let rho = self.max_rho();
        if self.max_reply_bits / 2 < rho {
            return Err(LodsConfigError::CeilingTooSmall {
                max_reply_bits: self.max_reply_bits,
                rho,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 1 ; "single bit")]
    #[test_case(2, 2 ; "pair needs both")]
    #[test_case(3, 2 ; "odd")]
    #[test_case(4, 3 ; "robust tolerates one flip")]
    #[test_case(8, 5 ; "wide")]
    fn majority_threshold(rho: u32, threshold: u32) {
        assert_eq!(Voting::Majority.threshold(rho), threshold);
        assert_eq!(Voting::Strict.threshold(rho), rho);
    }

    #[test]
    fn power_of_two_grouping() {
        assert!(Grouping::PowerOfTwo.allows(1));
        assert!(Grouping::PowerOfTwo.allows(64));
        assert!(!Grouping::PowerOfTwo.allows(96));
        assert!(Grouping::Contiguous.allows(96));
        assert!(!Grouping::Contiguous.allows(0));
    }

    #[test]
    fn defaults_are_valid() {
        let config = LodsConfig::default();
        assert_eq!(config.initial_rho(), 4);
        assert!(config.validate().is_ok());
        for preset in [
            LodsConfig::fixed_robust(),
            LodsConfig::phy_aware(),
            LodsConfig::guard_aware(),
            LodsConfig::strict(),
            LodsConfig::power_of_two(),
        ] {
            assert!(preset.validate().is_ok(), "{preset:?}");
        }
    }

    #[test]
    fn strict_preset_uses_smaller_groups() {
        let strict = LodsConfig::strict();
        assert_eq!(strict.voting, Voting::Strict);
        assert_eq!(strict.max_group_size, 32);
        assert_eq!(strict.max_reply_bits, LodsConfig::default().max_reply_bits);
    }

    #[test]
    fn fixed_mode_starts_at_its_rho() {
        assert_eq!(LodsConfig::default().with_fixed_rho(2).initial_rho(), 2);
        assert_eq!(LodsConfig::fixed_robust().initial_rho(), 4);
    }

    #[test]
    fn rejects_unusable_values() {
        assert_eq!(
            LodsConfig::default().with_fixed_rho(0).validate(),
            Err(LodsConfigError::TooSmall {
                field: "initial_rho",
                min: 1,
                value: 0
            })
        );
        assert_eq!(
            LodsConfig::default().with_switch_after(0).validate(),
            Err(LodsConfigError::TooSmall {
                field: "switch_after",
                min: 1,
                value: 0
            })
        );
        assert_eq!(
            LodsConfig::default().with_tolerance(1.5).validate(),
            Err(LodsConfigError::Tolerance(1.5))
        );
        assert_eq!(
            LodsConfig::default().with_max_reply_bits(6).validate(),
            Err(LodsConfigError::CeilingTooSmall {
                max_reply_bits: 6,
                rho: 4
            })
        );
    }

    #[test]
    fn adaptation_round_trips_through_toml() {
        let config = LodsConfig::default().with_fixed_rho(3);
        let text = toml::to_string(&config).expect("serialize");
        assert!(text.contains("mode = \"fixed\""));
        let parsed: LodsConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let parsed: LodsConfig = toml::from_str("voting = \"strict\"\n").expect("deserialize");
        assert_eq!(parsed.voting, Voting::Strict);
        assert_eq!(parsed.max_group_size, 128);
        assert_eq!(parsed.adaptation, Adaptation::Adaptive);
    }
}
