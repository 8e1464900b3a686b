//! # mti-sim: Physical-Layer Simulation Kernel
//!
//! This crate plays reader commands against a ground-truth tag population
//! over a simulated, impaired air interface, and accounts the time and energy
//! each exchange costs.

#![allow(clippy::cast_precision_loss)] // Stats and energy use f64
#![allow(clippy::cast_possible_truncation)] // Bit lengths fit in u32
#![allow(clippy::cast_sign_loss)] // Non-negative float to integer conversions
#![allow(clippy::struct_excessive_bools)] // Config structs have many feature flags
#![cfg_attr(test, allow(clippy::float_cmp))] // Test assertions use exact float comparisons
//!
//! ## Philosophy
//!
//! - **Reproducibility**: Same seed → same impairments → same statistics
//! - **Protocol agnosticism**: Any [`MtiProtocol`] can be driven
//! - **Ground truth stays here**: Protocols only ever see expected EPCs and
//!   slot outcomes, never which tags are really present
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Simulation                                │
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────────────┐   │
//! │  │ SimClock    │   │ LinkTiming   │   │ SimRng              │   │
//! │  │ (air time)  │   │ EnergyLedger │   │ (deterministic)     │   │
//! │  └─────────────┘   └──────────────┘   └─────────────────────┘   │
//! │                                                                   │
//! │  per slot:  command → responders → classify → channel → result   │
//! │                                                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐ │
//! │  │  MtiProtocol (e.g. mti-lods)  ←── SlotResult ───┐           │ │
//! │  │      └──── ReaderCommand ───────────────────────┘           │ │
//! │  └─────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use mti_sim::{Scenario, Simulation};
//! use mti_types::SimulationConfig;
//!
//! let config = SimulationConfig::default().with_seed(12345);
//! let tags = Scenario::from_config(&config).generate();
//! let stats = Simulation::new(config).run(&mut protocol, &tags)?;
//! println!("{} slots, {:.1} µs", stats.total_slots, stats.total_time_us);
//! ```

use mti_types::{
    Epc, MtiProtocol, ReaderCommand, SimulationConfig, SlotResult, SlotStatus, Tag,
};

mod accuracy;
mod clock;
mod error;
pub mod impairment;
mod link;
mod rng;
mod scenario;
mod stats;

pub use accuracy::AccuracyReport;
pub use clock::{NANOS_PER_MICRO, NANOS_PER_SEC, SimClock};
pub use error::SimError;
pub use link::{EnergyLedger, LinkTiming};
pub use rng::SimRng;
pub use scenario::Scenario;
pub use stats::SimulationStats;

// ============================================================================
// Simulation
// ============================================================================

/// One simulation run.
///
/// A `Simulation` is consumed by [`Simulation::run`], so every run starts
/// from a fresh clock, ledger and counters.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    timing: LinkTiming,
    rng: SimRng,
    clock: SimClock,
    energy: EnergyLedger,
    stats: SimulationStats,
}

impl Simulation {
    /// Creates a run whose RNG is seeded from `config.seed`.
    pub fn new(config: SimulationConfig) -> Self {
        let rng = SimRng::new(config.seed);
        Self::with_rng(config, rng)
    }

    /// Creates a run drawing from an externally seeded RNG.
    pub fn with_rng(config: SimulationConfig, rng: SimRng) -> Self {
        Self {
            config,
            timing: LinkTiming::default(),
            rng,
            clock: SimClock::new(),
            energy: EnergyLedger::default(),
            stats: SimulationStats::default(),
        }
    }

    /// Overrides the physical link constants.
    pub fn with_timing(mut self, timing: LinkTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Drives `protocol` over `tags` until it finishes.
    ///
    /// The protocol is initialized with every tag's EPC (present or not).
    /// On completion its verification sets must partition that list.
    ///
    /// # Errors
    ///
    /// - [`SimError::InvalidConfig`] if the configuration is out of range
    /// - [`SimError::SlotLimitExceeded`] if the protocol asks for slot
    ///   `max_slots + 1`
    /// - [`SimError::PartitionViolated`] if the final sets are inconsistent
    pub fn run<P>(mut self, protocol: &mut P, tags: &[Tag]) -> Result<SimulationStats, SimError>
    where
        P: MtiProtocol + ?Sized,
    {
        self.config.validate()?;

        let expected: Vec<Epc> = tags.iter().map(|tag| tag.epc).collect();
        let present: Vec<&Tag> = tags.iter().filter(|tag| tag.present).collect();
        let supports_phy = protocol.supports_phy_impairments();

        tracing::debug!(
            protocol = protocol.name(),
            expected = expected.len(),
            seed = self.config.seed,
            "starting simulation"
        );

        protocol.initialize(&expected);

        let mut prev = SlotResult::idle();
        while !protocol.is_finished() {
            let command = protocol.next_command(&prev);
            if command.is_terminal() {
                break;
            }

            // Only a slot beyond the budget is fatal.
            if self.stats.total_slots >= self.config.max_slots {
                tracing::error!(
                    protocol = protocol.name(),
                    limit = self.config.max_slots,
                    verified = protocol.results().verified(),
                    "slot limit exceeded"
                );
                return Err(SimError::SlotLimitExceeded {
                    protocol: protocol.name(),
                    limit: self.config.max_slots,
                });
            }
            prev = self.play_slot(&command, &present, supports_phy);
        }

        protocol
            .results()
            .check_partition(&expected)
            .map_err(|violation| SimError::PartitionViolated {
                protocol: protocol.name(),
                violation,
            })?;

        let stats = self.finish(protocol.name());
        tracing::info!(
            protocol = %stats.protocol,
            slots = stats.total_slots,
            time_us = stats.total_time_us,
            efficiency = stats.phy_efficiency(),
            "simulation complete"
        );
        Ok(stats)
    }

    /// Plays one command: downlink, responder selection, classification,
    /// channel, uplink.
    fn play_slot(
        &mut self,
        command: &ReaderCommand,
        present: &[&Tag],
        supports_phy: bool,
    ) -> SlotResult {
        let payload_bits = command.payload_bits.unsigned_abs();
        let downlink_ns = self.timing.downlink_ns(payload_bits);
        self.clock.advance_by(downlink_ns);
        self.energy.charge_downlink(
            &self.timing,
            downlink_ns,
            present.len(),
            self.config.energy_tracking,
        );
        self.stats.downlink_bits += payload_bits;

        let responders: Vec<&Tag> = present
            .iter()
            .copied()
            .filter(|tag| command.responders.selects(tag))
            .collect();

        let (physical, resolved) = impairment::classify(&responders, &self.config);
        self.stats.total_slots += 1;
        match physical {
            SlotStatus::Idle => self.stats.idle_slots += 1,
            SlotStatus::Success => self.stats.success_slots += 1,
            SlotStatus::Collision => self.stats.collision_slots += 1,
        }

        let reply_bits = command.expected_reply_bits;
        let channel = impairment::apply_channel(
            &self.config,
            physical,
            reply_bits,
            supports_phy,
            &mut self.rng,
        );
        if channel.lost {
            self.stats.lost_slots += 1;
        }
        if !channel.noise_mask.is_empty() {
            self.stats.corrupted_slots += 1;
        }

        let uplink_ns = self.timing.uplink_ns(
            channel.status,
            reply_bits,
            command.concatenated_tags,
            self.config.guard_interval_bits,
        );
        self.clock.advance_by(uplink_ns);
        self.energy.charge_uplink(
            &self.timing,
            uplink_ns,
            responders.len(),
            present.len(),
            self.config.energy_tracking,
        );
        if channel.status != SlotStatus::Idle {
            self.stats.uplink_bits += u64::from(reply_bits);
        }

        tracing::trace!(
            slot = self.stats.total_slots,
            ?physical,
            observed = ?channel.status,
            responders = responders.len(),
            reply_bits,
            "slot played"
        );

        SlotResult {
            status: channel.status,
            responders: responders.iter().map(|tag| tag.epc).collect(),
            resolved: resolved.filter(|_| channel.status == SlotStatus::Success),
            noise_mask: channel.noise_mask,
            impairments: channel.impairments,
        }
    }

    fn finish(mut self, protocol: &str) -> SimulationStats {
        self.stats.protocol = protocol.to_string();
        self.stats.total_time_us = self.clock.now_us();
        self.stats.reader_energy_j = self.energy.reader_joules;
        self.stats.tag_energy_j = self.energy.tag_joules;
        self.stats
    }
}

/// Runs `protocol` over `tags` under `config` in a fresh [`Simulation`].
///
/// # Errors
///
/// See [`Simulation::run`].
pub fn run_simulation<P>(
    protocol: &mut P,
    config: &SimulationConfig,
    tags: &[Tag],
) -> Result<SimulationStats, SimError>
where
    P: MtiProtocol + ?Sized,
{
    Simulation::new(config.clone()).run(protocol, tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mti_types::{Responders, VerificationSets};

    /// Probes each expected tag individually and trusts the slot status.
    struct RollCall {
        expected: Vec<Epc>,
        cursor: usize,
        sets: VerificationSets,
    }

    impl RollCall {
        fn new() -> Self {
            Self {
                expected: Vec::new(),
                cursor: 0,
                sets: VerificationSets::new(),
            }
        }
    }

    impl MtiProtocol for RollCall {
        fn name(&self) -> &'static str {
            "roll-call"
        }

        fn initialize(&mut self, expected: &[Epc]) {
            self.expected = expected.to_vec();
            self.cursor = 0;
            self.sets = VerificationSets::new();
        }

        fn next_command(&mut self, prev: &SlotResult) -> ReaderCommand {
            if self.cursor > 0 {
                let epc = self.expected[self.cursor - 1];
                if prev.status == SlotStatus::Success {
                    self.sets.confirm_present(epc);
                } else {
                    self.sets.confirm_missing(epc);
                }
            }
            if self.cursor == self.expected.len() {
                return ReaderCommand::terminate();
            }
            let epc = self.expected[self.cursor];
            self.cursor += 1;
            ReaderCommand::new(104, 16, Responders::Prefix(epc.prefix(Epc::BITS)))
        }

        fn is_finished(&self) -> bool {
            self.sets.verified() == self.expected.len() && self.cursor == self.expected.len()
        }

        fn results(&self) -> &VerificationSets {
            &self.sets
        }
    }

    fn population() -> Vec<Tag> {
        vec![
            Tag::present(Epc::new(1)),
            Tag::missing(Epc::new(2)),
            Tag::present(Epc::new(3)),
        ]
    }

    #[test]
    fn roll_call_is_exact_without_noise() {
        let tags = population();
        let mut protocol = RollCall::new();
        let stats = Simulation::new(SimulationConfig::ideal())
            .run(&mut protocol, &tags)
            .expect("run completes");

        assert_eq!(stats.total_slots, 3);
        assert_eq!(stats.success_slots, 2);
        assert_eq!(stats.idle_slots, 1);
        assert_eq!(stats.protocol, "roll-call");
        assert!(AccuracyReport::evaluate(&tags, protocol.results()).is_exact());
    }

    #[test]
    fn accounts_air_time_exactly() {
        let tags = population();
        let stats = run_simulation(&mut RollCall::new(), &SimulationConfig::ideal(), &tags)
            .expect("run completes");

        // downlink: 300 µs + 104 bits * 12.5 µs = 1600 µs per slot
        // uplink: success 16 * 25 + 360 = 760 µs, idle 240 µs
        let expected_us = 3.0 * 1600.0 + 2.0 * 760.0 + 240.0;
        assert!((stats.total_time_us - expected_us).abs() < 1e-9);
        assert_eq!(stats.downlink_bits, 3 * 104);
        assert_eq!(stats.uplink_bits, 2 * 16);
    }

    #[test]
    fn empty_population_finishes_immediately() {
        let stats = run_simulation(&mut RollCall::new(), &SimulationConfig::ideal(), &[])
            .expect("run completes");
        assert_eq!(stats.total_slots, 0);
        assert_eq!(stats.phy_efficiency(), 0.0);
    }

    #[test]
    fn invalid_config_is_rejected_before_any_slot() {
        let config = SimulationConfig::ideal().with_noise(2.0, 0.0);
        let err = run_simulation(&mut RollCall::new(), &config, &population())
            .expect_err("invalid rate");
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn exact_slot_budget_lets_the_protocol_close() {
        let tags = population();
        let mut protocol = RollCall::new();
        let config = SimulationConfig::ideal().with_max_slots(3);
        let stats = run_simulation(&mut protocol, &config, &tags).expect("three slots suffice");

        assert_eq!(stats.total_slots, 3);
        assert!(protocol.results().missing().contains(&Epc::new(2)));
        assert!(AccuracyReport::evaluate(&tags, protocol.results()).is_exact());
    }

    #[test]
    fn slot_limit_aborts_run() {
        let config = SimulationConfig::ideal().with_max_slots(2);
        let err = run_simulation(&mut RollCall::new(), &config, &population())
            .expect_err("three tags need three slots");
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            SimError::SlotLimitExceeded {
                protocol: "roll-call",
                limit: 2
            }
        ));
    }
}
