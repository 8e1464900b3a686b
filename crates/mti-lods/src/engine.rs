//! The LODS engine: slice, hash, verify, adapt.

use mti_types::{Epc, MtiProtocol, ReaderCommand, Responders, SlotResult, VerificationSets};

use crate::config::{LodsConfig, LodsConfigError};
use crate::redundancy::RedundancyController;
use crate::slicing::{self, Slice};
use crate::verify::{self, Assignment, GroupVerdict, PendingGroup};

/// Shortest reply the reader will schedule, in bits.
const MIN_REPLY_BITS: u32 = 4;

/// Commands whose header is shorter than this carry a CRC-5, longer ones a CRC-16.
const CRC5_LIMIT_BITS: u32 = 32;
const CRC5_BITS: u32 = 5;
const CRC16_BITS: u32 = 16;

/// A slice together with the hash parameters that make it collision-free.
#[derive(Debug, Clone, Copy)]
struct GroupPlan {
    slice: Slice,
    seed: u32,
    reply_bits: u32,
    subslots: u32,
}

/// Adaptive LCP-sliced missing-tag identification.
///
/// Each call to [`MtiProtocol::next_command`] first verifies the group sent
/// by the previous call against its slot result, adapts the redundancy, and
/// then schedules the next group starting at the cursor. Every expected tag
/// belongs to exactly one group, so the run ends after one pass.
#[derive(Debug, Clone)]
pub struct LodsEngine {
    config: LodsConfig,
    sorted: Vec<Epc>,
    cursor: usize,
    sets: VerificationSets,
    redundancy: RedundancyController,
    pending: Option<PendingGroup>,
    /// The last verified group had a degraded-but-present tag.
    stressed: bool,
    last_verdict: Option<GroupVerdict>,
    running: bool,
}

impl LodsEngine {
    /// Creates an engine.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`LodsConfig::validate`].
    pub fn new(config: LodsConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid LODS config: {e}");
        }
        Self::build(config)
    }

    /// Creates an engine, rejecting unusable configurations.
    pub fn try_new(config: LodsConfig) -> Result<Self, LodsConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: LodsConfig) -> Self {
        Self {
            redundancy: RedundancyController::new(&config),
            config,
            sorted: Vec::new(),
            cursor: 0,
            sets: VerificationSets::new(),
            pending: None,
            stressed: false,
            last_verdict: None,
            running: false,
        }
    }

    pub fn config(&self) -> &LodsConfig {
        &self.config
    }

    /// Redundancy the next group will use.
    pub fn rho(&self) -> u32 {
        self.redundancy.rho()
    }

    /// Verdict of the most recently verified group.
    pub fn last_verdict(&self) -> Option<&GroupVerdict> {
        self.last_verdict.as_ref()
    }

    /// Number of expected tags already scheduled.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The group currently awaiting its slot result.
    pub fn pending(&self) -> Option<&PendingGroup> {
        self.pending.as_ref()
    }

    /// Reply ceiling for the next group.
    fn reply_ceiling(&self) -> u32 {
        if self.stressed && self.redundancy.is_robust() {
            self.config.max_reply_bits / 2
        } else {
            self.config.max_reply_bits
        }
    }

    fn verify_pending(&mut self, prev: &SlotResult) {
        let Some(group) = self.pending.take() else {
            return;
        };

        let observed = verify::observe(&group, prev, self.config.accept_phy_impairments);
        let verdict = verify::judge(&group, &observed, self.config.voting, &mut self.sets);
        tracing::trace!(
            checks = verdict.checks,
            present = verdict.confirmed_present,
            missing = verdict.confirmed_missing,
            imperfect = verdict.imperfect,
            "group verified"
        );

        self.redundancy.record(&verdict);
        self.stressed = verdict.degraded_present;
        self.last_verdict = Some(verdict);
    }

    /// Picks the largest group at the cursor for which a perfect seed exists.
    fn plan_group(&self, rho: u32, ceiling: u32) -> GroupPlan {
        let remaining = self.sorted.len() - self.cursor;
        let mut limit = self
            .config
            .max_group_size
            .min((ceiling / rho) as usize)
            .min(remaining)
            .max(1);

        loop {
            let slice =
                slicing::slice_group(&self.sorted, self.cursor, limit, self.config.grouping);
            let desired = u32::try_from(slice.size)
                .unwrap_or(u32::MAX)
                .saturating_mul(rho);
            let reply_bits = desired.min(ceiling).max(MIN_REPLY_BITS);
            let subslots = (reply_bits / rho).max(1);

            let members = &self.sorted[slice.start..slice.start + slice.size];
            match slicing::find_seed(members, subslots, self.config.seed_space) {
                Some(seed) => {
                    return GroupPlan {
                        slice,
                        seed,
                        reply_bits,
                        subslots,
                    };
                }
                None => {
                    // A single tag always fits under seed zero.
                    debug_assert!(slice.size > 1);
                    limit = slice.size - 1;
                }
            }
        }
    }

    fn schedule_next(&mut self) -> ReaderCommand {
        let rho = self.redundancy.rho();
        let ceiling = self.reply_ceiling();
        let GroupPlan {
            slice,
            seed,
            reply_bits,
            subslots,
        } = self.plan_group(rho, ceiling);

        let members = &self.sorted[slice.start..slice.start + slice.size];
        let assignments = members
            .iter()
            .map(|&epc| Assignment {
                epc,
                subslot: slicing::subslot(epc, seed, subslots),
            })
            .collect();

        let header_bits = slice.prefix.len() + self.config.command_overhead_bits;
        let crc_bits = if header_bits < CRC5_LIMIT_BITS {
            CRC5_BITS
        } else {
            CRC16_BITS
        };

        tracing::debug!(
            cursor = self.cursor,
            size = slice.size,
            prefix = %slice.prefix,
            rho,
            seed,
            reply_bits,
            "scheduling group"
        );

        let concatenated = if self.config.report_concatenation {
            u32::try_from(slice.size).unwrap_or(u32::MAX)
        } else {
            1
        };
        self.pending = Some(PendingGroup {
            assignments,
            rho,
            seed,
            reply_bits,
        });
        self.cursor += slice.size;

        ReaderCommand::new(
            header_bits + crc_bits,
            reply_bits,
            Responders::Prefix(slice.prefix),
        )
        .with_concatenated_tags(concatenated)
    }
}

impl Default for LodsEngine {
    fn default() -> Self {
        Self::new(LodsConfig::default())
    }
}

impl MtiProtocol for LodsEngine {
    fn name(&self) -> &'static str {
        "lods"
    }

    fn initialize(&mut self, expected: &[Epc]) {
        let mut sorted = expected.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        tracing::debug!(
            expected = expected.len(),
            unique = sorted.len(),
            rho = self.config.initial_rho(),
            "initializing"
        );

        *self = Self {
            sorted,
            running: true,
            ..Self::build(self.config.clone())
        };
    }

    fn next_command(&mut self, prev: &SlotResult) -> ReaderCommand {
        self.verify_pending(prev);

        if self.cursor >= self.sorted.len() {
            self.running = false;
            return ReaderCommand::terminate();
        }
        self.schedule_next()
    }

    fn is_finished(&self) -> bool {
        !self.running
    }

    fn results(&self) -> &VerificationSets {
        &self.sets
    }

    fn supports_phy_impairments(&self) -> bool {
        self.config.accept_phy_impairments
    }
}
