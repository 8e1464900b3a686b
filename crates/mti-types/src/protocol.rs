//! The contract between the simulation kernel and a collision-resolution
//! protocol, and the verification sets every protocol produces.

use std::collections::BTreeSet;

use crate::{Epc, ReaderCommand, SlotResult};

// ============================================================================
// Protocol Contract
// ============================================================================

/// A missing-tag identification protocol the kernel can drive.
///
/// The kernel alternates strictly with the protocol: it asks for a command,
/// plays the slot, and hands the outcome back on the next call. Each instance
/// owns its run state exclusively, so no synchronization is involved.
pub trait MtiProtocol {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Resets all state for a fresh run over `expected`.
    ///
    /// Must be callable repeatedly on the same instance.
    fn initialize(&mut self, expected: &[Epc]);

    /// Chooses the next command given the previous slot's outcome.
    ///
    /// The first call of a run receives [`SlotResult::idle`]. Returning
    /// [`ReaderCommand::terminate`] ends the run.
    fn next_command(&mut self, prev: &SlotResult) -> ReaderCommand;

    fn is_finished(&self) -> bool;

    /// Confirmed-present and confirmed-missing identifiers so far.
    ///
    /// Only complete (a partition of the expected population) once
    /// [`MtiProtocol::is_finished`] returns true.
    fn results(&self) -> &VerificationSets;

    /// Declares that the protocol decodes raw structural damage (burst
    /// erasure, jitter) itself instead of treating it as a lost slot.
    fn supports_phy_impairments(&self) -> bool {
        false
    }
}

// ============================================================================
// Verification Sets
// ============================================================================

/// Confirmed-present and confirmed-missing identifiers.
///
/// The two sets are disjoint at all times and only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationSets {
    present: BTreeSet<Epc>,
    missing: BTreeSet<Epc>,
}

impl VerificationSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `epc` as present.
    ///
    /// # Panics
    ///
    /// Panics if `epc` was already confirmed missing.
    pub fn confirm_present(&mut self, epc: Epc) {
        assert!(
            !self.missing.contains(&epc),
            "{epc} confirmed present after being confirmed missing"
        );
        self.present.insert(epc);
    }

    /// Records `epc` as missing.
    ///
    /// # Panics
    ///
    /// Panics if `epc` was already confirmed present.
    pub fn confirm_missing(&mut self, epc: Epc) {
        assert!(
            !self.present.contains(&epc),
            "{epc} confirmed missing after being confirmed present"
        );
        self.missing.insert(epc);
    }

    pub fn present(&self) -> &BTreeSet<Epc> {
        &self.present
    }

    pub fn missing(&self) -> &BTreeSet<Epc> {
        &self.missing
    }

    /// Number of identifiers with a verdict.
    pub fn verified(&self) -> usize {
        self.present.len() + self.missing.len()
    }

    /// Checks that the sets are disjoint and together equal `expected`.
    pub fn check_partition<'a>(
        &self,
        expected: impl IntoIterator<Item = &'a Epc>,
    ) -> Result<(), PartitionViolation> {
        let expected: BTreeSet<Epc> = expected.into_iter().copied().collect();
        let overlap: Vec<Epc> = self.present.intersection(&self.missing).copied().collect();
        let unaccounted: Vec<Epc> = expected
            .iter()
            .filter(|epc| !self.present.contains(*epc) && !self.missing.contains(*epc))
            .copied()
            .collect();
        let extraneous: Vec<Epc> = self
            .present
            .union(&self.missing)
            .filter(|epc| !expected.contains(*epc))
            .copied()
            .collect();

        if overlap.is_empty() && unaccounted.is_empty() && extraneous.is_empty() {
            Ok(())
        } else {
            Err(PartitionViolation {
                overlap,
                unaccounted,
                extraneous,
            })
        }
    }
}

/// Present/missing sets that do not partition the expected population.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{} in both sets, {} never verified, {} not expected",
    .overlap.len(),
    .unaccounted.len(),
    .extraneous.len()
)]
pub struct PartitionViolation {
    pub overlap: Vec<Epc>,
    pub unaccounted: Vec<Epc>,
    pub extraneous: Vec<Epc>,
}
