//! Reply reconstruction and per-tag voting.

use std::collections::BTreeSet;

use mti_types::{Epc, ReplyBits, SlotResult, SlotStatus, VerificationSets};
use serde::Serialize;

use crate::config::Voting;

/// A tag's place in a pending group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub epc: Epc,
    pub subslot: u32,
}

/// A group whose command is on the air, awaiting the slot result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGroup {
    pub assignments: Vec<Assignment>,
    pub rho: u32,
    pub seed: u32,
    pub reply_bits: u32,
}

impl PendingGroup {
    /// Bit position where `assignment`'s sub-field starts.
    fn offset(&self, assignment: &Assignment) -> u32 {
        assignment.subslot * self.rho
    }
}

/// Outcome of verifying one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupVerdict {
    /// Tags judged.
    pub checks: u32,
    /// Tags confirmed missing plus tags confirmed present with flipped bits.
    pub imperfect: u32,
    pub confirmed_present: u32,
    pub confirmed_missing: u32,
    /// Some tag was confirmed present with fewer than `rho` bits set.
    pub degraded_present: bool,
}

impl GroupVerdict {
    pub fn imperfect_fraction(&self) -> f64 {
        if self.checks == 0 {
            0.0
        } else {
            f64::from(self.imperfect) / f64::from(self.checks)
        }
    }
}

/// Builds the superimposed reply the group would produce on a clean channel.
///
/// Each responding member sets `rho` consecutive bits at its sub-field.
pub fn reconstruct(group: &PendingGroup, responders: &BTreeSet<Epc>) -> ReplyBits {
    let mut bits = ReplyBits::new();
    for assignment in &group.assignments {
        if responders.contains(&assignment.epc) {
            bits.set_run(group.offset(assignment), group.rho);
        }
    }
    bits
}

/// Derives the reply the reader observed.
///
/// An idle slot reads as silence unless the protocol decodes raw impairments
/// and the slot carries them. With `accept_phy_impairments`, the clean reply
/// is shifted by the sampling offset and loses the erased bits before the
/// noise mask is applied.
pub fn observe(
    group: &PendingGroup,
    result: &SlotResult,
    accept_phy_impairments: bool,
) -> ReplyBits {
    let decodable = result.status != SlotStatus::Idle
        || (accept_phy_impairments && result.impairments.is_some());
    let responders: BTreeSet<Epc> = if decodable {
        result.responders.iter().copied().collect()
    } else {
        BTreeSet::new()
    };

    let mut observed = reconstruct(group, &responders);
    if accept_phy_impairments {
        if let Some(impairments) = &result.impairments {
            observed.shift_later(impairments.shift);
            observed.clear_masked(&impairments.erasure);
        }
    }
    observed.xor_with(&result.noise_mask);
    observed
}

/// Votes on every member of `group` and records the verdicts in `sets`.
pub fn judge(
    group: &PendingGroup,
    observed: &ReplyBits,
    voting: Voting,
    sets: &mut VerificationSets,
) -> GroupVerdict {
    let threshold = voting.threshold(group.rho);
    let mut verdict = GroupVerdict::default();

    for assignment in &group.assignments {
        verdict.checks += 1;
        let votes = observed.count_ones_in(group.offset(assignment), group.rho);
        if votes >= threshold {
            sets.confirm_present(assignment.epc);
            verdict.confirmed_present += 1;
            if votes < group.rho {
                verdict.imperfect += 1;
                verdict.degraded_present = true;
            }
        } else {
            sets.confirm_missing(assignment.epc);
            verdict.confirmed_missing += 1;
            verdict.imperfect += 1;
        }
    }

    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use mti_types::PhyImpairments;

    fn group(rho: u32) -> PendingGroup {
        PendingGroup {
            assignments: (0..4)
                .map(|i| Assignment {
                    epc: Epc::new(u128::from(i)),
                    subslot: i,
                })
                .collect(),
            rho,
            seed: 0,
            reply_bits: 4 * rho,
        }
    }

    fn result(status: SlotStatus, responders: &[u128], noise: ReplyBits) -> SlotResult {
        SlotResult {
            status,
            responders: responders.iter().copied().map(Epc::new).collect(),
            resolved: None,
            noise_mask: noise,
            impairments: None,
        }
    }

    #[test]
    fn reconstruct_sets_sub_fields_of_responders() {
        let g = group(4);
        let responders: BTreeSet<Epc> = [Epc::new(1), Epc::new(3)].into();
        let bits = reconstruct(&g, &responders);
        assert_eq!(bits.ones().collect::<Vec<_>>(), vec![4, 5, 6, 7, 12, 13, 14, 15]);
    }

    #[test]
    fn reconstruct_ignores_non_members() {
        let g = group(2);
        let responders: BTreeSet<Epc> = [Epc::new(99)].into();
        assert!(reconstruct(&g, &responders).is_empty());
    }

    #[test]
    fn clean_collision_confirms_responders() {
        let g = group(4);
        let slot = result(SlotStatus::Collision, &[0, 2], ReplyBits::new());
        let observed = observe(&g, &slot, false);
        let mut sets = VerificationSets::new();
        let verdict = judge(&g, &observed, Voting::Majority, &mut sets);

        assert_eq!(verdict.confirmed_present, 2);
        assert_eq!(verdict.confirmed_missing, 2);
        assert_eq!(verdict.imperfect, 2);
        assert!(!verdict.degraded_present);
        assert!(sets.present().contains(&Epc::new(0)));
        assert!(sets.missing().contains(&Epc::new(1)));
    }

    #[test]
    fn one_flip_is_tolerated_two_are_not() {
        let g = group(4);
        let mut sets = VerificationSets::new();

        let slot = result(SlotStatus::Collision, &[0, 1, 2, 3], ReplyBits::run(0, 1));
        let one_flip = observe(&g, &slot, false);
        let verdict = judge(&g, &one_flip, Voting::Majority, &mut sets);
        assert_eq!(verdict.confirmed_present, 4);
        assert!(verdict.degraded_present);
        assert_eq!(verdict.imperfect, 1);

        let mut sets = VerificationSets::new();
        let slot = result(SlotStatus::Collision, &[0, 1, 2, 3], ReplyBits::run(0, 2));
        let two_flips = observe(&g, &slot, false);
        let verdict = judge(&g, &two_flips, Voting::Majority, &mut sets);
        assert_eq!(verdict.confirmed_missing, 1);
        assert!(sets.missing().contains(&Epc::new(0)));
    }

    #[test]
    fn strict_voting_rejects_any_flip() {
        let g = group(4);
        let mut sets = VerificationSets::new();
        let slot = result(SlotStatus::Collision, &[0, 1, 2, 3], ReplyBits::run(0, 1));
        let observed = observe(&g, &slot, false);
        let verdict = judge(&g, &observed, Voting::Strict, &mut sets);
        assert_eq!(verdict.confirmed_missing, 1);
        assert_eq!(verdict.confirmed_present, 3);
    }

    #[test]
    fn idle_slot_reads_as_silence() {
        let g = group(2);
        let observed = observe(&g, &result(SlotStatus::Idle, &[0, 1], ReplyBits::new()), false);
        assert!(observed.is_empty());
    }

    #[test]
    fn phy_impairments_shift_then_erase_then_flip() {
        let g = group(4);
        let mut slot = result(SlotStatus::Collision, &[0], ReplyBits::run(10, 1));
        slot.impairments = Some(PhyImpairments {
            erasure: ReplyBits::run(1, 1),
            shift: 1,
        });

        let observed = observe(&g, &slot, true);
        // bits 0..4 shifted to 1..5, bit 1 erased, bit 10 flipped
        assert_eq!(observed.ones().collect::<Vec<_>>(), vec![2, 3, 4, 10]);

        let ignored = observe(&g, &slot, false);
        assert_eq!(ignored.ones().collect::<Vec<_>>(), vec![0, 1, 2, 3, 10]);
    }

    #[test]
    fn imperfect_fraction() {
        let verdict = GroupVerdict {
            checks: 10,
            imperfect: 3,
            ..GroupVerdict::default()
        };
        assert_eq!(verdict.imperfect_fraction(), 0.3);
        assert_eq!(GroupVerdict::default().imperfect_fraction(), 0.0);
    }
}
