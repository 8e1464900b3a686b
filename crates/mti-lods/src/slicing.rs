//! Group slicing and perfect-seed search.
//!
//! # Algorithm Overview
//!
//! The expected EPCs are sorted, so the EPCs sharing any prefix form one
//! contiguous run. A group starting at the cursor is addressed by the longest
//! common prefix (LCP) of its first and last member; that prefix is safe when
//! neither sorted neighbour outside the group also carries it, because then
//! no tag outside the group can answer.
//!
//! Inside the group every tag picks a sub-slot `(epc ^ seed) % subslots`. The
//! reader searches a small seed space for a seed that is injective on the
//! group, so no two tags share a sub-field of the reply.

use mti_types::{Epc, EpcPrefix};

use crate::config::Grouping;

/// A contiguous range of sorted EPCs and the prefix addressing exactly it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: usize,
    pub size: usize,
    pub prefix: EpcPrefix,
}

/// Finds the largest group starting at `start`, at most `limit` tags, whose
/// LCP selects no sorted neighbour.
///
/// Size 1 always succeeds for distinct EPCs, since its prefix is the whole
/// identifier.
///
/// # Panics
///
/// Panics if `start` is out of range or `limit` is zero.
pub fn slice_group(sorted: &[Epc], start: usize, limit: usize, grouping: Grouping) -> Slice {
    assert!(start < sorted.len(), "slice start {start} out of range");
    assert!(limit > 0, "slice limit must be positive");

    let limit = limit.min(sorted.len() - start);
    let before = start.checked_sub(1).map(|i| sorted[i]);

    for size in (2..=limit).rev().filter(|&size| grouping.allows(size)) {
        let first = sorted[start];
        let last = sorted[start + size - 1];
        let prefix = first.prefix(first.common_prefix_len(last));

        let after = sorted.get(start + size).copied();
        let leaks = [before, after]
            .into_iter()
            .flatten()
            .any(|neighbour| prefix.matches(neighbour));
        if !leaks {
            return Slice {
                start,
                size,
                prefix,
            };
        }
    }

    Slice {
        start,
        size: 1,
        prefix: sorted[start].prefix(Epc::BITS),
    }
}

/// Sub-slot a tag hashes to under `seed`.
#[inline]
pub fn subslot(epc: Epc, seed: u32, subslots: u32) -> u32 {
    debug_assert!(subslots > 0);
    ((epc.value() ^ u128::from(seed)) % u128::from(subslots)) as u32
}

/// Returns the smallest seed in `0..seed_space` that maps every EPC of
/// `group` to a distinct sub-slot.
pub fn find_seed(group: &[Epc], subslots: u32, seed_space: u32) -> Option<u32> {
    if group.len() > subslots as usize {
        return None;
    }
    let mut taken = vec![false; subslots as usize];
    (0..seed_space).find(|&seed| {
        taken.iter_mut().for_each(|slot| *slot = false);
        group.iter().all(|&epc| {
            let slot = subslot(epc, seed, subslots) as usize;
            !std::mem::replace(&mut taken[slot], true)
        })
    })
}
