//! Reply bit patterns.
//!
//! Reply lengths routinely exceed 128 bits (the default reply ceiling is 256),
//! so masks are stored as a growable vector of 64-bit words. Bit 0 is the first
//! bit the reader samples; higher positions arrive later in time.

use std::fmt;

use serde::{Deserialize, Serialize};

const WORD_BITS: u32 = u64::BITS;

/// A growable bit vector over reply bit positions.
///
/// Trailing zero words are never stored, so two values with the same set bits
/// compare equal regardless of how they were built.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplyBits {
    words: Vec<u64>,
}

impl ReplyBits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a pattern with `len` ones starting at `start`.
    pub fn run(start: u32, len: u32) -> Self {
        let mut bits = Self::new();
        bits.set_run(start, len);
        bits
    }

    /// Returns true if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: u32) -> bool {
        let (word, offset) = Self::locate(index);
        self.words
            .get(word)
            .is_some_and(|w| (w >> offset) & 1 == 1)
    }

    pub fn set(&mut self, index: u32) {
        let (word, offset) = Self::locate(index);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << offset;
    }

    /// Sets `len` consecutive bits starting at `start`.
    pub fn set_run(&mut self, start: u32, len: u32) {
        for index in start..start + len {
            self.set(index);
        }
    }

    /// Number of set bits in `[start, start + len)`.
    pub fn count_ones_in(&self, start: u32, len: u32) -> u32 {
        (start..start + len).filter(|&i| self.get(i)).count() as u32
    }

    /// Total number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Position of the highest set bit plus one (0 when empty).
    pub fn span(&self) -> u32 {
        match self.words.last() {
            Some(last) => {
                (self.words.len() as u32 - 1) * WORD_BITS + (WORD_BITS - last.leading_zeros())
            }
            None => 0,
        }
    }

    /// Flips every bit that is set in `other`.
    pub fn xor_with(&mut self, other: &ReplyBits) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (dst, src) in self.words.iter_mut().zip(&other.words) {
            *dst ^= src;
        }
        self.trim();
    }

    /// Clears every bit that is set in `mask`.
    pub fn clear_masked(&mut self, mask: &ReplyBits) {
        for (dst, src) in self.words.iter_mut().zip(&mask.words) {
            *dst &= !src;
        }
        self.trim();
    }

    /// Moves every bit `amount` positions later in time (towards higher indices).
    pub fn shift_later(&mut self, amount: u32) {
        if amount == 0 || self.words.is_empty() {
            return;
        }
        let word_shift = (amount / WORD_BITS) as usize;
        let bit_shift = amount % WORD_BITS;
        let mut shifted = vec![0u64; self.words.len() + word_shift + 1];
        for (i, &word) in self.words.iter().enumerate() {
            shifted[i + word_shift] |= word << bit_shift;
            if bit_shift != 0 {
                shifted[i + word_shift + 1] |= word >> (WORD_BITS - bit_shift);
            }
        }
        self.words = shifted;
        self.trim();
    }

    /// Iterates over the positions of set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.span()).filter(|&i| self.get(i))
    }

    fn locate(index: u32) -> (usize, u32) {
        ((index / WORD_BITS) as usize, index % WORD_BITS)
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl fmt::Debug for ReplyBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ones()).finish()
    }
}
