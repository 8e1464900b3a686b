//! # mti-lods: Adaptive Collision Resolution for Missing-Tag Identification
//!
//! LODS verifies a known population of RFID tags group by group. Each
//! command addresses one contiguous run of the sorted expected EPCs by their
//! longest common prefix; every tag in the group answers with `rho` ones at a
//! sub-field chosen by a collision-free hash. The reader reconstructs the
//! superimposed reply it should have heard and votes per tag on what it did
//! hear.

#![allow(clippy::cast_possible_truncation)] // Group sizes and bit counts fit in u32
#![allow(clippy::cast_precision_loss)] // Imperfect fractions use f64
#![allow(clippy::struct_excessive_bools)] // Config structs have many feature flags
#![cfg_attr(test, allow(clippy::float_cmp))] // Test assertions use exact float comparisons
//!
//! ## Per-group cycle
//!
//! ```text
//!   sorted EPCs ──► slice (LCP, neighbours excluded) ──► seed search
//!        ▲                                                   │
//!        │                                          ReaderCommand (prefix,
//!   adapt rho ◄── vote per sub-field ◄── reconstruct ◄── reply bits)
//!                                          ▲
//!                                     SlotResult
//! ```
//!
//! ## Redundancy
//!
//! The engine starts at the robust redundancy (4 bits per tag, one flip
//! tolerated by majority vote) and drops to the fast one (2 bits) after a
//! group whose imperfect fraction is within tolerance. A degraded-but-present
//! read halves the reply ceiling of the next robust group, shortening the
//! reply so drift has less time to accumulate.
//!
//! ## Variants
//!
//! The published variants are presets of [`LodsConfig`]:
//! [`LodsConfig::fixed_robust`], [`LodsConfig::phy_aware`],
//! [`LodsConfig::guard_aware`], [`LodsConfig::strict`] and
//! [`LodsConfig::power_of_two`].

mod config;
mod engine;
mod redundancy;
pub mod slicing;
pub mod verify;

pub use config::{Adaptation, Grouping, LodsConfig, LodsConfigError, Voting};
pub use engine::LodsEngine;
pub use redundancy::RedundancyController;
pub use verify::GroupVerdict;
