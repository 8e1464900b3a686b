//! # mti-types: Core types for missing-tag identification
//!
//! This crate contains the data model shared by the simulation kernel and
//! every collision-resolution protocol it drives:
//! - Tag identity ([`Epc`], [`EpcPrefix`], [`Tag`])
//! - Reply bit patterns ([`ReplyBits`])
//! - Slot exchange ([`ReaderCommand`], [`Responders`], [`SlotResult`], [`SlotStatus`],
//!   [`PhyImpairments`])
//! - Channel configuration ([`SimulationConfig`])
//! - The protocol contract ([`MtiProtocol`]) and its outputs ([`VerificationSets`],
//!   [`PartitionViolation`])

mod bits;
mod config;
mod epc;
mod protocol;
mod slot;

pub use bits::ReplyBits;
pub use config::{ConfigInvalid, MAX_STRUCTURAL_BITS, SimulationConfig};
pub use epc::{Epc, EpcParseError, EpcPrefix, Tag};
pub use protocol::{MtiProtocol, PartitionViolation, VerificationSets};
pub use slot::{PhyImpairments, ReaderCommand, Responders, SlotResult, SlotStatus};
