//! One reader-command / tag-response exchange.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Epc, EpcPrefix, ReplyBits, Tag};

// ============================================================================
// Responder Selection
// ============================================================================

/// Which tags answer a command.
///
/// Prefix addressing covers the flagship protocol; `Predicate` exists for
/// schedulers that select responders by hash, counter or random draw.
#[derive(Clone)]
pub enum Responders {
    /// No tag answers.
    Nobody,
    /// Tags whose EPC starts with the prefix answer.
    Prefix(EpcPrefix),
    /// Tags for which the function returns true answer.
    Predicate(Arc<dyn Fn(&Tag) -> bool + Send + Sync>),
}

impl Responders {
    pub fn predicate(f: impl Fn(&Tag) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Returns true if `tag` would answer.
    pub fn selects(&self, tag: &Tag) -> bool {
        match self {
            Self::Nobody => false,
            Self::Prefix(prefix) => prefix.matches(tag.epc),
            Self::Predicate(f) => f(tag),
        }
    }
}

impl fmt::Debug for Responders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nobody => f.write_str("Nobody"),
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// ============================================================================
// Reader Command
// ============================================================================

/// The action a protocol chooses for one slot.
#[derive(Debug, Clone)]
pub struct ReaderCommand {
    /// Downlink cost in bits. Negative means "no more work".
    pub payload_bits: i64,
    /// Reply length the reader expects, in bits.
    pub expected_reply_bits: u32,
    pub responders: Responders,
    /// Number of tag replies concatenated into one physical transmission.
    pub concatenated_tags: u32,
}

impl ReaderCommand {
    /// Payload value reserved to signal completion.
    pub const TERMINATE_PAYLOAD: i64 = -1;

    pub fn new(payload_bits: u32, expected_reply_bits: u32, responders: Responders) -> Self {
        Self {
            payload_bits: i64::from(payload_bits),
            expected_reply_bits,
            responders,
            concatenated_tags: 1,
        }
    }

    /// Returns the completion sentinel.
    pub fn terminate() -> Self {
        Self {
            payload_bits: Self::TERMINATE_PAYLOAD,
            expected_reply_bits: 0,
            responders: Responders::Nobody,
            concatenated_tags: 1,
        }
    }

    pub fn with_concatenated_tags(mut self, count: u32) -> Self {
        self.concatenated_tags = count.max(1);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.payload_bits < 0
    }
}

// ============================================================================
// Slot Result
// ============================================================================

/// Physical outcome of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotStatus {
    /// Silence, failed preamble detection or undecodable reply.
    Idle,
    /// Exactly one decodable reply.
    Success,
    /// Two or more overlapping replies.
    Collision,
}

/// Structural damage passed to protocols that decode raw physical replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhyImpairments {
    /// Bits lost to a deep fade.
    pub erasure: ReplyBits,
    /// Sampling offset in bit times; replies appear this many bits late.
    pub shift: u32,
}

/// The kernel's report of one slot, handed to the protocol on its next call.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotResult {
    pub status: SlotStatus,
    /// Tags that actually answered (ground truth, before impairments).
    pub responders: Vec<Epc>,
    /// The single identifier the reader decoded, if any.
    pub resolved: Option<Epc>,
    /// Reply bits flipped by the channel.
    pub noise_mask: ReplyBits,
    pub impairments: Option<PhyImpairments>,
}

impl SlotResult {
    /// Placeholder for the first call of a run.
    pub fn idle() -> Self {
        Self {
            status: SlotStatus::Idle,
            responders: Vec::new(),
            resolved: None,
            noise_mask: ReplyBits::new(),
            impairments: None,
        }
    }
}

impl Default for SlotResult {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminate_is_terminal() {
        assert!(ReaderCommand::terminate().is_terminal());
        assert!(!ReaderCommand::new(0, 0, Responders::Nobody).is_terminal());
    }

    #[test]
    fn concatenation_never_drops_below_one() {
        let cmd = ReaderCommand::new(10, 8, Responders::Nobody).with_concatenated_tags(0);
        assert_eq!(cmd.concatenated_tags, 1);
    }

    #[test]
    fn prefix_responders_select_by_epc() {
        let inside = Tag::present(Epc::new(0b1100));
        let outside = Tag::present(Epc::new(0b1000));
        let responders = Responders::Prefix(inside.epc.prefix(94));
        assert!(responders.selects(&inside));
        assert!(!responders.selects(&outside));
    }

    #[test]
    fn predicate_responders_call_the_function() {
        let responders = Responders::predicate(|tag| tag.rssi_dbm > -50.0);
        assert!(responders.selects(&Tag::present(Epc::new(1)).with_rssi(-45.0)));
        assert!(!responders.selects(&Tag::present(Epc::new(1))));
        assert_eq!(format!("{responders:?}"), "Predicate(..)");
    }
}
