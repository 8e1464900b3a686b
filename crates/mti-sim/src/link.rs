//! Air-interface timing and energy accounting.
//!
//! Durations are exact integer nanoseconds; energy is accumulated in joules.

use mti_types::SlotStatus;

use crate::clock::{NANOS_PER_MICRO, NANOS_PER_SEC, ns_to_secs};

// ============================================================================
// Link Timing
// ============================================================================

/// Physical constants of the reader/tag link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTiming {
    /// Reader preamble before every command.
    pub preamble_ns: u64,
    /// Reader-to-tag turnaround.
    pub t1_ns: u64,
    /// Tag-to-reader turnaround.
    pub t2_ns: u64,
    /// Backscatter link frequency (tag bit rate).
    pub blf_hz: u64,
    /// Reader data rate.
    pub reader_rate_bps: u64,
    pub reader_tx_watts: f64,
    pub reader_rx_watts: f64,
    pub tag_tx_watts: f64,
    pub tag_rx_watts: f64,
    /// Replies up to this length need no acknowledgement round.
    pub short_reply_bits: u32,
    /// Length of the acknowledgement sent after a long reply.
    pub ack_bits: u32,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            preamble_ns: 300 * NANOS_PER_MICRO,
            t1_ns: 240 * NANOS_PER_MICRO,
            t2_ns: 120 * NANOS_PER_MICRO,
            blf_hz: 40_000,
            reader_rate_bps: 80_000,
            reader_tx_watts: 1.0,
            reader_rx_watts: 0.2,
            tag_tx_watts: 100e-6,
            tag_rx_watts: 10e-6,
            short_reply_bits: 20,
            ack_bits: 18,
        }
    }
}

impl LinkTiming {
    /// Duration of one reader bit.
    pub fn reader_bit_ns(&self) -> u64 {
        NANOS_PER_SEC / self.reader_rate_bps
    }

    /// Duration of one tag bit.
    pub fn tag_bit_ns(&self) -> u64 {
        NANOS_PER_SEC / self.blf_hz
    }

    /// Air time of a reader command carrying `payload_bits`.
    pub fn downlink_ns(&self, payload_bits: u64) -> u64 {
        self.preamble_ns + payload_bits * self.reader_bit_ns()
    }

    /// Air time of the reply phase.
    ///
    /// Idle slots cost one turnaround. Replies longer than
    /// `short_reply_bits` pay for an acknowledgement round. Concatenated
    /// replies pay a guard interval between neighbours.
    pub fn uplink_ns(
        &self,
        status: SlotStatus,
        reply_bits: u32,
        concatenated_tags: u32,
        guard_interval_bits: f64,
    ) -> u64 {
        if status == SlotStatus::Idle {
            return self.t1_ns;
        }

        let data = u64::from(reply_bits) * self.tag_bit_ns();
        let overhead = if reply_bits <= self.short_reply_bits {
            self.t1_ns + self.t2_ns
        } else {
            3 * self.t1_ns + 2 * self.t2_ns + u64::from(self.ack_bits) * self.reader_bit_ns()
        };
        let guard = if concatenated_tags > 1 && guard_interval_bits > 0.0 {
            let gaps = f64::from(concatenated_tags - 1);
            (gaps * guard_interval_bits * self.tag_bit_ns() as f64).round() as u64
        } else {
            0
        };

        data + overhead + guard
    }
}

// ============================================================================
// Energy Ledger
// ============================================================================

/// Accumulated reader and tag energy for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyLedger {
    pub reader_joules: f64,
    pub tag_joules: f64,
}

impl EnergyLedger {
    /// Charges a downlink phase. Every present tag listens when tracked.
    pub fn charge_downlink(
        &mut self,
        timing: &LinkTiming,
        duration_ns: u64,
        present_tags: usize,
        track_tags: bool,
    ) {
        let secs = ns_to_secs(duration_ns);
        self.reader_joules += timing.reader_tx_watts * secs;
        if track_tags {
            self.tag_joules += present_tags as f64 * timing.tag_rx_watts * secs;
        }
    }

    /// Charges an uplink phase. The reader keeps its carrier up; responders
    /// backscatter while the other present tags keep listening.
    pub fn charge_uplink(
        &mut self,
        timing: &LinkTiming,
        duration_ns: u64,
        responders: usize,
        present_tags: usize,
        track_tags: bool,
    ) {
        let secs = ns_to_secs(duration_ns);
        self.reader_joules += timing.reader_tx_watts * secs;
        if track_tags {
            let silent = present_tags.saturating_sub(responders);
            self.tag_joules += responders as f64 * timing.tag_tx_watts * secs;
            self.tag_joules += silent as f64 * timing.tag_rx_watts * secs;
        }
    }
}
