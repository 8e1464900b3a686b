//! Aggregate statistics of one run.

use serde::Serialize;

/// Counters and totals produced by [`crate::Simulation::run`].
///
/// Slot counters record the physical classification (after capture, before
/// channel impairments); `lost_slots` and `corrupted_slots` count what the
/// channel did to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationStats {
    pub protocol: String,
    pub total_time_us: f64,
    pub reader_energy_j: f64,
    pub tag_energy_j: f64,
    pub total_slots: u64,
    pub success_slots: u64,
    pub collision_slots: u64,
    pub idle_slots: u64,
    /// Replies the reader could not use (packet loss, unsupported damage).
    pub lost_slots: u64,
    /// Replies with at least one corrupted bit.
    pub corrupted_slots: u64,
    pub downlink_bits: u64,
    pub uplink_bits: u64,
}

impl SimulationStats {
    /// Fraction of slots that carried exactly one decodable reply.
    pub fn phy_efficiency(&self) -> f64 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.success_slots as f64 / self.total_slots as f64
        }
    }

    /// Mean air time per slot in microseconds.
    pub fn mean_slot_us(&self) -> f64 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.total_time_us / self.total_slots as f64
        }
    }
}
