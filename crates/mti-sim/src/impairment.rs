//! Channel impairment model.
//!
//! Each impairment is a pure function of the configuration, the declared
//! reply length and the run's RNG, so a given seed reproduces the exact same
//! damage. [`apply_channel`] composes them in the order the reader's receiver
//! would experience them:
//!
//! 1. **Packet loss**: the preamble is not detected and the slot reads idle.
//! 2. **Bit errors**: independent flips at the configured bit-error rate.
//! 3. **Clock drift**: bits beyond the coherence limit are corrupted.
//! 4. **Structural damage**: a burst erasure and/or a sampling offset, which
//!    only protocols that decode raw replies can make use of.
//!
//! Packet loss and bit errors are gated on the noise flag; drift and the
//! structural impairments are not.

use mti_types::{Epc, PhyImpairments, ReplyBits, SimulationConfig, SlotStatus, Tag};

use crate::SimRng;

// ============================================================================
// Collision Classification
// ============================================================================

/// Returns the strongest responder if it beats the runner-up by at least
/// `margin_db`. Needs two or more responders.
pub fn capture_winner(responders: &[&Tag], margin_db: f64) -> Option<Epc> {
    if responders.len() < 2 {
        return None;
    }

    let mut strongest = responders[0];
    let mut runner_up = responders[1];
    if runner_up.rssi_dbm > strongest.rssi_dbm {
        std::mem::swap(&mut strongest, &mut runner_up);
    }
    for &tag in &responders[2..] {
        if tag.rssi_dbm > strongest.rssi_dbm {
            runner_up = strongest;
            strongest = tag;
        } else if tag.rssi_dbm > runner_up.rssi_dbm {
            runner_up = tag;
        }
    }

    (strongest.rssi_dbm - runner_up.rssi_dbm >= margin_db).then_some(strongest.epc)
}

/// Classifies a slot from the set of tags that answered.
///
/// Returns the status and the decoded identifier, if exactly one reply is
/// decodable (a single responder, or a collision won by capture).
pub fn classify(responders: &[&Tag], config: &SimulationConfig) -> (SlotStatus, Option<Epc>) {
    match responders {
        [] => (SlotStatus::Idle, None),
        [only] => (SlotStatus::Success, Some(only.epc)),
        _ => {
            let winner = if config.capture_effect {
                capture_winner(responders, config.capture_margin_db)
            } else {
                None
            };
            match winner {
                Some(epc) => (SlotStatus::Success, Some(epc)),
                None => (SlotStatus::Collision, None),
            }
        }
    }
}

// ============================================================================
// Individual Impairments
// ============================================================================

/// Draws whether the whole reply is lost.
pub fn packet_lost(config: &SimulationConfig, rng: &mut SimRng) -> bool {
    config.noise_enabled && rng.next_bool_with_probability(config.packet_error_rate)
}

/// Draws independent bit flips over `reply_bits` positions.
pub fn bit_errors(config: &SimulationConfig, reply_bits: u32, rng: &mut SimRng) -> ReplyBits {
    let mut mask = ReplyBits::new();
    if !config.noise_enabled || config.bit_error_rate <= 0.0 {
        return mask;
    }
    for index in 0..reply_bits {
        if rng.next_bool_with_probability(config.bit_error_rate) {
            mask.set(index);
        }
    }
    mask
}

/// Number of leading reply bits sampled reliably under relative clock drift.
///
/// The sampling point slides by `drift_rate` bit times per bit; once it has
/// slid half a bit the reader samples the wrong symbol. `None` when drift is
/// disabled.
pub fn coherence_limit(drift_rate: f64) -> Option<u32> {
    if drift_rate > 0.0 {
        Some((0.5 / drift_rate).floor() as u32)
    } else {
        None
    }
}

/// Corrupts every bit from the coherence limit to the end of the reply.
pub fn drift_errors(drift_rate: f64, reply_bits: u32) -> ReplyBits {
    match coherence_limit(drift_rate) {
        Some(limit) if limit < reply_bits => ReplyBits::run(limit, reply_bits - limit),
        _ => ReplyBits::new(),
    }
}

/// Draws burst erasure and sampling offset, if either is configured.
///
/// The burst start is uniform in `[0, reply_bits - burst_len]`.
pub fn structural_damage(
    config: &SimulationConfig,
    reply_bits: u32,
    rng: &mut SimRng,
) -> Option<PhyImpairments> {
    if !config.has_structural_impairments() {
        return None;
    }

    let burst = config.burst_erasure_bits;
    let erasure = if burst > 0 {
        let start = rng.next_u32_inclusive(0, reply_bits.saturating_sub(burst));
        ReplyBits::run(start, burst)
    } else {
        ReplyBits::new()
    };

    Some(PhyImpairments {
        erasure,
        shift: config.jitter_offset_bits,
    })
}

// ============================================================================
// Composition
// ============================================================================

/// What the reader actually observed after the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutcome {
    pub status: SlotStatus,
    pub noise_mask: ReplyBits,
    pub impairments: Option<PhyImpairments>,
    /// The reply existed but the reader could not use it.
    pub lost: bool,
}

impl ChannelOutcome {
    fn clean(status: SlotStatus) -> Self {
        Self {
            status,
            noise_mask: ReplyBits::new(),
            impairments: None,
            lost: false,
        }
    }

    fn lost() -> Self {
        Self {
            lost: true,
            ..Self::clean(SlotStatus::Idle)
        }
    }
}

/// Passes a physically classified slot through the channel.
///
/// Idle slots and zero-length replies are untouched. A slot hit by
/// structural damage degrades to idle unless the protocol declared it
/// decodes raw impairments.
pub fn apply_channel(
    config: &SimulationConfig,
    status: SlotStatus,
    reply_bits: u32,
    supports_phy_impairments: bool,
    rng: &mut SimRng,
) -> ChannelOutcome {
    if status == SlotStatus::Idle || reply_bits == 0 {
        return ChannelOutcome::clean(status);
    }

    if packet_lost(config, rng) {
        return ChannelOutcome::lost();
    }

    let mut noise_mask = bit_errors(config, reply_bits, rng);
    for index in drift_errors(config.clock_drift_rate, reply_bits).ones() {
        noise_mask.set(index);
    }

    let impairments = structural_damage(config, reply_bits, rng);
    if impairments.is_some() && !supports_phy_impairments {
        return ChannelOutcome::lost();
    }

    ChannelOutcome {
        status,
        noise_mask,
        impairments,
        lost: false,
    }
}
