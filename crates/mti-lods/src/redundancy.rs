//! Redundancy controller.
//!
//! After every verified group the controller compares the group's
//! imperfect-check fraction with the tolerance: at or below it the channel is
//! good and the next group uses the fast redundancy, above it the robust one.
//! With the default `switch_after = 1` the decision looks at the last group
//! only, so the engine recovers speed one group after the channel clears and
//! a single noisy group is enough to fall back. Larger values require that
//! many consecutive groups to agree before switching.

use crate::config::{Adaptation, LodsConfig};
use crate::verify::GroupVerdict;

#[derive(Debug, Clone, PartialEq)]
pub struct RedundancyController {
    adaptation: Adaptation,
    robust_rho: u32,
    fast_rho: u32,
    tolerance: f64,
    switch_after: u32,
    current: u32,
    /// Consecutive verdicts calling for the other redundancy.
    streak: u32,
}

impl RedundancyController {
    pub fn new(config: &LodsConfig) -> Self {
        Self {
            adaptation: config.adaptation,
            robust_rho: config.robust_rho,
            fast_rho: config.fast_rho,
            tolerance: config.tolerance,
            switch_after: config.switch_after.max(1),
            current: config.initial_rho(),
            streak: 0,
        }
    }

    /// Redundancy for the next group.
    pub fn rho(&self) -> u32 {
        self.current
    }

    /// Returns true if the next group runs at the robust redundancy.
    pub fn is_robust(&self) -> bool {
        self.current >= self.robust_rho
    }

    /// Feeds back one group's verdict. Fixed mode ignores it.
    pub fn record(&mut self, verdict: &GroupVerdict) {
        if self.adaptation != Adaptation::Adaptive || verdict.checks == 0 {
            return;
        }

        let fraction = verdict.imperfect_fraction();
        let next = if fraction <= self.tolerance {
            self.fast_rho
        } else {
            self.robust_rho
        };
        if next == self.current {
            self.streak = 0;
            return;
        }

        self.streak += 1;
        if self.streak >= self.switch_after {
            tracing::debug!(from = self.current, to = next, fraction, "redundancy switched");
            self.current = next;
            self.streak = 0;
        }
    }
}
