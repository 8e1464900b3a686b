//! Simulated air time.
//!
//! Air time only advances when the kernel charges a downlink or uplink
//! phase. Nanosecond resolution keeps every link duration an exact integer
//! (one reader bit is 12.5 µs, one tag bit 25 µs).

/// Nanoseconds in one microsecond.
pub const NANOS_PER_MICRO: u64 = 1_000;

/// Nanoseconds in one second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Discrete clock measuring accumulated air time.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ns: u64,
}

impl SimClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> u64 {
        self.now_ns
    }

    /// Current time in microseconds.
    #[inline]
    pub fn now_us(&self) -> f64 {
        self.now_ns as f64 / NANOS_PER_MICRO as f64
    }

    /// Advances the clock by `delta_ns`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds on overflow.
    #[inline]
    pub fn advance_by(&mut self, delta_ns: u64) {
        debug_assert!(
            self.now_ns.checked_add(delta_ns).is_some(),
            "clock overflow"
        );
        self.now_ns = self.now_ns.saturating_add(delta_ns);
    }
}

/// Converts a duration in nanoseconds to seconds.
#[inline]
pub fn ns_to_secs(ns: u64) -> f64 {
    ns as f64 / NANOS_PER_SEC as f64
}
