//! Saturating diagnostic counters for registries and gates.

/// Counters kept by a registry across its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegistryCounters {
    /// Number of ticks begun.
    pub ticks: u64,
    /// Number of publishes accepted into a snapshot.
    pub publishes: u64,
    /// Number of publishes that repeated an id within one tick.
    pub duplicates: u64,
}

impl RegistryCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start of a tick.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    /// Records an accepted publish.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_publish(&mut self) {
        self.publishes = self.publishes.saturating_add(1);
    }

    /// Records a repeated publish, whether it was rejected or overwrote.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_duplicate(&mut self) {
        self.duplicates = self.duplicates.saturating_add(1);
    }
}

/// Counters kept by one instrumentation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GateCounters {
    /// Ticks in which the wrapped action ran.
    pub fired: u64,
    /// Ticks in which the sink decided false.
    pub suppressed: u64,
    /// Fire attempts rejected because the gate already fired that tick.
    pub repeated: u64,
}

impl GateCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an executed action.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_fired(&mut self) {
        self.fired = self.fired.saturating_add(1);
    }

    /// Records a skipped action.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_suppressed(&mut self) {
        self.suppressed = self.suppressed.saturating_add(1);
    }

    /// Records a second fire attempt within one tick.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_repeated(&mut self) {
        self.repeated = self.repeated.saturating_add(1);
    }

    /// Total fire attempts seen by the gate.
    #[must_use]
    pub const fn attempts(&self) -> u64 {
        self.fired
            .saturating_add(self.suppressed)
            .saturating_add(self.repeated)
    }

    /// Resets all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
