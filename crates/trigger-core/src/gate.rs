//! Gates that run a diagnostic action only when their sink decides true.
//!
//! A gate never retries a skipped action and runs it at most once per tick.
//! Any number of gates may share one sink; against one snapshot they all
//! see the same decision.

use crate::{GateCounters, SnapshotReader, Tick, TriggerSink};

/// Result of one [`InstrumentationGate::fire`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOutcome<R> {
    /// The sink decided true and the action ran, producing `R`.
    Fired(R),
    /// The sink decided false; the action was dropped unrun.
    Suppressed,
    /// The gate already fired this tick; the action was dropped unrun.
    AlreadyFired,
}

impl<R> GateOutcome<R> {
    /// Returns true when the action ran.
    #[must_use]
    pub const fn is_fired(&self) -> bool {
        matches!(self, Self::Fired(_))
    }

    /// The action's result, if it ran.
    #[must_use]
    pub fn into_fired(self) -> Option<R> {
        match self {
            Self::Fired(value) => Some(value),
            Self::Suppressed | Self::AlreadyFired => None,
        }
    }
}

/// Conditional executor bound to one [`TriggerSink`].
#[derive(Debug, Clone)]
pub struct InstrumentationGate<'s> {
    sink: &'s TriggerSink,
    last_fired: Option<Tick>,
    counters: GateCounters,
}

impl<'s> InstrumentationGate<'s> {
    /// Creates a gate over `sink`.
    #[must_use]
    pub const fn new(sink: &'s TriggerSink) -> Self {
        Self {
            sink,
            last_fired: None,
            counters: GateCounters {
                fired: 0,
                suppressed: 0,
                repeated: 0,
            },
        }
    }

    /// Sink this gate consults.
    #[must_use]
    pub const fn sink(&self) -> &'s TriggerSink {
        self.sink
    }

    /// Last tick in which the action ran.
    #[must_use]
    pub const fn last_fired(&self) -> Option<Tick> {
        self.last_fired
    }

    /// Fire bookkeeping so far.
    #[must_use]
    pub const fn counters(&self) -> GateCounters {
        self.counters
    }

    /// Runs `action` once if the sink decides true for `tick`.
    pub fn fire<Rd, F, R>(&mut self, reader: &Rd, tick: Tick, action: F) -> GateOutcome<R>
    where
        Rd: SnapshotReader + ?Sized,
        F: FnOnce() -> R,
    {
        if self.last_fired == Some(tick) {
            self.counters.record_repeated();
            return GateOutcome::AlreadyFired;
        }

        if !self.sink.decide(reader, tick) {
            self.counters.record_suppressed();
            return GateOutcome::Suppressed;
        }

        self.last_fired = Some(tick);
        self.counters.record_fired();
        GateOutcome::Fired(action())
    }
}

/// Gate that owns its deferred action.
#[derive(Debug, Clone)]
pub struct GatedAction<'s, F> {
    gate: InstrumentationGate<'s>,
    action: F,
}

impl<'s, F> GatedAction<'s, F>
where
    F: FnMut(Tick),
{
    /// Binds `action` to a gate over `sink`.
    #[must_use]
    pub const fn new(sink: &'s TriggerSink, action: F) -> Self {
        Self {
            gate: InstrumentationGate::new(sink),
            action,
        }
    }

    /// Runs the stored action for `tick` if the gate allows it.
    pub fn fire_stored<Rd>(&mut self, reader: &Rd, tick: Tick) -> GateOutcome<()>
    where
        Rd: SnapshotReader + ?Sized,
    {
        let action = &mut self.action;
        self.gate.fire(reader, tick, || action(tick))
    }

    /// Underlying gate.
    #[must_use]
    pub const fn gate(&self) -> &InstrumentationGate<'s> {
        &self.gate
    }

    /// Releases the stored action.
    pub fn into_action(self) -> F {
        self.action
    }
}

/// Decides `sink` for `tick` and runs `action` in the same call when true.
pub fn when_enabled<Rd, F, R>(reader: &Rd, tick: Tick, sink: &TriggerSink, action: F) -> Option<R>
where
    Rd: SnapshotReader + ?Sized,
    F: FnOnce() -> R,
{
    sink.decide(reader, tick).then(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DuplicatePolicy, TriggerRegistry};

    fn registry_at(tick: Tick, enable: bool) -> TriggerRegistry {
        let mut registry = TriggerRegistry::with_duplicate_policy(DuplicatePolicy::Reject);
        registry.begin_tick(tick);
        registry.publish("enable", enable).expect("publish");
        registry
    }

    #[test]
    fn fires_when_sink_decides_true() {
        let sink = TriggerSink::level("enable");
        let registry = registry_at(4, true);
        let mut gate = InstrumentationGate::new(&sink);

        assert_eq!(gate.fire(&registry, 4, || 17), GateOutcome::Fired(17));
        assert_eq!(gate.last_fired(), Some(4));
        assert_eq!(gate.counters().fired, 1);
    }

    #[test]
    fn skips_when_sink_decides_false() {
        let sink = TriggerSink::level("enable");
        let registry = registry_at(4, false);
        let mut gate = InstrumentationGate::new(&sink);
        let mut ran = false;

        let outcome = gate.fire(&registry, 4, || ran = true);

        assert_eq!(outcome, GateOutcome::Suppressed);
        assert!(!ran);
        assert_eq!(gate.last_fired(), None);
        assert_eq!(gate.counters().suppressed, 1);
    }

    #[test]
    fn fires_at_most_once_per_tick() {
        let sink = TriggerSink::level("enable");
        let registry = registry_at(8, true);
        let mut gate = InstrumentationGate::new(&sink);
        let mut runs = 0;

        assert!(gate.fire(&registry, 8, || runs += 1).is_fired());
        assert_eq!(
            gate.fire(&registry, 8, || runs += 1),
            GateOutcome::AlreadyFired
        );
        assert_eq!(runs, 1);
        assert_eq!(gate.counters().repeated, 1);
    }

    #[test]
    fn gates_sharing_a_sink_agree() {
        let sink = TriggerSink::level("enable");
        let mut parent = InstrumentationGate::new(&sink);
        let mut child = InstrumentationGate::new(&sink);

        for (tick, enable) in [(0, false), (1, true), (2, true), (3, false)] {
            let registry = registry_at(tick, enable);
            let parent_fired = parent.fire(&registry, tick, || ()).is_fired();
            let child_fired = child.fire(&registry, tick, || ()).is_fired();
            assert_eq!(parent_fired, child_fired);
            assert_eq!(parent_fired, enable);
        }
    }

    #[test]
    fn stored_action_receives_tick() {
        let sink = TriggerSink::level("enable");
        let mut seen = Vec::new();
        let mut gated = GatedAction::new(&sink, |tick: Tick| seen.push(tick));

        for tick in 0..4 {
            let registry = registry_at(tick, tick % 2 == 1);
            gated.fire_stored(&registry, tick);
        }
        assert_eq!(gated.gate().counters().fired, 2);
        let mut action = gated.into_action();
        action(9);

        assert_eq!(seen, [1, 3, 9]);
    }

    #[test]
    fn when_enabled_combines_decide_and_run() {
        let sink = TriggerSink::level("enable");
        assert_eq!(
            when_enabled(&registry_at(0, true), 0, &sink, || "emitted"),
            Some("emitted")
        );
        assert_eq!(
            when_enabled(&registry_at(0, false), 0, &sink, || "emitted"),
            None
        );
    }

    #[test]
    fn outcome_helpers() {
        assert_eq!(GateOutcome::Fired(3).into_fired(), Some(3));
        assert_eq!(GateOutcome::<u8>::Suppressed.into_fired(), None);
        assert!(!GateOutcome::<u8>::AlreadyFired.is_fired());
    }
}
