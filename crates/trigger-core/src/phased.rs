//! Two-phase registry for hosts that publish from several threads.
//!
//! Every publish for a tick happens in the publish phase. [`PhasedRegistry::seal`]
//! closes that phase and hands out one immutable snapshot that all
//! decide-phase readers share without further locking.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    DuplicatePolicy, RegistryCounters, Tick, TriggerError, TriggerRegistry, TriggerSnapshot,
    TriggerSourceId,
};

/// Phase of the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TickPhase {
    /// No tick has begun yet.
    #[default]
    Idle,
    /// Sources may publish; readers must wait.
    Publish,
    /// The snapshot is sealed; readers may decide.
    Decide,
}

#[derive(Debug, Default)]
struct PhasedState {
    phase: TickPhase,
    registry: TriggerRegistry,
    sealed: Option<Arc<TriggerSnapshot>>,
}

/// Registry shared between threads through a per-tick publish/decide barrier.
#[derive(Debug, Default)]
pub struct PhasedRegistry {
    state: Mutex<PhasedState>,
}

impl PhasedRegistry {
    /// Creates an idle registry with the build's default duplicate policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an idle registry with an explicit duplicate policy.
    #[must_use]
    pub fn with_duplicate_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            state: Mutex::new(PhasedState {
                registry: TriggerRegistry::with_duplicate_policy(duplicate_policy),
                ..PhasedState::default()
            }),
        }
    }

    // A panicking publisher cannot leave the snapshot half-written, so a
    // poisoned lock still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, PhasedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declares a source expected to publish every tick.
    pub fn declare(&self, id: impl Into<TriggerSourceId>) -> bool {
        self.lock().registry.declare(id)
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TickPhase {
        self.lock().phase
    }

    /// Tick currently held, or `None` while idle.
    #[must_use]
    pub fn current_tick(&self) -> Option<Tick> {
        self.lock().registry.current_tick()
    }

    /// Lifetime counters.
    #[must_use]
    pub fn counters(&self) -> RegistryCounters {
        self.lock().registry.counters()
    }

    /// Starts the publish phase of `tick` with an empty snapshot.
    pub fn begin_tick(&self, tick: Tick) {
        let mut state = self.lock();
        state.registry.begin_tick(tick);
        state.sealed = None;
        state.phase = TickPhase::Publish;
    }

    /// Records `id -> value` during the publish phase.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::NoActiveTick`] while idle,
    /// [`TriggerError::PublishAfterSeal`] once the tick is sealed, and
    /// [`TriggerError::DuplicatePublish`] per the duplicate policy.
    pub fn publish(&self, id: impl Into<TriggerSourceId>, value: bool) -> Result<(), TriggerError> {
        let id = id.into();
        let mut state = self.lock();
        match state.phase {
            TickPhase::Idle => Err(TriggerError::NoActiveTick),
            TickPhase::Decide => Err(TriggerError::PublishAfterSeal {
                tick: state
                    .registry
                    .current_tick()
                    .ok_or(TriggerError::NoActiveTick)?,
                id,
            }),
            TickPhase::Publish => state.registry.publish(id, value),
        }
    }

    /// Ends the publish phase and returns the shared snapshot.
    ///
    /// Sealing an already sealed tick returns the same snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::NoActiveTick`] while idle and
    /// [`TriggerError::IncompleteSnapshot`] when a declared source has not
    /// published; the tick stays in its publish phase in that case.
    pub fn seal(&self) -> Result<Arc<TriggerSnapshot>, TriggerError> {
        let mut state = self.lock();
        let sealed = Self::seal_locked(&mut state);
        drop(state);
        sealed
    }

    fn seal_locked(state: &mut PhasedState) -> Result<Arc<TriggerSnapshot>, TriggerError> {
        match state.phase {
            TickPhase::Idle => Err(TriggerError::NoActiveTick),
            TickPhase::Decide => state.sealed.clone().ok_or(TriggerError::NoActiveTick),
            TickPhase::Publish => {
                let tick = state
                    .registry
                    .current_tick()
                    .ok_or(TriggerError::NoActiveTick)?;
                let missing = state.registry.missing();
                if !missing.is_empty() {
                    return Err(TriggerError::IncompleteSnapshot { tick, missing });
                }

                let snapshot = Arc::new(state.registry.snapshot().clone());
                tracing::debug!(tick, published = snapshot.len(), "trigger tick sealed");
                state.sealed = Some(Arc::clone(&snapshot));
                state.phase = TickPhase::Decide;
                Ok(snapshot)
            }
        }
    }

    /// Sealed snapshot of the current tick.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::NoActiveTick`] while idle and
    /// [`TriggerError::ReadBeforeSeal`] during the publish phase.
    pub fn snapshot(&self) -> Result<Arc<TriggerSnapshot>, TriggerError> {
        let state = self.lock();
        match state.phase {
            TickPhase::Idle => Err(TriggerError::NoActiveTick),
            TickPhase::Publish => Err(TriggerError::ReadBeforeSeal {
                tick: state
                    .registry
                    .current_tick()
                    .ok_or(TriggerError::NoActiveTick)?,
            }),
            TickPhase::Decide => state.sealed.clone().ok_or(TriggerError::NoActiveTick),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::SnapshotReader;

    #[test]
    fn new_registry_is_idle() {
        let registry = PhasedRegistry::new();
        assert_eq!(registry.phase(), TickPhase::Idle);
        assert_eq!(registry.current_tick(), None);
        assert_eq!(registry.snapshot(), Err(TriggerError::NoActiveTick));
        assert_eq!(
            registry.publish("enable", true),
            Err(TriggerError::NoActiveTick)
        );
    }

    #[test]
    fn read_during_publish_phase_is_rejected() {
        let registry = PhasedRegistry::new();
        registry.begin_tick(12);
        registry.publish("enable", true).expect("publish");
        assert_eq!(
            registry.snapshot(),
            Err(TriggerError::ReadBeforeSeal { tick: 12 })
        );
    }

    #[test]
    fn publish_after_seal_is_rejected() {
        let registry = PhasedRegistry::new();
        registry.begin_tick(12);
        registry.seal().expect("empty tick seals");
        assert_eq!(
            registry.publish("enable", true),
            Err(TriggerError::PublishAfterSeal {
                id: TriggerSourceId::from("enable"),
                tick: 12,
            })
        );
    }

    #[test]
    fn seal_is_idempotent_within_a_tick() {
        let registry = PhasedRegistry::new();
        registry.begin_tick(1);
        registry.publish("enable", true).expect("publish");
        let first = registry.seal().expect("seal");
        let second = registry.seal().expect("seal again");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.phase(), TickPhase::Decide);
    }

    #[test]
    fn seal_waits_for_declared_sources() {
        let registry = PhasedRegistry::new();
        registry.declare("a");
        registry.declare("b");
        registry.begin_tick(0);
        registry.publish("a", true).expect("publish a");

        assert_eq!(
            registry.seal(),
            Err(TriggerError::IncompleteSnapshot {
                tick: 0,
                missing: vec![TriggerSourceId::from("b")],
            })
        );
        assert_eq!(registry.phase(), TickPhase::Publish);

        registry.publish("b", false).expect("publish b");
        let snapshot = registry.seal().expect("complete tick seals");
        assert_eq!(snapshot.read("b"), Some(false));
    }

    #[test]
    fn begin_tick_reopens_publish_phase() {
        let registry = PhasedRegistry::new();
        registry.begin_tick(0);
        registry.publish("enable", true).expect("publish");
        registry.seal().expect("seal");

        registry.begin_tick(1);
        assert_eq!(registry.phase(), TickPhase::Publish);
        registry
            .publish("enable", false)
            .expect("publish next tick");
        let snapshot = registry.seal().expect("seal next tick");
        assert_eq!(snapshot.tick(), Some(1));
        assert_eq!(snapshot.read("enable"), Some(false));
    }

    #[test]
    fn publishes_from_many_threads_land_in_one_snapshot() {
        let registry = PhasedRegistry::with_duplicate_policy(DuplicatePolicy::Reject);
        for index in 0..8 {
            registry.declare(format!("partition-{index}"));
        }
        registry.begin_tick(77);

        thread::scope(|scope| {
            for index in 0..8 {
                let registry = &registry;
                scope.spawn(move || {
                    registry
                        .publish(format!("partition-{index}"), index % 2 == 0)
                        .expect("each partition publishes once");
                });
            }
        });

        let snapshot = registry.seal().expect("all partitions published");
        assert_eq!(snapshot.len(), 8);
        assert_eq!(snapshot.read("partition-0"), Some(true));
        assert_eq!(snapshot.read("partition-3"), Some(false));
        assert_eq!(registry.counters().publishes, 8);
    }
}
