//! Per-tick trigger snapshot and the registry that owns it.
//!
//! The registry is constructed explicitly and passed by reference, so
//! independent simulation instances in one process never share trigger
//! state.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::{RegistryCounters, Tick, TriggerError};

/// Stable name of a trigger source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(transparent)
)]
pub struct TriggerSourceId(String);

impl TriggerSourceId {
    /// Creates an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TriggerSourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TriggerSourceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for TriggerSourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&Self> for TriggerSourceId {
    fn from(id: &Self) -> Self {
        id.clone()
    }
}

/// Handling of a second publish under the same id within one tick.
///
/// The default is [`DuplicatePolicy::Reject`] in builds with debug
/// assertions and [`DuplicatePolicy::LastWriteWins`] otherwise. Hosts that
/// need identical behavior across build profiles pin a policy explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum DuplicatePolicy {
    /// Fail with [`TriggerError::DuplicatePublish`] and keep the first value.
    Reject,
    /// Log a warning and overwrite the first value.
    LastWriteWins,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Reject
        } else {
            Self::LastWriteWins
        }
    }
}

/// Read access to one tick's published trigger values.
pub trait SnapshotReader {
    /// Tick the view belongs to, or `None` before the first tick begins.
    fn snapshot_tick(&self) -> Option<Tick>;

    /// Returns the value `id` published in the view's tick.
    fn read(&self, id: &str) -> Option<bool>;

    /// Returns the value `id` published at `tick`.
    ///
    /// A view covering any other tick reports every id as unpublished.
    fn read_at(&self, tick: Tick, id: &str) -> Option<bool> {
        if self.snapshot_tick() == Some(tick) {
            self.read(id)
        } else {
            None
        }
    }
}

/// Trigger values published during exactly one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriggerSnapshot {
    tick: Option<Tick>,
    values: BTreeMap<TriggerSourceId, bool>,
}

impl TriggerSnapshot {
    /// Snapshot that belongs to no tick.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            tick: None,
            values: BTreeMap::new(),
        }
    }

    /// Fresh snapshot for `tick` with nothing published yet.
    #[must_use]
    pub const fn for_tick(tick: Tick) -> Self {
        Self {
            tick: Some(tick),
            values: BTreeMap::new(),
        }
    }

    /// Tick this snapshot belongs to.
    #[must_use]
    pub const fn tick(&self) -> Option<Tick> {
        self.tick
    }

    /// Number of published ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when nothing has been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Published values in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&TriggerSourceId, bool)> {
        self.values.iter().map(|(id, value)| (id, *value))
    }

    pub(crate) fn insert(&mut self, id: TriggerSourceId, value: bool) -> Option<bool> {
        self.values.insert(id, value)
    }
}

impl SnapshotReader for TriggerSnapshot {
    fn snapshot_tick(&self) -> Option<Tick> {
        self.tick
    }

    fn read(&self, id: &str) -> Option<bool> {
        self.values.get(id).copied()
    }
}

/// Owner of the current tick's [`TriggerSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct TriggerRegistry {
    snapshot: TriggerSnapshot,
    declared: BTreeSet<TriggerSourceId>,
    duplicate_policy: DuplicatePolicy,
    counters: RegistryCounters,
}

impl TriggerRegistry {
    /// Creates a registry with the build's default duplicate policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with an explicit duplicate policy.
    #[must_use]
    pub fn with_duplicate_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            duplicate_policy,
            ..Self::default()
        }
    }

    /// Policy applied to repeated publishes.
    #[must_use]
    pub const fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Declares a source expected to publish every tick.
    ///
    /// Returns false when the id was already declared.
    pub fn declare(&mut self, id: impl Into<TriggerSourceId>) -> bool {
        self.declared.insert(id.into())
    }

    /// Declared sources in id order.
    pub fn declared(&self) -> impl Iterator<Item = &TriggerSourceId> {
        self.declared.iter()
    }

    /// Replaces the snapshot with an empty one for `tick`.
    pub fn begin_tick(&mut self, tick: Tick) {
        self.snapshot = TriggerSnapshot::for_tick(tick);
        self.counters.record_tick();
        tracing::debug!(tick, declared = self.declared.len(), "trigger tick begins");
    }

    /// Tick currently held, or `None` before the first [`Self::begin_tick`].
    #[must_use]
    pub const fn current_tick(&self) -> Option<Tick> {
        self.snapshot.tick()
    }

    /// Records `id -> value` for the current tick.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::NoActiveTick`] before the first tick, and
    /// [`TriggerError::DuplicatePublish`] when `id` already published this
    /// tick under [`DuplicatePolicy::Reject`].
    pub fn publish(
        &mut self,
        id: impl Into<TriggerSourceId>,
        value: bool,
    ) -> Result<(), TriggerError> {
        let id = id.into();
        let tick = self.snapshot.tick().ok_or(TriggerError::NoActiveTick)?;

        if let Some(previous) = self.snapshot.read(id.as_str()) {
            self.counters.record_duplicate();
            match self.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(TriggerError::DuplicatePublish { id, tick });
                }
                DuplicatePolicy::LastWriteWins => {
                    tracing::warn!(
                        %id,
                        tick,
                        previous,
                        value,
                        "trigger source published twice in one tick, keeping last write"
                    );
                }
            }
        }

        tracing::trace!(%id, tick, value, "trigger published");
        self.snapshot.insert(id, value);
        self.counters.record_publish();
        Ok(())
    }

    /// Value `id` published this tick, or `None` if it has not published yet.
    #[must_use]
    pub fn read(&self, id: &str) -> Option<bool> {
        self.snapshot.read(id)
    }

    /// The current tick's snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &TriggerSnapshot {
        &self.snapshot
    }

    /// Declared sources that have not published this tick.
    #[must_use]
    pub fn missing(&self) -> Vec<TriggerSourceId> {
        self.declared
            .iter()
            .filter(|id| self.snapshot.read(id.as_str()).is_none())
            .cloned()
            .collect()
    }

    /// Returns true when every declared source has published this tick.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.declared
            .iter()
            .all(|id| self.snapshot.read(id.as_str()).is_some())
    }

    /// Lifetime counters.
    #[must_use]
    pub const fn counters(&self) -> RegistryCounters {
        self.counters
    }

    /// Runs one tick as a publish phase followed by a decide phase.
    ///
    /// `publish` receives exclusive access and must publish every declared
    /// source; `decide` only sees the finished snapshot.
    ///
    /// # Errors
    ///
    /// Propagates errors from `publish`, and returns
    /// [`TriggerError::IncompleteSnapshot`] when a declared source stayed
    /// silent. `decide` is not run in either case.
    pub fn run_tick<P, D, R>(
        &mut self,
        tick: Tick,
        publish: P,
        decide: D,
    ) -> Result<R, TriggerError>
    where
        P: FnOnce(&mut Self) -> Result<(), TriggerError>,
        D: FnOnce(&Self) -> R,
    {
        self.begin_tick(tick);
        publish(self)?;

        let missing = self.missing();
        if !missing.is_empty() {
            return Err(TriggerError::IncompleteSnapshot { tick, missing });
        }

        Ok(decide(self))
    }
}

impl SnapshotReader for TriggerRegistry {
    fn snapshot_tick(&self) -> Option<Tick> {
        self.snapshot.tick()
    }

    fn read(&self, id: &str) -> Option<bool> {
        self.snapshot.read(id)
    }
}
