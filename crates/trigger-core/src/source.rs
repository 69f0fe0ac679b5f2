//! Trigger predicates and the sources that publish them.

use crate::{PhasedRegistry, Tick, TriggerError, TriggerRegistry, TriggerSourceId};

/// Pure condition over the tick and host-visible state `S`.
pub trait TriggerPredicate<S: ?Sized> {
    /// Returns the predicate's truth value at `tick`.
    fn holds(&self, tick: Tick, state: &S) -> bool;
}

impl<S: ?Sized, F> TriggerPredicate<S> for F
where
    F: Fn(Tick, &S) -> bool,
{
    fn holds(&self, tick: Tick, state: &S) -> bool {
        self(tick, state)
    }
}

/// Inclusive tick window `low..=high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TickRange {
    /// First tick inside the window.
    pub low: Tick,
    /// Last tick inside the window.
    pub high: Tick,
}

impl TickRange {
    /// Creates the window `low..=high`. An inverted window is empty.
    #[must_use]
    pub const fn new(low: Tick, high: Tick) -> Self {
        Self { low, high }
    }

    /// Returns true when `tick` lies inside the window.
    #[must_use]
    pub const fn contains(self, tick: Tick) -> bool {
        tick >= self.low && tick <= self.high
    }

    /// Number of ticks inside the window.
    #[must_use]
    pub const fn len(self) -> u64 {
        if self.high < self.low {
            0
        } else {
            (self.high - self.low).saturating_add(1)
        }
    }

    /// Returns true when no tick lies inside the window.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.high < self.low
    }
}

impl<S: ?Sized> TriggerPredicate<S> for TickRange {
    fn holds(&self, tick: Tick, _state: &S) -> bool {
        self.contains(tick)
    }
}

/// Predicate that always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Always;

impl<S: ?Sized> TriggerPredicate<S> for Always {
    fn holds(&self, _tick: Tick, _state: &S) -> bool {
        true
    }
}

/// Predicate that never holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Never;

impl<S: ?Sized> TriggerPredicate<S> for Never {
    fn holds(&self, _tick: Tick, _state: &S) -> bool {
        false
    }
}

/// Level transition a pulse-mode source reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum EdgeKind {
    /// LOW to HIGH.
    #[default]
    Rising,
    /// HIGH to LOW.
    Falling,
    /// Either transition.
    Both,
}

impl EdgeKind {
    const fn matches(self, previous: EdgeState, current: EdgeState) -> bool {
        matches!(
            (self, previous, current),
            (Self::Rising | Self::Both, EdgeState::Low, EdgeState::High)
                | (Self::Falling | Self::Both, EdgeState::High, EdgeState::Low)
        )
    }
}

/// How a source turns its predicate into a published value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum SourceMode {
    /// Publish the predicate value every tick.
    #[default]
    Level,
    /// Publish true only on the tick of a matching level transition.
    Pulse(EdgeKind),
}

impl SourceMode {
    /// Maps the `edge_mode` option onto a mode: rising pulses when set,
    /// level otherwise.
    #[must_use]
    pub const fn from_edge_mode(edge_mode: bool) -> Self {
        if edge_mode {
            Self::Pulse(EdgeKind::Rising)
        } else {
            Self::Level
        }
    }
}

/// Predicate level remembered between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeState {
    /// Predicate was false.
    #[default]
    Low,
    /// Predicate was true.
    High,
}

impl EdgeState {
    /// State corresponding to a predicate value.
    #[must_use]
    pub const fn from_level(level: bool) -> Self {
        if level {
            Self::High
        } else {
            Self::Low
        }
    }

    /// Returns true for [`EdgeState::High`].
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

/// Named predicate that publishes one value per tick.
#[derive(Debug, Clone)]
pub struct TriggerSource<P> {
    id: TriggerSourceId,
    predicate: P,
    mode: SourceMode,
    state: EdgeState,
}

impl<P> TriggerSource<P> {
    /// Creates a source in `mode`, starting LOW.
    #[must_use]
    pub fn new(id: impl Into<TriggerSourceId>, predicate: P, mode: SourceMode) -> Self {
        Self {
            id: id.into(),
            predicate,
            mode,
            state: EdgeState::Low,
        }
    }

    /// Creates a level-sensitive source.
    #[must_use]
    pub fn level(id: impl Into<TriggerSourceId>, predicate: P) -> Self {
        Self::new(id, predicate, SourceMode::Level)
    }

    /// Creates a pulse source reacting to `edge`.
    #[must_use]
    pub fn pulse(id: impl Into<TriggerSourceId>, predicate: P, edge: EdgeKind) -> Self {
        Self::new(id, predicate, SourceMode::Pulse(edge))
    }

    /// Id this source publishes under.
    #[must_use]
    pub const fn id(&self) -> &TriggerSourceId {
        &self.id
    }

    /// Level or pulse mode.
    #[must_use]
    pub const fn mode(&self) -> SourceMode {
        self.mode
    }

    /// Predicate level seen on the last evaluated tick.
    #[must_use]
    pub const fn edge_state(&self) -> EdgeState {
        self.state
    }

    /// Returns the source to its initial LOW state.
    #[allow(clippy::missing_const_for_fn)]
    pub fn reset(&mut self) {
        self.state = EdgeState::Low;
    }

    /// Declares this source on `registry` so missing publishes are caught.
    pub fn attach(&self, registry: &mut TriggerRegistry) -> bool {
        registry.declare(&self.id)
    }

    /// Declares this source on a shared registry.
    pub fn attach_shared(&self, registry: &PhasedRegistry) -> bool {
        registry.declare(&self.id)
    }

    /// Computes this tick's value and updates the LOW/HIGH state.
    pub fn evaluate<S: ?Sized>(&mut self, tick: Tick, state: &S) -> bool
    where
        P: TriggerPredicate<S>,
    {
        let level = self.predicate.holds(tick, state);
        let previous = self.state;
        self.state = EdgeState::from_level(level);

        match self.mode {
            SourceMode::Level => level,
            SourceMode::Pulse(edge) => edge.matches(previous, self.state),
        }
    }

    /// Evaluates and publishes this tick's value.
    ///
    /// # Errors
    ///
    /// Propagates the registry's publish error.
    pub fn publish<S: ?Sized>(
        &mut self,
        registry: &mut TriggerRegistry,
        tick: Tick,
        state: &S,
    ) -> Result<bool, TriggerError>
    where
        P: TriggerPredicate<S>,
    {
        let value = self.evaluate(tick, state);
        registry.publish(&self.id, value)?;
        Ok(value)
    }

    /// Evaluates and publishes this tick's value on a shared registry.
    ///
    /// # Errors
    ///
    /// Propagates the registry's publish error.
    pub fn publish_shared<S: ?Sized>(
        &mut self,
        registry: &PhasedRegistry,
        tick: Tick,
        state: &S,
    ) -> Result<bool, TriggerError>
    where
        P: TriggerPredicate<S>,
    {
        let value = self.evaluate(tick, state);
        registry.publish(&self.id, value)?;
        Ok(value)
    }
}

/// Counter-based source that is HIGH while credits outnumber debits.
///
/// Pairing a start condition with a stop condition enables a region that
/// may open and close several times, or nest.
///
/// Only lifetime totals are compared. A debit seen before any credit is
/// never forgotten, so an unmatched stop cancels the next start for good.
#[derive(Debug, Clone)]
pub struct CreditDebitSource<C, D> {
    id: TriggerSourceId,
    credit: C,
    debit: D,
    credits: u64,
    debits: u64,
}

impl<C, D> CreditDebitSource<C, D> {
    /// Creates a source with zero credits and debits.
    #[must_use]
    pub fn new(id: impl Into<TriggerSourceId>, credit: C, debit: D) -> Self {
        Self {
            id: id.into(),
            credit,
            debit,
            credits: 0,
            debits: 0,
        }
    }

    /// Id this source publishes under.
    #[must_use]
    pub const fn id(&self) -> &TriggerSourceId {
        &self.id
    }

    /// Accumulated `(credits, debits)`.
    #[must_use]
    pub const fn balance(&self) -> (u64, u64) {
        (self.credits, self.debits)
    }

    /// Declares this source on `registry`.
    pub fn attach(&self, registry: &mut TriggerRegistry) -> bool {
        registry.declare(&self.id)
    }

    /// Counts this tick's credit and debit, then reports `credits > debits`.
    pub fn evaluate<S: ?Sized>(&mut self, tick: Tick, state: &S) -> bool
    where
        C: TriggerPredicate<S>,
        D: TriggerPredicate<S>,
    {
        if self.credit.holds(tick, state) {
            self.credits = self.credits.saturating_add(1);
        }
        if self.debit.holds(tick, state) {
            self.debits = self.debits.saturating_add(1);
        }
        self.credits > self.debits
    }

    /// Evaluates and publishes this tick's value.
    ///
    /// # Errors
    ///
    /// Propagates the registry's publish error.
    pub fn publish<S: ?Sized>(
        &mut self,
        registry: &mut TriggerRegistry,
        tick: Tick,
        state: &S,
    ) -> Result<bool, TriggerError>
    where
        C: TriggerPredicate<S>,
        D: TriggerPredicate<S>,
    {
        let value = self.evaluate(tick, state);
        registry.publish(&self.id, value)?;
        Ok(value)
    }
}
