use thiserror::Error;

use crate::{CombinePolicy, Tick, TriggerSourceId};

/// Failures surfaced by trigger registries, sinks and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    /// A source published more than once within one tick.
    #[error("trigger source `{id}` published more than once at tick {tick}")]
    DuplicatePublish {
        /// Source that published twice.
        id: TriggerSourceId,
        /// Tick in which the second publish happened.
        tick: Tick,
    },
    /// A sink was constructed with a policy that cannot combine its sources.
    #[error("{policy} policy accepts at most one source, got {sources}")]
    InvalidPolicy {
        /// Policy requested at construction.
        policy: CombinePolicy,
        /// Number of sources supplied.
        sources: usize,
    },
    /// A publish or snapshot request arrived before any tick began.
    #[error("no tick is active on the trigger registry")]
    NoActiveTick,
    /// A source published after the tick's publish phase was sealed.
    #[error("trigger source `{id}` published after tick {tick} was sealed")]
    PublishAfterSeal {
        /// Late source.
        id: TriggerSourceId,
        /// Sealed tick.
        tick: Tick,
    },
    /// A reader asked for the snapshot while sources were still publishing.
    #[error("snapshot for tick {tick} read before its publish phase was sealed")]
    ReadBeforeSeal {
        /// Tick still in its publish phase.
        tick: Tick,
    },
    /// Declared sources did not publish before the decide phase.
    #[error("tick {tick} is missing values for {} declared source(s)", .missing.len())]
    IncompleteSnapshot {
        /// Tick whose snapshot is incomplete.
        tick: Tick,
        /// Declared sources that stayed silent.
        missing: Vec<TriggerSourceId>,
    },
    /// Configuration text did not name a known combine policy.
    #[error("unknown combine policy `{0}` (expected and, or, level)")]
    UnknownPolicy(String),
}
