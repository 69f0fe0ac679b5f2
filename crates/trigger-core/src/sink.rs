//! Sinks combining published trigger values into one gating decision.

use std::fmt;
use std::str::FromStr;

use crate::{SnapshotReader, Tick, TriggerError, TriggerSourceId};

/// Rule for merging a sink's source values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum CombinePolicy {
    /// Conjunction of every term.
    And,
    /// Disjunction of every term.
    Or,
    /// Single-source passthrough.
    #[default]
    Level,
}

impl CombinePolicy {
    /// Upper-case policy name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Level => "LEVEL",
        }
    }
}

impl fmt::Display for CombinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombinePolicy {
    type Err = TriggerError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "level" => Ok(Self::Level),
            _ => Err(TriggerError::UnknownPolicy(text.to_owned())),
        }
    }
}

/// Reader of named trigger sources that yields one decision per tick.
///
/// Sinks hold source ids only; values are looked up in whatever snapshot
/// is passed to [`TriggerSink::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSink {
    sources: Vec<TriggerSourceId>,
    policy: CombinePolicy,
    fallback_when_unpublished: bool,
}

impl TriggerSink {
    /// Creates a sink over `sources` in order.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidPolicy`] when `policy` is
    /// [`CombinePolicy::Level`] and more than one source is supplied.
    pub fn new<I, T>(
        sources: I,
        policy: CombinePolicy,
        fallback_when_unpublished: bool,
    ) -> Result<Self, TriggerError>
    where
        I: IntoIterator<Item = T>,
        T: Into<TriggerSourceId>,
    {
        let sources: Vec<TriggerSourceId> = sources.into_iter().map(Into::into).collect();
        if policy == CombinePolicy::Level && sources.len() > 1 {
            return Err(TriggerError::InvalidPolicy {
                policy,
                sources: sources.len(),
            });
        }

        Ok(Self {
            sources,
            policy,
            fallback_when_unpublished,
        })
    }

    /// Passthrough sink over one source, deciding false while it is silent.
    #[must_use]
    pub fn level(source: impl Into<TriggerSourceId>) -> Self {
        Self {
            sources: vec![source.into()],
            policy: CombinePolicy::Level,
            fallback_when_unpublished: false,
        }
    }

    /// Sink with no sources wired; always decides `fallback`.
    #[must_use]
    pub const fn unwired(fallback: bool) -> Self {
        Self {
            sources: Vec::new(),
            policy: CombinePolicy::Level,
            fallback_when_unpublished: fallback,
        }
    }

    /// AND sink over `sources`.
    #[must_use]
    pub fn all_of<I, T>(sources: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TriggerSourceId>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            policy: CombinePolicy::And,
            fallback_when_unpublished: false,
        }
    }

    /// OR sink over `sources`.
    #[must_use]
    pub fn any_of<I, T>(sources: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TriggerSourceId>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            policy: CombinePolicy::Or,
            fallback_when_unpublished: false,
        }
    }

    /// Replaces the value substituted for silent sources.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn with_fallback(mut self, fallback_when_unpublished: bool) -> Self {
        self.fallback_when_unpublished = fallback_when_unpublished;
        self
    }

    /// Wired source ids in order.
    #[must_use]
    pub fn sources(&self) -> &[TriggerSourceId] {
        &self.sources
    }

    /// Combination rule.
    #[must_use]
    pub const fn policy(&self) -> CombinePolicy {
        self.policy
    }

    /// Value substituted for a source that has not published.
    #[must_use]
    pub const fn fallback_when_unpublished(&self) -> bool {
        self.fallback_when_unpublished
    }

    /// Gating decision for `tick` against `reader`.
    ///
    /// A reader holding another tick's snapshot counts as all-silent.
    pub fn decide<R>(&self, reader: &R, tick: Tick) -> bool
    where
        R: SnapshotReader + ?Sized,
    {
        if self.sources.is_empty() {
            return self.fallback_when_unpublished;
        }

        let mut terms = self.sources.iter().map(|id| {
            reader
                .read_at(tick, id.as_str())
                .unwrap_or(self.fallback_when_unpublished)
        });
        let decision = match self.policy {
            CombinePolicy::And => terms.all(|term| term),
            CombinePolicy::Or => terms.any(|term| term),
            CombinePolicy::Level => terms.next().unwrap_or(self.fallback_when_unpublished),
        };

        tracing::trace!(tick, policy = %self.policy, decision, "trigger sink decided");
        decision
    }
}
