//! Recognized trigger configuration options.

use crate::{
    CombinePolicy, DuplicatePolicy, PhasedRegistry, SourceMode, TriggerError, TriggerRegistry,
    TriggerSink, TriggerSourceId,
};

/// Option set shared by a host's sinks, sources and registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct TriggerConfig {
    /// Rule sinks use to combine their sources.
    pub policy: CombinePolicy,
    /// Value substituted when a wired source is silent.
    pub fallback_when_unpublished: bool,
    /// Publish one-tick rising pulses instead of levels.
    pub edge_mode: bool,
    /// Handling of a source publishing twice in one tick.
    pub duplicate_policy: DuplicatePolicy,
}

impl TriggerConfig {
    /// Builds a sink over `sources` with this config's policy and fallback.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidPolicy`] for a LEVEL policy over more
    /// than one source.
    pub fn sink<I, T>(&self, sources: I) -> Result<TriggerSink, TriggerError>
    where
        I: IntoIterator<Item = T>,
        T: Into<TriggerSourceId>,
    {
        TriggerSink::new(sources, self.policy, self.fallback_when_unpublished)
    }

    /// Source mode selected by `edge_mode`.
    #[must_use]
    pub const fn source_mode(&self) -> SourceMode {
        SourceMode::from_edge_mode(self.edge_mode)
    }

    /// Single-threaded registry with this config's duplicate policy.
    #[must_use]
    pub fn registry(&self) -> TriggerRegistry {
        TriggerRegistry::with_duplicate_policy(self.duplicate_policy)
    }

    /// Two-phase registry with this config's duplicate policy.
    #[must_use]
    pub fn phased_registry(&self) -> PhasedRegistry {
        PhasedRegistry::with_duplicate_policy(self.duplicate_policy)
    }
}
