//! Tick-synchronous trigger gating for diagnostic instrumentation.
//!
//! Each tick the host publishes trigger source values into a registry,
//! sinks combine those values into a single decision, and gates run their
//! diagnostic action only when that decision holds.

/// One discrete step of the host clock.
///
/// The host driver owns and advances the counter; the core only reads it.
pub type Tick = u64;

/// Error taxonomy shared by every trigger component.
pub mod error;
pub use error::TriggerError;

/// Saturating diagnostic counters for registries and gates.
pub mod diag;
pub use diag::{GateCounters, RegistryCounters};

/// Per-tick snapshot and the registry that owns it.
pub mod registry;
pub use registry::{
    DuplicatePolicy, SnapshotReader, TriggerRegistry, TriggerSnapshot, TriggerSourceId,
};

/// Two-phase registry for multi-threaded hosts.
pub mod phased;
pub use phased::{PhasedRegistry, TickPhase};

/// Trigger predicates and the sources that publish them.
pub mod source;
pub use source::{
    Always, CreditDebitSource, EdgeKind, EdgeState, Never, SourceMode, TickRange, TriggerPredicate,
    TriggerSource,
};

/// Sinks combining published values into one gating decision.
pub mod sink;
pub use sink::{CombinePolicy, TriggerSink};

/// Gates wrapping diagnostic actions.
pub mod gate;
pub use gate::{when_enabled, GateOutcome, GatedAction, InstrumentationGate};

/// Diagnostic records and the sink trait they are emitted through.
pub mod record;
pub use record::{DiagRecord, RecordSink, TracingRecordSink, VecRecordSink};

/// Recognized trigger configuration options.
pub mod config;
pub use config::TriggerConfig;

#[cfg(test)]
mod log_capture;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use serde_json as _;
