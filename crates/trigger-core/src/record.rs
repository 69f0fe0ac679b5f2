//! Diagnostic records and the sink trait they are emitted through.

use std::fmt;

use crate::Tick;

/// One gated diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagRecord {
    /// Tick in which the record was emitted.
    pub tick: Tick,
    /// Instrumented scope, such as a module path.
    pub scope: String,
    /// Formatted payload.
    pub message: String,
}

impl DiagRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(tick: Tick, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tick,
            scope: scope.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DiagRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>8}] {}: {}", self.tick, self.scope, self.message)
    }
}

/// Destination for gated diagnostic records.
pub trait RecordSink {
    /// Accepts a record in emission order.
    fn on_record(&mut self, record: DiagRecord);
}

impl<T: RecordSink + ?Sized> RecordSink for &mut T {
    fn on_record(&mut self, record: DiagRecord) {
        (**self).on_record(record);
    }
}

/// Sink that keeps every record in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VecRecordSink {
    records: Vec<DiagRecord>,
}

impl VecRecordSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records collected so far.
    #[must_use]
    pub fn records(&self) -> &[DiagRecord] {
        &self.records
    }

    /// Number of records collected.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when nothing was collected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Releases the collected records.
    #[must_use]
    pub fn into_records(self) -> Vec<DiagRecord> {
        self.records
    }
}

impl RecordSink for VecRecordSink {
    fn on_record(&mut self, record: DiagRecord) {
        self.records.push(record);
    }
}

/// Sink forwarding each record as a `tracing` info event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecordSink;

impl RecordSink for TracingRecordSink {
    fn on_record(&mut self, record: DiagRecord) {
        tracing::info!(
            target: "trigger_core::record",
            tick = record.tick,
            scope = %record.scope,
            "{}",
            record.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_capture::CapturedLog;

    #[test]
    fn display_pads_tick_and_names_scope() {
        let record = DiagRecord::new(100, "top", "lfsr = 0xace1");
        assert_eq!(record.to_string(), "[     100] top: lfsr = 0xace1");
    }

    #[test]
    fn vec_sink_preserves_emission_order() {
        let mut sink = VecRecordSink::new();
        assert!(sink.is_empty());
        sink.on_record(DiagRecord::new(1, "a", "first"));
        sink.on_record(DiagRecord::new(1, "b", "second"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records()[0].message, "first");
        assert_eq!(sink.into_records()[1].scope, "b");
    }

    fn emit_one(mut sink: impl RecordSink) {
        sink.on_record(DiagRecord::new(2, "top", "via reference"));
    }

    #[test]
    fn mutable_reference_forwards_records() {
        let mut sink = VecRecordSink::new();
        emit_one(&mut sink);
        emit_one(&mut sink);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn tracing_sink_emits_info_event_per_record() {
        let log = CapturedLog::default();
        log.run(|| {
            let mut sink = TracingRecordSink;
            sink.on_record(DiagRecord::new(3, "top", "lfsr = 0x5670"));
            sink.on_record(DiagRecord::new(4, "top.child", "parity = 1"));
        });

        let output = log.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(
            lines[0].contains(" INFO trigger_core::record: lfsr = 0x5670 tick=3 scope=top"),
            "{output}"
        );
        assert!(lines[1].contains("parity = 1 tick=4 scope=top.child"));
    }
}
