//! Range-trigger scenario: a payload register observed by a parent and a
//! child scope, both printing only while the trigger window is open.

use std::io::{self, Write};

use trigger_core::{
    DiagRecord, GateCounters, InstrumentationGate, RecordSink, RegistryCounters, Tick, TickRange,
    TriggerConfig, TriggerError, TriggerSink, TriggerSource,
};

use crate::payload::PayloadSource;

/// Id the range trigger publishes under.
pub const ENABLE_SOURCE: &str = "enable";
/// Scope name of the parent emission.
pub const PARENT_SCOPE: &str = "top";
/// Scope name of the child emission.
pub const CHILD_SCOPE: &str = "top.child";

/// First enabled tick when none is supplied.
pub const DEFAULT_START: Tick = 100;
/// Last enabled tick when none is supplied.
pub const DEFAULT_END: Tick = 1000;
/// Ticks simulated when no count is supplied.
pub const DEFAULT_CYCLES: Tick = 1200;

/// Inputs of one scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// Ticks during which the range predicate holds.
    pub window: TickRange,
    /// Number of ticks to simulate, starting at tick 0.
    pub cycles: Tick,
    /// Sink policy, fallback, edge mode and duplicate handling.
    pub trigger: TriggerConfig,
    /// Wires the range source to the sink; an unwired sink decides its fallback.
    pub wired: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            window: TickRange::new(DEFAULT_START, DEFAULT_END),
            cycles: DEFAULT_CYCLES,
            trigger: TriggerConfig::default(),
            wired: true,
        }
    }
}

/// Summary of one scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Ticks simulated.
    pub ticks: Tick,
    /// Parent-scope gate bookkeeping.
    pub parent: GateCounters,
    /// Child-scope gate bookkeeping.
    pub child: GateCounters,
    /// Registry bookkeeping.
    pub registry: RegistryCounters,
    /// Payload value observed on the last tick.
    pub final_payload: u16,
}

impl ScenarioReport {
    /// Records emitted across both scopes.
    #[must_use]
    pub const fn records(&self) -> u64 {
        self.parent.fired.saturating_add(self.child.fired)
    }
}

/// Runs the scenario, sending gated records to `records`.
///
/// The payload advances every tick regardless of the trigger.
///
/// # Errors
///
/// Returns [`TriggerError::InvalidPolicy`] for a configuration the sink
/// rejects, and any registry error raised while ticking.
pub fn run_scenario<P, R>(
    config: &ScenarioConfig,
    payload: &mut P,
    records: &mut R,
) -> Result<ScenarioReport, TriggerError>
where
    P: PayloadSource + ?Sized,
    R: RecordSink + ?Sized,
{
    let mut registry = config.trigger.registry();
    let mut source = TriggerSource::new(ENABLE_SOURCE, config.window, config.trigger.source_mode());
    let sink = if config.wired {
        source.attach(&mut registry);
        config.trigger.sink([ENABLE_SOURCE])?
    } else {
        TriggerSink::unwired(config.trigger.fallback_when_unpublished)
    };
    let mut parent = InstrumentationGate::new(&sink);
    let mut child = InstrumentationGate::new(&sink);
    let mut value = 0;

    tracing::debug!(
        low = config.window.low,
        high = config.window.high,
        cycles = config.cycles,
        policy = %config.trigger.policy,
        edge_mode = config.trigger.edge_mode,
        wired = config.wired,
        "scenario starting"
    );

    for tick in 0..config.cycles {
        value = payload.next_value();
        registry.run_tick(
            tick,
            |registry| {
                if config.wired {
                    source.publish(registry, tick, &()).map(|_| ())
                } else {
                    Ok(())
                }
            },
            |registry| {
                parent.fire(registry, tick, || {
                    records.on_record(DiagRecord::new(
                        tick,
                        PARENT_SCOPE,
                        format!("lfsr = {value:#06x}"),
                    ));
                });
                child.fire(registry, tick, || {
                    records.on_record(DiagRecord::new(
                        tick,
                        CHILD_SCOPE,
                        format!("parity = {}", value.count_ones() % 2),
                    ));
                });
            },
        )?;
    }

    let report = ScenarioReport {
        ticks: config.cycles,
        parent: parent.counters(),
        child: child.counters(),
        registry: registry.counters(),
        final_payload: value,
    };
    tracing::debug!(records = report.records(), "scenario finished");
    Ok(report)
}

/// Record sink printing one formatted line per record.
///
/// The first write error is kept and reported by [`WriterRecordSink::finish`];
/// later records are dropped.
#[derive(Debug)]
pub struct WriterRecordSink<W> {
    writer: W,
    written: u64,
    error: Option<io::Error>,
}

impl<W: Write> WriterRecordSink<W> {
    /// Wraps `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
        }
    }

    /// Lines written so far.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns the first write error, or the flush error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for WriterRecordSink<W> {
    fn on_record(&mut self, record: DiagRecord) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.writer, "{record}") {
            Ok(()) => self.written += 1,
            Err(error) => self.error = Some(error),
        }
    }
}
