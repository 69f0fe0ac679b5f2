//! CLI entry point for the trigger demonstration binary.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[cfg(test)]
use tempfile as _;
use tracing as _;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trigger_core::{CombinePolicy, Tick, TickRange, TriggerConfig};
use trigger_demo::payload::{Lfsr16, DEFAULT_LFSR_SEED};
use trigger_demo::scenario::{
    run_scenario, ScenarioConfig, ScenarioReport, WriterRecordSink, DEFAULT_CYCLES, DEFAULT_END,
    DEFAULT_START,
};

const USAGE_TEXT: &str = "\
Usage: trigger-demo <command> [options]

Commands:
  run [options]  Simulate the range-trigger scenario and print gated records

Options:
  --start <tick>       First enabled tick (default: 100)
  --end <tick>         Last enabled tick (default: 1000)
  --cycles <count>     Ticks to simulate from tick 0 (default: 1200)
  --seed <value>       LFSR seed, decimal or 0x-prefixed (default: 0xACE1)
  --policy <policy>    Sink combine policy: and, or, level (default: level)
  --pulse              Publish a one-tick pulse when the window opens
  --unwired            Leave the sink without a source
  --fallback           Decide true for silent sources
  -o, --output <file>  Write records to a file instead of stdout
  -h, --help           Show this help message

Logging goes to stderr and is filtered by RUST_LOG (default: warn).

Examples:
  trigger-demo run
  trigger-demo run --start 10 --end 20 --cycles 40
  trigger-demo run --pulse -o trace.log
";

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    scenario: ScenarioConfig,
    seed: u16,
    output: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Run(RunArgs),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args).map(ParseResult::Run),
        other => Err(format!("unknown command: {other}")),
    }
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn parse_tick(text: &str, flag: &str) -> Result<Tick, String> {
    text.parse().map_err(|_| format!("invalid value for {flag}: {text}"))
}

fn parse_seed(text: &str) -> Result<u16, String> {
    let parsed = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .map_or_else(|| text.parse(), |hex| u16::from_str_radix(hex, 16));
    parsed.map_err(|_| format!("invalid value for --seed: {text}"))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut start = DEFAULT_START;
    let mut end = DEFAULT_END;
    let mut cycles = DEFAULT_CYCLES;
    let mut seed = DEFAULT_LFSR_SEED;
    let mut policy = CombinePolicy::Level;
    let mut edge_mode = false;
    let mut wired = true;
    let mut fallback = false;
    let mut output: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        let arg = arg.to_string_lossy().to_string();
        match arg.as_str() {
            "--help" | "-h" => return Err(USAGE_TEXT.to_string()),
            "--start" => start = parse_tick(&next_value(&mut args, "--start")?, "--start")?,
            "--end" => end = parse_tick(&next_value(&mut args, "--end")?, "--end")?,
            "--cycles" => cycles = parse_tick(&next_value(&mut args, "--cycles")?, "--cycles")?,
            "--seed" => seed = parse_seed(&next_value(&mut args, "--seed")?)?,
            "--policy" => {
                policy = next_value(&mut args, "--policy")?
                    .parse()
                    .map_err(|error| format!("{error}"))?;
            }
            "--pulse" => edge_mode = true,
            "--unwired" => wired = false,
            "--fallback" => fallback = true,
            "-o" | "--output" => output = Some(PathBuf::from(next_value(&mut args, &arg)?)),
            other => return Err(format!("unknown option: {other}")),
        }
    }

    if end < start {
        return Err(format!("--end ({end}) is before --start ({start})"));
    }

    Ok(RunArgs {
        scenario: ScenarioConfig {
            window: TickRange::new(start, end),
            cycles,
            trigger: TriggerConfig {
                policy,
                fallback_when_unpublished: fallback,
                edge_mode,
                ..TriggerConfig::default()
            },
            wired,
        },
        seed,
        output,
    })
}

fn drive<W: Write>(args: &RunArgs, writer: W) -> Result<ScenarioReport, i32> {
    let mut sink = WriterRecordSink::new(writer);
    let mut payload = Lfsr16::new(args.seed);

    let report = run_scenario(&args.scenario, &mut payload, &mut sink).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    sink.finish().map_err(|e| {
        eprintln!("error: failed to write records: {e}");
        1
    })?;

    Ok(report)
}

fn run_run(args: &RunArgs) -> Result<(), i32> {
    let report = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                eprintln!("error: failed to create {}: {e}", path.display());
                1
            })?;
            drive(args, BufWriter::new(file))?
        }
        None => drive(args, io::stdout().lock())?,
    };

    eprintln!(
        "Simulated {} ticks, emitted {} records ({} parent, {} child)",
        report.ticks,
        report.records(),
        report.parent.fired,
        report.child.fired
    );

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn main() {
    init_tracing();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(args)) => match run_run(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
