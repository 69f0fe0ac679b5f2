//! Host tick driver demonstrating trigger-gated diagnostic output.

/// Pseudo-random payload generators standing in for observed hardware.
pub mod payload;
/// Tick loop wiring one range trigger to gated parent and child emissions.
pub mod scenario;

#[cfg(test)]
use tempfile as _;
use tracing_subscriber as _;
