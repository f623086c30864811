//! Weather-station telemetry: message decoding and per-station aggregation.

pub mod aggregator;
pub mod decoder;

#[cfg(test)]
pub mod tests;

pub use aggregator::{AggregateTable, WeatherAggregator};
pub use decoder::{DecodeFailure, DecodeOutcome, DecodeStats, MeasurementRule, MessageDecoder};
