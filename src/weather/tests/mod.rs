//! Tests for the weather module
//!
//! Decoder robustness against messy telemetry and aggregation arithmetic.


use crate::config::PipelineConfig;
use crate::weather::{MessageDecoder, WeatherAggregator};

/// Decoder over the default four-measurement vocabulary
pub fn default_decoder() -> MessageDecoder {
    MessageDecoder::new(&PipelineConfig::default().measurements).unwrap()
}

pub fn default_aggregator() -> WeatherAggregator {
    WeatherAggregator::new(default_decoder())
}

/// Relative comparison for floating-point means
pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}
