//! Core data structures shared across the pipeline.
//!
//! Tabular datasets travel as polars `DataFrame`s; the types here cover the
//! record-shaped inputs delivered by a `SourceReader` and the decoded form of
//! a single weather message.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Station identifier. `0` denotes "the nearest station is station 0" and is
/// an ordinary id, never a marker for a missing value.
pub type StationId = i64;

/// Field identifier, unique within a survey
pub type FieldId = i64;

/// One row of the proximity mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationMapping {
    pub field_id: FieldId,
    pub weather_station_id: StationId,
}

impl StationMapping {
    pub fn new(field_id: FieldId, weather_station_id: StationId) -> Self {
        Self {
            field_id,
            weather_station_id,
        }
    }
}

/// Raw telemetry text as sent by a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherMessage {
    pub weather_station_id: StationId,
    pub text: String,
}

impl WeatherMessage {
    pub fn new(weather_station_id: StationId, text: impl Into<String>) -> Self {
        Self {
            weather_station_id,
            text: text.into(),
        }
    }
}

/// Measurements decoded from one message. A column with no entry is null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    values: BTreeMap<String, f64>,
}

impl WeatherRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: f64) {
        self.values.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    /// True when nothing was decoded
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Counts gathered during a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub field_rows_in: usize,
    pub field_rows_out: usize,
    pub excluded_fields: usize,
    pub values_imputed: usize,
    pub messages_decoded: usize,
    pub measurements_decoded: usize,
    pub decode_failures: usize,
    pub stations_aggregated: usize,
    pub processing_time_ms: u128,
}
