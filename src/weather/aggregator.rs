//! Per-station aggregation of decoded weather measurements.
//!
//! Means are computed with polars' null-skipping `mean`, so a station whose
//! messages never carried a measurement ends up with a null for it rather
//! than zero. The result is sorted by station id and indexed for lookups
//! during imputation.

use super::decoder::{DecodeStats, MessageDecoder};
use crate::config::PipelineConfig;
use crate::constants::columns;
use crate::error::Result;
use crate::models::{StationId, WeatherMessage, WeatherRecord};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Aggregated weather dataset keyed by station
#[derive(Debug, Clone)]
pub struct AggregateTable {
    frame: DataFrame,
    decoded: DataFrame,
    measurement_columns: Vec<String>,
    lookup: BTreeMap<StationId, BTreeMap<String, Option<f64>>>,
    stats: DecodeStats,
}

impl AggregateTable {
    /// One row per station: `Weather_station_ID` plus one mean per measurement
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// One row per message with the decoded values, kept for auditing
    pub fn decoded(&self) -> &DataFrame {
        &self.decoded
    }

    pub fn measurement_columns(&self) -> &[String] {
        &self.measurement_columns
    }

    /// Mean of `measurement` at `station`; `None` when the station has no
    /// messages or none of them carried the measurement
    pub fn get(&self, station: StationId, measurement: &str) -> Option<f64> {
        self.lookup
            .get(&station)
            .and_then(|means| means.get(measurement).copied().flatten())
    }

    pub fn contains_station(&self, station: StationId) -> bool {
        self.lookup.contains_key(&station)
    }

    pub fn stations(&self) -> Vec<StationId> {
        self.lookup.keys().copied().collect()
    }

    pub fn station_count(&self) -> usize {
        self.lookup.len()
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }
}

/// Decodes station messages and reduces them to per-station means
#[derive(Debug, Clone)]
pub struct WeatherAggregator {
    decoder: MessageDecoder,
}

impl WeatherAggregator {
    pub fn new(decoder: MessageDecoder) -> Self {
        Self { decoder }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(MessageDecoder::new(&config.measurements)?))
    }

    pub fn decoder(&self) -> &MessageDecoder {
        &self.decoder
    }

    /// Decode every message and aggregate by station
    pub fn aggregate(&self, messages: &[WeatherMessage]) -> Result<AggregateTable> {
        let mut stats = DecodeStats::default();
        let records: Vec<(StationId, WeatherRecord)> = messages
            .iter()
            .map(|message| {
                let outcome = self.decoder.decode_detailed(&message.text);
                stats.record(&outcome);
                (message.weather_station_id, outcome.record)
            })
            .collect();

        info!(
            "Decoded {} messages: {} values, {} failures ({:.1}% success)",
            stats.messages,
            stats.values_decoded,
            stats.failures,
            stats.success_rate()
        );

        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        self.build_table(&records, Some(&texts), stats)
    }

    /// Aggregate records that were decoded elsewhere
    pub fn aggregate_records(&self, records: &[(StationId, WeatherRecord)]) -> Result<AggregateTable> {
        let stats = DecodeStats {
            messages: records.len(),
            values_decoded: records.iter().map(|(_, r)| r.len()).sum(),
            failures: 0,
            messages_without_values: records.iter().filter(|(_, r)| r.is_empty()).count(),
        };
        self.build_table(records, None, stats)
    }

    fn build_table(
        &self,
        records: &[(StationId, WeatherRecord)],
        texts: Option<&[&str]>,
        stats: DecodeStats,
    ) -> Result<AggregateTable> {
        let measurement_columns: Vec<String> =
            self.decoder.columns().map(str::to_string).collect();

        let decoded = decoded_frame(records, texts, &measurement_columns)?;
        let frame = station_means(&decoded, &measurement_columns)?;
        let lookup = index_means(&frame, &measurement_columns)?;

        debug!(
            "Aggregated {} decoded rows into {} stations",
            decoded.height(),
            frame.height()
        );

        Ok(AggregateTable {
            frame,
            decoded,
            measurement_columns,
            lookup,
            stats,
        })
    }
}

/// Lay decoded records out as a frame, one nullable column per measurement
fn decoded_frame(
    records: &[(StationId, WeatherRecord)],
    texts: Option<&[&str]>,
    measurement_columns: &[String],
) -> Result<DataFrame> {
    let stations: Vec<StationId> = records.iter().map(|(station, _)| *station).collect();

    let mut frame_columns: Vec<Column> =
        vec![Series::new(columns::WEATHER_STATION_ID.into(), stations).into()];

    if let Some(texts) = texts {
        frame_columns.push(Series::new(columns::MESSAGE.into(), texts).into());
    }

    for measurement in measurement_columns {
        let values: Vec<Option<f64>> = records
            .iter()
            .map(|(_, record)| record.get(measurement))
            .collect();
        frame_columns.push(Series::new(measurement.as_str().into(), values).into());
    }

    Ok(DataFrame::new(frame_columns)?)
}

/// Null-skipping mean per station, sorted by station id
fn station_means(decoded: &DataFrame, measurement_columns: &[String]) -> Result<DataFrame> {
    let means: Vec<Expr> = measurement_columns
        .iter()
        .map(|m| col(m.as_str()).mean().alias(m.as_str()))
        .collect();

    let frame = decoded
        .clone()
        .lazy()
        .group_by([col(columns::WEATHER_STATION_ID)])
        .agg(means)
        .sort_by_exprs(
            [col(columns::WEATHER_STATION_ID)],
            SortMultipleOptions::default(),
        )
        .collect()?;

    Ok(frame)
}

fn index_means(
    frame: &DataFrame,
    measurement_columns: &[String],
) -> Result<BTreeMap<StationId, BTreeMap<String, Option<f64>>>> {
    let stations = frame
        .column(columns::WEATHER_STATION_ID)?
        .as_materialized_series()
        .i64()?;

    let mut lookup = BTreeMap::new();
    for measurement in measurement_columns {
        let means = frame
            .column(measurement)?
            .as_materialized_series()
            .f64()?;

        for (station, mean) in stations.into_iter().zip(means.into_iter()) {
            if let Some(station) = station {
                lookup
                    .entry(station)
                    .or_insert_with(BTreeMap::new)
                    .insert(measurement.clone(), mean);
            }
        }
    }

    // Stations are present even when the vocabulary produced no columns
    for station in stations.into_iter().flatten() {
        lookup.entry(station).or_insert_with(BTreeMap::new);
    }

    Ok(lookup)
}
