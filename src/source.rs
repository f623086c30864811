//! Source readers for the three raw inputs.
//!
//! The pipeline only needs the raw field table, the station messages and the
//! proximity mapping; where they come from is behind `SourceReader`.
//! `CsvSource` reads local CSV exports for the command-line tool and
//! `InMemorySource` serves data that is already loaded.

use crate::constants::columns;
use crate::error::{Result, SurveyError};
use crate::models::{StationMapping, WeatherMessage};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows used for CSV schema inference
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Provider of raw survey inputs
pub trait SourceReader {
    /// Raw field table in source column naming
    fn field_records(&self) -> Result<DataFrame>;

    fn weather_messages(&self) -> Result<Vec<WeatherMessage>>;

    fn station_mapping(&self) -> Result<Vec<StationMapping>>;
}

/// Inputs held in memory
#[derive(Debug, Clone)]
pub struct InMemorySource {
    fields: DataFrame,
    messages: Vec<WeatherMessage>,
    mapping: Vec<StationMapping>,
}

impl InMemorySource {
    pub fn new(
        fields: DataFrame,
        messages: Vec<WeatherMessage>,
        mapping: Vec<StationMapping>,
    ) -> Self {
        Self {
            fields,
            messages,
            mapping,
        }
    }
}

impl SourceReader for InMemorySource {
    fn field_records(&self) -> Result<DataFrame> {
        Ok(self.fields.clone())
    }

    fn weather_messages(&self) -> Result<Vec<WeatherMessage>> {
        Ok(self.messages.clone())
    }

    fn station_mapping(&self) -> Result<Vec<StationMapping>> {
        Ok(self.mapping.clone())
    }
}

/// Three CSV files with header rows
#[derive(Debug, Clone)]
pub struct CsvSource {
    fields_path: PathBuf,
    weather_path: PathBuf,
    mapping_path: PathBuf,
}

impl CsvSource {
    pub fn new(
        fields_path: impl Into<PathBuf>,
        weather_path: impl Into<PathBuf>,
        mapping_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fields_path: fields_path.into(),
            weather_path: weather_path.into(),
            mapping_path: mapping_path.into(),
        }
    }
}

impl SourceReader for CsvSource {
    fn field_records(&self) -> Result<DataFrame> {
        read_csv(&self.fields_path)
    }

    /// Expects `Weather_station_ID` and `Message` columns
    fn weather_messages(&self) -> Result<Vec<WeatherMessage>> {
        let frame = read_csv(&self.weather_path)?;
        let stations = integer_column(&frame, columns::WEATHER_STATION_ID, "weather source")?;
        let texts = frame
            .column(columns::MESSAGE)
            .map_err(|_| SurveyError::missing_column("weather source", columns::MESSAGE))?
            .cast(&DataType::String)?;
        let texts = texts.as_materialized_series().str()?;

        let mut messages = Vec::with_capacity(frame.height());
        for (station, text) in stations.into_iter().zip(texts.into_iter()) {
            match station {
                Some(station) => messages.push(WeatherMessage::new(station, text.unwrap_or(""))),
                None => debug!("Skipping message without a station id"),
            }
        }
        Ok(messages)
    }

    /// Expects `Field_ID` plus `Weather_station_ID` or `Weather_station`
    fn station_mapping(&self) -> Result<Vec<StationMapping>> {
        let frame = read_csv(&self.mapping_path)?;
        let station_column = [columns::WEATHER_STATION_ID, columns::LEGACY_WEATHER_STATION]
            .into_iter()
            .find(|name| frame.column(name).is_ok())
            .ok_or_else(|| SurveyError::missing_column("mapping source", columns::WEATHER_STATION_ID))?;

        let fields = integer_column(&frame, columns::FIELD_ID, "mapping source")?;
        let stations = integer_column(&frame, station_column, "mapping source")?;

        let mut mapping = Vec::with_capacity(frame.height());
        let mut incomplete = Vec::new();
        for (field, station) in fields.into_iter().zip(stations.into_iter()) {
            match (field, station) {
                (Some(field), Some(station)) => mapping.push(StationMapping::new(field, station)),
                (Some(field), None) => incomplete.push(field),
                (None, _) => {}
            }
        }

        if !incomplete.is_empty() {
            return Err(SurveyError::mapping(
                "mapping rows have no station id",
                incomplete,
            ));
        }
        Ok(mapping)
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(SurveyError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    info!(
        "Read {} rows x {} columns from {}",
        frame.height(),
        frame.width(),
        path.display()
    );
    Ok(frame)
}

fn integer_column(frame: &DataFrame, name: &str, stage: &str) -> Result<Int64Chunked> {
    let column = frame
        .column(name)
        .map_err(|_| SurveyError::missing_column(stage, name))?
        .cast(&DataType::Int64)?;
    Ok(column.as_materialized_series().i64()?.clone())
}
