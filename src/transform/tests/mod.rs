//! Tests for the transform module
//!
//! Fixtures model a small raw survey extract with the known quirks:
//! swapped crop/yield headers, a negative elevation, misspelled and padded
//! crop labels, out-of-range proportions and missing rainfall.

pub mod rename_tests;
pub mod station_tests;

use crate::config::PipelineConfig;
use crate::models::{StationMapping, WeatherMessage};
use crate::weather::{AggregateTable, WeatherAggregator};
use polars::prelude::*;

/// Three raw field rows in source column order
pub fn raw_field_frame() -> DataFrame {
    df!(
        "Field_ID" => [40734i64, 30629, 39924],
        "Elevation" => [786.05, -674.99, 826.53],
        "Latitude" => [-7.72, -7.75, -9.93],
        "Longitude" => [-1.12, -1.23, -1.81],
        "Location" => ["Rural_Akatsi", "Rural_Sokoto", "Rural_Hawassa"],
        "Slope" => [14.80, 11.37, 7.10],
        "Rainfall" => [Some(1125.2), None, None],
        "Min_temperature_C" => [-3.1, -3.9, -1.8],
        "Max_temperature_C" => [33.1, 30.6, 28.4],
        "Ave_temps" => [15.0, 13.35, 13.3],
        "Soil_fertility" => [0.62, 0.64, 1.2],
        "Soil_type" => ["Sandy", " Volcanic", "Silt"],
        "pH" => [6.17, 5.68, 5.33],
        "Pollution_level" => [0.08, 0.42, -0.1],
        "Plot_size" => [0.7, 2.5, 1.3],
        "Annual_yield" => ["cassaval", "Wheat ", "tea"],
        "Crop_type" => [0.75, 0.95, 0.99],
        "Standard_yield" => [0.05, 0.04, 0.02],
    )
    .unwrap()
}

/// Fields 40734 and 39924 near station 0, field 30629 near station 1
pub fn station_mapping() -> Vec<StationMapping> {
    vec![
        StationMapping::new(40734, 0),
        StationMapping::new(30629, 1),
        StationMapping::new(39924, 0),
    ]
}

/// Station 0 reports rainfall twice; station 1 never reports
pub fn station_aggregates() -> AggregateTable {
    let aggregator = WeatherAggregator::from_config(&PipelineConfig::default()).unwrap();
    aggregator
        .aggregate(&[
            WeatherMessage::new(0, "Rainfall: 10 mm"),
            WeatherMessage::new(0, "Rainfall: 20 mm"),
        ])
        .unwrap()
}

pub fn f64_values(frame: &DataFrame, column: &str) -> Vec<Option<f64>> {
    frame
        .column(column)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

pub fn str_values(frame: &DataFrame, column: &str) -> Vec<Option<String>> {
    frame
        .column(column)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

pub fn i64_values(frame: &DataFrame, column: &str) -> Vec<Option<i64>> {
    frame
        .column(column)
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

pub fn names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect()
}
