//! Application constants for the survey processor
//!
//! Column names, default vocabularies and correction tables shared by the
//! transformer, decoder, aggregator and validator.

// =============================================================================
// Column Names
// =============================================================================

pub mod columns {
    pub const FIELD_ID: &str = "Field_ID";
    pub const WEATHER_STATION_ID: &str = "Weather_station_ID";
    pub const MESSAGE: &str = "Message";

    pub const ELEVATION: &str = "Elevation";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const LOCATION: &str = "Location";
    pub const SLOPE: &str = "Slope";

    pub const RAINFALL: &str = "Rainfall";
    pub const MIN_TEMPERATURE: &str = "Min_temperature_C";
    pub const MAX_TEMPERATURE: &str = "Max_temperature_C";
    pub const AVE_TEMPS: &str = "Ave_temps";

    pub const SOIL_FERTILITY: &str = "Soil_fertility";
    pub const SOIL_TYPE: &str = "Soil_type";
    pub const PH: &str = "pH";

    pub const POLLUTION_LEVEL: &str = "Pollution_level";
    pub const PLOT_SIZE: &str = "Plot_size";
    pub const CHOSEN_CROP: &str = "Chosen_crop";
    pub const ANNUAL_YIELD: &str = "Annual_yield";
    pub const STANDARD_YIELD: &str = "Standard_yield";

    /// Raw-source name of the column that actually holds yields
    pub const RAW_CROP_TYPE: &str = "Crop_type";

    /// Mapping CSVs in the wild use this name for the station column
    pub const LEGACY_WEATHER_STATION: &str = "Weather_station";
}

use columns::*;

/// Canonical field-dataset columns after renaming, before the station join
pub const CANONICAL_FIELD_COLUMNS: &[&str] = &[
    FIELD_ID,
    ELEVATION,
    LATITUDE,
    LONGITUDE,
    LOCATION,
    SLOPE,
    RAINFALL,
    MIN_TEMPERATURE,
    MAX_TEMPERATURE,
    AVE_TEMPS,
    SOIL_FERTILITY,
    SOIL_TYPE,
    PH,
    POLLUTION_LEVEL,
    PLOT_SIZE,
    CHOSEN_CROP,
    ANNUAL_YIELD,
    STANDARD_YIELD,
];

/// Column order delivered by the relational source (yield/crop swapped)
pub const RAW_FIELD_COLUMNS: &[&str] = &[
    FIELD_ID,
    ELEVATION,
    LATITUDE,
    LONGITUDE,
    LOCATION,
    SLOPE,
    RAINFALL,
    MIN_TEMPERATURE,
    MAX_TEMPERATURE,
    AVE_TEMPS,
    SOIL_FERTILITY,
    SOIL_TYPE,
    PH,
    POLLUTION_LEVEL,
    PLOT_SIZE,
    ANNUAL_YIELD,
    RAW_CROP_TYPE,
    STANDARD_YIELD,
];

/// Default rename table, applied simultaneously
pub const DEFAULT_RENAMES: &[(&str, &str)] = &[
    (ANNUAL_YIELD, CHOSEN_CROP),
    (RAW_CROP_TYPE, ANNUAL_YIELD),
];

// =============================================================================
// Domain Vocabularies
// =============================================================================

/// Crops a field may be planted with
pub const CROP_TYPES: &[&str] = &[
    "cassava", "tea", "wheat", "potato", "banana", "coffee", "rice", "maize",
];

/// Known misspellings in the crop column
pub const CROP_SPELLING_FIXES: &[(&str, &str)] = &[
    ("cassaval", "cassava"),
    ("wheatn", "wheat"),
    ("teaa", "tea"),
];

/// Default decoder vocabulary: canonical column and the names that anchor it
pub const DEFAULT_MEASUREMENTS: &[(&str, &[&str])] = &[
    (RAINFALL, &["Rainfall"]),
    (
        MIN_TEMPERATURE,
        &["Min_temperature_C", "Min temperature", "Minimum temperature"],
    ),
    (
        MAX_TEMPERATURE,
        &["Max_temperature_C", "Max temperature", "Maximum temperature"],
    ),
    (AVE_TEMPS, &["Ave_temps", "Average temperature"]),
];

// =============================================================================
// Correction Bounds
// =============================================================================

/// Fractions stored on a unit scale
pub const UNIT_INTERVAL: (f64, f64) = (0.0, 1.0);

/// Suffix for aggregate columns while they are joined onto the field frame
pub const STATION_MEAN_SUFFIX: &str = "__station_mean";

/// Temporary row index used to keep input order through joins
pub const ROW_ORDER_COLUMN: &str = "__row_order";
