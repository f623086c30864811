//! Output validation rules and the validation report.
//!
//! Every rule reads the cleaned frames and returns one `RuleResult`. Rules
//! never mutate their inputs and never depend on each other's outcome, so a
//! single bad value fails exactly the rule that checks it. A failing rule is
//! a finding, not an error: `validate` always returns a complete report.

use crate::config::PipelineConfig;
use crate::constants::columns;
use crate::error::Result;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Stable rule identifiers, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    FieldSchema,
    WeatherSchema,
    FieldNotEmpty,
    WeatherNotEmpty,
    CropMembership,
    ElevationNonNegative,
    FieldIdUnique,
    RainfallNonNegative,
}

impl RuleId {
    pub const ALL: [RuleId; 8] = [
        RuleId::FieldSchema,
        RuleId::WeatherSchema,
        RuleId::FieldNotEmpty,
        RuleId::WeatherNotEmpty,
        RuleId::CropMembership,
        RuleId::ElevationNonNegative,
        RuleId::FieldIdUnique,
        RuleId::RainfallNonNegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::FieldSchema => "field_schema",
            RuleId::WeatherSchema => "weather_schema",
            RuleId::FieldNotEmpty => "field_not_empty",
            RuleId::WeatherNotEmpty => "weather_not_empty",
            RuleId::CropMembership => "crop_membership",
            RuleId::ElevationNonNegative => "elevation_non_negative",
            RuleId::FieldIdUnique => "field_id_unique",
            RuleId::RainfallNonNegative => "rainfall_non_negative",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub rule: RuleId,
    pub passed: bool,
    pub detail: String,
}

impl RuleResult {
    fn pass(rule: RuleId, detail: impl Into<String>) -> Self {
        Self {
            rule,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(rule: RuleId, detail: impl Into<String>) -> Self {
        Self {
            rule,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Ordered rule outcomes for one pair of datasets
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<RuleResult>,
}

impl ValidationReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> Vec<&RuleResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    pub fn get(&self, rule: RuleId) -> Option<&RuleResult> {
        self.results.iter().find(|r| r.rule == rule)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            let status = if result.passed { "PASS" } else { "FAIL" };
            writeln!(f, "{} {:<24} {}", status, result.rule.as_str(), result.detail)?;
        }
        write!(
            f,
            "{} of {} rules passed",
            self.results.len() - self.failures().len(),
            self.results.len()
        )
    }
}

/// Checks cleaned field and weather frames against the expected shape and
/// the domain constraints
#[derive(Debug, Clone)]
pub struct Validator {
    expected_field_columns: Vec<String>,
    expected_weather_columns: Vec<String>,
    crop_types: HashSet<String>,
}

impl Validator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            expected_field_columns: config.expected_field_columns.clone(),
            expected_weather_columns: config.expected_weather_columns(),
            crop_types: config
                .crop_types
                .iter()
                .map(|c| c.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn validate(&self, field: &DataFrame, weather: &DataFrame) -> ValidationReport {
        let results: Vec<RuleResult> = RuleId::ALL
            .iter()
            .map(|rule| self.check(*rule, field, weather))
            .collect();

        for result in results.iter().filter(|r| !r.passed) {
            warn!("Validation rule {} failed: {}", result.rule, result.detail);
        }
        info!(
            "Validation finished: {} of {} rules passed",
            results.iter().filter(|r| r.passed).count(),
            results.len()
        );

        ValidationReport {
            generated_at: Utc::now(),
            results,
        }
    }

    /// Evaluate a single rule
    pub fn check(&self, rule: RuleId, field: &DataFrame, weather: &DataFrame) -> RuleResult {
        debug!("Checking rule {}", rule);
        match rule {
            RuleId::FieldSchema => check_schema(rule, field, &self.expected_field_columns),
            RuleId::WeatherSchema => check_schema(rule, weather, &self.expected_weather_columns),
            RuleId::FieldNotEmpty => check_not_empty(rule, field),
            RuleId::WeatherNotEmpty => check_not_empty(rule, weather),
            RuleId::CropMembership => self.check_crops(field),
            RuleId::ElevationNonNegative => check_elevation(field, weather),
            RuleId::FieldIdUnique => check_field_ids(field),
            RuleId::RainfallNonNegative => check_rainfall(weather),
        }
    }

    fn check_crops(&self, field: &DataFrame) -> RuleResult {
        let rule = RuleId::CropMembership;
        let values = match string_values(field, columns::CHOSEN_CROP) {
            Ok(values) => values,
            Err(detail) => return RuleResult::fail(rule, detail),
        };

        let mut unknown = BTreeSet::new();
        let mut nulls = 0;
        for value in values {
            match value {
                Some(crop) if self.crop_types.contains(&crop.trim().to_lowercase()) => {}
                Some(crop) => {
                    unknown.insert(crop);
                }
                None => nulls += 1,
            }
        }

        if unknown.is_empty() && nulls == 0 {
            RuleResult::pass(rule, "every Chosen_crop is a known crop")
        } else {
            RuleResult::fail(
                rule,
                format!("unknown crops {:?}, {} missing", unknown, nulls),
            )
        }
    }
}

fn frame_columns(frame: &DataFrame) -> BTreeSet<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn check_schema(rule: RuleId, frame: &DataFrame, expected: &[String]) -> RuleResult {
    let actual = frame_columns(frame);
    let expected: BTreeSet<String> = expected.iter().cloned().collect();

    let missing: Vec<&String> = expected.difference(&actual).collect();
    let unexpected: Vec<&String> = actual.difference(&expected).collect();

    if frame.height() == 0 {
        return RuleResult::fail(rule, "dataset has no rows");
    }
    if missing.is_empty() && unexpected.is_empty() {
        RuleResult::pass(rule, format!("{} expected columns present", expected.len()))
    } else {
        RuleResult::fail(
            rule,
            format!("missing {:?}, unexpected {:?}", missing, unexpected),
        )
    }
}

fn check_not_empty(rule: RuleId, frame: &DataFrame) -> RuleResult {
    match frame.height() {
        0 => RuleResult::fail(rule, "dataset has no rows"),
        rows => RuleResult::pass(rule, format!("{} rows", rows)),
    }
}

/// Values of a column as floats; `Err` carries the failure detail
fn float_values(frame: &DataFrame, column: &str) -> std::result::Result<Vec<Option<f64>>, String> {
    let values = frame
        .column(column)
        .and_then(|c| c.cast(&DataType::Float64))
        .map_err(|e| format!("cannot read {}: {}", column, e))?;
    let values = values
        .as_materialized_series()
        .f64()
        .map_err(|e| format!("cannot read {}: {}", column, e))?
        .into_iter()
        .collect();
    Ok(values)
}

fn string_values(frame: &DataFrame, column: &str) -> std::result::Result<Vec<Option<String>>, String> {
    let values = frame
        .column(column)
        .and_then(|c| c.cast(&DataType::String))
        .map_err(|e| format!("cannot read {}: {}", column, e))?;
    let values = values
        .as_materialized_series()
        .str()
        .map_err(|e| format!("cannot read {}: {}", column, e))?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Elevation must be >= 0 wherever the column exists. Nulls and NaN fail.
fn check_elevation(field: &DataFrame, weather: &DataFrame) -> RuleResult {
    let rule = RuleId::ElevationNonNegative;
    let mut checked = 0;
    let mut violations = 0;

    for frame in [field, weather] {
        if frame.column(columns::ELEVATION).is_err() {
            continue;
        }
        let values = match float_values(frame, columns::ELEVATION) {
            Ok(values) => values,
            Err(detail) => return RuleResult::fail(rule, detail),
        };
        checked += values.len();
        violations += values
            .iter()
            .filter(|v| !matches!(v, Some(x) if *x >= 0.0))
            .count();
    }

    if violations == 0 {
        RuleResult::pass(rule, format!("{} elevations checked", checked))
    } else {
        RuleResult::fail(
            rule,
            format!("{} of {} elevations are negative or missing", violations, checked),
        )
    }
}

fn check_field_ids(field: &DataFrame) -> RuleResult {
    let rule = RuleId::FieldIdUnique;
    let ids = match field
        .column(columns::FIELD_ID)
        .and_then(|c| c.cast(&DataType::Int64))
    {
        Ok(ids) => ids,
        Err(e) => return RuleResult::fail(rule, format!("cannot read Field_ID: {}", e)),
    };
    let ids = match ids.as_materialized_series().i64() {
        Ok(ids) => ids.clone(),
        Err(e) => return RuleResult::fail(rule, format!("cannot read Field_ID: {}", e)),
    };

    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for id in ids.into_iter().flatten() {
        if !seen.insert(id) {
            duplicates.insert(id);
        }
    }
    let nulls = ids.null_count();

    if duplicates.is_empty() && nulls == 0 {
        RuleResult::pass(rule, format!("{} unique Field_IDs", seen.len()))
    } else {
        RuleResult::fail(
            rule,
            format!("duplicate Field_IDs {:?}, {} missing", duplicates, nulls),
        )
    }
}

/// Station means may be null when a station never reported rainfall
fn check_rainfall(weather: &DataFrame) -> RuleResult {
    let rule = RuleId::RainfallNonNegative;
    if weather.column(columns::RAINFALL).is_err() {
        return RuleResult::pass(rule, "no Rainfall column");
    }
    let values = match float_values(weather, columns::RAINFALL) {
        Ok(values) => values,
        Err(detail) => return RuleResult::fail(rule, detail),
    };

    let negative = values
        .iter()
        .flatten()
        .filter(|x| x.is_nan() || **x < 0.0)
        .count();

    if negative == 0 {
        RuleResult::pass(rule, "station rainfall means are non-negative")
    } else {
        RuleResult::fail(rule, format!("{} stations report negative rainfall", negative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_frame(elevation: &[f64], crops: &[Option<&str>]) -> DataFrame {
        let rows = elevation.len();
        let ids: Vec<i64> = (1..=rows as i64).collect();
        let numbers = vec![1.0; rows];
        let text = vec!["x"; rows];

        let mut frame_columns: Vec<Column> = Vec::new();
        for name in PipelineConfig::default().expected_field_columns {
            let label = PlSmallStr::from(name.as_str());
            let column: Column = match name.as_str() {
                "Field_ID" | "Weather_station_ID" => Series::new(label, ids.clone()).into(),
                "Elevation" => Series::new(label, elevation).into(),
                "Chosen_crop" => Series::new(label, crops).into(),
                "Location" | "Soil_type" => Series::new(label, text.clone()).into(),
                _ => Series::new(label, numbers.clone()).into(),
            };
            frame_columns.push(column);
        }
        DataFrame::new(frame_columns).unwrap()
    }

    fn weather_frame(rainfall: &[Option<f64>]) -> DataFrame {
        let rows = rainfall.len();
        df!(
            "Weather_station_ID" => (0..rows as i64).collect::<Vec<_>>(),
            "Rainfall" => rainfall,
            "Min_temperature_C" => vec![Some(10.0); rows],
            "Max_temperature_C" => vec![Some(30.0); rows],
            "Ave_temps" => vec![Some(20.0); rows],
        )
        .unwrap()
    }

    fn validator() -> Validator {
        Validator::new(&PipelineConfig::default())
    }

    fn failing(report: &ValidationReport) -> Vec<RuleId> {
        report.failures().iter().map(|r| r.rule).collect()
    }

    #[test]
    fn test_clean_data_passes_every_rule() {
        let report = validator().validate(
            &field_frame(&[10.0, 0.0], &[Some("maize"), Some("tea")]),
            &weather_frame(&[Some(15.0), None]),
        );

        assert!(report.all_passed(), "{report}");
        assert_eq!(report.results.len(), RuleId::ALL.len());
    }

    #[test]
    fn test_one_bad_crop_fails_exactly_one_rule() {
        let report = validator().validate(
            &field_frame(&[10.0, 20.0], &[Some("maize"), Some("banana split")]),
            &weather_frame(&[Some(15.0)]),
        );

        assert_eq!(failing(&report), vec![RuleId::CropMembership]);
    }

    #[test]
    fn test_crop_check_ignores_case_and_padding_but_not_nulls() {
        let padded = validator().check(
            RuleId::CropMembership,
            &field_frame(&[1.0], &[Some(" Maize ")]),
            &weather_frame(&[Some(1.0)]),
        );
        assert!(padded.passed);

        let missing = validator().check(
            RuleId::CropMembership,
            &field_frame(&[1.0], &[None]),
            &weather_frame(&[Some(1.0)]),
        );
        assert!(!missing.passed);
    }

    #[test]
    fn test_elevation_boundary() {
        let weather = weather_frame(&[Some(1.0)]);

        let zero = validator().validate(&field_frame(&[0.0], &[Some("tea")]), &weather);
        assert!(zero.all_passed());

        let below = validator().validate(&field_frame(&[-0.0001], &[Some("tea")]), &weather);
        assert_eq!(failing(&below), vec![RuleId::ElevationNonNegative]);

        let nan = validator().validate(&field_frame(&[f64::NAN], &[Some("tea")]), &weather);
        assert_eq!(failing(&nan), vec![RuleId::ElevationNonNegative]);
    }

    #[test]
    fn test_schema_mismatch_reported() {
        let field = field_frame(&[1.0], &[Some("tea")]).drop("Slope").unwrap();
        let report = validator().validate(&field, &weather_frame(&[Some(1.0)]));

        assert_eq!(failing(&report), vec![RuleId::FieldSchema]);
        assert!(report.get(RuleId::FieldSchema).unwrap().detail.contains("Slope"));
    }

    #[test]
    fn test_empty_weather_dataset() {
        let report = validator().validate(&field_frame(&[1.0], &[Some("tea")]), &weather_frame(&[]));

        assert_eq!(
            failing(&report),
            vec![RuleId::WeatherSchema, RuleId::WeatherNotEmpty]
        );
    }

    #[test]
    fn test_negative_rainfall_mean() {
        let report = validator().validate(
            &field_frame(&[1.0], &[Some("tea")]),
            &weather_frame(&[Some(-2.0), Some(3.0)]),
        );

        assert_eq!(failing(&report), vec![RuleId::RainfallNonNegative]);
    }

    #[test]
    fn test_validation_does_not_mutate_inputs() {
        let field = field_frame(&[-5.0], &[Some("teaa")]);
        let weather = weather_frame(&[Some(1.0)]);
        let field_before = field.clone();

        let _ = validator().validate(&field, &weather);
        assert!(field.equals_missing(&field_before));
    }

    #[test]
    fn test_report_json() {
        let report = validator().validate(
            &field_frame(&[1.0], &[Some("tea")]),
            &weather_frame(&[Some(1.0)]),
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["results"][0]["rule"], "field_schema");
        assert_eq!(json["results"][0]["passed"], true);
        assert!(json["generated_at"].is_string());
    }
}
