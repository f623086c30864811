//! Configuration management and validation.
//!
//! Every stage receives an immutable `PipelineConfig` instead of reading
//! ambient state, so each stage can be exercised on synthetic inputs. The
//! defaults reproduce the survey's known quirks: the swapped yield/crop
//! columns, negative elevations, and misspelled crop names.

use crate::constants::{self, columns};
use crate::error::{Result, SurveyError};
use crate::transform::correction::{Correction, CorrectionRule};
use crate::weather::decoder::MeasurementRule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

/// One entry of the rename table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

impl ColumnRename {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// What to do with fields that have no station in the proximity mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingPolicy {
    /// Abort the run with a `MappingError` naming the affected fields
    #[default]
    Fail,
    /// Drop the affected rows and record their ids on the cleaned dataset
    Exclude,
}

/// Global configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Incoming column name to canonical name, applied simultaneously
    pub column_renames: Vec<ColumnRename>,

    /// Row-local corrections, at most one per column
    pub corrections: Vec<CorrectionRule>,

    /// Allowed values of `Chosen_crop`
    pub crop_types: Vec<String>,

    /// Decoder vocabulary
    pub measurements: Vec<MeasurementRule>,

    /// Handling of fields without a station
    pub mapping_policy: MappingPolicy,

    /// Exact column set of the cleaned field dataset
    pub expected_field_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let column_renames = constants::DEFAULT_RENAMES
            .iter()
            .map(|(from, to)| ColumnRename::new(*from, *to))
            .collect();

        let crop_fixes: BTreeMap<String, String> = constants::CROP_SPELLING_FIXES
            .iter()
            .map(|(wrong, right)| (wrong.to_string(), right.to_string()))
            .collect();

        let (unit_min, unit_max) = constants::UNIT_INTERVAL;
        let corrections = vec![
            CorrectionRule::new(columns::ELEVATION, Correction::Absolute),
            CorrectionRule::new(
                columns::CHOSEN_CROP,
                Correction::Categorical {
                    trim: true,
                    lowercase: true,
                    replacements: crop_fixes,
                },
            ),
            CorrectionRule::new(
                columns::SOIL_TYPE,
                Correction::Categorical {
                    trim: true,
                    lowercase: false,
                    replacements: BTreeMap::new(),
                },
            ),
            CorrectionRule::new(
                columns::SOIL_FERTILITY,
                Correction::Clip {
                    min: unit_min,
                    max: unit_max,
                },
            ),
            CorrectionRule::new(
                columns::POLLUTION_LEVEL,
                Correction::Clip {
                    min: unit_min,
                    max: unit_max,
                },
            ),
        ];

        let measurements = constants::DEFAULT_MEASUREMENTS
            .iter()
            .map(|(column, aliases)| MeasurementRule::new(*column, aliases.iter().copied()))
            .collect();

        let mut expected_field_columns: Vec<String> = constants::CANONICAL_FIELD_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        expected_field_columns.push(columns::WEATHER_STATION_ID.to_string());

        Self {
            column_renames,
            corrections,
            crop_types: constants::CROP_TYPES.iter().map(|c| c.to_string()).collect(),
            measurements,
            mapping_policy: MappingPolicy::Fail,
            expected_field_columns,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file; omitted keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SurveyError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn with_column_renames(mut self, renames: Vec<ColumnRename>) -> Self {
        self.column_renames = renames;
        self
    }

    pub fn with_corrections(mut self, corrections: Vec<CorrectionRule>) -> Self {
        self.corrections = corrections;
        self
    }

    pub fn with_crop_types<I, S>(mut self, crops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.crop_types = crops.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_measurements(mut self, measurements: Vec<MeasurementRule>) -> Self {
        self.measurements = measurements;
        self
    }

    pub fn with_mapping_policy(mut self, policy: MappingPolicy) -> Self {
        self.mapping_policy = policy;
        self
    }

    pub fn with_expected_field_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_field_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Measurement columns in vocabulary order
    pub fn measurement_columns(&self) -> Vec<String> {
        self.measurements.iter().map(|m| m.column.clone()).collect()
    }

    /// Exact column set of the aggregated weather dataset
    pub fn expected_weather_columns(&self) -> Vec<String> {
        std::iter::once(columns::WEATHER_STATION_ID.to_string())
            .chain(self.measurement_columns())
            .collect()
    }

    /// Reject tables that would make the pipeline order-sensitive or non-idempotent
    pub fn validate(&self) -> Result<()> {
        let mut sources = HashSet::new();
        let mut targets = HashSet::new();
        for rename in &self.column_renames {
            if !sources.insert(rename.from.as_str()) {
                return Err(SurveyError::configuration(format!(
                    "column '{}' is renamed more than once",
                    rename.from
                )));
            }
            if !targets.insert(rename.to.as_str()) {
                return Err(SurveyError::configuration(format!(
                    "several columns are renamed to '{}'",
                    rename.to
                )));
            }
        }
        if !self.column_renames.is_empty() && sources == targets {
            return Err(SurveyError::configuration(
                "rename table only permutes existing names; canonical form cannot be detected",
            ));
        }

        let mut corrected = HashSet::new();
        for rule in &self.corrections {
            if !corrected.insert(rule.column.as_str()) {
                return Err(SurveyError::configuration(format!(
                    "column '{}' has more than one correction",
                    rule.column
                )));
            }
            rule.correction.validate(&rule.column)?;
        }

        if self.crop_types.is_empty() {
            return Err(SurveyError::configuration("crop enumeration is empty"));
        }

        if self.measurements.is_empty() {
            return Err(SurveyError::configuration("measurement vocabulary is empty"));
        }
        let mut measured = HashSet::new();
        for rule in &self.measurements {
            if rule.aliases.is_empty() {
                return Err(SurveyError::configuration(format!(
                    "measurement '{}' has no names to match",
                    rule.column
                )));
            }
            if !measured.insert(rule.column.as_str()) {
                return Err(SurveyError::configuration(format!(
                    "measurement '{}' is declared twice",
                    rule.column
                )));
            }
        }

        for required in [columns::FIELD_ID, columns::WEATHER_STATION_ID] {
            if !self.expected_field_columns.iter().any(|c| c == required) {
                return Err(SurveyError::configuration(format!(
                    "expected field columns must include '{}'",
                    required
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();

        assert_eq!(config.expected_field_columns.len(), 19);
        assert_eq!(
            config.expected_weather_columns(),
            vec![
                "Weather_station_ID",
                "Rainfall",
                "Min_temperature_C",
                "Max_temperature_C",
                "Ave_temps"
            ]
        );
        assert_eq!(config.crop_types.len(), 8);
    }

    #[test]
    fn test_pure_swap_rename_rejected() {
        let config = PipelineConfig::default().with_column_renames(vec![
            ColumnRename::new("a", "b"),
            ColumnRename::new("b", "a"),
        ]);
        assert!(matches!(
            config.validate(),
            Err(SurveyError::Configuration { .. })
        ));
    }

    #[test]
    fn test_duplicate_correction_rejected() {
        let config = PipelineConfig::default().with_corrections(vec![
            CorrectionRule::new("Elevation", Correction::Absolute),
            CorrectionRule::new("Elevation", Correction::Clip { min: 0.0, max: 1.0 }),
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_idempotent_replacement_rejected() {
        let mut replacements = BTreeMap::new();
        replacements.insert("teaa".to_string(), "tea".to_string());
        replacements.insert("tea".to_string(), "coffee".to_string());

        let config = PipelineConfig::default().with_corrections(vec![CorrectionRule::new(
            "Chosen_crop",
            Correction::Categorical {
                trim: false,
                lowercase: false,
                replacements,
            },
        )]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_vocabularies_rejected() {
        let no_crops = PipelineConfig::default().with_crop_types(Vec::<String>::new());
        assert!(no_crops.validate().is_err());

        let no_measurements = PipelineConfig::default().with_measurements(vec![]);
        assert!(no_measurements.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "mapping_policy": "exclude", "crop_types": ["maize"] }}"#).unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.mapping_policy, MappingPolicy::Exclude);
        assert_eq!(config.crop_types, vec!["maize"]);
        assert_eq!(config.measurements, PipelineConfig::default().measurements);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_config_file() {
        let result = PipelineConfig::from_json_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(SurveyError::SourceNotFound { .. })));
    }
}
