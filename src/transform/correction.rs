//! Declarative, row-local value corrections.
//!
//! A correction table pairs a column with one `Correction`. Each correction
//! becomes a single polars expression over its own column, so the table can
//! be evaluated in any order and every entry can be tested on its own.

use crate::error::{Result, SurveyError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A pure, idempotent value fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    /// Sign errors: keep the magnitude
    Absolute,

    /// Bound values to `[min, max]`
    Clip { min: f64, max: f64 },

    /// Normalise text labels and fix known misspellings.
    /// Replacement keys are matched after trimming/lowercasing.
    Categorical {
        #[serde(default)]
        trim: bool,
        #[serde(default)]
        lowercase: bool,
        #[serde(default)]
        replacements: BTreeMap<String, String>,
    },
}

impl Correction {
    /// Expression producing the corrected column under its own name
    pub fn expr(&self, column: &str) -> Expr {
        let corrected = match self {
            Correction::Absolute => col(column).abs(),
            Correction::Clip { min, max } => when(col(column).lt(lit(*min)))
                .then(lit(*min))
                .when(col(column).gt(lit(*max)))
                .then(lit(*max))
                .otherwise(col(column)),
            Correction::Categorical {
                trim,
                lowercase,
                replacements,
            } => {
                let mut normalised = col(column);
                if *trim {
                    normalised = normalised.str().strip_chars(lit(NULL));
                }
                if *lowercase {
                    normalised = normalised.str().to_lowercase();
                }
                replacements
                    .iter()
                    .fold(normalised.clone(), |acc, (wrong, right)| {
                        when(normalised.clone().eq(lit(wrong.as_str())))
                            .then(lit(right.as_str()))
                            .otherwise(acc)
                    })
            }
        };
        corrected.alias(column)
    }

    /// Corrections must be fixed points of themselves
    pub fn validate(&self, column: &str) -> Result<()> {
        match self {
            Correction::Absolute => Ok(()),
            Correction::Clip { min, max } => {
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(SurveyError::configuration(format!(
                        "clip bounds for '{}' must be finite with min <= max (got {}..{})",
                        column, min, max
                    )));
                }
                Ok(())
            }
            Correction::Categorical {
                trim,
                lowercase,
                replacements,
            } => {
                let normalise = |value: &str| {
                    let value = if *trim { value.trim() } else { value };
                    if *lowercase {
                        value.to_lowercase()
                    } else {
                        value.to_string()
                    }
                };

                for (wrong, right) in replacements {
                    if normalise(wrong) != *wrong {
                        return Err(SurveyError::configuration(format!(
                            "replacement key '{}' for '{}' can never match normalised values",
                            wrong, column
                        )));
                    }
                    if normalise(right) != *right || replacements.contains_key(right) {
                        return Err(SurveyError::configuration(format!(
                            "replacement '{}' -> '{}' for '{}' would change on a second pass",
                            wrong, right, column
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

/// One entry of the correction table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRule {
    pub column: String,
    pub correction: Correction,
}

impl CorrectionRule {
    pub fn new(column: impl Into<String>, correction: Correction) -> Self {
        Self {
            column: column.into(),
            correction,
        }
    }
}

/// Apply every rule to its column in a single projection
pub fn apply_corrections(frame: &DataFrame, rules: &[CorrectionRule]) -> Result<DataFrame> {
    for rule in rules {
        if frame.column(&rule.column).is_err() {
            return Err(SurveyError::missing_column("correction", &rule.column));
        }
    }

    if rules.is_empty() {
        return Ok(frame.clone());
    }

    let exprs: Vec<Expr> = rules
        .iter()
        .map(|rule| {
            debug!("Correcting {} with {:?}", rule.column, rule.correction);
            rule.correction.expr(&rule.column)
        })
        .collect();

    let corrected = frame.clone().lazy().with_columns(exprs).collect()?;
    Ok(corrected)
}
