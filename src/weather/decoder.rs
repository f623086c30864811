//! Table-driven decoding of free-text station messages.
//!
//! Each `MeasurementRule` compiles to one anchor pattern: one of the rule's
//! names, optional `:`/`=` punctuation, an optional opening bracket or quote,
//! then the adjacent value token. The token must be a numeric literal
//! optionally followed by a unit. A comma followed by a digit stays inside
//! the token, so `12,5` is rejected rather than read as `12`. Rules are
//! evaluated independently, so a malformed value only nulls its own
//! measurement.

use crate::error::{Result, SurveyError};
use crate::models::WeatherRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Numeric literal with an optional trailing unit (`12.5`, `12.5mm`, `-3°C`)
static NUMERIC_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<number>[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?)[\p{L}°%/]*$")
        .expect("numeric literal pattern is valid")
});

/// Vocabulary entry: the output column and the names that announce it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRule {
    pub column: String,
    pub aliases: Vec<String>,
}

impl MeasurementRule {
    pub fn new<I, S>(column: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-insensitive, word-bounded anchor capturing the adjacent token.
    /// Whitespace inside a name also matches underscores.
    fn anchor_pattern(&self) -> String {
        let names: Vec<String> = self
            .aliases
            .iter()
            .map(|alias| {
                alias
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"[\s_]+")
            })
            .collect();

        format!(
            r#"(?i)\b(?:{})\b\s*[:=]?\s*[(\["']?(?P<value>(?:[^\s,;|\])]|,\d)*)"#,
            names.join("|")
        )
    }
}

/// A measurement whose name was found but whose value could not be read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeFailure {
    pub column: String,
    pub raw_value: String,
}

impl std::fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "could not read a number for {} from '{}'",
            self.column, self.raw_value
        )
    }
}

/// Decoded record plus the measurements that failed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOutcome {
    pub record: WeatherRecord,
    pub failures: Vec<DecodeFailure>,
}

/// Running totals over a batch of messages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodeStats {
    pub messages: usize,
    pub values_decoded: usize,
    pub failures: usize,
    pub messages_without_values: usize,
}

impl DecodeStats {
    pub fn record(&mut self, outcome: &DecodeOutcome) {
        self.messages += 1;
        self.values_decoded += outcome.record.len();
        self.failures += outcome.failures.len();
        if outcome.record.is_empty() {
            self.messages_without_values += 1;
        }
    }

    /// Share of recognised measurements that yielded a number, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.values_decoded + self.failures;
        if attempted == 0 {
            0.0
        } else {
            (self.values_decoded as f64 / attempted as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    column: String,
    anchor: Regex,
}

/// Decoder built from a measurement vocabulary
#[derive(Debug, Clone)]
pub struct MessageDecoder {
    rules: Vec<CompiledRule>,
}

impl MessageDecoder {
    pub fn new(vocabulary: &[MeasurementRule]) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(SurveyError::configuration("measurement vocabulary is empty"));
        }

        let rules = vocabulary
            .iter()
            .map(|rule| {
                let anchor = Regex::new(&rule.anchor_pattern())?;
                debug!("Compiled anchor for {}: {}", rule.column, anchor.as_str());
                Ok(CompiledRule {
                    column: rule.column.clone(),
                    anchor,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Output columns in vocabulary order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.column.as_str())
    }

    /// Decode a message; unreadable values are dropped to null
    pub fn decode(&self, message: &str) -> WeatherRecord {
        self.decode_detailed(message).record
    }

    /// Decode a message and report which recognised measurements failed
    pub fn decode_detailed(&self, message: &str) -> DecodeOutcome {
        let mut outcome = DecodeOutcome::default();

        for rule in &self.rules {
            let mut first_raw: Option<&str> = None;
            let mut value = None;

            // First occurrence that parses wins
            for captures in rule.anchor.captures_iter(message) {
                let raw = captures.name("value").map_or("", |m| m.as_str());
                first_raw.get_or_insert(raw);
                value = parse_value(raw);
                if value.is_some() {
                    break;
                }
            }

            match (value, first_raw) {
                (Some(value), _) => outcome.record.set(rule.column.clone(), value),
                (None, Some(raw)) => {
                    let failure = DecodeFailure {
                        column: rule.column.clone(),
                        raw_value: raw.to_string(),
                    };
                    debug!("Decode failure: {}", failure);
                    outcome.failures.push(failure);
                }
                (None, None) => {}
            }
        }

        outcome
    }
}

/// Read the numeric part of a value token such as `123.4`, `5mm` or `-2°C`
fn parse_value(token: &str) -> Option<f64> {
    let token = token.trim_end_matches(['.', '!', '"', '\'']);
    let captures = NUMERIC_VALUE.captures(token)?;
    captures
        .name("number")?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
