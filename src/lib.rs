//! Agricultural survey processor
//!
//! Cleans a raw field survey and free-text weather-station telemetry into two
//! analysis-ready tables and checks them against structural and domain rules.
//!
//! This library provides tools for:
//! - Renaming and correcting field columns from declarative tables
//! - Decoding station messages with a table-driven regex vocabulary
//! - Aggregating decoded measurements into per-station means
//! - Joining fields to their nearest station and imputing missing weather
//! - Validating the cleaned datasets and reporting each rule's outcome
//! - Writing the results as Parquet

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod source;
pub mod transform;
pub mod validation;
pub mod weather;
pub mod writer;

// Re-export commonly used types
pub use config::{ColumnRename, MappingPolicy, PipelineConfig};
pub use error::{Result, SurveyError};
pub use models::{FieldId, ProcessingStats, StationId, StationMapping, WeatherMessage, WeatherRecord};
pub use pipeline::{Pipeline, PipelineOutput};
pub use source::{CsvSource, InMemorySource, SourceReader};
pub use transform::{CleanedFieldDataset, Correction, CorrectionRule, FieldTransformer};
pub use validation::{RuleId, RuleResult, ValidationReport, Validator};
pub use weather::{AggregateTable, MeasurementRule, MessageDecoder, WeatherAggregator};
