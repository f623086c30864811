//! End-to-end survey processing.
//!
//! Reads the three inputs from a `SourceReader`, aggregates the weather
//! messages, cleans the field table against those aggregates and validates
//! both results. Each stage materialises its frame before the next starts.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::ProcessingStats;
use crate::source::SourceReader;
use crate::transform::{CleanedFieldDataset, FieldTransformer};
use crate::validation::{ValidationReport, Validator};
use crate::weather::{AggregateTable, WeatherAggregator};
use std::time::Instant;
use tracing::info;

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub fields: CleanedFieldDataset,
    pub weather: AggregateTable,
    pub report: ValidationReport,
    pub stats: ProcessingStats,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    transformer: FieldTransformer,
    aggregator: WeatherAggregator,
    validator: Validator,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let aggregator = WeatherAggregator::from_config(&config)?;
        let validator = Validator::new(&config);
        let transformer = FieldTransformer::new(config)?;
        Ok(Self {
            transformer,
            aggregator,
            validator,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        self.transformer.config()
    }

    pub fn run(&self, source: &dyn SourceReader) -> Result<PipelineOutput> {
        let start = Instant::now();

        let raw_fields = source.field_records()?;
        let messages = source.weather_messages()?;
        let mapping = source.station_mapping()?;
        info!(
            "Loaded {} field rows, {} weather messages, {} mapping entries",
            raw_fields.height(),
            messages.len(),
            mapping.len()
        );

        let weather = self.aggregator.aggregate(&messages)?;
        let fields = self.transformer.process(&raw_fields, &mapping, &weather)?;
        let report = self.validator.validate(fields.frame(), weather.frame());

        let decode = weather.stats();
        let stats = ProcessingStats {
            field_rows_in: fields.stats().rows_in,
            field_rows_out: fields.stats().rows_out,
            excluded_fields: fields.excluded_field_ids().len(),
            values_imputed: fields.stats().values_imputed,
            messages_decoded: decode.messages,
            measurements_decoded: decode.values_decoded,
            decode_failures: decode.failures,
            stations_aggregated: weather.station_count(),
            processing_time_ms: start.elapsed().as_millis(),
        };

        info!(
            "Pipeline finished in {} ms: {} of {} rules passed",
            stats.processing_time_ms,
            report.results.len() - report.failures().len(),
            report.results.len()
        );

        Ok(PipelineOutput {
            fields,
            weather,
            report,
            stats,
        })
    }
}
