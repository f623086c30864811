//! Field dataset transformation
//!
//! Turns the raw field survey into the cleaned field dataset in four fixed
//! steps: rename, correct, join weather stations, impute from station means.
//! Each step is a pure function of its input frame and the configuration,
//! and running the whole transformer on its own output changes nothing.

pub mod correction;
pub mod impute;
pub mod rename;
pub mod stations;

#[cfg(test)]
pub mod tests;

pub use correction::{apply_corrections, Correction, CorrectionRule};
pub use impute::impute_from_stations;
pub use rename::rename_columns;
pub use stations::{join_stations, resolve_mapping, StationJoin};

use crate::config::PipelineConfig;
use crate::constants::columns;
use crate::error::{Result, SurveyError};
use crate::models::{FieldId, StationMapping};
use crate::weather::AggregateTable;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// Counters from one transformation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub rows_in: usize,
    pub rows_out: usize,
    pub corrections_applied: usize,
    pub values_imputed: usize,
}

/// Output of [`FieldTransformer::process`]
#[derive(Debug, Clone)]
pub struct CleanedFieldDataset {
    frame: DataFrame,
    excluded_field_ids: Vec<FieldId>,
    stats: TransformStats,
}

impl CleanedFieldDataset {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Fields dropped because no station was mapped to them
    pub fn excluded_field_ids(&self) -> &[FieldId] {
        &self.excluded_field_ids
    }

    pub fn stats(&self) -> &TransformStats {
        &self.stats
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Applies the configured field cleaning steps
#[derive(Debug, Clone)]
pub struct FieldTransformer {
    config: PipelineConfig,
}

impl FieldTransformer {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn rename(&self, frame: &DataFrame) -> Result<DataFrame> {
        rename_columns(frame, &self.config.column_renames)
    }

    pub fn correct(&self, frame: &DataFrame) -> Result<DataFrame> {
        apply_corrections(frame, &self.config.corrections)
    }

    pub fn attach_stations(
        &self,
        frame: &DataFrame,
        mapping: &[StationMapping],
    ) -> Result<StationJoin> {
        join_stations(frame, mapping, self.config.mapping_policy)
    }

    pub fn impute(
        &self,
        frame: &DataFrame,
        aggregates: &AggregateTable,
    ) -> Result<(DataFrame, usize)> {
        impute_from_stations(frame, aggregates)
    }

    /// Run rename, correct, join and impute in that order
    pub fn process(
        &self,
        raw_fields: &DataFrame,
        mapping: &[StationMapping],
        aggregates: &AggregateTable,
    ) -> Result<CleanedFieldDataset> {
        let rows_in = raw_fields.height();
        info!("Transforming {} field rows", rows_in);

        let renamed = self.rename(raw_fields)?;
        check_field_ids(&renamed)?;

        check_row_count("rename", rows_in, &renamed)?;
        let corrected = self.correct(&renamed)?;
        check_row_count("correction", rows_in, &corrected)?;

        let joined = self.attach_stations(&corrected, mapping)?;
        let (frame, values_imputed) = self.impute(&joined.frame, aggregates)?;

        let stats = TransformStats {
            rows_in,
            rows_out: frame.height(),
            corrections_applied: self.config.corrections.len(),
            values_imputed,
        };

        info!(
            "Cleaned field dataset: {} rows, {} excluded, {} values imputed",
            stats.rows_out,
            joined.excluded_field_ids.len(),
            stats.values_imputed
        );

        Ok(CleanedFieldDataset {
            frame,
            excluded_field_ids: joined.excluded_field_ids,
            stats,
        })
    }
}

/// Rename and correction work column-wise and must keep every row
fn check_row_count(stage: &str, rows_in: usize, frame: &DataFrame) -> Result<()> {
    if frame.height() != rows_in {
        return Err(SurveyError::schema(
            stage,
            format!("expected {} rows, found {}", rows_in, frame.height()),
        ));
    }
    Ok(())
}

/// Field_ID must be present, non-null and unique before stations are joined
fn check_field_ids(frame: &DataFrame) -> Result<()> {
    let ids = frame
        .column(columns::FIELD_ID)
        .map_err(|_| SurveyError::missing_column("transform", columns::FIELD_ID))?
        .cast(&DataType::Int64)?;
    let ids = ids.as_materialized_series().i64()?;

    if ids.null_count() > 0 {
        return Err(SurveyError::schema(
            "transform",
            format!("{} rows have a null Field_ID", ids.null_count()),
        ));
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<FieldId> = ids
        .into_iter()
        .flatten()
        .filter(|id| !seen.insert(*id))
        .collect();

    if !duplicates.is_empty() {
        duplicates.sort_unstable();
        duplicates.dedup();
        return Err(SurveyError::schema(
            "transform",
            format!("duplicate Field_IDs: {:?}", duplicates),
        ));
    }

    Ok(())
}
