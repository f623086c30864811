//! Attaching weather stations to fields through the proximity mapping.

use super::rename::column_names;
use crate::config::MappingPolicy;
use crate::constants::{columns, ROW_ORDER_COLUMN};
use crate::error::{Result, SurveyError};
use crate::models::{FieldId, StationId, StationMapping};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Field frame with `Weather_station_ID` attached
#[derive(Debug, Clone)]
pub struct StationJoin {
    pub frame: DataFrame,
    /// Fields dropped under `MappingPolicy::Exclude`
    pub excluded_field_ids: Vec<FieldId>,
}

/// Collapse the mapping to a function of Field_ID. A field listed more than
/// once is an error, even when every listing names the same station.
pub fn resolve_mapping(mapping: &[StationMapping]) -> Result<BTreeMap<FieldId, StationId>> {
    let mut resolved = BTreeMap::new();
    let mut duplicated = BTreeSet::new();

    for entry in mapping {
        if resolved
            .insert(entry.field_id, entry.weather_station_id)
            .is_some()
        {
            duplicated.insert(entry.field_id);
        }
    }

    if !duplicated.is_empty() {
        return Err(SurveyError::mapping(
            "fields appear more than once in the proximity mapping",
            duplicated.into_iter().collect(),
        ));
    }

    Ok(resolved)
}

fn mapping_frame(resolved: &BTreeMap<FieldId, StationId>) -> Result<DataFrame> {
    let field_ids: Vec<FieldId> = resolved.keys().copied().collect();
    let station_ids: Vec<StationId> = resolved.values().copied().collect();

    Ok(DataFrame::new(vec![
        Series::new(columns::FIELD_ID.into(), field_ids).into(),
        Series::new(columns::WEATHER_STATION_ID.into(), station_ids).into(),
    ])?)
}

/// Left-join the mapping onto the fields, keeping input row order.
///
/// An existing `Weather_station_ID` column is replaced, so joining cleaned
/// output again gives the same frame.
pub fn join_stations(
    frame: &DataFrame,
    mapping: &[StationMapping],
    policy: MappingPolicy,
) -> Result<StationJoin> {
    if frame.column(columns::FIELD_ID).is_err() {
        return Err(SurveyError::missing_column("station join", columns::FIELD_ID));
    }

    let resolved = resolve_mapping(mapping)?;
    let stations = mapping_frame(&resolved)?;

    let base = if frame.column(columns::WEATHER_STATION_ID).is_ok() {
        debug!("Replacing existing {} column", columns::WEATHER_STATION_ID);
        frame.drop(columns::WEATHER_STATION_ID)?
    } else {
        frame.clone()
    };

    let mut output: Vec<Expr> = column_names(&base)
        .iter()
        .map(|name| col(name.as_str()))
        .collect();
    output.push(col(columns::WEATHER_STATION_ID));

    let joined = base
        .lazy()
        .with_column(col(columns::FIELD_ID).cast(DataType::Int64))
        .with_row_index(ROW_ORDER_COLUMN, None)
        .join(
            stations.lazy(),
            [col(columns::FIELD_ID)],
            [col(columns::FIELD_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .sort_by_exprs([col(ROW_ORDER_COLUMN)], SortMultipleOptions::default())
        .select(output)
        .collect()?;

    let unmatched = unmatched_fields(&joined)?;
    if unmatched.is_empty() {
        return Ok(StationJoin {
            frame: joined,
            excluded_field_ids: Vec::new(),
        });
    }

    match policy {
        MappingPolicy::Fail => Err(SurveyError::mapping(
            "fields have no weather station in the proximity mapping",
            unmatched,
        )),
        MappingPolicy::Exclude => {
            warn!(
                "Excluding {} fields without a weather station: {:?}",
                unmatched.len(),
                unmatched
            );
            let kept = joined
                .lazy()
                .filter(col(columns::WEATHER_STATION_ID).is_not_null())
                .collect()?;
            Ok(StationJoin {
                frame: kept,
                excluded_field_ids: unmatched,
            })
        }
    }
}

fn unmatched_fields(joined: &DataFrame) -> Result<Vec<FieldId>> {
    let field_ids = joined
        .column(columns::FIELD_ID)?
        .as_materialized_series()
        .i64()?;
    let station_ids = joined
        .column(columns::WEATHER_STATION_ID)?
        .as_materialized_series()
        .i64()?;

    Ok(field_ids
        .into_iter()
        .zip(station_ids.into_iter())
        .filter_map(|(field, station)| match (field, station) {
            (Some(field), None) => Some(field),
            _ => None,
        })
        .collect())
}
