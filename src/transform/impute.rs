//! Filling missing field measurements from station means.

use super::rename::column_names;
use crate::constants::{columns, ROW_ORDER_COLUMN, STATION_MEAN_SUFFIX};
use crate::error::{Result, SurveyError};
use crate::weather::AggregateTable;
use polars::prelude::*;
use tracing::debug;

fn null_total(frame: &DataFrame, targets: &[&String]) -> Result<usize> {
    let mut total = 0;
    for target in targets {
        total += frame.column(target.as_str())?.null_count();
    }
    Ok(total)
}

/// Measurement columns must be numeric. A column with no values at all is
/// read back as text or null-typed, so it is widened to `Float64`.
fn numeric_targets(frame: &DataFrame, targets: &[&String]) -> Result<DataFrame> {
    let mut frame = frame.clone();
    for target in targets {
        let column = frame.column(target.as_str())?;
        let dtype = column.dtype();
        if dtype.is_float() || dtype.is_integer() {
            continue;
        }
        if column.null_count() != column.len() {
            return Err(SurveyError::schema(
                "imputation",
                format!("measurement column {target} has non-numeric type {dtype}"),
            ));
        }
        let widened = column.cast(&DataType::Float64)?;
        frame.with_column(widened)?;
    }
    Ok(frame)
}

/// Replace nulls in measurement columns with the mean at the field's
/// station. Non-null values are never touched, and a null stays null when
/// the station has no mean for it. Returns the frame and the number of
/// values filled.
pub fn impute_from_stations(
    frame: &DataFrame,
    aggregates: &AggregateTable,
) -> Result<(DataFrame, usize)> {
    if frame.column(columns::WEATHER_STATION_ID).is_err() {
        return Err(SurveyError::missing_column(
            "imputation",
            columns::WEATHER_STATION_ID,
        ));
    }

    let names = column_names(frame);
    let targets: Vec<&String> = aggregates
        .measurement_columns()
        .iter()
        .filter(|m| names.contains(m))
        .collect();

    if targets.is_empty() {
        debug!("No measurement columns shared with the weather data");
        return Ok((frame.clone(), 0));
    }

    let frame = &numeric_targets(frame, &targets)?;
    let nulls_before = null_total(frame, &targets)?;
    if nulls_before == 0 {
        return Ok((frame.clone(), 0));
    }

    let mut mean_columns = vec![col(columns::WEATHER_STATION_ID)];
    mean_columns.extend(
        targets
            .iter()
            .map(|t| col(t.as_str()).alias(format!("{t}{STATION_MEAN_SUFFIX}"))),
    );
    let means = aggregates.frame().clone().lazy().select(mean_columns);

    let fills: Vec<Expr> = targets
        .iter()
        .map(|t| {
            col(t.as_str())
                .fill_null(col(format!("{t}{STATION_MEAN_SUFFIX}")))
                .alias(t.as_str())
        })
        .collect();

    let output: Vec<Expr> = names.iter().map(|name| col(name.as_str())).collect();

    let imputed = frame
        .clone()
        .lazy()
        .with_row_index(ROW_ORDER_COLUMN, None)
        .join(
            means,
            [col(columns::WEATHER_STATION_ID)],
            [col(columns::WEATHER_STATION_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns(fills)
        .sort_by_exprs([col(ROW_ORDER_COLUMN)], SortMultipleOptions::default())
        .select(output)
        .collect()?;

    let filled = nulls_before - null_total(&imputed, &targets)?;
    debug!(
        "Imputed {} of {} missing measurement values",
        filled, nulls_before
    );

    Ok((imputed, filled))
}
