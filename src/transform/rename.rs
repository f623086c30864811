//! Column renaming from source names to canonical names.

use crate::config::ColumnRename;
use crate::error::{Result, SurveyError};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

pub(crate) fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Apply the rename table in one step so that swaps are safe.
///
/// A frame that already carries every target name is taken to be canonical
/// and returned unchanged; this keeps re-runs on cleaned data idempotent.
pub fn rename_columns(frame: &DataFrame, renames: &[ColumnRename]) -> Result<DataFrame> {
    let names = column_names(frame);
    let present: HashSet<&str> = names.iter().map(String::as_str).collect();

    if renames.iter().all(|r| present.contains(r.to.as_str())) {
        debug!("Columns already canonical, skipping {} renames", renames.len());
        return Ok(frame.clone());
    }

    for rename in renames {
        if !present.contains(rename.from.as_str()) {
            return Err(SurveyError::missing_column("rename", &rename.from));
        }
    }

    let lookup: HashMap<&str, &str> = renames
        .iter()
        .map(|r| (r.from.as_str(), r.to.as_str()))
        .collect();

    let new_names: Vec<String> = names
        .iter()
        .map(|name| {
            lookup
                .get(name.as_str())
                .map_or_else(|| name.clone(), |target| target.to_string())
        })
        .collect();

    let mut seen = HashSet::new();
    for name in &new_names {
        if !seen.insert(name.as_str()) {
            return Err(SurveyError::schema(
                "rename",
                format!("renaming produces duplicate column '{}'", name),
            ));
        }
    }

    let mut renamed = frame.clone();
    renamed.set_column_names(new_names)?;

    for rename in renames {
        info!("Renamed column {} -> {}", rename.from, rename.to);
    }

    Ok(renamed)
}
