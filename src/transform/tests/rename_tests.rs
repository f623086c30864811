use super::{f64_values, names, raw_field_frame, str_values};
use crate::config::{ColumnRename, PipelineConfig};
use crate::constants::{CANONICAL_FIELD_COLUMNS, RAW_FIELD_COLUMNS};
use crate::error::SurveyError;
use crate::transform::rename_columns;

#[test]
fn test_default_renames_swap_crop_and_yield() {
    let renames = PipelineConfig::default().column_renames;
    let renamed = rename_columns(&raw_field_frame(), &renames).unwrap();

    let columns = names(&renamed);
    assert_eq!(columns[15], "Chosen_crop");
    assert_eq!(columns[16], "Annual_yield");
    assert!(!columns.contains(&"Crop_type".to_string()));

    assert_eq!(
        str_values(&renamed, "Chosen_crop")[0].as_deref(),
        Some("cassaval")
    );
    assert_eq!(f64_values(&renamed, "Annual_yield")[0], Some(0.75));
}

#[test]
fn test_raw_layout_maps_to_canonical_layout() {
    let raw = raw_field_frame();
    assert_eq!(names(&raw), RAW_FIELD_COLUMNS);

    let renamed = rename_columns(&raw, &PipelineConfig::default().column_renames).unwrap();
    assert_eq!(names(&renamed), CANONICAL_FIELD_COLUMNS);
}

#[test]
fn test_canonical_frame_is_left_alone() {
    let renames = PipelineConfig::default().column_renames;
    let once = rename_columns(&raw_field_frame(), &renames).unwrap();
    let twice = rename_columns(&once, &renames).unwrap();

    assert!(once.equals_missing(&twice));
}

#[test]
fn test_missing_source_column() {
    let frame = raw_field_frame().drop("Crop_type").unwrap();
    let renames = PipelineConfig::default().column_renames;

    let result = rename_columns(&frame, &renames);
    assert!(matches!(result, Err(SurveyError::Schema { .. })));
}

#[test]
fn test_rename_onto_existing_column_rejected() {
    let renames = vec![
        ColumnRename::new("Slope", "Elevation"),
        ColumnRename::new("Location", "Place"),
    ];

    let result = rename_columns(&raw_field_frame(), &renames);
    assert!(matches!(result, Err(SurveyError::Schema { .. })));
}

#[test]
fn test_empty_rename_table() {
    let frame = raw_field_frame();
    let renamed = rename_columns(&frame, &[]).unwrap();
    assert!(renamed.equals_missing(&frame));
}
