use super::{i64_values, names, raw_field_frame, station_mapping};
use crate::config::MappingPolicy;
use crate::error::SurveyError;
use crate::models::StationMapping;
use crate::transform::{join_stations, resolve_mapping};

#[test]
fn test_join_keeps_row_order_and_station_zero() {
    let joined = join_stations(&raw_field_frame(), &station_mapping(), MappingPolicy::Fail).unwrap();

    assert_eq!(joined.frame.height(), 3);
    assert_eq!(
        i64_values(&joined.frame, "Field_ID"),
        vec![Some(40734), Some(30629), Some(39924)]
    );
    assert_eq!(
        i64_values(&joined.frame, "Weather_station_ID"),
        vec![Some(0), Some(1), Some(0)]
    );
    assert_eq!(names(&joined.frame).last().unwrap(), "Weather_station_ID");
    assert!(joined.excluded_field_ids.is_empty());
}

#[test]
fn test_unmapped_field_fails_by_default() {
    let mapping = vec![StationMapping::new(40734, 0), StationMapping::new(39924, 0)];
    let result = join_stations(&raw_field_frame(), &mapping, MappingPolicy::Fail);

    match result {
        Err(SurveyError::Mapping { field_ids, .. }) => assert_eq!(field_ids, vec![30629]),
        other => panic!("expected mapping error, got {other:?}"),
    }
}

#[test]
fn test_unmapped_field_excluded_when_configured() {
    let mapping = vec![StationMapping::new(40734, 0), StationMapping::new(39924, 0)];
    let joined = join_stations(&raw_field_frame(), &mapping, MappingPolicy::Exclude).unwrap();

    assert_eq!(joined.frame.height(), 2);
    assert_eq!(joined.excluded_field_ids, vec![30629]);
    assert_eq!(
        i64_values(&joined.frame, "Field_ID"),
        vec![Some(40734), Some(39924)]
    );
}

#[test]
fn test_duplicate_mapping_entries_rejected() {
    let mapping = vec![
        StationMapping::new(40734, 0),
        StationMapping::new(40734, 0),
        StationMapping::new(30629, 1),
        StationMapping::new(30629, 2),
        StationMapping::new(39924, 0),
    ];

    match resolve_mapping(&mapping) {
        Err(SurveyError::Mapping { field_ids, .. }) => assert_eq!(field_ids, vec![30629, 40734]),
        other => panic!("expected mapping error, got {other:?}"),
    }
}

#[test]
fn test_resolved_mapping_is_keyed_by_field() {
    let resolved = resolve_mapping(&station_mapping()).unwrap();
    assert_eq!(resolved.len(), 3);
    assert_eq!(resolved.get(&30629), Some(&1));
    assert_eq!(resolved.get(&40734), Some(&0));
}

#[test]
fn test_rejoin_replaces_station_column() {
    let first = join_stations(&raw_field_frame(), &station_mapping(), MappingPolicy::Fail).unwrap();
    let again = join_stations(&first.frame, &station_mapping(), MappingPolicy::Fail).unwrap();

    assert!(first.frame.equals_missing(&again.frame));
    assert_eq!(first.frame.width(), raw_field_frame().width() + 1);
}

#[test]
fn test_mapping_without_matching_fields_is_ignored() {
    let mut mapping = station_mapping();
    mapping.push(StationMapping::new(99999, 7));

    let joined = join_stations(&raw_field_frame(), &mapping, MappingPolicy::Fail).unwrap();
    assert_eq!(joined.frame.height(), 3);
}
