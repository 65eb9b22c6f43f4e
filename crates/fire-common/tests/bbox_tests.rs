//! Tests for BoundingBox parsing and containment.

use fire_common::bbox::{BboxParseError, BoundingBox, LatLng};
use serde_json::json;

fn conus() -> BoundingBox {
    BoundingBox::new(LatLng::new(50.0, -66.0), LatLng::new(24.0, -125.0)).unwrap()
}

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = conus();
    assert_eq!(bbox.ne.lat, 50.0);
    assert_eq!(bbox.sw.lng, -125.0);
}

#[test]
fn test_bbox_new_rejects_out_of_range() {
    assert_eq!(
        BoundingBox::new(LatLng::new(91.0, 0.0), LatLng::new(0.0, 0.0)),
        Err(BboxParseError::InvalidBoundary)
    );
    assert_eq!(
        BoundingBox::new(LatLng::new(10.0, 181.0), LatLng::new(0.0, 0.0)),
        Err(BboxParseError::InvalidBoundary)
    );
}

#[test]
fn test_bbox_new_rejects_inverted_corners() {
    // sw north of ne
    assert_eq!(
        BoundingBox::new(LatLng::new(10.0, 10.0), LatLng::new(20.0, 0.0)),
        Err(BboxParseError::InvalidBoundary)
    );
    // sw east of ne
    assert_eq!(
        BoundingBox::new(LatLng::new(10.0, 10.0), LatLng::new(0.0, 20.0)),
        Err(BboxParseError::InvalidBoundary)
    );
}

#[test]
fn test_bbox_degenerate_is_allowed() {
    let point = LatLng::new(45.0, -120.0);
    let bbox = BoundingBox::new(point, point).unwrap();
    assert!(bbox.contains_point(45.0, -120.0));
}

// ============================================================================
// from_json tests
// ============================================================================

#[test]
fn test_from_json_missing_corner() {
    let err = BoundingBox::from_json(&json!({"ne": {"lat": 1, "lng": 1}})).unwrap_err();
    assert_eq!(err, BboxParseError::InvalidFields);
}

#[test]
fn test_from_json_extra_corner_key() {
    let err = BoundingBox::from_json(&json!({
        "ne": {"lat": 88.12, "lng": 40, "foo": 1},
        "sw": {"lat": -50.75, "lng": -131.5}
    }))
    .unwrap_err();
    assert_eq!(err, BboxParseError::InvalidFields);
}

#[test]
fn test_from_json_non_numeric() {
    let err = BoundingBox::from_json(&json!({
        "ne": {"lat": "north", "lng": 40},
        "sw": {"lat": -50.75, "lng": -131.5}
    }))
    .unwrap_err();
    assert_eq!(err, BboxParseError::InvalidFields);
}

#[test]
fn test_from_json_out_of_range() {
    let err = BoundingBox::from_json(&json!({
        "ne": {"lat": 98.12, "lng": 40},
        "sw": {"lat": -50.75, "lng": -131.5}
    }))
    .unwrap_err();
    assert_eq!(err, BboxParseError::InvalidBoundary);
}

// ============================================================================
// Containment tests
// ============================================================================

#[test]
fn test_contains_point_edges_inclusive() {
    let bbox = conus();
    assert!(bbox.contains_point(24.0, -125.0));
    assert!(bbox.contains_point(50.0, -66.0));
    assert!(bbox.contains_point(37.9, -119.76));
    assert!(!bbox.contains_point(23.99, -100.0));
    assert!(!bbox.contains_point(40.0, -65.0));
}
