//! Filter stage tests, driven through the manager's `filter` configuration.

use fire_common::{Fire, FireError, FilterIssue};
use fires_manager::FiresManager;
use serde_json::{json, Value};
use test_utils::fire_from_json;

fn fires(values: Vec<Value>) -> Vec<Fire> {
    values.into_iter().map(fire_from_json).collect()
}

fn ids(fm: &FiresManager) -> Vec<&str> {
    fm.fires().iter().map(Fire::id).collect()
}

fn set_skip(fm: &mut FiresManager, skip: bool) {
    fm.set_config_value(json!(skip), &["filter", "skip_failures"])
        .unwrap();
}

/// With the current config, filtering must fail with `message` when not
/// skipping and leave the fires untouched either way.
fn assert_config_failure(fm: &mut FiresManager, initial: &[Fire], message: &str) {
    set_skip(fm, false);
    let err = fm.filter_fires().unwrap_err();
    assert_eq!(err.to_string(), message);
    assert_eq!(fm.fires(), initial);

    set_skip(fm, true);
    fm.filter_fires().unwrap();
    assert_eq!(fm.fires(), initial);
}

/// A single bad fire must fail with `issue` when not skipping, and survive
/// unfiltered when skipping.
fn assert_data_failure(fm: &mut FiresManager, fire: Fire, issue: FilterIssue) {
    fm.set_fires(vec![fire.clone()]);

    set_skip(fm, false);
    let err = fm.filter_fires().unwrap_err();
    assert!(
        matches!(&err, FireError::FilterData { reason, .. } if *reason == issue),
        "unexpected error {}",
        err
    );
    assert!(err.to_string().find(&issue.to_string()).unwrap() > 0);
    assert_eq!(fm.fires(), &[fire.clone()]);

    set_skip(fm, true);
    fm.filter_fires().unwrap();
    assert_eq!(fm.fires(), &[fire]);
    assert!(fm.failed_fires().is_none());
}

// ============================================================================
// No criteria
// ============================================================================

#[test]
fn test_no_filters_specified() {
    let mut fm = FiresManager::new().unwrap();
    let initial = fires(vec![json!({"id": "1", "name": "n1", "dfd": "a1", "baz": "baz1"})]);
    fm.set_fires(initial.clone());
    assert_config_failure(&mut fm, &initial, "No filters specified");
}

// ============================================================================
// Country
// ============================================================================

fn country_fire(id: &str, countries: &[&str]) -> Value {
    let growth: Vec<Value> = countries
        .iter()
        .map(|c| json!({"location": {"country": c}}))
        .collect();
    json!({"id": id, "name": format!("n{}", id), "growth": growth})
}

#[test]
fn test_filter_by_country() {
    let mut fm = FiresManager::new().unwrap();
    let mut initial = fires(vec![
        json!({"id": "01", "name": "n01", "dfd": "a1"}),
        json!({"id": "02", "name": "n02", "bar": "a1"}),
    ]);
    initial.extend(fires(vec![
        country_fire("03", &["ZZ", "ZZ"]),
        country_fire("04", &["UK"]),
        country_fire("05", &["USA"]),
        country_fire("06", &[""]),
        country_fire("07", &["CA"]),
        country_fire("08", &["CA"]),
        country_fire("09", &["Unknown"]),
        country_fire("10", &["USA"]),
        country_fire("11", &["BZ"]),
        country_fire("12", &["ZZ", "UK"]),
        country_fire("13", &["ZZ", "ZZ"]),
    ]));
    fm.set_fires(initial.clone());
    assert_eq!(fm.num_fires(), 13);

    // empty config
    fm.set_config_value(json!({}), &["filter", "country"]).unwrap();
    assert_config_failure(&mut fm, &initial, "Specify config for each filter");

    // neither list
    fm.set_config_value(json!({"foo": "bar"}), &["filter", "country"])
        .unwrap();
    assert_config_failure(&mut fm, &initial, "Specify whitelist or blacklist - not both");

    // both lists
    fm.set_config_value(json!(["ZZ"]), &["filter", "country", "blacklist"])
        .unwrap();
    fm.set_config_value(json!(["YY"]), &["filter", "country", "whitelist"])
        .unwrap();
    assert_config_failure(&mut fm, &initial, "Specify whitelist or blacklist - not both");

    let run = |fm: &mut FiresManager, whitelist: Value, blacklist: Value| {
        set_skip(fm, false);
        fm.set_config_value(whitelist, &["filter", "country", "whitelist"])
            .unwrap();
        fm.set_config_value(blacklist, &["filter", "country", "blacklist"])
            .unwrap();
        fm.filter_fires().unwrap();
    };

    run(&mut fm, Value::Null, json!(["ZZ"]));
    assert_eq!(
        ids(&fm),
        vec!["04", "05", "06", "07", "08", "09", "10", "11", "12"]
    );
    assert_eq!(fm.fires()[8], fire_from_json(country_fire("12", &["UK"])));

    run(&mut fm, json!(["USA", "CA", "UK", "BZ"]), Value::Null);
    assert_eq!(ids(&fm), vec!["04", "05", "07", "08", "10", "11", "12"]);

    run(&mut fm, Value::Null, json!(["USA"]));
    assert_eq!(ids(&fm), vec!["04", "07", "08", "11", "12"]);

    run(&mut fm, json!(["USA", "CA", "UK"]), Value::Null);
    assert_eq!(ids(&fm), vec!["04", "07", "08", "12"]);

    run(&mut fm, Value::Null, json!(["USA", "CA"]));
    assert_eq!(
        fm.fires(),
        fires(vec![country_fire("04", &["UK"]), country_fire("12", &["UK"])]).as_slice()
    );

    run(&mut fm, Value::Null, json!(["UK", "CA"]));
    assert_eq!(fm.num_fires(), 0);

    // again, with nothing left
    fm.filter_fires().unwrap();
    assert_eq!(fm.num_fires(), 0);
}

#[test]
fn test_empty_country_list_counts_as_absent() {
    let mut fm = FiresManager::new().unwrap();
    fm.set_fires(fires(vec![country_fire("1", &["USA"]), country_fire("2", &["CA"])]));
    fm.set_config_value(
        json!({"whitelist": [], "blacklist": ["CA"]}),
        &["filter", "country"],
    )
    .unwrap();
    fm.filter_fires().unwrap();
    assert_eq!(ids(&fm), vec!["1"]);
}

// ============================================================================
// Location
// ============================================================================

fn point_fire(id: &str, points: &[(f64, f64)]) -> Value {
    let growth: Vec<Value> = points
        .iter()
        .map(|(lat, lng)| json!({"location": {"latitude": lat, "longitude": lng}}))
        .collect();
    json!({"id": id, "growth": growth})
}

fn boundary(ne: (f64, f64), sw: (f64, f64)) -> Value {
    json!({"ne": {"lat": ne.0, "lng": ne.1}, "sw": {"lat": sw.0, "lng": sw.1}})
}

#[test]
fn test_filter_by_location() {
    let mut fm = FiresManager::new().unwrap();
    let initial = fires(vec![
        point_fire("1", &[(40.0, -80.0)]),
        point_fire("2", &[(50.0, -80.0)]),
        point_fire("3", &[(60.0, -62.0)]),
        point_fire("4", &[(70.0, -60.0)]),
        point_fire("5", &[(40.0, -60.0)]),
        point_fire("6", &[(61.0, -60.0)]),
        point_fire("7", &[(60.0, -50.0)]),
        point_fire("8", &[(70.0, -120.0)]),
        point_fire("9", &[(-10.0, 10.0)]),
        point_fire("10", &[(-10.0, 10.0), (40.0, -80.0)]),
        point_fire("10", &[(-10.0, 10.0), (-11.0, 9.0)]),
    ]);
    fm.set_fires(initial.clone());
    assert_eq!(fm.num_fires(), 11);

    let fields_msg = "Filter boundary must specify 'ne' and 'sw' corners, each with 'lat' and 'lng'";
    let scenarios = [
        (json!({}), "Specify config for each filter"),
        (json!({"foo": "bar"}), "Specify boundary to filter by location"),
        (json!({"boundary": {"foo": "bar"}}), fields_msg),
        (
            json!({"boundary": {
                "sdfsdf": 123,
                "ne": {"lat": 88.12, "lng": 40},
                "sw": {"lat": -50.75, "lng": -131.5}
            }}),
            fields_msg,
        ),
        (
            json!({"boundary": {"ne": {"lng": 40}, "sw": {"lat": -50.75, "lng": -131.5}}}),
            fields_msg,
        ),
        (
            json!({"boundary": {"sw": {"lat": -50.75, "lng": -131.5}}}),
            fields_msg,
        ),
        // latitude out of range
        (
            json!({"boundary": boundary((98.12, 40.0), (-50.75, -131.5))}),
            "Invalid boundary",
        ),
        // sw east of ne
        (
            json!({"boundary": boundary((68.12, 40.0), (50.75, 50.5))}),
            "Invalid boundary",
        ),
        // sw north of ne
        (
            json!({"boundary": boundary((48.12, 40.0), (50.75, -50.5))}),
            "Invalid boundary",
        ),
    ];
    for (config, message) in scenarios {
        fm.set_config_value(config, &["filter", "location"]).unwrap();
        assert_config_failure(&mut fm, &initial, message);
    }

    set_skip(&mut fm, false);
    let squeeze = |fm: &mut FiresManager, ne: (f64, f64), sw: (f64, f64)| {
        fm.set_config_value(boundary(ne, sw), &["filter", "location", "boundary"])
            .unwrap();
        fm.filter_fires().unwrap();
    };

    // everything inside
    squeeze(&mut fm, (88.12, 40.0), (-50.75, -131.5));
    assert_eq!(fm.fires(), initial.as_slice());

    squeeze(&mut fm, (88.12, 40.0), (-5.75, -131.5));
    assert_eq!(ids(&fm), vec!["1", "2", "3", "4", "5", "6", "7", "8", "10"]);
    assert_eq!(fm.fires()[8], fire_from_json(point_fire("10", &[(40.0, -80.0)])));

    squeeze(&mut fm, (88.12, 40.0), (-5.75, -110.5));
    assert_eq!(ids(&fm), vec!["1", "2", "3", "4", "5", "6", "7", "10"]);

    squeeze(&mut fm, (66.12, 40.0), (-5.75, -110.5));
    assert_eq!(ids(&fm), vec!["1", "2", "3", "5", "6", "7", "10"]);

    squeeze(&mut fm, (66.12, -55.0), (-5.75, -110.5));
    assert_eq!(ids(&fm), vec!["1", "2", "3", "5", "6", "10"]);

    squeeze(&mut fm, (63.12, -61.0), (58.75, -62.0));
    assert_eq!(fm.fires(), fires(vec![point_fire("3", &[(60.0, -62.0)])]).as_slice());

    squeeze(&mut fm, (63.12, -61.0), (60.75, -62.0));
    assert_eq!(fm.num_fires(), 0);

    fm.filter_fires().unwrap();
    assert_eq!(fm.num_fires(), 0);
}

#[test]
fn test_filter_by_location_invalid_fires() {
    let mut fm = FiresManager::new().unwrap();
    fm.set_config_value(
        boundary((88.12, 40.0), (-50.75, -131.5)),
        &["filter", "location", "boundary"],
    )
    .unwrap();

    for fire in [
        json!({"id": "1", "growth": [{"location": {"longitude": -80.0}}]}),
        json!({"id": "1", "growth": [{"location": {"latitude": 40.0}}]}),
        json!({"id": "1", "growth": [{"location": {}}]}),
        json!({"id": "1", "growth": [{}]}),
    ] {
        assert_data_failure(&mut fm, fire_from_json(fire), FilterIssue::MissingLatLng);
    }
}

// ============================================================================
// Area
// ============================================================================

fn area_fire(id: &str, areas: &[f64]) -> Value {
    let growth: Vec<Value> = areas
        .iter()
        .map(|a| json!({"location": {"area": a}}))
        .collect();
    json!({"id": id, "growth": growth})
}

#[test]
fn test_filter_by_area() {
    let mut fm = FiresManager::new().unwrap();
    let initial = fires(vec![
        area_fire("1", &[45.0]),
        area_fire("2", &[95.0]),
        area_fire("3", &[55.0]),
        area_fire("4", &[65.0]),
        area_fire("5", &[85.0]),
        area_fire("6", &[75.0]),
        area_fire("7", &[50.0]),
        area_fire("8", &[30.0]),
        area_fire("9", &[45.0, 40.0]),
    ]);
    fm.set_fires(initial.clone());

    let non_negative = "Min and max area must be non-negative";
    let scenarios = [
        (json!({}), "Specify config for each filter"),
        (json!({"foo": "bar"}), "Specify min and/or max area for filtering"),
        (json!({"min": -20, "max": -2}), non_negative),
        (json!({"min": -20, "max": 2}), non_negative),
        (json!({"min": -20}), non_negative),
        (json!({"min": 20, "max": -2}), non_negative),
        (json!({"max": -2}), non_negative),
        (
            json!({"min": 20, "max": 2}),
            "Min area must be less than or equal to max area",
        ),
    ];
    for (config, message) in scenarios {
        fm.set_config_value(config, &["filter", "area"]).unwrap();
        assert_config_failure(&mut fm, &initial, message);
    }

    set_skip(&mut fm, false);
    let bounds = |fm: &mut FiresManager, config: Value| {
        fm.set_config_value(config, &["filter", "area"]).unwrap();
        fm.filter_fires().unwrap();
    };

    for noop in [json!({"min": 20}), json!({"max": 120}), json!({"min": 20, "max": 120})] {
        bounds(&mut fm, noop);
        assert_eq!(fm.fires(), initial.as_slice());
    }

    bounds(&mut fm, json!({"min": 47}));
    assert_eq!(ids(&fm), vec!["2", "3", "4", "5", "6", "7"]);

    bounds(&mut fm, json!({"max": 90}));
    assert_eq!(ids(&fm), vec!["3", "4", "5", "6", "7"]);

    bounds(&mut fm, json!({"min": 52, "max": 77.0}));
    assert_eq!(
        fm.fires(),
        fires(vec![
            area_fire("3", &[55.0]),
            area_fire("4", &[65.0]),
            area_fire("6", &[75.0])
        ])
        .as_slice()
    );

    // bounds are inclusive
    bounds(&mut fm, json!({"min": 65, "max": 65.0}));
    assert_eq!(ids(&fm), vec!["4"]);

    bounds(&mut fm, json!({"min": 76, "max": 77.0}));
    assert_eq!(fm.num_fires(), 0);

    fm.filter_fires().unwrap();
    assert_eq!(fm.num_fires(), 0);
}

#[test]
fn test_filter_by_area_drops_windows_not_fires() {
    let mut fm = FiresManager::new().unwrap();
    fm.set_fires(fires(vec![area_fire("9", &[45.0, 40.0])]));
    fm.set_config_value(json!({"min": 42}), &["filter", "area"])
        .unwrap();
    fm.filter_fires().unwrap();
    assert_eq!(fm.fires(), fires(vec![area_fire("9", &[45.0])]).as_slice());
}

#[test]
fn test_filter_by_area_invalid_fires() {
    let mut fm = FiresManager::new().unwrap();
    fm.set_config_value(json!({"min": 0.0, "max": 100.0}), &["filter", "area"])
        .unwrap();

    assert_data_failure(
        &mut fm,
        fire_from_json(json!({"id": "1", "growth": [{"location": {}}]})),
        FilterIssue::MissingArea,
    );
    assert_data_failure(
        &mut fm,
        fire_from_json(json!({"id": "1", "growth": [{}]})),
        FilterIssue::MissingArea,
    );
    assert_data_failure(
        &mut fm,
        fire_from_json(json!({"id": "1", "growth": [{"location": {"area": -123}}]})),
        FilterIssue::NegativeArea,
    );
}

// ============================================================================
// Combined criteria
// ============================================================================

#[test]
fn test_criteria_run_in_fixed_order() {
    let mut fm = FiresManager::new().unwrap();
    fm.set_fires(fires(vec![
        json!({"id": "1", "growth": [
            {"location": {"latitude": 45.0, "longitude": -120.0, "area": 10, "country": "USA"}},
            {"location": {"latitude": 45.0, "longitude": -120.0, "area": 200, "country": "USA"}}
        ]}),
        json!({"id": "2", "growth": [
            {"location": {"latitude": 45.0, "longitude": -120.0, "area": 200, "country": "CA"}}
        ]}),
        json!({"id": "3", "growth": [
            {"location": {"latitude": 10.0, "longitude": -120.0, "area": 200, "country": "USA"}}
        ]}),
    ]));
    fm.set_config_value(
        json!({
            "area": {"min": 100},
            "country": {"whitelist": ["USA"]},
            "location": {"boundary": boundary((50.0, -100.0), (30.0, -130.0))}
        }),
        &["filter"],
    )
    .unwrap();

    fm.filter_fires().unwrap();
    assert_eq!(ids(&fm), vec!["1"]);
    assert_eq!(fm.fires()[0].growth().len(), 1);
    assert_eq!(fm.fires()[0].growth()[0].area(), Some(200.0));

    // same config, same result
    let once = fm.fires().to_vec();
    fm.filter_fires().unwrap();
    assert_eq!(fm.fires(), once.as_slice());
}
