use amber_route::{derive_signals, parse_route, ParseError, RouteError, SignalId, SignalStatus};

#[test]
fn test_parse_route_from_file() {
    let json = include_str!("fixtures/nine_point_route.json");
    let route = parse_route(json).unwrap();
    assert_eq!(route.id, "route-0001");
    assert_eq!(route.len(), 9);
    assert_eq!(route.best_hospital.name, "St. Martha's Hospital");
    assert_eq!(route.best_hospital.availability, 7);
    assert_eq!(route.best_hospital_id.as_deref(), Some("hosp-03"));
    assert_eq!(route.ambulance_location, route.route_coordinates[0]);
}

#[test]
fn test_parse_invalid_json() {
    let result = parse_route("not json at all");
    assert!(matches!(result, Err(ParseError::Json(_))));
}

#[test]
fn test_parse_rejects_empty_route() {
    let json = r#"{
        "id": "empty",
        "ambulanceLocation": { "latitude": 12.97, "longitude": 77.59 },
        "bestHospital": {
            "id": "h1",
            "name": "General",
            "coords": { "latitude": 12.98, "longitude": 77.60 }
        },
        "routeCoordinates": []
    }"#;
    let result = parse_route(json);
    assert!(matches!(result, Err(ParseError::Invalid(RouteError::Empty))));
}

#[test]
fn test_parse_rejects_out_of_range_coordinate() {
    let json = r#"{
        "id": "bad",
        "ambulanceLocation": { "latitude": 12.97, "longitude": 77.59 },
        "bestHospital": {
            "id": "h1",
            "name": "General",
            "coords": { "latitude": 12.98, "longitude": 77.60 }
        },
        "routeCoordinates": [
            { "latitude": 12.97, "longitude": 77.59 },
            { "latitude": 97.0, "longitude": 77.59 }
        ]
    }"#;
    let err = parse_route(json).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Invalid(RouteError::InvalidCoordinate { position: 1 })
    ));
}

#[test]
fn test_optional_fields_default() {
    let json = r#"{
        "id": "minimal",
        "ambulanceLocation": { "latitude": 12.97, "longitude": 77.59 },
        "bestHospital": {
            "id": "h1",
            "name": "General",
            "coords": { "latitude": 12.98, "longitude": 77.60 }
        },
        "routeCoordinates": [{ "latitude": 12.97, "longitude": 77.59 }]
    }"#;
    let route = parse_route(json).unwrap();
    assert!(route.best_hospital_id.is_none());
    assert!(route.created_at.is_none());
    assert_eq!(route.best_hospital.availability, 0);
}

#[test]
fn test_signals_for_fixture_route() {
    let route = parse_route(include_str!("fixtures/nine_point_route.json")).unwrap();
    let signals = derive_signals(route.waypoints());
    assert_eq!(signals.len(), 2);
    assert_eq!(signals[0].index, SignalId(0));
    assert_eq!(signals[0].position, route.route_coordinates[3]);
    assert_eq!(signals[1].index, SignalId(1));
    assert_eq!(signals[1].position, route.route_coordinates[6]);
    assert!(signals.iter().all(|s| s.status == SignalStatus::Red));
}

#[test]
fn test_signal_wire_format() {
    let route = parse_route(include_str!("fixtures/nine_point_route.json")).unwrap();
    let signals = derive_signals(route.waypoints());
    let value = serde_json::to_value(&signals[1]).unwrap();
    assert_eq!(value["index"], 1);
    assert_eq!(value["status"], "red");
    assert_eq!(value["latitude"], 12.893943);
    assert!(value["longitude"].is_number());
}

#[test]
fn test_coincidence_tolerates_representation_noise() {
    let route = parse_route(include_str!("fixtures/nine_point_route.json")).unwrap();
    let a = route.route_coordinates[3];
    let mut b = a;
    b.longitude += 1e-9;
    assert!(a.coincides_with(&b, 1e-4));
    assert!(!a.coincides_with(&route.route_coordinates[4], 1e-4));
}
