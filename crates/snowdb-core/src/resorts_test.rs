use std::path::Path;

use super::*;

fn resort(id: ResortId, slug: &str, source: SourceKind) -> ResortConfig {
    ResortConfig {
        id,
        name: format!("Resort {id}"),
        slug: slug.to_string(),
        location: None,
        lat: Some(39.6),
        lon: Some(-106.3),
        elevation_min: Some(2475),
        elevation_max: Some(3527),
        source,
        source_id: Some("60".to_string()),
        source_url: Some("https://www.onthesnow.com/colorado/vail/skireport".to_string()),
        enabled: true,
        update_interval_mins: None,
        notes: None,
    }
}

#[test]
fn validate_accepts_valid_resorts() {
    let resorts = vec![
        resort(1, "vail", SourceKind::MtnPowder),
        resort(2, "breck", SourceKind::OnTheSnow),
        resort(3, "loveland", SourceKind::OpenMeteo),
    ];
    assert!(validate_resorts(&resorts).is_ok());
}

#[test]
fn validate_rejects_empty_name() {
    let mut r = resort(1, "vail", SourceKind::MtnPowder);
    r.name = "  ".to_string();
    let err = validate_resorts(&[r]).unwrap_err();
    assert!(err.to_string().contains("empty name"), "got: {err}");
}

#[test]
fn validate_rejects_duplicate_id() {
    let resorts = vec![
        resort(1, "vail", SourceKind::MtnPowder),
        resort(1, "beaver-creek", SourceKind::MtnPowder),
    ];
    let err = validate_resorts(&resorts).unwrap_err();
    assert!(err.to_string().contains("duplicate resort id"), "got: {err}");
}

#[test]
fn validate_rejects_duplicate_slug_case_insensitively() {
    let resorts = vec![
        resort(1, "vail", SourceKind::MtnPowder),
        resort(2, "Vail", SourceKind::OnTheSnow),
    ];
    let err = validate_resorts(&resorts).unwrap_err();
    assert!(err.to_string().contains("duplicate resort slug"), "got: {err}");
}

#[test]
fn validate_rejects_places_as_primary_source() {
    let err = validate_resorts(&[resort(1, "vail", SourceKind::GooglePlaces)]).unwrap_err();
    assert!(err.to_string().contains("primary source"), "got: {err}");
}

#[test]
fn validate_rejects_vendor_resort_without_source_id() {
    let mut r = resort(1, "vail", SourceKind::MtnPowder);
    r.source_id = Some(String::new());
    let err = validate_resorts(&[r]).unwrap_err();
    assert!(err.to_string().contains("source_id"), "got: {err}");
}

#[test]
fn validate_rejects_scraped_resort_without_url() {
    let mut r = resort(1, "breck", SourceKind::OnTheSnow);
    r.source_url = None;
    let err = validate_resorts(&[r]).unwrap_err();
    assert!(err.to_string().contains("source_url"), "got: {err}");
}

#[test]
fn validate_rejects_weather_resort_without_coordinates() {
    let mut r = resort(1, "loveland", SourceKind::OpenMeteo);
    r.lon = None;
    let err = validate_resorts(&[r]).unwrap_err();
    assert!(err.to_string().contains("coordinates"), "got: {err}");
}

#[test]
fn validate_rejects_implausible_elevation() {
    let mut r = resort(1, "vail", SourceKind::MtnPowder);
    r.elevation_min = Some(i32::MIN);
    let err = validate_resorts(&[r]).unwrap_err();
    assert!(err.to_string().contains("elevation_min"), "got: {err}");

    let mut r = resort(1, "vail", SourceKind::MtnPowder);
    r.elevation_max = Some(12_000);
    let err = validate_resorts(&[r]).unwrap_err();
    assert!(err.to_string().contains("elevation_max"), "got: {err}");
}

#[test]
fn validate_rejects_inverted_elevation() {
    let mut r = resort(1, "vail", SourceKind::MtnPowder);
    r.elevation_min = Some(4000);
    let err = validate_resorts(&[r]).unwrap_err();
    assert!(err.to_string().contains("elevation_min"), "got: {err}");
}

#[test]
fn locator_matches_bound_source() {
    assert_eq!(
        resort(1, "vail", SourceKind::MtnPowder).locator(),
        Some("60")
    );
    assert_eq!(
        resort(2, "breck", SourceKind::OnTheSnow).locator(),
        Some("https://www.onthesnow.com/colorado/vail/skireport")
    );
    assert_eq!(resort(3, "loveland", SourceKind::OpenMeteo).locator(), None);
}

#[test]
fn source_kind_round_trips_through_str() {
    for kind in [
        SourceKind::MtnPowder,
        SourceKind::OnTheSnow,
        SourceKind::OpenMeteo,
        SourceKind::GooglePlaces,
    ] {
        assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
    }
    assert!("liftie".parse::<SourceKind>().is_err());
}

#[test]
fn catalog_indexes_by_id_and_slug() {
    let mut disabled = resort(2, "breck", SourceKind::OnTheSnow);
    disabled.enabled = false;
    let catalog = ResortCatalog::new(vec![
        resort(1, "vail", SourceKind::MtnPowder),
        disabled,
        resort(3, "loveland", SourceKind::OpenMeteo),
    ])
    .unwrap();

    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.get(2).map(|r| r.slug.as_str()), Some("breck"));
    assert_eq!(catalog.get_by_slug(" VAIL ").map(|r| r.id), Some(1));
    assert!(catalog.get(99).is_none());

    let enabled: Vec<ResortId> = catalog.enabled().map(|r| r.id).collect();
    assert_eq!(enabled, vec![1, 3]);
}

#[test]
fn enabled_defaults_to_false_when_omitted() {
    let yaml = r"
resorts:
  - id: 1
    name: Loveland
    slug: loveland
    lat: 39.68
    lon: -105.9
    source: openmeteo
";
    let file: ResortsFile = serde_yaml::from_str(yaml).unwrap();
    assert!(!file.resorts[0].enabled);
    assert!(file.resorts[0].source_id.is_none());
}

#[test]
fn load_resorts_missing_file_is_io_error() {
    let err = load_resorts(Path::new("/definitely/not/here/resorts.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::ResortsFileIo { .. }));
}

#[test]
fn load_resorts_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("config")
        .join("resorts.yaml");

    let catalog = ResortCatalog::load(&path).expect("failed to load resorts.yaml");
    assert!(!catalog.is_empty());
    assert!(catalog.enabled().count() > 0);
    // load already validated; every enabled entry must carry its locator
    for r in catalog.enabled() {
        match r.source {
            SourceKind::MtnPowder | SourceKind::OnTheSnow => assert!(r.locator().is_some()),
            SourceKind::OpenMeteo => assert!(r.coordinates().is_some()),
            SourceKind::GooglePlaces => panic!("places cannot be primary"),
        }
    }
}
