use super::*;

use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_have_no_unit_id_and_nonzero_capacities() {
    let settings = AdSettings::default();
    assert_eq!(settings.default_unit_id(), None);
    assert_eq!(settings.event_capacity, 1024);
    assert_eq!(settings.inbound_capacity, 256);
}

#[test]
fn parses_partial_toml_and_clamps_capacities() {
    let settings = parse_settings(
        r#"
default_unit_id = "ca-app-pub-test/native"
event_capacity = 0
"#,
    )
    .expect("parse");

    assert_eq!(settings.default_unit_id(), Some("ca-app-pub-test/native"));
    assert_eq!(settings.event_capacity, 1);
    assert_eq!(settings.inbound_capacity, 256);
}

#[test]
fn rejects_malformed_toml() {
    assert!(parse_settings("event_capacity = \"lots\"").is_err());
}

#[test]
fn blank_default_unit_id_counts_as_absent() {
    let settings = AdSettings::with_default_unit_id("   ");
    assert_eq!(settings.default_unit_id(), None);
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let settings = apply_env_overrides(
        AdSettings::with_default_unit_id("from-file"),
        env_from(&[
            ("NATIVE_AD_DEFAULT_UNIT_ID", "from-plain-env"),
            ("APP__DEFAULT_UNIT_ID", "from-app-env"),
        ]),
    );
    assert_eq!(settings.default_unit_id(), Some("from-app-env"));
}

#[test]
fn unparsable_capacity_override_is_ignored() {
    let settings = apply_env_overrides(
        AdSettings::default(),
        env_from(&[("APP__EVENT_CAPACITY", "many"), ("APP__INBOUND_CAPACITY", "0")]),
    );
    assert_eq!(settings.event_capacity, 1024);
    assert_eq!(settings.inbound_capacity, 1);
}

#[test]
fn reads_settings_file_from_disk() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("native_ad_settings_{suffix}.toml"));
    std::fs::write(&path, "inbound_capacity = 8\n").expect("write settings");

    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.inbound_capacity, 8);

    std::fs::remove_file(&path).expect("cleanup");
}

#[test]
fn malformed_settings_file_reports_path() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("native_ad_bad_settings_{suffix}.toml"));
    std::fs::write(&path, "event_capacity = [").expect("write settings");

    let err = load_settings(&path).expect_err("malformed");
    assert!(matches!(err, AdError::Settings(ref msg) if msg.contains("native_ad_bad_settings")));

    std::fs::remove_file(&path).expect("cleanup");
}
