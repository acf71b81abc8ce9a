use super::*;

use std::{collections::HashMap, io::Write};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_are_usable() {
    let settings = ClientSettings::default();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.batch_options(), BatchOptions::default());
    assert_eq!(settings.seed_count, DEFAULT_SEED_COUNT);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = ClientSettings::default();
    apply_file(
        &mut settings,
        Path::new("roster.toml"),
        r#"
server_url = "https://members.example.org"
batch_size = 10
batch_delay_ms = 0
"#,
    )
    .expect("apply");

    assert_eq!(settings.server_url, "https://members.example.org");
    assert_eq!(settings.batch_size, 10);
    assert_eq!(settings.batch_options().delay, Duration::ZERO);
    assert_eq!(settings.request_timeout_secs, 30);
}

#[test]
fn malformed_file_is_reported_with_path() {
    let mut settings = ClientSettings::default();
    let err = apply_file(&mut settings, Path::new("bad.toml"), "batch_size = \"many\"")
        .expect_err("type mismatch");
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let mut settings = ClientSettings::default();
    apply_env(
        &mut settings,
        env_of(&[
            ("ROSTER_SERVER_URL", "http://a.example"),
            ("APP__SERVER_URL", "http://b.example"),
            ("APP__SEED_COUNT", " 25 "),
        ]),
    )
    .expect("apply");

    assert_eq!(settings.server_url, "http://b.example");
    assert_eq!(settings.seed_count, 25);
}

#[test]
fn unparsable_env_value_is_an_error() {
    let mut settings = ClientSettings::default();
    let err = apply_env(&mut settings, env_of(&[("APP__BATCH_SIZE", "five")]))
        .expect_err("invalid");
    assert_eq!(err.to_string(), "invalid value for APP__BATCH_SIZE: 'five'");
}

#[test]
fn invalid_server_url_fails_validation() {
    let settings = ClientSettings {
        server_url: "not a url".into(),
        ..ClientSettings::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::InvalidServerUrl { .. })
    ));
}

#[test]
fn explicit_settings_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "server_url = \"http://127.0.0.1:9000\"").expect("write");
    writeln!(file, "request_timeout_secs = 5").expect("write");

    let settings = load_settings(Some(file.path())).expect("load");
    assert_eq!(settings.request_timeout(), Duration::from_secs(5));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        load_settings(Some(&missing)),
        Err(SettingsError::Read { .. })
    ));
}
