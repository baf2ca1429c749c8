//! Configuration tests.

use super::*;

#[test]
fn config_roundtrip_default() {
    let config = NavigatorConfig::default();
    let toml_str = config.to_toml();

    let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
    assert!(parsed.is_ok(), "default config should round-trip.\nTOML:\n{}\nerror: {:?}", toml_str, parsed.err());

    let parsed = parsed.unwrap();
    assert_eq!(parsed.history_max_size, Some(config.history_max_size));
    assert_eq!(parsed.cognitive_vote_threshold, Some(config.cognitive_vote_threshold));
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let config = NavigatorConfig::load(None);
    assert_eq!(config, NavigatorConfig::default());
}

#[test]
fn env_override_wins_over_file_and_defaults() {
    std::env::set_var("NAVIGATOR_HISTORY_MAX_SIZE", "42");
    let config = NavigatorConfig::load(None);
    std::env::remove_var("NAVIGATOR_HISTORY_MAX_SIZE");
    assert_eq!(config.history_max_size, 42);
}

#[test]
fn file_config_fills_in_fields_env_does_not_set() {
    let dir = std::env::temp_dir().join(format!("navigator-config-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, "cognitive_vote_threshold = 7\n").unwrap();

    let config = NavigatorConfig::load(Some(&path));
    assert_eq!(config.cognitive_vote_threshold, 7);
    assert_eq!(config.history_max_size, NavigatorConfig::default().history_max_size);

    std::fs::remove_dir_all(&dir).ok();
}
