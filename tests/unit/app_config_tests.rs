/*!
 * Tests for application configuration
 */

use std::path::PathBuf;
use std::str::FromStr;
use subpace::app_config::{Config, LogLevel, Strategy};
use subpace::errors::ConfigError;
use crate::common;

#[test]
fn test_default_config_shouldHaveExpectedValues() {
    let config = Config::default();

    assert_eq!(config.retiming.target_cps, 17.0);
    assert_eq!(config.retiming.max_variation_ms, 300);
    assert_eq!(config.retiming.min_duration_ms, 500);
    assert_eq!(config.retiming.strategy, Strategy::Primary);
    assert_eq!(config.output.suffix, "retimed");
    assert!(config.output.crlf);
    assert!(config.output.attribution.is_some());
    assert!(!config.correction.enabled);
    assert_eq!(config.processing.concurrent_files, 4);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() {
    let config: Config = serde_json::from_str(r#"{ "retiming": { "target_cps": 15.5, "strategy": "legacy" } }"#).unwrap();

    assert_eq!(config.retiming.target_cps, 15.5);
    assert_eq!(config.retiming.strategy, Strategy::Legacy);
    assert_eq!(config.retiming.max_variation_ms, 300);
    assert_eq!(config.output.suffix, "retimed");
}

#[test]
fn test_deserialize_withNullAttribution_shouldDisableIt() {
    let config: Config = serde_json::from_str(r#"{ "output": { "attribution": null } }"#).unwrap();

    assert!(config.output.attribution.is_none());
}

#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.retiming.target_cps = 0.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.retiming.min_duration_ms = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.retiming.max_variation_ms = -1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.processing.concurrent_files = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.output.suffix = " ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withCorrectionButNoRules_shouldFailWithConfigError() {
    let mut config = Config::default();
    config.correction.enabled = true;

    let err = config.validate().unwrap_err();

    assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Invalid(_))));

    config.correction.rules_path = Some(PathBuf::from("rules.json"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_strategy_fromStr_shouldBeCaseInsensitive() {
    assert_eq!(Strategy::from_str("ALTERNATING").unwrap(), Strategy::Alternating);
    assert_eq!(Strategy::from_str("primary").unwrap(), Strategy::Primary);
    assert!(Strategy::from_str("fastest").is_err());
    assert_eq!(Strategy::Legacy.to_string(), "legacy");
    assert_eq!(Strategy::Legacy.display_name(), "Legacy");
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefault() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    let reloaded = Config::from_file(&path).unwrap();
    assert_eq!(reloaded.retiming, config.retiming);
    assert_eq!(reloaded.output, config.output);
}

#[test]
fn test_fromFile_withInvalidJson_shouldReturnParseError() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ nope").unwrap();

    let result = Config::from_file(&path);

    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_logLevel_shouldMapToLevelFilter() {
    assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
}
