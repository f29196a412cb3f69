/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use std::path::PathBuf;
use subpace::app_config::Config;
use subpace::app_controller::Controller;
use crate::common;

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::new_for_test()?;

    assert_eq!(controller.config().retiming.target_cps, 17.0);
    Ok(())
}

#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.retiming.target_cps = -3.0;

    assert!(Controller::with_config(config).is_err());
}

#[test]
fn test_controller_withMissingRulesFile_shouldFail() {
    let mut config = Config::default();
    config.correction.enabled = true;
    config.correction.rules_path = Some(PathBuf::from("/definitely/not/here/rules.json"));

    assert!(Controller::with_config(config).is_err());
}

#[tokio::test]
async fn test_runFolder_shouldRetimeEverySubtitleOnce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_subtitle(temp_dir.path(), "a.srt")?;
    common::create_test_subtitle(temp_dir.path(), "season/b.srt")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "not a subtitle")?;

    let mut config = Config::default();
    config.processing.concurrent_files = 2;
    let controller = Controller::with_config(config)?;

    let reports = controller.run_folder(temp_dir.path().to_path_buf(), false).await?;

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| !r.skipped && r.is_clean()));
    assert!(temp_dir.path().join("a.retimed.srt").exists());
    assert!(temp_dir.path().join("season/b.retimed.srt").exists());

    // outputs are not picked up as inputs, and existing outputs are skipped
    let again = controller.run_folder(temp_dir.path().to_path_buf(), false).await?;
    assert_eq!(again.len(), 2);
    assert!(again.iter().all(|r| r.skipped));
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withMissingDirectory_shouldFail() -> Result<()> {
    let controller = Controller::new_for_test()?;

    let result = controller.run_folder(PathBuf::from("/definitely/not/here"), false).await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withBrokenFile_shouldKeepGoing() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    common::create_test_subtitle(temp_dir.path(), "good.srt")?;
    common::create_test_file(temp_dir.path(), "broken.srt", "this is not srt")?;
    let controller = Controller::new_for_test()?;

    let reports = controller.run_folder(temp_dir.path().to_path_buf(), false).await?;

    assert_eq!(reports.len(), 1);
    assert!(reports[0].input.ends_with("good.srt"));
    Ok(())
}

#[tokio::test]
async fn test_run_withSingleFile_andReport_shouldWriteJson() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let controller = Controller::new_for_test()?;

    let reports = controller.run(input.clone(), false).await?;
    let report_path = temp_dir.path().join("reports/report.json");
    Controller::write_report(&report_path, &reports)?;

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report_path)?)?;
    assert_eq!(json[0]["strategy"], "primary");
    assert_eq!(json[0]["violations_before"], serde_json::json!([2]));
    assert_eq!(json[0]["cues"], 3);
    assert_eq!(json[0]["skipped"], false);
    Ok(())
}
