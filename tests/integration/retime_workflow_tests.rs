/*!
 * End-to-end tests for retiming subtitle files
 */

use anyhow::Result;
use subpace::app_config::{Config, Strategy};
use subpace::app_controller::Controller;
use subpace::subtitle_processor::SubtitleCollection;
use crate::common;

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.output.attribution = None;
    config.output.crlf = false;
    config
}

#[test]
fn test_processFile_withFastCue_shouldWriteRetimedCopy() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let controller = Controller::with_config(quiet_config())?;

    let report = controller.process_file(&input, false)?;

    let output = temp_dir.path().join("movie.retimed.srt");
    assert_eq!(report.output.as_deref(), Some(output.as_path()));
    assert_eq!(report.violations_before, vec![2]);
    assert!(report.is_clean());
    assert_eq!(report.retimed_cues, 1);

    let written = SubtitleCollection::from_srt_file(&output)?;
    assert_eq!(written.entries[1].start_time_ms, 4001);
    assert_eq!(written.entries[1].end_time_ms, 6001);
    assert_eq!(written.entries[0].start_time_ms, 1000);
    assert_eq!(written.entries[2].end_time_ms, 14000);

    // the input is left untouched
    assert_eq!(std::fs::read_to_string(&input)?, common::FAST_SUBTITLE);
    Ok(())
}

#[test]
fn test_processFile_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let existing = common::create_test_file(temp_dir.path(), "movie.retimed.srt", "old")?;
    let controller = Controller::with_config(quiet_config())?;

    let skipped = controller.process_file(&input, false)?;
    assert!(skipped.skipped);
    assert_eq!(std::fs::read_to_string(&existing)?, "old");

    let forced = controller.process_file(&input, true)?;
    assert!(!forced.skipped);
    assert_ne!(std::fs::read_to_string(&existing)?, "old");
    Ok(())
}

#[test]
fn test_processFile_withDefaultOutput_shouldAppendAttributionWithCrlf() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let controller = Controller::new_for_test()?;

    controller.process_file(&input, false)?;

    let written = std::fs::read_to_string(temp_dir.path().join("movie.retimed.srt"))?;
    assert!(written.contains("\r\n"));
    assert!(written.ends_with("4\r\n04:08:15,016 --> 04:08:23,420\r\nRetimed with subpace\r\n\r\n"));
    Ok(())
}

#[test]
fn test_checkFile_shouldReportWithoutWriting() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let controller = Controller::with_config(quiet_config())?;

    let report = controller.check_file(&input)?;

    assert_eq!(report.violations_before, vec![2]);
    assert!(report.output.is_none());
    assert!(!temp_dir.path().join("movie.retimed.srt").exists());
    assert_eq!(report.digest.len(), 64);
    Ok(())
}

#[test]
fn test_processFile_withCorrectionRules_shouldCorrectBeforeRetiming() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "ocr.srt",
        "1\n00:00:01,000 --> 00:00:03,000\nI Iike it\n",
    )?;
    let rules = common::create_test_file(
        temp_dir.path(),
        "rules.json",
        r#"{ "string": [{ "find": "Iike", "replace": "like", "tags": [], "whole_word": true }] }"#,
    )?;

    let mut config = quiet_config();
    config.correction.enabled = true;
    config.correction.rules_path = Some(rules);
    let controller = Controller::with_config(config)?;

    let report = controller.process_file(&input, false)?;

    assert_eq!(report.corrected_lines, 1);
    let written = SubtitleCollection::from_srt_file(temp_dir.path().join("ocr.retimed.srt"))?;
    assert_eq!(written.entries[0].text(), "I like it");
    Ok(())
}

#[test]
fn test_processFile_withUnresolvableChain_shouldReportResidualViolations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    // three back-to-back fast cues with no slack anywhere near them
    let input = common::create_test_file(
        temp_dir.path(),
        "dense.srt",
        "1\n00:00:00,000 --> 00:00:01,000\nAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\n\n\
         2\n00:00:01,001 --> 00:00:02,001\nBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB\n\n\
         3\n00:00:02,002 --> 00:00:03,002\nCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC\n\n\
         4\n00:00:03,003 --> 00:00:04,003\nDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDD\n",
    )?;
    let mut config = quiet_config();
    config.retiming.strategy = Strategy::Legacy;
    let controller = Controller::with_config(config)?;

    let report = controller.process_file(&input, false)?;

    assert_eq!(report.violations_before, vec![1, 2, 3, 4]);
    assert_eq!(report.violations_after, vec![1, 2, 3]);
    assert_eq!(report.overlaps, 0);
    assert!(!report.is_clean());
    Ok(())
}
