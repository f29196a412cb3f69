/*!
 * Pure timing metrics: duration, reading speed and SRT timestamps.
 */

use anyhow::{anyhow, Context, Result};

/// Reading speed in characters per second, rounded to two decimals.
///
/// A positive duration is a caller precondition. Degenerate cues report an
/// infinite speed (or zero when there is nothing to read) so they always
/// show up as violators instead of poisoning comparisons with NaN.
pub fn speed(duration_ms: i64, characters: usize) -> f64 {
    if duration_ms <= 0 {
        return if characters == 0 { 0.0 } else { f64::INFINITY };
    }

    let cps = characters as f64 / (duration_ms as f64 / 1000.0);
    (cps * 100.0).round() / 100.0
}

/// Duration between two boundaries in milliseconds
pub fn duration(start_ms: i64, end_ms: i64) -> i64 {
    end_ms - start_ms
}

/// Format milliseconds as an SRT timestamp (HH:MM:SS,mmm)
///
/// Hours are not capped, so values past 99 hours simply print wider.
pub fn format_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    let whole_seconds = ms / 1000;
    let millis = ms % 1000;

    let hours = whole_seconds / 3600;
    let minutes = (whole_seconds / 60) % 60;
    let seconds = whole_seconds % 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parse an SRT timestamp (HH:MM:SS,mmm or HH:MM:SS.mmm) into milliseconds
pub fn parse_timestamp(timestamp: &str) -> Result<i64> {
    let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

    if parts.len() != 4 {
        return Err(anyhow!("Invalid timestamp format: {}", timestamp));
    }

    let hours: i64 = parts[0].parse().context("Failed to parse hours")?;
    let minutes: i64 = parts[1].parse().context("Failed to parse minutes")?;
    let seconds: i64 = parts[2].parse().context("Failed to parse seconds")?;
    let millis: i64 = parts[3].parse().context("Failed to parse milliseconds")?;

    if hours < 0 || minutes >= 60 || seconds >= 60 || millis >= 1000 {
        return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
    }

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}
