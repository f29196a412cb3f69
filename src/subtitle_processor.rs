use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::app_config::OutputConfig;
use crate::errors::SubtitleError;
use crate::retiming::metrics::{format_timestamp, parse_timestamp};
use crate::retiming::{Cue, Timeline};

// @module: SRT parsing, export and content identity

// @const: SRT timing line regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,3}:\d{2}:\d{2}[,.]\d{3})")
        .expect("timestamp regex is valid")
});

/// Start of the trailing attribution cue (04:08:15,016)
pub const ATTRIBUTION_START_MS: i64 = 14_895_016;

/// End of the trailing attribution cue (04:08:23,420)
pub const ATTRIBUTION_END_MS: i64 = 14_903_420;

/// Cues with more lines than this are kept but reported
const MAX_LINES_PER_CUE: usize = 3;

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: i64,

    // @field: End time in ms
    pub end_time_ms: i64,

    // @field: Text lines
    pub lines: Vec<String>,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: i64, end_time_ms: i64, lines: Vec<String>) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            lines,
        }
    }

    // @creates: Validated subtitle entry
    // @validates: Time range
    pub fn new_validated(
        seq_num: usize,
        start_time_ms: i64,
        end_time_ms: i64,
        lines: Vec<String>,
    ) -> std::result::Result<Self, SubtitleError> {
        if end_time_ms <= start_time_ms {
            return Err(SubtitleError::InvalidTimeRange {
                seq_num,
                start_ms: start_time_ms,
                end_ms: end_time_ms,
            });
        }

        Ok(Self::new(seq_num, start_time_ms, end_time_ms, lines))
    }

    /// All lines joined with newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        format_timestamp(self.end_time_ms)
    }

    fn write_srt(&self, out: &mut String, newline: &str) {
        out.push_str(&self.seq_num.to_string());
        out.push_str(newline);
        out.push_str(&format!("{} --> {}", self.format_start_time(), self.format_end_time()));
        out.push_str(newline);
        for line in &self.lines {
            out.push_str(line);
            out.push_str(newline);
        }
        out.push_str(newline);
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Collection of subtitle entries with metadata
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,

    /// SHA-256 of the raw content the entries were parsed from
    pub digest: String,
}

impl SubtitleCollection {
    /// Create an empty subtitle collection
    pub fn new(source_file: PathBuf) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            digest: String::new(),
        }
    }

    /// Parse SRT content into a collection
    pub fn from_srt_string(source_file: PathBuf, content: &str) -> std::result::Result<Self, SubtitleError> {
        Ok(SubtitleCollection {
            source_file,
            entries: Self::parse_srt_string(content)?,
            digest: content_digest(content),
        })
    }

    /// Read and parse an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        Self::from_srt_string(path.to_path_buf(), &content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))
    }

    /// Build engine cues; the current timing becomes the original timing
    pub fn to_timeline(&self) -> Timeline {
        self.entries
            .iter()
            .map(|entry| Cue::new(entry.seq_num, entry.start_time_ms, entry.end_time_ms, entry.lines.clone()))
            .collect()
    }

    /// Copy retimed boundaries back onto the entries
    pub fn apply_timeline(&mut self, timeline: &Timeline) {
        if timeline.len() != self.entries.len() {
            warn!(
                "Timeline has {} cues but collection has {} entries; applying the overlap",
                timeline.len(),
                self.entries.len()
            );
        }

        for (entry, cue) in self.entries.iter_mut().zip(timeline.iter()) {
            entry.start_time_ms = cue.start_ms;
            entry.end_time_ms = cue.end_ms;
        }
    }

    /// Render the collection as SRT, including the attribution cue when configured
    pub fn to_srt_string(&self, output: &OutputConfig) -> String {
        let newline = if output.crlf { "\r\n" } else { "\n" };
        let mut out = String::new();

        for entry in &self.entries {
            entry.write_srt(&mut out, newline);
        }

        if let Some(text) = output.attribution.as_deref().filter(|t| !t.trim().is_empty()) {
            self.attribution_entry(text).write_srt(&mut out, newline);
        }

        out
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P, output: &OutputConfig) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, self.to_srt_string(output))
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        debug!("Wrote {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Trailing credit cue, pushed past the last cue when they would collide
    fn attribution_entry(&self, text: &str) -> SubtitleEntry {
        let last_end = self.entries.iter().map(|e| e.end_time_ms).max().unwrap_or(0);
        let length = ATTRIBUTION_END_MS - ATTRIBUTION_START_MS;
        let start = if last_end >= ATTRIBUTION_START_MS {
            last_end + 1
        } else {
            ATTRIBUTION_START_MS
        };

        SubtitleEntry::new(
            self.entries.len() + 1,
            start,
            start + length,
            text.lines().map(str::to_string).collect(),
        )
    }

    /// Parse SRT format string into subtitle entries
    pub fn parse_srt_string(content: &str) -> std::result::Result<Vec<SubtitleEntry>, SubtitleError> {
        let content = content.trim_start_matches('\u{feff}');
        let mut entries = Vec::new();

        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_times: Option<(i64, i64)> = None;
        let mut current_lines: Vec<String> = Vec::new();

        let mut finish_entry = |seq_num: usize, (start_ms, end_ms): (i64, i64), lines: &mut Vec<String>| {
            if lines.is_empty() {
                warn!("Skipping empty subtitle entry {}", seq_num);
                return;
            }
            match SubtitleEntry::new_validated(seq_num, start_ms, end_ms, std::mem::take(lines)) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping invalid subtitle entry {}: {}", seq_num, e),
            }
        };

        for (line_index, line) in content.lines().enumerate() {
            let trimmed = line.trim();

            // A blank line closes the current entry; one without text is dropped
            if trimmed.is_empty() {
                match (current_seq_num, current_times) {
                    (Some(seq_num), Some(times)) => {
                        finish_entry(seq_num, times, &mut current_lines);
                        current_seq_num = None;
                        current_times = None;
                    }
                    // Number without a usable timing line; start over
                    (Some(_), None) => current_seq_num = None,
                    _ => {}
                }
                continue;
            }

            // Sequence number (only when starting a new entry)
            if current_seq_num.is_none() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    continue;
                }
            }

            // Timing line
            if current_seq_num.is_some() && current_times.is_none() {
                match Self::parse_timing_line(trimmed, line_index + 1) {
                    Ok(times) => {
                        current_times = Some(times);
                        continue;
                    }
                    Err(e) => warn!("{}", e),
                }
            }

            if current_times.is_some() {
                current_lines.push(trimmed.to_string());
            } else {
                warn!(
                    "Unexpected text at line {} before sequence number or timestamp: {}",
                    line_index + 1,
                    trimmed
                );
            }
        }

        // Add the last entry if there is one
        if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
            finish_entry(seq_num, times, &mut current_lines);
        }

        if entries.is_empty() {
            return Err(SubtitleError::NoEntries);
        }

        // Sort by start time to ensure correct order
        entries.sort_by_key(|entry| entry.start_time_ms);

        let overlap_count = entries
            .windows(2)
            .filter(|pair| pair[0].end_time_ms >= pair[1].start_time_ms)
            .count();
        if overlap_count > 0 {
            warn!("Found {} overlapping subtitle entries", overlap_count);
        }

        let crowded = entries.iter().filter(|e| e.lines.len() > MAX_LINES_PER_CUE).count();
        if crowded > 0 {
            warn!("{} entries have more than {} lines", crowded, MAX_LINES_PER_CUE);
        }

        // Renumber entries to ensure sequential order
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }

        Ok(entries)
    }

    /// Parse a `start --> end` line
    fn parse_timing_line(line: &str, line_number: usize) -> std::result::Result<(i64, i64), SubtitleError> {
        let invalid = || SubtitleError::InvalidTimestamp {
            line: line_number,
            content: line.to_string(),
        };

        let caps = TIMESTAMP_REGEX.captures(line).ok_or_else(invalid)?;
        let start = parse_timestamp(&caps[1]).map_err(|_| invalid())?;
        let end = parse_timestamp(&caps[2]).map_err(|_| invalid())?;

        Ok((start, end))
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Digest: {}", self.digest)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}

/// Hex SHA-256 of subtitle content, used to identify inputs in logs and reports
pub fn content_digest(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}
