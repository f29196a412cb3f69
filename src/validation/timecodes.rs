/*!
 * Timecode validation for retimed cues.
 *
 * This module checks that a timeline is:
 * - Logically consistent (start < end)
 * - Non-overlapping, with at least 1ms between consecutive cues
 * - Within the reading speed limit
 * - Above the duration floor
 *
 * Drift beyond the variation budget is reported too, but only as
 * information: idle-space absorption may legitimately exceed it.
 */

use log::debug;
use serde::Serialize;

use crate::app_config::RetimingConfig;
use crate::retiming::constraints::under_min_duration;
use crate::retiming::metrics::duration;
use crate::retiming::{Cue, Timeline};

/// Result of timecode validation for a single cue
#[derive(Debug, Clone, Serialize)]
pub struct TimecodeEntryResult {
    /// Sequence number of the cue
    pub seq_num: usize,
    /// Whether the cue passed validation
    pub passed: bool,
    /// Issues found
    pub issues: Vec<TimecodeIssue>,
}

impl TimecodeEntryResult {
    /// Create a passing result
    pub fn passed(seq_num: usize) -> Self {
        Self {
            seq_num,
            passed: true,
            issues: vec![],
        }
    }

    /// Create a failing result
    pub fn failed(seq_num: usize, issues: Vec<TimecodeIssue>) -> Self {
        Self {
            seq_num,
            passed: false,
            issues,
        }
    }
}

/// Types of timecode issues
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimecodeIssue {
    /// End is not after start
    InvalidTimeRange { start_ms: i64, end_ms: i64 },
    /// Duration is under the floor
    DurationTooShort { duration_ms: i64, min_duration_ms: i64 },
    /// Reading speed exceeds limit
    ReadingSpeedTooHigh { cps: f64, max_cps: f64 },
    /// Starts less than 1ms after the previous cue ends
    OverlapsWithEntry { other_seq_num: usize, overlap_ms: i64 },
    /// Start moved further than the variation budget (informational)
    DriftBeyondBudget { drift_ms: i64, max_variation_ms: i64 },
}

impl TimecodeIssue {
    /// Whether this issue fails the cue
    pub fn is_failure(&self) -> bool {
        !matches!(self, TimecodeIssue::DriftBeyondBudget { .. })
    }
}

impl std::fmt::Display for TimecodeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimecodeIssue::InvalidTimeRange { start_ms, end_ms } => {
                write!(f, "Invalid time range: end {}ms <= start {}ms", end_ms, start_ms)
            }
            TimecodeIssue::DurationTooShort { duration_ms, min_duration_ms } => {
                write!(f, "Duration too short: {}ms (min: {}ms)", duration_ms, min_duration_ms)
            }
            TimecodeIssue::ReadingSpeedTooHigh { cps, max_cps } => {
                write!(f, "Reading speed too high: {:.2} CPS (max: {:.2})", cps, max_cps)
            }
            TimecodeIssue::OverlapsWithEntry { other_seq_num, overlap_ms } => {
                write!(f, "Overlaps with entry {} by {}ms", other_seq_num, overlap_ms)
            }
            TimecodeIssue::DriftBeyondBudget { drift_ms, max_variation_ms } => {
                write!(f, "Start drifted {}ms (budget: {}ms)", drift_ms, max_variation_ms)
            }
        }
    }
}

/// Result of validating a whole timeline
#[derive(Debug, Clone, Serialize)]
pub struct TimecodeValidationResult {
    /// Overall pass/fail status
    pub passed: bool,
    /// Results for each cue
    pub entry_results: Vec<TimecodeEntryResult>,
    /// Total number of issues
    pub total_issues: usize,
    /// Number of overlapping pairs
    pub overlap_count: usize,
    /// Number of cues over the speed limit
    pub speed_count: usize,
    /// Number of cues under the duration floor
    pub short_count: usize,
    /// Number of cues drifted past the budget
    pub drift_count: usize,
}

impl TimecodeValidationResult {
    /// Get all failed cues
    pub fn failed_entries(&self) -> Vec<&TimecodeEntryResult> {
        self.entry_results.iter().filter(|r| !r.passed).collect()
    }
}

/// Configuration for timecode validation
#[derive(Debug, Clone)]
pub struct TimecodeValidatorConfig {
    /// Maximum characters per second
    pub max_cps: f64,
    /// Minimum cue duration in ms
    pub min_duration_ms: i64,
    /// Drift budget in ms
    pub max_variation_ms: i64,
    /// Whether to check for overlaps
    pub check_overlaps: bool,
}

impl Default for TimecodeValidatorConfig {
    fn default() -> Self {
        Self::from(&RetimingConfig::default())
    }
}

impl From<&RetimingConfig> for TimecodeValidatorConfig {
    fn from(config: &RetimingConfig) -> Self {
        Self {
            max_cps: config.target_cps,
            min_duration_ms: config.min_duration_ms,
            max_variation_ms: config.max_variation_ms,
            check_overlaps: true,
        }
    }
}

/// Timecode validator for timelines
pub struct TimecodeValidator {
    config: TimecodeValidatorConfig,
}

impl TimecodeValidator {
    /// Create a new validator with default configuration
    pub fn new() -> Self {
        Self {
            config: TimecodeValidatorConfig::default(),
        }
    }

    /// Create a new validator with custom configuration
    pub fn with_config(config: TimecodeValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a single cue on its own
    pub fn validate_cue(&self, cue: &Cue) -> TimecodeEntryResult {
        let mut issues = Vec::new();

        let duration_ms = duration(cue.start_ms, cue.end_ms);
        if duration_ms <= 0 {
            issues.push(TimecodeIssue::InvalidTimeRange {
                start_ms: cue.start_ms,
                end_ms: cue.end_ms,
            });
            // Can't do further validation with invalid times
            return TimecodeEntryResult::failed(cue.sequence, issues);
        }

        if duration_ms < self.config.min_duration_ms {
            issues.push(TimecodeIssue::DurationTooShort {
                duration_ms,
                min_duration_ms: self.config.min_duration_ms,
            });
        }

        if cue.speed > self.config.max_cps {
            issues.push(TimecodeIssue::ReadingSpeedTooHigh {
                cps: cue.speed,
                max_cps: self.config.max_cps,
            });
        }

        let drift_ms = cue.start_drift_ms();
        if drift_ms.abs() > self.config.max_variation_ms {
            issues.push(TimecodeIssue::DriftBeyondBudget {
                drift_ms,
                max_variation_ms: self.config.max_variation_ms,
            });
        }

        Self::result_for(cue.sequence, issues)
    }

    /// Validate every cue and every adjacent pair
    pub fn validate_timeline(&self, timeline: &Timeline) -> TimecodeValidationResult {
        let mut entry_results: Vec<TimecodeEntryResult> = timeline.iter().map(|c| self.validate_cue(c)).collect();

        let mut overlap_count = 0;

        if self.config.check_overlaps {
            for (i, pair) in timeline.cues().windows(2).enumerate() {
                let (current, next) = (&pair[0], &pair[1]);

                if current.end_ms + 1 > next.start_ms {
                    overlap_count += 1;

                    // Add issue to the later cue
                    if let Some(result) = entry_results.get_mut(i + 1) {
                        result.issues.push(TimecodeIssue::OverlapsWithEntry {
                            other_seq_num: current.sequence,
                            overlap_ms: current.end_ms + 1 - next.start_ms,
                        });
                        result.passed = false;
                    }
                }
            }
        }

        let count = |pred: fn(&TimecodeIssue) -> bool| -> usize {
            entry_results.iter().filter(|r| r.issues.iter().any(pred)).count()
        };
        let speed_count = count(|i| matches!(i, TimecodeIssue::ReadingSpeedTooHigh { .. }));
        let short_count = under_min_duration(timeline, self.config.min_duration_ms).len();
        let drift_count = count(|i| matches!(i, TimecodeIssue::DriftBeyondBudget { .. }));

        let total_issues: usize = entry_results.iter().map(|r| r.issues.len()).sum();
        let passed = entry_results.iter().all(|r| r.passed);

        debug!(
            "Timecode validation: {} cues, {} issues, {} overlaps",
            timeline.len(),
            total_issues,
            overlap_count
        );

        TimecodeValidationResult {
            passed,
            entry_results,
            total_issues,
            overlap_count,
            speed_count,
            short_count,
            drift_count,
        }
    }

    fn result_for(seq_num: usize, issues: Vec<TimecodeIssue>) -> TimecodeEntryResult {
        if issues.is_empty() {
            TimecodeEntryResult::passed(seq_num)
        } else if issues.iter().any(TimecodeIssue::is_failure) {
            TimecodeEntryResult::failed(seq_num, issues)
        } else {
            TimecodeEntryResult {
                seq_num,
                passed: true,
                issues,
            }
        }
    }
}

impl Default for TimecodeValidator {
    fn default() -> Self {
        Self::new()
    }
}
