/*!
 * Retiming strategies: fixed sequences of idle absorption and propagation
 * passes, closed by a looser fallback sweep.
 *
 * The violating set is a snapshot taken before each pass and narrowed after
 * it, so later passes see the effects of earlier ones.
 */

use log::{debug, info};
use serde::Serialize;

use crate::app_config::{RetimingConfig, Strategy};

use super::constraints::{still_violating, target_duration, violating_set};
use super::cue::Timeline;
use super::mutators::{absorb_after, absorb_before, reclaim_after, reclaim_before};
use super::propagation::{backward_movement, forward_movement, PassLimits, MAX_LEVEL};

/// Secondary reading-speed limit used by the final safety sweep
pub const FALLBACK_CPS: f64 = 18.0;

/// Outcome of one retiming run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetimeReport {
    /// Strategy that produced this report
    pub strategy: Strategy,
    /// Sequence numbers above the target before the run
    pub violations_before: Vec<usize>,
    /// Sequence numbers still above the target after the run
    pub violations_after: Vec<usize>,
    /// Sequence numbers still above the fallback limit after the run
    pub fallback_violations: Vec<usize>,
    /// Number of cues whose timing differs from the original
    pub retimed_cues: usize,
}

impl RetimeReport {
    /// Whether every cue now meets the target speed
    pub fn is_clean(&self) -> bool {
        self.violations_after.is_empty()
    }

    /// Number of violations the run removed
    pub fn resolved(&self) -> usize {
        self.violations_before.len().saturating_sub(self.violations_after.len())
    }
}

impl From<&RetimingConfig> for PassLimits {
    fn from(config: &RetimingConfig) -> Self {
        PassLimits {
            target_cps: config.target_cps,
            max_variation_ms: config.max_variation_ms,
            min_duration_ms: config.min_duration_ms,
        }
    }
}

/// Retime the timeline in place with the configured strategy.
pub fn run(timeline: &mut Timeline, config: &RetimingConfig) -> RetimeReport {
    let limits = PassLimits::from(config);
    let before = violating_set(timeline, config.target_cps);

    debug!(
        "Retiming {} cues with {} strategy: {} over {} cps",
        timeline.len(),
        config.strategy,
        before.len(),
        config.target_cps
    );

    match config.strategy {
        Strategy::Primary => run_primary(timeline, limits),
        Strategy::Alternating => run_alternating(timeline, limits),
        Strategy::Legacy => run_legacy(timeline, limits),
    }

    let after = violating_set(timeline, config.target_cps);
    let report = RetimeReport {
        strategy: config.strategy.clone(),
        violations_before: sequences(timeline, &before),
        violations_after: sequences(timeline, &after),
        fallback_violations: sequences(timeline, &violating_set(timeline, FALLBACK_CPS)),
        retimed_cues: timeline.iter().filter(|cue| cue.is_retimed()).count(),
    };

    info!(
        "Retimed {} cues, {} of {} violations resolved",
        report.retimed_cues,
        report.resolved(),
        report.violations_before.len()
    );
    report
}

/// All backward levels, then all forward levels.
pub fn run_primary(timeline: &mut Timeline, limits: PassLimits) {
    let mut violating = absorb_idle(timeline, limits.target_cps);

    for level in 1..=MAX_LEVEL {
        backward_movement(timeline, &violating, limits, level);
        violating = narrow(timeline, &violating, limits, "backward", level);
    }
    for level in 1..=MAX_LEVEL {
        forward_movement(timeline, &violating, limits, level);
        violating = narrow(timeline, &violating, limits, "forward", level);
    }

    fallback_sweep(timeline);
}

/// Forward then backward at each level before reaching further.
pub fn run_alternating(timeline: &mut Timeline, limits: PassLimits) {
    let mut violating = absorb_idle(timeline, limits.target_cps);

    for level in 1..=MAX_LEVEL {
        forward_movement(timeline, &violating, limits, level);
        violating = narrow(timeline, &violating, limits, "forward", level);
        backward_movement(timeline, &violating, limits, level);
        violating = narrow(timeline, &violating, limits, "backward", level);
    }

    fallback_sweep(timeline);
}

/// Idle absorption, level-1 backward donation and the fallback sweep.
///
/// Levels 2 and 3 are deliberately absent from this strategy; chains that
/// need a relay through intermediate cues stay unresolved here.
pub fn run_legacy(timeline: &mut Timeline, limits: PassLimits) {
    let violating = absorb_idle(timeline, limits.target_cps);

    backward_movement(timeline, &violating, limits, 1);
    narrow(timeline, &violating, limits, "backward", 1);

    fallback_sweep(timeline);
}

/// Last resort at `FALLBACK_CPS`: soak up idle space after, then before,
/// every cue still reading faster than the fallback limit.
///
/// The sweep aims at the ceiled duration, so a cue with enough idle space
/// always ends at or below the limit.
pub fn fallback_sweep(timeline: &mut Timeline) {
    let violating = violating_set(timeline, FALLBACK_CPS);
    for &index in &violating {
        let shortfall = fallback_shortfall(timeline, index);
        reclaim_after(timeline, index, shortfall);
    }

    let violating = still_violating(timeline, &violating, FALLBACK_CPS);
    for &index in &violating {
        let shortfall = fallback_shortfall(timeline, index);
        reclaim_before(timeline, index, shortfall);
    }

    let remaining = still_violating(timeline, &violating, FALLBACK_CPS);
    debug!("fallback sweep: {} cues still over {} cps", remaining.len(), FALLBACK_CPS);
}

fn fallback_shortfall(timeline: &Timeline, index: usize) -> i64 {
    timeline
        .get(index)
        .map_or(0, |cue| target_duration(cue, FALLBACK_CPS) - cue.duration_ms)
}

/// Absorb idle space before, then after, every initially violating cue.
fn absorb_idle(timeline: &mut Timeline, target_cps: f64) -> Vec<usize> {
    let violating = violating_set(timeline, target_cps);
    for &index in &violating {
        absorb_before(timeline, index, target_cps);
    }

    let violating = still_violating(timeline, &violating, target_cps);
    for &index in &violating {
        absorb_after(timeline, index, target_cps);
    }

    let violating = still_violating(timeline, &violating, target_cps);
    debug!("idle absorption: {} cues still over {} cps", violating.len(), target_cps);
    violating
}

fn narrow(timeline: &Timeline, violating: &[usize], limits: PassLimits, direction: &str, level: usize) -> Vec<usize> {
    let remaining = still_violating(timeline, violating, limits.target_cps);
    debug!(
        "{} level {}: {} cues still over {} cps",
        direction,
        level,
        remaining.len(),
        limits.target_cps
    );
    remaining
}

fn sequences(timeline: &Timeline, indices: &[usize]) -> Vec<usize> {
    indices.iter().filter_map(|&i| timeline.get(i)).map(|cue| cue.sequence).collect()
}
