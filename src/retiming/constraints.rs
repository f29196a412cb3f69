/*!
 * Constraint queries over a timeline.
 *
 * Nothing here mutates; strategies consult these before and after each pass
 * to decide what still needs fixing.
 */

use super::cue::{Cue, Timeline};

/// Duration (floored) that brings a cue exactly to the target speed
pub fn needed_time(cue: &Cue, target_cps: f64) -> i64 {
    (cue.characters() as f64 * 1000.0 / target_cps).floor() as i64
}

/// Shortest duration (ceiled) that can never read faster than the target
pub fn target_duration(cue: &Cue, target_cps: f64) -> i64 {
    (cue.characters() as f64 * 1000.0 / target_cps).ceil() as i64
}

/// Time still missing to reach the target; negative when the cue has room to spare
pub fn missing_time(cue: &Cue, target_cps: f64) -> i64 {
    needed_time(cue, target_cps) - cue.duration_ms
}

/// Gap between the previous cue's end and this cue's start
pub fn idle_before(timeline: &Timeline, index: usize) -> Option<i64> {
    let current = timeline.get(index)?;
    let previous = timeline.previous(index)?;
    Some(current.start_ms - previous.end_ms)
}

/// Gap between this cue's end and the next cue's start
pub fn idle_after(timeline: &Timeline, index: usize) -> Option<i64> {
    let current = timeline.get(index)?;
    let next = timeline.next(index)?;
    Some(next.start_ms - current.end_ms)
}

/// Every index whose current speed exceeds the target, in timeline order
pub fn violating_set(timeline: &Timeline, target_cps: f64) -> Vec<usize> {
    timeline
        .iter()
        .enumerate()
        .filter(|(_, cue)| cue.speed > target_cps)
        .map(|(i, _)| i)
        .collect()
}

/// Narrow an earlier snapshot down to the indices that still exceed the target
pub fn still_violating(timeline: &Timeline, indices: &[usize], target_cps: f64) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&i| timeline.get(i).is_some_and(|cue| cue.speed > target_cps))
        .collect()
}

/// Spare duration a cue can give away without itself exceeding the target.
///
/// The pin point is the target duration, or the minimum duration when that is
/// larger. The result is negative when the cue is already below its pin point.
pub fn donor_gain(cue: &Cue, target_cps: f64, min_duration_ms: i64) -> i64 {
    let ideal = target_duration(cue, target_cps);
    if ideal > min_duration_ms {
        cue.duration_ms - ideal
    } else {
        cue.duration_ms - min_duration_ms
    }
}

/// Drift budget left for moving a cue earlier
pub fn budget_earlier(cue: &Cue, max_variation_ms: i64) -> i64 {
    max_variation_ms - (cue.start_original_ms() - cue.start_ms)
}

/// Drift budget left for moving a cue later
pub fn budget_later(cue: &Cue, max_variation_ms: i64) -> i64 {
    max_variation_ms - (cue.start_ms - cue.start_original_ms())
}

/// Indices of cues shorter than the legibility floor
pub fn under_min_duration(timeline: &Timeline, min_duration_ms: i64) -> Vec<usize> {
    timeline
        .iter()
        .enumerate()
        .filter(|(_, cue)| cue.duration_ms < min_duration_ms)
        .map(|(i, _)| i)
        .collect()
}
