/*!
 * Primitive mutators. Each one changes the boundaries of exactly one cue and
 * refreshes its duration and speed before returning.
 *
 * Idle absorption only reclaims unused time, so it ignores the drift budget.
 * The `move_*` shifts are what cascade through a chain, and they are the only
 * operations bounded by `max_variation_ms`.
 */

use log::trace;

use super::constraints::{budget_earlier, budget_later, idle_after, idle_before, missing_time, needed_time};
use super::cue::{Cue, Timeline};

/// Set the duration to exactly what the target speed needs
pub fn clamp_to_speed(cue: &mut Cue, target_cps: f64) {
    let needed = needed_time(cue, target_cps);
    cue.set_duration(needed);
}

/// Cut `amount_ms` from the end of the cue
pub fn shrink(cue: &mut Cue, amount_ms: i64) {
    let duration = cue.duration_ms - amount_ms;
    cue.set_duration(duration);
}

/// Extend the start into the idle space before the cue.
///
/// Returns the milliseconds reclaimed. A cue that already meets the target is
/// left alone.
pub fn absorb_before(timeline: &mut Timeline, index: usize, target_cps: f64) -> i64 {
    let Some(cue) = timeline.get(index) else {
        return 0;
    };
    let missing = missing_time(cue, target_cps);
    reclaim_before(timeline, index, missing)
}

/// Extend the start by up to `missing` ms of the idle space before the cue.
pub fn reclaim_before(timeline: &mut Timeline, index: usize, missing: i64) -> i64 {
    let Some(cue) = timeline.get(index) else {
        return 0;
    };
    if missing <= 0 {
        return 0;
    }

    let old_start = cue.start_ms;
    let new_start = match (idle_before(timeline, index), timeline.previous(index)) {
        (Some(idle), Some(previous)) if idle <= missing => previous.end_ms + 1,
        (Some(_), Some(_)) => old_start - missing,
        _ => (old_start - missing).max(0),
    };

    let cue = &mut timeline[index];
    cue.start_ms = new_start;
    cue.refresh();

    let reclaimed = old_start - new_start;
    trace!("cue {}: absorbed {}ms before", cue.sequence, reclaimed);
    reclaimed
}

/// Extend the end into the idle space after the cue.
///
/// The last cue has nothing after it and is granted the full missing time.
pub fn absorb_after(timeline: &mut Timeline, index: usize, target_cps: f64) -> i64 {
    let Some(cue) = timeline.get(index) else {
        return 0;
    };
    let missing = missing_time(cue, target_cps);
    reclaim_after(timeline, index, missing)
}

/// Extend the end by up to `missing` ms of the idle space after the cue.
pub fn reclaim_after(timeline: &mut Timeline, index: usize, missing: i64) -> i64 {
    let Some(cue) = timeline.get(index) else {
        return 0;
    };
    if missing <= 0 {
        return 0;
    }

    let old_end = cue.end_ms;
    let new_end = match (idle_after(timeline, index), timeline.next(index)) {
        (Some(idle), Some(next)) if idle <= missing => next.start_ms - 1,
        _ => old_end + missing,
    };

    let cue = &mut timeline[index];
    cue.end_ms = new_end;
    cue.refresh();

    let reclaimed = new_end - old_end;
    trace!("cue {}: absorbed {}ms after", cue.sequence, reclaimed);
    reclaimed
}

/// Shift a whole cue earlier, limited by its drift budget and its predecessor.
pub fn move_earlier(timeline: &mut Timeline, index: usize, amount_ms: i64, max_variation_ms: i64) {
    let Some(cue) = timeline.get(index) else {
        return;
    };
    let budget = budget_earlier(cue, max_variation_ms);
    if amount_ms <= 0 || budget <= 0 {
        return;
    }

    let move_by = amount_ms.min(budget);
    let new_start = match timeline.previous(index) {
        Some(previous) if cue.start_ms - move_by <= previous.end_ms => previous.end_ms + 1,
        Some(_) => cue.start_ms - move_by,
        None => (cue.start_ms - move_by).max(0),
    };

    let cue = &mut timeline[index];
    trace!("cue {}: moved {}ms earlier", cue.sequence, cue.start_ms - new_start);
    cue.shift_to(new_start);
}

/// Shift a whole cue later, limited by its drift budget and its successor.
///
/// When the full move would run into the successor, the cue only advances
/// through the idle gap, stopping 1 ms short of the next start.
pub fn move_later(timeline: &mut Timeline, index: usize, amount_ms: i64, max_variation_ms: i64) {
    let Some(cue) = timeline.get(index) else {
        return;
    };
    let budget = budget_later(cue, max_variation_ms);
    if amount_ms <= 0 || budget <= 0 {
        return;
    }

    let move_by = amount_ms.min(budget);
    let new_start = match (timeline.next(index), idle_after(timeline, index)) {
        (Some(next), Some(idle)) if cue.start_ms + move_by + cue.duration_ms >= next.start_ms => {
            cue.start_ms + (idle - 1).max(0)
        }
        _ => cue.start_ms + move_by,
    };

    let cue = &mut timeline[index];
    trace!("cue {}: moved {}ms later", cue.sequence, new_start - cue.start_ms);
    cue.shift_to(new_start);
}
