/*!
 * Propagation passes.
 *
 * For every violating cue a donor is looked up `level` positions away (1..=3).
 * Level 1 only touches the neighbour's duration. Levels 2 and 3 first relay
 * the donor's idle gap through the one or two cues in between ("space relay"),
 * then shrink the donor itself and cascade the shift through the chain
 * ("duration donation").
 */

use std::ops::Range;

use log::trace;

use super::constraints::{budget_earlier, budget_later, donor_gain, idle_after, idle_before, missing_time};
use super::cue::Timeline;
use super::mutators::{absorb_after, absorb_before, move_earlier, move_later, shrink};

/// Highest propagation distance the strategies use
pub const MAX_LEVEL: usize = 3;

/// Limits shared by every pass of one run
#[derive(Debug, Clone, Copy)]
pub struct PassLimits {
    pub target_cps: f64,
    pub max_variation_ms: i64,
    pub min_duration_ms: i64,
}

/// Borrow time for each violator from the cue `level` positions before it.
pub fn backward_movement(timeline: &mut Timeline, violating: &[usize], limits: PassLimits, level: usize) {
    for &index in violating {
        let Some(donor) = index.checked_sub(level) else {
            continue;
        };
        if timeline.get(donor).is_none() || timeline.get(index).is_none() {
            continue;
        }

        if level >= 2 {
            let free = idle_after(timeline, donor).unwrap_or(0);
            let missing = missing_time(&timeline[index], limits.target_cps);
            let room = chain_room(timeline, donor + 1..index, limits, Direction::Earlier);
            if let Some(relay) = relay_amount(free, missing.min(room)) {
                for between in donor + 1..index {
                    move_earlier(timeline, between, relay, limits.max_variation_ms);
                }
            }
            absorb_before(timeline, index, limits.target_cps);
        }

        let missing = missing_time(&timeline[index], limits.target_cps);
        let room = chain_room(timeline, donor + 1..index, limits, Direction::Earlier);
        let Some(donation) = donation_amount(timeline, donor, missing.min(room), limits) else {
            continue;
        };

        trace!(
            "cue {} donates {}ms to cue {} (level {})",
            timeline[donor].sequence, donation, timeline[index].sequence, level
        );
        shrink(&mut timeline[donor], donation);
        for between in donor + 1..index {
            move_earlier(timeline, between, donation, limits.max_variation_ms);
        }
        absorb_before(timeline, index, limits.target_cps);
    }
}

/// Borrow time for each violator from the cue `level` positions after it.
pub fn forward_movement(timeline: &mut Timeline, violating: &[usize], limits: PassLimits, level: usize) {
    for &index in violating {
        let donor = index + level;
        if timeline.get(donor).is_none() || timeline.get(index).is_none() {
            continue;
        }

        if level >= 2 {
            let free = idle_before(timeline, donor).unwrap_or(0);
            let missing = missing_time(&timeline[index], limits.target_cps);
            let room = chain_room(timeline, index + 1..donor, limits, Direction::Later);
            // nearest to the donor first, so each cue has room to move into
            if let Some(relay) = relay_amount(free, missing.min(room)) {
                for between in (index + 1..donor).rev() {
                    move_later(timeline, between, relay, limits.max_variation_ms);
                }
            }
            absorb_after(timeline, index, limits.target_cps);
        }

        let missing = missing_time(&timeline[index], limits.target_cps);
        let room = chain_room(timeline, index + 1..donor + 1, limits, Direction::Later);
        let Some(donation) = donation_amount(timeline, donor, missing.min(room), limits) else {
            continue;
        };

        trace!(
            "cue {} donates {}ms to cue {} (level {})",
            timeline[donor].sequence, donation, timeline[index].sequence, level
        );

        // Shrinking frees time after the donor; shifting the donor and every
        // cue before it later walks that time back to the violator.
        shrink(&mut timeline[donor], donation);
        for moved in (index + 1..=donor).rev() {
            move_later(timeline, moved, donation, limits.max_variation_ms);
        }
        absorb_after(timeline, index, limits.target_cps);
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Earlier,
    Later,
}

/// How far every cue in `chain` can still shift before one runs out of drift
/// budget. Time handed through the chain is capped by this, so a donor never
/// gives up duration the violator cannot receive.
fn chain_room(timeline: &Timeline, chain: Range<usize>, limits: PassLimits, direction: Direction) -> i64 {
    chain
        .filter_map(|i| timeline.get(i))
        .map(|cue| match direction {
            Direction::Earlier => budget_earlier(cue, limits.max_variation_ms),
            Direction::Later => budget_later(cue, limits.max_variation_ms),
        })
        .min()
        .unwrap_or(i64::MAX)
        .max(0)
}

/// Idle time to push through the chain: all that is missing when the gap covers
/// it, otherwise whatever gap exists beyond the mandatory 1 ms.
fn relay_amount(free: i64, missing: i64) -> Option<i64> {
    if free >= missing {
        Some(missing)
    } else if free > 1 {
        Some(free)
    } else {
        None
    }
}

/// How much a donor can hand over, if anything
fn donation_amount(timeline: &Timeline, donor: usize, missing: i64, limits: PassLimits) -> Option<i64> {
    if missing <= 0 {
        return None;
    }

    let donor_cue = timeline.get(donor)?;
    if donor_cue.speed >= limits.target_cps {
        return None;
    }

    let gain = donor_gain(donor_cue, limits.target_cps, limits.min_duration_ms);
    if gain <= 0 {
        return None;
    }

    Some(gain.min(missing))
}
