/*!
 * Tests for the retiming engine through its public API
 */

use subpace::app_config::{RetimingConfig, Strategy};
use subpace::retiming::constraints::{donor_gain, missing_time, needed_time, violating_set};
use subpace::retiming::metrics::{format_timestamp, speed};
use subpace::retiming::mutators::absorb_before;
use subpace::retiming::{run, Timeline, FALLBACK_CPS};
use crate::common::{cue, random_timeline};

fn config(target_cps: f64, max_variation_ms: i64, strategy: Strategy) -> RetimingConfig {
    RetimingConfig {
        target_cps,
        max_variation_ms,
        min_duration_ms: 500,
        strategy,
    }
}

const STRATEGIES: [Strategy; 3] = [Strategy::Primary, Strategy::Alternating, Strategy::Legacy];

#[test]
fn test_speed_withReferenceValues_shouldRoundToTwoDecimals() {
    assert_eq!(speed(1000, 20), 20.0);
    assert_eq!(speed(1333, 20), 15.0);
}

#[test]
fn test_formatTimestamp_withHoursMinutesSeconds_shouldPad() {
    assert_eq!(format_timestamp(3_723_420), "01:02:03,420");
}

#[test]
fn test_absorbBefore_withShortIdle_shouldLeaveCueStillViolating() {
    let mut timeline = Timeline::new(vec![cue(1, 0, 500, 5), cue(2, 1000, 2000, 40)]);

    assert_eq!(needed_time(&timeline[1], 17.0), 2352);
    assert_eq!(missing_time(&timeline[1], 17.0), 1352);

    absorb_before(&mut timeline, 1, 17.0);

    assert_eq!(timeline[1].start_ms, 501);
    assert_eq!(timeline[1].duration_ms, 1499);
    assert_eq!(timeline[1].speed, 26.68);
    assert_eq!(violating_set(&timeline, 17.0), vec![1]);
}

#[test]
fn test_donorGain_withTargetAboveFloor_shouldPinAtTargetDuration() {
    let donor = cue(1, 0, 3000, 30);

    assert_eq!(donor_gain(&donor, 17.0, 500), 1235);
}

#[test]
fn test_donorGain_withFloorAboveTarget_shouldPinAtFloor() {
    let donor = cue(1, 0, 3000, 5);

    assert_eq!(donor_gain(&donor, 17.0, 500), 2500);
}

/// Violator two cues after its only donor, middle cue already at the limit
fn level_two_chain() -> Timeline {
    Timeline::new(vec![
        cue(1, 0, 3000, 10),
        cue(2, 4000, 5000, 20),
        cue(3, 5001, 6001, 40),
        cue(4, 6002, 7002, 20),
    ])
}

#[test]
fn test_run_withLevelTwoChain_primaryShouldResolveWhereLegacyCannot() {
    let mut primary = level_two_chain();
    let mut legacy = level_two_chain();

    let primary_report = run(&mut primary, &config(20.0, 1000, Strategy::Primary));
    let legacy_report = run(&mut legacy, &config(20.0, 1000, Strategy::Legacy));

    assert!(primary_report.is_clean());
    assert_eq!(primary_report.violations_before, vec![3]);
    assert_eq!(legacy_report.violations_after, vec![3]);
    assert!(primary.first_overlap().is_none());
    assert!(legacy.first_overlap().is_none());
}

#[test]
fn test_run_withFirstCueViolating_shouldBorrowForwardWithinBudget() {
    let build = || Timeline::new(vec![cue(1, 0, 1000, 40), cue(2, 1001, 4001, 10)]);

    let mut generous = build();
    let report = run(&mut generous, &config(20.0, 1000, Strategy::Primary));
    assert!(report.is_clean());
    assert_eq!(generous[0].end_ms, 2000);
    assert_eq!(generous[1].start_ms, 2001);
    assert_eq!(generous[1].end_ms, 4001);

    // the donor may only slide 300ms, so the violator only gains 300ms
    let mut tight = build();
    let report = run(&mut tight, &config(20.0, 300, Strategy::Primary));
    assert_eq!(report.violations_after, vec![1]);
    assert_eq!(tight[1].start_ms, 1301);
    assert_eq!(tight[0].end_ms, 1300);
    assert_eq!(tight[0].speed, 30.77);
}

#[test]
fn test_run_withTargetAboveFallback_shouldStillSweepToEighteen() {
    let mut timeline = Timeline::new(vec![cue(1, 0, 1000, 22), cue(2, 6000, 7000, 36)]);

    let report = run(&mut timeline, &config(25.0, 300, Strategy::Primary));

    assert!(report.is_clean());
    assert!(report.fallback_violations.is_empty());
    assert!(timeline.iter().all(|c| c.speed <= FALLBACK_CPS));
    assert_eq!(timeline[1].end_ms, 7560);
}

#[test]
fn test_run_withNoViolations_shouldLeaveTimelineUntouched() {
    let mut timeline = Timeline::new(vec![cue(1, 0, 2000, 10), cue(2, 2001, 4000, 12)]);
    let before = timeline.clone();

    let report = run(&mut timeline, &config(17.0, 300, Strategy::Alternating));

    assert_eq!(timeline, before);
    assert_eq!(report.retimed_cues, 0);
    assert!(report.violations_before.is_empty());
}

#[test]
fn test_run_withEmptyTimeline_shouldReportNothing() {
    let mut timeline = Timeline::default();

    let report = run(&mut timeline, &config(17.0, 300, Strategy::Primary));

    assert!(report.is_clean());
    assert_eq!(report.retimed_cues, 0);
}

#[test]
fn test_run_onRandomTimelines_shouldNeverCreateOverlaps() {
    for seed in 0..40 {
        for strategy in STRATEGIES {
            for target in [12.0, 17.0, 21.0] {
                let mut timeline = random_timeline(seed, 60);
                assert!(timeline.first_overlap().is_none());

                run(&mut timeline, &config(target, 300, strategy.clone()));

                assert_eq!(
                    timeline.first_overlap(),
                    None,
                    "seed {} strategy {} target {}",
                    seed,
                    strategy,
                    target
                );
                assert!(timeline.iter().all(|c| c.duration_ms > 0));
            }
        }
    }
}

#[test]
fn test_run_onRandomTimelines_shouldKeepShiftedCuesWithinBudget() {
    for seed in 100..140 {
        for strategy in STRATEGIES {
            let max_variation = 250;
            let target = 17.0;
            let mut timeline = random_timeline(seed, 50);
            let initially_fast = violating_set(&timeline, target);

            run(&mut timeline, &config(target, max_variation, strategy.clone()));

            // cues that were never too fast only ever move through bounded shifts
            for (index, c) in timeline.iter().enumerate() {
                if !initially_fast.contains(&index) {
                    assert!(
                        c.start_drift_ms().abs() <= max_variation,
                        "seed {} strategy {} cue {} drifted {}ms",
                        seed,
                        strategy,
                        c.sequence,
                        c.start_drift_ms()
                    );
                }
            }
        }
    }
}

#[test]
fn test_run_twiceOnResolvedTimeline_shouldChangeNothing() {
    let mut chain = level_two_chain();
    let primary = config(20.0, 1000, Strategy::Primary);
    assert!(run(&mut chain, &primary).is_clean());
    let settled = chain.clone();

    run(&mut chain, &primary);
    assert_eq!(chain, settled);

    for seed in 200..230 {
        let retiming = config(17.0, 300, Strategy::Primary);
        let mut timeline = random_timeline(seed, 40);
        if !run(&mut timeline, &retiming).is_clean() {
            continue;
        }
        let settled = timeline.clone();

        run(&mut timeline, &retiming);

        assert_eq!(timeline, settled, "seed {}", seed);
    }
}

/// Violator whose only donor sits behind a middle cue already at the limit
fn pinned_middle_chain() -> Timeline {
    Timeline::new(vec![
        cue(1, 0, 5000, 10),
        cue(2, 5001, 6001, 20),
        cue(3, 6002, 7002, 40),
        cue(4, 7003, 8003, 20),
    ])
}

#[test]
fn test_run_withNoDriftBudget_shouldKeepDonorIntact() {
    for strategy in STRATEGIES {
        let retiming = config(20.0, 0, strategy.clone());
        let mut timeline = pinned_middle_chain();

        let report = run(&mut timeline, &retiming);

        // the middle cue cannot move, so nothing may be taken from the donor
        assert_eq!(report.violations_after, vec![3], "strategy {}", strategy);
        assert_eq!((timeline[0].start_ms, timeline[0].end_ms), (0, 5000), "strategy {}", strategy);
        assert_eq!((timeline[2].start_ms, timeline[2].end_ms), (6002, 7002), "strategy {}", strategy);
        assert!(timeline.first_overlap().is_none());
    }
}

#[test]
fn test_run_withTightDriftBudget_shouldDonateOnlyWhatReachesTheViolator() {
    let mut timeline = pinned_middle_chain();

    let report = run(&mut timeline, &config(20.0, 200, Strategy::Primary));

    assert_eq!(report.violations_after, vec![3]);
    assert_eq!(timeline[0].end_ms, 4800);
    assert_eq!(timeline[1].start_ms, 4801);
    // every donated millisecond ends up in the violator
    assert_eq!(timeline[2].start_ms, 5802);
    assert_eq!(timeline[2].end_ms, 7002);
}

#[test]
fn test_run_twiceWithResidualViolations_shouldChangeNothing() {
    for strategy in STRATEGIES {
        let retiming = config(20.0, 0, strategy.clone());
        let mut timeline = pinned_middle_chain();
        let first = run(&mut timeline, &retiming);
        let settled = timeline.clone();

        let second = run(&mut timeline, &retiming);

        assert_eq!(first.violations_after, second.violations_after, "strategy {}", strategy);
        assert!(!second.violations_after.is_empty());
        assert_eq!(timeline, settled, "strategy {}", strategy);
    }
}

#[test]
fn test_run_shouldPreserveOriginalTiming() {
    let mut timeline = level_two_chain();
    let originals: Vec<(i64, i64)> = timeline.iter().map(|c| (c.start_ms, c.end_ms)).collect();

    let report = run(&mut timeline, &config(20.0, 1000, Strategy::Primary));

    let kept: Vec<(i64, i64)> = timeline.iter().map(|c| (c.start_original_ms(), c.end_original_ms())).collect();
    assert_eq!(kept, originals);
    assert_eq!(report.retimed_cues, timeline.iter().filter(|c| c.is_retimed()).count());
}
