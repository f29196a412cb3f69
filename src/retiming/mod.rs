/*!
 * Reading-speed retiming engine.
 *
 * The engine stretches subtitle cues that read too fast (characters per
 * second above a target) while keeping two rules:
 * - cues never overlap: `end[i] + 1 <= start[i + 1]`
 * - cues moved to make room stay within a drift budget of their authored start
 *
 * # Architecture
 *
 * - `cue`: `Cue` and `Timeline`, the dense ordered model
 * - `metrics`: duration, CPS and timestamp formatting
 * - `constraints`: read-only queries (missing time, idle gaps, violators, donor gain)
 * - `mutators`: single-cue primitives (absorb idle space, shrink, bounded shifts)
 * - `propagation`: backward/forward passes reaching 1 to 3 cues away
 * - `strategies`: primary, alternating and legacy orchestrations plus `run`
 *
 * The engine is synchronous and performs no I/O. The timeline is borrowed
 * mutably for the whole run and modified in place.
 */

pub mod constraints;
pub mod cue;
pub mod metrics;
pub mod mutators;
pub mod propagation;
pub mod strategies;

// Re-export main types
pub use cue::{Cue, Timeline};
pub use propagation::PassLimits;
pub use strategies::{run, RetimeReport, FALLBACK_CPS};
