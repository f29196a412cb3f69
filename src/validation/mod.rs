/*!
 * Validation of retimed output.
 *
 * - `timecodes`: per-cue timing checks (reading speed, duration floor,
 *   overlap, drift from the authored start)
 */

pub mod timecodes;

// Re-export main types
pub use timecodes::{TimecodeIssue, TimecodeValidationResult, TimecodeValidator, TimecodeValidatorConfig};
