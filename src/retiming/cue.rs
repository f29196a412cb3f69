/*!
 * Timeline model: cues with fixed original timing and derived metrics.
 */

use std::ops::{Index, IndexMut};

use super::metrics;

// @struct: Single timed subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: 1-based display order
    pub sequence: usize,

    // @field: Current start in ms
    pub start_ms: i64,

    // @field: Current end in ms
    pub end_ms: i64,

    start_original_ms: i64,
    end_original_ms: i64,
    characters: usize,
    lines: Vec<String>,

    // @field: Derived, end - start
    pub duration_ms: i64,

    // @field: Derived reading speed (cps, 2 decimals)
    pub speed: f64,
}

impl Cue {
    /// Create a cue; the given timing becomes the original timing.
    pub fn new(sequence: usize, start_ms: i64, end_ms: i64, lines: Vec<String>) -> Self {
        let characters = lines.iter().map(|line| visible_length(line)).sum();
        Self::with_characters(sequence, start_ms, end_ms, characters, lines)
    }

    /// Create a cue with an explicit character count
    pub fn with_characters(
        sequence: usize,
        start_ms: i64,
        end_ms: i64,
        characters: usize,
        lines: Vec<String>,
    ) -> Self {
        let mut cue = Cue {
            sequence,
            start_ms,
            end_ms,
            start_original_ms: start_ms,
            end_original_ms: end_ms,
            characters,
            lines,
            duration_ms: 0,
            speed: 0.0,
        };
        cue.refresh();
        cue
    }

    pub fn start_original_ms(&self) -> i64 {
        self.start_original_ms
    }

    pub fn end_original_ms(&self) -> i64 {
        self.end_original_ms
    }

    pub fn characters(&self) -> usize {
        self.characters
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Signed distance the start has moved from its authored position
    /// (positive = later).
    pub fn start_drift_ms(&self) -> i64 {
        self.start_ms - self.start_original_ms
    }

    /// Whether either boundary differs from the authored timing
    pub fn is_retimed(&self) -> bool {
        self.start_ms != self.start_original_ms || self.end_ms != self.end_original_ms
    }

    /// Recompute duration and speed from the current boundaries
    pub fn refresh(&mut self) {
        self.duration_ms = metrics::duration(self.start_ms, self.end_ms);
        self.speed = metrics::speed(self.duration_ms, self.characters);
    }

    /// Set the end from the start and a new duration, then refresh speed
    pub(crate) fn set_duration(&mut self, duration_ms: i64) {
        self.end_ms = self.start_ms + duration_ms;
        self.refresh();
    }

    /// Move both boundaries to a new start, keeping the duration
    pub(crate) fn shift_to(&mut self, start_ms: i64) {
        let duration_ms = self.duration_ms;
        self.start_ms = start_ms;
        self.end_ms = start_ms + duration_ms;
        self.refresh();
    }
}

/// Count the characters a viewer reads, skipping markup such as `<i>` or `{\an8}`.
pub fn visible_length(line: &str) -> usize {
    let mut count = 0;
    let mut closing: Option<char> = None;

    for ch in line.chars() {
        match closing {
            Some(close) if ch == close => closing = None,
            Some(_) => {}
            None => match ch {
                '<' => closing = Some('>'),
                '{' => closing = Some('}'),
                _ => count += 1,
            },
        }
    }

    count
}

/// Ordered, contiguous sequence of cues owned by one retiming run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    cues: Vec<Cue>,
}

impl Timeline {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Bounds-checked access; `None` at either edge of the timeline
    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Cue> {
        self.cues.get_mut(index)
    }

    /// Previous cue, if any
    pub fn previous(&self, index: usize) -> Option<&Cue> {
        index.checked_sub(1).and_then(|i| self.cues.get(i))
    }

    /// Next cue, if any
    pub fn next(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index + 1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn into_cues(self) -> Vec<Cue> {
        self.cues
    }

    /// Indices of the first adjacent pair violating the 1 ms separation, if any
    pub fn first_overlap(&self) -> Option<(usize, usize)> {
        self.cues
            .windows(2)
            .position(|pair| pair[0].end_ms + 1 > pair[1].start_ms)
            .map(|i| (i, i + 1))
    }
}

impl Index<usize> for Timeline {
    type Output = Cue;

    fn index(&self, index: usize) -> &Cue {
        &self.cues[index]
    }
}

impl IndexMut<usize> for Timeline {
    fn index_mut(&mut self, index: usize) -> &mut Cue {
        &mut self.cues[index]
    }
}

impl FromIterator<Cue> for Timeline {
    fn from_iter<I: IntoIterator<Item = Cue>>(iter: I) -> Self {
        Timeline::new(iter.into_iter().collect())
    }
}
