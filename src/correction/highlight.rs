use std::ops::Range;

// @struct: Sorted, non-overlapping byte intervals over one line of text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanSet {
    spans: Vec<Range<usize>>,
}

impl SpanSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interval, merging it with any interval it overlaps or touches
    pub fn insert(&mut self, span: Range<usize>) {
        if span.start >= span.end {
            return;
        }

        let mut merged = span;
        let mut kept = Vec::with_capacity(self.spans.len() + 1);
        for existing in self.spans.drain(..) {
            if existing.end < merged.start || existing.start > merged.end {
                kept.push(existing);
            } else {
                merged = merged.start.min(existing.start)..merged.end.max(existing.end);
            }
        }

        let at = kept.partition_point(|s| s.start < merged.start);
        kept.insert(at, merged);
        self.spans = kept;
    }

    /// Account for `range` having been replaced by `new_len` bytes.
    ///
    /// Spans after the edit shift by the length delta; spans touching it
    /// are folded into the rewritten region.
    pub fn splice(&mut self, range: Range<usize>, new_len: usize) {
        let new_end = range.start + new_len;
        let mut rewritten = range.start..new_end;
        let mut kept = Vec::with_capacity(self.spans.len());

        for span in self.spans.drain(..) {
            if span.end <= range.start {
                kept.push(span);
            } else if span.start >= range.end {
                let shifted_start = span.start - range.end + new_end;
                kept.push(shifted_start..shifted_start + span.len());
            } else {
                let start = span.start.min(rewritten.start);
                let end = if span.end > range.end {
                    span.end - range.end + new_end
                } else {
                    new_end
                };
                rewritten = start..end.max(rewritten.end);
            }
        }

        self.spans = kept;
        if rewritten.start < rewritten.end {
            self.insert(rewritten);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Range<usize>> {
        self.spans.iter()
    }

    /// Wrap every span of `text` with `open` and `close`
    pub fn render(&self, text: &str, open: &str, close: &str) -> String {
        let mut out = String::with_capacity(text.len() + self.spans.len() * (open.len() + close.len()));
        let mut cursor = 0;

        for span in &self.spans {
            let (Some(before), Some(inner)) = (text.get(cursor..span.start), text.get(span.clone())) else {
                break;
            };
            out.push_str(before);
            out.push_str(open);
            out.push_str(inner);
            out.push_str(close);
            cursor = span.end;
        }

        out.push_str(text.get(cursor..).unwrap_or_default());
        out
    }
}
