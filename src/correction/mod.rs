/*!
 * Rule-based text correction.
 *
 * Cue lines are run through an ordered list of find/replace rules before
 * retiming, so the character counts the engine sees are the corrected ones.
 * Regex rules run first, then literal rules; each rule sees the output of the
 * previous one and replaces only its first match.
 *
 * Every correction records two highlight sets: where matches sat in the
 * original line and where replacements sit in the final line.
 */

pub mod highlight;
pub mod rules;

use std::ops::Range;
use std::path::Path;

use log::trace;
use regex::{Regex, RegexBuilder};

use crate::errors::CorrectionError;

pub use highlight::SpanSet;
pub use rules::{Rule, RuleSet};

/// Result of correcting one line
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// Corrected text
    pub text: String,
    /// Matched text within the original line
    pub found: SpanSet,
    /// Replacement text within the corrected line
    pub replaced: SpanSet,
}

impl Correction {
    pub fn changed(&self) -> bool {
        !self.replaced.is_empty()
    }
}

#[derive(Debug, Clone)]
enum RuleKind {
    Regex,
    Literal { whole_word: bool, preserve_case: bool },
}

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Regex,
    replace: String,
    kind: RuleKind,
}

/// Compiled, ready-to-apply rule list
#[derive(Debug, Clone)]
pub struct Corrector {
    rules: Vec<CompiledRule>,
}

impl Corrector {
    /// Compile every enabled rule
    pub fn new(rules: &RuleSet) -> Result<Self, CorrectionError> {
        let mut compiled = Vec::with_capacity(rules.active_count());

        for rule in rules.regex.iter().filter(|r| !r.is_disabled()) {
            compiled.push(CompiledRule {
                pattern: compile(&rule.find, &rule.find, true)?,
                replace: rule.replace.clone(),
                kind: RuleKind::Regex,
            });
        }

        for rule in rules.string.iter().filter(|r| !r.is_disabled()) {
            compiled.push(CompiledRule {
                pattern: compile(&regex::escape(&rule.find), &rule.find, rule.case_sensitive)?,
                replace: rule.replace.clone(),
                kind: RuleKind::Literal {
                    whole_word: rule.whole_word,
                    preserve_case: rule.preserve_case,
                },
            });
        }

        Ok(Corrector { rules: compiled })
    }

    /// Load and compile a rules file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CorrectionError> {
        Self::new(&RuleSet::from_file(path)?)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule to one line
    pub fn correct(&self, line: &str) -> Correction {
        let mut text = line.to_string();
        let mut found = SpanSet::new();
        let mut replaced = SpanSet::new();

        for rule in &self.rules {
            let Some((range, replacement)) = rule.first_replacement(&text) else {
                continue;
            };

            if let Some(original) = find_case_insensitive(line, &text[range.clone()]) {
                found.insert(original);
            }

            trace!("correction: '{}' -> '{}'", &text[range.clone()], replacement);
            text.replace_range(range.clone(), &replacement);
            replaced.splice(range, replacement.len());
        }

        Correction { text, found, replaced }
    }
}

impl CompiledRule {
    /// Matched byte range and its replacement text
    fn first_replacement(&self, text: &str) -> Option<(Range<usize>, String)> {
        match self.kind {
            RuleKind::Regex => {
                let caps = self.pattern.captures(text)?;
                let matched = caps.get(0)?;
                let mut expanded = String::new();
                caps.expand(&self.replace, &mut expanded);
                Some((matched.range(), expanded))
            }
            RuleKind::Literal { whole_word, preserve_case } => {
                let range = self.first_literal_match(text, whole_word)?;
                let replacement = if preserve_case {
                    match_first_letter_case(&self.replace, starts_with_upper(&text[range.clone()]))
                } else {
                    self.replace.clone()
                };
                Some((range, replacement))
            }
        }
    }

    fn first_literal_match(&self, text: &str, whole_word: bool) -> Option<Range<usize>> {
        let mut from = 0;
        while from <= text.len() {
            let m = self.pattern.find_at(text, from)?;
            if !whole_word || on_word_edges(text, m.range()) {
                return Some(m.range());
            }
            // retry one character further on
            from = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }
}

fn compile(pattern: &str, as_written: &str, case_sensitive: bool) -> Result<Regex, CorrectionError> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|source| CorrectionError::InvalidPattern {
            pattern: as_written.to_string(),
            source,
        })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A match is a whole word unless a word character continues it on either side
fn on_word_edges(text: &str, range: Range<usize>) -> bool {
    let inner = &text[range.clone()];
    let (Some(first), Some(last)) = (inner.chars().next(), inner.chars().next_back()) else {
        return false;
    };

    let before = text[..range.start].chars().next_back();
    let after = text[range.end..].chars().next();

    let left_ok = !(before.is_some_and(is_word_char) && is_word_char(first));
    let right_ok = !(after.is_some_and(is_word_char) && is_word_char(last));
    left_ok && right_ok
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()?
        .find(haystack)
        .map(|m| m.range())
}

fn starts_with_upper(text: &str) -> bool {
    text.chars().find(|c| c.is_alphabetic()).is_some_and(char::is_uppercase)
}

/// Give the first letter of `text` the requested case
fn match_first_letter_case(text: &str, upper: bool) -> String {
    let Some((at, letter)) = text.char_indices().find(|(_, c)| c.is_alphabetic()) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..at]);
    if upper {
        out.extend(letter.to_uppercase());
    } else {
        out.extend(letter.to_lowercase());
    }
    out.push_str(&text[at + letter.len_utf8()..]);
    out
}
