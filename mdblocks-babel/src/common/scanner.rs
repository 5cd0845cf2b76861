//! Extended inline syntax the CommonMark grammar does not know about.
//!
//! Three delimiter pairs are recognized inside literal text:
//!
//! - `==text==` becomes a highlight mark
//! - `^text^` becomes a superscript mark
//! - `~text~` (a single tilde, never `~~`) becomes a subscript mark
//!
//! Scanning is a single left-to-right pass. At each position the first syntax
//! that matches wins and scanning resumes after the consumed span. Delimiters
//! that do not find their partner are kept as literal text. Superscript and
//! subscript runs may not contain whitespace: hitting a space or a newline
//! before the closing delimiter abandons the match.
//!
//! The pass works over a char slice plus a mask telling which chars came from
//! literal text. Masked-out chars (code spans, footnote labels) never act as
//! delimiters but may sit inside a delimited run, so `==a `b` c==` highlights
//! across the code span. [`scan`] is the plain-text entry point where every
//! char is eligible.

use crate::model::{Mark, MarkType};

/// Outcome of scanning one text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// The input with recognized delimiters removed.
    pub text: String,
    /// Marks over `text`, in post-strip offsets.
    pub marks: Vec<Mark>,
    /// Number of input chars consumed (the whole run).
    pub consumed: usize,
}

/// Delimiters found in a run, in input coordinates.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Delimiters {
    /// Sorted positions of delimiter chars to strip.
    pub removed: Vec<usize>,
    /// `(kind, start, end)` of each delimited run's inner text.
    pub spans: Vec<(MarkType, usize, usize)>,
}

impl Delimiters {
    /// Maps an input offset to its offset once delimiters are stripped.
    pub fn map_offset(&self, offset: usize) -> usize {
        offset - self.removed.partition_point(|&r| r < offset)
    }

    /// Spans as marks in post-strip offsets.
    pub fn marks(&self) -> Vec<Mark> {
        self.spans
            .iter()
            .map(|&(kind, start, end)| Mark::new(kind, self.map_offset(start), self.map_offset(end)))
            .collect()
    }

    /// The input with delimiter chars dropped.
    pub fn strip(&self, chars: &[char]) -> String {
        let mut removed = self.removed.iter().peekable();
        let mut out = String::with_capacity(chars.len());
        for (i, c) in chars.iter().enumerate() {
            if removed.peek() == Some(&&i) {
                removed.next();
                continue;
            }
            out.push(*c);
        }
        out
    }
}

/// Scans a plain text run.
pub fn scan(input: &str) -> ScanResult {
    let chars: Vec<char> = input.chars().collect();
    let eligible = vec![true; chars.len()];
    let found = find_delimiters(&chars, &eligible);
    ScanResult {
        text: found.strip(&chars),
        marks: found.marks(),
        consumed: chars.len(),
    }
}

pub(crate) fn find_delimiters(chars: &[char], eligible: &[bool]) -> Delimiters {
    let mut found = Delimiters::default();
    let is = |i: usize, c: char| i < chars.len() && eligible[i] && chars[i] == c;

    let mut i = 0;
    while i < chars.len() {
        if !eligible[i] {
            i += 1;
            continue;
        }
        match chars[i] {
            '=' if is(i + 1, '=') => {
                if is(i + 2, '=') || i + 2 >= chars.len() {
                    i = skip_run(chars, i, '=');
                    continue;
                }
                match find_highlight_close(chars, eligible, i + 2) {
                    Some(close) => {
                        found.removed.extend([i, i + 1, close, close + 1]);
                        found.spans.push((MarkType::Highlight, i + 2, close));
                        i = close + 2;
                    }
                    None => i += 2,
                }
            }
            '^' if i == 0 || chars[i - 1] != '\\' => {
                match find_short_close(chars, eligible, i + 1, '^') {
                    Some(close) if close > i + 1 => {
                        found.removed.extend([i, close]);
                        found.spans.push((MarkType::Superscript, i + 1, close));
                        i = close + 1;
                    }
                    Some(close) => i = close + 1,
                    None => i += 1,
                }
            }
            '~' => {
                if is(i + 1, '~') {
                    i = skip_run(chars, i, '~');
                    continue;
                }
                match find_short_close(chars, eligible, i + 1, '~') {
                    Some(close) if close > i + 1 => {
                        found.removed.extend([i, close]);
                        found.spans.push((MarkType::Subscript, i + 1, close));
                        i = close + 1;
                    }
                    Some(close) => i = close + 1,
                    None => i += 1,
                }
            }
            _ => i += 1,
        }
    }
    found
}

fn skip_run(chars: &[char], mut i: usize, c: char) -> usize {
    while i < chars.len() && chars[i] == c {
        i += 1;
    }
    i
}

/// Finds the next eligible `==` at or after `from`, leaving a non-empty run.
fn find_highlight_close(chars: &[char], eligible: &[bool], from: usize) -> Option<usize> {
    (from + 1..chars.len().saturating_sub(1)).find(|&j| {
        chars[j] == '=' && chars[j + 1] == '=' && eligible[j] && eligible[j + 1]
    })
}

/// Finds the closing `^` or `~`, giving up at whitespace.
fn find_short_close(chars: &[char], eligible: &[bool], from: usize, delim: char) -> Option<usize> {
    for j in from..chars.len() {
        let c = chars[j];
        if c.is_whitespace() {
            return None;
        }
        if c == delim && eligible[j] {
            if delim == '~' && chars.get(j + 1) == Some(&'~') {
                return None;
            }
            return Some(j);
        }
    }
    None
}
