//! Flattens a nested inline tree into text plus offset-addressed marks.
//!
//! # The High-Level Concept
//!
//! Parsers hand us inline content as a tree: a strong node containing a link
//! containing text, and so on. The content model wants the opposite shape: one
//! string and a flat list of marks, each naming the `[from, to)` range it
//! covers. The [`ContentBuilder`] bridges the two. A parser walks its tree in
//! document order, appending text as it goes; a formatting node notes the
//! current length before recursing into its children and, once they are done,
//! records a mark from that remembered offset to the new length. The span of a
//! mark is therefore always the rendered length of its children, whatever they
//! contained.
//!
//! # The Algorithm
//!
//! 1. **Appending Text:**
//!    - Literal text is appended and flagged as eligible for the extended
//!      scanner
//!    - Verbatim text (code spans, footnote labels, line breaks) is appended
//!      but never scanned
//!
//! 2. **Recording Marks:**
//!    - `start()` returns the current length in chars
//!    - `mark(kind, start)` records a mark up to the current length
//!    - Empty spans are dropped
//!
//! 3. **Finishing:**
//!    - The extended scanner runs once over the whole text, so `==`, `^` and
//!      `~` pairs may enclose other inline nodes
//!    - Delimiter chars are stripped and every recorded mark is remapped
//!    - Marks are sorted by start offset, outer marks first
//!
//! The reverse direction lives in `flat_to_nested`.

use super::scanner;
use crate::model::{BlockContent, Mark, MarkAttrs, MarkType};

#[derive(Debug, Default)]
pub struct ContentBuilder {
    text: String,
    eligible: Vec<bool>,
    marks: Vec<Mark>,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length in chars.
    pub fn start(&self) -> usize {
        self.eligible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn push_text(&mut self, text: &str) {
        self.push(text, true);
    }

    pub fn push_verbatim(&mut self, text: &str) {
        self.push(text, false);
    }

    fn push(&mut self, text: &str, eligible: bool) {
        self.text.push_str(text);
        self.eligible.extend(text.chars().map(|_| eligible));
    }

    /// Records a mark from `start` to the current length.
    pub fn mark(&mut self, kind: MarkType, start: usize) {
        self.mark_with(kind, start, MarkAttrs::default());
    }

    pub fn mark_with(&mut self, kind: MarkType, start: usize, attrs: MarkAttrs) {
        let end = self.start();
        if start < end {
            self.marks.push(Mark {
                kind,
                from: start,
                to: end,
                attrs,
            });
        }
    }

    pub fn finish(self) -> BlockContent {
        let chars: Vec<char> = self.text.chars().collect();
        let found = scanner::find_delimiters(&chars, &self.eligible);

        let (text, mut marks) = if found.removed.is_empty() {
            (self.text, self.marks)
        } else {
            let mut marks: Vec<Mark> = self
                .marks
                .into_iter()
                .filter_map(|mark| {
                    let from = found.map_offset(mark.from);
                    let to = found.map_offset(mark.to);
                    (from < to).then_some(Mark { from, to, ..mark })
                })
                .collect();
            marks.extend(found.marks());
            (found.strip(&chars), marks)
        };

        sort_marks(&mut marks);
        BlockContent { text, marks }
    }
}

/// Orders marks by start, wider spans first, then by nesting priority.
pub fn sort_marks(marks: &mut [Mark]) {
    marks.sort_by(|a, b| {
        a.from
            .cmp(&b.from)
            .then(b.to.cmp(&a.to))
            .then(a.kind.priority().cmp(&b.kind.priority()))
    });
}
