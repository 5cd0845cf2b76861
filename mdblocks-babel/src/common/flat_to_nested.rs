//! Re-nests flat, possibly overlapping marks into inline Markdown.
//!
//! # The High-Level Concept
//!
//! A block's marks are a flat list of ranges that may overlap in any way:
//! bold over `[1, 7)` and italic over `[3, 8)` is perfectly valid in the
//! content model but cannot be written as two properly nested delimiter pairs.
//! Markdown needs a tree. The writer derives one on the fly by turning every
//! mark into an open boundary and a close boundary and walking them in offset
//! order with a stack of open marks. Whenever a mark has to close while marks
//! opened after it are still open, those inner marks are closed first and
//! reopened right after, so the output is always properly nested:
//!
//! ```text
//! text:   ABCDEFGHIJ
//! bold:    [-----)        1..7
//! italic:    [----)       3..8
//! output: A**BC*DEFG***<em>H</em>IJ
//! ```
//!
//! # The Algorithm
//!
//! 1. **Normalization:**
//!    - Drop marks that are out of range or miss required attributes
//!    - Shrink bold, italic, strikethrough and highlight so they neither start
//!      nor end on whitespace
//!    - Merge touching or overlapping marks of the same delimiter type
//!    - Cut the text covered by footnote references: each becomes a single
//!      `[^id]` insertion point
//!
//! 2. **Boundaries:**
//!    - One open and one close boundary per mark, tagged with the mark's index
//!      so identical marks never get confused
//!    - Sorted by offset; at equal offsets closes come first, then footnote
//!      insertions, then opens
//!    - Opens at the same offset go outer first (lower priority), closes go
//!      inner first (higher priority)
//!
//! 3. **Walking:**
//!    - Text between boundaries is emitted, escaped unless inside a code span
//!    - Open: emit the opening delimiter and push. If a code span is open, it
//!      is closed around the new mark and reopened inside it, so no delimiter
//!      ever lands inside backticks
//!    - Close: marks above the target are closed innermost first, the target
//!      closes, and the popped marks that still have text ahead are reopened
//!      outermost first. Popped marks ending here are simply done
//!    - A reopened `*`/`_` delimiter that would grow a run of four or more
//!      switches to its HTML tag, as does a subscript touching a
//!      strikethrough, since those runs would be read back differently
//!
//! 4. **Completion:**
//!    - Anything left open is closed in stack order

use crate::model::{BlockContent, Content, LinkReferences, Mark, MarkType, SerializeOptions};
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

/// Renders block content as inline Markdown.
pub struct InlineWriter<'a> {
    options: &'a SerializeOptions,
    references: HashMap<(&'a str, Option<&'a str>), &'a str>,
}

impl<'a> InlineWriter<'a> {
    pub fn new(options: &'a SerializeOptions) -> Self {
        InlineWriter {
            options,
            references: HashMap::new(),
        }
    }

    /// Links whose target matches a definition are written reference-style
    /// when `link_references` is on.
    pub fn with_references(mut self, references: &'a LinkReferences) -> Self {
        if self.options.link_references {
            self.references = references
                .iter()
                .map(|(id, def)| ((def.url.as_str(), def.title.as_deref()), id.as_str()))
                .collect();
        }
        self
    }

    pub fn render(&self, content: &Content) -> String {
        match content {
            Content::Plain(text) => self.render_content(&BlockContent::plain(text.as_str())),
            Content::Rich(content) => self.render_content(content),
        }
    }

    pub fn render_content(&self, content: &BlockContent) -> String {
        let chars: Vec<char> = content.text.chars().collect();
        let marks = normalize_marks(&chars, &content.marks, self.options.footnotes);
        let (chars, marks, notes) = cut_footnotes(chars, marks);

        let html = marks
            .iter()
            .map(|mark| needs_html_form(&chars, &marks, mark))
            .collect();
        let mut walk = Walk {
            writer: self,
            chars: &chars,
            marks: &marks,
            out: String::with_capacity(chars.len() + 8),
            stack: Vec::new(),
            done: vec![false; marks.len()],
            html,
            line_start: true,
            line_escape: None,
        };

        let mut cursor = 0;
        for boundary in boundaries(&marks, &notes) {
            if boundary.offset > cursor {
                walk.text(cursor, boundary.offset);
                cursor = boundary.offset;
            }
            match boundary.kind {
                BoundaryKind::Close(id) => walk.close(id, boundary.offset),
                BoundaryKind::Insert(note) => walk.insert(&notes[note].1, boundary.offset),
                BoundaryKind::Open(id) => walk.open(id, boundary.offset),
            }
        }
        walk.text(cursor, chars.len());
        while let Some(id) = walk.stack.pop() {
            let close = walk.closing(id);
            walk.emit(&close);
        }
        walk.out
    }

    fn opening(&self, mark: &Mark, chars: &[char], html: bool) -> String {
        if html {
            if let Some(tag) = html_tag(mark.kind) {
                return format!("<{tag}>");
            }
        }
        match mark.kind {
            MarkType::Bold => self.options.strong_char.clone(),
            MarkType::Italic => self.options.emphasis_char.to_string(),
            MarkType::Strikethrough => "~~".to_string(),
            MarkType::Highlight => "==".to_string(),
            MarkType::Underline => "<u>".to_string(),
            MarkType::Subscript => "~".to_string(),
            MarkType::Superscript => "^".to_string(),
            MarkType::Link => "[".to_string(),
            MarkType::Code => {
                let (fence, pad) = code_fence(&chars[mark.from..mark.to]);
                format!("{fence}{}", if pad { " " } else { "" })
            }
            MarkType::FootnoteRef => String::new(),
        }
    }

    fn closing(&self, mark: &Mark, chars: &[char], html: bool) -> String {
        if html {
            if let Some(tag) = html_tag(mark.kind) {
                return format!("</{tag}>");
            }
        }
        match mark.kind {
            MarkType::Underline => "</u>".to_string(),
            MarkType::Link => {
                let href = mark.attrs.href.as_deref().unwrap_or_default();
                let title = mark.attrs.title.as_deref();
                if let Some(id) = self.references.get(&(href, title)) {
                    return format!("][{id}]");
                }
                match title {
                    Some(title) => format!("]({} \"{}\")", escape_href(href), escape_title(title)),
                    None => format!("]({})", escape_href(href)),
                }
            }
            MarkType::Code => {
                let (fence, pad) = code_fence(&chars[mark.from..mark.to]);
                format!("{}{fence}", if pad { " " } else { "" })
            }
            _ => self.opening(mark, chars, false),
        }
    }
}

struct Walk<'w, 'a> {
    writer: &'w InlineWriter<'a>,
    chars: &'w [char],
    marks: &'w [Mark],
    out: String,
    stack: Vec<usize>,
    done: Vec<bool>,
    html: Vec<bool>,
    line_start: bool,
    line_escape: Option<usize>,
}

impl Walk<'_, '_> {
    fn emit(&mut self, s: &str) {
        if !s.is_empty() {
            self.out.push_str(s);
            self.line_start = false;
        }
    }

    fn closing(&self, id: usize) -> String {
        self.writer.closing(&self.marks[id], self.chars, self.html[id])
    }

    /// Opening delimiter, switching emphasis to HTML when it would merge into
    /// the delimiter run just written.
    fn opening(&mut self, id: usize) -> String {
        let kind = self.marks[id].kind;
        if matches!(kind, MarkType::Bold | MarkType::Italic) && !self.html[id] {
            let delim = self.writer.opening(&self.marks[id], self.chars, false);
            if let Some(c) = delim.chars().next() {
                let run = self.out.chars().rev().take_while(|&t| t == c).count();
                if run > 0 && run + delim.chars().count() >= 4 {
                    self.html[id] = true;
                    return format!("<{}>", html_tag(kind).unwrap_or("em"));
                }
            }
            return delim;
        }
        self.writer.opening(&self.marks[id], self.chars, self.html[id])
    }

    fn in_code(&self) -> bool {
        self.stack
            .iter()
            .any(|&id| self.marks[id].kind == MarkType::Code)
    }

    fn text(&mut self, from: usize, to: usize) {
        let in_code = self.in_code();
        let options = self.writer.options;
        for i in from..to {
            let c = self.chars[i];
            if c == '\n' {
                if in_code {
                    self.out.push(' ');
                } else {
                    if !options.soft_breaks {
                        self.out.push('\\');
                    }
                    self.out.push('\n');
                    self.line_start = true;
                }
                continue;
            }
            if !in_code && options.escape_text {
                if self.line_start {
                    self.line_escape = line_start_escape(&self.chars[i..]).map(|k| i + k);
                }
                if self.line_escape == Some(i) || needs_escape(&self.chars[i..]) {
                    self.out.push('\\');
                }
            }
            self.out.push(c);
            self.line_start = false;
        }
    }

    /// Closes every mark from the first atomic one upwards, returning them
    /// outermost first.
    fn suspend_atomic(&mut self) -> Vec<usize> {
        let Some(pos) = self
            .stack
            .iter()
            .position(|&id| self.marks[id].kind.is_atomic())
        else {
            return Vec::new();
        };
        let suspended: Vec<usize> = self.stack.drain(pos..).collect();
        for &id in suspended.iter().rev() {
            let close = self.closing(id);
            self.emit(&close);
        }
        suspended
    }

    fn resume(&mut self, ids: Vec<usize>, offset: usize) {
        for id in ids {
            if self.marks[id].to > offset {
                let open = self.opening(id);
                self.emit(&open);
                self.stack.push(id);
            } else {
                self.done[id] = true;
            }
        }
    }

    fn open(&mut self, id: usize, offset: usize) {
        let suspended = self.suspend_atomic();
        let open = self.opening(id);
        self.emit(&open);
        self.stack.push(id);
        self.resume(suspended, offset);
    }

    fn insert(&mut self, raw: &str, offset: usize) {
        let suspended = self.suspend_atomic();
        self.emit(raw);
        self.resume(suspended, offset);
    }

    fn close(&mut self, id: usize, offset: usize) {
        if self.done[id] {
            return;
        }
        let Some(pos) = self.stack.iter().rposition(|&open| open == id) else {
            return;
        };
        let above: Vec<usize> = self.stack.drain(pos + 1..).collect();
        for &inner in above.iter().rev() {
            let close = self.closing(inner);
            self.emit(&close);
        }
        self.stack.pop();
        let close = self.closing(id);
        self.emit(&close);
        self.done[id] = true;
        self.resume(above, offset);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundaryKind {
    Close(usize),
    Insert(usize),
    Open(usize),
}

#[derive(Debug, Clone, Copy)]
struct Boundary {
    offset: usize,
    kind: BoundaryKind,
    priority: u8,
}

impl Boundary {
    fn rank(&self) -> u8 {
        match self.kind {
            BoundaryKind::Close(_) => 0,
            BoundaryKind::Insert(_) => 1,
            BoundaryKind::Open(_) => 2,
        }
    }

    fn cmp_order(&self, other: &Self) -> Ordering {
        self.offset
            .cmp(&other.offset)
            .then(self.rank().cmp(&other.rank()))
            .then_with(|| match (self.kind, other.kind) {
                (BoundaryKind::Open(a), BoundaryKind::Open(b)) => {
                    (self.priority, a).cmp(&(other.priority, b))
                }
                (BoundaryKind::Close(a), BoundaryKind::Close(b)) => {
                    (Reverse(self.priority), Reverse(a)).cmp(&(Reverse(other.priority), Reverse(b)))
                }
                (BoundaryKind::Insert(a), BoundaryKind::Insert(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            })
    }
}

fn boundaries(marks: &[Mark], notes: &[(usize, String)]) -> Vec<Boundary> {
    let mut all = Vec::with_capacity(marks.len() * 2 + notes.len());
    for (id, mark) in marks.iter().enumerate() {
        let priority = mark.kind.priority();
        all.push(Boundary {
            offset: mark.from,
            kind: BoundaryKind::Open(id),
            priority,
        });
        all.push(Boundary {
            offset: mark.to,
            kind: BoundaryKind::Close(id),
            priority,
        });
    }
    for (i, (offset, _)) in notes.iter().enumerate() {
        all.push(Boundary {
            offset: *offset,
            kind: BoundaryKind::Insert(i),
            priority: MarkType::FootnoteRef.priority(),
        });
    }
    all.sort_by(Boundary::cmp_order);
    all
}

fn is_delimiter_mark(kind: MarkType) -> bool {
    matches!(
        kind,
        MarkType::Bold | MarkType::Italic | MarkType::Strikethrough | MarkType::Highlight
    )
}

fn normalize_marks(chars: &[char], marks: &[Mark], footnotes: bool) -> Vec<Mark> {
    let mut out: Vec<Mark> = Vec::with_capacity(marks.len());
    for mark in marks {
        if !mark.is_valid(chars.len()) {
            continue;
        }
        if mark.kind == MarkType::FootnoteRef && !footnotes {
            continue;
        }
        let mut mark = mark.clone();
        if is_delimiter_mark(mark.kind) {
            while mark.from < mark.to && chars[mark.from].is_whitespace() {
                mark.from += 1;
            }
            while mark.to > mark.from && chars[mark.to - 1].is_whitespace() {
                mark.to -= 1;
            }
            if mark.from == mark.to {
                continue;
            }
        }
        out.push(mark);
    }

    out.sort_by_key(|m| (m.kind, m.from, m.to));
    let mut merged: Vec<Mark> = Vec::with_capacity(out.len());
    for mark in out {
        if let Some(last) = merged.last_mut() {
            let mergeable = !matches!(mark.kind, MarkType::Link | MarkType::FootnoteRef);
            if mergeable && last.kind == mark.kind && mark.from <= last.to {
                last.to = last.to.max(mark.to);
                continue;
            }
        }
        merged.push(mark);
    }
    merged.sort_by_key(|m| (m.from, Reverse(m.to), m.kind.priority()));
    merged
}

/// Removes text covered by footnote references and remaps the other marks.
/// Returns the remaining chars, marks and `(offset, "[^id]")` insertions.
fn cut_footnotes(chars: Vec<char>, marks: Vec<Mark>) -> (Vec<char>, Vec<Mark>, Vec<(usize, String)>) {
    let (refs, marks): (Vec<Mark>, Vec<Mark>) = marks
        .into_iter()
        .partition(|m| m.kind == MarkType::FootnoteRef);
    if refs.is_empty() {
        return (chars, marks, Vec::new());
    }

    let mut hidden = vec![false; chars.len()];
    let mut notes = Vec::new();
    let mut covered_to = 0;
    for note in &refs {
        if note.from < covered_to {
            continue;
        }
        hidden[note.from..note.to].iter_mut().for_each(|h| *h = true);
        covered_to = note.to;
        let id = note.attrs.footnote_id.as_deref().unwrap_or_default();
        notes.push((note.from, format!("[^{id}]")));
    }

    let mut shift = Vec::with_capacity(chars.len() + 1);
    let mut removed = 0;
    for &h in &hidden {
        shift.push(removed);
        if h {
            removed += 1;
        }
    }
    shift.push(removed);
    let map = |offset: usize| offset - shift[offset];

    let kept: Vec<char> = chars
        .into_iter()
        .zip(&hidden)
        .filter(|(_, h)| !**h)
        .map(|(c, _)| c)
        .collect();
    let marks = marks
        .into_iter()
        .filter_map(|m| {
            let (from, to) = (map(m.from), map(m.to));
            (from < to).then_some(Mark { from, to, ..m })
        })
        .collect();
    let notes = notes.into_iter().map(|(offset, raw)| (map(offset), raw)).collect();
    (kept, marks, notes)
}

fn has_whitespace(chars: &[char], mark: &Mark) -> bool {
    chars[mark.from..mark.to].iter().any(|c| c.is_whitespace())
}

fn html_tag(kind: MarkType) -> Option<&'static str> {
    match kind {
        MarkType::Bold => Some("strong"),
        MarkType::Italic => Some("em"),
        MarkType::Strikethrough => Some("del"),
        MarkType::Highlight => Some("mark"),
        MarkType::Subscript => Some("sub"),
        MarkType::Superscript => Some("sup"),
        MarkType::Underline => Some("u"),
        _ => None,
    }
}

/// Sub/superscript cannot carry whitespace in their short form, and a `~`
/// touching a `~~` would be read as one run.
fn needs_html_form(chars: &[char], marks: &[Mark], mark: &Mark) -> bool {
    match mark.kind {
        MarkType::Superscript => has_whitespace(chars, mark),
        MarkType::Subscript => {
            has_whitespace(chars, mark)
                || marks.iter().any(|other| {
                    other.kind == MarkType::Strikethrough
                        && [other.from, other.to].iter().any(|p| *p == mark.from || *p == mark.to)
                })
        }
        _ => false,
    }
}

/// Backtick fence for a code span and whether it needs space padding.
fn code_fence(text: &[char]) -> (String, bool) {
    let mut longest = 0;
    let mut run = 0;
    for &c in text {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    let starts = text.first().copied();
    let ends = text.last().copied();
    let pad = starts == Some('`')
        || ends == Some('`')
        || (starts == Some(' ') && ends == Some(' ') && text.iter().any(|c| *c != ' '));
    (fence, pad)
}

fn needs_escape(rest: &[char]) -> bool {
    match rest[0] {
        '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '$' | '~' | '^' => true,
        '=' => rest.get(1) == Some(&'='),
        '&' => looks_like_entity(&rest[1..]),
        _ => false,
    }
}

fn looks_like_entity(rest: &[char]) -> bool {
    let body: Vec<&char> = rest
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric() || **c == '#')
        .take(32)
        .collect();
    !body.is_empty() && rest.get(body.len()) == Some(&';')
}

/// Position within the line starting at `rest` of a char that would otherwise
/// open a block (heading, quote, list item, setext underline, directive).
fn line_start_escape(rest: &[char]) -> Option<usize> {
    let line: Vec<char> = rest.iter().copied().take_while(|c| *c != '\n').collect();
    match line.first()? {
        '#' | '>' | '-' | '+' => Some(0),
        '=' if line.iter().all(|c| *c == '=' || *c == ' ') => Some(0),
        ':' if line.get(1) == Some(&':') => Some(0),
        c if c.is_ascii_digit() => {
            let digits = line.iter().take_while(|c| c.is_ascii_digit()).count();
            let after = line.get(digits + 1);
            let marker = matches!(line.get(digits), Some('.') | Some(')'));
            (digits <= 9 && marker && after.map_or(true, |c| *c == ' ' || *c == '\t'))
                .then_some(digits)
        }
        _ => None,
    }
}

/// Percent-escapes characters that would end a link destination.
pub fn escape_href(href: &str) -> String {
    let mut out = String::with_capacity(href.len());
    for c in href.chars() {
        match c {
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_title(title: &str) -> String {
    title.replace('"', "\\\"").replace(['\r', '\n'], " ")
}
