//! Footnote definition pre-pass.
//!
//! comrak drops footnote definitions nobody references and moves the rest to
//! the end of the document. To keep every definition at its source position,
//! column-0 `[^id]:` definitions are cut out of each Markdown chunk before it
//! reaches comrak. The body of a definition is its first line plus following
//! lines indented by four spaces (blank lines between them included) and lazy
//! continuation lines of its opening paragraph.
//!
//! ```text
//! Claim[^1]               Markdown piece
//!
//! [^1]: Proof starts      definition "1", body line 1
//!     and continues.      body line 2 (dedented)
//!
//! After                   Markdown piece
//! ```
//!
//! Definitions inside fenced code or an open `<details>` block are left for
//! comrak. References still need a definition in the chunk comrak sees, so
//! the parser appends a stub per known id; see [`stub_definitions`].

use crate::common::fences::FenceTracker;
use once_cell::sync::Lazy;
use regex::Regex;

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[\^([^\]\s]+)\]:(?:[ \t]+(.*))?$").expect("footnote pattern is valid")
});

static BLOCK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(?:#{1,6}(?:\s|$)|>|[-*+](?:\s|$)|\d{1,9}[.)](?:\s|$)|```|~~~|:::?|<|\|)")
        .expect("block start pattern is valid")
});

static DETAILS_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<details(?:\s[^>]*)?>").expect("details pattern is valid"));

static DETAILS_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</details\s*>").expect("details pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Markdown starting at 0-based `line` of the source.
    Markdown { text: String, line: usize },
    /// A footnote definition; `body` is dedented and starts at `line`.
    Definition {
        id: String,
        body: String,
        line: usize,
    },
}

/// Splits a Markdown chunk that starts at `line` around its footnote
/// definitions.
pub fn split_footnotes(text: &str, line: usize) -> Vec<Piece> {
    let lines: Vec<&str> = text.lines().collect();
    let mut pieces = Vec::new();
    let mut fences = FenceTracker::new();
    let mut details = 0usize;
    let mut pending: Vec<&str> = Vec::new();
    let mut pending_line = line;

    let mut i = 0;
    while i < lines.len() {
        let current = lines[i];
        let in_code = fences.observe(current);
        let caps = match (in_code, details) {
            (false, 0) => DEFINITION.captures(current),
            _ => None,
        };
        let Some(caps) = caps else {
            if !in_code {
                details += DETAILS_OPEN.find_iter(current).count();
                details = details.saturating_sub(DETAILS_CLOSE.find_iter(current).count());
            }
            pending.push(current);
            i += 1;
            continue;
        };

        flush(&mut pieces, &mut pending, pending_line);
        let start = i;
        let mut body = vec![caps.get(2).map_or("", |m| m.as_str()).to_string()];
        i += 1;
        while i < lines.len() {
            let next = lines[i];
            if next.trim().is_empty() {
                let resume = lines[i..]
                    .iter()
                    .position(|l| !l.trim().is_empty())
                    .map(|offset| i + offset);
                match resume {
                    Some(j) if is_indented(lines[j]) => {
                        body.extend((i..j).map(|_| String::new()));
                        i = j;
                        continue;
                    }
                    _ => break,
                }
            }
            if is_indented(next) {
                body.push(dedent(next).to_string());
            } else if body.last().is_some_and(|l| !l.trim().is_empty())
                && !BLOCK_START.is_match(next)
                && !DEFINITION.is_match(next)
            {
                body.push(next.to_string());
            } else {
                break;
            }
            i += 1;
        }
        pieces.push(Piece::Definition {
            id: caps[1].to_string(),
            body: body.join("\n"),
            line: line + start,
        });
        pending_line = line + i;
    }
    flush(&mut pieces, &mut pending, pending_line);
    pieces
}

fn flush(pieces: &mut Vec<Piece>, pending: &mut Vec<&str>, line: usize) {
    if pending.iter().any(|l| !l.trim().is_empty()) {
        pieces.push(Piece::Markdown {
            text: pending.join("\n"),
            line,
        });
    }
    pending.clear();
}

fn is_indented(line: &str) -> bool {
    line.starts_with("    ") || line.starts_with('\t')
}

fn dedent(line: &str) -> &str {
    line.strip_prefix("    ")
        .or_else(|| line.strip_prefix('\t'))
        .unwrap_or(line)
}

/// Ids of every column-0 footnote definition outside fenced code, in source
/// order without duplicates.
pub fn footnote_ids(source: &str) -> Vec<String> {
    let mut fences = FenceTracker::new();
    let mut ids: Vec<String> = Vec::new();
    for line in source.lines() {
        if fences.observe(line) {
            continue;
        }
        if let Some(caps) = DEFINITION.captures(line) {
            if !ids.iter().any(|id| id == &caps[1]) {
                ids.push(caps[1].to_string());
            }
        }
    }
    ids
}

/// One placeholder definition per id, so comrak resolves `[^id]` references
/// in chunks whose real definition was cut out.
pub fn stub_definitions(ids: &[String]) -> String {
    ids.iter().map(|id| format!("[^{id}]: {id}\n")).collect()
}
