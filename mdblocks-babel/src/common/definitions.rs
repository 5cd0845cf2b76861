//! Link reference definitions (`[id]: url "title"`).
//!
//! comrak resolves references itself but does not keep definitions in its
//! tree, so they are collected from the source in a pre-pass. The table is
//! returned with the document and lets the serializer write reference-style
//! links back out.

use super::fences::FenceTracker;
use crate::model::{LinkDefinition, LinkReferences};
use once_cell::sync::Lazy;
use regex::Regex;

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^ {0,3}\[([^\]\^][^\]]*)\]:[ \t]*(<[^>]*>|\S+)(?:[ \t]+("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|\((?:[^)\\]|\\.)*\)))?[ \t]*$"#,
    )
    .expect("definition pattern is valid")
});

/// Case-folds a label and collapses its inner whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Collects every single-line definition outside fenced code. The first
/// definition of a label wins.
pub fn collect_definitions(source: &str) -> LinkReferences {
    let mut references = LinkReferences::new();
    let mut fences = FenceTracker::new();

    for line in source.lines() {
        if fences.observe(line) {
            continue;
        }
        let Some(caps) = DEFINITION.captures(line) else {
            continue;
        };
        let id = normalize_label(&caps[1]);
        if id.is_empty() {
            continue;
        }
        let url = caps[2].trim_start_matches('<').trim_end_matches('>').to_string();
        let title = caps.get(3).map(|m| unquote(m.as_str()));
        references
            .entry(id)
            .or_insert(LinkDefinition { url, title });
    }
    references
}

fn unquote(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                if !next.is_ascii_punctuation() {
                    out.push('\\');
                }
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Renders definitions back to Markdown, one per line.
pub fn render_definitions(references: &LinkReferences) -> String {
    let mut out = String::new();
    for (id, definition) in references {
        out.push('[');
        out.push_str(id);
        out.push_str("]: ");
        if definition.url.is_empty() || definition.url.contains(char::is_whitespace) {
            out.push('<');
            out.push_str(&definition.url);
            out.push('>');
        } else {
            out.push_str(&definition.url);
        }
        if let Some(title) = &definition.title {
            out.push_str(" \"");
            out.push_str(&title.replace('"', "\\\""));
            out.push('"');
        }
        out.push('\n');
    }
    out
}
