//! Markdown format implementation
//!
//! This module implements bidirectional conversion between block documents and Markdown
//! (CommonMark + GFM + an extended dialect).
//!
//! # Library Choice
//!
//! We use the `comrak` crate for Markdown parsing. It covers CommonMark, the GFM
//! extensions, footnotes and dollar math. What comrak does not know about is handled
//! around it:
//! - `:::name` containers and `::name` leaf directives are split off before comrak sees
//!   the source (see `directives.rs`)
//! - `==highlight==`, `^sup^` and `~sub~` are found by the extended scanner in
//!   `common/scanner.rs` once a block's text has been collected
//! - link definitions are collected by a pre-pass, since comrak resolves and drops them
//!
//! Serialization does not go through comrak: the block writer and the mark writer in
//! `common/flat_to_nested.rs` emit Markdown directly.
//!
//! # Element Mapping Table
//!
//! | Block type         | Markdown Equivalent           | Notes                                   |
//! |--------------------|-------------------------------|-----------------------------------------|
//! | paragraph          | Paragraph                     | Inline marks re-nested on export        |
//! | heading1-6         | `#` .. `######`               | `meta.slug` is unique per document      |
//! | bulletList         | `- item`                      | Nesting carried by `indent`             |
//! | numberedList       | `1. item`                     | `meta.start` seeds the counter          |
//! | todo               | `- [ ] item` / `- [x] item`   | `meta.checked`                          |
//! | quote              | `> text`                      | Blockquote with a single paragraph      |
//! | blockquote         | `> ...`                       | Any other blockquote, with children     |
//! | code               | Fenced code block             | `plaintext` writes a bare fence         |
//! | mermaid            | ```` ```mermaid ````          | `meta.mermaidCode`                      |
//! | mathBlock          | `$$latex$$`                   | Also read from ```` ```math ````        |
//! | divider            | `---`                         | Also read from `<hr>`                   |
//! | table              | GFM table                     | `meta.rows`, `meta.columnAligns`        |
//! | callout            | `:::note Title`               | note/tip/info/warning/error/success     |
//! | container          | `:::name Title`               | Any other directive name                |
//! | toggle             | `<details><summary>`          | `meta.collapsed` unless `open`          |
//! | footnoteDefinition | `[^id]: text`                 | Continuation indented 4 spaces          |
//! | image              | `![alt](src "title")`         | Only when alone in its paragraph        |
//! | embed              | `::youtube{src}`              | `::video{src}` for other hosts          |
//! | video              | `::video{src}`                | Reads back as embed                     |
//! | file               | `[name](src)`                 | Reads back as a linked paragraph        |
//!
//! # Lossy Conversions
//!
//! The following conversions lose information on round-trip:
//! - `video` and `file` blocks come back as `embed` and a linked paragraph
//! - Inline images degrade to their alt text
//! - Inline math stays literal `$...$` text
//! - Footnote definitions inside a `<details>` body move to the end of the chunk
//! - Unknown inline HTML tags are stripped, keeping their text
//! - Consecutive separate lists of the same kind merge into one

pub mod directives;
mod footnotes;
mod inlines;
pub mod parser;
pub mod serializer;
mod transform;

use crate::error::FormatError;
use crate::format::Format;
use crate::model::{Document, ParseOptions, SerializeOptions};
use std::collections::HashMap;

/// Format implementation for Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownFormat {
    pub parse_options: ParseOptions,
    pub serialize_options: SerializeOptions,
}

impl MarkdownFormat {
    pub fn new(parse_options: ParseOptions, serialize_options: SerializeOptions) -> Self {
        MarkdownFormat {
            parse_options,
            serialize_options,
        }
    }

    /// Applies `--extra-<key>` style overrides on top of the configured options.
    pub fn options_with(
        &self,
        overrides: &HashMap<String, String>,
    ) -> Result<SerializeOptions, FormatError> {
        let mut options = self.serialize_options.clone();
        for (key, value) in overrides {
            match key.as_str() {
                "bullet-char" => {
                    options.bullet_char = parse_char(key, value, &['-', '*', '+'])?;
                }
                "emphasis-char" => {
                    options.emphasis_char = parse_char(key, value, &['*', '_'])?;
                }
                "strong-char" => {
                    if value != "**" && value != "__" {
                        return Err(invalid(key, value));
                    }
                    options.strong_char = value.clone();
                }
                "list-indent" => {
                    options.list_indent = value
                        .parse()
                        .ok()
                        .filter(|n| (1..=8).contains(n))
                        .ok_or_else(|| invalid(key, value))?;
                }
                "soft-breaks" => options.soft_breaks = parse_bool_flag(key, value)?,
                "escape-text" => options.escape_text = parse_bool_flag(key, value)?,
                "link-references" => options.link_references = parse_bool_flag(key, value)?,
                "footnotes" => options.footnotes = parse_bool_flag(key, value)?,
                _ => return Err(invalid(key, value)),
            }
        }
        Ok(options)
    }
}

impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "CommonMark + GFM Markdown with directives, highlight, sub/superscript and math"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        Ok(parser::parse_from_markdown(source, &self.parse_options))
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        Ok(serializer::serialize_to_markdown(
            doc,
            &self.serialize_options,
        ))
    }

    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        let options = self.options_with(options)?;
        Ok(serializer::serialize_to_markdown(doc, &options))
    }
}

fn invalid(key: &str, value: &str) -> FormatError {
    FormatError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_char(key: &str, value: &str, allowed: &[char]) -> Result<char, FormatError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if allowed.contains(&c) => Ok(c),
        _ => Err(invalid(key, value)),
    }
}

fn parse_bool_flag(key: &str, value: &str) -> Result<bool, FormatError> {
    if value.is_empty() {
        return Ok(true);
    }
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}
