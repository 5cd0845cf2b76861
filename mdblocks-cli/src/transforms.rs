//! CLI-specific transforms
//!
//! This module defines the views `mdblocks inspect` can print for a Markdown
//! file. Every transform parses the source once and renders one aspect of the
//! resulting document:
//!
//! - `blocks-tree`: The block tree, one line per block (default)
//! - `blocks-json`: The whole document as JSON
//! - `warnings`: Parse warnings with their positions
//! - `footnotes-json`: Footnote definitions keyed by identifier
//! - `links-json`: Collected link reference definitions
//!
//! ## Extra Parameters
//!
//! - `show-ids`: When set to "true", `blocks-tree` prints block ids
//! - `max-text`: Characters of block text shown per `blocks-tree` line (default 40)
//!
//! Example: `mdblocks inspect notes.md blocks-tree --extra-show-ids`

use mdblocks_babel::formats::markdown::parser::parse_from_markdown;
use mdblocks_babel::model::{Block, BlockType, Document, ParseOptions};
use std::collections::HashMap;

/// All available CLI transforms
pub const AVAILABLE_TRANSFORMS: &[&str] = &[
    "blocks-tree",
    "blocks-json",
    "warnings",
    "footnotes-json",
    "links-json",
];

pub const DEFAULT_TRANSFORM: &str = "blocks-tree";

const DEFAULT_MAX_TEXT: usize = 40;

/// Execute a named transform on Markdown source with optional extra parameters
///
/// # Returns
///
/// The transformed output as a string, or an error message
pub fn execute_transform(
    source: &str,
    transform_name: &str,
    options: &ParseOptions,
    extra_params: &HashMap<String, String>,
) -> Result<String, String> {
    let doc = parse_from_markdown(source, options);

    match transform_name {
        "blocks-tree" => {
            let show_ids = extra_params
                .get("show-ids")
                .is_some_and(|value| value == "true");
            let max_text = match extra_params.get("max-text") {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| format!("Invalid value '{raw}' for --extra-max-text"))?,
                None => DEFAULT_MAX_TEXT,
            };
            Ok(to_tree(&doc, show_ids, max_text))
        }
        "blocks-json" => to_json(&doc),
        "warnings" => Ok(warnings_to_text(&doc)),
        "footnotes-json" => to_json(&doc.footnotes),
        "links-json" => to_json(&doc.link_references),
        other => Err(format!(
            "Unknown transform '{other}'. Use --list-transforms to see all options."
        )),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|json| json + "\n")
        .map_err(|e| format!("JSON serialization failed: {e}"))
}

fn warnings_to_text(doc: &Document) -> String {
    let mut out = String::new();
    for warning in &doc.warnings {
        match (warning.line, warning.column) {
            (Some(line), Some(column)) => {
                out.push_str(&format!("{line}:{column}: {}\n", warning.message));
            }
            _ => out.push_str(&format!("-: {}\n", warning.message)),
        }
    }
    if out.is_empty() {
        out.push_str("No warnings\n");
    }
    out
}

/// Renders the block tree with box-drawing guides.
///
/// ```text
/// document (3 blocks)
/// ├─ heading1 "Title"
/// ├─ bulletList ›1 "Nested" [bold]
/// └─ callout(warning) "Careful"
///    └─ paragraph "Mind the gap"
/// ```
fn to_tree(doc: &Document, show_ids: bool, max_text: usize) -> String {
    let mut out = format!("document ({} blocks)\n", doc.blocks.len());
    write_children(&doc.blocks, "", show_ids, max_text, &mut out);
    out
}

fn write_children(
    blocks: &[Block],
    prefix: &str,
    show_ids: bool,
    max_text: usize,
    out: &mut String,
) {
    for (i, block) in blocks.iter().enumerate() {
        let last = i + 1 == blocks.len();
        let (branch, guide) = if last { ("└─ ", "   ") } else { ("├─ ", "│  ") };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&describe(block, show_ids, max_text));
        out.push('\n');
        let child_prefix = format!("{prefix}{guide}");
        write_children(&block.children, &child_prefix, show_ids, max_text, out);
    }
}

fn describe(block: &Block, show_ids: bool, max_text: usize) -> String {
    let mut line = block.block_type.as_str().to_string();
    match block.block_type {
        BlockType::Callout => {
            if let Some(kind) = block.meta.callout_type {
                line.push_str(&format!("({})", kind.as_str()));
            }
        }
        BlockType::Container => {
            if let Some(kind) = &block.meta.container_type {
                line.push_str(&format!("({kind})"));
            }
        }
        BlockType::Code => {
            if let Some(language) = &block.meta.language {
                line.push_str(&format!("({language})"));
            }
        }
        BlockType::Todo => {
            let checked = block.meta.checked.unwrap_or(false);
            line.push_str(if checked { "[x]" } else { "[ ]" });
        }
        BlockType::Table => {
            let rows = block.meta.rows.as_ref().map(Vec::len).unwrap_or(0);
            line.push_str(&format!("({rows} rows)"));
        }
        _ => {}
    }
    if block.indent > 0 {
        line.push_str(&format!(" ›{}", block.indent));
    }
    if show_ids {
        line.push_str(&format!(" #{}", block.id));
    }
    let text = preview(block.text(), max_text);
    if !text.is_empty() {
        line.push_str(&format!(" {text:?}"));
    }
    let marks = block.content.marks();
    if !marks.is_empty() {
        let kinds: Vec<&str> = marks.iter().map(|mark| mark.kind.as_str()).collect();
        line.push_str(&format!(" [{}]", kinds.join(", ")));
    }
    line
}

fn preview(text: &str, max_text: usize) -> String {
    let flat = text.replace('\n', "⏎");
    if flat.chars().count() <= max_text {
        flat
    } else {
        let cut: String = flat.chars().take(max_text).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str, transform: &str) -> String {
        execute_transform(source, transform, &ParseOptions::default(), &HashMap::new()).unwrap()
    }

    #[test]
    fn tree_shows_nesting_and_marks() {
        let source = "# Title\n\n- one\n  - **two**\n\n:::warning\nMind\n\n- gap\n:::\n";
        assert_eq!(
            run(source, "blocks-tree"),
            "document (4 blocks)\n\
             ├─ heading1 \"Title\"\n\
             ├─ bulletList \"one\"\n\
             ├─ bulletList ›1 \"two\" [bold]\n\
             └─ callout(warning)\n   \
                ├─ paragraph \"Mind\"\n   \
                └─ bulletList \"gap\"\n"
        );
    }

    #[test]
    fn tree_truncates_long_text() {
        let mut params = HashMap::new();
        params.insert("max-text".to_string(), "5".to_string());
        let out = execute_transform(
            "abcdefghij\n",
            "blocks-tree",
            &ParseOptions::default(),
            &params,
        )
        .unwrap();
        assert!(out.contains("\"abcde…\""));

        params.insert("max-text".to_string(), "lots".to_string());
        assert!(
            execute_transform("x", "blocks-tree", &ParseOptions::default(), &params).is_err()
        );
    }

    #[test]
    fn warnings_list_positions() {
        assert_eq!(run("plain\n", "warnings"), "No warnings\n");
        let nested = ":::note\n".repeat(40);
        let out = run(&nested, "warnings");
        assert!(out.starts_with("-: Failed to parse Markdown"));
    }

    #[test]
    fn json_views() {
        let source = "See [docs][d].\n\n[d]: https://docs.test\n\nText[^1]\n\n[^1]: Note\n";
        let links: serde_json::Value = serde_json::from_str(&run(source, "links-json")).unwrap();
        assert_eq!(links["d"]["url"], "https://docs.test");

        let notes: serde_json::Value =
            serde_json::from_str(&run(source, "footnotes-json")).unwrap();
        assert_eq!(notes["1"]["content"]["text"], "Note");

        let doc: serde_json::Value = serde_json::from_str(&run(source, "blocks-json")).unwrap();
        assert_eq!(doc["blocks"][0]["type"], "paragraph");
    }

    #[test]
    fn unknown_transform_is_an_error() {
        let err = execute_transform("x", "ast-tag", &ParseOptions::default(), &HashMap::new())
            .unwrap_err();
        assert!(err.contains("ast-tag"));
    }
}
