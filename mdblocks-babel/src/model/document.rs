//! The parse result and the options steering parsing and serialization.

use super::block::Block;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Target of a reference-style link definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Definitions keyed by their normalized (lowercased) identifier.
pub type LinkReferences = BTreeMap<String, LinkDefinition>;

/// A non-fatal problem met while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ParseWarning {
    pub fn new(message: impl Into<String>) -> Self {
        ParseWarning {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseWarning {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

/// A parsed document: top-level blocks plus the side tables collected on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub link_references: LinkReferences,
    #[serde(default)]
    pub footnotes: BTreeMap<String, Block>,
    #[serde(default)]
    pub warnings: Vec<ParseWarning>,
}

impl Document {
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Document {
            blocks,
            ..Default::default()
        }
    }
}

/// Dialect switches for the Markdown parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// GFM tables, strikethrough, autolinks and task items.
    pub gfm: bool,
    /// `$…$` and `$$…$$`.
    pub math: bool,
    /// `:::name` directive containers and `::name` leaf directives.
    pub containers: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            gfm: true,
            math: true,
            containers: true,
        }
    }
}

/// Output style of the Markdown serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializeOptions {
    pub bullet_char: char,
    pub emphasis_char: char,
    pub strong_char: String,
    pub list_indent: usize,
    pub soft_breaks: bool,
    pub escape_text: bool,
    pub link_references: bool,
    pub footnotes: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            bullet_char: '-',
            emphasis_char: '*',
            strong_char: "**".to_string(),
            list_indent: 2,
            soft_breaks: true,
            escape_text: true,
            link_references: false,
            footnotes: true,
        }
    }
}
