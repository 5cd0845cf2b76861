//! JSON format: the block document as exchanged with editors.
//!
//! Serialization writes the whole [`Document`] (blocks, link references, footnotes and
//! warnings). Parsing accepts either that shape or a bare array of blocks.

use crate::error::FormatError;
use crate::format::Format;
use crate::model::{Block, Document};
use serde::Deserialize;

/// Format implementation for the JSON block tree
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonInput {
    Document(Document),
    Blocks(Vec<Block>),
}

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Block document as JSON"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        match serde_json::from_str::<JsonInput>(source) {
            Ok(JsonInput::Document(doc)) => Ok(doc),
            Ok(JsonInput::Blocks(blocks)) => Ok(Document::from_blocks(blocks)),
            Err(e) => Err(FormatError::ParseError(format!("Invalid block JSON: {e}"))),
        }
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        serde_json::to_string_pretty(doc)
            .map_err(|e| FormatError::SerializationError(format!("JSON encoding failed: {e}")))
    }
}
