//! Table cells, column alignment and the clipboard intermediate form.

use super::block::BlockContent;
use serde::{Deserialize, Serialize};

/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAlign {
    Left,
    Center,
    Right,
}

impl ColumnAlign {
    /// Delimiter-row cell for this alignment; `None` renders as `---`.
    pub fn delimiter(align: Option<ColumnAlign>) -> &'static str {
        match align {
            Some(ColumnAlign::Left) => ":---",
            Some(ColumnAlign::Center) => ":---:",
            Some(ColumnAlign::Right) => "---:",
            None => "---",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellData {
    pub content: BlockContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
}

impl TableCellData {
    pub fn new(content: BlockContent) -> Self {
        TableCellData {
            content,
            colspan: None,
            rowspan: None,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        TableCellData::new(BlockContent::plain(text))
    }
}

/// Pads jagged rows with empty cells up to the widest row.
pub fn normalize_rows(rows: &mut [Vec<TableCellData>]) -> usize {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize_with(width, TableCellData::default);
    }
    width
}

/// Where a clipboard table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Html,
    Tsv,
    Csv,
    Markdown,
    Unknown,
}

/// Intermediate grid produced from a clipboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTableData {
    pub rows: Vec<Vec<String>>,
    pub format: TableFormat,
    pub has_header: bool,
}
