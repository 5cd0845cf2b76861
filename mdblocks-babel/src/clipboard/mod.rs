//! Clipboard table ingestion.
//!
//! A clipboard read gives an optional HTML flavor and an optional plain-text
//! flavor. HTML is preferred when it holds a table; otherwise the text is
//! sniffed as TSV, then CSV, then a Markdown pipe table. The resulting grid can
//! become a new `table` block or be pasted into an existing one.
//!
//! ```text
//! payload ──► looks_like_table_data ──► parse_clipboard_data ──► ParsedTableData
//!                                                                   │
//!                        merge_pasted_data / merge_into_table_block ◄┘
//! ```

mod delimited;
mod html;
mod pipe;

use crate::model::{
    Block, BlockContent, BlockMeta, BlockType, ColumnAlign, ParsedTableData, TableCellData,
    TableFormat,
};

/// The flavors of one clipboard read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipboardPayload<'a> {
    pub html: Option<&'a str>,
    pub text: Option<&'a str>,
}

impl<'a> ClipboardPayload<'a> {
    pub fn text(text: &'a str) -> Self {
        ClipboardPayload {
            html: None,
            text: Some(text),
        }
    }

    pub fn html(html: &'a str) -> Self {
        ClipboardPayload {
            html: Some(html),
            text: None,
        }
    }
}

/// Cheap check deciding whether a paste should go through table parsing.
pub fn looks_like_table_data(payload: &ClipboardPayload) -> bool {
    if let Some(html) = payload.html {
        if html.to_ascii_lowercase().contains("<table") {
            return true;
        }
    }
    let Some(text) = payload.text else {
        return false;
    };
    if text.contains('\t') {
        return true;
    }
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default();
    let multiline = lines.next().is_some();
    (multiline && first.contains(',')) || (text.contains('|') && text.contains('\n'))
}

/// Parses the payload into a grid, or `None` when nothing usable is there.
pub fn parse_clipboard_data(payload: &ClipboardPayload) -> Option<ParsedTableData> {
    if let Some(table) = payload.html.and_then(html::parse_html_table) {
        tracing::debug!(rows = table.rows.len(), "clipboard table from html");
        return Some(ParsedTableData {
            rows: table.rows,
            format: TableFormat::Html,
            has_header: table.has_header,
        });
    }

    let text = payload.text?.trim_matches(&['\n', '\r'][..]);
    if text.trim().is_empty() {
        return None;
    }
    let first = text.lines().next().unwrap_or_default();
    let (format, rows) = if first.contains('\t') {
        (TableFormat::Tsv, delimited::parse_tsv(text))
    } else if first.contains(',') {
        (TableFormat::Csv, delimited::parse_csv(text))
    } else if text.contains('|') {
        (TableFormat::Markdown, pipe::parse_pipe_table(text))
    } else {
        let rows = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| vec![line.trim().to_string()])
            .collect();
        (TableFormat::Unknown, rows)
    };
    if rows.is_empty() {
        return None;
    }
    tracing::debug!(rows = rows.len(), ?format, "clipboard table from text");
    let has_header = detect_header(&rows);
    Some(ParsedTableData {
        rows,
        format,
        has_header,
    })
}

/// Header when the first row has no numeric cell and the second has one.
fn detect_header(rows: &[Vec<String>]) -> bool {
    let numeric = |row: &Vec<String>| row.iter().filter(|cell| is_numeric(cell)).count();
    match rows {
        [first, second, ..] => numeric(first) == 0 && numeric(second) > 0,
        _ => false,
    }
}

fn is_numeric(cell: &str) -> bool {
    let cell = cell.trim();
    !cell.is_empty() && cell.replace(',', "").parse::<f64>().is_ok_and(f64::is_finite)
}

/// Pastes `parsed` into `grid` with its top-left corner at `(start_row,
/// start_col)`, growing the grid as needed. Cells outside the pasted region
/// keep their values.
pub fn merge_pasted_data(
    grid: &[Vec<String>],
    parsed: &ParsedTableData,
    start_row: usize,
    start_col: usize,
) -> Vec<Vec<String>> {
    let pasted_width = parsed.rows.iter().map(Vec::len).max().unwrap_or(0);
    let grid_width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let width = grid_width.max(start_col + pasted_width);
    let height = grid.len().max(start_row + parsed.rows.len());

    let mut merged: Vec<Vec<String>> = grid.to_vec();
    merged.resize_with(height, Vec::new);
    for row in merged.iter_mut() {
        row.resize_with(width, String::new);
    }
    for (r, row) in parsed.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            merged[start_row + r][start_col + c] = value.clone();
        }
    }
    merged
}

impl ParsedTableData {
    /// A new `table` block holding this grid.
    pub fn to_table_block(&self) -> Block {
        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells: Vec<TableCellData> =
                    row.iter().map(TableCellData::plain).collect();
                cells.resize_with(width, TableCellData::default);
                cells
            })
            .collect();
        let meta = BlockMeta {
            rows: Some(rows),
            column_aligns: Some(vec![None; width]),
            ..BlockMeta::default()
        };
        Block::new(BlockType::Table, "").with_meta(meta)
    }
}

/// Pastes `parsed` into an existing table block. Pasted cells replace the
/// formatting of the cells they land on; other cells keep theirs.
pub fn merge_into_table_block(
    table: &Block,
    parsed: &ParsedTableData,
    start_row: usize,
    start_col: usize,
) -> Block {
    let existing: Vec<Vec<TableCellData>> = table.meta.rows.clone().unwrap_or_default();
    let grid: Vec<Vec<String>> = existing
        .iter()
        .map(|row| row.iter().map(|cell| cell.content.text.clone()).collect())
        .collect();
    let merged = merge_pasted_data(&grid, parsed, start_row, start_col);
    let width = merged.first().map(Vec::len).unwrap_or(0);

    let rows: Vec<Vec<TableCellData>> = merged
        .into_iter()
        .enumerate()
        .map(|(r, row)| {
            row.into_iter()
                .enumerate()
                .map(|(c, text)| {
                    let pasted = r >= start_row
                        && c >= start_col
                        && parsed
                            .rows
                            .get(r - start_row)
                            .is_some_and(|row| c - start_col < row.len());
                    match existing.get(r).and_then(|row| row.get(c)) {
                        Some(cell) if !pasted => cell.clone(),
                        _ => TableCellData::new(BlockContent::plain(text)),
                    }
                })
                .collect()
        })
        .collect();

    let mut aligns: Vec<Option<ColumnAlign>> =
        table.meta.column_aligns.clone().unwrap_or_default();
    aligns.resize(width.max(aligns.len()), None);

    let mut block = table.clone();
    block.meta.rows = Some(rows);
    block.meta.column_aligns = Some(aligns);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn sniffing() {
        assert!(looks_like_table_data(&ClipboardPayload::html("<TABLE><tr><td>x")));
        assert!(looks_like_table_data(&ClipboardPayload::text("a\tb")));
        assert!(looks_like_table_data(&ClipboardPayload::text("a,b\nc,d")));
        assert!(looks_like_table_data(&ClipboardPayload::text("| a |\n| b |")));
        assert!(!looks_like_table_data(&ClipboardPayload::text("one, two")));
        assert!(!looks_like_table_data(&ClipboardPayload::text("plain words")));
        assert!(!looks_like_table_data(&ClipboardPayload::default()));
    }

    #[test]
    fn html_is_preferred_over_text() {
        let payload = ClipboardPayload {
            html: Some("<table><tr><th>h</th></tr><tr><td>v</td></tr></table>"),
            text: Some("h\tx\nv\ty"),
        };
        let parsed = parse_clipboard_data(&payload).unwrap();
        assert_eq!(parsed.format, TableFormat::Html);
        assert!(parsed.has_header);
        assert_eq!(parsed.rows, grid(&[&["h"], &["v"]]));
    }

    #[test]
    fn html_without_rows_falls_back_to_text() {
        let payload = ClipboardPayload {
            html: Some("<b>not a table</b>"),
            text: Some("a,b\nc,d"),
        };
        assert_eq!(parse_clipboard_data(&payload).unwrap().format, TableFormat::Csv);
    }

    #[test]
    fn text_formats_by_priority() {
        let tsv = parse_clipboard_data(&ClipboardPayload::text("a,b\tc\nd\te")).unwrap();
        assert_eq!(tsv.format, TableFormat::Tsv);
        assert_eq!(tsv.rows, grid(&[&["a,b", "c"], &["d", "e"]]));

        let pipe = parse_clipboard_data(&ClipboardPayload::text("| a | b |\n|---|---|\n| 1 | 2 |"))
            .unwrap();
        assert_eq!(pipe.format, TableFormat::Markdown);
        assert_eq!(pipe.rows, grid(&[&["a", "b"], &["1", "2"]]));

        let lines = parse_clipboard_data(&ClipboardPayload::text("x\ny")).unwrap();
        assert_eq!(lines.format, TableFormat::Unknown);
        assert_eq!(lines.rows, grid(&[&["x"], &["y"]]));

        assert!(parse_clipboard_data(&ClipboardPayload::text("  \n")).is_none());
    }

    #[test]
    fn header_heuristic() {
        let with = parse_clipboard_data(&ClipboardPayload::text("item\tprice\napple\t1.50")).unwrap();
        assert!(with.has_header);
        let without = parse_clipboard_data(&ClipboardPayload::text("a\tb\nc\td")).unwrap();
        assert!(!without.has_header);
        let numbers = parse_clipboard_data(&ClipboardPayload::text("1\t2\n3\t4")).unwrap();
        assert!(!numbers.has_header);
    }

    #[test]
    fn tsv_fills_an_empty_grid() {
        let parsed = parse_clipboard_data(&ClipboardPayload::text("a\tb\nc\td")).unwrap();
        let merged = merge_pasted_data(&grid(&[&["", ""], &["", ""]]), &parsed, 0, 0);
        assert_eq!(merged, grid(&[&["a", "b"], &["c", "d"]]));
    }

    #[test]
    fn merge_grows_every_row() {
        let parsed = ParsedTableData {
            rows: grid(&[&["x", "y"]]),
            format: TableFormat::Tsv,
            has_header: false,
        };
        let merged = merge_pasted_data(&grid(&[&["a", "b"], &["c", "d"]]), &parsed, 2, 1);
        assert_eq!(
            merged,
            grid(&[&["a", "b", ""], &["c", "d", ""], &["", "x", "y"]])
        );
    }

    #[test]
    fn table_blocks() {
        let parsed = ParsedTableData {
            rows: grid(&[&["a", "b"], &["c"]]),
            format: TableFormat::Csv,
            has_header: false,
        };
        let block = parsed.to_table_block();
        assert_eq!(block.block_type, BlockType::Table);
        let rows = block.meta.rows.as_ref().unwrap();
        assert_eq!(rows[1].len(), 2);
        assert_eq!(block.meta.column_aligns, Some(vec![None, None]));

        let paste = ParsedTableData {
            rows: grid(&[&["z"]]),
            format: TableFormat::Tsv,
            has_header: false,
        };
        let merged = merge_into_table_block(&block, &paste, 1, 2);
        let rows = merged.meta.rows.as_ref().unwrap();
        assert_eq!(rows[0][0].content.text, "a");
        assert_eq!(rows[1][2].content.text, "z");
        assert_eq!(rows[0].len(), 3);
        assert_eq!(merged.meta.column_aligns.as_ref().map(Vec::len), Some(3));
        assert_eq!(merged.id, block.id);
    }
}
