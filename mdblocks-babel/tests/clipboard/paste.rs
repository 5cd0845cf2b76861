//! Paste tests: clipboard payloads through to table blocks and Markdown.

use mdblocks_babel::clipboard::{
    looks_like_table_data, merge_into_table_block, merge_pasted_data, parse_clipboard_data,
    ClipboardPayload,
};
use mdblocks_babel::model::{BlockMeta, ColumnAlign, TableCellData, TableFormat};
use mdblocks_babel::{serialize_markdown, Block, BlockType, Document};
use pretty_assertions::assert_eq;

fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

fn texts(block: &Block) -> Vec<Vec<String>> {
    block
        .meta
        .rows
        .as_ref()
        .map(|rows| {
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.content.text.clone()).collect())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_tsv_fills_blank_grid() {
    let parsed = parse_clipboard_data(&ClipboardPayload::text("a\tb\nc\td")).unwrap();
    assert_eq!(parsed.format, TableFormat::Tsv);
    let blank = grid(&[&["", ""], &["", ""]]);
    assert_eq!(
        merge_pasted_data(&blank, &parsed, 0, 0),
        grid(&[&["a", "b"], &["c", "d"]])
    );
}

#[test]
fn test_spreadsheet_html_paste() {
    let html = concat!(
        "<meta charset=\"utf-8\"><google-sheets-html-origin>",
        "<table><tbody>",
        "<tr><td>Fruit</td><td>Qty</td></tr>",
        "<tr><td>apple</td><td>3</td></tr>",
        "</tbody></table>",
    );
    let payload = ClipboardPayload {
        html: Some(html),
        text: Some("Fruit\tQty\napple\t3"),
    };
    assert!(looks_like_table_data(&payload));

    let parsed = parse_clipboard_data(&payload).unwrap();
    assert_eq!(parsed.format, TableFormat::Html);
    assert_eq!(parsed.rows, grid(&[&["Fruit", "Qty"], &["apple", "3"]]));

    let md = serialize_markdown(&Document::from_blocks(vec![parsed.to_table_block()]));
    assert_eq!(md, "| Fruit | Qty |\n|---|---|\n| apple | 3 |\n");
}

#[test]
fn test_csv_with_quoted_fields() {
    let text = "name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n";
    let parsed = parse_clipboard_data(&ClipboardPayload::text(text)).unwrap();
    assert_eq!(parsed.format, TableFormat::Csv);
    assert_eq!(
        parsed.rows,
        grid(&[&["name", "note"], &["Smith, J", "said \"hi\""]])
    );
    assert!(!parsed.has_header);
}

#[test]
fn test_pipe_table_paste() {
    let text = "| City | Pop |\n|---|--:|\n| Oslo | 709000 |\n";
    let payload = ClipboardPayload::text(text);
    assert!(looks_like_table_data(&payload));

    let parsed = parse_clipboard_data(&payload).unwrap();
    assert_eq!(parsed.format, TableFormat::Markdown);
    assert_eq!(parsed.rows, grid(&[&["City", "Pop"], &["Oslo", "709000"]]));
    assert!(parsed.has_header);
}

#[test]
fn test_plain_prose_is_not_a_table() {
    assert!(!looks_like_table_data(&ClipboardPayload::text("just a sentence")));
    assert!(parse_clipboard_data(&ClipboardPayload::default()).is_none());
    assert!(parse_clipboard_data(&ClipboardPayload::text("\n\n")).is_none());
}

#[test]
fn test_paste_into_existing_table_keeps_untouched_cells() {
    let table = Block::new(BlockType::Table, "").with_meta(BlockMeta {
        rows: Some(vec![
            vec![TableCellData::plain("h1"), TableCellData::plain("h2")],
            vec![TableCellData::plain("x"), TableCellData::plain("y")],
        ]),
        column_aligns: Some(vec![Some(ColumnAlign::Right), None]),
        ..BlockMeta::default()
    });
    let parsed = parse_clipboard_data(&ClipboardPayload::text("p\tq\tr")).unwrap();

    let merged = merge_into_table_block(&table, &parsed, 1, 1);
    assert_eq!(merged.id, table.id);
    assert_eq!(
        texts(&merged),
        grid(&[&["h1", "h2", "", ""], &["x", "p", "q", "r"]])
    );
    assert_eq!(
        merged.meta.column_aligns,
        Some(vec![Some(ColumnAlign::Right), None, None, None])
    );
}
