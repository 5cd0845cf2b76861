//! Export tests for Markdown format (blocks → Markdown)

use mdblocks_babel::format::Format;
use mdblocks_babel::formats::markdown::MarkdownFormat;
use mdblocks_babel::model::{
    Block, BlockContent, BlockMeta, BlockType, ColumnAlign, LinkDefinition, Mark, MarkType,
    TableCellData,
};
use mdblocks_babel::{serialize_markdown, Document};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn doc(blocks: Vec<Block>) -> Document {
    Document::from_blocks(blocks)
}

#[test]
fn test_numbered_list_reset() {
    let md = serialize_markdown(&doc(vec![
        Block::new(BlockType::NumberedList, "First"),
        Block::new(BlockType::NumberedList, "Second"),
        Block::paragraph("Break"),
        Block::new(BlockType::NumberedList, "New first"),
    ]));
    let lines: Vec<_> = md.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines, vec!["1. First", "2. Second", "Break", "1. New first"]);
}

#[test]
fn test_overlapping_marks() {
    let content = BlockContent::new(
        "ABCDEFGHIJ",
        vec![
            Mark::new(MarkType::Bold, 1, 7),
            Mark::new(MarkType::Italic, 3, 8),
            Mark::new(MarkType::Strikethrough, 5, 9),
        ],
    );
    let md = serialize_markdown(&doc(vec![Block::paragraph(content)]));
    assert!(md.contains("**"));
    assert!(md.contains('*'));
    assert!(md.contains("~~"));
}

#[test]
fn test_table_alignment_row() {
    let rows = vec![
        vec![
            TableCellData::plain("L"),
            TableCellData::plain("C"),
            TableCellData::plain("R"),
        ],
        vec![
            TableCellData::plain("1"),
            TableCellData::plain("2"),
            TableCellData::plain("3"),
        ],
    ];
    let table = Block::new(BlockType::Table, "").with_meta(BlockMeta {
        rows: Some(rows),
        column_aligns: Some(vec![
            Some(ColumnAlign::Left),
            Some(ColumnAlign::Center),
            Some(ColumnAlign::Right),
        ]),
        ..BlockMeta::default()
    });
    let md = serialize_markdown(&doc(vec![table]));
    assert_eq!(md, "| L | C | R |\n|:---|:---:|---:|\n| 1 | 2 | 3 |\n");
}

#[test]
fn test_blank_lines_between_blocks() {
    let md = serialize_markdown(&doc(vec![
        Block::new(BlockType::Heading1, "Title"),
        Block::paragraph("one"),
        Block::paragraph("two"),
        Block::new(BlockType::BulletList, "a"),
        Block::new(BlockType::BulletList, "b"),
        Block::new(BlockType::Divider, ""),
    ]));
    assert_eq!(md, "# Title\n\none\n\ntwo\n\n- a\n- b\n\n---\n");
}

#[test]
fn test_escaping_plain_text() {
    let md = serialize_markdown(&doc(vec![
        Block::paragraph("# not a heading"),
        Block::paragraph("2 * 3 = [6]"),
    ]));
    assert_eq!(md, "\\# not a heading\n\n2 \\* 3 = \\[6\\]\n");
}

#[test]
fn test_link_reference_output() {
    let content = BlockContent::new(
        "read the docs",
        vec![Mark::link(9, 13, "https://docs.test", None)],
    );
    let mut document = doc(vec![Block::paragraph(content)]);
    document.link_references.insert(
        "docs".to_string(),
        LinkDefinition {
            url: "https://docs.test".to_string(),
            title: None,
        },
    );

    let inline = serialize_markdown(&document);
    assert_eq!(inline, "read the [docs](https://docs.test)\n");

    let options = HashMap::from([("link-references".to_string(), "true".to_string())]);
    let referenced = MarkdownFormat::default()
        .serialize_with_options(&document, &options)
        .unwrap();
    assert_eq!(referenced, "read the [docs][docs]\n\n[docs]: https://docs.test\n");
}

#[test]
fn test_footnote_definition_continuation() {
    let note = Block::new(BlockType::FootnoteDefinition, "Line one")
        .with_meta(BlockMeta {
            identifier: Some("1".into()),
            ..BlockMeta::default()
        })
        .with_children(vec![Block::new(BlockType::BulletList, "point")]);
    let content = BlockContent::new("Text1", vec![Mark::footnote_ref(4, 5, "1")]);
    let md = serialize_markdown(&doc(vec![Block::paragraph(content), note]));
    assert_eq!(md, "Text[^1]\n\n[^1]: Line one\n\n    - point\n");
}

#[test]
fn test_nested_list_with_custom_indent() {
    let options = HashMap::from([
        ("list-indent".to_string(), "4".to_string()),
        ("bullet-char".to_string(), "*".to_string()),
    ]);
    let document = doc(vec![
        Block::new(BlockType::BulletList, "outer"),
        Block::new(BlockType::BulletList, "inner").with_indent(1),
    ]);
    let md = MarkdownFormat::default()
        .serialize_with_options(&document, &options)
        .unwrap();
    assert_eq!(md, "* outer\n    * inner\n");
}

#[test]
fn test_callout_with_children() {
    let callout = Block::new(BlockType::Callout, "")
        .with_meta(BlockMeta {
            callout_type: Some(mdblocks_babel::model::CalloutType::Tip),
            ..BlockMeta::default()
        })
        .with_children(vec![
            Block::paragraph("One"),
            Block::new(BlockType::Todo, "Two"),
        ]);
    let md = serialize_markdown(&doc(vec![callout]));
    assert_eq!(md, ":::tip\nOne\n\n- [ ] Two\n:::\n");
}
