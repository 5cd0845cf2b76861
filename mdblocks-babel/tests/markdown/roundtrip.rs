//! Round-trip tests: blocks → Markdown → blocks, and Markdown idempotence.

use mdblocks_babel::model::{
    Block, BlockContent, BlockMeta, BlockType, CalloutType, ColumnAlign, Mark, MarkType,
    TableCellData,
};
use mdblocks_babel::{parse_markdown, serialize_markdown, Document};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"))
}

fn shape(doc: &Document) -> Vec<(BlockType, String)> {
    doc.blocks
        .iter()
        .map(|b| (b.block_type, b.text().to_string()))
        .collect()
}

fn meta(f: impl FnOnce(&mut BlockMeta)) -> BlockMeta {
    let mut meta = BlockMeta::default();
    f(&mut meta);
    meta
}

fn every_block_type() -> Vec<Block> {
    let table_rows = vec![
        vec![TableCellData::plain("a"), TableCellData::plain("b")],
        vec![TableCellData::plain("1"), TableCellData::plain("2")],
    ];
    vec![
        Block::new(BlockType::Heading1, "Title"),
        Block::paragraph(BlockContent::new(
            "bold and high",
            vec![
                Mark::new(MarkType::Bold, 0, 4),
                Mark::new(MarkType::Highlight, 9, 13),
            ],
        )),
        Block::new(BlockType::BulletList, "item"),
        Block::new(BlockType::NumberedList, "first"),
        Block::new(BlockType::Todo, "done").with_meta(meta(|m| m.checked = Some(true))),
        Block::new(BlockType::Quote, "said"),
        Block::new(BlockType::Code, "let x = 1;")
            .with_meta(meta(|m| m.language = Some("rust".into()))),
        Block::new(BlockType::Mermaid, "graph TD"),
        Block::new(BlockType::MathBlock, "x^2"),
        Block::new(BlockType::Divider, ""),
        Block::new(BlockType::Table, "").with_meta(meta(|m| {
            m.rows = Some(table_rows);
            m.column_aligns = Some(vec![None, None]);
        })),
        Block::new(BlockType::Callout, "careful")
            .with_meta(meta(|m| m.callout_type = Some(CalloutType::Note))),
        Block::new(BlockType::Container, "")
            .with_meta(meta(|m| m.container_type = Some("columns".into())))
            .with_children(vec![Block::paragraph("left")]),
        Block::new(BlockType::Toggle, "more").with_children(vec![Block::paragraph("hidden")]),
        Block::new(BlockType::Image, "").with_meta(meta(|m| {
            m.src = Some("pic.png".into());
            m.alt = Some("pic".into());
        })),
        Block::new(BlockType::Embed, "")
            .with_meta(meta(|m| m.src = Some("https://youtu.be/abc".into()))),
        Block::paragraph(BlockContent::new(
            "Claim1",
            vec![Mark::footnote_ref(5, 6, "1")],
        )),
        Block::new(BlockType::FootnoteDefinition, "proof")
            .with_meta(meta(|m| m.identifier = Some("1".into()))),
    ]
}

#[test]
fn test_every_block_type_round_trips() {
    let original = Document::from_blocks(every_block_type());
    let md = serialize_markdown(&original);
    let parsed = parse_markdown(&md);
    assert_eq!(shape(&parsed), shape(&original));
    assert!(parsed.warnings.is_empty());

    assert_eq!(parsed.blocks[1].content.marks(), original.blocks[1].content.marks());
    assert_eq!(parsed.blocks[4].meta.checked, Some(true));
    assert_eq!(parsed.blocks[6].meta.language.as_deref(), Some("rust"));
    assert_eq!(parsed.blocks[12].meta.container_type.as_deref(), Some("columns"));
    assert_eq!(parsed.blocks[13].children[0].text(), "hidden");
    assert_eq!(parsed.blocks[15].meta.src.as_deref(), Some("https://youtu.be/abc"));
}

#[test]
fn test_footnote_definitions_keep_their_place() {
    let blocks = vec![
        Block::new(BlockType::FootnoteDefinition, "orphan")
            .with_meta(meta(|m| m.identifier = Some("a".into()))),
        Block::paragraph("Para"),
    ];
    let original = Document::from_blocks(blocks);
    let parsed = parse_markdown(&serialize_markdown(&original));
    assert_eq!(shape(&parsed), shape(&original));
    assert_eq!(parsed.footnotes["a"].text(), "orphan");

    let doc = parse_markdown("Claim[^1]\n\n[^1]: proof\n\nAfter para");
    assert_eq!(
        shape(&doc),
        vec![
            (BlockType::Paragraph, "Claim1".to_string()),
            (BlockType::FootnoteDefinition, "proof".to_string()),
            (BlockType::Paragraph, "After para".to_string()),
        ]
    );
    assert_eq!(doc.blocks[0].content.marks()[0].kind, MarkType::FootnoteRef);
}

#[test]
fn test_literal_delimiters_stay_text() {
    for text in ["2^10^ bytes", "a ==b== c", "H~2~O", "x = y == z"] {
        let md = serialize_markdown(&Document::from_blocks(vec![Block::paragraph(text)]));
        let parsed = parse_markdown(&md);
        assert_eq!(parsed.blocks[0].text(), text, "{md:?}");
        assert!(parsed.blocks[0].content.marks().is_empty(), "{md:?}");
    }
}

#[test]
fn test_serialize_is_idempotent_over_parse() {
    let first = serialize_markdown(&Document::from_blocks(every_block_type()));
    let second = serialize_markdown(&parse_markdown(&first));
    assert_eq!(second, first);
}

#[test]
fn test_kitchensink_is_idempotent() {
    let source = fixture("kitchensink.md");
    let first = serialize_markdown(&parse_markdown(&source));
    let second = serialize_markdown(&parse_markdown(&first));
    assert_eq!(second, first);
}

#[test]
fn test_kitchensink_structure() {
    let doc = parse_markdown(&fixture("kitchensink.md"));
    assert!(doc.warnings.is_empty(), "{:?}", doc.warnings);

    let types: Vec<_> = doc.blocks.iter().map(|b| b.block_type).collect();
    for expected in [
        BlockType::Heading1,
        BlockType::Heading2,
        BlockType::BulletList,
        BlockType::NumberedList,
        BlockType::Todo,
        BlockType::Quote,
        BlockType::Blockquote,
        BlockType::Code,
        BlockType::Mermaid,
        BlockType::MathBlock,
        BlockType::Divider,
        BlockType::Table,
        BlockType::Callout,
        BlockType::Container,
        BlockType::Toggle,
        BlockType::FootnoteDefinition,
        BlockType::Image,
    ] {
        assert!(types.contains(&expected), "missing {expected:?}");
    }

    let nested: Vec<_> = doc
        .blocks
        .iter()
        .filter(|b| b.indent > 0)
        .map(|b| (b.text(), b.indent))
        .collect();
    assert_eq!(nested, vec![("Nested", 1), ("Deep one", 2), ("Deep two", 2)]);

    let three = doc.blocks.iter().find(|b| b.text() == "Three").unwrap();
    assert_eq!(three.meta.start, Some(3));

    let paragraph = &doc.blocks[1];
    let kinds: Vec<_> = paragraph.content.marks().iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MarkType::Bold,
            MarkType::Italic,
            MarkType::Strikethrough,
            MarkType::Highlight,
            MarkType::Subscript,
            MarkType::Superscript,
            MarkType::Code,
            MarkType::Link,
        ]
    );
}

#[test]
fn test_overlapping_marks_survive() {
    let original = vec![
        Mark::new(MarkType::Bold, 1, 7),
        Mark::new(MarkType::Italic, 3, 8),
        Mark::new(MarkType::Strikethrough, 5, 9),
    ];
    let block = Block::paragraph(BlockContent::new("ABCDEFGHIJ", original.clone()));
    let md = serialize_markdown(&Document::from_blocks(vec![block]));
    let parsed = parse_markdown(&md);
    let content = &parsed.blocks[0].content;
    assert_eq!(content.text(), "ABCDEFGHIJ");

    for mark in &original {
        for offset in mark.from..mark.to {
            let covered = content
                .marks()
                .iter()
                .any(|m| m.kind == mark.kind && m.from <= offset && offset < m.to);
            assert!(covered, "{:?} lost offset {offset} in {md:?}", mark.kind);
        }
    }
    for mark in content.marks() {
        assert!(
            original.iter().any(|o| o.kind == mark.kind && o.from <= mark.from && mark.to <= o.to),
            "unexpected {mark:?}"
        );
    }
}

#[test]
fn test_table_alignments_survive() {
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
    let aligns = vec![
        Some(ColumnAlign::Left),
        Some(ColumnAlign::Center),
        Some(ColumnAlign::Right),
    ];
    let table = Block::new(BlockType::Table, "").with_meta(meta(|m| {
        m.rows = Some(rows.clone());
        m.column_aligns = Some(aligns.clone());
    }));
    let md = serialize_markdown(&Document::from_blocks(vec![table]));
    assert!(md.contains("|:---|:---:|---:|"));

    let parsed = parse_markdown(&md);
    assert_eq!(parsed.blocks[0].meta.column_aligns, Some(aligns));
    assert_eq!(parsed.blocks[0].meta.rows, Some(rows));
}

#[test]
fn test_escaped_text_round_trips() {
    let text = "1. not a list, *stars* and [brackets] \\ <tag> & $5";
    let md = serialize_markdown(&Document::from_blocks(vec![Block::paragraph(text)]));
    let parsed = parse_markdown(&md);
    assert_eq!(parsed.blocks.len(), 1);
    assert_eq!(parsed.blocks[0].text(), text);
    assert!(parsed.blocks[0].content.marks().is_empty());
}
