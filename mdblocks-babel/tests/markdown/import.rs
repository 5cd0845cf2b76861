//! Import tests for Markdown format (Markdown → blocks)
//!
//! These tests verify that Markdown documents are correctly converted to
//! blocks by checking block types, text, marks and metadata.

use mdblocks_babel::format::Format;
use mdblocks_babel::formats::markdown::MarkdownFormat;
use mdblocks_babel::model::{Block, BlockType, CalloutType, ColumnAlign, Mark, MarkType};
use mdblocks_babel::{parse_markdown, Document};
use pretty_assertions::assert_eq;

fn types(doc: &Document) -> Vec<BlockType> {
    doc.blocks.iter().map(|b| b.block_type).collect()
}

fn marks(block: &Block) -> Vec<(MarkType, usize, usize)> {
    block
        .content
        .marks()
        .iter()
        .map(|m| (m.kind, m.from, m.to))
        .collect()
}

#[test]
fn test_heading_slugs_are_unique() {
    let doc = parse_markdown("# Test\n# Test\n# Test");
    let slugs: Vec<_> = doc
        .blocks
        .iter()
        .map(|b| b.meta.slug.clone().unwrap_or_default())
        .collect();
    assert_eq!(slugs, vec!["test", "test-1", "test-2"]);
    assert!(doc.blocks.iter().all(|b| b.meta.level == Some(1)));
}

#[test]
fn test_heading_levels() {
    let doc = parse_markdown("## Two\n\n###### Six");
    assert_eq!(types(&doc), vec![BlockType::Heading2, BlockType::Heading6]);
    assert_eq!(doc.blocks[1].meta.level, Some(6));
}

#[test]
fn test_paragraph_marks() {
    let doc = parse_markdown("Some **bold** and *it* with `code`.");
    let block = &doc.blocks[0];
    assert_eq!(block.text(), "Some bold and it with code.");
    assert_eq!(
        marks(block),
        vec![
            (MarkType::Bold, 5, 9),
            (MarkType::Italic, 14, 16),
            (MarkType::Code, 22, 26),
        ]
    );
}

#[test]
fn test_links_keep_href_and_title() {
    let doc = parse_markdown("Go [home](https://example.com \"Home\") now");
    let link = &doc.blocks[0].content.marks()[0];
    assert_eq!(link.kind, MarkType::Link);
    assert_eq!((link.from, link.to), (3, 7));
    assert_eq!(link.attrs.href.as_deref(), Some("https://example.com"));
    assert_eq!(link.attrs.title.as_deref(), Some("Home"));
}

#[test]
fn test_reference_links_resolve() {
    let doc = parse_markdown("See [the docs][Docs].\n\n[docs]: https://docs.test \"Docs\"\n");
    assert_eq!(doc.blocks.len(), 1);
    let link = &doc.blocks[0].content.marks()[0];
    assert_eq!(link.attrs.href.as_deref(), Some("https://docs.test"));
    let definition = &doc.link_references["docs"];
    assert_eq!(definition.url, "https://docs.test");
    assert_eq!(definition.title.as_deref(), Some("Docs"));
}

#[test]
fn test_extended_inline_syntax() {
    let doc = parse_markdown("==hi== H~2~O x^2^ ~~gone~~");
    let block = &doc.blocks[0];
    assert_eq!(block.text(), "hi H2O x2 gone");
    assert_eq!(
        marks(block),
        vec![
            (MarkType::Highlight, 0, 2),
            (MarkType::Subscript, 4, 5),
            (MarkType::Superscript, 8, 9),
            (MarkType::Strikethrough, 10, 14),
        ]
    );
}

#[test]
fn test_highlight_spans_other_formatting() {
    let doc = parse_markdown("==a **b** c==");
    let block = &doc.blocks[0];
    assert_eq!(block.text(), "a b c");
    assert_eq!(
        marks(block),
        vec![(MarkType::Highlight, 0, 5), (MarkType::Bold, 2, 3)]
    );
}

#[test]
fn test_inline_html_formatting() {
    let doc = parse_markdown("<u>under</u> and <mark>marked</mark>");
    let block = &doc.blocks[0];
    assert_eq!(block.text(), "under and marked");
    assert_eq!(
        marks(block),
        vec![(MarkType::Underline, 0, 5), (MarkType::Highlight, 10, 16)]
    );
}

#[test]
fn test_lists_are_flattened_with_indent() {
    let doc = parse_markdown("- a\n  - b\n    1. c\n- d\n");
    let flat: Vec<_> = doc
        .blocks
        .iter()
        .map(|b| (b.block_type, b.text().to_string(), b.indent))
        .collect();
    assert_eq!(
        flat,
        vec![
            (BlockType::BulletList, "a".to_string(), 0),
            (BlockType::BulletList, "b".to_string(), 1),
            (BlockType::NumberedList, "c".to_string(), 2),
            (BlockType::BulletList, "d".to_string(), 0),
        ]
    );
    assert!(doc.blocks.iter().all(|b| b.children.is_empty()));
}

#[test]
fn test_task_items() {
    let doc = parse_markdown("- [x] done\n- [ ] open\n");
    assert_eq!(types(&doc), vec![BlockType::Todo, BlockType::Todo]);
    assert_eq!(doc.blocks[0].meta.checked, Some(true));
    assert_eq!(doc.blocks[1].meta.checked, Some(false));
    assert_eq!(doc.blocks[1].text(), "open");
}

#[test]
fn test_ordered_list_start() {
    let doc = parse_markdown("3. three\n4. four\n");
    assert_eq!(doc.blocks[0].meta.start, Some(3));
    assert_eq!(doc.blocks[1].meta.start, None);
}

#[test]
fn test_list_item_paragraphs_follow_the_item() {
    let doc = parse_markdown("- item\n\n  more text\n");
    assert_eq!(types(&doc), vec![BlockType::BulletList, BlockType::Paragraph]);
    assert_eq!(doc.blocks[1].indent, 1);
    assert_eq!(doc.blocks[1].text(), "more text");
}

#[test]
fn test_quote_and_blockquote() {
    let doc = parse_markdown("> one\n\n> two\n>\n> three\n");
    assert_eq!(types(&doc), vec![BlockType::Quote, BlockType::Blockquote]);
    assert_eq!(doc.blocks[0].text(), "one");
    assert!(doc.blocks[0].children.is_empty());
    let children: Vec<_> = doc.blocks[1].children.iter().map(|b| b.text()).collect();
    assert_eq!(children, vec!["two", "three"]);
}

#[test]
fn test_code_blocks() {
    let doc = parse_markdown("```rust\nfn main() {}\n```\n\n```\n**raw**\n```\n\n```mermaid\ngraph TD\n```\n");
    assert_eq!(
        types(&doc),
        vec![BlockType::Code, BlockType::Code, BlockType::Mermaid]
    );
    assert_eq!(doc.blocks[0].meta.language.as_deref(), Some("rust"));
    assert_eq!(doc.blocks[1].meta.language.as_deref(), Some("plaintext"));
    assert_eq!(doc.blocks[1].text(), "**raw**");
    assert!(doc.blocks[1].content.marks().is_empty());
    assert_eq!(doc.blocks[2].meta.mermaid_code.as_deref(), Some("graph TD"));
}

#[test]
fn test_math_blocks() {
    let doc = parse_markdown("$$x^2$$\n\n```math\ny_1\n```\n");
    assert_eq!(types(&doc), vec![BlockType::MathBlock, BlockType::MathBlock]);
    assert_eq!(doc.blocks[0].text(), "x^2");
    assert_eq!(doc.blocks[0].meta.latex.as_deref(), Some("x^2"));
    assert_eq!(doc.blocks[1].meta.latex.as_deref(), Some("y_1"));
}

#[test]
fn test_inline_math_stays_text() {
    let doc = parse_markdown("Area is $\\pi r^2$ here");
    assert_eq!(doc.blocks[0].text(), "Area is $\\pi r^2$ here");
    assert!(doc.blocks[0].content.marks().is_empty());
}

#[test]
fn test_table() {
    let doc = parse_markdown("| a | b | c |\n|:---|:---:|---:|\n| 1 | **2** |\n");
    assert_eq!(types(&doc), vec![BlockType::Table]);
    let meta = &doc.blocks[0].meta;
    assert_eq!(
        meta.column_aligns,
        Some(vec![
            Some(ColumnAlign::Left),
            Some(ColumnAlign::Center),
            Some(ColumnAlign::Right)
        ])
    );
    let rows = meta.rows.as_ref().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].len(), 3);
    assert_eq!(rows[1][1].content.text, "2");
    assert_eq!(rows[1][1].content.marks, vec![Mark::new(MarkType::Bold, 0, 1)]);
}

#[test]
fn test_callout_names() {
    for (name, expected) in [
        ("note", CalloutType::Note),
        ("tip", CalloutType::Tip),
        ("info", CalloutType::Info),
        ("warning", CalloutType::Warning),
        ("danger", CalloutType::Error),
        ("error", CalloutType::Error),
        ("success", CalloutType::Success),
        ("important", CalloutType::Warning),
        ("caution", CalloutType::Warning),
    ] {
        let doc = parse_markdown(&format!(":::{name}\nBody\n:::\n"));
        assert_eq!(doc.blocks[0].block_type, BlockType::Callout, "{name}");
        assert_eq!(doc.blocks[0].meta.callout_type, Some(expected), "{name}");
        assert_eq!(doc.blocks[0].text(), "Body");
    }
}

#[test]
fn test_callout_with_several_blocks_keeps_children() {
    let doc = parse_markdown(":::tip\nOne\n\n- two\n:::\n");
    let callout = &doc.blocks[0];
    assert!(callout.content.is_empty());
    let children: Vec<_> = callout.children.iter().map(|b| b.block_type).collect();
    assert_eq!(children, vec![BlockType::Paragraph, BlockType::BulletList]);
}

#[test]
fn test_images() {
    let doc = parse_markdown("![Alt](pic.png \"Title\")\n\nInline ![icon](i.png) image\n");
    let image = &doc.blocks[0];
    assert_eq!(image.block_type, BlockType::Image);
    assert_eq!(image.meta.src.as_deref(), Some("pic.png"));
    assert_eq!(image.meta.alt.as_deref(), Some("Alt"));
    assert_eq!(image.meta.title.as_deref(), Some("Title"));
    assert_eq!(doc.blocks[1].block_type, BlockType::Paragraph);
    assert_eq!(doc.blocks[1].text(), "Inline icon image");
}

#[test]
fn test_raw_html_blocks() {
    let doc = parse_markdown("<hr>\n\n<div>\n<b>kept</b>\n</div>\n\n<!-- gone -->\n");
    assert_eq!(types(&doc), vec![BlockType::Divider, BlockType::Paragraph]);
    assert_eq!(doc.blocks[1].text(), "kept");
}

#[test]
fn test_details_become_toggles() {
    let doc = parse_markdown(
        "<details open>\n<summary>More &amp; less</summary>\n\nInside\n\n</details>\n\nAfter\n",
    );
    assert_eq!(types(&doc), vec![BlockType::Toggle, BlockType::Paragraph]);
    let toggle = &doc.blocks[0];
    assert_eq!(toggle.text(), "More & less");
    assert_eq!(toggle.meta.collapsed, Some(false));
    assert_eq!(toggle.children.len(), 1);
    assert_eq!(toggle.children[0].text(), "Inside");
}

#[test]
fn test_footnotes() {
    let doc = parse_markdown("Claim.[^src]\n\n[^src]: The source.\n");
    let paragraph = &doc.blocks[0];
    assert_eq!(paragraph.text(), "Claim.src");
    let note = &paragraph.content.marks()[0];
    assert_eq!(note.kind, MarkType::FootnoteRef);
    assert_eq!(note.attrs.footnote_id.as_deref(), Some("src"));

    let definition = &doc.blocks[1];
    assert_eq!(definition.block_type, BlockType::FootnoteDefinition);
    assert_eq!(definition.meta.identifier.as_deref(), Some("src"));
    assert_eq!(definition.text(), "The source.");
    assert_eq!(doc.footnotes["src"].text(), "The source.");
}

#[test]
fn test_unclosed_bold_is_one_paragraph() {
    let doc = parse_markdown("This is **unclosed bold");
    assert_eq!(types(&doc), vec![BlockType::Paragraph]);
    assert_eq!(doc.blocks[0].text(), "This is **unclosed bold");
    assert!(doc.warnings.is_empty());
}

#[test]
fn test_blank_document() {
    let doc = MarkdownFormat::default().parse("\n\n").unwrap();
    assert_eq!(types(&doc), vec![BlockType::Paragraph]);
    assert_eq!(doc.blocks[0].text(), "");
}

#[test]
fn test_block_ids_are_unique() {
    let doc = parse_markdown("a\n\nb\n\nc");
    let mut ids: Vec<_> = doc.blocks.iter().map(|b| b.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}
