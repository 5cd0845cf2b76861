//! comrak block tree into content blocks.
//!
//! Lists are flattened: every item becomes a sibling block and its nesting
//! depth is carried in `indent`. Blockquotes, callouts, containers, toggles
//! and footnote definitions keep real `children`.

use super::inlines::{kind_name, text_of, InlineCollector};
use crate::common::slug::SlugRegistry;
use crate::model::{
    normalize_rows, Block, BlockContent, BlockMeta, BlockType, ColumnAlign, Content,
    ParseWarning, TableCellData,
};
use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("tag pattern is valid"));
static HR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<hr\s*/?>").expect("hr pattern is valid"));
static DETAILS_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<details(\s[^>]*)?>").expect("details pattern is valid"));
static DETAILS_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</details\s*>").expect("details pattern is valid"));
static SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<summary[^>]*>(.*?)</summary\s*>").expect("summary pattern is valid")
});

/// State shared by every chunk of one parse.
#[derive(Debug, Default)]
pub(crate) struct ParseState {
    pub slugs: SlugRegistry,
    pub footnotes: BTreeMap<String, Block>,
    pub warnings: Vec<ParseWarning>,
}

/// Transforms one comrak tree. `lines` are the chunk's source lines and
/// `line_offset` places them within the whole document.
pub(crate) struct Transformer<'t, 's> {
    state: &'t mut ParseState,
    lines: &'s [&'s str],
    line_offset: usize,
    stubs_from: usize,
}

impl<'t, 's> Transformer<'t, 's> {
    pub fn new(state: &'t mut ParseState, lines: &'s [&'s str], line_offset: usize) -> Self {
        Transformer {
            state,
            lines,
            line_offset,
            stubs_from: usize::MAX,
        }
    }

    /// Footnote definitions starting at or after 1-based chunk line `line`
    /// are placeholders appended by the parser and produce no blocks.
    pub fn stubs_from(mut self, line: usize) -> Self {
        self.stubs_from = line;
        self
    }

    /// Blocks for the children of `parent`, grouping `<details>` runs into toggles.
    pub fn blocks<'a>(&mut self, parent: &'a AstNode<'a>, indent: usize) -> Vec<Block> {
        let children: Vec<&'a AstNode<'a>> = parent.children().collect();
        let mut out = Vec::new();
        let mut i = 0;
        while i < children.len() {
            i = self.block_at(&children, i, indent, &mut out);
        }
        out
    }

    /// Transforms `nodes[i]` and returns the index of the next node to visit.
    fn block_at<'a>(
        &mut self,
        nodes: &[&'a AstNode<'a>],
        i: usize,
        indent: usize,
        out: &mut Vec<Block>,
    ) -> usize {
        let node = nodes[i];
        let html = match &node.data.borrow().value {
            NodeValue::HtmlBlock(html) => Some(html.literal.clone()),
            _ => None,
        };
        match html {
            Some(literal) if DETAILS_OPEN.is_match(&literal) => {
                self.toggle(nodes, i, &literal, indent, out)
            }
            _ => {
                self.block(node, indent, out);
                i + 1
            }
        }
    }

    fn content<'a>(&mut self, node: &'a AstNode<'a>) -> BlockContent {
        let mut collector = InlineCollector::new(self.lines);
        collector.collect_children(node);
        let (content, unknown) = collector.finish();
        for (kind, line, column) in unknown {
            self.warn_at(format!("Unknown node type: {kind}"), line, column);
        }
        content
    }

    fn warn_at(&mut self, message: String, line: usize, column: usize) {
        let line = line + self.line_offset;
        tracing::warn!(line, column, "{message}");
        self.state.warnings.push(ParseWarning::at(message, line, column));
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>, indent: usize, out: &mut Vec<Block>) {
        let data = node.data.borrow();
        match &data.value {
            NodeValue::Document => out.extend(self.blocks(node, indent)),
            NodeValue::Paragraph => out.push(self.paragraph(node).with_indent(indent)),
            NodeValue::Heading(heading) => {
                let content = self.content(node);
                let level = heading.level.clamp(1, 6);
                let slug = self.state.slugs.slug_for(&content.text);
                let meta = BlockMeta {
                    level: Some(level),
                    slug: Some(slug),
                    ..BlockMeta::default()
                };
                out.push(
                    Block::new(BlockType::heading(level), content)
                        .with_meta(meta)
                        .with_indent(indent),
                );
            }
            NodeValue::BlockQuote => out.push(self.blockquote(node).with_indent(indent)),
            NodeValue::List(list) => {
                let ordered = list.list_type == ListType::Ordered;
                let start = list.start as u64;
                for (n, item) in node.children().enumerate() {
                    let first_start = (ordered && n == 0 && start != 1).then_some(start);
                    self.list_item(item, ordered, first_start, indent, out);
                }
            }
            NodeValue::Item(_) | NodeValue::TaskItem(_) => {
                self.list_item(node, false, None, indent, out)
            }
            NodeValue::CodeBlock(code) => {
                out.push(code_block(&code.info, &code.literal).with_indent(indent))
            }
            NodeValue::HtmlBlock(html) => {
                if let Some(block) = html_block(&html.literal) {
                    out.push(block.with_indent(indent));
                }
            }
            NodeValue::ThematicBreak => {
                out.push(Block::new(BlockType::Divider, "").with_indent(indent))
            }
            NodeValue::Table(table) => {
                let aligns = table.alignments.clone();
                out.push(self.table(node, &aligns).with_indent(indent));
            }
            NodeValue::FootnoteDefinition(_)
                if data.sourcepos.start.line >= self.stubs_from => {}
            NodeValue::FootnoteDefinition(definition) => {
                let name = definition.name.clone();
                let block = footnote_block(&name, self.blocks(node, 0));
                self.state.footnotes.entry(name).or_insert_with(|| block.clone());
                out.push(block.with_indent(indent));
            }
            other => {
                let pos = &data.sourcepos.start;
                let message = format!("Unknown node type: {}", kind_name(other));
                self.warn_at(message, pos.line, pos.column);
                if node.first_child().is_some() {
                    out.extend(self.blocks(node, indent));
                } else {
                    let text = text_of(node);
                    if !text.trim().is_empty() {
                        out.push(Block::paragraph(text).with_indent(indent));
                    }
                }
            }
        }
    }

    fn paragraph<'a>(&mut self, node: &'a AstNode<'a>) -> Block {
        let children: Vec<&'a AstNode<'a>> = node.children().collect();
        if let [only] = children.as_slice() {
            match &only.data.borrow().value {
                NodeValue::Math(math) if math.display_math => {
                    return math_block(math.literal.trim());
                }
                NodeValue::Image(link) => {
                    let title = Some(link.title.clone()).filter(|t| !t.is_empty());
                    let meta = BlockMeta {
                        src: Some(link.url.clone()),
                        alt: Some(text_of(only)),
                        title,
                        ..BlockMeta::default()
                    };
                    return Block::new(BlockType::Image, "").with_meta(meta);
                }
                _ => {}
            }
        }
        Block::paragraph(self.content(node))
    }

    fn blockquote<'a>(&mut self, node: &'a AstNode<'a>) -> Block {
        let only_paragraph = node.children().count() == 1
            && node
                .first_child()
                .is_some_and(|c| matches!(c.data.borrow().value, NodeValue::Paragraph));
        if only_paragraph {
            if let Some(paragraph) = node.first_child() {
                return Block::new(BlockType::Quote, self.content(paragraph));
            }
        }
        let children = self.blocks(node, 0);
        Block::new(BlockType::Blockquote, "").with_children(children)
    }

    fn list_item<'a>(
        &mut self,
        item: &'a AstNode<'a>,
        ordered: bool,
        start: Option<u64>,
        indent: usize,
        out: &mut Vec<Block>,
    ) {
        let checked = match &item.data.borrow().value {
            NodeValue::TaskItem(symbol) => Some(symbol.is_some_and(|c| c != ' ')),
            _ => None,
        };
        let block_type = match (checked, ordered) {
            (Some(_), _) => BlockType::Todo,
            (None, true) => BlockType::NumberedList,
            (None, false) => BlockType::BulletList,
        };

        let children: Vec<&'a AstNode<'a>> = item.children().collect();
        let lead = children
            .iter()
            .position(|c| matches!(c.data.borrow().value, NodeValue::Paragraph));
        let content = match lead {
            Some(pos) => Content::Rich(self.content(children[pos])),
            None => Content::default(),
        };
        let meta = BlockMeta {
            checked,
            start,
            ..BlockMeta::default()
        };
        out.push(
            Block::new(block_type, content)
                .with_meta(meta)
                .with_indent(indent),
        );

        let mut i = 0;
        while i < children.len() {
            if Some(i) == lead {
                i += 1;
                continue;
            }
            i = self.block_at(&children, i, indent + 1, out);
        }
    }

    fn table<'a>(&mut self, node: &'a AstNode<'a>, aligns: &[TableAlignment]) -> Block {
        let mut rows: Vec<Vec<TableCellData>> = Vec::new();
        for row in node.children() {
            let cells = row
                .children()
                .map(|cell| TableCellData::new(self.content(cell)))
                .collect();
            rows.push(cells);
        }
        let width = normalize_rows(&mut rows);
        let mut column_aligns: Vec<Option<ColumnAlign>> = aligns
            .iter()
            .map(|align| match align {
                TableAlignment::Left => Some(ColumnAlign::Left),
                TableAlignment::Center => Some(ColumnAlign::Center),
                TableAlignment::Right => Some(ColumnAlign::Right),
                TableAlignment::None => None,
            })
            .collect();
        column_aligns.resize(width.max(column_aligns.len()), None);
        let meta = BlockMeta {
            rows: Some(rows),
            column_aligns: Some(column_aligns),
            ..BlockMeta::default()
        };
        Block::new(BlockType::Table, "").with_meta(meta)
    }

    /// Groups the siblings after a `<details>` block up to its matching
    /// `</details>` into a toggle.
    fn toggle<'a>(
        &mut self,
        nodes: &[&'a AstNode<'a>],
        i: usize,
        literal: &str,
        indent: usize,
        out: &mut Vec<Block>,
    ) -> usize {
        let open_attrs = DETAILS_OPEN
            .captures(literal)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        let collapsed = !open_attrs.split_whitespace().any(|a| a.starts_with("open"));
        let summary = SUMMARY
            .captures(literal)
            .map(|caps| decode_entities(TAG.replace_all(&caps[1], "").trim()))
            .unwrap_or_default();

        let mut children = Vec::new();
        let after_summary = SUMMARY
            .find(literal)
            .map(|m| &literal[m.end()..])
            .unwrap_or_else(|| DETAILS_OPEN.splitn(literal, 2).nth(1).unwrap_or_default());
        let inline_body = DETAILS_CLOSE.splitn(after_summary, 2).next().unwrap_or_default();
        let inline_text = decode_entities(TAG.replace_all(inline_body, "").trim());
        if !inline_text.is_empty() {
            children.push(Block::paragraph(inline_text));
        }

        let mut next = i + 1;
        if !DETAILS_CLOSE.is_match(literal) {
            let mut depth = 1usize;
            while next < nodes.len() {
                let closing = match &nodes[next].data.borrow().value {
                    NodeValue::HtmlBlock(html) => {
                        depth += DETAILS_OPEN.find_iter(&html.literal).count();
                        depth = depth.saturating_sub(DETAILS_CLOSE.find_iter(&html.literal).count());
                        depth == 0
                    }
                    _ => false,
                };
                if closing {
                    next += 1;
                    break;
                }
                next = self.block_at(nodes, next, 0, &mut children);
            }
        }

        let meta = BlockMeta {
            collapsed: Some(collapsed),
            ..BlockMeta::default()
        };
        out.push(
            Block::new(BlockType::Toggle, summary)
                .with_meta(meta)
                .with_children(children)
                .with_indent(indent),
        );
        next
    }
}

fn math_block(latex: &str) -> Block {
    let meta = BlockMeta {
        latex: Some(latex.to_string()),
        ..BlockMeta::default()
    };
    Block::new(BlockType::MathBlock, latex).with_meta(meta)
}

fn code_block(info: &str, literal: &str) -> Block {
    let body = literal.strip_suffix('\n').unwrap_or(literal);
    let language = info.split_whitespace().next().unwrap_or_default();
    match language {
        "mermaid" => {
            let meta = BlockMeta {
                mermaid_code: Some(body.to_string()),
                ..BlockMeta::default()
            };
            Block::new(BlockType::Mermaid, body).with_meta(meta)
        }
        "math" | "latex" => math_block(body),
        _ => {
            let language = if language.is_empty() {
                "plaintext"
            } else {
                language
            };
            let meta = BlockMeta {
                language: Some(language.to_string()),
                ..BlockMeta::default()
            };
            Block::new(BlockType::Code, body).with_meta(meta)
        }
    }
}

fn html_block(literal: &str) -> Option<Block> {
    if HR.is_match(literal) {
        return Some(Block::new(BlockType::Divider, ""));
    }
    let text = decode_entities(TAG.replace_all(literal, "").trim());
    (!text.is_empty()).then(|| Block::paragraph(text))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// A footnote definition: the first body block supplies its content and the
/// rest become children.
pub(crate) fn footnote_block(name: &str, mut children: Vec<Block>) -> Block {
    let content = if children.is_empty() {
        Content::default()
    } else {
        children.remove(0).content
    };
    let meta = BlockMeta {
        identifier: Some(name.to_string()),
        ..BlockMeta::default()
    };
    Block::new(BlockType::FootnoteDefinition, content)
        .with_meta(meta)
        .with_children(children)
}
