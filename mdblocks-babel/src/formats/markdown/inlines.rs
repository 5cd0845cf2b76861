//! comrak inline nodes into flat block content.

use crate::common::nested_to_flat::ContentBuilder;
use crate::model::{BlockContent, MarkAttrs, MarkType};
use comrak::nodes::{AstNode, NodeValue};
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<(/?)([A-Za-z][A-Za-z0-9]*)\b[^>]*?(/?)>$").expect("tag pattern is valid")
});

/// Maps an inline HTML tag to the mark it stands for.
fn tag_mark(tag: &str) -> Option<MarkType> {
    match tag.to_ascii_lowercase().as_str() {
        "u" | "ins" => Some(MarkType::Underline),
        "mark" => Some(MarkType::Highlight),
        "sub" => Some(MarkType::Subscript),
        "sup" => Some(MarkType::Superscript),
        "s" | "del" | "strike" => Some(MarkType::Strikethrough),
        "b" | "strong" => Some(MarkType::Bold),
        "i" | "em" => Some(MarkType::Italic),
        _ => None,
    }
}

/// Name of a node kind for diagnostics, e.g. `DescriptionList`.
pub(crate) fn kind_name(value: &NodeValue) -> String {
    let debug = format!("{value:?}");
    debug
        .split(|c: char| c == '(' || c == ' ' || c == '{')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Walks the inline children of one block.
pub(crate) struct InlineCollector<'s> {
    lines: &'s [&'s str],
    builder: ContentBuilder,
    open_tags: Vec<(MarkType, usize)>,
    /// Kinds met that have no inline mapping, with their 1-based position.
    pub unknown: Vec<(String, usize, usize)>,
}

impl<'s> InlineCollector<'s> {
    pub fn new(lines: &'s [&'s str]) -> Self {
        InlineCollector {
            lines,
            builder: ContentBuilder::new(),
            open_tags: Vec::new(),
            unknown: Vec::new(),
        }
    }

    pub fn collect_children<'a>(&mut self, node: &'a AstNode<'a>) {
        for child in node.children() {
            self.collect(child);
        }
    }

    pub fn finish(self) -> (BlockContent, Vec<(String, usize, usize)>) {
        (self.builder.finish(), self.unknown)
    }

    fn wrap<'a>(&mut self, node: &'a AstNode<'a>, kind: MarkType) {
        let start = self.builder.start();
        self.collect_children(node);
        self.builder.mark(kind, start);
    }

    fn collect<'a>(&mut self, node: &'a AstNode<'a>) {
        let data = node.data.borrow();
        match &data.value {
            NodeValue::Text(text) => self.builder.push_text(text),
            NodeValue::SoftBreak | NodeValue::LineBreak => self.builder.push_verbatim("\n"),
            NodeValue::Escaped => self.builder.push_verbatim(&text_of(node)),
            NodeValue::Code(code) => {
                let start = self.builder.start();
                self.builder.push_verbatim(&code.literal);
                self.builder.mark(MarkType::Code, start);
            }
            NodeValue::Emph => self.wrap(node, MarkType::Italic),
            NodeValue::Strong => self.wrap(node, MarkType::Bold),
            NodeValue::Superscript => self.wrap(node, MarkType::Superscript),
            NodeValue::Strikethrough => {
                let (line, column) = (data.sourcepos.start.line, data.sourcepos.start.column);
                if !self.is_single_tilde(line, column) {
                    self.wrap(node, MarkType::Strikethrough);
                } else if text_of(node).contains(char::is_whitespace) {
                    self.builder.push_verbatim("~");
                    self.collect_children(node);
                    self.builder.push_verbatim("~");
                } else {
                    self.wrap(node, MarkType::Subscript);
                }
            }
            NodeValue::Link(link) => {
                let start = self.builder.start();
                self.collect_children(node);
                let attrs = MarkAttrs {
                    href: Some(link.url.clone()),
                    title: Some(link.title.clone()).filter(|t| !t.is_empty()),
                    footnote_id: None,
                };
                self.builder.mark_with(MarkType::Link, start, attrs);
            }
            NodeValue::Image(_) => {
                let alt = text_of(node);
                self.builder.push_text(&alt);
            }
            NodeValue::FootnoteReference(reference) => {
                let start = self.builder.start();
                self.builder.push_verbatim(&reference.name);
                let attrs = MarkAttrs {
                    footnote_id: Some(reference.name.clone()),
                    ..MarkAttrs::default()
                };
                self.builder.mark_with(MarkType::FootnoteRef, start, attrs);
            }
            NodeValue::Math(math) => {
                let fence = if math.display_math { "$$" } else { "$" };
                self.builder
                    .push_verbatim(&format!("{fence}{}{fence}", math.literal));
            }
            NodeValue::HtmlInline(raw) => self.html_tag(raw),
            other => {
                let pos = &data.sourcepos.start;
                self.unknown.push((kind_name(other), pos.line, pos.column));
                self.collect_children(node);
            }
        }
    }

    /// Whether the delimiter at the 1-based position is a lone `~`.
    fn is_single_tilde(&self, line: usize, column: usize) -> bool {
        let Some(source) = line.checked_sub(1).and_then(|i| self.lines.get(i)) else {
            return false;
        };
        let bytes = source.as_bytes();
        let Some(at) = column.checked_sub(1) else {
            return false;
        };
        bytes.get(at) == Some(&b'~') && bytes.get(at + 1) != Some(&b'~')
    }

    fn html_tag(&mut self, raw: &str) {
        let Some(caps) = HTML_TAG.captures(raw.trim()) else {
            return;
        };
        let name = &caps[2];
        if name.eq_ignore_ascii_case("br") {
            self.builder.push_verbatim("\n");
            return;
        }
        let Some(kind) = tag_mark(name) else {
            return;
        };
        if !caps[3].is_empty() {
            return;
        }
        if caps[1].is_empty() {
            self.open_tags.push((kind, self.builder.start()));
        } else if let Some(pos) = self.open_tags.iter().rposition(|(open, _)| *open == kind) {
            let (kind, start) = self.open_tags.remove(pos);
            self.builder.mark(kind, start);
        }
    }
}

/// Concatenated text of a node's descendants, as rendered.
pub(crate) fn text_of<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            NodeValue::Math(math) => out.push_str(&math.literal),
            _ => out.push_str(&text_of(child)),
        }
    }
    out
}
