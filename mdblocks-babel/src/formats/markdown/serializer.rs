//! Markdown serialization (blocks → Markdown)
//!
//! Walks the flat block sequence once. Hierarchy for list content lives in
//! `indent`, so the writer tracks, per indent level, the numbered-list counter
//! and the content column of the last list item. Blocks with real `children`
//! (blockquotes, callouts, containers, toggles, footnote definitions) render
//! their children as a fresh sequence.

use crate::common::definitions::render_definitions;
use crate::common::flat_to_nested::{escape_href, escape_title, InlineWriter};
use crate::model::{
    Block, BlockType, ColumnAlign, Content, Document, SerializeOptions, TableCellData,
};
use std::collections::BTreeMap;
use url::Url;

/// Serialize a block document to Markdown.
pub fn serialize_to_markdown(doc: &Document, options: &SerializeOptions) -> String {
    let writer = BlockWriter {
        options,
        inline: InlineWriter::new(options).with_references(&doc.link_references),
    };
    let mut out = writer.sequence(&doc.blocks);
    if options.link_references && !doc.link_references.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(render_definitions(&doc.link_references).trim_end());
    }
    if out.is_empty() {
        return out;
    }
    out.push('\n');
    out
}

struct BlockWriter<'a> {
    options: &'a SerializeOptions,
    inline: InlineWriter<'a>,
}

/// Per-sequence list state, indexed by indent level.
#[derive(Default)]
struct ListState {
    counters: BTreeMap<usize, (BlockType, u64)>,
    columns: Vec<usize>,
}

impl ListState {
    /// Column where a block at `indent` starts: the content column of its
    /// parent item, or of the nearest item above it.
    fn parent_column(&self, indent: usize) -> usize {
        let depth = indent.min(self.columns.len());
        if depth == 0 {
            0
        } else {
            self.columns[depth - 1]
        }
    }

    /// Next number for the item, and whether it continues the list above.
    fn enter_item(&mut self, block: &Block) -> (u64, bool) {
        let indent = block.indent;
        self.counters.retain(|&level, _| level <= indent);
        let (number, continued) = match self.counters.get(&indent) {
            Some((kind, n)) if *kind == block.block_type => (n + 1, true),
            _ => (block.meta.start.unwrap_or(1), false),
        };
        self.counters.insert(indent, (block.block_type, number));
        (number, continued)
    }

    fn leave_lists(&mut self, indent: usize) {
        self.counters.retain(|&level, _| level < indent);
        self.columns.truncate(indent);
    }
}

impl BlockWriter<'_> {
    fn sequence(&self, blocks: &[Block]) -> String {
        let mut out = String::new();
        let mut lists = ListState::default();
        let mut previous_list = false;

        for block in blocks {
            let is_list = block.block_type.is_list_item();
            let (rendered, tight) = if is_list {
                self.list_item(block, &mut lists)
            } else {
                lists.leave_lists(block.indent);
                let column = lists.parent_column(block.indent);
                (indent_lines(&self.block(block), column), false)
            };
            if rendered.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push_str(if previous_list && tight { "\n" } else { "\n\n" });
            }
            out.push_str(&rendered);
            previous_list = is_list;
        }
        out
    }

    /// The rendered item, and whether it may follow the previous item without
    /// a blank line. A new ordered list not starting at 1 cannot interrupt a
    /// paragraph, so it needs one.
    fn list_item(&self, block: &Block, lists: &mut ListState) -> (String, bool) {
        let (number, continued) = lists.enter_item(block);
        let parent = lists.parent_column(block.indent);
        let indent = if block.indent == 0 || lists.columns.is_empty() {
            parent
        } else {
            (self.options.list_indent * block.indent).clamp(parent, parent + 3)
        };

        let bullet = self.options.bullet_char;
        let marker = match block.block_type {
            BlockType::NumberedList => format!("{number}. "),
            _ => format!("{bullet} "),
        };
        let checkbox = match (block.block_type, block.meta.checked) {
            (BlockType::Todo, Some(true)) => "[x] ",
            (BlockType::Todo, _) => "[ ] ",
            _ => "",
        };

        let column = indent + marker.chars().count();
        lists.columns.truncate(block.indent.min(lists.columns.len()));
        lists.columns.push(column);

        let text = self.inline.render(&block.content);
        let first = format!("{}{marker}{checkbox}", " ".repeat(indent));
        let body = indent_lines(&text, column);
        let tight = continued || block.block_type != BlockType::NumberedList || number == 1;
        (format!("{first}{}", body.trim_start_matches(' ')), tight)
    }

    fn block(&self, block: &Block) -> String {
        let meta = &block.meta;
        match block.block_type {
            BlockType::Paragraph => self.inline.render(&block.content),
            BlockType::Heading1
            | BlockType::Heading2
            | BlockType::Heading3
            | BlockType::Heading4
            | BlockType::Heading5
            | BlockType::Heading6 => {
                let level = block.block_type.heading_level().unwrap_or(1) as usize;
                let mut content = block.content.to_rich();
                content.text = content.text.replace('\n', " ");
                let text = self.inline.render_content(&content);
                let hashes = "#".repeat(level);
                if text.is_empty() {
                    hashes
                } else {
                    format!("{hashes} {text}")
                }
            }
            BlockType::BulletList | BlockType::NumberedList | BlockType::Todo => {
                let mut lists = ListState::default();
                self.list_item(block, &mut lists).0
            }
            BlockType::Quote => quote_lines(&self.inline.render(&block.content)),
            BlockType::Blockquote => quote_lines(&self.body(block)),
            BlockType::Code => {
                let language = meta.language.as_deref().unwrap_or("plaintext");
                let language = if language == "plaintext" { "" } else { language };
                fenced(language, block.text())
            }
            BlockType::Mermaid => {
                let code = meta.mermaid_code.as_deref().unwrap_or(block.text());
                fenced("mermaid", code)
            }
            BlockType::MathBlock => {
                let latex = meta.latex.as_deref().unwrap_or(block.text()).trim();
                if latex.contains('\n') {
                    format!("$$\n{latex}\n$$")
                } else {
                    format!("$${latex}$$")
                }
            }
            BlockType::Divider => "---".to_string(),
            BlockType::Table => self.table(block),
            BlockType::Callout => {
                let kind = meta.callout_type.map(|c| c.as_str()).unwrap_or("note");
                self.directive(kind, block)
            }
            BlockType::Container => {
                let kind = meta.container_type.as_deref().unwrap_or("container");
                self.directive(kind, block)
            }
            BlockType::Toggle => {
                let open = if meta.collapsed == Some(false) {
                    "<details open>"
                } else {
                    "<details>"
                };
                let summary = escape_html(&block.text().replace('\n', " "));
                let body = self.sequence(&block.children);
                if body.is_empty() {
                    format!("{open}\n<summary>{summary}</summary>\n\n</details>")
                } else {
                    format!("{open}\n<summary>{summary}</summary>\n\n{body}\n\n</details>")
                }
            }
            BlockType::FootnoteDefinition => {
                if !self.options.footnotes {
                    return String::new();
                }
                let id = meta.identifier.as_deref().unwrap_or_default();
                let body = self.body(block);
                let mut lines = body.lines();
                let mut out = format!("[^{id}]: {}", lines.next().unwrap_or_default());
                for line in lines {
                    out.push('\n');
                    if !line.is_empty() {
                        out.push_str("    ");
                        out.push_str(line);
                    }
                }
                out
            }
            BlockType::Image => {
                let alt = meta.alt.as_deref().unwrap_or(block.text());
                let alt = alt.replace('[', "\\[").replace(']', "\\]");
                let src = escape_href(meta.src.as_deref().unwrap_or_default());
                match &meta.title {
                    Some(title) => format!("![{alt}]({src} \"{}\")", escape_title(title)),
                    None => format!("![{alt}]({src})"),
                }
            }
            BlockType::Video => leaf_directive("video", meta.src.as_deref()),
            BlockType::File => {
                let src = meta.src.as_deref().unwrap_or_default();
                let name = Some(block.text())
                    .filter(|t| !t.is_empty())
                    .or(meta.title.as_deref())
                    .or_else(|| src.rsplit('/').next())
                    .unwrap_or_default();
                let name = name.replace('[', "\\[").replace(']', "\\]");
                format!("[{name}]({})", escape_href(src))
            }
            BlockType::Embed => {
                let src = meta.src.as_deref();
                let name = if src.is_some_and(is_youtube) {
                    "youtube"
                } else {
                    "video"
                };
                leaf_directive(name, src)
            }
        }
    }

    /// Own content as a leading paragraph, then the children.
    fn body(&self, block: &Block) -> String {
        let own = self.inline.render(&block.content);
        let children = self.sequence(&block.children);
        match (own.is_empty(), children.is_empty()) {
            (_, true) => own,
            (true, false) => children,
            (false, false) => format!("{own}\n\n{children}"),
        }
    }

    fn directive(&self, kind: &str, block: &Block) -> String {
        let mut open = format!(":::{kind}");
        if let Some(title) = block.meta.title.as_deref().filter(|t| !t.is_empty()) {
            open.push(' ');
            open.push_str(&title.replace('\n', " "));
        }
        let body = self.body(block);
        if body.is_empty() {
            format!("{open}\n:::")
        } else {
            format!("{open}\n{body}\n:::")
        }
    }

    fn table(&self, block: &Block) -> String {
        let rows: &[Vec<TableCellData>] = block.meta.rows.as_deref().unwrap_or_default();
        let aligns: &[Option<ColumnAlign>] = block.meta.column_aligns.as_deref().unwrap_or_default();
        let width = rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(aligns.len());
        if width == 0 {
            return String::new();
        }

        let render_row = |row: Option<&Vec<TableCellData>>| {
            let cells: Vec<String> = (0..width)
                .map(|i| {
                    row.and_then(|r| r.get(i))
                        .map(|cell| self.cell(cell))
                        .unwrap_or_default()
                })
                .collect();
            format!("| {} |", cells.join(" | "))
        };

        let mut lines = vec![render_row(rows.first())];
        let separator: Vec<&str> = (0..width)
            .map(|i| ColumnAlign::delimiter(aligns.get(i).copied().flatten()))
            .collect();
        lines.push(format!("|{}|", separator.join("|")));
        lines.extend(rows.iter().skip(1).map(|row| render_row(Some(row))));
        lines.join("\n")
    }

    fn cell(&self, cell: &TableCellData) -> String {
        let mut content = cell.content.clone();
        content.text = content.text.replace("\r\n", "\n");
        let text = self.inline.render(&Content::Rich(content));
        text.replace('|', "\\|")
            .replace("\\\n", "<br>")
            .replace('\n', "<br>")
    }
}

fn fenced(language: &str, code: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest.max(2) + 1);
    format!("{fence}{language}\n{code}\n{fence}")
}

fn indent_lines(text: &str, column: usize) -> String {
    if column == 0 {
        return text.to_string();
    }
    let pad = " ".repeat(column);
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn leaf_directive(name: &str, src: Option<&str>) -> String {
    match src.filter(|s| !s.is_empty()) {
        Some(src) => format!("::{name}{{src=\"{}\"}}", src.replace('"', "%22")),
        None => format!("::{name}"),
    }
}

fn is_youtube(src: &str) -> bool {
    Url::parse(src)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| {
            let host = host.trim_start_matches("www.").trim_start_matches("m.");
            host == "youtube.com" || host == "youtu.be"
        })
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
