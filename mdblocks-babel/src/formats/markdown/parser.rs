//! Markdown parsing (Markdown → blocks)
//!
//! Pipeline: definitions pre-pass → directive split → footnote split →
//! comrak per chunk → [`Transformer`](super::transform::Transformer) →
//! [`Document`].
//!
//! Parsing never fails. A panic inside comrak or directives nested past
//! [`MAX_DEPTH`](super::directives::MAX_DEPTH) degrade the whole document to
//! one paragraph holding the raw input, with a warning.

use super::directives::{split_directives, Container, LeafDirective, Segment};
use super::footnotes::{footnote_ids, split_footnotes, stub_definitions, Piece};
use super::transform::{footnote_block, ParseState, Transformer};
use crate::common::definitions::{collect_definitions, render_definitions};
use crate::common::fences::FenceTracker;
use crate::model::{
    Block, BlockMeta, BlockType, CalloutType, Content, Document, ParseOptions, ParseWarning,
};
use comrak::{parse_document, Arena, Options};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Parse a Markdown string into a block document.
pub fn parse_from_markdown(source: &str, options: &ParseOptions) -> Document {
    let references = collect_definitions(source);
    tracing::debug!(definitions = references.len(), "collected link definitions");

    let segments = if options.containers {
        match split_directives(source) {
            Ok(segments) => segments,
            Err(err) => return fallback(source, err.to_string()),
        }
    } else {
        vec![Segment::Markdown {
            text: source.to_string(),
            line: 0,
        }]
    };
    tracing::debug!(segments = segments.len(), "split source");

    let footnotes = footnote_ids(source);
    tracing::debug!(footnotes = footnotes.len(), "collected footnote ids");
    let mut suffix = render_definitions(&references);
    suffix.push_str(&stub_definitions(&footnotes));
    let parser = Parser {
        comrak: comrak_options(options),
        suffix,
    };
    let mut state = ParseState::default();
    let outcome = catch_unwind(AssertUnwindSafe(|| parser.segments(&segments, &mut state)));
    let mut blocks = match outcome {
        Ok(blocks) => blocks,
        Err(_) => return fallback(source, "Markdown parser failed".to_string()),
    };
    if blocks.is_empty() {
        blocks.push(Block::paragraph(""));
    }

    Document {
        blocks,
        link_references: references,
        footnotes: state.footnotes,
        warnings: state.warnings,
    }
}

fn fallback(source: &str, reason: String) -> Document {
    let message = format!("Failed to parse Markdown: {reason}");
    tracing::warn!("{message}");
    let mut document = Document::from_blocks(vec![Block::paragraph(source)]);
    document.warnings.push(ParseWarning::new(message));
    document
}

fn comrak_options(options: &ParseOptions) -> Options<'static> {
    let mut comrak = Options::default();
    comrak.extension.table = options.gfm;
    comrak.extension.strikethrough = options.gfm;
    comrak.extension.autolink = options.gfm;
    comrak.extension.tasklist = options.gfm;
    comrak.extension.footnotes = true;
    comrak.extension.math_dollars = options.math;
    comrak.render.escaped_char_spans = true;
    comrak
}

struct Parser {
    comrak: Options<'static>,
    /// Link definitions and footnote stubs appended to every chunk so
    /// references resolve across chunk boundaries.
    suffix: String,
}

impl Parser {
    fn segments(&self, segments: &[Segment], state: &mut ParseState) -> Vec<Block> {
        let mut blocks = Vec::new();
        for segment in segments {
            match segment {
                Segment::Markdown { text, line } => {
                    blocks.extend(self.markdown(text, *line, state))
                }
                Segment::Container(container) => blocks.push(self.container(container, state)),
                Segment::Leaf(leaf) => blocks.extend(leaf_block(leaf)),
            }
        }
        blocks
    }

    fn markdown(&self, text: &str, line: usize, state: &mut ParseState) -> Vec<Block> {
        let mut blocks = Vec::new();
        for piece in split_footnotes(text, line) {
            match piece {
                Piece::Markdown { text, line } => blocks.extend(self.chunk(&text, line, state)),
                Piece::Definition { id, body, line } => {
                    let block = footnote_block(&id, self.chunk(&body, line, state));
                    state.footnotes.entry(id).or_insert_with(|| block.clone());
                    blocks.push(block);
                }
            }
        }
        blocks
    }

    fn chunk(&self, text: &str, line: usize, state: &mut ParseState) -> Vec<Block> {
        let mut chunk = text.to_string();
        let mut stubs_from = usize::MAX;
        if !self.suffix.is_empty() && !ends_in_fence(text) {
            chunk.push_str("\n\n");
            stubs_from = chunk.lines().count() + 1;
            chunk.push_str(&self.suffix);
        }
        let lines: Vec<&str> = chunk.lines().collect();
        let arena = Arena::new();
        let root = parse_document(&arena, &chunk, &self.comrak);
        Transformer::new(state, &lines, line)
            .stubs_from(stubs_from)
            .blocks(root, 0)
    }

    fn container(&self, container: &Container, state: &mut ParseState) -> Block {
        let mut children = self.segments(&container.body, state);
        let title = container.display_title();
        match CalloutType::from_directive(&container.name) {
            Some(callout_type) => {
                let meta = BlockMeta {
                    callout_type: Some(callout_type),
                    title,
                    ..BlockMeta::default()
                };
                let single_paragraph = children.len() == 1
                    && children[0].block_type == BlockType::Paragraph
                    && children[0].children.is_empty();
                if single_paragraph {
                    let content = children.remove(0).content;
                    Block::new(BlockType::Callout, content).with_meta(meta)
                } else {
                    Block::new(BlockType::Callout, Content::default())
                        .with_meta(meta)
                        .with_children(children)
                }
            }
            None => {
                let meta = BlockMeta {
                    container_type: Some(container.name.clone()),
                    title,
                    ..BlockMeta::default()
                };
                Block::new(BlockType::Container, Content::default())
                    .with_meta(meta)
                    .with_children(children)
            }
        }
    }
}

fn ends_in_fence(text: &str) -> bool {
    let mut fences = FenceTracker::new();
    for line in text.lines() {
        fences.observe(line);
    }
    fences.in_fence()
}

/// Embeds for `youtube`/`video`; any other directive keeps its label text
/// and produces nothing without one.
fn leaf_block(leaf: &LeafDirective) -> Option<Block> {
    let label = leaf.label.clone().filter(|l| !l.trim().is_empty());
    match leaf.name.as_str() {
        "youtube" | "video" => {
            let src = leaf
                .attrs
                .get("src")
                .or_else(|| leaf.attrs.get("url"))
                .cloned()
                .or(label)
                .unwrap_or_default();
            let meta = BlockMeta {
                src: Some(src),
                ..BlockMeta::default()
            };
            Some(Block::new(BlockType::Embed, "").with_meta(meta))
        }
        _ => label.map(Block::paragraph),
    }
}
