//! Markdown interop for block-structured rich-text documents
//!
//!     This crate converts between Markdown and a block document model: a flat sequence of
//!     typed blocks whose text carries offset-addressed formatting marks. It also ingests
//!     clipboard tables (HTML, TSV, CSV, Markdown pipe tables) into table blocks.
//!
//!     TLDR: For format authors:
//!         - Formats never hand-write a parser for the source syntax, they adapt the
//!           format library's AST (comrak for Markdown) to blocks and back.
//!         - Inline formatting goes through the common layer: nested inline trees are
//!           flattened with ./common/nested_to_flat.rs, and flat marks are re-nested with
//!           ./common/flat_to_nested.rs.
//!         - Parsing Markdown never fails. Problems become warnings on the document.
//!
//! Architecture
//!
//!     This is a pure lib, that is, it powers the mdblocks cli but is shell agnostic: no code
//!     should be written that supposes a shell environment, be it std print, env vars etc.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── model                   # Blocks, marks, tables, the parse result
//!     ├── formats
//!     │   ├── markdown
//!     │   │   ├── directives.rs   # ::: container pre-pass
//!     │   │   ├── footnotes.rs    # [^id]: definition pre-pass
//!     │   │   ├── parser.rs       # Markdown → blocks
//!     │   │   ├── serializer.rs   # blocks → Markdown
//!     │   │   └── mod.rs
//!     │   └── json                # The model as JSON
//!     ├── clipboard               # Clipboard tables
//!     ├── common                  # Format-agnostic inline machinery
//!     └── lib.rs
//!
//! Testing
//!     tests
//!     ├── lib.rs
//!     ├── markdown
//!     └── clipboard
//!
//!     Note that rust does not by default discover tests in subdirectories, so we need to include these
//!     in the mod.
//!
//! Core Algorithms
//!
//!     The content model stores inline formatting as flat `[from, to)` ranges over a block's
//!     chars. Markdown nests. Going in, the inline tree is flattened while the extended syntax
//!     comrak does not know (`==highlight==`, `^sup^`, `~sub~`) is scanned out of the literal
//!     text. Going out, marks that overlap arbitrarily are re-nested by closing and reopening
//!     delimiters (see ./common/flat_to_nested.rs).
//!
//!     Lists are the other mismatch: the model keeps list items flat, with an `indent` per item,
//!     while Markdown nests them. The transformer flattens on the way in and the block
//!     serializer re-derives nesting from `indent` on the way out.
//!
//! Library Choices
//!
//!     comrak parses Markdown, html5ever reads clipboard HTML, serde/serde_json carry the model
//!     as JSON, and tracing reports what the pipeline did. Serialization to Markdown is done here,
//!     since no Markdown library can write overlapping marks.

pub mod clipboard;
pub mod common;
pub mod error;
pub mod format;
pub mod formats;
pub mod model;
pub mod registry;

pub use error::FormatError;
pub use format::Format;
pub use model::{Block, BlockContent, BlockType, Document, Mark, MarkType};
pub use registry::FormatRegistry;

use model::{ParseOptions, SerializeOptions};

/// Parses Markdown with the default dialect (GFM, math and directives on).
pub fn parse_markdown(source: &str) -> Document {
    formats::markdown::parser::parse_from_markdown(source, &ParseOptions::default())
}

/// Serializes a document to Markdown with the default style.
pub fn serialize_markdown(doc: &Document) -> String {
    formats::markdown::serializer::serialize_to_markdown(doc, &SerializeOptions::default())
}
