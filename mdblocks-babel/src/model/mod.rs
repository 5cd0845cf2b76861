//! The block-structured content model.
//!
//! A [`Document`] is a sequence of [`Block`]s. Inline formatting is not a tree:
//! each block's text carries a flat list of [`Mark`]s over char offsets, and any
//! nesting is derived only when serializing.

pub mod block;
pub mod document;
pub mod mark;
pub mod table;

pub use block::{new_block_id, Block, BlockContent, BlockId, BlockMeta, BlockType, CalloutType, Content};
pub use document::{
    Document, LinkDefinition, LinkReferences, ParseOptions, ParseWarning, SerializeOptions,
};
pub use mark::{Mark, MarkAttrs, MarkType};
pub use table::{normalize_rows, ColumnAlign, ParsedTableData, TableCellData, TableFormat};
