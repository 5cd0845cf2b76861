//! Blocks: the structural units of a document.

use super::mark::Mark;
use super::table::{ColumnAlign, TableCellData};
use serde::{Deserialize, Serialize};

/// Plain text plus the marks formatting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContent {
    pub text: String,
    #[serde(default)]
    pub marks: Vec<Mark>,
}

impl BlockContent {
    pub fn new(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        BlockContent {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        BlockContent::new(text, Vec::new())
    }

    /// Length of the text in chars, the unit mark offsets are counted in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Block content is either a bare string or text with marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Plain(String),
    Rich(BlockContent),
}

impl Content {
    pub fn text(&self) -> &str {
        match self {
            Content::Plain(text) => text,
            Content::Rich(content) => &content.text,
        }
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            Content::Plain(_) => &[],
            Content::Rich(content) => &content.marks,
        }
    }

    /// Views the content as rich text, treating a plain string as zero marks.
    pub fn to_rich(&self) -> BlockContent {
        match self {
            Content::Plain(text) => BlockContent::plain(text.clone()),
            Content::Rich(content) => content.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

impl Default for Content {
    fn default() -> Self {
        Content::Plain(String::new())
    }
}

impl From<BlockContent> for Content {
    fn from(content: BlockContent) -> Self {
        Content::Rich(content)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Plain(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Plain(text)
    }
}

/// The closed set of block kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    BulletList,
    NumberedList,
    Todo,
    Quote,
    Blockquote,
    Code,
    Mermaid,
    MathBlock,
    Divider,
    Table,
    Callout,
    Container,
    Toggle,
    FootnoteDefinition,
    Image,
    Video,
    File,
    Embed,
}

impl BlockType {
    /// Heading block type for a level, clamped to 1..=6.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => BlockType::Heading1,
            2 => BlockType::Heading2,
            3 => BlockType::Heading3,
            4 => BlockType::Heading4,
            5 => BlockType::Heading5,
            _ => BlockType::Heading6,
        }
    }

    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockType::Heading1 => Some(1),
            BlockType::Heading2 => Some(2),
            BlockType::Heading3 => Some(3),
            BlockType::Heading4 => Some(4),
            BlockType::Heading5 => Some(5),
            BlockType::Heading6 => Some(6),
            _ => None,
        }
    }

    pub fn is_list_item(self) -> bool {
        matches!(
            self,
            BlockType::BulletList | BlockType::NumberedList | BlockType::Todo
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading1 => "heading1",
            BlockType::Heading2 => "heading2",
            BlockType::Heading3 => "heading3",
            BlockType::Heading4 => "heading4",
            BlockType::Heading5 => "heading5",
            BlockType::Heading6 => "heading6",
            BlockType::BulletList => "bulletList",
            BlockType::NumberedList => "numberedList",
            BlockType::Todo => "todo",
            BlockType::Quote => "quote",
            BlockType::Blockquote => "blockquote",
            BlockType::Code => "code",
            BlockType::Mermaid => "mermaid",
            BlockType::MathBlock => "mathBlock",
            BlockType::Divider => "divider",
            BlockType::Table => "table",
            BlockType::Callout => "callout",
            BlockType::Container => "container",
            BlockType::Toggle => "toggle",
            BlockType::FootnoteDefinition => "footnoteDefinition",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::File => "file",
            BlockType::Embed => "embed",
        }
    }
}

/// Callout flavours a directive container can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalloutType {
    Note,
    Tip,
    Info,
    Warning,
    Error,
    Success,
}

impl CalloutType {
    /// Maps a directive name to its callout type.
    pub fn from_directive(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "note" => Some(CalloutType::Note),
            "tip" => Some(CalloutType::Tip),
            "info" => Some(CalloutType::Info),
            "warning" | "important" | "caution" => Some(CalloutType::Warning),
            "danger" | "error" => Some(CalloutType::Error),
            "success" => Some(CalloutType::Success),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalloutType::Note => "note",
            CalloutType::Tip => "tip",
            CalloutType::Info => "info",
            CalloutType::Warning => "warning",
            CalloutType::Error => "error",
            CalloutType::Success => "success",
        }
    }
}

/// Type-specific side table of a block. Only the fields relevant to the
/// block's type are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mermaid_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callout_type: Option<CalloutType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<TableCellData>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_aligns: Option<Vec<Option<ColumnAlign>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_widths: Option<Vec<u32>>,
}

impl BlockMeta {
    pub fn is_empty(&self) -> bool {
        self == &BlockMeta::default()
    }
}

/// Opaque, collision-resistant block identity.
pub type BlockId = String;

/// Generates a fresh block id (random UUID v4).
pub fn new_block_id() -> BlockId {
    uuid::Uuid::new_v4().to_string()
}

/// One structural unit of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default = "new_block_id")]
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub content: Content,
    #[serde(default, skip_serializing_if = "BlockMeta::is_empty")]
    pub meta: BlockMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
    #[serde(default)]
    pub indent: usize,
}

impl Block {
    pub fn new(block_type: BlockType, content: impl Into<Content>) -> Self {
        Block {
            id: new_block_id(),
            block_type,
            content: content.into(),
            meta: BlockMeta::default(),
            children: Vec::new(),
            indent: 0,
        }
    }

    pub fn paragraph(content: impl Into<Content>) -> Self {
        Block::new(BlockType::Paragraph, content)
    }

    pub fn with_meta(mut self, meta: BlockMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn text(&self) -> &str {
        self.content.text()
    }
}
