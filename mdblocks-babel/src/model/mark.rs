//! Inline formatting marks over a half-open character range of a block's text.

use serde::{Deserialize, Serialize};

/// Kind of inline formatting carried by a [`Mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Bold,
    Italic,
    Strikethrough,
    Code,
    Underline,
    Highlight,
    Subscript,
    Superscript,
    Link,
    FootnoteRef,
}

impl MarkType {
    /// Nesting priority used when re-nesting marks into Markdown.
    ///
    /// Lower values are outer: they open first and close last.
    pub fn priority(self) -> u8 {
        match self {
            MarkType::Link => 1,
            MarkType::Bold => 2,
            MarkType::Italic => 3,
            MarkType::Strikethrough => 4,
            MarkType::Underline => 5,
            MarkType::Highlight => 6,
            MarkType::Subscript => 7,
            MarkType::Superscript => 8,
            MarkType::Code => 9,
            MarkType::FootnoteRef => 10,
        }
    }

    /// Atomic marks never contain another mark's delimiters.
    pub fn is_atomic(self) -> bool {
        matches!(self, MarkType::Code | MarkType::FootnoteRef)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarkType::Bold => "bold",
            MarkType::Italic => "italic",
            MarkType::Strikethrough => "strikethrough",
            MarkType::Code => "code",
            MarkType::Underline => "underline",
            MarkType::Highlight => "highlight",
            MarkType::Subscript => "subscript",
            MarkType::Superscript => "superscript",
            MarkType::Link => "link",
            MarkType::FootnoteRef => "footnoteRef",
        }
    }
}

/// Attributes attached to link and footnote reference marks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnote_id: Option<String>,
}

impl MarkAttrs {
    pub fn is_empty(&self) -> bool {
        self.href.is_none() && self.title.is_none() && self.footnote_id.is_none()
    }
}

/// An inline formatting annotation over `[from, to)`, counted in chars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkType,
    pub from: usize,
    pub to: usize,
    #[serde(default, skip_serializing_if = "MarkAttrs::is_empty")]
    pub attrs: MarkAttrs,
}

impl Mark {
    pub fn new(kind: MarkType, from: usize, to: usize) -> Self {
        Mark {
            kind,
            from,
            to,
            attrs: MarkAttrs::default(),
        }
    }

    pub fn link(from: usize, to: usize, href: impl Into<String>, title: Option<String>) -> Self {
        Mark {
            kind: MarkType::Link,
            from,
            to,
            attrs: MarkAttrs {
                href: Some(href.into()),
                title,
                footnote_id: None,
            },
        }
    }

    pub fn footnote_ref(from: usize, to: usize, id: impl Into<String>) -> Self {
        Mark {
            kind: MarkType::FootnoteRef,
            from,
            to,
            attrs: MarkAttrs {
                footnote_id: Some(id.into()),
                ..MarkAttrs::default()
            },
        }
    }

    /// Returns a copy shifted right by `offset` characters.
    pub fn shifted(&self, offset: usize) -> Self {
        Mark {
            from: self.from + offset,
            to: self.to + offset,
            ..self.clone()
        }
    }

    /// Checks the range and required attributes against a text of `text_len` chars.
    pub fn is_valid(&self, text_len: usize) -> bool {
        if self.from >= self.to || self.to > text_len {
            return false;
        }
        match self.kind {
            MarkType::Link => self.attrs.href.is_some(),
            MarkType::FootnoteRef => self.attrs.footnote_id.is_some(),
            _ => true,
        }
    }
}
