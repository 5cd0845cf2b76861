//! Directive pre-pass.
//!
//! comrak has no notion of `:::name` containers or `::name` leaf directives,
//! so the source is split on them line by line before it reaches comrak. The
//! result is a tree of segments: plain Markdown chunks, containers holding
//! their own segments, and leaf directives. Lines inside fenced code are never
//! treated as directives.
//!
//! ```text
//! :::warning[Careful]      container, label "Careful"
//! Body **text**.           Markdown chunk inside the container
//! ::youtube{src="..."}     leaf directive
//! :::                      closes the innermost open container
//! ```
//!
//! A container left open runs to the end of the document. Nesting deeper than
//! [`MAX_DEPTH`] is an error; the caller degrades the whole document.

use crate::common::fences::FenceTracker;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

pub const MAX_DEPTH: usize = 16;

static CONTAINER_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}:{3,}[ \t]*([A-Za-z][\w-]*)(?:\[([^\]]*)\])?(?:\{([^}]*)\})?[ \t]*(.*?)[ \t]*$")
        .expect("container pattern is valid")
});

static CONTAINER_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}:{3,}[ \t]*$").expect("close pattern is valid"));

static LEAF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}::([A-Za-z][\w-]*)(?:\[([^\]]*)\])?(?:\{([^}]*)\})?[ \t]*$")
        .expect("leaf pattern is valid")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w-]+)=(?:"([^"]*)"|'([^']*)'|([^\s"']+))"#).expect("attribute pattern is valid")
});

pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain Markdown starting at 0-based `line` of the source.
    Markdown { text: String, line: usize },
    Container(Container),
    Leaf(LeafDirective),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub label: Option<String>,
    pub attrs: Attributes,
    /// Free text after the name, e.g. `:::note Read this`.
    pub title: Option<String>,
    pub body: Vec<Segment>,
    pub line: usize,
}

impl Container {
    /// The display title: label first, then trailing text, then `title=`.
    pub fn display_title(&self) -> Option<String> {
        self.label
            .clone()
            .or_else(|| self.title.clone())
            .or_else(|| self.attrs.get("title").cloned())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafDirective {
    pub name: String,
    pub label: Option<String>,
    pub attrs: Attributes,
    pub raw: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("directive containers nested deeper than {MAX_DEPTH} levels at line {line}")]
pub struct DirectiveError {
    pub line: usize,
}

pub fn parse_attributes(raw: &str) -> Attributes {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (caps[1].to_string(), value)
        })
        .collect()
}

/// Builder frame for one open container, or the document root.
struct Frame {
    container: Option<Container>,
    segments: Vec<Segment>,
    chunk: Vec<String>,
    chunk_line: usize,
}

impl Frame {
    fn new(container: Option<Container>, line: usize) -> Self {
        Frame {
            container,
            segments: Vec::new(),
            chunk: Vec::new(),
            chunk_line: line,
        }
    }

    fn push_line(&mut self, line: &str, index: usize) {
        if self.chunk.is_empty() {
            self.chunk_line = index;
        }
        self.chunk.push(line.to_string());
    }

    fn flush(&mut self) {
        if self.chunk.is_empty() {
            return;
        }
        let text = self.chunk.join("\n");
        self.chunk.clear();
        if !text.trim().is_empty() {
            self.segments.push(Segment::Markdown {
                text,
                line: self.chunk_line,
            });
        }
    }

    fn finish(mut self) -> (Option<Container>, Vec<Segment>) {
        self.flush();
        (self.container, self.segments)
    }
}

fn close_frame(stack: &mut Vec<Frame>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(frame) = stack.pop() {
        let (container, body) = frame.finish();
        if let (Some(mut container), Some(parent)) = (container, stack.last_mut()) {
            container.body = body;
            parent.segments.push(Segment::Container(container));
        }
    }
}

/// Splits source into Markdown chunks and directives.
pub fn split_directives(source: &str) -> Result<Vec<Segment>, DirectiveError> {
    let mut stack = vec![Frame::new(None, 0)];
    let mut fences = FenceTracker::new();

    for (index, line) in source.lines().enumerate() {
        let in_code = fences.observe(line);
        let frame = stack.len() - 1;

        if !in_code {
            if CONTAINER_CLOSE.is_match(line) && stack.len() > 1 {
                close_frame(&mut stack);
                continue;
            }
            if let Some(caps) = CONTAINER_OPEN.captures(line) {
                if stack.len() > MAX_DEPTH {
                    return Err(DirectiveError { line: index + 1 });
                }
                stack[frame].flush();
                let title = caps
                    .get(4)
                    .map(|m| m.as_str().to_string())
                    .filter(|t| !t.is_empty());
                let container = Container {
                    name: caps[1].to_string(),
                    label: caps.get(2).map(|m| m.as_str().to_string()),
                    attrs: caps.get(3).map(|m| parse_attributes(m.as_str())).unwrap_or_default(),
                    title,
                    body: Vec::new(),
                    line: index,
                };
                stack.push(Frame::new(Some(container), index + 1));
                continue;
            }
            if let Some(caps) = LEAF.captures(line) {
                stack[frame].flush();
                stack[frame].segments.push(Segment::Leaf(LeafDirective {
                    name: caps[1].to_string(),
                    label: caps.get(2).map(|m| m.as_str().to_string()),
                    attrs: caps.get(3).map(|m| parse_attributes(m.as_str())).unwrap_or_default(),
                    raw: line.trim().to_string(),
                    line: index,
                }));
                continue;
            }
        }
        stack[frame].push_line(line, index);
    }

    while stack.len() > 1 {
        close_frame(&mut stack);
    }
    let (_, segments) = stack.remove(0).finish();
    Ok(segments)
}
