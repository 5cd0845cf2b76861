//! Format-agnostic pieces shared by parsers and serializers.
//!
//! - `scanner`: extended inline syntax (`==`, `^`, `~`) over literal text
//! - `definitions`: link reference definition pre-pass
//! - `slug`: heading anchors
//! - `fences`: fenced code tracking for line-based pre-passes
//! - `nested_to_flat`: nested inline trees into text plus marks
//! - `flat_to_nested`: text plus marks back into nested inline Markdown

pub mod definitions;
pub mod fences;
pub mod flat_to_nested;
pub mod nested_to_flat;
pub mod scanner;
pub mod slug;
