//! Format implementations
//!
//! This module contains the format implementations that convert between block
//! documents and text representations.

pub mod json;
pub mod markdown;

pub use json::JsonFormat;
pub use markdown::MarkdownFormat;
