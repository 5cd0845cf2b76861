//! Line-level tracking of fenced code blocks, for pre-passes that scan raw
//! source lines and must not look inside code.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").expect("fence pattern is valid"));

#[derive(Debug, Default, Clone)]
pub struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next line. Returns true when the line is a fence delimiter
    /// or sits inside fenced code.
    pub fn observe(&mut self, line: &str) -> bool {
        if let Some(caps) = FENCE.captures(line) {
            let run = &caps[1];
            let c = run.chars().next().unwrap_or('`');
            match self.open {
                None => {
                    self.open = Some((c, run.len()));
                    return true;
                }
                Some((open, len)) if open == c && run.len() >= len && line.trim() == run => {
                    self.open = None;
                    return true;
                }
                _ => {}
            }
        }
        self.open.is_some()
    }

    pub fn in_fence(&self) -> bool {
        self.open.is_some()
    }
}
