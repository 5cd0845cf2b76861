//! Heading anchors.

use std::collections::HashSet;

/// Turns heading text into an anchor slug, without uniqueness.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' {
            pending_dash = !slug.is_empty();
        } else if c.is_alphanumeric() || c == '_' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(c);
        }
    }
    if slug.is_empty() {
        "heading".to_string()
    } else {
        slug
    }
}

/// Slugs handed out during one parse; repeats get `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct SlugRegistry {
    used: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug_for(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
