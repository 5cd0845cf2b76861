//! Markdown pipe tables pasted as plain text.

use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?$").expect("separator pattern is valid")
});

pub fn parse_pipe_table(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !SEPARATOR_ROW.is_match(line))
        .map(parse_table_row)
        .collect()
}

/// Splits one row on unescaped pipes, dropping the outer pipes.
fn parse_table_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = match line.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => line,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}
