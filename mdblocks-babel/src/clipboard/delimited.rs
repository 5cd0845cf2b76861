//! Tab- and comma-separated clipboard text.

/// TSV: one row per line, cells split on tabs.
pub fn parse_tsv(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').map(|cell| cell.trim().to_string()).collect())
        .collect()
}

/// CSV with RFC 4180 quoting: quoted fields may hold commas, newlines and
/// `""` for a literal quote.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            ',' => row.push(finish_field(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(finish_field(&mut field));
                push_row(&mut rows, std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(finish_field(&mut field));
        push_row(&mut rows, row);
    }
    rows
}

fn finish_field(field: &mut String) -> String {
    let value = field.trim().to_string();
    field.clear();
    value
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.iter().any(|cell| !cell.is_empty()) {
        rows.push(row);
    }
}
