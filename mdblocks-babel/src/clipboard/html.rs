//! HTML tables copied from browsers and spreadsheets.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Rows of the first `<table>` in the payload, and whether it has a header
/// (`<thead>` or `<th>` cells).
pub struct HtmlTable {
    pub rows: Vec<Vec<String>>,
    pub has_header: bool,
}

pub fn parse_html_table(html: &str) -> Option<HtmlTable> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let table = find_element(&dom.document, "table")?;

    let mut table_rows = Vec::new();
    collect_rows(&table, &mut table_rows);

    let mut has_header = false;
    let mut rows = Vec::new();
    for row in &table_rows {
        let mut cells = Vec::new();
        for cell in row.children.borrow().iter() {
            match element_name(cell).as_deref() {
                Some("th") => {
                    has_header = true;
                    cells.push(cell_text(cell));
                }
                Some("td") => cells.push(cell_text(cell)),
                _ => {}
            }
        }
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    has_header |= find_element(&table, "thead").is_some();

    if rows.is_empty() {
        None
    } else {
        Some(HtmlTable { rows, has_header })
    }
}

fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref().to_ascii_lowercase()),
        _ => None,
    }
}

fn find_element(node: &Handle, tag: &str) -> Option<Handle> {
    if element_name(node).as_deref() == Some(tag) {
        return Some(node.clone());
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

/// `<tr>` elements of this table: direct, or inside `<thead>`/`<tbody>`/`<tfoot>`.
/// Nested tables are not entered.
fn collect_rows(node: &Handle, rows: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        match element_name(child).as_deref() {
            Some("tr") => rows.push(child.clone()),
            Some("thead") | Some("tbody") | Some("tfoot") => collect_rows(child, rows),
            _ => {}
        }
    }
}

fn cell_text(cell: &Handle) -> String {
    let mut text = String::new();
    push_text(cell, &mut text);
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn push_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => {
            let contents = contents.borrow();
            out.push_str(&contents.replace('\n', " "));
        }
        NodeData::Element { name, .. } => {
            let tag = name.local.as_ref().to_ascii_lowercase();
            if tag == "br" {
                out.push('\n');
                return;
            }
            if tag == "p" && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            for child in node.children.borrow().iter() {
                push_text(child, out);
            }
        }
        _ => {
            for child in node.children.borrow().iter() {
                push_text(child, out);
            }
        }
    }
}
