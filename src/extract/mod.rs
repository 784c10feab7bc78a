// src/extract/mod.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TABLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("CSS selector for tables should be valid"));
static THEAD_ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead tr").expect("CSS selector for header rows should be valid"));
static TBODY_ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("CSS selector for body rows should be valid"));
static ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("CSS selector for rows should be valid"));
static CELL_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("CSS selector for cells should be valid"));

/// Header labels for one column, outermost level first.
///
/// A single entry means the source table had a one-level header; `None` at a
/// level means the column had no real label there (e.g. a column outside any
/// `colspan` group on a two-level header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub levels: Vec<Option<String>>,
}

/// One HTML table as a grid: per-column header levels plus body rows.
/// Empty cells are `None`; rows are padded to the header width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<ColumnHeader>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Parse every `<table>` in `html` into a [`RawTable`], in document order.
/// Tables with no usable header are dropped.
pub fn parse_tables(html: &str) -> Vec<RawTable> {
    let doc = Html::parse_document(html);
    doc.select(&TABLE_SEL).filter_map(parse_table).collect()
}

fn parse_table(table: ElementRef) -> Option<RawTable> {
    let mut head_rows: Vec<Vec<Option<String>>> =
        table.select(&THEAD_ROW_SEL).map(expand_row).collect();
    let mut body: Vec<Vec<Option<String>>> =
        table.select(&TBODY_ROW_SEL).map(expand_row).collect();

    if head_rows.is_empty() {
        // No <thead>: the first row serves as a one-level header.
        let mut all: Vec<Vec<Option<String>>> = table.select(&ROW_SEL).map(expand_row).collect();
        if all.is_empty() {
            return None;
        }
        head_rows = vec![all.remove(0)];
        body = all;
    } else if body.is_empty() {
        // <thead> without <tbody>: everything after the header rows is data.
        body = table
            .select(&ROW_SEL)
            .skip(head_rows.len())
            .map(expand_row)
            .collect();
    }

    // Column count is fixed by the innermost header row.
    let width = head_rows.last().map(Vec::len).unwrap_or(0);
    if width == 0 {
        return None;
    }

    let header = (0..width)
        .map(|i| ColumnHeader {
            levels: head_rows.iter().map(|r| r.get(i).cloned().flatten()).collect(),
        })
        .collect();

    let rows = body
        .into_iter()
        .map(|mut row| {
            if row.len() < width {
                row.resize(width, None);
            }
            row
        })
        .collect();

    Some(RawTable { header, rows })
}

/// Expand one `<tr>` into cells, repeating a cell's text across its colspan.
fn expand_row(tr: ElementRef) -> Vec<Option<String>> {
    let mut cells = Vec::new();
    for cell in tr.select(&CELL_SEL) {
        let text = cell_text(cell);
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1);
        for _ in 0..span {
            cells.push(text.clone());
        }
    }
    cells
}

/// Join a cell's stripped text fragments with single spaces; empty cells are `None`.
fn cell_text(cell: ElementRef) -> Option<String> {
    let text = cell
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
