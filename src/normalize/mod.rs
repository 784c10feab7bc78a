// src/normalize/mod.rs
use anyhow::{bail, Result};
use std::collections::HashSet;

use crate::extract::RawTable;

/// Replacement for absent cells. Matches the combined files' convention of
/// writing missing statistics as zero.
pub const NULL_SENTINEL: &str = "0";

/// A fully normalized table: flat unique column names, no missing values,
/// rows indexed contiguously from zero in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FlatTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Collapse a [`RawTable`]'s one- or two-level header into flat field names
/// and replace every absent cell with [`NULL_SENTINEL`].
///
/// Field names: a real outer group label is joined to the inner label with a
/// single space ("Performance Gls"); a column with no outer label keeps its
/// inner label whole. Fails on headers deeper than two levels, duplicate
/// collapsed names, or rows wider than the header.
pub fn normalize(table: &RawTable) -> Result<FlatTable> {
    let mut columns = Vec::with_capacity(table.header.len());
    let mut seen = HashSet::new();

    for (i, col) in table.header.iter().enumerate() {
        let name = match col.levels.as_slice() {
            [] => String::new(),
            [inner] => inner.as_deref().unwrap_or("").trim().to_string(),
            [outer, inner] => {
                let inner = inner.as_deref().unwrap_or("");
                match outer {
                    Some(group) => format!("{} {}", group, inner).trim().to_string(),
                    None => inner.trim().to_string(),
                }
            }
            levels => bail!(
                "column {} has {} header levels, at most two are supported",
                i,
                levels.len()
            ),
        };
        if !seen.insert(name.clone()) {
            bail!("duplicate column name {:?} after header collapse", name);
        }
        columns.push(name);
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        if row.len() != columns.len() {
            bail!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                columns.len()
            );
        }
        rows.push(
            row.iter()
                .map(|cell| cell.clone().unwrap_or_else(|| NULL_SENTINEL.to_string()))
                .collect(),
        );
    }

    Ok(FlatTable { columns, rows })
}
