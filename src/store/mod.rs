// src/store/mod.rs
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{fs, path::Path};

use crate::normalize::FlatTable;

/// Write `table` as a CSV file at `path`, creating parent directories as
/// needed. A table with no columns is written as an empty file.
pub fn write_table(path: impl AsRef<Path>, table: &FlatTable) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }

    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating CSV file {:?}", path))?;
    if !table.columns.is_empty() {
        wtr.write_record(&table.columns)
            .with_context(|| format!("writing header to {:?}", path))?;
    }
    for row in &table.rows {
        wtr.write_record(row)
            .with_context(|| format!("writing row to {:?}", path))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing CSV file {:?}", path))?;
    Ok(())
}

/// Read a CSV file written by [`write_table`] back into a [`FlatTable`].
pub fn read_table(path: impl AsRef<Path>) -> Result<FlatTable> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening CSV file {:?}", path))?;

    let columns: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header of {:?}", path))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(FlatTable { columns, rows })
}
