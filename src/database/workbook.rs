//! On-disk formats for dataset content.
//!
//! A *workbook* is a JSON document holding one or more named sheets, each a [`Table`].
//! Its *lightweight* counterpart is a single-table CSV file that sits next to it and is
//! preferred on read when present.

use crate::dataset::table::{cell_to_string, infer_cell, Table};
use crate::error::{ProjectorError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SHEET: &str = "Sheet1";
pub const LIGHTWEIGHT_EXTENSION: &str = "csv";
const WORKBOOK_EXTENSIONS: &[&str] = &["json", "xlsx"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: IndexMap<String, Table>,
}

impl Workbook {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| ProjectorError::Unreadable {
            url: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets.get(name)
    }

    /// Inserts or replaces a sheet, keeping the position of a replaced one.
    pub fn set_sheet(&mut self, name: impl Into<String>, table: Table) {
        self.sheets.insert(name.into(), table);
    }
}

/// Path of the CSV counterpart of a workbook path: `a.json` and `a.xlsx` map to `a.csv`,
/// `a.csv` maps to itself, anything else gets `.csv` appended.
pub fn lightweight_path(url: &Path) -> PathBuf {
    match url.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == LIGHTWEIGHT_EXTENSION => url.to_path_buf(),
        Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => url.with_extension(LIGHTWEIGHT_EXTENSION),
        _ => {
            let mut s = url.as_os_str().to_os_string();
            s.push(".");
            s.push(LIGHTWEIGHT_EXTENSION);
            PathBuf::from(s)
        }
    }
}

pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(infer_cell).collect());
    }
    Ok(table)
}

pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(cell_to_string))?;
    }
    writer.flush()?;
    Ok(())
}
