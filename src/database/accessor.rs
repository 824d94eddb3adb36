use crate::database::workbook::{self, lightweight_path, Workbook, DEFAULT_SHEET};
use crate::dataset::table::Table;
use crate::error::{ProjectorError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Operation an accessor is currently performing, reported when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorAction {
    Retrieve,
    Persist,
    Remove,
    Copy,
}

impl fmt::Display for AccessorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessorAction::Retrieve => "retrieve",
            AccessorAction::Persist => "persist",
            AccessorAction::Remove => "remove",
            AccessorAction::Copy => "copy",
        };
        f.write_str(s)
    }
}

/// Sole gateway for reading, writing, removing and copying the storage behind one
/// `(url, subpath)` pair.
///
/// Every public operation runs as a scope: it records its [`AccessorAction`] on entry
/// and, on exit, turns a permission failure into [`ProjectorError::ResourceBusy`] naming
/// the url and the action. Any other error is returned unchanged.
#[derive(Debug, Clone)]
pub struct DataAccessor {
    url: PathBuf,
    subpath: Option<String>,
    action: Option<AccessorAction>,
}

impl DataAccessor {
    pub fn new(url: impl Into<PathBuf>, subpath: Option<String>) -> Self {
        Self {
            url: url.into(),
            subpath,
            action: None,
        }
    }

    /// Runs `f` against a fresh accessor, translating permission failures on the way out.
    pub fn scope<T, F>(url: impl Into<PathBuf>, subpath: Option<String>, f: F) -> Result<T>
    where
        F: FnOnce(&mut DataAccessor) -> Result<T>,
    {
        let mut accessor = DataAccessor::new(url, subpath);
        let outcome = f(&mut accessor);
        accessor.release(outcome)
    }

    pub fn url(&self) -> &Path {
        &self.url
    }

    pub fn subpath(&self) -> Option<&str> {
        self.subpath.as_deref()
    }

    pub fn action(&self) -> Option<AccessorAction> {
        self.action
    }

    fn sheet_name(&self) -> &str {
        self.subpath.as_deref().unwrap_or(DEFAULT_SHEET)
    }

    fn release<T>(&self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Err(e) if e.is_permission_denied() => Err(ProjectorError::ResourceBusy {
                url: self.url.display().to_string(),
                action: self
                    .action
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "access".to_string()),
            }),
            Err(e) => Err(e),
            Ok(value) => {
                let suffix = self
                    .subpath
                    .as_ref()
                    .map(|s| format!(" [{}]", s))
                    .unwrap_or_default();
                if let Some(action) = self.action {
                    debug!("{} '{}{}': DONE", action, self.url.display(), suffix);
                }
                Ok(value)
            }
        }
    }

    fn run<T, F>(&mut self, action: AccessorAction, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.action = Some(action);
        let outcome = f(self);
        self.release(outcome)
    }

    /// Loads the dataset, preferring the CSV counterpart of `url` and falling back to the
    /// workbook at `url`, where the sheet named by `subpath` (or "Sheet1") is tried first
    /// and then each of `alternative_subpaths`, in order.
    ///
    /// A CSV counterpart that exists but cannot be parsed is an error when
    /// `fail_if_not_found` is set; otherwise it is logged and the workbook is tried.
    pub fn retrieve(&mut self, alternative_subpaths: &[String], fail_if_not_found: bool) -> Result<Option<Table>> {
        self.run(AccessorAction::Retrieve, |ax| {
            if let Some(table) = ax.retrieve_lightweight(fail_if_not_found)? {
                return Ok(Some(table));
            }
            ax.retrieve_workbook(alternative_subpaths, fail_if_not_found)
        })
    }

    fn sheets_to_try(&self, alternative_subpaths: &[String]) -> Vec<String> {
        let mut sheets = vec![self.sheet_name().to_string()];
        sheets.extend(alternative_subpaths.iter().cloned());
        sheets
    }

    fn retrieve_lightweight(&self, fail_if_not_found: bool) -> Result<Option<Table>> {
        let csv_path = lightweight_path(&self.url);
        if !csv_path.is_file() {
            return Ok(None);
        }
        match workbook::read_csv(&csv_path) {
            Ok(table) => Ok(Some(table)),
            Err(e) if e.is_permission_denied() => Err(e),
            Err(e) if fail_if_not_found => Err(ProjectorError::Unreadable {
                url: csv_path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) => {
                warn!(
                    "Ignoring unreadable '{}', falling back to workbook: {}",
                    csv_path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn retrieve_workbook(&self, alternative_subpaths: &[String], fail_if_not_found: bool) -> Result<Option<Table>> {
        let sheets_to_try = self.sheets_to_try(alternative_subpaths);
        let not_found = || ProjectorError::NotFound {
            url: self.url.display().to_string(),
            tried: sheets_to_try.clone(),
        };

        // A url that is itself the CSV counterpart has no workbook to fall back to
        if !self.url.is_file() || lightweight_path(&self.url) == self.url {
            return if fail_if_not_found { Err(not_found()) } else { Ok(None) };
        }

        let book = Workbook::read(&self.url)?;
        for sheet in &sheets_to_try {
            if let Some(table) = book.sheet(sheet) {
                return Ok(Some(table.clone()));
            }
        }

        if fail_if_not_found {
            Err(not_found())
        } else {
            Ok(None)
        }
    }

    /// Writes `table` under the sheet named by `subpath` (or "Sheet1"), creating parent
    /// folders as needed. Other sheets of an existing workbook are kept. A stale CSV
    /// counterpart is removed so later reads see what was just written.
    pub fn persist(&mut self, table: &Table) -> Result<()> {
        self.run(AccessorAction::Persist, |ax| ax.write_sheet(table, true))
    }

    /// Like [`persist`](Self::persist), but the workbook ends up holding `table` alone:
    /// every other sheet of an existing file is dropped.
    pub fn persist_replacing(&mut self, table: &Table) -> Result<()> {
        self.run(AccessorAction::Persist, |ax| ax.write_sheet(table, false))
    }

    fn write_sheet(&self, table: &Table, keep_other_sheets: bool) -> Result<()> {
        if let Some(folder) = self.url.parent() {
            fs::create_dir_all(folder)?;
        }

        let csv_path = lightweight_path(&self.url);
        if csv_path == self.url {
            return workbook::write_csv(&self.url, table);
        }

        let mut book = if keep_other_sheets && self.url.is_file() {
            match Workbook::read(&self.url) {
                Ok(book) => book,
                Err(e) if e.is_permission_denied() => return Err(e),
                Err(e) => {
                    warn!("Overwriting unreadable workbook '{}': {}", self.url.display(), e);
                    Workbook::default()
                }
            }
        } else {
            Workbook::default()
        };
        book.set_sheet(self.sheet_name(), table.clone());
        book.write(&self.url)?;

        if csv_path.is_file() {
            fs::remove_file(&csv_path)?;
        }
        Ok(())
    }

    /// Deletes whatever lives at `url`. Nothing to do if it does not exist.
    pub fn remove(&mut self) -> Result<()> {
        self.run(AccessorAction::Remove, |ax| {
            if ax.url.is_dir() {
                fs::remove_dir_all(&ax.url)?;
            } else if ax.url.exists() {
                fs::remove_file(&ax.url)?;
            }
            Ok(())
        })
    }

    /// Recursively copies `src_url` into `url`, overwriting same-named files and keeping
    /// everything else. A missing `src_url` is created empty first.
    pub fn copy_from(&mut self, src_url: &Path) -> Result<()> {
        self.run(AccessorAction::Copy, |ax| {
            if src_url.is_file() {
                if let Some(parent) = ax.url.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(src_url, &ax.url)?;
                return Ok(());
            }

            fs::create_dir_all(src_url)?;
            fs::create_dir_all(&ax.url)?;
            for entry in WalkDir::new(src_url).follow_links(false).min_depth(1) {
                let entry = entry?;
                let relative = entry
                    .path()
                    .strip_prefix(src_url)
                    .map_err(|e| ProjectorError::Config(e.to_string()))?;
                let target = ax.url.join(relative);
                if entry.file_type().is_dir() {
                    fs::create_dir_all(&target)?;
                } else {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::copy(entry.path(), &target)?;
                }
            }
            Ok(())
        })
    }
}
