use crate::database::accessor::DataAccessor;
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Where a hub's root folder lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataHubHandle {
    /// Root is `database_root/relative_path`; a snapshot swaps the database root.
    Relative {
        database_root: PathBuf,
        relative_path: String,
    },
    /// Root is fixed; a snapshot replaces it entirely.
    Absolute { hub_root: PathBuf },
}

impl DataHubHandle {
    pub fn relative(database_root: impl Into<PathBuf>, relative_path: impl Into<String>) -> Self {
        DataHubHandle::Relative {
            database_root: database_root.into(),
            relative_path: relative_path.into(),
        }
    }

    pub fn absolute(hub_root: impl Into<PathBuf>) -> Self {
        DataHubHandle::Absolute {
            hub_root: hub_root.into(),
        }
    }

    pub fn hub_root(&self) -> PathBuf {
        match self {
            DataHubHandle::Relative {
                database_root,
                relative_path,
            } => database_root.join(relative_path),
            DataHubHandle::Absolute { hub_root } => hub_root.clone(),
        }
    }

    /// Same kind of handle, rooted at `snapshot_root`. `self` is untouched.
    pub fn snapshot_handle(&self, snapshot_root: &Path) -> DataHubHandle {
        match self {
            DataHubHandle::Relative { relative_path, .. } => {
                DataHubHandle::relative(snapshot_root, relative_path.clone())
            }
            DataHubHandle::Absolute { .. } => DataHubHandle::absolute(snapshot_root),
        }
    }
}

/// A named portion of the database: a taxonomy of dataset files, such as an "input"
/// hub fed by upstream systems or a "publication" hub the pipeline writes to.
pub trait DataHub: Send + Sync {
    /// Unique among the hubs of one manifest.
    fn name(&self) -> &str;

    fn hub_handle(&self) -> &DataHubHandle;

    fn hub_root(&self) -> PathBuf {
        self.hub_handle().hub_root()
    }

    /// Wipes this hub and makes it a copy of `seed`.
    fn populate_from_seed(&self, seed: &dyn DataHub) -> Result<()>;

    /// Adds `seed`'s content to this hub. Same-named files are overwritten, others kept.
    fn enrich_from_seed(&self, seed: &dyn DataHub) -> Result<()>;

    /// Copies this hub's current content to `snapshot_root`, clearing whatever was there,
    /// and returns a hub bound to the copy.
    fn create_snapshot(&self, snapshot_root: &Path) -> Result<Box<dyn DataHub>>;
}

/// A hub whose content lives entirely under a single folder.
///
/// Population and snapshotting are remove-then-copy and not atomic: a failure between
/// the two steps leaves the target partially cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleRootDataHub {
    name: String,
    hub_handle: DataHubHandle,
}

impl SingleRootDataHub {
    pub fn new(name: impl Into<String>, hub_handle: DataHubHandle) -> Self {
        Self {
            name: name.into(),
            hub_handle,
        }
    }

    /// Hex SHA-256 over every file below the root: relative path and bytes, in path order.
    /// Equal digests mean byte-identical content.
    pub fn content_digest(&self) -> Result<String> {
        let root = self.hub_root();
        let mut hasher = Sha256::new();
        if root.exists() {
            let mut files = Vec::new();
            for entry in WalkDir::new(&root).follow_links(false) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            files.sort();
            for path in files {
                let relative = path.strip_prefix(&root).unwrap_or(&path);
                hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
                hasher.update([0u8]);
                hasher.update(fs::read(&path)?);
                hasher.update([0u8]);
            }
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

impl DataHub for SingleRootDataHub {
    fn name(&self) -> &str {
        &self.name
    }

    fn hub_handle(&self) -> &DataHubHandle {
        &self.hub_handle
    }

    fn populate_from_seed(&self, seed: &dyn DataHub) -> Result<()> {
        DataAccessor::scope(self.hub_root(), None, |ax| ax.remove())?;
        self.enrich_from_seed(seed)
    }

    fn enrich_from_seed(&self, seed: &dyn DataHub) -> Result<()> {
        let seed_root = seed.hub_root();
        DataAccessor::scope(self.hub_root(), None, |ax| ax.copy_from(&seed_root))?;
        info!(
            "Hub '{}' enriched from '{}' ({})",
            self.name,
            seed.name(),
            seed_root.display()
        );
        Ok(())
    }

    fn create_snapshot(&self, snapshot_root: &Path) -> Result<Box<dyn DataHub>> {
        let snapshot_handle = self.hub_handle.snapshot_handle(snapshot_root);
        DataAccessor::scope(snapshot_handle.hub_root(), None, |ax| ax.remove())?;

        let snapshot_hub = SingleRootDataHub::new(self.name.clone(), snapshot_handle);
        snapshot_hub.enrich_from_seed(self)?;
        Ok(Box::new(snapshot_hub))
    }
}
