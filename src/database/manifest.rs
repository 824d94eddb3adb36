use crate::config::ProjectorConfig;
use crate::database::hub::{DataHub, DataHubHandle, SingleRootDataHub};
use crate::error::{ProjectorError, Result};
use std::path::Path;
use std::sync::Arc;

/// A database: the ordered hubs it is partitioned into. The manifest references hubs;
/// each hub resolves its own storage.
pub trait DatabaseManifest: Send + Sync {
    fn data_hubs(&self) -> Vec<Arc<dyn DataHub>>;

    fn hub(&self, name: &str) -> Option<Arc<dyn DataHub>> {
        self.data_hubs().into_iter().find(|h| h.name() == name)
    }
}

#[derive(Clone, Default)]
pub struct StaticDatabaseManifest {
    hubs: Vec<Arc<dyn DataHub>>,
}

impl StaticDatabaseManifest {
    pub fn new(hubs: Vec<Arc<dyn DataHub>>) -> Self {
        Self { hubs }
    }

    pub fn with_hub(mut self, hub: impl DataHub + 'static) -> Self {
        self.hubs.push(Arc::new(hub));
        self
    }

    /// One hub per configured entry. Relative hubs are bound to `database_root`.
    pub fn from_config(config: &ProjectorConfig, database_root: &Path) -> Result<Self> {
        let mut hubs: Vec<Arc<dyn DataHub>> = Vec::with_capacity(config.hubs.len());
        for hub in &config.hubs {
            let handle = match (&hub.relative_path, &hub.absolute_root) {
                (Some(relative), None) => DataHubHandle::relative(database_root, relative.clone()),
                (None, Some(absolute)) => DataHubHandle::absolute(absolute.clone()),
                _ => {
                    return Err(ProjectorError::Config(format!(
                        "Hub '{}' needs exactly one of 'relative_path' or 'absolute_root'",
                        hub.name
                    )))
                }
            };
            hubs.push(Arc::new(SingleRootDataHub::new(hub.name.clone(), handle)));
        }
        Ok(Self { hubs })
    }
}

impl DatabaseManifest for StaticDatabaseManifest {
    fn data_hubs(&self) -> Vec<Arc<dyn DataHub>> {
        self.hubs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn builds_hubs_in_config_order() {
        let config = ProjectorConfig::from_toml_str(
            "[[hubs]]\nname = \"input\"\nrelative_path = \"in\"\n[[hubs]]\nname = \"ext\"\nabsolute_root = \"/mnt/ext\"\n",
        )
        .unwrap();
        let manifest = StaticDatabaseManifest::from_config(&config, Path::new("/db")).unwrap();

        let names: Vec<String> = manifest.data_hubs().iter().map(|h| h.name().to_string()).collect();
        assert_eq!(names, vec!["input", "ext"]);
        assert_eq!(manifest.hub("input").unwrap().hub_root(), PathBuf::from("/db/in"));
        assert_eq!(manifest.hub("ext").unwrap().hub_root(), PathBuf::from("/mnt/ext"));
        assert!(manifest.hub("missing").is_none());
    }
}
