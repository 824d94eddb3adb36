use crate::dataset::filter::{AnyOfFilter, SliceDefinition};
use crate::dataset::identity::{DatasetIdentity, NamedDatasetIdentity, TimestampedDatasetIdentity};
use crate::database::workbook::DEFAULT_SHEET;
use crate::error::{ProjectorError, Result};
use crate::logging::LogLevel;
use crate::util::timestamp::Timestamp;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectorConfig {
    #[serde(default)]
    pub secrets_location: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub hubs: Vec<HubConfig>,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    pub input_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
}

/// One hub of the database. Exactly one of `relative_path` (below the database root)
/// or `absolute_root` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    pub name: String,
    pub relative_path: Option<String>,
    pub absolute_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default)]
    pub target_size: usize,
    #[serde(default)]
    pub filters: Vec<AnyOfFilter>,
    /// Relative urls persisted even when their projection is empty.
    #[serde(default)]
    pub always_save: Vec<String>,
}

impl ProjectionConfig {
    pub fn slice_definition(&self) -> SliceDefinition {
        SliceDefinition::new(self.filters.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub subpaths: Vec<String>,
    pub timestamp: Option<String>,
}

impl DatasetConfig {
    pub fn identity(&self) -> Result<Arc<dyn DatasetIdentity>> {
        let subpaths = if self.subpaths.is_empty() {
            vec![DEFAULT_SHEET.to_string()]
        } else {
            self.subpaths.clone()
        };
        let base = NamedDatasetIdentity::new(self.name.clone(), self.path.clone(), subpaths);
        match &self.timestamp {
            Some(ts) => Ok(Arc::new(TimestampedDatasetIdentity::new(base, Timestamp::parse(ts)?))),
            None => Ok(Arc::new(base)),
        }
    }
}

impl ProjectorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProjectorError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ProjectorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for hub in &self.hubs {
            if !seen.insert(hub.name.as_str()) {
                return Err(ProjectorError::Config(format!("Duplicate hub name '{}'", hub.name)));
            }
            if hub.relative_path.is_some() == hub.absolute_root.is_some() {
                return Err(ProjectorError::Config(format!(
                    "Hub '{}' needs exactly one of 'relative_path' or 'absolute_root'",
                    hub.name
                )));
            }
        }
        self.log_level()?;
        Ok(())
    }

    /// Location of the secrets file needed by the application.
    pub fn secrets_path(&self) -> Result<&str> {
        self.secrets_location
            .as_deref()
            .ok_or_else(|| ProjectorError::Config("'secrets_location' is not configured".to_string()))
    }

    pub fn log_level(&self) -> Result<LogLevel> {
        LogLevel::parse_activation(&self.logging.level)
            .ok_or_else(|| ProjectorError::Config(format!("Unknown log level '{}'", self.logging.level)))
    }

    pub fn input_root(&self) -> Result<&Path> {
        self.database
            .input_root
            .as_deref()
            .ok_or_else(|| ProjectorError::Config("'database.input_root' is not configured".to_string()))
    }

    pub fn output_root(&self) -> Result<&Path> {
        self.database
            .output_root
            .as_deref()
            .ok_or_else(|| ProjectorError::Config("'database.output_root' is not configured".to_string()))
    }

    pub fn dataset_identities(&self) -> Result<Vec<Arc<dyn DatasetIdentity>>> {
        self.datasets.iter().map(DatasetConfig::identity).collect()
    }
}
