use crate::dataset::filter::SliceDefinition;
use crate::util::timestamp::Timestamp;

/// Logical name and location of one dataset, independent of the hub holding it.
pub trait DatasetIdentity: Send + Sync {
    fn name(&self) -> &str;

    /// Location of the dataset relative to the root of any hub.
    fn path_within_hub(&self) -> String;

    /// Sections below [`path_within_hub`](Self::path_within_hub) that together make up
    /// the dataset. Usually one; imports exported in batches may span several.
    fn subpaths(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedDatasetIdentity {
    name: String,
    path: String,
    subpaths: Vec<String>,
}

impl NamedDatasetIdentity {
    pub fn new(name: impl Into<String>, path: impl Into<String>, subpaths: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            subpaths,
        }
    }

    /// Identity whose content sits in a single section with the given label.
    pub fn single(name: impl Into<String>, path: impl Into<String>, subpath: impl Into<String>) -> Self {
        Self::new(name, path, vec![subpath.into()])
    }
}

impl DatasetIdentity for NamedDatasetIdentity {
    fn name(&self) -> &str {
        &self.name
    }

    fn path_within_hub(&self) -> String {
        self.path.clone()
    }

    fn subpaths(&self) -> Vec<String> {
        self.subpaths.clone()
    }
}

/// Identity tied to a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedDatasetIdentity {
    base: NamedDatasetIdentity,
    pub timestamp: Timestamp,
}

impl TimestampedDatasetIdentity {
    pub fn new(base: NamedDatasetIdentity, timestamp: Timestamp) -> Self {
        Self { base, timestamp }
    }
}

impl DatasetIdentity for TimestampedDatasetIdentity {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn path_within_hub(&self) -> String {
        self.base.path_within_hub()
    }

    fn subpaths(&self) -> Vec<String> {
        self.base.subpaths()
    }
}

/// Timestamped identity that also carries the slice it was cut with.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceDatasetIdentity {
    base: TimestampedDatasetIdentity,
    pub slice_definition: SliceDefinition,
}

impl SliceDatasetIdentity {
    pub fn new(base: TimestampedDatasetIdentity, slice_definition: SliceDefinition) -> Self {
        Self { base, slice_definition }
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.base.timestamp
    }
}

impl DatasetIdentity for SliceDatasetIdentity {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn path_within_hub(&self) -> String {
        self.base.path_within_hub()
    }

    fn subpaths(&self) -> Vec<String> {
        self.base.subpaths()
    }
}
