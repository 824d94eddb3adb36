use crate::config::ProjectorConfig;
use crate::dataset::filter::SliceDefinition;
use crate::dataset::identity::DatasetIdentity;
use crate::error::Result;
use crate::projector::DatabaseProjector;
use std::collections::HashSet;
use std::sync::Arc;

/// Projector driven by a fixed slice, with an explicit list of datasets that must be
/// saved even when the slice empties them.
pub struct FilterProjector {
    datasets_in_scope: Vec<Arc<dyn DatasetIdentity>>,
    target_size: usize,
    slice: SliceDefinition,
    always_save: HashSet<String>,
    strict: bool,
}

impl FilterProjector {
    pub fn new(datasets_in_scope: Vec<Arc<dyn DatasetIdentity>>, target_size: usize, slice: SliceDefinition) -> Self {
        Self {
            datasets_in_scope,
            target_size,
            slice,
            always_save: HashSet::new(),
            strict: false,
        }
    }

    pub fn from_config(config: &ProjectorConfig) -> Result<Self> {
        let projector = Self::new(
            config.dataset_identities()?,
            config.projection.target_size,
            config.projection.slice_definition(),
        );
        Ok(projector.always_saving(config.projection.always_save.iter().cloned()))
    }

    pub fn always_saving<I, S>(mut self, relative_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_save.extend(relative_urls.into_iter().map(Into::into));
        self
    }

    /// Fail the run when a dataset in scope is missing from every input hub.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl DatabaseProjector for FilterProjector {
    fn datasets_in_scope(&self) -> &[Arc<dyn DatasetIdentity>] {
        &self.datasets_in_scope
    }

    fn target_size(&self) -> usize {
        self.target_size
    }

    fn projection_filter(&self) -> SliceDefinition {
        self.slice.clone()
    }

    fn must_save_even_if_empty(&self, relative_url: &str) -> bool {
        self.always_save.contains(relative_url)
    }

    fn fail_if_skipped_by_all_hubs(&self) -> bool {
        self.strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_save_list_drives_escape_hatch() {
        let projector = FilterProjector::new(Vec::new(), 10, SliceDefinition::everything())
            .always_saving(["reports/summary.json"]);
        assert!(projector.must_save_even_if_empty("reports/summary.json"));
        assert!(!projector.must_save_even_if_empty("reports/other.json"));
        assert!(!projector.fail_if_skipped_by_all_hubs());
    }

    #[test]
    fn built_from_config() {
        let config = ProjectorConfig::from_toml_str(
            "[projection]\ntarget_size = 5\nalways_save = [\"a.json\"]\n[[projection.filters]]\nfield = \"k\"\nallowed_values = [1]\n[[datasets]]\nname = \"a\"\npath = \"a.json\"\n",
        )
        .unwrap();
        let projector = FilterProjector::from_config(&config).unwrap();
        assert_eq!(projector.target_size(), 5);
        assert_eq!(projector.datasets_in_scope().len(), 1);
        assert_eq!(projector.projection_filter().filters_to_apply.len(), 1);
        assert!(projector.must_save_even_if_empty("a.json"));
    }
}
