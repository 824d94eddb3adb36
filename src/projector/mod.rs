//! Projection of a database into a smaller one.
//!
//! A projector loads every in-scope dataset from every input hub, narrows each one down
//! with its [`SliceDefinition`], and saves the result into the output hub of the same
//! name. The three phases run strictly one after the other: skip reporting needs every
//! load to be done, and saving needs every projection.

pub mod filter_projector;
pub mod statistics;

pub use filter_projector::FilterProjector;
pub use statistics::{DatasetStatistics, ProjectionStatistics, ShapeRecord, STATISTICS_COLUMNS};

use crate::context::AppContext;
use crate::database::accessor::DataAccessor;
use crate::database::hub::DataHub;
use crate::database::manifest::DatabaseManifest;
use crate::dataset::content::{DataSetContent, TableDataSetContent};
use crate::dataset::filter::SliceDefinition;
use crate::dataset::identity::DatasetIdentity;
use crate::dataset::table::Table;
use crate::error::{ProjectorError, Result};
use crate::logging::LogLevel;
use indexmap::{IndexMap, IndexSet};
use metrics::counter;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info_span, warn};

pub trait DatabaseProjector {
    fn datasets_in_scope(&self) -> &[Arc<dyn DatasetIdentity>];

    /// Advisory size the projection should aim for. Not enforced by [`project`](Self::project).
    fn target_size(&self) -> usize;

    fn projection_filter(&self) -> SliceDefinition;

    /// Empty projections are not saved unless this says the dataset must always exist.
    fn must_save_even_if_empty(&self, _relative_url: &str) -> bool {
        false
    }

    /// When true, a dataset found in none of the input hubs fails the run instead of
    /// only being reported.
    fn fail_if_skipped_by_all_hubs(&self) -> bool {
        false
    }

    /// Runs load, project and save, returning one statistics row per loaded dataset.
    fn project(
        &self,
        ctx: &AppContext,
        input_db: &dyn DatabaseManifest,
        output_db: &dyn DatabaseManifest,
    ) -> Result<ProjectionStatistics> {
        let span = info_span!("project", datasets = self.datasets_in_scope().len(), target_size = self.target_size());
        let _enter = span.enter();

        let loaded = load_phase(self, ctx, input_db)?;
        let projected = project_phase(self, ctx, &loaded, output_db);
        save_phase(self, ctx, &projected)?;

        let input = loaded.datasets.iter().map(|d| ShapeRecord::of(&d.relative_url, &d.table)).collect();
        let output = projected.iter().map(|d| ShapeRecord::of(&d.relative_url, &d.table)).collect();
        let stats = ProjectionStatistics::align(input, output)?;
        Ok(stats.with_skipped_by_all_hubs(loaded.skipped_by_all_hubs.into_iter().collect()))
    }
}

/// A dataset as found in (or destined for) one hub.
struct DatasetInfo {
    hub: Arc<dyn DataHub>,
    relative_url: String,
    sheet: Option<String>,
    table: Table,
}

struct LoadOutcome {
    datasets: Vec<DatasetInfo>,
    skipped_by_all_hubs: BTreeSet<String>,
}

fn load_phase<P: DatabaseProjector + ?Sized>(
    projector: &P,
    ctx: &AppContext,
    input_db: &dyn DatabaseManifest,
) -> Result<LoadOutcome> {
    let in_scope = projector.datasets_in_scope();
    let all_relative_urls: IndexSet<String> = in_scope.iter().map(|id| id.path_within_hub()).collect();
    let mut skipped_by_hub: IndexMap<String, BTreeSet<String>> = IndexMap::new();
    let mut datasets = Vec::new();

    for hub in input_db.data_hubs() {
        let hub_root = hub.hub_root();
        let mut skipped = BTreeSet::new();
        ctx.log(&format!("---------- Working in DataHub {} ----------", hub.name()), LogLevel::INFO);

        for dataset_id in in_scope {
            let relative_url = dataset_id.path_within_hub();
            let full_url = hub_root.join(&relative_url);
            if !full_url.exists() {
                skipped.insert(relative_url);
                continue;
            }
            ctx.log(&format!("\t\tloading '{}'", relative_url), LogLevel::INFO);

            // A dataset split across several sections is reassembled into one table
            let subpaths = dataset_id.subpaths();
            let sections: Vec<Option<String>> = if subpaths.is_empty() {
                vec![None]
            } else {
                subpaths.into_iter().map(Some).collect()
            };
            let mut fragments = Vec::new();
            for section in &sections {
                let fragment = DataAccessor::scope(&full_url, section.clone(), |ax| ax.retrieve(&[], false))?;
                if let Some(fragment) = fragment {
                    fragments.push(fragment);
                }
            }
            if fragments.is_empty() {
                warn!(
                    "'{}' exists in hub '{}' but none of its sections could be found",
                    relative_url,
                    hub.name()
                );
                skipped.insert(relative_url);
                continue;
            }

            let table = Table::concat(&fragments);
            ctx.log(
                &format!(
                    "data shape=({}, {}) *** Loaded '{}'",
                    table.nb_rows(),
                    table.nb_columns(),
                    relative_url
                ),
                LogLevel::DEBUG,
            );
            datasets.push(DatasetInfo {
                hub: hub.clone(),
                relative_url,
                sheet: sections.into_iter().next().flatten(),
                table,
            });
        }
        skipped_by_hub.insert(hub.name().to_string(), skipped);
    }

    let skipped_by_all_hubs = skipped_by_all(&all_relative_urls, &skipped_by_hub);
    counter!("projector_datasets_loaded_total").increment(datasets.len() as u64);

    let skipped_msg = if skipped_by_all_hubs.is_empty() {
        String::new()
    } else {
        format!(
            "\n\tSkipped: {}",
            skipped_by_all_hubs.iter().cloned().collect::<Vec<_>>().join("\n\t\t")
        )
    };
    ctx.log(
        &format!(
            "---------- Loaded {}/ {} datasets ----------{}",
            datasets.len(),
            in_scope.len(),
            skipped_msg
        ),
        LogLevel::INFO,
    );

    if projector.fail_if_skipped_by_all_hubs() && !skipped_by_all_hubs.is_empty() {
        return Err(ProjectorError::MissingEverywhere {
            relative_urls: skipped_by_all_hubs.iter().cloned().collect(),
            hubs: skipped_by_hub.keys().cloned().collect(),
        });
    }

    Ok(LoadOutcome {
        datasets,
        skipped_by_all_hubs,
    })
}

/// Relative urls that no hub had. Missing from only some hubs is normal and not reported.
fn skipped_by_all(
    all_relative_urls: &IndexSet<String>,
    skipped_by_hub: &IndexMap<String, BTreeSet<String>>,
) -> BTreeSet<String> {
    if skipped_by_hub.is_empty() {
        return BTreeSet::new();
    }
    let mut result: BTreeSet<String> = all_relative_urls.iter().cloned().collect();
    for skipped in skipped_by_hub.values() {
        result = result.intersection(skipped).cloned().collect();
    }
    result
}

fn project_phase<P: DatabaseProjector + ?Sized>(
    projector: &P,
    ctx: &AppContext,
    loaded: &LoadOutcome,
    output_db: &dyn DatabaseManifest,
) -> Vec<DatasetInfo> {
    let projection_filter = projector.projection_filter();
    // Keyed by load position so the output order matches the input order
    let mut projected: Vec<(usize, DatasetInfo)> = Vec::new();

    for projected_hub in output_db.data_hubs() {
        for (position, data_info) in loaded.datasets.iter().enumerate() {
            if projected_hub.name() != data_info.hub.name() {
                continue;
            }
            let content = TableDataSetContent::new(data_info.table.clone());
            let projected_table = content.filter(&projection_filter).into_table();
            ctx.log(
                &format!(
                    "data shape: ({}, {})->({}, {}) *** Projected '{}'",
                    data_info.table.nb_rows(),
                    data_info.table.nb_columns(),
                    projected_table.nb_rows(),
                    projected_table.nb_columns(),
                    data_info.relative_url
                ),
                LogLevel::DEBUG,
            );
            projected.push((
                position,
                DatasetInfo {
                    hub: projected_hub.clone(),
                    relative_url: data_info.relative_url.clone(),
                    sheet: data_info.sheet.clone(),
                    table: projected_table,
                },
            ));
        }
    }
    projected.sort_by_key(|(position, _)| *position);
    let projected: Vec<DatasetInfo> = projected.into_iter().map(|(_, info)| info).collect();

    counter!("projector_datasets_projected_total").increment(projected.len() as u64);
    ctx.log(
        &format!(
            "---------- Projected {}/ {} datasets ----------",
            projected.len(),
            projector.datasets_in_scope().len()
        ),
        LogLevel::INFO,
    );
    if !loaded.skipped_by_all_hubs.is_empty() {
        ctx.log(
            &format!("{} dataset(s) were in no input hub", loaded.skipped_by_all_hubs.len()),
            LogLevel::DEBUG,
        );
    }
    projected
}

fn save_phase<P: DatabaseProjector + ?Sized>(
    projector: &P,
    ctx: &AppContext,
    projected: &[DatasetInfo],
) -> Result<()> {
    let mut nb_saved = 0;
    for info in projected {
        // Projecting often empties a dataset; those are only kept on request
        if info.table.is_empty() && !projector.must_save_even_if_empty(&info.relative_url) {
            continue;
        }
        // The projected table replaces the whole file, stale sections included
        let full_url = info.hub.hub_root().join(&info.relative_url);
        DataAccessor::scope(full_url, info.sheet.clone(), |ax| ax.persist_replacing(&info.table))?;
        nb_saved += 1;
    }

    counter!("projector_datasets_saved_total").increment(nb_saved as u64);
    ctx.log(
        &format!(
            "---------- Saved {}/ {} datasets ----------",
            nb_saved,
            projector.datasets_in_scope().len()
        ),
        LogLevel::INFO,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn skipped_by_all_is_the_intersection() {
        let all: IndexSet<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let mut by_hub = IndexMap::new();
        by_hub.insert("hub1".to_string(), set(&["x", "z"]));
        by_hub.insert("hub2".to_string(), set(&["y", "z"]));

        assert_eq!(skipped_by_all(&all, &by_hub), set(&["z"]));
    }

    #[test]
    fn nothing_is_skipped_without_hubs() {
        let all: IndexSet<String> = ["x"].iter().map(|s| s.to_string()).collect();
        assert!(skipped_by_all(&all, &IndexMap::new()).is_empty());
    }
}
