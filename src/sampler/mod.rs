//! Samplers shrink full datasets into small but still representative ones, so that test
//! fixtures stay quick to run without losing the nuances the business logic cares about.
//!
//! Every sampler maps a [`SampleSet`] to a [`SampleSet`] with these guarantees for each
//! key `k` of the output:
//! - `k` was a key of the input;
//! - the output table has exactly the input's columns and a subset of its rows;
//! - rows are renumbered 0, 1, 2, ... (tables carry no separate index, so this holds by
//!   construction).

pub mod chain;
pub mod filter;
pub mod first_found;
pub mod random;

pub use chain::ChainSampler;
pub use filter::FilterSampler;
pub use first_found::FirstFoundSampler;
pub use random::RandomSampler;

use crate::database::accessor::DataAccessor;
use crate::dataset::table::Table;
use crate::error::Result;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Tables keyed by dataset key, normally a file name such as "exports since Jan 1.json".
pub type SampleSet = IndexMap<String, Table>;

pub trait Sampler {
    fn generate_sample(&self, raw: &SampleSet) -> Result<SampleSet>;

    /// Samples `raw` and saves every sampled table to `path/<key>` under `worksheet`
    /// (default "Sheet1"). Returns what was saved.
    fn create_samples(&self, raw: &SampleSet, path: &Path, worksheet: Option<&str>) -> Result<SampleSet> {
        let samples = self.generate_sample(raw)?;
        fs::create_dir_all(path)?;
        for (key, table) in &samples {
            DataAccessor::scope(path.join(key), worksheet.map(str::to_string), |ax| ax.persist(table))?;
        }
        info!("Saved {} sample(s) under {}", samples.len(), path.display());
        Ok(samples)
    }
}

/// Every distinct value of `column` across all tables, in first-seen order. Tables without
/// the column contribute nothing.
pub fn value_list(raw: &SampleSet, column: &str) -> Vec<Value> {
    let mut seen: IndexSet<String> = IndexSet::new();
    let mut values = Vec::new();
    for table in raw.values() {
        for value in table.column_values(column) {
            // Value is not Hash; its JSON text is a faithful key
            if seen.insert(value.to_string()) {
                values.push(value.clone());
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_list_unions_without_duplicates() {
        let mut raw = SampleSet::new();
        raw.insert(
            "a".into(),
            Table::from_rows(vec!["tag".into()], vec![vec![json!("x")], vec![json!("y")], vec![json!("x")]]),
        );
        raw.insert("b".into(), Table::from_rows(vec!["tag".into()], vec![vec![json!("z")], vec![json!("y")]]));
        raw.insert("c".into(), Table::from_rows(vec!["other".into()], vec![vec![json!("w")]]));

        assert_eq!(value_list(&raw, "tag"), vec![json!("x"), json!("y"), json!("z")]);
        assert!(value_list(&raw, "missing").is_empty());
    }
}
