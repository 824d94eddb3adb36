use crate::error::Result;
use crate::sampler::{SampleSet, Sampler};
use serde_json::Value;

/// Keeps the rows whose `column` holds a string containing at least one of the tags.
/// Tables without `column` pass through untouched.
pub struct FilterSampler {
    column: String,
    matching_tags: Vec<String>,
}

impl FilterSampler {
    pub fn new(column: impl Into<String>, matching_tags: Vec<String>) -> Self {
        Self {
            column: column.into(),
            matching_tags,
        }
    }

    fn is_match(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.matching_tags.iter().any(|tag| s.contains(tag.as_str())),
            _ => false,
        }
    }
}

impl Sampler for FilterSampler {
    fn generate_sample(&self, raw: &SampleSet) -> Result<SampleSet> {
        let mut sample = SampleSet::new();
        for (key, full) in raw {
            let sampled = match full.column_index(&self.column) {
                Some(idx) if !full.is_empty() => full.retain_rows(|row| self.is_match(&row[idx])),
                _ => full.clone(),
            };
            sample.insert(key.clone(), sampled);
        }
        Ok(sample)
    }
}
