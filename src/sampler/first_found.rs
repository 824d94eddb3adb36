use crate::error::Result;
use crate::sampler::{SampleSet, Sampler};

/// Keeps the first `sample_size` rows of every table.
pub struct FirstFoundSampler {
    sample_size: usize,
}

impl FirstFoundSampler {
    pub fn new(sample_size: usize) -> Self {
        Self { sample_size }
    }
}

impl Sampler for FirstFoundSampler {
    fn generate_sample(&self, raw: &SampleSet) -> Result<SampleSet> {
        Ok(raw
            .iter()
            .map(|(key, full)| (key.clone(), full.head(self.sample_size)))
            .collect())
    }
}
