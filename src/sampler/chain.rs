use crate::error::{ProjectorError, Result};
use crate::sampler::{SampleSet, Sampler};

/// Runs samplers in succession, each one fed the previous one's output.
pub struct ChainSampler {
    samplers: Vec<Box<dyn Sampler>>,
}

impl ChainSampler {
    pub fn new(samplers: Vec<Box<dyn Sampler>>) -> Self {
        Self { samplers }
    }

    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }
}

impl Sampler for ChainSampler {
    fn generate_sample(&self, raw: &SampleSet) -> Result<SampleSet> {
        let Some((first, rest)) = self.samplers.split_first() else {
            return Err(ProjectorError::InvalidSampler(
                "ChainSampler can't run because the list of Samplers to be chained is an empty list".to_string(),
            ));
        };
        let mut data = first.generate_sample(raw)?;
        for sampler in rest {
            data = sampler.generate_sample(&data)?;
        }
        Ok(data)
    }
}
