use crate::error::{ProjectorError, Result};
use crate::sampler::{SampleSet, Sampler};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

/// Keeps a random `percent` of every table's rows (rounded down), in their original order.
/// Output is reproducible only when a seed is given.
pub struct RandomSampler {
    percent: f64,
    seed: Option<u64>,
}

impl RandomSampler {
    pub fn new(percent: f64, seed: Option<u64>) -> Result<Self> {
        if !(0.0..=1.0).contains(&percent) {
            return Err(ProjectorError::InvalidSampler(format!(
                "RandomSampler percent must be between 0 and 1, got {}",
                percent
            )));
        }
        Ok(Self { percent, seed })
    }

    fn sample_with<R: Rng>(&self, raw: &SampleSet, rng: &mut R) -> SampleSet {
        raw.iter()
            .map(|(key, full)| {
                let row_count = full.nb_rows();
                let amount = (self.percent * row_count as f64).floor() as usize;
                let mut positions = index::sample(rng, row_count, amount.min(row_count)).into_vec();
                positions.sort_unstable();
                (key.clone(), full.take_rows(&positions))
            })
            .collect()
    }
}

impl Sampler for RandomSampler {
    fn generate_sample(&self, raw: &SampleSet) -> Result<SampleSet> {
        let sample = match self.seed {
            Some(seed) => self.sample_with(raw, &mut StdRng::seed_from_u64(seed)),
            None => self.sample_with(raw, &mut rand::thread_rng()),
        };
        Ok(sample)
    }
}
