// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Random initialisation of matrix variables
//!
//! The distributions draw from a caller-owned engine; stores only decide how many
//! values are drawn and where they land.

use num_traits::Float;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::{Normal, StandardNormal};

use crate::error::{SparseError, SparseResult};

/// Build a uniform distribution over `[low, high)`
pub(crate) fn uniform<T>(low: T, high: T) -> SparseResult<Uniform<T>>
where
    T: Float + SampleUniform,
{
    let finite = low.is_finite() && high.is_finite() && (high - low).is_finite();
    if !finite || low >= high {
        return Err(SparseError::InvalidArgument(format!(
            "uniform range [{:?}, {:?}) is empty or not finite",
            low.to_f64(),
            high.to_f64()
        )));
    }
    Ok(Uniform::new(low, high))
}

/// Build a normal distribution with the given mean and standard deviation
pub(crate) fn normal<T>(mean: T, sigma: T) -> SparseResult<Normal<T>>
where
    T: Float,
    StandardNormal: Distribution<T>,
{
    Normal::new(mean, sigma).map_err(|e| {
        SparseError::InvalidArgument(format!(
            "normal distribution (mean {:?}, sigma {:?}): {}",
            mean.to_f64(),
            sigma.to_f64(),
            e
        ))
    })
}

/// Draw `len` samples in order
pub(crate) fn sample_vec<T, D, R>(dist: &D, len: usize, rng: &mut R) -> Vec<T>
where
    D: Distribution<T>,
    R: Rng + ?Sized,
{
    (0..len).map(|_| dist.sample(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = uniform(0.25f32, 0.5).unwrap();
        let values = sample_vec(&dist, 100, &mut rng);
        assert!(values.iter().all(|&v| (0.25..0.5).contains(&v)));
    }

    #[test]
    fn test_uniform_rejects_empty_range() {
        assert!(uniform(1.0f64, 1.0).is_err());
        assert!(uniform(f64::NEG_INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_normal_rejects_negative_sigma() {
        assert!(normal(0.0f64, -1.0).is_err());
        assert!(normal(0.0f64, 0.0).is_ok());
    }
}
