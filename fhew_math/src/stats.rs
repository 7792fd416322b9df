use statrs::statistics::Statistics;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// The reduction of a batch of noise samples measured for one parameter set.
pub struct NoiseSummary {
    count: usize,
    mean: f64,
    std: f64,
}

impl NoiseSummary {
    /// Summarizes the given samples using the unbiased (n - 1) sample
    /// standard deviation.
    ///
    /// # Errors
    /// Fails if fewer than two samples are given or any sample is not finite.
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        if samples.len() < 2 {
            return Err(Error::InsufficientSamples(samples.len()));
        }

        if let Some((index, value)) = samples.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(Error::NonFiniteSample {
                index,
                value: *value,
            });
        }

        Ok(Self {
            count: samples.len(),
            mean: samples.iter().mean(),
            std: samples.iter().std_dev(),
        })
    }

    /// The number of samples that were summarized.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The sample mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// The sample standard deviation.
    pub fn std(&self) -> f64 {
        self.std
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_std_uses_bessel_correction() {
        let summary = NoiseSummary::from_samples(&[2., 4., 4., 4., 5., 5., 7., 9.]).unwrap();

        assert_eq!(summary.count(), 8);
        assert!((summary.mean() - 5.0).abs() < 1e-12);
        assert!((summary.std() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn too_few_samples_is_an_error() {
        assert_eq!(
            NoiseSummary::from_samples(&[]),
            Err(Error::InsufficientSamples(0))
        );
        assert_eq!(
            NoiseSummary::from_samples(&[1.5]),
            Err(Error::InsufficientSamples(1))
        );
    }

    #[test]
    fn nan_sample_is_an_error() {
        let err = NoiseSummary::from_samples(&[1.0, f64::NAN, 2.0]).unwrap_err();

        assert!(matches!(err, Error::NonFiniteSample { index: 1, .. }));
    }
}
