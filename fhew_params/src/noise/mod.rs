use serde::{Deserialize, Serialize};

use crate::{ParameterSet, Result};

mod output;
mod process;

pub use output::{Metric, PerformanceMetrics, parse_noise_samples};
pub use process::{BinFheNoiseOracle, ScratchFiles};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// The noise observed after evaluating gates with a parameter set.
pub struct NoiseMeasurement {
    /// The sample standard deviation of the measured noise.
    pub noise_std: f64,

    /// Key sizes and timings reported alongside the noise.
    pub performance: PerformanceMetrics,
}

/// Measures the noise of bootstrapped gates under a parameter set.
///
/// # Remarks
/// Measurements are stochastic. Noise decreases with the lattice dimension
/// in expectation, but individual measurements need not be monotone.
///
/// Errors (e.g. malformed output or too few samples) are fatal for the
/// search that requested the measurement.
pub trait NoiseOracle {
    /// Evaluates `sample_count` gates with `gate_inputs` inputs each and
    /// reports the standard deviation of their noise.
    fn measure(
        &self,
        params: &ParameterSet,
        sample_count: u32,
        gate_inputs: u32,
    ) -> Result<NoiseMeasurement>;
}

impl<T: NoiseOracle + ?Sized> NoiseOracle for &T {
    fn measure(
        &self,
        params: &ParameterSet,
        sample_count: u32,
        gate_inputs: u32,
    ) -> Result<NoiseMeasurement> {
        (**self).measure(params, sample_count, gate_inputs)
    }
}
