use serde::{Deserialize, Serialize};

use crate::{CostModel, Result, SecretDistribution};

mod estimator;
mod optimizer;

pub use estimator::{LatticeEstimator, UNEVALUABLE_EXIT_CODE};
pub use optimizer::{MAX_LOG_MODULUS, SecureModulus, SecurityOptimizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// An LWE instance whose bit-security should be estimated.
pub struct SecurityQuery {
    /// The LWE dimension.
    pub dimension: usize,

    /// The bit length of the (power of two) modulus.
    pub log_modulus: u32,

    /// The distribution of the secret.
    pub secret_distribution: SecretDistribution,

    /// The number of threads the estimator may use internally.
    pub threads: usize,

    /// The lattice reduction cost model.
    pub cost_model: CostModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The outcome of asking a [`SecurityOracle`] about an instance.
pub enum SecurityEstimate {
    /// The estimated bit-security of the cheapest attack.
    Bits(u32),

    /// The estimator can't evaluate an instance of this scale (typically the
    /// modulus is too small for the dimension). Retrying with a larger
    /// modulus may succeed.
    Unevaluable,
}

/// Estimates the bit-security of LWE instances.
pub trait SecurityOracle {
    /// Estimates the security of `query`.
    ///
    /// # Remarks
    /// Instances the estimator can't evaluate return
    /// [`SecurityEstimate::Unevaluable`]. Errors are reserved for failures of
    /// the oracle itself and abort the search.
    fn estimate(&self, query: &SecurityQuery) -> Result<SecurityEstimate>;
}

impl<T: SecurityOracle + ?Sized> SecurityOracle for &T {
    fn estimate(&self, query: &SecurityQuery) -> Result<SecurityEstimate> {
        (**self).estimate(query)
    }
}
