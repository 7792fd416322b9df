use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    Result, SecretDistribution, SecurityEstimate, SecurityLevel, SecurityOracle, SecurityQuery,
};

/// The optimizer never considers moduli longer than this many bits.
pub const MAX_LOG_MODULUS: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// A dimension and the largest power of two modulus meeting a security level
/// at that dimension.
pub struct SecureModulus {
    /// The LWE dimension.
    pub dimension: usize,

    /// The bit length of the modulus.
    pub log_modulus: u32,
}

/// Finds the largest power of two modulus meeting a [`SecurityLevel`] for a
/// given dimension.
///
/// # Remarks
/// A larger modulus makes the lattice problem easier but reduces the noise
/// added by key switching, so the optimizer returns the most permissive
/// modulus still meeting the security floor.
///
/// The search relies on security being non-increasing in the modulus:
/// 1. Query the oracle at the initial modulus, doubling it while the oracle
///    can't evaluate the instance.
/// 2. While security is below target, halve the modulus.
/// 3. While doubling the modulus keeps security at or above target, double
///    it.
///
/// Infeasibility (no modulus in the explored range meets the target, or the
/// oracle can't evaluate a modulus it needs) is reported as `Ok(None)`.
pub struct SecurityOptimizer<'a, O> {
    oracle: &'a O,
    level: SecurityLevel,
    secret_distribution: SecretDistribution,
    threads: usize,
}

impl<O> Clone for SecurityOptimizer<'_, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O> Copy for SecurityOptimizer<'_, O> {}

impl<'a, O: SecurityOracle> SecurityOptimizer<'a, O> {
    /// Creates an optimizer targeting `level`.
    pub fn new(
        oracle: &'a O,
        level: SecurityLevel,
        secret_distribution: SecretDistribution,
        threads: usize,
    ) -> Self {
        Self {
            oracle,
            level,
            secret_distribution,
            threads,
        }
    }

    /// The targeted security level.
    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    fn estimate(&self, dimension: usize, log_modulus: u32) -> Result<SecurityEstimate> {
        let estimate = self.oracle.estimate(&SecurityQuery {
            dimension,
            log_modulus,
            secret_distribution: self.secret_distribution,
            threads: self.threads,
            cost_model: self.level.cost_model(),
        })?;

        debug!("security(n = {dimension}, log q = {log_modulus}) = {estimate:?}");

        Ok(estimate)
    }

    /// Returns the largest modulus meeting the target security at
    /// `dimension`, starting the search from a `initial_log_modulus`-bit
    /// modulus.
    pub fn optimize(
        &self,
        dimension: usize,
        initial_log_modulus: u32,
    ) -> Result<Option<SecureModulus>> {
        let target = self.level.bits();
        let mut log_modulus = initial_log_modulus.clamp(1, MAX_LOG_MODULUS);

        let mut security = loop {
            match self.estimate(dimension, log_modulus)? {
                SecurityEstimate::Bits(bits) => break bits,
                SecurityEstimate::Unevaluable if log_modulus < MAX_LOG_MODULUS => {
                    log_modulus += 1;
                }
                SecurityEstimate::Unevaluable => {
                    info!("Estimator can't evaluate dimension {dimension} at any modulus");
                    return Ok(None);
                }
            }
        };

        while security < target {
            if log_modulus == 1 {
                info!("No modulus gives dimension {dimension} {target} bits of security");
                return Ok(None);
            }

            log_modulus -= 1;

            security = match self.estimate(dimension, log_modulus)? {
                SecurityEstimate::Bits(bits) => bits,
                SecurityEstimate::Unevaluable => {
                    info!(
                        "Estimator can't evaluate dimension {dimension} below {} bits",
                        log_modulus + 1
                    );
                    return Ok(None);
                }
            };
        }

        // log_modulus now always holds the last modulus meeting the target.
        while log_modulus < MAX_LOG_MODULUS {
            match self.estimate(dimension, log_modulus + 1)? {
                SecurityEstimate::Bits(bits) if bits >= target => log_modulus += 1,
                SecurityEstimate::Bits(_) => break,
                SecurityEstimate::Unevaluable => {
                    info!(
                        "Estimator can't evaluate dimension {dimension} at {} bits",
                        log_modulus + 1
                    );
                    return Ok(None);
                }
            }
        }

        Ok(Some(SecureModulus {
            dimension,
            log_modulus,
        }))
    }
}
