use fhew_math::security::{failure_rate, target_noise};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    BootstrappingTechnique, DigitOutcome, FoundParameters, LatticeSearch, NoiseOracle,
    ParameterSet, Result, SIGMA, SearchBounds, SearchSettings, SecretDistribution,
    SecurityLevel, SecurityOptimizer, SecurityOracle, SweepReport, clamp_ks_log_modulus,
    gadget_base, ks_digit_base, refresh_base_for, warm_start_modulus_bits,
};

/// The smallest ring dimension the sweep considers.
const MIN_RING_DIMENSION: usize = 1024;

/// Ring moduli for `N <= 1024` are capped at this many bits.
const SMALL_RING_MAX_LOG_MODULUS: u32 = 28;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// What a [`ParameterSweep`] searches for.
pub struct SweepConfig {
    /// The blind rotation technique.
    pub bootstrapping_technique: BootstrappingTechnique,

    /// The secret key distribution.
    pub secret_distribution: SecretDistribution,

    /// The security level every LWE and RLWE instance must meet.
    pub security_level: SecurityLevel,

    /// The decryption failure rate must not exceed `2^failure_exponent`.
    pub failure_exponent: i32,

    /// The number of inputs of the evaluated gates. The plaintext modulus is
    /// twice this.
    pub gate_inputs: u32,

    /// Noise samples per search probe.
    pub sample_count: u32,

    /// Noise samples per probe while repairing a crossing, if different.
    pub repair_sample_count: Option<u32>,

    /// Noise samples for the final measurement of a found parameter set.
    pub final_sample_count: u32,

    /// The initial key switching digit count `d_ks`.
    pub ks_digits: u32,

    /// The smallest gadget digit count `d_g` searched.
    pub min_gadget_digits: u32,

    /// The largest gadget digit count `d_g` searched.
    pub max_gadget_digits: u32,

    /// Threads the security estimator may use.
    pub threads: usize,

    /// Only try `q = 2N`, skipping `q = N`.
    pub force_q_eq_2n: bool,

    /// The largest ring dimension `N` tried.
    pub max_ring_dimension: usize,

    /// The smallest lattice dimension searched.
    pub initial_lattice_dimension: usize,

    /// How far the smallest lattice dimension moves up while no key
    /// switching modulus is secure at it.
    pub lattice_dimension_step: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            bootstrapping_technique: BootstrappingTechnique::Ginx,
            secret_distribution: SecretDistribution::Ternary,
            security_level: SecurityLevel::Std128,
            failure_exponent: -40,
            gate_inputs: 2,
            sample_count: 200,
            repair_sample_count: None,
            final_sample_count: 1000,
            ks_digits: 3,
            min_gadget_digits: 2,
            max_gadget_digits: 4,
            threads: 1,
            force_q_eq_2n: true,
            max_ring_dimension: 2048,
            initial_lattice_dimension: 100,
            lattice_dimension_step: 25,
        }
    }
}

impl SweepConfig {
    /// The plaintext modulus `p`.
    pub fn plaintext_modulus(&self) -> u64 {
        2 * self.gate_inputs as u64
    }

    fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            ks_digits: self.ks_digits,
            gate_inputs: self.gate_inputs,
            sample_count: self.sample_count,
            repair_sample_count: self.repair_sample_count,
        }
    }
}

/// The secure moduli shared by every ciphertext modulus at a ring dimension.
struct RingSetup {
    ring_dimension: usize,
    lattice_dimension: usize,
    log_ring_modulus: u32,
    log_ks_modulus: u32,
}

/// Searches ring dimensions and ciphertext moduli for each gadget digit
/// count, keeping the first that admits parameters.
///
/// # Remarks
/// For each `d_g`, ring dimensions `N = 1024, 2048, ...` are tried in order,
/// each with `q = N` and then `q = 2N` (only `q = 2N` if
/// [`SweepConfig::force_q_eq_2n`]). The ring modulus is the largest secure one
/// for `N`, and a [`LatticeSearch`] over `[n0, N]` minimizes the lattice
/// dimension, where `n0` is the smallest dimension with a secure key
/// switching modulus.
///
/// Digit counts without parameters are reported as
/// [`DigitOutcome::Infeasible`]. Oracle failures abort the sweep.
pub struct ParameterSweep<'a, S, N> {
    config: &'a SweepConfig,
    security: &'a S,
    noise: &'a N,
}

impl<'a, S, N> ParameterSweep<'a, S, N>
where
    S: SecurityOracle,
    N: NoiseOracle,
{
    /// Creates a sweep for `config`.
    pub fn new(config: &'a SweepConfig, security: &'a S, noise: &'a N) -> Self {
        Self {
            config,
            security,
            noise,
        }
    }

    fn optimizer(&self) -> SecurityOptimizer<'a, S> {
        SecurityOptimizer::new(
            self.security,
            self.config.security_level,
            self.config.secret_distribution,
            self.config.threads,
        )
    }

    /// Runs the sweep.
    pub fn run(&self) -> Result<SweepReport> {
        let mut outcomes = vec![];

        for gadget_digits in self.config.min_gadget_digits..=self.config.max_gadget_digits {
            info!("Searching d_g = {gadget_digits}");

            let outcome = match self.search_gadget_digits(gadget_digits)? {
                Some(found) => DigitOutcome::Found(found),
                None => {
                    warn!("Cannot find parameters for d_g = {gadget_digits}");
                    DigitOutcome::Infeasible { gadget_digits }
                }
            };

            outcomes.push(outcome);
        }

        Ok(SweepReport {
            config: self.config.clone(),
            outcomes,
        })
    }

    fn search_gadget_digits(&self, gadget_digits: u32) -> Result<Option<FoundParameters>> {
        let mut ring_dimension = MIN_RING_DIMENSION;

        while ring_dimension <= self.config.max_ring_dimension {
            if let Some(ring) = self.ring_setup(ring_dimension)? {
                let moduli = if self.config.force_q_eq_2n {
                    vec![2 * ring_dimension as u64]
                } else {
                    vec![ring_dimension as u64, 2 * ring_dimension as u64]
                };

                for ciphertext_modulus in moduli {
                    info!("(q, N) = ({ciphertext_modulus}, {ring_dimension})");

                    let found = self.search_ring(&ring, gadget_digits, ciphertext_modulus)?;

                    if found.is_some() {
                        return Ok(found);
                    }
                }
            }

            ring_dimension *= 2;
        }

        Ok(None)
    }

    /// Finds the ring modulus for `ring_dimension` and the smallest lattice
    /// dimension with a secure key switching modulus.
    fn ring_setup(&self, ring_dimension: usize) -> Result<Option<RingSetup>> {
        let optimizer = self.optimizer();
        let level = self.config.security_level;

        let ring = optimizer.optimize(
            ring_dimension,
            warm_start_modulus_bits(ring_dimension, level),
        )?;

        let mut lattice_dimension = self.config.initial_lattice_dimension;

        let ks = loop {
            let ks = optimizer.optimize(
                lattice_dimension,
                warm_start_modulus_bits(lattice_dimension, level),
            )?;

            if ks.is_some() || lattice_dimension > ring_dimension {
                break ks;
            }

            info!(
                "Lattice dimension {lattice_dimension} too small for {level}, increasing"
            );

            lattice_dimension += self.config.lattice_dimension_step;
        };

        let (Some(ring), Some(ks)) = (ring, ks) else {
            info!("No secure moduli for N = {ring_dimension}");
            return Ok(None);
        };

        if lattice_dimension > ring_dimension {
            info!("Smallest secure lattice dimension exceeds N = {ring_dimension}");
            return Ok(None);
        }

        let log_ring_modulus = if ring_dimension <= MIN_RING_DIMENSION {
            ring.log_modulus.min(SMALL_RING_MAX_LOG_MODULUS)
        } else {
            ring.log_modulus
        };

        Ok(Some(RingSetup {
            ring_dimension,
            lattice_dimension,
            log_ring_modulus,
            log_ks_modulus: clamp_ks_log_modulus(ks.log_modulus, log_ring_modulus),
        }))
    }

    fn search_ring(
        &self,
        ring: &RingSetup,
        gadget_digits: u32,
        ciphertext_modulus: u64,
    ) -> Result<Option<FoundParameters>> {
        let config = self.config;
        let (ks_base, _) = ks_digit_base(ring.log_ks_modulus, config.ks_digits);

        let Some(gadget_base) = gadget_base(ring.log_ring_modulus, gadget_digits) else {
            warn!(
                "A {}-bit ring modulus needs more than {gadget_digits} 64-bit gadget digits, skipping N = {}",
                ring.log_ring_modulus, ring.ring_dimension
            );
            return Ok(None);
        };

        let seed = ParameterSet {
            lattice_dimension: ring.lattice_dimension,
            ciphertext_modulus,
            ring_dimension: ring.ring_dimension,
            log_ring_modulus: ring.log_ring_modulus,
            log_ks_modulus: ring.log_ks_modulus,
            gadget_base,
            ks_base,
            refresh_base: refresh_base_for(ciphertext_modulus),
            sigma: SIGMA,
            secret_distribution: config.secret_distribution,
            bootstrapping_technique: config.bootstrapping_technique,
        };

        let target = target_noise(
            config.failure_exponent as f64,
            config.plaintext_modulus(),
            ciphertext_modulus,
            config.gate_inputs,
        );

        info!("Target noise: {target:.3}");

        let search = LatticeSearch::new(self.optimizer(), self.noise, config.search_settings());

        let Some(params) = search.run(
            &seed,
            SearchBounds::new(ring.lattice_dimension, ring.ring_dimension),
            target,
        )?
        else {
            return Ok(None);
        };

        let measurement = self
            .noise
            .measure(&params, config.final_sample_count, config.gate_inputs)?;

        let achieved_failure_rate = failure_rate(
            measurement.noise_std,
            config.plaintext_modulus(),
            ciphertext_modulus,
            config.gate_inputs,
        );

        if achieved_failure_rate > config.failure_exponent as f64 {
            warn!(
                "Final measurement gives failure rate 2^{achieved_failure_rate:.2}, above the requested 2^{}",
                config.failure_exponent
            );
        }

        Ok(Some(FoundParameters {
            gadget_digits,
            ks_digits: params.ks_digits(),
            params,
            target_noise: target,
            final_noise: measurement.noise_std,
            achieved_failure_rate,
            performance: measurement.performance,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CurveNoiseOracle, LinearSecurityOracle, lenient_security_oracle};

    fn single_digit() -> SweepConfig {
        SweepConfig {
            min_gadget_digits: 3,
            max_gadget_digits: 3,
            ..SweepConfig::default()
        }
    }

    #[test]
    fn default_config_matches_cli_defaults() {
        let config = SweepConfig::default();

        assert_eq!(config.plaintext_modulus(), 4);
        assert_eq!(config.final_sample_count, 1000);
        assert!(config.force_q_eq_2n);
    }

    #[test]
    fn finds_parameters_at_smallest_ring() {
        let config = single_digit();
        let security = lenient_security_oracle();
        let noise = CurveNoiseOracle::new(|p| 9_000.0 / p.lattice_dimension as f64);

        let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();
        let found = report.found().next().unwrap();

        assert_eq!(found.gadget_digits, 3);
        assert_eq!(found.params.ring_dimension, 1024);
        assert_eq!(found.params.ciphertext_modulus, 2048);
        assert_eq!(found.params.refresh_base, 64);
        assert!(found.params.log_ring_modulus <= SMALL_RING_MAX_LOG_MODULUS);
        assert!(found.params.log_ks_modulus <= found.params.log_ring_modulus);
        assert_eq!(
            Some(found.params.gadget_base),
            gadget_base(found.params.log_ring_modulus, 3)
        );
        assert!(found.final_noise <= found.target_noise);
        assert!(found.achieved_failure_rate <= -40.0);

        // The final measurement uses the final sample count.
        assert_eq!(noise.probes().last().unwrap().1, 1000);
    }

    #[test]
    fn tries_q_eq_n_unless_forced() {
        let config = SweepConfig {
            force_q_eq_2n: false,
            ..single_digit()
        };
        let security = lenient_security_oracle();
        let noise = CurveNoiseOracle::new(|p| 9_000.0 / p.lattice_dimension as f64);

        let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();
        let found = report.found().next().unwrap();

        // q = N halves the decision margin but a large enough n still works.
        assert_eq!(found.params.ciphertext_modulus, 1024);
        assert_eq!(found.params.refresh_base, 32);
    }

    #[test]
    fn moves_to_larger_ring_when_small_one_fails() {
        let config = single_digit();
        let security = lenient_security_oracle();
        // Only n > 1024 is quiet enough.
        let noise = CurveNoiseOracle::new(|p| {
            if p.lattice_dimension > 1024 { 0.0 } else { 1e6 }
        });

        let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();
        let found = report.found().next().unwrap();

        assert_eq!(found.params.ring_dimension, 2048);
        assert_eq!(found.params.lattice_dimension, 1025);
    }

    #[test]
    fn insecure_ring_is_skipped() {
        let config = single_digit();
        // No key switching modulus meets 128 bits below n = 528, so the
        // smallest dimension moves up in steps of 25 from 100 to 550.
        let security = LinearSecurityOracle::new(0.0, 0.25, 4.0);
        let noise = CurveNoiseOracle::new(|_| 0.0);

        let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();
        let found = report.found().next().unwrap();

        assert_eq!(found.params.ring_dimension, 1024);
        assert_eq!(found.params.lattice_dimension, 550);
        assert!(noise.probed_dimensions().iter().all(|n| *n >= 550));
    }

    #[test]
    fn skips_ring_whose_gadget_base_overflows() {
        let config = SweepConfig {
            min_gadget_digits: 2,
            max_gadget_digits: 2,
            ..SweepConfig::default()
        };
        // N = 2048 gets a 128-bit ring modulus, so B_g would be 2^64.
        let security = LinearSecurityOracle::new(200.0, 0.05, 1.0);
        let noise = CurveNoiseOracle::new(|p| {
            if p.lattice_dimension > 1024 { 0.0 } else { 1e6 }
        });

        let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();

        assert_eq!(
            report.outcomes,
            vec![DigitOutcome::Infeasible { gadget_digits: 2 }]
        );
        assert_eq!(noise.probed_dimensions(), vec![1024]);
    }

    #[test]
    fn every_digit_count_infeasible_without_error() {
        let config = SweepConfig::default();
        let security = lenient_security_oracle();
        let noise = CurveNoiseOracle::new(|_| f64::MAX);

        let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();

        assert_eq!(
            report.outcomes,
            vec![
                DigitOutcome::Infeasible { gadget_digits: 2 },
                DigitOutcome::Infeasible { gadget_digits: 3 },
                DigitOutcome::Infeasible { gadget_digits: 4 },
            ]
        );

        // Each ring dimension gives up after a single early-exit probe.
        assert_eq!(noise.probed_dimensions(), vec![1024, 2048, 1024, 2048, 1024, 2048]);
    }
}
