use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    NoiseOracle, ParameterSet, Result, SecurityOptimizer, SecurityOracle, clamp_ks_log_modulus,
    ks_digit_base, warm_start_modulus_bits,
};

/// If the noise at the largest allowed dimension exceeds the target by more
/// than this, the search gives up without probing smaller dimensions.
pub const EARLY_EXIT_MARGIN: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// An inclusive range of lattice dimensions.
pub struct SearchBounds {
    /// The smallest dimension considered.
    pub start: usize,

    /// The largest dimension considered.
    pub end: usize,
}

impl SearchBounds {
    /// Creates the bounds `[start, end]`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    fn is_empty(&self) -> bool {
        self.start > self.end
    }

    fn midpoint(&self) -> usize {
        self.start + (self.end - self.start) / 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Settings shared by every probe of a [`LatticeSearch`].
pub struct SearchSettings {
    /// The initial key switching digit count for each probe.
    pub ks_digits: u32,

    /// The number of inputs of the measured gates.
    pub gate_inputs: u32,

    /// The number of noise samples per probe.
    pub sample_count: u32,

    /// The number of noise samples per probe while repairing a crossing. Uses
    /// `sample_count` when `None`.
    pub repair_sample_count: Option<u32>,
}

/// A measured candidate.
struct Probe {
    params: ParameterSet,
    noise_std: f64,
}

/// Finds the smallest lattice dimension whose parameter set meets a noise
/// target.
///
/// # Remarks
/// Every probed dimension gets its own key switching modulus: the largest
/// one meeting the security level at that dimension (capped by
/// [`clamp_ks_log_modulus`]), split into digits below
/// [`MAX_KS_BASE`](crate::MAX_KS_BASE). Dimensions for which no such modulus
/// exists are insecure and count as infinitely noisy without consulting
/// the noise oracle.
///
/// The search
/// 1. probes the upper bound first and gives up if its noise misses the
///    target by more than [`EARLY_EXIT_MARGIN`],
/// 2. bisects the bounds, and
/// 3. as soon as a probe misses the target right after a probe met it, bisects
///    again between the two ("repair"), because noise measurements aren't
///    monotone and a crossing may be spurious.
pub struct LatticeSearch<'a, S, N> {
    optimizer: SecurityOptimizer<'a, S>,
    noise: &'a N,
    settings: SearchSettings,
}

impl<'a, S, N> LatticeSearch<'a, S, N>
where
    S: SecurityOracle,
    N: NoiseOracle,
{
    /// Creates a search that secures key switching with `optimizer` and
    /// measures noise with `noise`.
    pub fn new(
        optimizer: SecurityOptimizer<'a, S>,
        noise: &'a N,
        settings: SearchSettings,
    ) -> Self {
        Self {
            optimizer,
            noise,
            settings,
        }
    }

    /// Returns `seed` with key switching configured for `dimension`, or
    /// `None` if no key switching modulus is secure at `dimension`.
    pub fn derive(&self, seed: &ParameterSet, dimension: usize) -> Result<Option<ParameterSet>> {
        let initial = warm_start_modulus_bits(dimension, self.optimizer.level());

        let Some(secure) = self.optimizer.optimize(dimension, initial)? else {
            return Ok(None);
        };

        let log_ks_modulus = clamp_ks_log_modulus(secure.log_modulus, seed.log_ring_modulus);
        let (ks_base, _) = ks_digit_base(log_ks_modulus, self.settings.ks_digits);

        Ok(Some(seed.with_key_switching(
            dimension,
            log_ks_modulus,
            ks_base,
        )))
    }

    fn probe(
        &self,
        seed: &ParameterSet,
        dimension: usize,
        sample_count: u32,
    ) -> Result<Option<Probe>> {
        let Some(params) = self.derive(seed, dimension)? else {
            info!("n = {dimension}: no secure key switching modulus");
            return Ok(None);
        };

        let measurement = self
            .noise
            .measure(&params, sample_count, self.settings.gate_inputs)?;

        info!(
            "n = {dimension}, Qks = 2^{}, B_ks = {}: noise {:.3}",
            params.log_ks_modulus, params.ks_base, measurement.noise_std
        );

        if let Some(time) = &measurement.performance.eval_bin_gate_time {
            debug!("EvalBinGate time: {time}");
        }

        Ok(Some(Probe {
            params,
            noise_std: measurement.noise_std,
        }))
    }

    /// Returns the smallest dimension in `bounds` found to meet
    /// `target_noise`, as a full parameter set derived from `seed`. Returns
    /// `None` if no dimension does.
    pub fn run(
        &self,
        seed: &ParameterSet,
        bounds: SearchBounds,
        target_noise: f64,
    ) -> Result<Option<ParameterSet>> {
        let mut bounds = bounds;

        if bounds.is_empty() {
            return Ok(None);
        }

        let seed_probe = self.probe(seed, bounds.end, self.settings.sample_count)?;
        let seed_noise = seed_probe.as_ref().map_or(f64::INFINITY, |p| p.noise_std);

        if seed_noise - target_noise > EARLY_EXIT_MARGIN {
            info!(
                "n = {} misses target noise {target_noise:.3} by more than {EARLY_EXIT_MARGIN}, giving up",
                bounds.end
            );
            return Ok(None);
        }

        // Once set, best is also the previous probe: any miss after a hit
        // ends the main search.
        let mut best = seed_probe
            .filter(|p| p.noise_std <= target_noise)
            .map(|p| p.params);

        if best.is_some() {
            if bounds.end == bounds.start {
                return Ok(best);
            }

            bounds.end -= 1;
        }

        while !bounds.is_empty() {
            let m = bounds.midpoint();

            match self
                .probe(seed, m, self.settings.sample_count)?
                .filter(|p| p.noise_std <= target_noise)
            {
                Some(hit) => {
                    best = Some(hit.params);

                    if m == bounds.start {
                        break;
                    }

                    bounds.end = m - 1;
                }
                None => {
                    if let Some(good) = best {
                        debug!(
                            "Noise crossed the target between n = {m} and n = {}",
                            good.lattice_dimension
                        );

                        return self.repair(
                            seed,
                            SearchBounds::new(m, good.lattice_dimension - 1),
                            good,
                            target_noise,
                        );
                    }

                    bounds.start = m + 1;
                }
            }
        }

        Ok(best)
    }

    /// Bisects `bounds` for a dimension meeting `target_noise`, falling back
    /// to `known_good`.
    fn repair(
        &self,
        seed: &ParameterSet,
        bounds: SearchBounds,
        known_good: ParameterSet,
        target_noise: f64,
    ) -> Result<Option<ParameterSet>> {
        let sample_count = self
            .settings
            .repair_sample_count
            .unwrap_or(self.settings.sample_count);

        let mut bounds = bounds;
        let mut best = known_good;

        while !bounds.is_empty() {
            let m = bounds.midpoint();

            match self
                .probe(seed, m, sample_count)?
                .filter(|p| p.noise_std <= target_noise)
            {
                Some(hit) => {
                    best = hit.params;

                    if m == bounds.start {
                        break;
                    }

                    bounds.end = m - 1;
                }
                None => bounds.start = m + 1,
            }
        }

        info!("Smallest dimension after repair: n = {}", best.lattice_dimension);

        Ok(Some(best))
    }
}
