use std::cell::{Cell, RefCell};

use crate::{
    BootstrappingTechnique, NoiseMeasurement, NoiseOracle, ParameterSet, PerformanceMetrics,
    Result, SIGMA, SecretDistribution, SecurityEstimate, SecurityOracle, SecurityQuery,
};

/// A [`SecurityOracle`] whose security is
/// `intercept + per_dimension * n - per_bit * log2(q)`, floored at 0.
///
/// Security grows with the dimension and shrinks with the modulus, as it
/// does for the real estimator.
pub struct LinearSecurityOracle {
    intercept: f64,
    per_dimension: f64,
    per_bit: f64,
    min_log_modulus: u32,
    calls: Cell<usize>,
}

impl LinearSecurityOracle {
    pub fn new(intercept: f64, per_dimension: f64, per_bit: f64) -> Self {
        Self {
            intercept,
            per_dimension,
            per_bit,
            min_log_modulus: 0,
            calls: Cell::new(0),
        }
    }

    /// Moduli shorter than `bits` are [`SecurityEstimate::Unevaluable`].
    pub fn unevaluable_below(self, bits: u32) -> Self {
        Self {
            min_log_modulus: bits,
            ..self
        }
    }

    pub fn bits(&self, dimension: usize, log_modulus: u32) -> u32 {
        let security = self.intercept + self.per_dimension * dimension as f64
            - self.per_bit * log_modulus as f64;

        security.max(0.0).floor() as u32
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl SecurityOracle for LinearSecurityOracle {
    fn estimate(&self, query: &SecurityQuery) -> Result<SecurityEstimate> {
        self.calls.set(self.calls.get() + 1);

        if query.log_modulus < self.min_log_modulus {
            return Ok(SecurityEstimate::Unevaluable);
        }

        Ok(SecurityEstimate::Bits(
            self.bits(query.dimension, query.log_modulus),
        ))
    }
}

/// A security oracle under which every dimension from 100 up has a secure
/// key switching modulus for 128-bit security.
pub fn lenient_security_oracle() -> LinearSecurityOracle {
    LinearSecurityOracle::new(200.0, 0.02, 4.0)
}

/// A deterministic [`NoiseOracle`] computing noise from the parameter set.
/// Records every measurement it's asked for.
pub struct CurveNoiseOracle<F> {
    curve: F,
    probes: RefCell<Vec<(usize, u32)>>,
}

impl<F: Fn(&ParameterSet) -> f64> CurveNoiseOracle<F> {
    pub fn new(curve: F) -> Self {
        Self {
            curve,
            probes: RefCell::new(vec![]),
        }
    }

    /// The `(lattice dimension, sample count)` of every measurement so far.
    pub fn probes(&self) -> Vec<(usize, u32)> {
        self.probes.borrow().clone()
    }

    pub fn probed_dimensions(&self) -> Vec<usize> {
        self.probes.borrow().iter().map(|(n, _)| *n).collect()
    }
}

impl<F: Fn(&ParameterSet) -> f64> NoiseOracle for CurveNoiseOracle<F> {
    fn measure(
        &self,
        params: &ParameterSet,
        sample_count: u32,
        _gate_inputs: u32,
    ) -> Result<NoiseMeasurement> {
        self.probes
            .borrow_mut()
            .push((params.lattice_dimension, sample_count));

        Ok(NoiseMeasurement {
            noise_std: (self.curve)(params),
            performance: PerformanceMetrics::default(),
        })
    }
}

/// A plausible starting parameter set for N = 1024, q = 2048.
pub fn seed_parameters() -> ParameterSet {
    ParameterSet {
        lattice_dimension: 100,
        ciphertext_modulus: 2048,
        ring_dimension: 1024,
        log_ring_modulus: 27,
        log_ks_modulus: 14,
        gadget_base: 1 << 14,
        ks_base: 32,
        refresh_base: 64,
        sigma: SIGMA,
        secret_distribution: SecretDistribution::Ternary,
        bootstrapping_technique: BootstrappingTechnique::Ginx,
    }
}
