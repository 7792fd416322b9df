#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
//! This crate searches for cost-minimal parameters for FHEW-style boolean
//! gate bootstrapping.
//!
//! A parameter set must satisfy two constraints at once:
//! * every LWE/RLWE instance it defines must meet a target bit-security level
//!   according to a lattice security estimator, and
//! * the noise left after evaluating a boolean gate must be small enough that
//!   decryption fails with probability below a target (e.g. `2^-40`).
//!
//! Both constraints are checked with expensive external oracles: a
//! [`SecurityOracle`] (typically the lattice-estimator) and a [`NoiseOracle`]
//! (typically a binary running the boolean FHE library). The
//! [`ParameterSweep`] drives both, minimizing the LWE lattice dimension for
//! each gadget decomposition digit count.
//!
//! # Example
//!
//! ```rust
//! use fhew_params::{
//!     DigitOutcome, ParameterSweep, SweepConfig,
//!     test_utils::{CurveNoiseOracle, lenient_security_oracle},
//! };
//!
//! let security = lenient_security_oracle();
//!
//! // A noise oracle whose noise shrinks as the lattice dimension grows.
//! let noise = CurveNoiseOracle::new(|p| 12_000.0 / p.lattice_dimension as f64);
//!
//! let config = SweepConfig {
//!     min_gadget_digits: 2,
//!     max_gadget_digits: 2,
//!     ..SweepConfig::default()
//! };
//!
//! let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();
//!
//! assert!(matches!(report.outcomes[0], DigitOutcome::Found(_)));
//! ```
mod error;
pub use error::*;

mod noise;
mod params;
mod report;
mod search;
mod security;
mod sweep;
mod warm_start;

#[doc(hidden)]
pub mod test_utils;

pub use noise::{
    BinFheNoiseOracle, Metric, NoiseMeasurement, NoiseOracle, PerformanceMetrics, ScratchFiles,
    parse_noise_samples,
};
pub use params::*;
pub use report::{DigitOutcome, FoundParameters, SweepReport};
pub use search::{EARLY_EXIT_MARGIN, LatticeSearch, SearchBounds, SearchSettings};
pub use security::{
    LatticeEstimator, MAX_LOG_MODULUS, SecureModulus, SecurityEstimate, SecurityOptimizer,
    SecurityOracle, SecurityQuery, UNEVALUABLE_EXIT_CODE,
};
pub use sweep::{ParameterSweep, SweepConfig};
pub use warm_start::warm_start_modulus_bits;
