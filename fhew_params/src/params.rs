use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The standard deviation of the Gaussian error used by every parameter set.
pub const SIGMA: f64 = 3.19;

/// Key switching digit bases must stay strictly below this value.
pub const MAX_KS_BASE: u32 = 128;

/// The key switching modulus is stored in a 32-bit word by the target
/// library, so its bit length never exceeds this value.
pub const MAX_KS_LOG_MODULUS: u32 = 30;

/// The number of automorphism keys listed in parameter table entries.
pub const NUM_AUTO_KEYS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
/// A standard security level.
pub enum SecurityLevel {
    /// 128-bit security against classical attacks.
    #[value(name = "STD128")]
    Std128,

    /// 128-bit security against quantum attacks.
    #[value(name = "STD128Q")]
    Std128Q,

    /// 192-bit security against classical attacks.
    #[value(name = "STD192")]
    Std192,

    /// 192-bit security against quantum attacks.
    #[value(name = "STD192Q")]
    Std192Q,

    /// 256-bit security against classical attacks.
    #[value(name = "STD256")]
    Std256,

    /// 256-bit security against quantum attacks.
    #[value(name = "STD256Q")]
    Std256Q,
}

impl SecurityLevel {
    /// The minimum acceptable bit-security.
    pub fn bits(&self) -> u32 {
        match self {
            Self::Std128 | Self::Std128Q => 128,
            Self::Std192 | Self::Std192Q => 192,
            Self::Std256 | Self::Std256Q => 256,
        }
    }

    /// The lattice reduction cost model used to evaluate this level.
    pub fn cost_model(&self) -> CostModel {
        match self {
            Self::Std128 | Self::Std192 | Self::Std256 => CostModel::Classical,
            Self::Std128Q | Self::Std192Q | Self::Std256Q => CostModel::Quantum,
        }
    }

    /// Every standard level, weakest first.
    pub fn all() -> &'static [Self] {
        Self::value_variants()
    }
}

impl Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Std128 => "STD128",
            Self::Std128Q => "STD128Q",
            Self::Std192 => "STD192",
            Self::Std192Q => "STD192Q",
            Self::Std256 => "STD256",
            Self::Std256Q => "STD256Q",
        };

        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// The cost of lattice reduction assumed by the security estimator.
pub enum CostModel {
    /// Classical sieving cost.
    Classical,

    /// Quantum-accelerated sieving cost.
    Quantum,
}

impl CostModel {
    /// The name passed to the security estimator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classical => "classical",
            Self::Quantum => "quantum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
/// The distribution secret keys are drawn from.
pub enum SecretDistribution {
    /// The secret has the same discrete Gaussian distribution as the error.
    #[value(name = "error", alias = "0")]
    Error,

    /// The secret is uniform over `{-1, 0, 1}`.
    #[value(name = "ternary", alias = "1")]
    Ternary,
}

impl SecretDistribution {
    /// The numeric code understood by the noise runner.
    pub fn code(&self) -> u32 {
        match self {
            Self::Error => 0,
            Self::Ternary => 1,
        }
    }

    /// The name used by the security estimator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Ternary => "ternary",
        }
    }

    /// The name used in the target library's parameter tables.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Error => "GAUSSIAN",
            Self::Ternary => "UNIFORM_TERNARY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
/// The blind rotation technique used during gate bootstrapping.
pub enum BootstrappingTechnique {
    /// Alperin-Sheriff and Peikert.
    #[value(name = "AP", alias = "1")]
    Ap,

    /// Gama, Izabachene, Nguyen and Xie.
    #[value(name = "GINX", alias = "2")]
    Ginx,

    /// Lee, Micciancio, Kim, Choi, Deryabin, Eom and Yoo.
    #[value(name = "LMKCDEY", alias = "3")]
    Lmkcdey,
}

impl BootstrappingTechnique {
    /// The numeric code understood by the noise runner.
    pub fn code(&self) -> u32 {
        match self {
            Self::Ap => 1,
            Self::Ginx => 2,
            Self::Lmkcdey => 3,
        }
    }

    /// LMKCDEY requires Gaussian secrets, everything else uses ternary ones.
    pub fn default_secret_distribution(&self) -> SecretDistribution {
        match self {
            Self::Lmkcdey => SecretDistribution::Error,
            _ => SecretDistribution::Ternary,
        }
    }
}

impl Display for BootstrappingTechnique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ap => "AP",
            Self::Ginx => "GINX",
            Self::Lmkcdey => "LMKCDEY",
        };

        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A complete FHEW boolean parameter set.
///
/// # Remarks
/// Parameter sets are values. Searches derive new sets with
/// [`ParameterSet::with_key_switching`] rather than modifying one in place.
///
/// All of the key switching modulus, gadget base and key switching base are
/// powers of two, and `0 < ks_base < 128` and
/// `log_ks_modulus <= log_ring_modulus` always hold for sets produced by a
/// search.
pub struct ParameterSet {
    /// The LWE lattice dimension `n`.
    pub lattice_dimension: usize,

    /// The LWE ciphertext modulus `q`.
    pub ciphertext_modulus: u64,

    /// The RLWE ring dimension `N`.
    pub ring_dimension: usize,

    /// The bit length of the RLWE ring modulus `Q`.
    pub log_ring_modulus: u32,

    /// The bit length of the key switching modulus `Qks`.
    pub log_ks_modulus: u32,

    /// The gadget decomposition base `B_g`.
    pub gadget_base: u64,

    /// The key switching digit base `B_ks`.
    pub ks_base: u32,

    /// The refreshing key digit base `B_rk`.
    pub refresh_base: u32,

    /// The error standard deviation.
    pub sigma: f64,

    /// The secret key distribution.
    pub secret_distribution: SecretDistribution,

    /// The blind rotation technique.
    pub bootstrapping_technique: BootstrappingTechnique,
}

impl ParameterSet {
    /// The key switching modulus `Qks`.
    pub fn ks_modulus(&self) -> u64 {
        1u64 << self.log_ks_modulus
    }

    /// The number of key switching digits implied by `Qks` and `B_ks`.
    pub fn ks_digits(&self) -> u32 {
        let base_log = self.ks_base.trailing_zeros().max(1);

        self.log_ks_modulus.div_ceil(base_log)
    }

    /// Returns a copy of this set with a new lattice dimension and key
    /// switching modulus and base.
    pub fn with_key_switching(self, lattice_dimension: usize, log_ks_modulus: u32, ks_base: u32) -> Self {
        Self {
            lattice_dimension,
            log_ks_modulus,
            ks_base,
            ..self
        }
    }

    /// Renders the set as an entry of the target library's parameter table.
    pub fn table_entry(&self) -> String {
        format!(
            "{{ {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {} }}",
            self.log_ring_modulus,
            2 * self.ring_dimension,
            self.lattice_dimension,
            self.ciphertext_modulus,
            self.ks_modulus(),
            self.sigma,
            self.ks_base,
            self.gadget_base,
            self.refresh_base,
            NUM_AUTO_KEYS,
            self.secret_distribution.table_name()
        )
    }

    /// Renders the arguments that re-measure this set with `fhew_params validate`.
    pub fn command_args(&self, gate_inputs: u32, sample_count: u32) -> String {
        format!(
            "-n {} -N {} -q {} -Q {} -k {} -g {} -r {} -b {} -s {} -t {} -d {} -I {} -i {}",
            self.lattice_dimension,
            self.ring_dimension,
            self.ciphertext_modulus,
            self.log_ring_modulus,
            self.ks_modulus(),
            self.gadget_base,
            self.refresh_base,
            self.ks_base,
            self.sigma,
            self.bootstrapping_technique.code(),
            self.secret_distribution.code(),
            gate_inputs,
            sample_count
        )
    }
}

impl Display for ParameterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "lattice dimension n: {}", self.lattice_dimension)?;
        writeln!(f, "ring dimension N: {}", self.ring_dimension)?;
        writeln!(f, "lattice modulus q: {}", self.ciphertext_modulus)?;
        writeln!(f, "size of ring modulus Q: {}", self.log_ring_modulus)?;
        writeln!(f, "key switching modulus Qks: {}", self.ks_modulus())?;
        writeln!(f, "gadget digit base B_g: {}", self.gadget_base)?;
        writeln!(f, "key switching digit base B_ks: {}", self.ks_base)?;
        writeln!(f, "key switching digit count d_ks: {}", self.ks_digits())?;
        writeln!(f, "refreshing key base B_rk: {}", self.refresh_base)?;
        writeln!(f, "sigma: {}", self.sigma)?;
        writeln!(f, "secret distribution: {}", self.secret_distribution.as_str())?;
        write!(f, "bootstrapping technique: {}", self.bootstrapping_technique)
    }
}

/// The refreshing key base used for a given ciphertext modulus.
pub fn refresh_base_for(ciphertext_modulus: u64) -> u32 {
    if ciphertext_modulus == 1024 { 32 } else { 64 }
}

/// The gadget base decomposing a `log_ring_modulus`-bit modulus into
/// `gadget_digits` digits, or `None` if the base doesn't fit in a `u64`.
pub fn gadget_base(log_ring_modulus: u32, gadget_digits: u32) -> Option<u64> {
    1u64.checked_shl(log_ring_modulus.div_ceil(gadget_digits.max(1)))
}

/// Returns the key switching base and digit count for a `log_ks_modulus`-bit
/// modulus, starting from `ks_digits` digits and adding digits until the base
/// drops below [`MAX_KS_BASE`].
pub fn ks_digit_base(log_ks_modulus: u32, ks_digits: u32) -> (u32, u32) {
    let mut digits = ks_digits.max(1);

    loop {
        let base = 1u32 << log_ks_modulus.div_ceil(digits).min(31);

        if base < MAX_KS_BASE {
            return (base, digits);
        }

        digits += 1;
    }
}

/// Caps a key switching modulus bit length at [`MAX_KS_LOG_MODULUS`] and the
/// ring modulus bit length.
pub fn clamp_ks_log_modulus(log_ks_modulus: u32, log_ring_modulus: u32) -> u32 {
    log_ks_modulus.min(MAX_KS_LOG_MODULUS).min(log_ring_modulus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ParameterSet {
        ParameterSet {
            lattice_dimension: 518,
            ciphertext_modulus: 2048,
            ring_dimension: 2048,
            log_ring_modulus: 54,
            log_ks_modulus: 14,
            gadget_base: 1 << 27,
            ks_base: 32,
            refresh_base: 32,
            sigma: SIGMA,
            secret_distribution: SecretDistribution::Ternary,
            bootstrapping_technique: BootstrappingTechnique::Ap,
        }
    }

    #[test]
    fn ks_base_stays_below_limit() {
        assert_eq!(ks_digit_base(14, 3), (32, 3));
        assert_eq!(ks_digit_base(21, 3), (1 << 6, 4));
        assert_eq!(ks_digit_base(30, 2), (1 << 6, 5));

        for log_ks_modulus in 0..=MAX_KS_LOG_MODULUS {
            for ks_digits in 1..=4 {
                let (base, digits) = ks_digit_base(log_ks_modulus, ks_digits);

                assert!(base > 0 && base < MAX_KS_BASE);
                assert!(digits >= ks_digits);
                assert!(base.is_power_of_two());
            }
        }
    }

    #[test]
    fn gadget_base_covers_ring_modulus() {
        assert_eq!(gadget_base(27, 3), Some(1 << 9));
        assert_eq!(gadget_base(28, 3), Some(1 << 10));
        assert_eq!(gadget_base(54, 2), Some(1 << 27));
    }

    #[test]
    fn gadget_base_must_fit_in_u64() {
        assert_eq!(gadget_base(126, 2), Some(1 << 63));
        assert_eq!(gadget_base(128, 2), None);
        assert_eq!(gadget_base(64, 1), None);
    }

    #[test]
    fn ks_modulus_is_clamped() {
        assert_eq!(clamp_ks_log_modulus(35, 54), MAX_KS_LOG_MODULUS);
        assert_eq!(clamp_ks_log_modulus(25, 22), 22);
        assert_eq!(clamp_ks_log_modulus(14, 27), 14);
    }

    #[test]
    fn refresh_base_depends_on_modulus() {
        assert_eq!(refresh_base_for(1024), 32);
        assert_eq!(refresh_base_for(2048), 64);
    }

    #[test]
    fn with_key_switching_leaves_other_fields() {
        let derived = params().with_key_switching(600, 16, 64);

        assert_eq!(derived.lattice_dimension, 600);
        assert_eq!(derived.ks_modulus(), 1 << 16);
        assert_eq!(derived.ks_base, 64);
        assert_eq!(derived.gadget_base, params().gadget_base);
        assert_eq!(derived.ring_dimension, params().ring_dimension);
    }

    #[test]
    fn ks_digits_rounds_up() {
        assert_eq!(params().ks_digits(), 3);
        assert_eq!(params().with_key_switching(518, 16, 64).ks_digits(), 3);
    }

    #[test]
    fn table_entry_matches_library_layout() {
        assert_eq!(
            params().table_entry(),
            "{ 54, 4096, 518, 2048, 16384, 3.19, 32, 134217728, 32, 10, UNIFORM_TERNARY }"
        );
    }

    #[test]
    fn command_args_roundtrip_through_validate() {
        assert_eq!(
            params().command_args(2, 200),
            "-n 518 -N 2048 -q 2048 -Q 54 -k 16384 -g 134217728 -r 32 -b 32 -s 3.19 -t 1 -d 1 -I 2 -i 200"
        );
    }

    #[test]
    fn security_levels() {
        assert_eq!(SecurityLevel::Std192Q.bits(), 192);
        assert_eq!(SecurityLevel::Std192Q.cost_model(), CostModel::Quantum);
        assert_eq!(SecurityLevel::Std256.cost_model(), CostModel::Classical);
        assert_eq!(SecurityLevel::all().len(), 6);
        assert_eq!(SecurityLevel::Std128Q.to_string(), "STD128Q");
    }

    #[test]
    fn lmkcdey_uses_gaussian_secrets() {
        assert_eq!(
            BootstrappingTechnique::Lmkcdey.default_secret_distribution(),
            SecretDistribution::Error
        );
        assert_eq!(
            BootstrappingTechnique::Ginx.default_secret_distribution(),
            SecretDistribution::Ternary
        );
    }
}
