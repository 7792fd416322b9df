use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fhew_params::{
    BinFheNoiseOracle, BootstrappingTechnique, Error, LatticeEstimator, ParameterSet, Result,
    SecretDistribution, SecurityLevel, SweepConfig,
};

#[derive(Debug, Parser)]
#[command(version, about = "Searches for and validates FHEW boolean parameter sets", long_about = None)]
pub struct FhewParams {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find the smallest lattice dimension meeting a security level and a
    /// decryption failure rate for each gadget digit count.
    Search(SearchCommand),

    /// Measure the noise and decryption failure rate of a given parameter set.
    Validate(ValidateCommand),
}

#[derive(Debug, Args)]
pub struct OracleArgs {
    #[arg(default_value = "python3", long)]
    /// The program running the lattice-estimator helper.
    pub estimator: PathBuf,

    #[arg(default_value = "scripts/lwe_estimate.py", long)]
    /// The lattice-estimator helper script. Pass an empty string if
    /// `--estimator` is the helper itself.
    pub estimator_script: String,

    #[arg(default_value = "scripts/run_script.sh", long)]
    /// The program measuring boolean gate noise.
    pub runner: PathBuf,

    #[arg(default_value = "build", long)]
    /// The build directory of the boolean FHE library, passed to the runner.
    pub build_dir: PathBuf,

    #[arg(default_value = ".", long)]
    /// Where the runner's output files are kept while it runs.
    pub scratch_dir: PathBuf,
}

impl OracleArgs {
    pub fn security_oracle(&self) -> LatticeEstimator {
        let script = Some(self.estimator_script.clone()).filter(|s| !s.is_empty());

        LatticeEstimator::new(&self.estimator).with_args(script)
    }

    pub fn noise_oracle(&self) -> BinFheNoiseOracle {
        BinFheNoiseOracle::new(&self.runner, &self.build_dir, &self.scratch_dir)
    }
}

#[derive(Debug, Args)]
pub struct SearchCommand {
    #[arg(short = 't', long, value_enum, default_value_t = BootstrappingTechnique::Ginx)]
    /// The blind rotation technique.
    pub bootstrapping_technique: BootstrappingTechnique,

    #[arg(short = 'd', long, value_enum)]
    /// The secret key distribution. Defaults to error for LMKCDEY and
    /// ternary otherwise.
    pub secret_distribution: Option<SecretDistribution>,

    #[arg(short = 'p', long, value_enum, default_value_t = SecurityLevel::Std128)]
    /// The security level.
    pub security_level: SecurityLevel,

    #[arg(short = 'f', long, default_value_t = -40, allow_negative_numbers = true)]
    /// The decryption failure rate may not exceed 2^failure_exponent.
    pub failure_exponent: i32,

    #[arg(short = 'I', long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(2..=4))]
    /// The number of inputs of the evaluated gates.
    pub gate_inputs: u32,

    #[arg(short = 'i', long, default_value_t = 200)]
    /// The number of noise samples per search probe.
    pub sample_count: u32,

    #[arg(long)]
    /// The number of noise samples per probe when bisecting around a crossing.
    /// Defaults to --sample-count.
    pub repair_sample_count: Option<u32>,

    #[arg(long, default_value_t = 1000)]
    /// The number of noise samples measured for each parameter set found.
    pub final_sample_count: u32,

    #[arg(short = 'k', long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(2..=4))]
    /// The initial key switching digit count.
    pub ks_digits: u32,

    #[arg(short = 'l', long, default_value_t = 2)]
    /// The smallest gadget digit count searched.
    pub min_gadget_digits: u32,

    #[arg(short = 'u', long, default_value_t = 4)]
    /// The largest gadget digit count searched.
    pub max_gadget_digits: u32,

    #[arg(short = 'n', long, default_value_t = 1)]
    /// The number of threads the security estimator may use.
    pub threads: usize,

    #[arg(long, default_value_t = false)]
    /// Also try q = N before q = 2N.
    pub allow_q_eq_n: bool,

    #[arg(long, default_value_t = 2048)]
    /// The largest ring dimension tried.
    pub max_ring_dimension: usize,

    #[arg(short = 'a', long, default_value_t = false)]
    /// Search every security level and gate input count for the chosen
    /// technique.
    pub all: bool,

    #[arg(short = 'o', long)]
    /// Write the reports to this file as JSON.
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub oracles: OracleArgs,
}

impl SearchCommand {
    pub fn check(&self) -> Result<()> {
        if self.min_gadget_digits == 0 || self.min_gadget_digits > self.max_gadget_digits {
            return Err(Error::InvalidParameter(format!(
                "gadget digit range [{}, {}] is empty",
                self.min_gadget_digits, self.max_gadget_digits
            )));
        }

        if self.sample_count < 2 || self.final_sample_count < 2 {
            return Err(Error::InvalidParameter(
                "at least 2 noise samples are needed".to_owned(),
            ));
        }

        Ok(())
    }

    /// The sweep described by the command line.
    pub fn config(&self) -> SweepConfig {
        SweepConfig {
            bootstrapping_technique: self.bootstrapping_technique,
            secret_distribution: self
                .secret_distribution
                .unwrap_or(self.bootstrapping_technique.default_secret_distribution()),
            security_level: self.security_level,
            failure_exponent: self.failure_exponent,
            gate_inputs: self.gate_inputs,
            sample_count: self.sample_count,
            repair_sample_count: self.repair_sample_count,
            final_sample_count: self.final_sample_count,
            ks_digits: self.ks_digits,
            min_gadget_digits: self.min_gadget_digits,
            max_gadget_digits: self.max_gadget_digits,
            threads: self.threads,
            force_q_eq_2n: !self.allow_q_eq_n,
            max_ring_dimension: self.max_ring_dimension,
            ..SweepConfig::default()
        }
    }

    /// Every security level and gate input count for the chosen technique.
    pub fn all_configs(&self) -> Vec<SweepConfig> {
        let base = SweepConfig {
            secret_distribution: self.bootstrapping_technique.default_secret_distribution(),
            ..self.config()
        };

        SecurityLevel::all()
            .iter()
            .flat_map(|&security_level| {
                let base = &base;

                (2..=4).map(move |gate_inputs| SweepConfig {
                    security_level,
                    gate_inputs,
                    ..base.clone()
                })
            })
            .collect()
    }
}

#[derive(Debug, Args)]
pub struct ValidateCommand {
    #[arg(short = 'n', long)]
    /// The lattice dimension n.
    pub lattice_dimension: usize,

    #[arg(short = 'N', long)]
    /// The ring dimension N.
    pub ring_dimension: usize,

    #[arg(short = 'q', long)]
    /// The ciphertext modulus q.
    pub ciphertext_modulus: u64,

    #[arg(short = 'Q', long)]
    /// The bit length of the ring modulus Q.
    pub log_ring_modulus: u32,

    #[arg(short = 'k', long)]
    /// The key switching modulus Qks.
    pub ks_modulus: u64,

    #[arg(short = 'g', long)]
    /// The gadget digit base B_g.
    pub gadget_base: u64,

    #[arg(short = 'r', long)]
    /// The refreshing key digit base B_rk.
    pub refresh_base: u32,

    #[arg(short = 'b', long)]
    /// The key switching digit base B_ks.
    pub ks_base: u32,

    #[arg(short = 's', long, default_value_t = fhew_params::SIGMA)]
    /// The error standard deviation.
    pub sigma: f64,

    #[arg(short = 't', long, value_enum, default_value_t = BootstrappingTechnique::Ginx)]
    /// The blind rotation technique.
    pub bootstrapping_technique: BootstrappingTechnique,

    #[arg(short = 'd', long, value_enum, default_value_t = SecretDistribution::Ternary)]
    /// The secret key distribution.
    pub secret_distribution: SecretDistribution,

    #[arg(short = 'I', long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(2..=4))]
    /// The number of inputs of the evaluated gates.
    pub gate_inputs: u32,

    #[arg(short = 'i', long, default_value_t = 1000)]
    /// The number of noise samples.
    pub sample_count: u32,

    #[command(flatten)]
    pub oracles: OracleArgs,
}

impl ValidateCommand {
    /// The parameter set described by the command line.
    pub fn parameter_set(&self) -> Result<ParameterSet> {
        if !self.ks_modulus.is_power_of_two() {
            return Err(Error::InvalidParameter(format!(
                "key switching modulus {} is not a power of two",
                self.ks_modulus
            )));
        }

        if self.ks_base == 0 || self.ks_base >= fhew_params::MAX_KS_BASE {
            return Err(Error::InvalidParameter(format!(
                "key switching base {} must be in [1, {})",
                self.ks_base,
                fhew_params::MAX_KS_BASE
            )));
        }

        Ok(ParameterSet {
            lattice_dimension: self.lattice_dimension,
            ciphertext_modulus: self.ciphertext_modulus,
            ring_dimension: self.ring_dimension,
            log_ring_modulus: self.log_ring_modulus,
            log_ks_modulus: self.ks_modulus.trailing_zeros(),
            gadget_base: self.gadget_base,
            ks_base: self.ks_base,
            refresh_base: self.refresh_base,
            sigma: self.sigma,
            secret_distribution: self.secret_distribution,
            bootstrapping_technique: self.bootstrapping_technique,
        })
    }
}
