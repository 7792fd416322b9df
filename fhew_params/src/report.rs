use std::{fmt::Display, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ParameterSet, PerformanceMetrics, Result, SweepConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// The parameters found for one gadget digit count.
pub struct FoundParameters {
    /// The gadget decomposition digit count `d_g`.
    pub gadget_digits: u32,

    /// The parameter set with the smallest lattice dimension found.
    pub params: ParameterSet,

    /// The key switching digit count `d_ks` implied by `Qks` and `B_ks`.
    pub ks_digits: u32,

    /// The noise standard deviation the search aimed for.
    pub target_noise: f64,

    /// The noise standard deviation of the final measurement.
    pub final_noise: f64,

    /// `log2` of the decryption failure rate implied by `final_noise`.
    pub achieved_failure_rate: f64,

    /// Key sizes and timings of the final measurement.
    pub performance: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// The result of searching one gadget digit count.
pub enum DigitOutcome {
    /// A parameter set was found.
    Found(FoundParameters),

    /// No ring dimension and ciphertext modulus admit parameters.
    Infeasible {
        /// The gadget decomposition digit count `d_g`.
        gadget_digits: u32,
    },
}

impl DigitOutcome {
    /// The gadget decomposition digit count this outcome is for.
    pub fn gadget_digits(&self) -> u32 {
        match self {
            Self::Found(found) => found.gadget_digits,
            Self::Infeasible { gadget_digits } => *gadget_digits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Everything a [`ParameterSweep`](crate::ParameterSweep) produced.
pub struct SweepReport {
    /// The configuration that was searched.
    pub config: SweepConfig,

    /// One outcome per gadget digit count, in increasing order.
    pub outcomes: Vec<DigitOutcome>,
}

impl SweepReport {
    /// The parameter sets that were found.
    pub fn found(&self) -> impl Iterator<Item = &FoundParameters> {
        self.outcomes.iter().filter_map(|o| match o {
            DigitOutcome::Found(found) => Some(found),
            DigitOutcome::Infeasible { .. } => None,
        })
    }

    /// Writes the report to `path` as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;

        Ok(())
    }
}

impl Display for SweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let config = &self.config;

        for outcome in &self.outcomes {
            let found = match outcome {
                DigitOutcome::Found(found) => found,
                DigitOutcome::Infeasible { gadget_digits } => {
                    writeln!(f, "cannot find parameters for d_g = {gadget_digits}")?;
                    continue;
                }
            };

            writeln!(f, "final parameters for d_g = {}", found.gadget_digits)?;
            writeln!(f, "security level: {}", config.security_level)?;
            writeln!(
                f,
                "expected decryption failure rate: 2^{}",
                config.failure_exponent
            )?;
            writeln!(
                f,
                "actual decryption failure rate: 2^{:.2}",
                found.achieved_failure_rate
            )?;
            writeln!(f, "gate inputs: {}", config.gate_inputs)?;
            writeln!(f, "{}", found.params)?;

            for (name, metric) in found.performance.entries() {
                writeln!(f, "{name}: {metric}")?;
            }

            writeln!(
                f,
                "command args: {}",
                found
                    .params
                    .command_args(config.gate_inputs, config.final_sample_count)
            )?;
            writeln!(f, "table entry: {}", found.params.table_entry())?;
        }

        Ok(())
    }
}
