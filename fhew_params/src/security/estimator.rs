use std::{path::PathBuf, process::Command};

use log::{debug, error};

use crate::{Error, Result, SecurityEstimate, SecurityOracle, SecurityQuery};

/// The attacks whose costs the estimator must report. Security is the
/// cheapest of them.
const ATTACKS: [&str; 3] = ["usvp", "dual", "bdd"];

/// The exit status with which the helper reports that the estimator rejected
/// the instance itself.
pub const UNEVALUABLE_EXIT_CODE: i32 = 3;

/// A [`SecurityOracle`] that runs the lattice-estimator through a helper
/// program (by default `python3 scripts/lwe_estimate.py`).
///
/// # Remarks
/// The program receives `--n <dim> --log-q <bits> --secret <error|ternary>
/// --threads <t> --cost-model <classical|quantum>` and must print one
/// `<attack>: <log2 cost>` line for each of `usvp`, `dual` and `bdd`. Its
/// output is captured, so the estimator's own chatter never reaches the
/// console.
///
/// Exiting with [`UNEVALUABLE_EXIT_CODE`] or omitting attack costs means the
/// instance is [`SecurityEstimate::Unevaluable`]. Any other unsuccessful exit
/// (e.g. the estimator isn't installed) is an [`Error::OracleFailed`].
pub struct LatticeEstimator {
    program: PathBuf,
    args: Vec<String>,
}

impl LatticeEstimator {
    /// Creates an estimator that runs `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    /// Arguments passed to the program before the instance description
    /// (e.g. the path of the helper script).
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl SecurityOracle for LatticeEstimator {
    fn estimate(&self, query: &SecurityQuery) -> Result<SecurityEstimate> {
        let mut command = Command::new(&self.program);

        command
            .args(&self.args)
            .arg("--n")
            .arg(query.dimension.to_string())
            .arg("--log-q")
            .arg(query.log_modulus.to_string())
            .arg("--secret")
            .arg(query.secret_distribution.as_str())
            .arg("--threads")
            .arg(query.threads.to_string())
            .arg("--cost-model")
            .arg(query.cost_model.as_str());

        debug!("Running {command:?}");

        let output = command.output().map_err(|source| Error::OracleLaunch {
            program: self.program.display().to_string(),
            source,
        })?;

        if output.status.code() == Some(UNEVALUABLE_EXIT_CODE) {
            debug!(
                "Estimator can't evaluate n = {}, log q = {}: {}",
                query.dimension,
                query.log_modulus,
                String::from_utf8_lossy(&output.stderr).trim()
            );

            return Ok(SecurityEstimate::Unevaluable);
        }

        if !output.status.success() {
            error!(
                "{} failed: {}",
                self.program.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );

            return Err(Error::OracleFailed {
                program: self.program.display().to_string(),
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);

        Ok(cheapest_attack(&stdout).map_or(SecurityEstimate::Unevaluable, SecurityEstimate::Bits))
    }
}

/// Returns the floored cost of the cheapest attack, or `None` if any attack
/// is missing or no attack has a finite cost.
fn cheapest_attack(output: &str) -> Option<u32> {
    let mut costs = [None; ATTACKS.len()];

    for line in output.lines() {
        let Some((attack, cost)) = line.split_once(':') else {
            continue;
        };

        if let Some(i) = ATTACKS.iter().position(|a| *a == attack.trim()) {
            costs[i] = cost.trim().parse::<f64>().ok();
        }
    }

    costs
        .into_iter()
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .filter(|x| x.is_finite())
        .map(|x| x.floor().max(0.0) as u32)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_cheapest_attack() {
        let output = "usvp: 131.7\ndual: 133.2\nbdd: 130.9\n";

        assert_eq!(cheapest_attack(output), Some(130));
    }

    #[test]
    fn ignores_unrelated_lines() {
        let output = "Estimating...\nrop: 2^140\nbdd: 150.0\nusvp: 145.5\ndual: inf\n";

        assert_eq!(cheapest_attack(output), Some(145));
    }

    #[test]
    fn missing_attack_is_unevaluable() {
        assert_eq!(cheapest_attack("usvp: 131.7\ndual: 133.2\n"), None);
        assert_eq!(cheapest_attack("usvp: 131.7\ndual: x\nbdd: 130.0"), None);
        assert_eq!(cheapest_attack(""), None);
    }

    #[test]
    fn all_infinite_is_unevaluable() {
        assert_eq!(cheapest_attack("usvp: inf\ndual: inf\nbdd: inf\n"), None);
    }

    fn query() -> SecurityQuery {
        SecurityQuery {
            dimension: 512,
            log_modulus: 14,
            secret_distribution: crate::SecretDistribution::Ternary,
            threads: 1,
            cost_model: crate::CostModel::Classical,
        }
    }

    #[test]
    fn missing_program_is_fatal() {
        let estimator = LatticeEstimator::new("/nonexistent/lattice-estimator");

        assert!(matches!(
            estimator.estimate(&query()),
            Err(Error::OracleLaunch { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn runs_estimator_program() {
        // $1.. receive the instance description.
        let script = r#"[ "$2" = 512 ] && [ "$4" = 14 ] || exit 1
echo "usvp: 140.2"
echo "dual: 135.5"
echo "bdd: 150"
echo "noise on stderr" >&2"#;

        let estimator = LatticeEstimator::new("sh").with_args(["-c", script, "estimator"]);

        assert_eq!(
            estimator.estimate(&query()).unwrap(),
            SecurityEstimate::Bits(135)
        );
    }

    #[cfg(unix)]
    #[test]
    fn rejected_instance_is_unevaluable() {
        let estimator =
            LatticeEstimator::new("sh").with_args(["-c", "echo 'modulus too small' >&2; exit 3"]);

        assert_eq!(
            estimator.estimate(&query()).unwrap(),
            SecurityEstimate::Unevaluable
        );
    }

    #[cfg(unix)]
    #[test]
    fn broken_estimator_is_fatal() {
        for script in [
            "echo 'ModuleNotFoundError: estimator' >&2; exit 1",
            "echo 'usage: lwe_estimate.py' >&2; exit 2",
        ] {
            let estimator = LatticeEstimator::new("sh").with_args(["-c", script]);

            assert!(matches!(
                estimator.estimate(&query()),
                Err(Error::OracleFailed { .. })
            ));
        }
    }
}
