use std::fmt::Display;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Parses one noise sample per line, skipping blank lines.
pub fn parse_noise_samples(text: &str) -> Result<Vec<f64>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.trim()
                .parse::<f64>()
                .map_err(|_| Error::MalformedNoiseSample {
                    line: i + 1,
                    content: line.to_owned(),
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A reported quantity and its unit.
pub struct Metric {
    /// The numeric value.
    pub value: f64,

    /// The unit, e.g. `bytes` or `milliseconds`.
    pub unit: String,
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Key sizes and timings reported by the noise runner.
pub struct PerformanceMetrics {
    /// The serialized size of the bootstrapping (refreshing) key.
    pub bootstrapping_key_size: Option<Metric>,

    /// The serialized size of the key switching key.
    pub key_switching_key_size: Option<Metric>,

    /// The serialized size of an LWE ciphertext.
    pub ciphertext_size: Option<Metric>,

    /// The time taken to generate the bootstrapping keys.
    pub bootstrap_keygen_time: Option<Metric>,

    /// The time taken to evaluate one bootstrapped gate.
    pub eval_bin_gate_time: Option<Metric>,
}

impl PerformanceMetrics {
    /// Parses `Key: value [unit]` lines. Unknown keys and unparsable values
    /// are ignored.
    pub fn parse(text: &str) -> Self {
        let mut metrics = Self::default();

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };

            let (slot, default_unit) = match key.trim() {
                "BootstrappingKeySize" => (&mut metrics.bootstrapping_key_size, "bytes"),
                "KeySwitchingKeySize" => (&mut metrics.key_switching_key_size, "bytes"),
                "CiphertextSize" => (&mut metrics.ciphertext_size, "bytes"),
                "BootstrapKeyGenTime" => (&mut metrics.bootstrap_keygen_time, "milliseconds"),
                "EvalBinGateTime" => (&mut metrics.eval_bin_gate_time, "milliseconds"),
                _ => continue,
            };

            let mut parts = value.split_whitespace();

            match parts.next().map(str::parse::<f64>) {
                Some(Ok(value)) => {
                    *slot = Some(Metric {
                        value,
                        unit: parts.next().unwrap_or(default_unit).to_owned(),
                    });
                }
                _ => debug!("Ignoring unparsable performance line {line:?}"),
            }
        }

        metrics
    }

    /// The reported metrics with their display names.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &Metric)> {
        [
            ("BootstrappingKeySize", &self.bootstrapping_key_size),
            ("KeySwitchingKeySize", &self.key_switching_key_size),
            ("CiphertextSize", &self.ciphertext_size),
            ("BootstrapKeyGenTime", &self.bootstrap_keygen_time),
            ("EvalBinGateTime", &self.eval_bin_gate_time),
        ]
        .into_iter()
        .filter_map(|(name, metric)| metric.as_ref().map(|m| (name, m)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_noise_lines() {
        let samples = parse_noise_samples("1.5\n-2.25\n\n  3e1 \n").unwrap();

        assert_eq!(samples, vec![1.5, -2.25, 30.0]);
    }

    #[test]
    fn malformed_noise_line_is_an_error() {
        let err = parse_noise_samples("1.0\n2.0\nsegfault\n").unwrap_err();

        match err {
            Error::MalformedNoiseSample { line, content } => {
                assert_eq!(line, 3);
                assert_eq!(content, "segfault");
            }
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn parses_runner_output() {
        let output = "\
parameters from commandline dim_n, dim_N, logQ, q, Qks, B_g, B_ks:  518 2048 54 2048 16384 134217728 32
BootstrapKeyGenTime: 2345 milliseconds
BootstrappingKeySize: 1234567
KeySwitchingKeySize: 7654321
CiphertextSize: 4200
EvalBinGateTime: 87 milliseconds
";

        let metrics = PerformanceMetrics::parse(output);

        assert_eq!(
            metrics.eval_bin_gate_time,
            Some(Metric {
                value: 87.0,
                unit: "milliseconds".to_owned()
            })
        );
        assert_eq!(
            metrics.bootstrapping_key_size,
            Some(Metric {
                value: 1234567.0,
                unit: "bytes".to_owned()
            })
        );
        assert_eq!(metrics.entries().count(), 5);
        assert_eq!(
            metrics.ciphertext_size.map(|m| m.to_string()),
            Some("4200 bytes".to_owned())
        );
    }

    #[test]
    fn missing_metrics_are_none() {
        let metrics = PerformanceMetrics::parse("CiphertextSize: lots\nunrelated\n");

        assert_eq!(metrics, PerformanceMetrics::default());
        assert_eq!(metrics.entries().count(), 0);
    }
}
