use fhew_params::{
    BinFheNoiseOracle, DigitOutcome, Error, LatticeEstimator, NoiseMeasurement, NoiseOracle,
    ParameterSet, ParameterSweep, Result, SecretDistribution, SecurityLevel, SecurityOptimizer,
    SweepConfig, SweepReport,
    test_utils::{CurveNoiseOracle, LinearSecurityOracle, lenient_security_oracle},
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct FailingNoiseOracle;

impl NoiseOracle for FailingNoiseOracle {
    fn measure(&self, _: &ParameterSet, _: u32, _: u32) -> Result<NoiseMeasurement> {
        Err(Error::MalformedNoiseSample {
            line: 1,
            content: "Segmentation fault".to_owned(),
        })
    }
}

#[test]
fn always_noisy_sweep_reports_every_digit_count_infeasible() {
    init_logger();

    let config = SweepConfig::default();
    let security = lenient_security_oracle();
    let noise = CurveNoiseOracle::new(|_| 1e9);

    let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();

    assert_eq!(report.outcomes.len(), 3);

    for (outcome, d_g) in report.outcomes.iter().zip(2..=4) {
        assert_eq!(*outcome, DigitOutcome::Infeasible { gadget_digits: d_g });
    }
}

#[test]
fn more_gadget_digits_shrink_gadget_base() {
    init_logger();

    let config = SweepConfig::default();
    let security = lenient_security_oracle();
    let noise = CurveNoiseOracle::new(|p| 10_000.0 / p.lattice_dimension as f64);

    let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();
    let found = report.found().collect::<Vec<_>>();

    assert_eq!(found.len(), 3);

    for pair in found.windows(2) {
        assert!(pair[0].params.gadget_base >= pair[1].params.gadget_base);
    }

    for f in &found {
        // 10000 / n <= 25.34 first holds at n = 395.
        assert_eq!(f.params.lattice_dimension, 395);
        assert!(f.achieved_failure_rate <= config.failure_exponent as f64);
        assert!(f.params.ks_base < fhew_params::MAX_KS_BASE);
        assert!(f.params.log_ks_modulus <= f.params.log_ring_modulus);
        assert_eq!(f.ks_digits, f.params.ks_digits());
    }

    let json = serde_json::to_string(&report).unwrap();
    let read: SweepReport = serde_json::from_str(&json).unwrap();

    assert_eq!(read, report);
}

#[test]
fn noise_oracle_failure_aborts_sweep() {
    init_logger();

    let config = SweepConfig::default();
    let security = lenient_security_oracle();

    let result = ParameterSweep::new(&config, &security, &FailingNoiseOracle).run();

    assert!(matches!(result, Err(Error::MalformedNoiseSample { .. })));
}

#[test]
fn optimizer_finds_largest_secure_power_of_two() {
    // Security rises with the dimension and falls with the modulus.
    let oracle = LinearSecurityOracle::new(150.0, 0.05, 2.0);
    let optimizer =
        SecurityOptimizer::new(&oracle, SecurityLevel::Std128, SecretDistribution::Ternary, 1);

    let secure = optimizer.optimize(512, 20).unwrap().unwrap();

    assert_eq!(secure.dimension, 512);
    assert!(oracle.bits(512, secure.log_modulus) >= 128);
    assert!(oracle.bits(512, secure.log_modulus + 1) < 128);
}

#[cfg(unix)]
mod processes {
    use std::{fs, path::PathBuf};

    use super::*;

    // Receives `--n <n> --log-q <bits> ...` and prints 200 + n/50 - 4 log q.
    const ESTIMATOR: &str = r#"bits=$(( 200 + $2 / 50 - 4 * $4 ))
[ "$bits" -lt 0 ] && bits=0
echo "usvp: $bits.5"
echo "dual: $(( bits + 3 ))"
echo "bdd: $(( bits + 1 ))""#;

    // Two samples 0 and 20000 / n, so the noise is 20000 / (sqrt(2) n).
    const RUNNER: &str = r#"echo 0 >&2
echo $(( 20000 / $1 )) >&2
echo "BootstrappingKeySize: 1024 bytes"
echo "EvalBinGateTime: 5 milliseconds""#;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "fhew_params_sweep_{:016x}",
            rand::random::<u64>()
        ));
        fs::create_dir_all(&dir).unwrap();

        dir
    }

    #[test]
    fn sweep_through_external_programs() {
        init_logger();

        let dir = scratch_dir();

        let security = LatticeEstimator::new("sh").with_args(["-c", ESTIMATOR, "estimator"]);
        let noise =
            BinFheNoiseOracle::new("sh", "build", &dir).with_args(["-c", RUNNER, "runner"]);

        let config = SweepConfig {
            min_gadget_digits: 2,
            max_gadget_digits: 2,
            ..SweepConfig::default()
        };

        let report = ParameterSweep::new(&config, &security, &noise).run().unwrap();

        let DigitOutcome::Found(found) = &report.outcomes[0] else {
            panic!("expected parameters for d_g = 2");
        };

        assert_eq!(found.params.ring_dimension, 1024);
        assert!(found.final_noise <= found.target_noise);
        assert_eq!(
            found.performance.eval_bin_gate_time.as_ref().map(|m| m.value),
            Some(5.0)
        );

        // Every scratch file was cleaned up.
        assert!(fs::read_dir(&dir).unwrap().next().is_none());
        fs::remove_dir(dir).unwrap();
    }

    #[test]
    fn missing_estimator_aborts_sweep() {
        init_logger();

        let security = LatticeEstimator::new("sh").with_args([
            "-c",
            "echo 'ModuleNotFoundError: No module named estimator' >&2; exit 1",
            "estimator",
        ]);
        let noise = CurveNoiseOracle::new(|_| 0.0);

        let result = ParameterSweep::new(&SweepConfig::default(), &security, &noise).run();

        assert!(matches!(result, Err(Error::OracleFailed { .. })));
        assert!(noise.probed_dimensions().is_empty());
    }
}
