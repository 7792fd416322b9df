use std::{path::Path, process::ExitCode};

use args::{Command, FhewParams, SearchCommand, ValidateCommand};
use clap::Parser;
use fhew_math::security::failure_rate;
use fhew_params::{NoiseOracle, ParameterSweep, Result, SweepConfig, SweepReport};
use indicatif::ProgressBar;
use log::{error, info};
use serde::Serialize;

mod args;

pub fn write_results<R: Serialize>(path: &Path, r: &R) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(r)?)?;
    println!("Results written to {}", path.to_string_lossy());

    Ok(())
}

fn log_config(config: &SweepConfig) {
    info!("bootstrapping technique: {}", config.bootstrapping_technique);
    info!("secret distribution: {}", config.secret_distribution.as_str());
    info!("security level: {}", config.security_level);
    info!("failure rate: 2^{}", config.failure_exponent);
    info!("gate inputs: {}", config.gate_inputs);
    info!("samples: {}", config.sample_count);
    info!("d_ks: {}", config.ks_digits);
    info!(
        "d_g: [{}, {}]",
        config.min_gadget_digits, config.max_gadget_digits
    );
    info!("threads: {}", config.threads);
}

fn search(cmd: &SearchCommand) -> Result<()> {
    cmd.check()?;

    let security = cmd.oracles.security_oracle();
    let noise = cmd.oracles.noise_oracle();

    let reports = if cmd.all {
        let configs = cmd.all_configs();
        let progress = ProgressBar::new(configs.len() as u64);
        let mut reports = vec![];

        for config in &configs {
            log_config(config);

            // A failed configuration doesn't stop the others.
            match ParameterSweep::new(config, &security, &noise).run() {
                Ok(report) => {
                    progress.println(report.to_string());
                    reports.push(report);
                }
                Err(e) => error!(
                    "Search for {} with {} inputs failed: {e}",
                    config.security_level, config.gate_inputs
                ),
            }

            progress.inc(1);
        }

        progress.finish();

        reports
    } else {
        let config = cmd.config();
        log_config(&config);

        let report = ParameterSweep::new(&config, &security, &noise).run()?;
        println!("{report}");

        vec![report]
    };

    if let Some(path) = &cmd.output {
        write_results::<Vec<SweepReport>>(path, &reports)?;
    }

    Ok(())
}

fn validate(cmd: &ValidateCommand) -> Result<()> {
    let params = cmd.parameter_set()?;
    let noise = cmd.oracles.noise_oracle();

    info!("Validating {}", params.command_args(cmd.gate_inputs, cmd.sample_count));

    let measurement = noise.measure(&params, cmd.sample_count, cmd.gate_inputs)?;

    let failure = failure_rate(
        measurement.noise_std,
        2 * cmd.gate_inputs as u64,
        params.ciphertext_modulus,
        cmd.gate_inputs,
    );

    println!("{params}");
    println!("noise standard deviation: {:.4}", measurement.noise_std);
    println!("decryption failure rate: 2^{failure:.2}");

    for (name, metric) in measurement.performance.entries() {
        println!("{name}: {metric}");
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = FhewParams::parse();

    let result = match &args.command {
        Command::Search(cmd) => search(cmd),
        Command::Validate(cmd) => validate(cmd),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
