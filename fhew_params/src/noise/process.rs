use std::{
    fs::{self, File},
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Command,
};

use fhew_math::stats::NoiseSummary;
use log::{debug, warn};

use crate::{
    Error, NoiseMeasurement, NoiseOracle, ParameterSet, PerformanceMetrics, Result,
    parse_noise_samples,
};

/// A pair of uniquely named files capturing a runner's stdout and stderr.
/// Both are deleted when this guard is dropped.
pub struct ScratchFiles {
    stdout: PathBuf,
    stderr: PathBuf,
}

impl ScratchFiles {
    /// Reserves `out_file_<handle>` and `noise_file_<handle>` in `dir` for a
    /// random handle. The files aren't created until they're opened.
    pub fn new(dir: &Path) -> Self {
        let handle = format!("{:016x}", rand::random::<u64>());

        Self {
            stdout: dir.join(format!("out_file_{handle}")),
            stderr: dir.join(format!("noise_file_{handle}")),
        }
    }

    /// Where the runner's stdout (performance metrics) goes.
    pub fn stdout_path(&self) -> &Path {
        &self.stdout
    }

    /// Where the runner's stderr (noise samples) goes.
    pub fn stderr_path(&self) -> &Path {
        &self.stderr
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in [&self.stdout, &self.stderr] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {e}", path.display()),
            }
        }
    }
}

/// A [`NoiseOracle`] that runs the boolean FHE noise runner (by default
/// `scripts/run_script.sh`).
///
/// # Remarks
/// The runner receives the positional arguments
/// `n q N logQ Qks B_g B_ks B_rk sigma samples dist tech inputs build_dir`.
/// It must write one noise sample per line to stderr and `Key: value [unit]`
/// performance lines to stdout. Both streams go through [`ScratchFiles`]
/// that are removed after every invocation, successful or not.
pub struct BinFheNoiseOracle {
    program: PathBuf,
    args: Vec<String>,
    build_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl BinFheNoiseOracle {
    /// Creates an oracle running `program` against the library built in
    /// `build_dir`, keeping scratch files in `scratch_dir`.
    pub fn new(
        program: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            build_dir: build_dir.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Arguments passed to the program before the parameter set.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self, params: &ParameterSet, sample_count: u32, gate_inputs: u32) -> Command {
        let mut command = Command::new(&self.program);

        command
            .args(&self.args)
            .arg(params.lattice_dimension.to_string())
            .arg(params.ciphertext_modulus.to_string())
            .arg(params.ring_dimension.to_string())
            .arg(params.log_ring_modulus.to_string())
            .arg(params.ks_modulus().to_string())
            .arg(params.gadget_base.to_string())
            .arg(params.ks_base.to_string())
            .arg(params.refresh_base.to_string())
            .arg(params.sigma.to_string())
            .arg(sample_count.to_string())
            .arg(params.secret_distribution.code().to_string())
            .arg(params.bootstrapping_technique.code().to_string())
            .arg(gate_inputs.to_string())
            .arg(&self.build_dir);

        command
    }
}

impl NoiseOracle for BinFheNoiseOracle {
    fn measure(
        &self,
        params: &ParameterSet,
        sample_count: u32,
        gate_inputs: u32,
    ) -> Result<NoiseMeasurement> {
        let scratch = ScratchFiles::new(&self.scratch_dir);
        let stdout = File::create(scratch.stdout_path())?;
        let stderr = File::create(scratch.stderr_path())?;

        let mut command = self.command(params, sample_count, gate_inputs);

        debug!("Running {command:?}");

        let status = command
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|source| Error::OracleLaunch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !status.success() {
            return Err(Error::OracleFailed {
                program: self.program.display().to_string(),
                status,
            });
        }

        let samples = parse_noise_samples(&fs::read_to_string(scratch.stderr_path())?)?;
        let summary = NoiseSummary::from_samples(&samples)?;
        let performance = PerformanceMetrics::parse(&fs::read_to_string(scratch.stdout_path())?);

        Ok(NoiseMeasurement {
            noise_std: summary.std(),
            performance,
        })
    }
}
