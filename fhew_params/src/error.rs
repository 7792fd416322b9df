use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
/// Errors that abort a search episode.
///
/// # Remarks
/// Failing to find parameters is not an error; searches report infeasibility
/// with `None` results. Likewise, a security estimator that cannot evaluate
/// an instance reports [`SecurityEstimate::Unevaluable`](crate::SecurityEstimate::Unevaluable).
pub enum Error {
    /// An external oracle program could not be started.
    #[error("Failed to launch {program}: {source}")]
    OracleLaunch {
        /// The program that failed to start.
        program: String,

        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An external oracle program exited unsuccessfully.
    #[error("{program} exited with {status}")]
    OracleFailed {
        /// The program that failed.
        program: String,

        /// Its exit status.
        status: ExitStatus,
    },

    /// The noise oracle emitted a line that isn't a noise sample.
    #[error("Malformed noise sample on line {line}: {content:?}")]
    MalformedNoiseSample {
        /// The 1-based line number.
        line: usize,

        /// The offending line.
        content: String,
    },

    /// The noise samples couldn't be reduced to a standard deviation.
    #[error("{0}")]
    NoiseSummary(#[from] fhew_math::Error),

    /// A value given on the command line is not valid.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A report couldn't be serialized.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Results for this crate.
pub type Result<T> = std::result::Result<T, Error>;
