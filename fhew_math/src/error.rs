use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
/// Errors that can occur when reducing noise measurements.
pub enum Error {
    /// A standard deviation needs at least two samples.
    #[error("Expected at least 2 noise samples, found {0}")]
    InsufficientSamples(usize),

    /// A sample was NaN or infinite.
    #[error("Noise sample {index} is not finite ({value})")]
    NonFiniteSample {
        /// The position of the offending sample.
        index: usize,

        /// The offending value.
        value: f64,
    },
}

/// Results for this crate.
pub type Result<T> = std::result::Result<T, Error>;
