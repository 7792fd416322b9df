#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate contains the numeric building blocks for choosing FHEW boolean
//! parameters: reducing measured noise samples and converting between noise
//! standard deviations and decryption failure rates.

/// Statistics functions
pub mod stats;

/// Functions related to calculating correctness parameters.
pub mod security;

mod error;
pub use error::*;
