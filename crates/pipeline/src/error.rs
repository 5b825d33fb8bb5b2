//! Pipeline error types.

use header_policy::PolicyError;
use thiserror::Error;

/// Main error type for the per-request pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("request accumulator already drained; response headers have been committed")]
    AccumulatorDrained,

    #[error("nonce generation failed")]
    NonceGeneration,

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
