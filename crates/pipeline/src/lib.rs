//! Per-request security header runtime.
//!
//! This crate implements the request-time side of response header
//! composition:
//! - Request accumulator (dynamically discovered source values)
//! - Inline content hashing (CRLF normalization, SHA-2, base64)
//! - Nonce generation
//! - One-shot response finalization (merge, serialize, write headers)
//!
//! Statically configured policies come from the `header_policy` crate and
//! are shared immutably across requests; everything here lives and dies with
//! a single request.

pub mod accumulator;
pub mod engine;
pub mod error;
pub mod finalize;
pub mod hashing;
pub mod nonce;

pub use accumulator::RequestAccumulator;
pub use engine::{HeaderPipeline, RequestScope};
pub use error::{PipelineError, PipelineResult};
pub use finalize::{FinalizerState, HeaderSink, ResponseFinalizer};
pub use hashing::{content_digest, hash_inline};
pub use nonce::{Nonce, NonceGenerator};
