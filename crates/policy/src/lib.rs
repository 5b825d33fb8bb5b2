//! Security response header policy model.
//!
//! This crate implements the immutable side of response header composition:
//! - Source expressions (keywords, hosts, schemes, nonces, content hashes)
//! - Directives (ordered, deduplicated source lists; valueless directives)
//! - Per-header policy builders (CSP, Cross-Origin-*, Permissions-Policy)
//! - The application-wide policy set
//! - Deterministic wire serialization
//!
//! Policies are built once at configuration time and shared immutably across
//! requests; the companion runtime crate overlays per-request contributions
//! at response start.

pub mod directive;
pub mod error;
pub mod policy;
pub mod serialize;
pub mod set;
pub mod source;

pub use directive::Directive;
pub use error::{PolicyError, PolicyResult};
pub use policy::{Policy, PolicyMode};
pub use serialize::{serialize_policy, serialize_static, DynamicContributions, HeaderGrammar};
pub use set::PolicySet;
pub use source::{HashAlgorithm, Source};
