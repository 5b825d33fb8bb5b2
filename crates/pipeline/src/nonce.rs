//! Per-response nonce generation.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

use header_policy::Source;

use crate::error::{PipelineError, PipelineResult};

/// Raw nonce length in bytes before base64 encoding.
const NONCE_LEN: usize = 16;

/// Generator of single-use nonce values.
#[derive(Debug)]
pub struct NonceGenerator {
    rng: SystemRandom,
}

impl NonceGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Generate a fresh nonce.
    pub fn generate(&self) -> PipelineResult<Nonce> {
        let mut bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| PipelineError::NonceGeneration)?;
        Ok(Nonce {
            value: BASE64.encode(bytes),
        })
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A single-use nonce for one response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce {
    value: String,
}

impl Nonce {
    /// The base64 nonce value, as placed in the HTML `nonce` attribute.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Convert into a nonce source value for contribution.
    pub fn to_source(&self) -> Source {
        Source::Nonce(self.value.clone())
    }
}
