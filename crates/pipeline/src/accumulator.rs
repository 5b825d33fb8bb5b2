//! Per-request policy contribution store.

use indexmap::IndexSet;
use parking_lot::Mutex;
use tracing::{debug, warn};

use header_policy::{DynamicContributions, HashAlgorithm, Source};

use crate::error::{PipelineError, PipelineResult};
use crate::hashing;

/// Collects dynamically discovered source values for one request.
///
/// Created empty at request start, written to during body rendering, drained
/// exactly once at response start, then discarded with the request. The
/// accumulator is keyed by directive name independently of any static policy:
/// rendering-discovered content may introduce a directive the static
/// configuration never declared.
#[derive(Debug)]
pub struct RequestAccumulator {
    state: Mutex<State>,
}

#[derive(Debug)]
enum State {
    Collecting(DynamicContributions),
    Drained,
}

impl RequestAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Collecting(DynamicContributions::new())),
        }
    }

    /// Append a source value under a directive name.
    ///
    /// Contributions after [`RequestAccumulator::drain`] fail: headers have
    /// already been committed, and silently dropping the value would leave
    /// the browser blocking legitimate content.
    pub fn contribute(&self, directive_name: &str, value: Source) -> PipelineResult<()> {
        let mut state = self.state.lock();
        match &mut *state {
            State::Collecting(additions) => {
                additions
                    .entry(directive_name.to_string())
                    .or_insert_with(IndexSet::new)
                    .insert(value);
                debug!(directive = directive_name, "recorded policy contribution");
                Ok(())
            }
            State::Drained => {
                warn!(
                    directive = directive_name,
                    "policy contribution after response headers were committed"
                );
                Err(PipelineError::AccumulatorDrained)
            }
        }
    }

    /// Hash inline script content and contribute it to `script-src`.
    pub fn contribute_script_hash(
        &self,
        content: &str,
        algorithm: HashAlgorithm,
    ) -> PipelineResult<()> {
        self.contribute("script-src", hashing::hash_inline(content, algorithm))
    }

    /// Hash inline style content and contribute it to `style-src`.
    pub fn contribute_style_hash(
        &self,
        content: &str,
        algorithm: HashAlgorithm,
    ) -> PipelineResult<()> {
        self.contribute("style-src", hashing::hash_inline(content, algorithm))
    }

    /// Take the accumulated contributions, sealing the accumulator.
    ///
    /// One-time operation; a second drain reports the same lifecycle error as
    /// a post-drain contribution.
    pub fn drain(&self) -> PipelineResult<DynamicContributions> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Drained) {
            State::Collecting(additions) => Ok(additions),
            State::Drained => Err(PipelineError::AccumulatorDrained),
        }
    }

    /// Check if the accumulator has been drained.
    pub fn is_drained(&self) -> bool {
        matches!(&*self.state.lock(), State::Drained)
    }
}

impl Default for RequestAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
