//! One-shot response finalization.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::debug;

use header_policy::{serialize_policy, DynamicContributions, PolicySet};

use crate::accumulator::RequestAccumulator;
use crate::error::PipelineResult;

/// Destination for finalized header values, provided by the hosting
/// framework.
pub trait HeaderSink {
    /// Set a named header on the outgoing response.
    fn set_header(&mut self, name: &str, value: &str);
}

impl HeaderSink for Vec<(String, String)> {
    fn set_header(&mut self, name: &str, value: &str) {
        self.push((name.to_string(), value.to_string()));
    }
}

/// Finalizer lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizerState {
    /// Request in flight; contributions still accepted.
    Pending,
    /// Finalization in progress.
    Finalizing,
    /// Headers committed; terminal.
    Sent,
}

const PENDING: u8 = 0;
const FINALIZING: u8 = 1;
const SENT: u8 = 2;

/// Writes policy headers exactly once per request.
///
/// The transition out of `Pending` happens exactly once; a double-invoked
/// response hook finds the finalizer already past `Pending` and becomes a
/// no-op rather than a duplicate header write.
#[derive(Debug)]
pub struct ResponseFinalizer {
    policies: Arc<PolicySet>,
    state: AtomicU8,
}

impl ResponseFinalizer {
    /// Create a finalizer for one request.
    pub fn new(policies: Arc<PolicySet>) -> Self {
        Self {
            policies,
            state: AtomicU8::new(PENDING),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FinalizerState {
        match self.state.load(Ordering::Acquire) {
            PENDING => FinalizerState::Pending,
            FINALIZING => FinalizerState::Finalizing,
            _ => FinalizerState::Sent,
        }
    }

    /// Merge, serialize, and write headers.
    ///
    /// Returns `Ok(true)` when headers were written by this call and
    /// `Ok(false)` when finalization had already run. Policies serializing
    /// to nothing are omitted rather than sent empty.
    pub fn finalize(
        &self,
        accumulator: &RequestAccumulator,
        sink: &mut dyn HeaderSink,
    ) -> PipelineResult<bool> {
        if self
            .state
            .compare_exchange(PENDING, FINALIZING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("finalization re-entered; headers already committed");
            return Ok(false);
        }

        self.policies.seal();
        let contributions = accumulator.drain()?;
        let no_contributions = DynamicContributions::new();

        for policy in self.policies.policies() {
            let overlay = if policy.accepts_contributions() {
                &contributions
            } else {
                &no_contributions
            };
            if let Some(value) = serialize_policy(policy, overlay) {
                let name = policy.header_name();
                debug!(header = name.as_str(), "setting policy header");
                sink.set_header(&name, &value);
            }
        }

        for (name, value) in self.policies.fixed_headers() {
            sink.set_header(name, value);
        }

        self.state.store(SENT, Ordering::Release);
        Ok(true)
    }
}
