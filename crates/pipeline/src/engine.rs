//! Request-scoped pipeline entry points.

use std::sync::Arc;

use header_policy::PolicySet;

use crate::accumulator::RequestAccumulator;
use crate::error::PipelineResult;
use crate::finalize::{HeaderSink, ResponseFinalizer};
use crate::nonce::{Nonce, NonceGenerator};

/// The application-wide pipeline, binding the shared policy set to
/// per-request scopes.
#[derive(Debug)]
pub struct HeaderPipeline {
    policies: Arc<PolicySet>,
    nonces: NonceGenerator,
}

impl HeaderPipeline {
    /// Create a pipeline over a configured policy set.
    pub fn new(policies: PolicySet) -> Self {
        Self {
            policies: Arc::new(policies),
            nonces: NonceGenerator::new(),
        }
    }

    /// The shared policy set.
    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Begin a request, producing its accumulator and finalizer.
    pub fn begin_request(&self) -> RequestScope {
        RequestScope {
            accumulator: RequestAccumulator::new(),
            finalizer: ResponseFinalizer::new(Arc::clone(&self.policies)),
        }
    }

    /// Generate a nonce for one response.
    pub fn generate_nonce(&self) -> PipelineResult<Nonce> {
        self.nonces.generate()
    }
}

/// Everything scoped to one request: the contribution store and the one-shot
/// finalizer. The hosting framework threads this from request start through
/// to its response-starting hook.
#[derive(Debug)]
pub struct RequestScope {
    accumulator: RequestAccumulator,
    finalizer: ResponseFinalizer,
}

impl RequestScope {
    /// The write side used by the rendering layer.
    pub fn accumulator(&self) -> &RequestAccumulator {
        &self.accumulator
    }

    /// The finalizer for this request.
    pub fn finalizer(&self) -> &ResponseFinalizer {
        &self.finalizer
    }

    /// Finalize this request's headers into the sink.
    ///
    /// Invoked from the framework's response-starting hook; safe to call more
    /// than once (later calls are no-ops).
    pub fn finalize(&self, sink: &mut dyn HeaderSink) -> PipelineResult<bool> {
        self.finalizer.finalize(&self.accumulator, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use header_policy::{HashAlgorithm, Policy, Source};

    use crate::error::PipelineError;
    use crate::finalize::FinalizerState;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("header_pipeline=debug")
            .with_test_writer()
            .try_init();
    }

    fn pipeline() -> HeaderPipeline {
        let mut set = PolicySet::new();
        let mut csp = Policy::content_security_policy();
        csp.add_directive("default-src", [Source::self_origin()])
            .unwrap();
        set.register(csp).unwrap();
        HeaderPipeline::new(set)
    }

    #[test]
    fn test_render_then_finalize() {
        init_tracing();
        let pipeline = pipeline();
        let request = pipeline.begin_request();

        request
            .accumulator()
            .contribute_style_hash("background: red;\r\ncolor: blue;", HashAlgorithm::Sha256)
            .unwrap();

        let mut sink: Vec<(String, String)> = Vec::new();
        assert!(request.finalize(&mut sink).unwrap());
        assert_eq!(
            sink,
            [(
                "Content-Security-Policy".to_string(),
                "default-src 'self'; \
                 style-src 'sha256-LttsR6Iu9D+xXbKUxLdRQsojrbhLJ0uRF7Gv7hVwMgk='"
                    .to_string()
            )]
        );
    }

    #[test]
    fn test_requests_are_isolated() {
        let pipeline = pipeline();

        let first = pipeline.begin_request();
        first
            .accumulator()
            .contribute("script-src", Source::unsafe_inline())
            .unwrap();
        let mut first_sink: Vec<(String, String)> = Vec::new();
        first.finalize(&mut first_sink).unwrap();

        let second = pipeline.begin_request();
        let mut second_sink: Vec<(String, String)> = Vec::new();
        second.finalize(&mut second_sink).unwrap();

        assert!(first_sink[0].1.contains("'unsafe-inline'"));
        assert_eq!(second_sink[0].1, "default-src 'self'");
    }

    #[test]
    fn test_contribution_after_finalize_fails_loudly() {
        let pipeline = pipeline();
        let request = pipeline.begin_request();

        let mut sink: Vec<(String, String)> = Vec::new();
        request.finalize(&mut sink).unwrap();
        let committed = sink.clone();

        assert_eq!(
            request
                .accumulator()
                .contribute("script-src", Source::unsafe_inline())
                .unwrap_err(),
            PipelineError::AccumulatorDrained
        );

        // The rejected contribution must not change what was sent.
        let mut replay: Vec<(String, String)> = Vec::new();
        assert!(!request.finalize(&mut replay).unwrap());
        assert!(replay.is_empty());
        assert_eq!(sink, committed);
        assert_eq!(request.finalizer().state(), FinalizerState::Sent);
    }

    #[test]
    fn test_configuration_is_frozen_after_first_request() {
        let mut set = PolicySet::new();
        set.register(Policy::content_security_policy()).unwrap();
        let pipeline = HeaderPipeline::new(set);

        let request = pipeline.begin_request();
        let mut sink: Vec<(String, String)> = Vec::new();
        request.finalize(&mut sink).unwrap();

        // Policies read by live traffic are sealed.
        assert!(pipeline.policies().policies().all(|p| p.is_sealed()));
    }

    #[test]
    fn test_nonce_flow() {
        let pipeline = pipeline();
        let request = pipeline.begin_request();

        let nonce = pipeline.generate_nonce().unwrap();
        request
            .accumulator()
            .contribute("script-src", nonce.to_source())
            .unwrap();

        let mut sink: Vec<(String, String)> = Vec::new();
        request.finalize(&mut sink).unwrap();
        assert!(sink[0]
            .1
            .contains(&format!("'nonce-{}'", nonce.value())));
    }
}
