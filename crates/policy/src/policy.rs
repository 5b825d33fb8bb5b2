//! Per-header policy builders.

use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::directive::Directive;
use crate::error::{PolicyError, PolicyResult};
use crate::serialize::HeaderGrammar;
use crate::source::Source;

/// Policy delivery mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyMode {
    /// Violations are blocked by the browser.
    #[default]
    Enforce,
    /// Violations are reported but not blocked.
    ReportOnly,
}

/// A policy for one response header, built once at configuration time.
///
/// Directives serialize in registration order, each independently: the
/// builder never synthesizes the browser's `default-src` fallback, and never
/// drops `default-src` when more specific directives are present.
///
/// A policy seals itself when the finalization path first reads it; later
/// mutation attempts fail with [`PolicyError::BuilderSealed`].
#[derive(Debug)]
pub struct Policy {
    /// Header name without the report-only suffix.
    base_name: String,
    /// Delivery mode.
    mode: PolicyMode,
    /// Wire grammar for this header.
    grammar: HeaderGrammar,
    /// Registered directives, keyed by name, in registration order.
    directives: IndexMap<String, Directive>,
    /// Whether request-time contributions may merge into this policy.
    accepts_contributions: bool,
    /// Set once live traffic has read this policy.
    sealed: AtomicBool,
}

impl Policy {
    /// Create a policy for an arbitrary header sharing the directive-list
    /// shape. Such policies do not receive request-time contributions unless
    /// [`Policy::accept_contributions`] is called.
    pub fn new(header_name: &str, grammar: HeaderGrammar) -> Self {
        Self {
            base_name: header_name.to_string(),
            mode: PolicyMode::Enforce,
            grammar,
            directives: IndexMap::new(),
            accepts_contributions: false,
            sealed: AtomicBool::new(false),
        }
    }

    /// Create a Content-Security-Policy policy.
    ///
    /// CSP policies receive request-time contributions (inline hashes,
    /// nonces) by default.
    pub fn content_security_policy() -> Self {
        let mut policy = Self::new("Content-Security-Policy", HeaderGrammar::DirectiveList);
        policy.accepts_contributions = true;
        policy
    }

    /// Create a Permissions-Policy policy.
    pub fn permissions_policy() -> Self {
        Self::new("Permissions-Policy", HeaderGrammar::AllowList)
    }

    /// Create a Cross-Origin-Embedder-Policy policy.
    pub fn cross_origin_embedder_policy() -> Self {
        Self::new("Cross-Origin-Embedder-Policy", HeaderGrammar::DirectiveList)
    }

    /// Create a Cross-Origin-Opener-Policy policy.
    pub fn cross_origin_opener_policy() -> Self {
        Self::new("Cross-Origin-Opener-Policy", HeaderGrammar::DirectiveList)
    }

    /// Create a Cross-Origin-Resource-Policy policy.
    pub fn cross_origin_resource_policy() -> Self {
        Self::new("Cross-Origin-Resource-Policy", HeaderGrammar::DirectiveList)
    }

    /// Register a source-list directive with initial values.
    ///
    /// Returns a handle to the registered directive so further values can be
    /// added fluently.
    pub fn add_directive(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = Source>,
    ) -> PolicyResult<&mut Directive> {
        self.ensure_unsealed()?;
        if self.directives.contains_key(name) {
            return Err(PolicyError::duplicate_directive(name));
        }
        let entry = self
            .directives
            .entry(name.to_string())
            .or_insert_with(|| Directive::new(name, []));
        entry.merge(values);
        Ok(entry)
    }

    /// Register a valueless directive (e.g. "upgrade-insecure-requests").
    pub fn add_valueless(&mut self, name: &str) -> PolicyResult<&mut Directive> {
        self.ensure_unsealed()?;
        if self.directives.contains_key(name) {
            return Err(PolicyError::duplicate_directive(name));
        }
        Ok(self
            .directives
            .entry(name.to_string())
            .or_insert_with(|| Directive::valueless(name)))
    }

    /// Set the delivery mode.
    pub fn set_mode(&mut self, mode: PolicyMode) -> PolicyResult<()> {
        self.ensure_unsealed()?;
        self.mode = mode;
        Ok(())
    }

    /// Opt this policy into request-time contributions.
    pub fn accept_contributions(&mut self) -> PolicyResult<()> {
        self.ensure_unsealed()?;
        self.accepts_contributions = true;
        Ok(())
    }

    /// Chainable form of [`Policy::add_directive`].
    pub fn with_directive(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = Source>,
    ) -> PolicyResult<Self> {
        self.add_directive(name, values)?;
        Ok(self)
    }

    /// Chainable form of [`Policy::add_valueless`].
    pub fn with_valueless(mut self, name: &str) -> PolicyResult<Self> {
        self.add_valueless(name)?;
        Ok(self)
    }

    /// Chainable form of [`Policy::set_mode`].
    pub fn with_mode(mut self, mode: PolicyMode) -> PolicyResult<Self> {
        self.set_mode(mode)?;
        Ok(self)
    }

    /// Get a registered directive by name.
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.get(name)
    }

    /// Iterate over directives in registration order.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.directives.values()
    }

    /// The header name this policy serializes under.
    pub fn header_name(&self) -> String {
        match self.mode {
            PolicyMode::Enforce => self.base_name.clone(),
            PolicyMode::ReportOnly => format!("{}-Report-Only", self.base_name),
        }
    }

    /// The header name without the report-only suffix.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// The delivery mode.
    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    /// The wire grammar.
    pub fn grammar(&self) -> HeaderGrammar {
        self.grammar
    }

    /// Whether request-time contributions merge into this policy.
    pub fn accepts_contributions(&self) -> bool {
        self.accepts_contributions
    }

    /// Mark this policy as read by live traffic.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Check if this policy has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    fn ensure_unsealed(&self) -> PolicyResult<()> {
        if self.is_sealed() {
            return Err(PolicyError::BuilderSealed);
        }
        Ok(())
    }
}
