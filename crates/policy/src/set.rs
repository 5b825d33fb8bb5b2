//! Application-wide policy registry.

use indexmap::IndexMap;

use crate::error::{PolicyError, PolicyResult};
use crate::policy::Policy;

/// The set of policies and fixed-value headers applied to every response.
///
/// Built once at startup, then shared immutably (typically behind an `Arc`)
/// across requests.
#[derive(Debug, Default)]
pub struct PolicySet {
    /// Registered policies, in registration order.
    policies: Vec<Policy>,
    /// Constant-value headers, emitted verbatim.
    fixed: IndexMap<String, String>,
}

impl PolicySet {
    /// Create an empty policy set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy set preloaded with the conventional baseline headers.
    pub fn with_default_headers() -> Self {
        let mut set = Self::new();
        set.set_fixed_header("X-Content-Type-Options", "nosniff");
        set.set_fixed_header("X-Frame-Options", "DENY");
        set.set_fixed_header("Referrer-Policy", "strict-origin-when-cross-origin");
        set.set_fixed_header("X-XSS-Protection", "0");
        set
    }

    /// Register a policy.
    ///
    /// At most one policy per header name (mode included) may be registered.
    pub fn register(&mut self, policy: Policy) -> PolicyResult<()> {
        let header = policy.header_name();
        if self.policies.iter().any(|p| p.header_name() == header) {
            return Err(PolicyError::duplicate_policy(header));
        }
        self.policies.push(policy);
        Ok(())
    }

    /// Chainable form of [`PolicySet::register`].
    pub fn with_policy(mut self, policy: Policy) -> PolicyResult<Self> {
        self.register(policy)?;
        Ok(self)
    }

    /// Set a constant-value header. Re-setting a name replaces its value.
    pub fn set_fixed_header(&mut self, name: &str, value: &str) {
        self.fixed.insert(name.to_string(), value.to_string());
    }

    /// Iterate over registered policies in registration order.
    pub fn policies(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter()
    }

    /// Iterate over fixed headers in insertion order.
    pub fn fixed_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fixed.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Seal every registered policy against further mutation.
    pub fn seal(&self) {
        for policy in &self.policies {
            policy.seal();
        }
    }
}
