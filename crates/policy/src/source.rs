//! Source expressions for policy directives.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PolicyError, PolicyResult};
use crate::serialize::HeaderGrammar;

/// One source expression within a directive.
///
/// Equality, ordering, and hashing are defined by the variant and its
/// literal content; deduplication in directives relies on this.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    /// Keyword source, stored unquoted (e.g. "self", "unsafe-inline").
    ///
    /// Unrecognized keywords are accepted verbatim so that new keywords in
    /// evolving header specifications do not require a release.
    Keyword(String),
    /// Host source (e.g. "example.com", "*.example.com", "*").
    Host(String),
    /// Scheme source, stored without the trailing colon (e.g. "https").
    Scheme(String),
    /// Nonce source, carrying the base64 nonce value.
    Nonce(String),
    /// Content hash source.
    Hash {
        algorithm: HashAlgorithm,
        digest: String,
    },
}

impl Source {
    /// Create a keyword source. Surrounding single quotes are stripped.
    pub fn keyword(keyword: &str) -> PolicyResult<Self> {
        let bare = keyword.trim_matches('\'');
        if bare.is_empty() {
            return Err(PolicyError::invalid_source("keyword must not be empty"));
        }
        if bare.chars().any(char::is_whitespace) {
            return Err(PolicyError::invalid_source(
                "keyword must not contain whitespace",
            ));
        }
        Ok(Source::Keyword(bare.to_string()))
    }

    /// Create a host source.
    pub fn host(host: &str) -> PolicyResult<Self> {
        if host.is_empty() {
            return Err(PolicyError::invalid_source("host must not be empty"));
        }
        if host
            .chars()
            .any(|c| c.is_whitespace() || c == ';' || c == ',' || c == '\'' || c == '"')
        {
            return Err(PolicyError::invalid_source(
                "host must not contain whitespace, separators, or quotes",
            ));
        }
        Ok(Source::Host(host.to_string()))
    }

    /// Create a host source from a URL's origin.
    pub fn from_origin(url: &Url) -> PolicyResult<Self> {
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(PolicyError::invalid_source(format!(
                "opaque origin for `{}`",
                url
            )));
        }
        Self::host(&origin.ascii_serialization())
    }

    /// Create a scheme source. A trailing colon is stripped.
    pub fn scheme(scheme: &str) -> PolicyResult<Self> {
        let bare = scheme.strip_suffix(':').unwrap_or(scheme);
        let mut chars = bare.chars();
        let valid = match chars.next() {
            Some(first) => {
                first.is_ascii_alphabetic()
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
            }
            None => false,
        };
        if !valid {
            return Err(PolicyError::invalid_source(format!(
                "`{}` is not a valid scheme",
                scheme
            )));
        }
        Ok(Source::Scheme(bare.to_string()))
    }

    /// Create a nonce source from a base64 nonce value.
    pub fn nonce(value: &str) -> PolicyResult<Self> {
        if value.is_empty() || !is_base64ish(value) {
            return Err(PolicyError::invalid_source("nonce must be base64"));
        }
        Ok(Source::Nonce(value.to_string()))
    }

    /// Create a hash source from a base64 digest.
    pub fn hash(algorithm: HashAlgorithm, digest: &str) -> PolicyResult<Self> {
        if digest.is_empty() || !is_base64ish(digest) {
            return Err(PolicyError::invalid_source("hash digest must be base64"));
        }
        Ok(Source::Hash {
            algorithm,
            digest: digest.to_string(),
        })
    }

    /// The 'self' keyword.
    pub fn self_origin() -> Self {
        Source::Keyword("self".to_string())
    }

    /// The 'none' keyword.
    pub fn none() -> Self {
        Source::Keyword("none".to_string())
    }

    /// The 'unsafe-inline' keyword.
    pub fn unsafe_inline() -> Self {
        Source::Keyword("unsafe-inline".to_string())
    }

    /// The 'unsafe-eval' keyword.
    pub fn unsafe_eval() -> Self {
        Source::Keyword("unsafe-eval".to_string())
    }

    /// The 'strict-dynamic' keyword.
    pub fn strict_dynamic() -> Self {
        Source::Keyword("strict-dynamic".to_string())
    }

    /// The wildcard host source.
    pub fn wildcard() -> Self {
        Source::Host("*".to_string())
    }

    /// Check if this is the wildcard host source.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Source::Host(h) if h == "*")
    }

    /// Render this source as a wire token in the given grammar.
    pub fn render(&self, grammar: HeaderGrammar) -> String {
        match grammar {
            HeaderGrammar::DirectiveList => match self {
                Source::Keyword(keyword) => format!("'{}'", keyword),
                Source::Host(host) => host.clone(),
                Source::Scheme(scheme) => format!("{}:", scheme),
                Source::Nonce(value) => format!("'nonce-{}'", value),
                Source::Hash { algorithm, digest } => {
                    format!("'{}-{}'", algorithm.name(), digest)
                }
            },
            HeaderGrammar::AllowList => match self {
                // Allow-list keywords render bare (`self`, `src`).
                Source::Keyword(keyword) => keyword.clone(),
                Source::Host(host) if host == "*" => host.clone(),
                Source::Host(host) => format!("\"{}\"", host),
                Source::Scheme(scheme) => format!("\"{}:\"", scheme),
                Source::Nonce(value) => format!("'nonce-{}'", value),
                Source::Hash { algorithm, digest } => {
                    format!("'{}-{}'", algorithm.name(), digest)
                }
            },
        }
    }
}

/// Hash algorithms allowed in hash sources.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256.
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Get algorithm name as used in hash tokens.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Parse algorithm from name. Names outside the fixed set are rejected.
    pub fn from_name(name: &str) -> PolicyResult<Self> {
        match name.to_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(PolicyError::unsupported_algorithm(name)),
        }
    }
}

fn is_base64ish(value: &str) -> bool {
    value.chars().all(|c| {
        c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=' || c == '-' || c == '_'
    })
}
