//! Wire serialization of policies.

use indexmap::{IndexMap, IndexSet};

use crate::directive::Directive;
use crate::policy::Policy;
use crate::source::Source;

/// Wire grammar of a policy header.
///
/// Both grammars share the "ordered list of name-prefixed token groups"
/// shape; they differ in group syntax and separator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderGrammar {
    /// CSP-family grammar: `name value value; name2 value`.
    DirectiveList,
    /// Permissions-Policy grammar: `name=(value value), name2=value`.
    AllowList,
}

impl HeaderGrammar {
    /// Separator between serialized directives.
    pub fn separator(&self) -> &'static str {
        match self {
            HeaderGrammar::DirectiveList => "; ",
            HeaderGrammar::AllowList => ", ",
        }
    }
}

/// Request-time contributions: an ordered, deduplicated set of source values
/// per directive name, keyed in first-contribution order.
pub type DynamicContributions = IndexMap<String, IndexSet<Source>>;

/// Serialize a policy merged with request-time contributions.
///
/// Statically registered directives serialize first, in registration order,
/// each unioned with its contributions (static values first, duplicates
/// dropped). Directive names that exist only in the contributions are
/// appended after, in first-contribution order. Returns `None` when nothing
/// serializes, in which case the header is omitted entirely.
pub fn serialize_policy(policy: &Policy, dynamic: &DynamicContributions) -> Option<String> {
    let grammar = policy.grammar();
    let mut groups: Vec<String> = Vec::new();

    for directive in policy.directives() {
        let serialized = match dynamic.get(directive.name()) {
            Some(extra) => {
                let mut merged = directive.clone();
                merged.merge(extra.iter().cloned());
                merged.serialize(grammar)
            }
            None => directive.serialize(grammar),
        };
        if let Some(group) = serialized {
            groups.push(group);
        }
    }

    for (name, values) in dynamic {
        if policy.directive(name).is_some() {
            continue;
        }
        let directive = Directive::new(name, values.iter().cloned());
        if let Some(group) = directive.serialize(grammar) {
            groups.push(group);
        }
    }

    if groups.is_empty() {
        None
    } else {
        Some(groups.join(grammar.separator()))
    }
}

/// Serialize a policy's static directives alone.
pub fn serialize_static(policy: &Policy) -> Option<String> {
    serialize_policy(policy, &DynamicContributions::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyMode;
    use crate::source::HashAlgorithm;

    fn csp_with_script_src() -> Policy {
        let mut policy = Policy::content_security_policy();
        policy
            .add_directive("default-src", [Source::self_origin()])
            .unwrap();
        policy
            .add_directive("script-src", [Source::self_origin()])
            .unwrap();
        policy
    }

    #[test]
    fn test_static_serialization() {
        let policy = csp_with_script_src();
        assert_eq!(
            serialize_static(&policy).unwrap(),
            "default-src 'self'; script-src 'self'"
        );
    }

    #[test]
    fn test_dynamic_values_follow_static() {
        let policy = csp_with_script_src();
        let mut dynamic = DynamicContributions::new();
        dynamic.insert(
            "script-src".to_string(),
            IndexSet::from([Source::hash(HashAlgorithm::Sha256, "abc123").unwrap()]),
        );
        assert_eq!(
            serialize_policy(&policy, &dynamic).unwrap(),
            "default-src 'self'; script-src 'self' 'sha256-abc123'"
        );
    }

    #[test]
    fn test_dynamic_only_directive_appended() {
        let policy = csp_with_script_src();
        let mut dynamic = DynamicContributions::new();
        dynamic.insert(
            "style-src".to_string(),
            IndexSet::from([Source::hash(HashAlgorithm::Sha256, "abc123").unwrap()]),
        );
        assert_eq!(
            serialize_policy(&policy, &dynamic).unwrap(),
            "default-src 'self'; script-src 'self'; style-src 'sha256-abc123'"
        );
    }

    #[test]
    fn test_dynamic_duplicates_dropped() {
        let policy = csp_with_script_src();
        let mut dynamic = DynamicContributions::new();
        dynamic.insert(
            "script-src".to_string(),
            IndexSet::from([
                Source::self_origin(),
                Source::hash(HashAlgorithm::Sha256, "abc123").unwrap(),
                Source::hash(HashAlgorithm::Sha256, "abc123").unwrap(),
            ]),
        );
        assert_eq!(
            serialize_policy(&policy, &dynamic).unwrap(),
            "default-src 'self'; script-src 'self' 'sha256-abc123'"
        );
    }

    #[test]
    fn test_empty_policy_omitted() {
        let policy = Policy::content_security_policy();
        assert!(serialize_static(&policy).is_none());

        let mut empty_directive = Policy::content_security_policy();
        empty_directive.add_directive("script-src", []).unwrap();
        assert!(serialize_static(&empty_directive).is_none());
    }

    #[test]
    fn test_default_src_never_dropped() {
        let policy = csp_with_script_src();
        let serialized = serialize_static(&policy).unwrap();
        assert!(serialized.starts_with("default-src 'self'"));
    }

    #[test]
    fn test_allow_list_grammar() {
        let mut policy = Policy::permissions_policy();
        policy
            .add_directive(
                "geolocation",
                [
                    Source::self_origin(),
                    Source::host("https://example.com").unwrap(),
                ],
            )
            .unwrap();
        policy.add_valueless("camera").unwrap();
        assert_eq!(
            serialize_static(&policy).unwrap(),
            "geolocation=(self \"https://example.com\"), camera=()"
        );
    }

    #[test]
    fn test_modes_are_independent() {
        let enforce = csp_with_script_src();
        let mut report = Policy::content_security_policy()
            .with_mode(PolicyMode::ReportOnly)
            .unwrap();
        report
            .add_directive("script-src", [Source::unsafe_inline()])
            .unwrap();

        let mut dynamic = DynamicContributions::new();
        dynamic.insert(
            "script-src".to_string(),
            IndexSet::from([Source::hash(HashAlgorithm::Sha256, "abc123").unwrap()]),
        );

        assert_eq!(
            serialize_policy(&enforce, &dynamic).unwrap(),
            "default-src 'self'; script-src 'self' 'sha256-abc123'"
        );
        assert_eq!(
            serialize_policy(&report, &dynamic).unwrap(),
            "script-src 'unsafe-inline' 'sha256-abc123'"
        );
    }

    #[test]
    fn test_order_stability() {
        let a = Source::host("a.example.com").unwrap();
        let b = Source::host("b.example.com").unwrap();

        let mut forward = Policy::content_security_policy();
        forward
            .add_directive("script-src", [a.clone(), b.clone()])
            .unwrap();
        let mut reverse = Policy::content_security_policy();
        reverse.add_directive("script-src", [b, a]).unwrap();

        assert_eq!(
            serialize_static(&forward).unwrap(),
            "script-src a.example.com b.example.com"
        );
        assert_eq!(
            serialize_static(&reverse).unwrap(),
            "script-src b.example.com a.example.com"
        );
    }
}
