//! Policy directives.

use indexmap::IndexSet;

use crate::serialize::HeaderGrammar;
use crate::source::Source;

/// One named directive within a policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    /// Directive name (e.g. "script-src", "geolocation").
    name: String,
    /// Directive payload.
    kind: DirectiveKind,
}

/// Directive payload variants.
#[derive(Clone, Debug, PartialEq, Eq)]
enum DirectiveKind {
    /// An ordered, deduplicated set of source values.
    SourceList(IndexSet<Source>),
    /// A directive that carries no values (e.g. "upgrade-insecure-requests",
    /// or an explicit empty allow-list in the allow-list grammar).
    Valueless,
}

impl Directive {
    /// Create a source-list directive with initial values.
    pub fn new(name: &str, values: impl IntoIterator<Item = Source>) -> Self {
        let mut directive = Self {
            name: name.to_string(),
            kind: DirectiveKind::SourceList(IndexSet::new()),
        };
        directive.merge(values);
        directive
    }

    /// Create a valueless directive.
    pub fn valueless(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: DirectiveKind::Valueless,
        }
    }

    /// Get the directive name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a value, preserving first-insertion order.
    ///
    /// Returns true if the value was newly inserted. Valueless directives
    /// ignore values.
    pub fn add(&mut self, value: Source) -> bool {
        match &mut self.kind {
            DirectiveKind::SourceList(values) => values.insert(value),
            DirectiveKind::Valueless => false,
        }
    }

    /// Append each value via `add`.
    pub fn merge(&mut self, values: impl IntoIterator<Item = Source>) {
        for value in values {
            self.add(value);
        }
    }

    /// Check if the directive carries no values.
    ///
    /// A valueless directive is never considered empty; it serializes
    /// name-only.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            DirectiveKind::SourceList(values) => values.is_empty(),
            DirectiveKind::Valueless => false,
        }
    }

    /// Iterate over source values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Source> {
        let list = match &self.kind {
            DirectiveKind::SourceList(values) => Some(values),
            DirectiveKind::Valueless => None,
        };
        list.into_iter().flatten()
    }

    /// Serialize this directive in the given grammar.
    ///
    /// Returns `None` for a source-list directive with no values, which is
    /// omitted from the header entirely.
    pub fn serialize(&self, grammar: HeaderGrammar) -> Option<String> {
        match (&self.kind, grammar) {
            (DirectiveKind::SourceList(values), _) if values.is_empty() => None,
            (DirectiveKind::SourceList(values), HeaderGrammar::DirectiveList) => {
                let rendered: Vec<String> =
                    values.iter().map(|v| v.render(grammar)).collect();
                Some(format!("{} {}", self.name, rendered.join(" ")))
            }
            (DirectiveKind::SourceList(values), HeaderGrammar::AllowList) => {
                // A lone wildcard uses the standalone form (`camera=*`).
                if values.len() == 1 && values[0].is_wildcard() {
                    return Some(format!("{}=*", self.name));
                }
                let rendered: Vec<String> =
                    values.iter().map(|v| v.render(grammar)).collect();
                Some(format!("{}=({})", self.name, rendered.join(" ")))
            }
            (DirectiveKind::Valueless, HeaderGrammar::DirectiveList) => Some(self.name.clone()),
            (DirectiveKind::Valueless, HeaderGrammar::AllowList) => {
                Some(format!("{}=()", self.name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut directive = Directive::new("script-src", [Source::self_origin()]);
        assert!(!directive.add(Source::self_origin()));
        assert!(directive.add(Source::unsafe_inline()));
        assert_eq!(
            directive.serialize(HeaderGrammar::DirectiveList).unwrap(),
            "script-src 'self' 'unsafe-inline'"
        );
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut directive = Directive::new("script-src", []);
        directive.add(Source::host("b.example.com").unwrap());
        directive.add(Source::host("a.example.com").unwrap());
        // Re-adding an existing value does not move it.
        directive.add(Source::host("b.example.com").unwrap());
        assert_eq!(
            directive.serialize(HeaderGrammar::DirectiveList).unwrap(),
            "script-src b.example.com a.example.com"
        );
    }

    #[test]
    fn test_empty_source_list_omitted() {
        let directive = Directive::new("style-src", []);
        assert!(directive.is_empty());
        assert!(directive.serialize(HeaderGrammar::DirectiveList).is_none());
        assert!(directive.serialize(HeaderGrammar::AllowList).is_none());
    }

    #[test]
    fn test_valueless_serializes_name_only() {
        let directive = Directive::valueless("upgrade-insecure-requests");
        assert!(!directive.is_empty());
        assert_eq!(
            directive.serialize(HeaderGrammar::DirectiveList).unwrap(),
            "upgrade-insecure-requests"
        );
    }

    #[test]
    fn test_valueless_allow_list_is_empty_group() {
        let directive = Directive::valueless("camera");
        assert_eq!(
            directive.serialize(HeaderGrammar::AllowList).unwrap(),
            "camera=()"
        );
    }

    #[test]
    fn test_valueless_ignores_values() {
        let mut directive = Directive::valueless("upgrade-insecure-requests");
        assert!(!directive.add(Source::self_origin()));
        assert_eq!(
            directive.serialize(HeaderGrammar::DirectiveList).unwrap(),
            "upgrade-insecure-requests"
        );
    }

    #[test]
    fn test_allow_list_serialization() {
        let directive = Directive::new(
            "geolocation",
            [
                Source::self_origin(),
                Source::host("https://example.com").unwrap(),
            ],
        );
        assert_eq!(
            directive.serialize(HeaderGrammar::AllowList).unwrap(),
            "geolocation=(self \"https://example.com\")"
        );
    }

    #[test]
    fn test_allow_list_wildcard_standalone() {
        let directive = Directive::new("camera", [Source::wildcard()]);
        assert_eq!(
            directive.serialize(HeaderGrammar::AllowList).unwrap(),
            "camera=*"
        );
    }

    #[test]
    fn test_merge_deduplicates() {
        let mut directive = Directive::new("style-src", [Source::self_origin()]);
        directive.merge([
            Source::self_origin(),
            Source::unsafe_inline(),
            Source::unsafe_inline(),
        ]);
        assert_eq!(
            directive.serialize(HeaderGrammar::DirectiveList).unwrap(),
            "style-src 'self' 'unsafe-inline'"
        );
    }
}
