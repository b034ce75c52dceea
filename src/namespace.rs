//! Precomputed tag/attribute names for a configured directive namespace
//! (spec.md §4.1).
//!
//! Grounded on `vs-templ.hpp`'s `ns_strings`/`ns_strings::prepare`
//! (`examples/original_source`) for *which* names get precomputed; the
//! original hand-slices a single heap allocation into `const char*`s to
//! dodge per-string allocation overhead, which spec.md §9 itself calls "a
//! trivial optimization" implementations are free to approach differently —
//! here, a plain struct of owned `String`s.

/// Directive tag/attribute names for one namespace prefix. Rebuilt whenever
/// the prefix changes; a single `Preprocessor` must not mix prefixes
/// mid-`parse`.
#[derive(Debug, Clone)]
pub struct Namespace {
    prefix: String,

    pub for_range: String,
    pub for_: String,
    pub for_props: String,
    pub empty: String,
    pub header: String,
    pub footer: String,
    pub item: String,
    pub error: String,
    pub when: String,
    pub is: String,
    pub value: String,
    pub element: String,
}

impl Namespace {
    pub fn new(prefix: &str) -> Self {
        let tag = |suffix: &str| format!("{prefix}{suffix}");
        Namespace {
            prefix: prefix.to_owned(),
            for_range: tag("for-range"),
            for_: tag("for"),
            for_props: tag("for-props"),
            empty: tag("empty"),
            header: tag("header"),
            footer: tag("footer"),
            item: tag("item"),
            error: tag("error"),
            when: tag("when"),
            is: tag("is"),
            value: tag("value"),
            element: tag("element"),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_namespaced(&self, name: &str) -> bool {
        !self.prefix.is_empty() && name.starts_with(self.prefix.as_str())
    }

    /// Strip the namespace prefix from an attribute name, for attribute
    /// rewrite-rule handling on plain (non-directive) elements.
    pub fn strip<'n>(&self, attr_name: &'n str) -> Option<&'n str> {
        attr_name.strip_prefix(self.prefix.as_str())
    }
}

/// Recognized attribute rewrite-rule suffixes (spec.md §4.1, §4.5): accepted
/// on plain elements and currently elided from the compiled output (spec.md
/// §9 open question 4's sibling note — these have no defined transform yet).
pub fn is_known_rewrite_rule(suffix: &str) -> bool {
    suffix.starts_with("for.src.")
        || suffix.starts_with("for-prop.src.")
        || suffix.starts_with("use.src.")
        || suffix.starts_with("eval.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_prefixed_names() {
        let ns = Namespace::new("s:");
        assert_eq!(ns.for_range, "s:for-range");
        assert_eq!(ns.for_, "s:for");
        assert_eq!(ns.element, "s:element");
        assert!(ns.is_namespaced("s:value"));
        assert!(!ns.is_namespaced("value"));
    }

    #[test]
    fn recognizes_rewrite_rule_suffixes() {
        assert!(is_known_rewrite_rule("for.src.name"));
        assert!(is_known_rewrite_rule("for-prop.src.name"));
        assert!(is_known_rewrite_rule("use.src.name"));
        assert!(is_known_rewrite_rule("eval.whatever"));
        assert!(!is_known_rewrite_rule("bogus.rule"));
    }
}
