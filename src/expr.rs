//! The path-expression language of spec.md §4.3.
//!
//! Grounded statement-for-statement on `examples/original_source`'s
//! `preprocessor::resolve_expr` (`src/vs-templ.cpp`): the leading-character
//! dispatch (integer / `#string` / `{symbol}` / `$` / `/`), then `/`-segment
//! path navigation terminated by `~!txt`, `~!tag`, or `~attr`.
//! `diskplan::traversal::eval::evaluate` (`src/traversal/eval.rs`) is the
//! style precedent for a single function walking tokens against a symbol
//! stack and returning the resolved value.

use crate::document::NodeRef;
use crate::symbols::SymbolStack;
use crate::value::Value;

/// Resolve `s` to a [`Value`], or `None` if no rule matches / a required
/// symbol is undefined. `base` overrides what `$` means for the duration of
/// this call — used by the selection operator to evaluate a sort-key
/// expression against each candidate in turn.
pub fn resolve<'doc>(
    s: &str,
    base: Option<NodeRef<'doc>>,
    symbols: &SymbolStack<'doc>,
    data_root: NodeRef<'doc>,
) -> Option<Value<'doc>> {
    let mut chars = s.chars();
    let c0 = chars.next()?;

    if c0 == '.' || c0 == '+' || c0 == '-' || ('1'..='9').contains(&c0) {
        return Some(Value::Int(parse_leading_int(s)));
    }
    if c0 == '#' {
        return Some(Value::Str(s[1..].to_owned()));
    }
    if c0 == '{' {
        let close = s.find('}');
        let name_end = close.unwrap_or(s.len());
        let name = &s[1..name_end];
        let bound = symbols.resolve(name)?;
        return match bound {
            Value::Int(_) | Value::Attr(_) => Some(bound),
            Value::Str(_) => Some(bound),
            Value::Node(node) => {
                let rest_start = close.map(|i| i + 1).unwrap_or(s.len());
                Some(navigate(node, &s[rest_start..]))
            }
        };
    }
    if c0 == '$' {
        let rest = &s[1..];
        if let Some(node) = base {
            return Some(navigate(node, rest));
        }
        return match symbols.resolve("$") {
            Some(Value::Node(node)) => Some(navigate(node, rest)),
            // `$` alone, bound to a non-node (e.g. the attribute a `for-props`
            // item binds it to, or the integer a `for-range` iteration
            // binds it to): returned directly, mirroring rule 3's "return it
            // directly and stop" for a non-node `{name}` binding. Further
            // navigation past a non-node base has nothing to step into.
            Some(other) if rest.is_empty() => Some(other),
            _ => None,
        };
    }
    if c0 == '/' {
        return Some(navigate(data_root, &s[1..]));
    }
    None
}

/// Parse the longest leading signed-decimal prefix of `s`, ignoring
/// trailing non-numeric input and defaulting to `0` if no digits follow the
/// optional sign (the `atoi` semantics `resolve_expr` relies on).
fn parse_leading_int(s: &str) -> i64 {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i] as char).is_ascii_whitespace() {
        i += 1;
    }
    let negative = match bytes.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };
    let mut value: i64 = 0;
    while let Some(&b) = bytes.get(i) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
        i += 1;
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Walk `rest`, a sequence of `/`-separated child names optionally
/// terminated by `~!txt`, `~!tag`, or `~attr-name`, starting from `node`.
/// A missing child steps onto the absent sentinel; navigation never
/// short-circuits, it just keeps chaining on the sentinel.
fn navigate<'doc>(mut node: NodeRef<'doc>, rest: &str) -> Value<'doc> {
    let bytes = rest.as_bytes();
    let mut idx = 0;
    loop {
        let mut close = idx;
        while close < bytes.len() && bytes[close] != b'/' && bytes[close] != b'~' {
            close += 1;
        }
        if idx != close {
            node = node.child(&rest[idx..close]);
        }
        if close == bytes.len() {
            return Value::Node(node);
        }
        if bytes[close] == b'~' {
            idx = close;
            break;
        }
        idx = close + 1;
    }

    let spec = &rest[idx + 1..];
    match spec {
        "!txt" => Value::Str(node.text().to_owned()),
        "!tag" => Value::Str(node.name().to_owned()),
        attr_name => Value::Attr(node.attribute(attr_name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::text::parse as parse_doc;

    #[test]
    fn integer_literals() {
        let doc = crate::document::Document::new();
        let symbols = SymbolStack::new();
        let root = doc.root();
        assert!(matches!(resolve("1", None, &symbols, root), Some(Value::Int(1))));
        assert!(matches!(resolve("+5", None, &symbols, root), Some(Value::Int(5))));
        assert!(matches!(resolve("-3", None, &symbols, root), Some(Value::Int(-3))));
        assert!(matches!(resolve("42trailing", None, &symbols, root), Some(Value::Int(42))));
        // Leading '0' is deliberately not a recognized numeric-literal start
        // (spec.md §9 open question 5); it falls through to "no rule matches".
        assert!(resolve("0", None, &symbols, root).is_none());
    }

    #[test]
    fn hash_prefixed_strings_are_verbatim() {
        let doc = crate::document::Document::new();
        let symbols = SymbolStack::new();
        let root = doc.root();
        match resolve("#hello/world", None, &symbols, root) {
            Some(Value::Str(s)) => assert_eq!(s, "hello/world"),
            other => panic!("expected a string, got {other:?}"),
        }
    }

    #[test]
    fn dollar_navigates_from_context() {
        let data = parse_doc(r#"<root><e a="1"/></root>"#).unwrap();
        let symbols = {
            let mut s = SymbolStack::new();
            s.set("$", Value::Node(data.root()));
            s
        };
        let root = data.root();
        match resolve("$/e~a", None, &symbols, root) {
            Some(Value::Attr(a)) => assert_eq!(a.value(), "1"),
            other => panic!("expected an attribute, got {other:?}"),
        }
    }

    #[test]
    fn slash_navigates_from_data_root_regardless_of_context() {
        let data = parse_doc(r#"<root><e a="1"/></root>"#).unwrap();
        let symbols = SymbolStack::new();
        let root = data.root();
        match resolve("/root/e~a", None, &symbols, root) {
            Some(Value::Attr(a)) => assert_eq!(a.value(), "1"),
            other => panic!("expected an attribute, got {other:?}"),
        }
    }

    #[test]
    fn symbol_reference_then_path_navigation() {
        let data = parse_doc(r#"<root><e><t>section</t></e></root>"#).unwrap();
        let mut symbols = SymbolStack::new();
        symbols.set("e", Value::Node(data.root().child("root").child("e")));
        let root = data.root();
        match resolve("{e}/t~!txt", None, &symbols, root) {
            Some(Value::Str(s)) => assert_eq!(s, "section"),
            other => panic!("expected a string, got {other:?}"),
        }
    }

    #[test]
    fn bare_dollar_returns_a_non_node_binding_directly() {
        let doc = crate::document::Document::new();
        let mut symbols = SymbolStack::new();
        symbols.set("$", Value::Int(42));
        let root = doc.root();
        assert!(matches!(resolve("$", None, &symbols, root), Some(Value::Int(42))));
        // Further navigation past a non-node `$` has nothing to step into.
        assert!(resolve("$/child", None, &symbols, root).is_none());
    }

    #[test]
    fn missing_child_chains_to_absent_instead_of_short_circuiting() {
        let data = parse_doc(r#"<root/>"#).unwrap();
        let symbols = SymbolStack::new();
        let root = data.root();
        match resolve("/missing/deeper~attr", None, &symbols, root) {
            Some(Value::Attr(a)) => assert_eq!(a.value(), ""),
            other => panic!("expected an empty attribute, got {other:?}"),
        }
    }

    #[test]
    fn idempotent_resolution() {
        let data = parse_doc(r#"<root><p n="a"/></root>"#).unwrap();
        let symbols = SymbolStack::new();
        let root = data.root();
        let first = resolve("/root/p~n", None, &symbols, root).unwrap();
        let second = resolve("/root/p~n", None, &symbols, root).unwrap();
        assert_eq!(first.as_compare_str(), second.as_compare_str());
    }
}
