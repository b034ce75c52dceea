//! The tagged-union `ConcreteValue` of spec.md §3: the result of resolving
//! an expression against the data tree.

use crate::document::{AttrRef, NodeRef};

/// A resolved expression: an integer, an owned string, or a borrowed
/// reference into the data document (a node or one of its attributes).
#[derive(Debug, Clone)]
pub enum Value<'doc> {
    Int(i64),
    Str(String),
    Node(NodeRef<'doc>),
    Attr(AttrRef<'doc>),
}

impl<'doc> Value<'doc> {
    /// The string rendering used for sort/equality comparisons: a node
    /// compares by its text, an attribute by its value, an integer by its
    /// decimal rendering. Never used to materialize output — see
    /// `interpreter::handle_value` for the directive that does that.
    pub fn as_compare_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Value::Int(i) => std::borrow::Cow::Owned(i.to_string()),
            Value::Str(s) => std::borrow::Cow::Borrowed(s.as_str()),
            Value::Node(n) => std::borrow::Cow::Borrowed(n.text()),
            Value::Attr(a) => std::borrow::Cow::Borrowed(a.value()),
        }
    }
}

/// `when`/`is` equality (spec.md §4.5): both absent is equal, exactly one
/// absent is unequal, both integers compare numerically, otherwise both
/// operands are coerced to a string and compared byte-wise.
pub fn values_equal(a: &Option<Value<'_>>, b: &Option<Value<'_>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(Value::Int(x)), Some(Value::Int(y))) => x == y,
        (Some(a), Some(b)) => a.as_compare_str() == b.as_compare_str(),
    }
}
