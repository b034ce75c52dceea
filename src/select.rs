//! The selection operator of spec.md §4.4: filter (reserved), multi-key
//! sort, and offset/limit slicing over a node's children or attributes.
//!
//! Grounded on `examples/original_source`'s `prepare_children_data` /
//! `prepare_props_data` (`src/vs-templ.cpp`) for the comparator and
//! slicing shape. Slicing itself follows spec.md §4.4's prose — which
//! cleans up a boundary condition the original's own comment flags as
//! questionable (`// TODO: Check if these boundary conditions are sound`) —
//! rather than the original's `offset >= size` early-return-before-clamping
//! version; see `DESIGN.md`.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::diagnostics::Diagnostics;
use crate::document::{AttrRef, NodeRef};
use crate::expr;
use crate::symbols::SymbolStack;
use crate::value::Value;

/// `order_method_t::values` from the original, minus the unused `UNKNOWN`
/// bit pattern: an unrecognized direction token behaves the same as
/// `Unknown` here — the criterion contributes no ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Unknown,
    Asc,
    Desc,
    Random,
}

/// One `(direction, USE_DOT_EVAL)` pair, parsed from a single comma-separated
/// `order-by` token (e.g. `".desc"`).
#[derive(Debug, Clone, Copy)]
pub struct Direction {
    pub kind: Kind,
    pub dot_eval: bool,
}

impl Direction {
    pub fn parse(token: &str) -> Direction {
        let (dot_eval, rest) = match token.strip_prefix('.') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let kind = match rest {
            "asc" => Kind::Asc,
            "desc" => Kind::Desc,
            "random" => Kind::Random,
            _ => Kind::Unknown,
        };
        Direction { kind, dot_eval }
    }
}

/// Build the `(key-expression, direction)` list for `for`'s `sort-by`/
/// `order-by`, cycling `order-by` tokens if there are fewer of them than
/// sort keys.
pub fn build_criteria(sort_by: &str, order_by: &str) -> Vec<(String, Direction)> {
    if sort_by.is_empty() {
        return Vec::new();
    }
    let orders: Vec<&str> = {
        let parts: Vec<&str> = order_by.split(',').collect();
        if parts.is_empty() || order_by.is_empty() {
            vec!["asc"]
        } else {
            parts
        }
    };
    sort_by
        .split(',')
        .enumerate()
        .map(|(i, key)| (key.to_owned(), Direction::parse(orders[i % orders.len()])))
        .collect()
}

/// Sort `base`'s children per `criteria`, then slice by `offset`/`limit`.
#[allow(clippy::too_many_arguments)]
pub fn select_children<'doc>(
    base: NodeRef<'doc>,
    criteria: &[(String, Direction)],
    offset: i64,
    limit: i64,
    symbols: &SymbolStack<'doc>,
    data_root: NodeRef<'doc>,
    warned_random: &mut bool,
    log: &mut Diagnostics,
) -> Vec<NodeRef<'doc>> {
    let mut items: Vec<NodeRef<'doc>> = base.children().collect();
    items.sort_by(|a, b| compare_children(*a, *b, criteria, symbols, data_root, warned_random, log));
    slice(items, offset, limit)
}

/// Sort `base`'s attributes by name per `direction`, then slice.
pub fn select_attributes<'doc>(
    base: NodeRef<'doc>,
    direction: Direction,
    offset: i64,
    limit: i64,
    warned_random: &mut bool,
    log: &mut Diagnostics,
) -> Vec<AttrRef<'doc>> {
    let mut items: Vec<AttrRef<'doc>> = base.attributes().collect();
    items.sort_by(|a, b| match direction.kind {
        Kind::Asc => a.name().cmp(b.name()),
        Kind::Desc => a.name().cmp(b.name()).reverse(),
        Kind::Random => {
            warn_random_once(warned_random, log);
            hash_str(a.name()).cmp(&hash_str(b.name()))
        }
        Kind::Unknown => Ordering::Equal,
    });
    slice(items, offset, limit)
}

#[allow(clippy::too_many_arguments)]
fn compare_children<'doc>(
    a: NodeRef<'doc>,
    b: NodeRef<'doc>,
    criteria: &[(String, Direction)],
    symbols: &SymbolStack<'doc>,
    data_root: NodeRef<'doc>,
    warned_random: &mut bool,
    log: &mut Diagnostics,
) -> Ordering {
    for (key, direction) in criteria {
        let va = expr::resolve(key, Some(a), symbols, data_root);
        let vb = expr::resolve(key, Some(b), symbols, data_root);
        let ord = match direction.kind {
            Kind::Asc => compare_values(&va, &vb, direction.dot_eval),
            Kind::Desc => compare_values(&va, &vb, direction.dot_eval).reverse(),
            Kind::Random => {
                warn_random_once(warned_random, log);
                hash_value(&va).cmp(&hash_value(&vb))
            }
            Kind::Unknown => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Value comparison rules from spec.md §4.4: two integers compare
/// numerically; anything else (including a mismatched int/string pair) is
/// coerced to a string and compared lexicographically — or by `DOT_EVAL`
/// segments, if requested.
fn compare_values(a: &Option<Value<'_>>, b: &Option<Value<'_>>, dot_eval: bool) -> Ordering {
    if let (Some(Value::Int(x)), Some(Value::Int(y))) = (a, b) {
        return x.cmp(y);
    }
    let sa = cmp_string(a);
    let sb = cmp_string(b);
    if dot_eval {
        compare_dot_eval(&sa, &sb)
    } else {
        sa.as_bytes().cmp(sb.as_bytes())
    }
}

fn cmp_string(v: &Option<Value<'_>>) -> String {
    v.as_ref()
        .map(|v| v.as_compare_str().into_owned())
        .unwrap_or_default()
}

/// `USE_DOT_EVAL`: split both operands on `.`, compare corresponding
/// segments left-to-right, numerically where both parse as integers, else
/// lexicographically.
fn compare_dot_eval(a: &str, b: &str) -> Ordering {
    let mut ai = a.split('.');
    let mut bi = b.split('.');
    loop {
        return match (ai.next(), bi.next()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(sa), Some(sb)) => {
                let ord = match (sa.parse::<i64>(), sb.parse::<i64>()) {
                    (Ok(na), Ok(nb)) => na.cmp(&nb),
                    _ => sa.cmp(sb),
                };
                if ord == Ordering::Equal {
                    continue;
                }
                ord
            }
        };
    }
}

/// `RANDOM` (spec.md §9 open question 3): the original leaves this
/// unimplemented, noting an externally supplied stable hash would be an
/// acceptable design. `DefaultHasher` seeded from a fixed constant gives a
/// deterministic-within-one-process stand-in, not true randomness; a
/// warning is logged once per `parse()` the first time it's used.
const RANDOM_SEED: u64 = 0x5441_4245_5354_4142;

fn hash_value(v: &Option<Value<'_>>) -> u64 {
    hash_str(&cmp_string(v))
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    RANDOM_SEED.hash(&mut hasher);
    s.hash(&mut hasher);
    hasher.finish()
}

fn warn_random_once(warned: &mut bool, log: &mut Diagnostics) {
    if !*warned {
        log.warn("`random` ordering uses a deterministic stand-in hash, not true randomness");
        *warned = true;
    }
}

/// Offset/limit slicing (spec.md §4.4): `offset` clamps to `[0, len]`;
/// `limit == 0` takes everything from `offset`, `limit > 0` takes up to
/// `limit` items, `limit < 0` takes up to `len - |limit|` items, ending up
/// empty if that's non-positive.
fn slice<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    let len = items.len() as i64;
    let offset = offset.clamp(0, len);
    let end = if limit == 0 {
        len
    } else if limit > 0 {
        (offset + limit).min(len)
    } else {
        len + limit
    };
    if end <= offset {
        return Vec::new();
    }
    items
        .into_iter()
        .skip(offset as usize)
        .take((end - offset) as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::text::parse as parse_doc;

    #[test]
    fn slicing_all_with_default_offset_and_limit() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(slice(items, 0, 0), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn slicing_offset_and_positive_limit() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(slice(items, 1, 2), vec![2, 3]);
    }

    #[test]
    fn slicing_positive_limit_truncates_past_the_end() {
        let items = vec![1, 2, 3];
        assert_eq!(slice(items, 1, 10), vec![2, 3]);
    }

    #[test]
    fn slicing_negative_limit_takes_up_to_end_minus_magnitude() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(slice(items, 0, -2), vec![1, 2, 3]);
    }

    #[test]
    fn slicing_negative_limit_can_be_empty() {
        let items = vec![1, 2, 3];
        assert_eq!(slice(items, 2, -5), Vec::<i32>::new());
    }

    #[test]
    fn slicing_offset_past_end_is_empty() {
        let items = vec![1, 2, 3];
        assert_eq!(slice(items, 10, 0), Vec::<i32>::new());
    }

    #[test]
    fn sorts_children_ascending_by_attribute() {
        let data = parse_doc(r#"<root><p n="b"/><p n="a"/><p n="c"/></root>"#).unwrap();
        let root = data.root().child("root");
        let symbols = SymbolStack::new();
        let criteria = build_criteria("$~n", "asc");
        let mut warned = false;
        let mut log = Diagnostics::new();
        let selected = select_children(root, &criteria, 0, 0, &symbols, data.root(), &mut warned, &mut log);
        let names: Vec<_> = selected.iter().map(|n| n.attribute("n").value()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn sorts_attributes_descending_by_name() {
        let data = parse_doc(r#"<root><e a="1" c="3" b="2"/></root>"#).unwrap();
        let e = data.root().child("root").child("e");
        let mut warned = false;
        let mut log = Diagnostics::new();
        let selected = select_attributes(e, Direction::parse("desc"), 0, 0, &mut warned, &mut log);
        let values: Vec<_> = selected.iter().map(|a| a.value()).collect();
        assert_eq!(values, vec!["3", "2", "1"]);
    }

    #[test]
    fn dot_eval_compares_segments_numerically() {
        assert_eq!(compare_dot_eval("1.9", "1.10"), Ordering::Less);
        assert_eq!(compare_dot_eval("1.2", "1.2"), Ordering::Equal);
        assert_eq!(compare_dot_eval("a.b", "a.c"), Ordering::Less);
    }
}
