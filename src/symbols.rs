//! Scoped bindings from name to [`Value`], per spec.md §4.2.
//!
//! Grounded on `diskplan::traversal::stack::{Stack, Scope, lookup}` for the
//! "stack of scopes, lookup walks upward" shape; the scoped frame guard is
//! the idiomatic Rust rendition of spec.md §9's "scoped acquisition
//! facility" note, implemented directly as a `Drop` guard rather than the
//! original's hand-rolled RAII object.

use std::collections::HashMap;

use crate::value::Value;

/// A stack of symbol frames. The distinguished name `$` denotes the current
/// context and is always defined once a [`crate::driver::Preprocessor`] has
/// been initialized.
#[derive(Debug)]
pub struct SymbolStack<'doc> {
    frames: Vec<HashMap<String, Value<'doc>>>,
}

impl<'doc> SymbolStack<'doc> {
    pub fn new() -> Self {
        SymbolStack {
            frames: vec![HashMap::new()],
        }
    }

    /// Write into the top frame, overriding any shadowed binding.
    pub fn set(&mut self, name: &str, value: Value<'doc>) {
        self.frames
            .last_mut()
            .expect("at least one frame always exists")
            .insert(name.to_owned(), value);
    }

    /// Top-down lookup across frames; absent if no frame defines `name`.
    pub fn resolve(&self, name: &str) -> Option<Value<'doc>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
    }

    /// Push a fresh top frame; releasing the returned guard pops it and
    /// discards every binding made since, regardless of how the guard's
    /// scope is exited.
    pub fn guard(&mut self) -> FrameGuard<'_, 'doc> {
        self.frames.push(HashMap::new());
        FrameGuard { stack: self }
    }

    /// Discard all frames and reinstate a single empty one.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.frames.push(HashMap::new());
    }

    /// Number of frames currently stacked; only used by tests to verify the
    /// frame-guard invariant from spec.md §8.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for SymbolStack<'_> {
    fn default() -> Self {
        SymbolStack::new()
    }
}

/// RAII handle for a pushed symbol frame. Dropping it pops exactly the
/// frame it pushed, even if the caller returns early via `?`.
pub struct FrameGuard<'a, 'doc> {
    stack: &'a mut SymbolStack<'doc>,
}

impl Drop for FrameGuard<'_, '_> {
    fn drop(&mut self) {
        self.stack.frames.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn guard_releases_exactly_one_frame() {
        let mut stack = SymbolStack::new();
        assert_eq!(stack.depth(), 1);
        {
            let _guard = stack.guard();
            stack.set("x", Value::Int(1));
            assert_eq!(stack.depth(), 2);
            assert_eq!(stack.resolve("x").map(|v| matches!(v, Value::Int(1))), Some(true));
        }
        assert_eq!(stack.depth(), 1);
        assert!(stack.resolve("x").is_none());
    }

    #[test]
    fn set_shadows_outer_frame_while_guard_is_held() {
        let mut stack = SymbolStack::new();
        stack.set("x", Value::Int(1));
        {
            let _guard = stack.guard();
            stack.set("x", Value::Int(2));
            assert!(matches!(stack.resolve("x"), Some(Value::Int(2))));
        }
        assert!(matches!(stack.resolve("x"), Some(Value::Int(1))));
    }

    #[test]
    fn dollar_binds_to_document_root() {
        let doc = Document::new();
        let mut stack = SymbolStack::new();
        stack.set("$", Value::Node(doc.root()));
        match stack.resolve("$") {
            Some(Value::Node(n)) => assert!(n.children().next().is_none()),
            _ => panic!("expected a node binding"),
        }
    }
}
