//! The driver of spec.md §4.7: owns the three evaluation stacks and the
//! symbol table, and exposes the `init`/`reset`/`set_namespace`/`parse`
//! entry points of §6's programmatic API.
//!
//! Grounded on `original_source/include/vs-templ.hpp`'s `preprocessor`
//! struct for the owned-state shape (data/template/compiled documents, the
//! three stacks, the namespace strings); `diskplan::config::Config`'s
//! constructor-does-the-work style and `traversal::traverse`'s top-level
//! entry point are the Rust idiom precedent for the public surface.

use anyhow::Result;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::document::{Document, NodeId, NodeKind, NodeRef};
use crate::namespace::Namespace;
use crate::symbols::SymbolStack;
use crate::value::Value;

/// One entry of the template stack: a half-open sweep over a range of
/// sibling template nodes, tracked as a materialized list plus cursor
/// rather than a live iterator pair, since a `Document`'s children are a
/// plain `Vec` and cloning `NodeRef`s is free.
pub(crate) struct TemplateFrame<'doc> {
    pub(crate) siblings: Vec<NodeRef<'doc>>,
    pub(crate) cursor: usize,
}

/// Compiles a template document against a data document. Construct once per
/// `(data, template)` pair; `reset` reinitializes in place for reuse.
pub struct Preprocessor<'doc> {
    pub(crate) data: &'doc Document,
    pub(crate) template: &'doc Document,
    pub(crate) compiled: Document,
    pub(crate) data_root: NodeRef<'doc>,
    pub(crate) symbols: SymbolStack<'doc>,
    pub(crate) namespace: Namespace,

    pub(crate) template_stack: Vec<TemplateFrame<'doc>>,
    pub(crate) compiled_stack: Vec<NodeId>,
    /// Reserved for contextual data frames; unused by current semantics
    /// (spec.md §3).
    #[allow(dead_code)]
    pub(crate) data_stack: Vec<()>,

    /// Set the first time `random` ordering is used, so the caveat is
    /// logged once per `parse` rather than once per comparison.
    pub(crate) warned_random: bool,

    /// The log buffer of spec.md §4.7/§7: diagnostics accumulated during the
    /// current `parse`, cleared by `init`/`reset`, inspectable afterward via
    /// `diagnostics()`.
    pub(crate) log: Diagnostics,
}

const DEFAULT_PREFIX: &str = "s:";

/// The "data document root" of spec.md §4.3 rule 5: not `Document::root()`
/// itself (the library's synthetic `NodeKind::Document` wrapper, used as the
/// append point for the template/compiled trees), but the single top-level
/// element it wraps — so that `/` alone resolves to the document's outermost
/// element, matching the worked examples of spec.md §8 (e.g. `/~kind` reading
/// an attribute of the top-level element directly).
fn top_level_element(doc: &Document) -> NodeRef<'_> {
    doc.root()
        .children()
        .find(|child| child.kind() == NodeKind::Element)
        .unwrap_or_else(|| doc.root())
}

impl<'doc> Preprocessor<'doc> {
    /// Construct and immediately `init` with the default `"s:"` namespace.
    pub fn new(data: &'doc Document, template: &'doc Document) -> Self {
        Self::with_namespace(data, template, DEFAULT_PREFIX)
    }

    pub fn with_namespace(data: &'doc Document, template: &'doc Document, prefix: &str) -> Self {
        let data_root = top_level_element(data);
        let mut preprocessor = Preprocessor {
            data,
            template,
            compiled: Document::new(),
            data_root,
            symbols: SymbolStack::new(),
            namespace: Namespace::new(prefix),
            template_stack: Vec::new(),
            compiled_stack: Vec::new(),
            data_stack: Vec::new(),
            warned_random: false,
            log: Diagnostics::new(),
        };
        preprocessor.init();
        preprocessor
    }

    /// Recompute directive names for a new prefix. Does not itself reset
    /// stacks or symbols; a single instance must not mix prefixes mid-parse
    /// (spec.md §4.1).
    pub fn set_namespace(&mut self, prefix: &str) {
        self.namespace = Namespace::new(prefix);
    }

    /// Seed the template stack with the template root's children, the
    /// compiled stack with the compiled root, and bind `$` to the data root.
    /// Discards any previously compiled document and clears the log buffer
    /// (spec.md §4.7).
    pub fn init(&mut self) {
        self.compiled = Document::new();
        self.template_stack.clear();
        self.compiled_stack.clear();
        self.data_stack.clear();
        self.symbols.reset();
        self.warned_random = false;
        self.log.clear();

        self.symbols.set("$", Value::Node(self.data_root));
        self.template_stack.push(TemplateFrame {
            siblings: self.template.root().children().collect(),
            cursor: 0,
        });
        self.compiled_stack.push(self.compiled.root().id());
    }

    /// Clear all state and reseed, ready for another `parse` call.
    pub fn reset(&mut self) {
        self.init();
    }

    /// Drain the template stack, returning the compiled document.
    ///
    /// May be called once per `init`/`reset` (spec.md §4.7); a second call
    /// with an already-empty template stack simply returns the same, already
    /// complete, compiled document.
    pub fn parse(&mut self) -> Result<&Document> {
        self.run(0)?;
        Ok(&self.compiled)
    }

    /// Diagnostics accumulated since the last `init`/`reset` (spec.md §7's
    /// "log buffer... for inspection by the caller after `parse` returns").
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.log.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::text::parse as parse_doc;

    #[test]
    fn plain_template_copies_structurally() {
        let data = parse_doc("<root/>").unwrap();
        let template = parse_doc(r#"<ul><li n="1">a</li><li n="2">b</li></ul>"#).unwrap();
        let mut preprocessor = Preprocessor::new(&data, &template);
        let compiled = preprocessor.parse().unwrap();
        assert_eq!(
            crate::document::text::render(compiled).unwrap(),
            r#"<ul><li n="1">a</li><li n="2">b</li></ul>"#
        );
    }

    #[test]
    fn stacks_are_empty_after_parse() {
        let data = parse_doc("<root/>").unwrap();
        let template = parse_doc(r#"<a><b/></a>"#).unwrap();
        let mut preprocessor = Preprocessor::new(&data, &template);
        preprocessor.parse().unwrap();
        assert!(preprocessor.template_stack.is_empty());
        assert!(preprocessor.compiled_stack.is_empty());
    }

    #[test]
    fn reset_allows_reparsing() {
        let data = parse_doc("<root/>").unwrap();
        let template = parse_doc("<a/>").unwrap();
        let mut preprocessor = Preprocessor::new(&data, &template);
        preprocessor.parse().unwrap();
        preprocessor.reset();
        let compiled = preprocessor.parse().unwrap();
        assert_eq!(crate::document::text::render(compiled).unwrap(), "<a/>");
    }

    #[test]
    fn unknown_directive_is_recorded_in_diagnostics() {
        let data = parse_doc("<root/>").unwrap();
        let template = parse_doc("<s:bogus/>").unwrap();
        let mut preprocessor = Preprocessor::new(&data, &template);
        preprocessor.parse().unwrap();
        assert_eq!(preprocessor.diagnostics().len(), 1);
        assert!(preprocessor.diagnostics()[0].message.contains("s:bogus"));
    }

    #[test]
    fn reset_clears_the_log_buffer() {
        let data = parse_doc("<root/>").unwrap();
        let template = parse_doc("<s:bogus/>").unwrap();
        let mut preprocessor = Preprocessor::new(&data, &template);
        preprocessor.parse().unwrap();
        assert!(!preprocessor.diagnostics().is_empty());
        preprocessor.reset();
        assert!(preprocessor.diagnostics().is_empty());
    }
}
