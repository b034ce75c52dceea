use std::fmt;

/// The kind of a single node: an element, a text node, or the synthetic
/// document node that roots every [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
}

/// Index of a node within a [`Document`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// The permanent absent-node sentinel, present in every [`Document`].
pub const ABSENT: NodeId = NodeId(0);

/// Index of the document root, the second slot allocated by [`Document::new`].
const ROOT: NodeId = NodeId(1);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    name: String,
    text: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn sentinel() -> Self {
        NodeData {
            kind: NodeKind::Element,
            name: String::new(),
            text: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// An arena-backed tree. Used for the data document, the template document,
/// and the compiled document alike — only the compiled one is ever mutated.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// A fresh document: slot `0` is the absent sentinel, slot `1` is an
    /// empty `Document`-kind root ready to receive children.
    pub fn new() -> Self {
        Document {
            nodes: vec![
                NodeData::sentinel(),
                NodeData {
                    kind: NodeKind::Document,
                    name: String::new(),
                    text: String::new(),
                    attributes: Vec::new(),
                    children: Vec::new(),
                },
            ],
        }
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            doc: self,
            id: ROOT,
        }
    }

    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    /// Append a new, empty child of `kind`/`name` to `parent`, returning its id.
    pub fn append_child(&mut self, parent: NodeId, kind: NodeKind, name: &str) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            name: name.to_owned(),
            text: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.nodes[id.index()].text = text.to_owned();
    }

    pub fn append_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.nodes[id.index()]
            .attributes
            .push((name.to_owned(), value.to_owned()));
    }

    /// Recursively copy `source` (from this or any other document) as a new
    /// child of `parent`, returning the id of the copy's root.
    pub fn deep_copy_from(&mut self, parent: NodeId, source: NodeRef<'_>) -> NodeId {
        let id = self.append_child(parent, source.kind(), source.name());
        self.set_text(id, source.stored_text());
        for attr in source.attributes() {
            self.append_attribute(id, attr.name(), attr.value());
        }
        for child in source.children() {
            self.deep_copy_from(id, child);
        }
        id
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

/// A borrowed, read-only view of a node in some [`Document`].
///
/// Always valid: an absent node is represented by a `NodeRef` pointing at
/// [`ABSENT`], not by `Option::None`, so navigation chains through missing
/// children without special-casing.
#[derive(Clone, Copy)]
pub struct NodeRef<'doc> {
    doc: &'doc Document,
    id: NodeId,
}

impl<'doc> NodeRef<'doc> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_absent(&self) -> bool {
        self.id == ABSENT
    }

    pub fn kind(&self) -> NodeKind {
        self.doc.data(self.id).kind
    }

    pub fn name(&self) -> &'doc str {
        &self.doc.data(self.id).name
    }

    /// The node's own text if it is itself a [`NodeKind::Text`] node;
    /// otherwise the text of its first `Text`-kind child, or `""` if it has
    /// none. Mirrors the common "text of a node" accessor of a DOM-like tree
    /// library, where mixed content stores text as sibling nodes.
    pub fn text(&self) -> &'doc str {
        let data = self.doc.data(self.id);
        if data.kind == NodeKind::Text {
            return &data.text;
        }
        data.children
            .iter()
            .map(|&id| self.doc.data(id))
            .find(|child| child.kind == NodeKind::Text)
            .map(|child| child.text.as_str())
            .unwrap_or("")
    }

    /// The node's own stored text field, with no fallback to a child. Always
    /// empty for an [`NodeKind::Element`] built by [`Document::append_child`]
    /// (only [`Document::set_text`] on a `Text`-kind node ever populates it) —
    /// used when copying a node's own fields, as opposed to resolving "the
    /// text of this node" for display or navigation (see [`NodeRef::text`]).
    pub fn stored_text(&self) -> &'doc str {
        &self.doc.data(self.id).text
    }

    pub fn attributes(&self) -> impl Iterator<Item = AttrRef<'doc>> + 'doc {
        self.doc
            .data(self.id)
            .attributes
            .iter()
            .map(|(name, value)| AttrRef {
                name,
                value,
            })
    }

    pub fn attribute(&self, name: &str) -> AttrRef<'doc> {
        match self
            .doc
            .data(self.id)
            .attributes
            .iter()
            .find(|(n, _)| n == name)
        {
            Some((name, value)) => AttrRef { name, value },
            None => AttrRef::EMPTY,
        }
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'doc>> + 'doc {
        let doc = self.doc;
        self.doc
            .data(self.id)
            .children
            .iter()
            .map(move |&id| NodeRef { doc, id })
    }

    /// Step to the first child with the given name, or the absent sentinel
    /// if there is none. Chains: calling `.child(...)` again on an absent
    /// `NodeRef` is a no-op that returns the same sentinel.
    pub fn child(&self, name: &str) -> NodeRef<'doc> {
        match self
            .doc
            .data(self.id)
            .children
            .iter()
            .find(|&&id| self.doc.data(id).name == name)
        {
            Some(&id) => NodeRef { doc: self.doc, id },
            None => NodeRef {
                doc: self.doc,
                id: ABSENT,
            },
        }
    }

    pub fn document(&self) -> &'doc Document {
        self.doc
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("text", &self.text())
            .finish()
    }
}

/// A borrowed attribute (name, value) pair. The empty default (`""`, `""`)
/// stands in for "no such attribute", including any attribute read through
/// an absent node, so callers never need to unwrap an `Option` to tell the
/// two apart from a present-but-empty attribute whose name is non-empty.
#[derive(Clone, Copy)]
pub struct AttrRef<'doc> {
    name: &'doc str,
    value: &'doc str,
}

impl<'doc> AttrRef<'doc> {
    const EMPTY: AttrRef<'static> = AttrRef {
        name: "",
        value: "",
    };

    pub fn name(&self) -> &'doc str {
        self.name
    }

    pub fn value(&self) -> &'doc str {
        self.value
    }

    /// True for any attribute obtained from a node that didn't actually
    /// carry it (a missing attribute, or one read through the absent
    /// sentinel). A present attribute's name is never empty.
    pub fn is_present(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Debug for AttrRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrRef")
            .field("name", &self.name())
            .field("value", &self.value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_sentinel_chains_through_missing_children() {
        let mut doc = Document::new();
        let root = doc.root().id();
        let a = doc.append_child(root, NodeKind::Element, "a");
        doc.append_attribute(a, "x", "1");

        let missing = doc.get(a).child("nope");
        assert!(missing.is_absent());
        assert_eq!(missing.name(), "");
        assert_eq!(missing.text(), "");
        assert!(!missing.attribute("x").is_present());
        // Chaining further off the sentinel stays on the sentinel.
        assert!(missing.child("deeper").is_absent());
    }

    #[test]
    fn text_reads_first_text_child() {
        let mut doc = Document::new();
        let root = doc.root().id();
        let t = doc.append_child(root, NodeKind::Element, "t");
        let text = doc.append_child(t, NodeKind::Text, "");
        doc.set_text(text, "section");

        assert_eq!(doc.get(t).text(), "section");
    }

    #[test]
    fn deep_copy_from_duplicates_subtree() {
        let mut source = Document::new();
        let root = source.root().id();
        let p = source.append_child(root, NodeKind::Element, "p");
        source.append_attribute(p, "n", "a");
        let text = source.append_child(p, NodeKind::Text, "");
        source.set_text(text, "hi");

        let mut compiled = Document::new();
        let dest_root = compiled.root().id();
        let copy = compiled.deep_copy_from(dest_root, source.get(p));

        let copy_ref = compiled.get(copy);
        assert_eq!(copy_ref.name(), "p");
        assert_eq!(copy_ref.attribute("n").value(), "a");
        assert_eq!(copy_ref.text(), "hi");
    }
}
