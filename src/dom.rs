//! HTML Normalizer
//!
//! Parses arbitrary HTML with `dom_query` (html5ever's error-tolerant tree
//! builder) and flattens the result into an arena of [`Node`]s.
//!
//! ## Layout
//!
//! Nodes are stored in pre-order: a node's [`NodeId`] is its position in
//! document order. An element's attributes are stored directly after the
//! element and before its children, matching the XPath data model. Every node
//! also records where its subtree ends, so the descendant axis is a
//! contiguous index range.
//!
//! ```html
//! <p class="x">a<b>c</b></p>
//! ```
//!
//! becomes `#document, html, head, body, p, @class, "a", b, "c"`.

use dom_query::{Document as HtmlTree, NodeData, NodeRef};

/// Index of a node inside a [`Document`]. Ordering is document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The document node.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in document order.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The single root of every document.
    Document,
    /// An element, with a lower-case tag name.
    Element,
    /// An attribute of an element, with a lower-case name and a value.
    Attribute,
    /// A run of character data, whitespace preserved.
    Text,
    /// A comment.
    Comment,
}

/// A node in a normalized [`Document`].
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    name: Option<String>,
    value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<NodeId>,
    end: usize,
}

impl Node {
    fn new(kind: NodeKind, name: Option<String>, value: Option<String>, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            name,
            value,
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
            end: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Tag name for elements, attribute name for attributes.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Own value of attribute, text and comment nodes.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in document order. Attributes are not children.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[NodeId] {
        &self.attributes
    }
}

/// A well-formed tree built from HTML of any quality.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

/// A parsed node reduced to what the arena keeps.
enum Parsed {
    Element { name: String, attrs: Vec<(String, String)> },
    Text(String),
    Comment(String),
    Skip,
}

fn classify(node: &NodeRef) -> Parsed {
    node.query(|n| match &n.data {
        NodeData::Element(el) => Parsed::Element {
            name: el.name.local.to_ascii_lowercase().to_string(),
            attrs: el
                .attrs
                .iter()
                .map(|a| (a.name.local.to_ascii_lowercase().to_string(), a.value.to_string()))
                .collect(),
        },
        NodeData::Text { contents } => Parsed::Text(contents.to_string()),
        NodeData::Comment { contents } => Parsed::Comment(contents.to_string()),
        _ => Parsed::Skip,
    })
    .unwrap_or(Parsed::Skip)
}

impl Document {
    /// Parses and normalizes `html`. Never fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rs_pull::dom::{Document, NodeKind};
    ///
    /// let doc = Document::parse("<DIV><P>unclosed<p>second</DIV>");
    /// let tags: Vec<_> = doc
    ///     .iter()
    ///     .filter(|(_, n)| n.kind() == NodeKind::Element)
    ///     .filter_map(|(_, n)| n.name())
    ///     .collect();
    /// assert_eq!(tags, ["html", "head", "body", "div", "p", "p"]);
    /// ```
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let tree = HtmlTree::from(html);
        let mut nodes = vec![Node::new(NodeKind::Document, None, None, None)];

        // Explicit stack so deeply nested pages cannot overflow the call stack.
        // Children are pushed in reverse so they pop in document order.
        let mut stack: Vec<(NodeRef, NodeId)> = tree
            .root()
            .children()
            .into_iter()
            .rev()
            .map(|child| (child, NodeId::ROOT))
            .collect();

        while let Some((source, parent)) = stack.pop() {
            let id = NodeId(nodes.len());
            match classify(&source) {
                Parsed::Element { name, attrs } => {
                    nodes.push(Node::new(NodeKind::Element, Some(name), None, Some(parent)));
                    for (attr_name, attr_value) in attrs {
                        let attr_id = NodeId(nodes.len());
                        nodes.push(Node::new(
                            NodeKind::Attribute,
                            Some(attr_name),
                            Some(attr_value),
                            Some(id),
                        ));
                        nodes[id.0].attributes.push(attr_id);
                    }
                    stack.extend(source.children().into_iter().rev().map(|child| (child, id)));
                }
                Parsed::Text(text) => {
                    nodes.push(Node::new(NodeKind::Text, None, Some(text), Some(parent)));
                }
                Parsed::Comment(text) => {
                    nodes.push(Node::new(NodeKind::Comment, None, Some(text), Some(parent)));
                }
                Parsed::Skip => continue,
            }
            nodes[parent.0].children.push(id);
        }

        // Children and attributes always have larger indices than their
        // parent, so one reverse pass settles every subtree end.
        for i in (0..nodes.len()).rev() {
            let end = match (nodes[i].children.last(), nodes[i].attributes.last()) {
                (Some(last), _) => nodes[last.0].end,
                (None, Some(last)) => last.0 + 1,
                (None, None) => i + 1,
            };
            nodes[i].end = end;
        }

        tracing::debug!(nodes = nodes.len(), "normalized HTML document");
        Self { nodes }
    }

    /// The document node.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Looks up a node.
    ///
    /// `id` must come from this document.
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Total number of nodes, attributes included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A document always has its root node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in document order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Descendants of `id` in document order, excluding `id` and attributes.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let node = &self.nodes[id.0];
        (id.0 + 1..node.end)
            .filter(|&i| self.nodes[i].kind != NodeKind::Attribute)
            .map(NodeId)
    }

    /// Ancestors of `id`, nearest first. An attribute's owner is its parent.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, |p| self.nodes[p.0].parent)
    }

    /// Nodes after `id` in document order, excluding its descendants and
    /// all attributes.
    pub fn following(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        (self.nodes[id.0].end..self.nodes.len())
            .filter(|&i| self.nodes[i].kind != NodeKind::Attribute)
            .map(NodeId)
    }

    /// Nodes before `id`, nearest first, excluding its ancestors and all
    /// attributes.
    pub fn preceding(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        // A node before `id` is an ancestor exactly when its subtree reaches past `id`.
        (0..id.0)
            .rev()
            .filter(move |&i| self.nodes[i].end <= id.0 && self.nodes[i].kind != NodeKind::Attribute)
            .map(NodeId)
    }

    /// String value of a node.
    ///
    /// Attribute, text and comment nodes yield their own value. Elements and
    /// the document yield the concatenation of all descendant text nodes.
    #[must_use]
    pub fn string_value(&self, id: NodeId) -> String {
        let node = &self.nodes[id.0];
        match node.kind {
            NodeKind::Attribute | NodeKind::Text | NodeKind::Comment => {
                node.value.clone().unwrap_or_default()
            }
            NodeKind::Element | NodeKind::Document => self
                .descendants(id)
                .filter_map(|d| {
                    let n = &self.nodes[d.0];
                    (n.kind == NodeKind::Text).then(|| n.value.as_deref().unwrap_or(""))
                })
                .collect(),
        }
    }
}

impl From<&str> for Document {
    fn from(html: &str) -> Self {
        Self::parse(html)
    }
}
