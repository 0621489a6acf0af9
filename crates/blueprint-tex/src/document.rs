use std::collections::BTreeMap;
use std::fmt;

/// Index of a node inside a [`Document`] arena.
///
/// Ids are only meaningful for the document that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of node kinds produced by the reader.
///
/// # Examples
///
/// ```
/// use blueprint_tex::NodeKind;
///
/// assert!(NodeKind::Label.is_annotation_marker());
/// assert!(NodeKind::Lean.is_annotation_marker());
/// assert!(!NodeKind::Text.is_annotation_marker());
/// assert_eq!(NodeKind::Statement.name(), "thmenv");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of the tree.
    Document,
    /// A paragraph wrapper around inline content.
    Paragraph,
    /// A run of literal text.
    Text,
    /// A statement environment (definition, theorem, lemma, ...).
    Statement,
    /// A proof environment.
    Proof,
    /// Any other environment, by name.
    Environment(String),
    /// `\label{...}`.
    Label,
    /// `\uses{...}`.
    Uses,
    /// `\lean{...}`, the Lean declaration marker.
    Lean,
    /// `\leanok`, the formalized marker.
    LeanOk,
    /// Any other macro, by name.
    Macro(String),
    /// A brace group `{...}`.
    Group,
}

impl NodeKind {
    /// Short name of the kind, as used in diagnostics.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph => "par",
            NodeKind::Text => "#text",
            NodeKind::Statement => "thmenv",
            NodeKind::Proof => "proof",
            NodeKind::Environment(name) | NodeKind::Macro(name) => name,
            NodeKind::Label => "label",
            NodeKind::Uses => "uses",
            NodeKind::Lean => "lean",
            NodeKind::LeanOk => "leanok",
            NodeKind::Group => "bgroup",
        }
    }

    /// Markers that carry blueprint metadata rather than body text.
    pub fn is_annotation_marker(&self) -> bool {
        matches!(
            self,
            NodeKind::Label | NodeKind::Uses | NodeKind::Lean | NodeKind::LeanOk
        )
    }
}

/// A value attached to a node by the annotation pass.
///
/// Node references point into the same [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Bool(bool),
    Int(i64),
    Text(String),
    Node(NodeId),
    List(Vec<Annotation>),
    Map(BTreeMap<String, Annotation>),
}

impl Annotation {
    /// The referenced node, if this is a node reference.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Annotation::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// The list items, if this is a list.
    pub fn as_list(&self) -> Option<&[Annotation]> {
        match self {
            Annotation::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Reserved annotation keys.
pub mod keys {
    /// Nodes a statement or proof depends on.
    pub const USES: &str = "uses";
    /// The proof attached to a statement.
    pub const PROVED_BY: &str = "proved_by";
    /// Back-reference from a proof to its statement.
    pub const PROVES: &str = "proves";
    /// Links to rendered Lean documentation.
    pub const LEAN_URLS: &str = "lean_urls";
    /// Lean declaration names from `\lean{...}`.
    pub const LEAN_DECLS: &str = "leandecls";
    /// Set by `\leanok`.
    pub const LEAN_OK: &str = "leanok";
    /// Set by `\notready`.
    pub const NOT_READY: &str = "notready";
    /// Set by `\mathlibok`.
    pub const MATHLIB_OK: &str = "mathlibok";
    /// Argument of `\discussion{...}`.
    pub const DISCUSSION: &str = "discussion";
}

/// A single node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Literal attribute values, e.g. `label` on label markers, `title` on statements.
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub annotations: BTreeMap<String, Annotation>,
    /// Source text covered by this node.
    pub source: String,
    /// Declared environment name; set on statement nodes.
    pub statement_type: Option<String>,
}

impl Node {
    /// A detached node of `kind` covering `source`.
    pub fn new(kind: NodeKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            annotations: BTreeMap::new(),
            source: source.into(),
            statement_type: None,
        }
    }

    /// A text run.
    pub fn text(source: impl Into<String>) -> Self {
        Self::new(NodeKind::Text, source)
    }

    /// A statement environment of type `statement_type`.
    pub fn statement(statement_type: impl Into<String>, source: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Statement, source);
        node.statement_type = Some(statement_type.into());
        node
    }

    /// A `\label{...}` marker.
    pub fn label(label: &str) -> Self {
        Self::new(NodeKind::Label, format!("\\label{{{label}}}")).with_attribute("label", label)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: Annotation) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Arena-backed document tree. Node `0` is always the root.
///
/// # Examples
///
/// ```
/// use blueprint_tex::{Document, Node, NodeKind};
///
/// let mut doc = Document::new();
/// let par = doc.append(doc.root(), Node::new(NodeKind::Paragraph, "Hello"));
/// doc.append(par, Node::text("Hello"));
/// assert_eq!(doc.len(), 3);
/// assert_eq!(doc.node(par).parent, Some(doc.root()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document, "")],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Attach `node` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this document.
    pub fn append(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "unknown parent {parent}");
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add a node that is not part of the tree, e.g. the target of a reference.
    pub fn detached(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Nearest strict ancestor of `id` matching `pred`.
    pub fn ancestor(&self, id: NodeId, pred: impl Fn(&Node) -> bool) -> Option<NodeId> {
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            let node = self.node(parent);
            if pred(node) {
                return Some(parent);
            }
            current = node.parent;
        }
        None
    }

    /// Short human-readable description used in error messages.
    pub fn describe(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(node) => match &node.statement_type {
                Some(ty) => format!("{id} ({ty})"),
                None => format!("{id} ({})", node.kind.name()),
            },
            None => format!("{id} (missing)"),
        }
    }
}

/// Iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.node(id).children.iter().rev().copied());
        Some(id)
    }
}
