use blueprint_tex::{Document, NodeId, NodeKind};

/// First label declared in the subtree rooted at `id`.
///
/// The search is depth-first and left-to-right, and stops at the first
/// `\label` marker with a non-empty name. A node that is not part of `doc`
/// has no label.
///
/// # Examples
///
/// ```
/// use blueprint_graph::resolve_label;
/// use blueprint_tex::{Document, Node, NodeKind};
///
/// let mut doc = Document::new();
/// let thm = doc.append(doc.root(), Node::statement("theorem", ""));
/// let par = doc.append(thm, Node::new(NodeKind::Paragraph, ""));
/// doc.append(par, Node::label("thm:main"));
/// doc.append(par, Node::label("thm:alias"));
///
/// assert_eq!(resolve_label(&doc, thm), Some("thm:main"));
/// assert_eq!(resolve_label(&doc, doc.root()), Some("thm:main"));
/// ```
pub fn resolve_label(doc: &Document, id: NodeId) -> Option<&str> {
    if !doc.contains(id) {
        return None;
    }
    doc.descendants(id).find_map(|current| {
        let node = doc.node(current);
        match node.kind {
            NodeKind::Label => node.attribute("label").filter(|label| !label.is_empty()),
            _ => None,
        }
    })
}
