use blueprint_tex::{Document, NodeId};

/// Body text of a statement or proof node.
///
/// Concatenates the literal source of every grandchild of `id` (the content
/// of its paragraphs), leaving out `\label`, `\uses`, `\lean` and `\leanok`
/// markers, and trims the result.
///
/// # Examples
///
/// ```
/// use blueprint_graph::extract_text;
/// use blueprint_tex::{Document, Node, NodeKind};
///
/// let mut doc = Document::new();
/// let thm = doc.append(doc.root(), Node::statement("theorem", ""));
/// let par = doc.append(thm, Node::new(NodeKind::Paragraph, ""));
/// doc.append(par, Node::label("thm1"));
/// doc.append(par, Node::text("\n  Statement body.\n"));
///
/// assert_eq!(extract_text(&doc, thm), "Statement body.");
/// ```
pub fn extract_text(doc: &Document, id: NodeId) -> String {
    let Some(node) = doc.get(id) else {
        return String::new();
    };
    let mut text = String::new();
    for &child in &node.children {
        for &grandchild in &doc.node(child).children {
            let grandchild = doc.node(grandchild);
            if !grandchild.kind.is_annotation_marker() {
                text.push_str(&grandchild.source);
            }
        }
    }
    text.trim().to_string()
}
