//! Blueprint metadata pass.
//!
//! Turns the marker nodes left by the reader (`\uses`, `\lean`, `\leanok`,
//! `\notready`, `\mathlibok`, `\discussion`, `\proves`) into annotation maps on
//! the statement and proof nodes that own them, and links every proof to the
//! statement it proves.

use std::collections::{BTreeMap, HashMap};

use blueprint_core::LeanConfig;
use tracing::{debug, warn};

use crate::document::{keys, Annotation, Document, NodeId, NodeKind};

/// Label name to the node it identifies.
pub type LabelTable = HashMap<String, NodeId>;

/// Annotate `doc` in place and return its label table.
///
/// # Examples
///
/// ```
/// use blueprint_core::{EnvironmentConfig, LeanConfig};
/// use blueprint_tex::{annotate::annotate, keys, reader::parse, Annotation, NodeKind};
///
/// let mut doc = parse(
///     "\\begin{theorem}\\label{t}\\leanok T\\end{theorem}\n\\begin{proof}P\\end{proof}",
///     &EnvironmentConfig::default(),
/// )
/// .unwrap();
/// let labels = annotate(&mut doc, &LeanConfig::default());
/// let thm = labels["t"];
/// assert_eq!(doc.node(thm).annotations.get(keys::LEAN_OK), Some(&Annotation::Bool(true)));
/// let proof = doc.node(thm).annotations[keys::PROVED_BY].as_node().unwrap();
/// assert_eq!(doc.node(proof).kind, NodeKind::Proof);
/// ```
pub fn annotate(doc: &mut Document, lean: &LeanConfig) -> LabelTable {
    let labels = collect_labels(doc);

    let owners: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&id| is_owner(&doc.node(id).kind))
        .collect();

    let mut proves = HashMap::new();
    for &owner in &owners {
        let markers = owned_markers(doc, owner);
        let mut annotations = BTreeMap::new();
        let mut uses = Vec::new();
        let mut has_uses = false;
        let mut decls = Vec::new();

        for marker in markers {
            let node = doc.node(marker);
            match &node.kind {
                NodeKind::Uses => {
                    has_uses = true;
                    for label in split_list(node.attribute("labels").unwrap_or_default()) {
                        match labels.get(label) {
                            Some(&target) => uses.push(Annotation::Node(target)),
                            None => warn!(label, "\\uses refers to an unknown label"),
                        }
                    }
                }
                NodeKind::Lean => {
                    decls.extend(
                        split_list(node.attribute("decls").unwrap_or_default())
                            .map(String::from),
                    );
                }
                NodeKind::LeanOk => {
                    annotations.insert(keys::LEAN_OK.to_string(), Annotation::Bool(true));
                }
                NodeKind::Macro(name) => match name.as_str() {
                    "notready" => {
                        annotations.insert(keys::NOT_READY.to_string(), Annotation::Bool(true));
                    }
                    "mathlibok" => {
                        annotations.insert(keys::MATHLIB_OK.to_string(), Annotation::Bool(true));
                        annotations.insert(keys::LEAN_OK.to_string(), Annotation::Bool(true));
                    }
                    "discussion" => {
                        if let Some(issue) = node.attribute("arg") {
                            annotations.insert(
                                keys::DISCUSSION.to_string(),
                                Annotation::Text(issue.trim().to_string()),
                            );
                        }
                    }
                    "proves" => {
                        if let Some(label) = node.attribute("arg") {
                            proves.insert(owner, label.trim().to_string());
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        if has_uses {
            annotations.insert(keys::USES.to_string(), Annotation::List(uses));
        }
        if !decls.is_empty() {
            let urls: Vec<Annotation> = decls
                .iter()
                .filter_map(|decl| {
                    let url = lean.decl_url(decl)?;
                    Some(Annotation::List(vec![
                        Annotation::Text(decl.clone()),
                        Annotation::Text(url),
                    ]))
                })
                .collect();
            if !urls.is_empty() {
                annotations.insert(keys::LEAN_URLS.to_string(), Annotation::List(urls));
            }
            annotations.insert(
                keys::LEAN_DECLS.to_string(),
                Annotation::List(decls.into_iter().map(Annotation::Text).collect()),
            );
        }

        doc.node_mut(owner).annotations.extend(annotations);
    }

    attach_proofs(doc, &owners, &labels, &proves);
    labels
}

fn is_owner(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Statement | NodeKind::Proof)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Map each label to the nearest enclosing environment, or to the marker itself.
fn collect_labels(doc: &Document) -> LabelTable {
    let mut labels = LabelTable::new();
    for id in doc.descendants(doc.root()) {
        let node = doc.node(id);
        if node.kind != NodeKind::Label {
            continue;
        }
        let Some(label) = node.attribute("label").filter(|label| !label.is_empty()) else {
            continue;
        };
        let target = doc
            .ancestor(id, |n| {
                matches!(
                    n.kind,
                    NodeKind::Statement | NodeKind::Proof | NodeKind::Environment(_)
                )
            })
            .unwrap_or(id);
        if labels.contains_key(label) {
            warn!(label, "duplicate label; keeping the first definition");
            continue;
        }
        labels.insert(label.to_string(), target);
    }
    labels
}

/// Marker nodes in `owner`'s subtree, without entering nested statements or proofs.
fn owned_markers(doc: &Document, owner: NodeId) -> Vec<NodeId> {
    let mut markers = Vec::new();
    let mut stack: Vec<NodeId> = doc.node(owner).children.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let node = doc.node(id);
        if is_owner(&node.kind) {
            continue;
        }
        if node.kind.is_annotation_marker() || matches!(node.kind, NodeKind::Macro(_)) {
            markers.push(id);
        }
        stack.extend(node.children.iter().rev().copied());
    }
    markers
}

fn attach_proofs(
    doc: &mut Document,
    owners: &[NodeId],
    labels: &LabelTable,
    proves: &HashMap<NodeId, String>,
) {
    let mut last_statement = None;
    for &id in owners {
        if doc.node(id).kind == NodeKind::Statement {
            last_statement = Some(id);
            continue;
        }

        let explicit = proves.get(&id).and_then(|label| {
            let target = labels
                .get(label)
                .copied()
                .filter(|&t| doc.node(t).kind == NodeKind::Statement);
            if target.is_none() {
                warn!(label = label.as_str(), "\\proves does not name a statement");
            }
            target
        });
        let Some(statement) = explicit.or(last_statement) else {
            warn!(proof = %id, "proof without a preceding statement");
            continue;
        };

        if doc.node(statement).annotations.contains_key(keys::PROVED_BY) {
            warn!(
                statement = %doc.describe(statement),
                "statement already has a proof; ignoring {}",
                doc.describe(id)
            );
            continue;
        }
        debug!(statement = %statement, proof = %id, "attaching proof");
        doc.node_mut(statement)
            .annotations
            .insert(keys::PROVED_BY.to_string(), Annotation::Node(id));
        doc.node_mut(id)
            .annotations
            .insert(keys::PROVES.to_string(), Annotation::Node(statement));
    }
}
