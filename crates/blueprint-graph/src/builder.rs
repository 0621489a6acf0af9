use std::collections::BTreeMap;

use blueprint_core::BlueprintError;
use blueprint_tex::{keys, Annotation, Document, NodeId, NodeKind};
use serde_json::Value;
use tracing::debug;

use crate::label::resolve_label;
use crate::record::{
    annotation_value, ProofRecord, StatementRecord, Uses, PROOF_FIELDS, SCRUBBED_KEYS,
    STATEMENT_FIELDS,
};
use crate::text::extract_text;

/// Build one record per statement node under the document root, in document order.
///
/// # Errors
///
/// Returns [`BlueprintError::MalformedNode`] for a statement without a
/// statement type, or an annotation whose shape does not match its key.
///
/// # Examples
///
/// ```
/// use blueprint_graph::build_records;
/// use blueprint_tex::{Document, Node, NodeKind};
///
/// let mut doc = Document::new();
/// let thm = doc.append(doc.root(), Node::statement("theorem", "\\begin{theorem}...\\end{theorem}"));
/// let par = doc.append(thm, Node::new(NodeKind::Paragraph, ""));
/// doc.append(par, Node::label("thm1"));
/// doc.append(par, Node::text("Statement body."));
///
/// let records = build_records(&doc).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].label.as_deref(), Some("thm1"));
/// assert_eq!(records[0].processed_text, "Statement body.");
/// ```
pub fn build_records(doc: &Document) -> Result<Vec<StatementRecord>, BlueprintError> {
    build_records_from(doc, doc.root())
}

/// Like [`build_records`], starting from an arbitrary node.
///
/// # Errors
///
/// See [`build_records`].
pub fn build_records_from(
    doc: &Document,
    start: NodeId,
) -> Result<Vec<StatementRecord>, BlueprintError> {
    let mut records = Vec::new();
    let mut work = vec![start];

    while let Some(id) = work.pop() {
        let node = doc.get(id).ok_or_else(|| {
            BlueprintError::malformed(id.to_string(), "node is not in the document")
        })?;
        match node.kind {
            NodeKind::Statement => records.push(statement_record(doc, id)?),
            NodeKind::Document
            | NodeKind::Paragraph
            | NodeKind::Proof
            | NodeKind::Environment(_)
            | NodeKind::Group
            | NodeKind::Text
            | NodeKind::Label
            | NodeKind::Uses
            | NodeKind::Lean
            | NodeKind::LeanOk
            | NodeKind::Macro(_) => work.extend(node.children.iter().rev().copied()),
        }
    }

    Ok(records)
}

fn statement_record(doc: &Document, id: NodeId) -> Result<StatementRecord, BlueprintError> {
    let node = doc.node(id);
    let stmt_type = node
        .statement_type
        .clone()
        .ok_or_else(|| BlueprintError::malformed(doc.describe(id), "missing statement_type"))?;

    let title = node
        .attribute("title")
        .filter(|title| !title.is_empty())
        .map(String::from);

    let proof = match node.annotations.get(keys::PROVED_BY) {
        Some(Annotation::Node(proof)) if doc.contains(*proof) => {
            Some(proof_record(doc, *proof)?)
        }
        Some(_) => {
            return Err(BlueprintError::malformed(
                doc.describe(id),
                "`proved_by` is not a reference to a node in the document",
            ))
        }
        None => None,
    };

    Ok(StatementRecord {
        stmt_type,
        label: resolve_label(doc, id).map(String::from),
        processed_text: extract_text(doc, id),
        raw_text: node.source.clone(),
        title,
        uses: uses(doc, id)?,
        proof,
        annotations: forwarded(doc, id, STATEMENT_FIELDS),
    })
}

fn proof_record(doc: &Document, id: NodeId) -> Result<ProofRecord, BlueprintError> {
    let node = doc.node(id);
    Ok(ProofRecord {
        text: extract_text(doc, id),
        source: node.source.clone(),
        uses: uses(doc, id)?,
        annotations: forwarded(doc, id, PROOF_FIELDS),
    })
}

/// Labels of the nodes listed in the `uses` annotation of `id`.
fn uses(doc: &Document, id: NodeId) -> Result<Option<Uses>, BlueprintError> {
    let Some(annotation) = doc.node(id).annotations.get(keys::USES) else {
        return Ok(None);
    };
    let items = annotation
        .as_list()
        .ok_or_else(|| BlueprintError::malformed(doc.describe(id), "`uses` is not a list"))?;

    items
        .iter()
        .map(|item| {
            let target = item.as_node().ok_or_else(|| {
                BlueprintError::malformed(doc.describe(id), "`uses` entry is not a node reference")
            })?;
            let label = resolve_label(doc, target).map(String::from);
            if label.is_none() {
                debug!(
                    node = %doc.describe(id),
                    target = %doc.describe(target),
                    "dependency has no label"
                );
            }
            Ok(label)
        })
        .collect::<Result<Uses, _>>()
        .map(Some)
}

/// Annotations of `id` that pass through unchanged, minus the scrubbed keys
/// and the record's own field names.
fn forwarded(doc: &Document, id: NodeId, fields: &[&str]) -> BTreeMap<String, Value> {
    doc.node(id)
        .annotations
        .iter()
        .filter(|(key, _)| !SCRUBBED_KEYS.contains(&key.as_str()))
        .filter(|(key, _)| {
            let shadowed = fields.contains(&key.as_str());
            if shadowed && key.as_str() != keys::USES {
                debug!(
                    node = %doc.describe(id),
                    key = key.as_str(),
                    "annotation shadowed by record field"
                );
            }
            !shadowed
        })
        .map(|(key, value)| (key.clone(), annotation_value(doc, value)))
        .collect()
}
