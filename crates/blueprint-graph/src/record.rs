use std::collections::BTreeMap;

use blueprint_tex::{keys, Annotation, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::label::resolve_label;

/// Dependency list of a statement or proof, one entry per `\uses` reference.
///
/// An entry is `None` when the referenced node declares no label.
pub type Uses = Vec<Option<String>>;

/// One statement of the blueprint, flattened for downstream graph tools.
///
/// Forwarded annotations are serialized next to the fixed fields.
///
/// # Examples
///
/// ```
/// use blueprint_graph::StatementRecord;
///
/// let record = StatementRecord {
///     stmt_type: "lemma".into(),
///     label: None,
///     processed_text: "Easy.".into(),
///     raw_text: "\\begin{lemma}Easy.\\end{lemma}".into(),
///     title: None,
///     uses: None,
///     proof: None,
///     annotations: Default::default(),
/// };
/// let json = serde_json::to_value(&record).unwrap();
/// assert_eq!(json["stmt_type"], "lemma");
/// assert!(json.get("label").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub stmt_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub processed_text: String,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<Uses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofRecord>,
    /// Parser annotations forwarded as-is, e.g. `leanok` or `leandecls`.
    #[serde(flatten)]
    pub annotations: BTreeMap<String, Value>,
}

/// The proof attached to a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub text: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<Uses>,
    #[serde(flatten)]
    pub annotations: BTreeMap<String, Value>,
}

/// Field names of [`StatementRecord`]; annotations with these keys are not forwarded.
pub(crate) const STATEMENT_FIELDS: &[&str] = &[
    "stmt_type",
    "label",
    "processed_text",
    "raw_text",
    "title",
    keys::USES,
    "proof",
];

/// Field names of [`ProofRecord`].
pub(crate) const PROOF_FIELDS: &[&str] = &["text", "source", keys::USES];

/// Annotation keys that never reach a record.
pub(crate) const SCRUBBED_KEYS: &[&str] = &[keys::PROVED_BY, keys::PROVES, keys::LEAN_URLS];

/// Plain data form of an annotation value.
///
/// Node references become the label of the referenced node, or `null`.
pub(crate) fn annotation_value(doc: &Document, annotation: &Annotation) -> Value {
    match annotation {
        Annotation::Bool(b) => Value::Bool(*b),
        Annotation::Int(n) => Value::from(*n),
        Annotation::Text(s) => Value::String(s.clone()),
        Annotation::Node(id) => resolve_label(doc, *id).map_or(Value::Null, Value::from),
        Annotation::List(items) => items
            .iter()
            .map(|item| annotation_value(doc, item))
            .collect(),
        Annotation::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), annotation_value(doc, v)))
                .collect(),
        ),
    }
}
