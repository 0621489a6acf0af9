//! Statement dependency graph extraction for Lean blueprints.
//!
//! Walks an annotated [`blueprint_tex::Document`] and produces one flat
//! [`StatementRecord`] per statement environment, with its label, body text,
//! dependencies, and attached proof. Three pieces compose the pass:
//! [`resolve_label`] finds the first label in a subtree, [`extract_text`]
//! rebuilds body text without blueprint markers, and [`build_records`] drives
//! the document-order walk.

pub mod builder;
pub mod label;
pub mod output;
pub mod record;
pub mod text;

use std::path::Path;

use blueprint_core::{BlueprintConfig, BlueprintError};
use tracing::info;

pub use builder::{build_records, build_records_from};
pub use label::resolve_label;
pub use record::{ProofRecord, StatementRecord, Uses};
pub use text::extract_text;

/// Read the blueprint under `root` and extract its statement records.
///
/// # Errors
///
/// Returns [`BlueprintError::InputNotFound`] when the entry file is missing,
/// parse errors from the TeX reader, and [`BlueprintError::MalformedNode`]
/// when the document breaks the record builder's assumptions.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use blueprint_core::BlueprintConfig;
///
/// let records = blueprint_graph::extract(Path::new("blueprint/src"), &BlueprintConfig::default()).unwrap();
/// for record in &records {
///     println!("{} {:?}", record.stmt_type, record.label);
/// }
/// ```
pub fn extract(root: &Path, config: &BlueprintConfig) -> Result<Vec<StatementRecord>, BlueprintError> {
    let doc = blueprint_tex::read_blueprint(root, config)?;
    let records = build_records(&doc)?;
    info!(statements = records.len(), "extracted statement records");
    Ok(records)
}
