//! Reading Lean blueprints written in TeX.
//!
//! Locates the blueprint entry file, splices `\input`/`\include` files, parses
//! the document body into an arena-backed [`Document`] tree, and runs the
//! annotation pass that attaches blueprint metadata (`uses`, `leanok`,
//! `proved_by`, ...) to statement and proof nodes.

pub mod annotate;
pub mod document;
pub mod reader;
pub mod source;

use std::path::Path;

use blueprint_core::{BlueprintConfig, BlueprintError, LeanConfig};
use tracing::{debug, info};

pub use document::{keys, Annotation, Document, Node, NodeId, NodeKind};

/// Read and annotate the blueprint found under `root`.
///
/// Environments declared with `\newtheorem` in the preamble are read as
/// statements alongside the configured ones. A `dochome` set in the
/// configuration takes precedence over a `\dochome{...}` declared in the
/// preamble.
///
/// # Errors
///
/// Returns [`BlueprintError::InputNotFound`] when the entry file is missing,
/// and I/O or parse errors from loading the sources.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use blueprint_core::BlueprintConfig;
/// use blueprint_tex::read_blueprint;
///
/// let doc = read_blueprint(Path::new("blueprint/src"), &BlueprintConfig::default()).unwrap();
/// println!("{} nodes", doc.len());
/// ```
pub fn read_blueprint(root: &Path, config: &BlueprintConfig) -> Result<Document, BlueprintError> {
    let entry = source::locate_entry(root, &config.source)?;
    info!(entry = %entry.display(), "reading blueprint");

    let src = source::load(&entry, config.source.max_input_depth)?;

    let mut environments = config.environments.clone();
    for name in src.declared_theorems() {
        if environments.declare_statement(&name) {
            debug!(environment = name.as_str(), "statement environment from \\newtheorem");
        }
    }
    let mut doc = reader::parse(&src.body, &environments)?;

    let lean = LeanConfig {
        dochome: config
            .lean
            .dochome
            .clone()
            .or_else(|| src.preamble_arg("dochome")),
    };
    let labels = annotate::annotate(&mut doc, &lean);
    info!(nodes = doc.len(), labels = labels.len(), "blueprint annotated");
    Ok(doc)
}
