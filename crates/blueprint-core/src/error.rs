use std::path::PathBuf;

/// Errors that can occur while reading a blueprint and extracting its graph.
///
/// Library crates use this type directly; the binary converts to a
/// `miette` report at the boundary.
///
/// # Examples
///
/// ```
/// use blueprint_core::BlueprintError;
///
/// let err = BlueprintError::Config("unknown environment list".into());
/// assert!(err.to_string().contains("unknown environment list"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The TeX sources could not be turned into a document tree.
    #[error("parse error: {0}")]
    Parse(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A file referenced by the sources (e.g. via `\input`) does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The document entry point could not be located under the source root.
    #[error("{file} not found under {}", .root.display())]
    InputNotFound {
        /// File name that was searched for.
        file: String,
        /// Directory that was searched.
        root: PathBuf,
    },

    /// A statement node violates the document tree contract.
    #[error("malformed node {node}: {reason}")]
    MalformedNode {
        /// Human-readable description of the offending node.
        node: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl BlueprintError {
    /// Shorthand for building a [`BlueprintError::MalformedNode`].
    pub fn malformed(node: impl Into<String>, reason: impl Into<String>) -> Self {
        BlueprintError::MalformedNode {
            node: node.into(),
            reason: reason.into(),
        }
    }
}
