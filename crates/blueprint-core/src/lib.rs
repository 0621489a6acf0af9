//! Core types, configuration, and error handling for blueprint extraction.
//!
//! This crate provides the shared foundation used by the other blueprint crates:
//! - [`BlueprintError`]: unified error type using `thiserror`
//! - [`BlueprintConfig`]: configuration loaded from `blueprint.toml`
//! - [`OutputFormat`]: how extracted records are rendered

mod config;
mod error;
mod types;

pub use config::{
    BlueprintConfig, EnvironmentConfig, LeanConfig, OutputConfig, SourceConfig, CONFIG_FILE_NAME,
};
pub use error::BlueprintError;
pub use types::OutputFormat;

/// A convenience `Result` type for blueprint operations.
pub type Result<T> = std::result::Result<T, BlueprintError>;
