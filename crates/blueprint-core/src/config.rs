use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BlueprintError;

/// File name looked up in the blueprint source tree when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "blueprint.toml";

/// Top-level configuration loaded from `blueprint.toml`.
///
/// Supports layered resolution: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use blueprint_core::BlueprintConfig;
///
/// let config = BlueprintConfig::default();
/// assert_eq!(config.source.entry_file, "web.tex");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlueprintConfig {
    /// Where the TeX sources start and how far `\input` may nest.
    #[serde(default)]
    pub source: SourceConfig,
    /// Which environments count as statements, proofs, or inline math.
    #[serde(default)]
    pub environments: EnvironmentConfig,
    /// Lean documentation links.
    #[serde(default)]
    pub lean: LeanConfig,
    /// Output rendering settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl BlueprintConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Io`] if the file cannot be read, or
    /// [`BlueprintError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use blueprint_core::BlueprintConfig;
    /// use std::path::Path;
    ///
    /// let config = BlueprintConfig::from_file(Path::new("blueprint/src/blueprint.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, BlueprintError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Toml`] if parsing fails, or
    /// [`BlueprintError::Config`] if the values are inconsistent.
    ///
    /// # Examples
    ///
    /// ```
    /// use blueprint_core::BlueprintConfig;
    ///
    /// let toml = r#"
    /// [environments]
    /// statements = ["theorem", "lemma"]
    /// "#;
    /// let config = BlueprintConfig::from_toml(toml).unwrap();
    /// assert!(config.environments.is_statement("lemma"));
    /// assert!(!config.environments.is_statement("definition"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, BlueprintError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), BlueprintError> {
        if self.source.entry_file.trim().is_empty() {
            return Err(BlueprintError::Config(
                "source.entry_file must not be empty".into(),
            ));
        }
        if let Some(env) = self
            .environments
            .statements
            .iter()
            .find(|env| self.environments.proofs.contains(env))
        {
            return Err(BlueprintError::Config(format!(
                "environment `{env}` is listed both as a statement and as a proof"
            )));
        }
        Ok(())
    }
}

/// Location of the document entry point.
///
/// # Examples
///
/// ```
/// use blueprint_core::SourceConfig;
///
/// let config = SourceConfig::default();
/// assert_eq!(config.entry_file, "web.tex");
/// assert_eq!(config.max_input_depth, 16);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// File name of the entry point, searched for under the source root (default: `web.tex`).
    #[serde(default = "default_entry_file")]
    pub entry_file: String,
    /// Maximum nesting of `\input`/`\include` (default: 16).
    #[serde(default = "default_max_input_depth")]
    pub max_input_depth: usize,
}

fn default_entry_file() -> String {
    "web.tex".into()
}

fn default_max_input_depth() -> usize {
    16
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            entry_file: default_entry_file(),
            max_input_depth: default_max_input_depth(),
        }
    }
}

/// Environment classification used by the TeX reader.
///
/// # Examples
///
/// ```
/// use blueprint_core::EnvironmentConfig;
///
/// let config = EnvironmentConfig::default();
/// assert!(config.is_statement("theorem"));
/// assert!(config.is_proof("proof"));
/// assert!(config.is_math("align*"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Environments that produce a statement record.
    #[serde(default = "default_statements")]
    pub statements: Vec<String>,
    /// Environments that are proofs attached to a statement.
    #[serde(default = "default_proofs")]
    pub proofs: Vec<String>,
    /// Display-math environments kept inline within their paragraph.
    #[serde(default = "default_math")]
    pub math: Vec<String>,
}

fn default_statements() -> Vec<String> {
    [
        "definition",
        "lemma",
        "theorem",
        "proposition",
        "corollary",
        "conjecture",
        "remark",
        "example",
        "notation",
        "axiom",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_proofs() -> Vec<String> {
    vec!["proof".into()]
}

fn default_math() -> Vec<String> {
    [
        "equation",
        "equation*",
        "align",
        "align*",
        "gather",
        "gather*",
        "multline",
        "multline*",
        "displaymath",
        "eqnarray",
        "eqnarray*",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl EnvironmentConfig {
    /// Whether `name` is a statement environment.
    pub fn is_statement(&self, name: &str) -> bool {
        self.statements.iter().any(|s| s == name)
    }

    /// Whether `name` is a proof environment.
    pub fn is_proof(&self, name: &str) -> bool {
        self.proofs.iter().any(|s| s == name)
    }

    /// Whether `name` is a display-math environment.
    pub fn is_math(&self, name: &str) -> bool {
        self.math.iter().any(|s| s == name)
    }

    /// Register `name` as a statement environment, e.g. from `\newtheorem`.
    ///
    /// Returns `false` when `name` is already a statement or is a proof
    /// environment, which are left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use blueprint_core::EnvironmentConfig;
    ///
    /// let mut envs = EnvironmentConfig::default();
    /// assert!(envs.declare_statement("claim"));
    /// assert!(envs.is_statement("claim"));
    /// assert!(!envs.declare_statement("claim"));
    /// assert!(!envs.declare_statement("proof"));
    /// ```
    pub fn declare_statement(&mut self, name: &str) -> bool {
        if self.is_statement(name) || self.is_proof(name) {
            return false;
        }
        self.statements.push(name.to_string());
        true
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            statements: default_statements(),
            proofs: default_proofs(),
            math: default_math(),
        }
    }
}

/// Links from `\lean{...}` declarations to rendered documentation.
///
/// When `dochome` is unset no `lean_urls` annotation is produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeanConfig {
    /// Base URL of the project's generated documentation.
    pub dochome: Option<String>,
}

impl LeanConfig {
    /// Documentation URL for a fully qualified declaration name.
    ///
    /// # Examples
    ///
    /// ```
    /// use blueprint_core::LeanConfig;
    ///
    /// let config = LeanConfig { dochome: Some("https://example.org/docs/".into()) };
    /// assert_eq!(
    ///     config.decl_url("Foo.bar").as_deref(),
    ///     Some("https://example.org/docs/find/#doc/Foo.bar")
    /// );
    /// assert!(LeanConfig::default().decl_url("Foo.bar").is_none());
    /// ```
    pub fn decl_url(&self, decl: &str) -> Option<String> {
        let home = self.dochome.as_deref()?;
        Some(format!("{}/find/#doc/{decl}", home.trim_end_matches('/')))
    }
}

/// Output rendering configuration.
///
/// # Examples
///
/// ```
/// use blueprint_core::{OutputConfig, OutputFormat};
///
/// let config = OutputConfig::default();
/// assert!(!config.pretty);
/// assert_eq!(config.format, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON output (default: false).
    #[serde(default)]
    pub pretty: bool,
    /// Default output format when `--format` is not given (default: json).
    #[serde(default)]
    pub format: crate::types::OutputFormat,
}
