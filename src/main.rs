use std::path::{Path, PathBuf};

use blueprint_core::{BlueprintConfig, BlueprintError, OutputFormat, CONFIG_FILE_NAME};
use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "blueprint",
    version,
    about = "Extract the statement dependency graph of a Lean blueprint",
    long_about = "Reads the TeX sources of a Lean blueprint and emits one record per\n\
                   statement (definition, lemma, theorem, ...) with its label, text,\n\
                   dependencies, and attached proof.\n\n\
                   Examples:\n  \
                     blueprint extract blueprint/src              Print JSON records to stdout\n  \
                     blueprint extract blueprint/src graph.json   Write records to a file\n  \
                     blueprint --format markdown extract .        Human-readable listing\n  \
                     blueprint init                               Write a default blueprint.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: blueprint.toml in the source tree)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (default: from config, else json)
    #[arg(
        long,
        global = true,
        long_help = "Output format for extracted records.\n\n\
                       Formats:\n  \
                         json      JSON array of statement records (default)\n  \
                         text      One line per statement\n  \
                         markdown  Markdown listing of statements and dependencies"
    )]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Extract statement records from a blueprint source directory
    #[command(long_about = "Extract statement records from a blueprint source directory.\n\n\
        Searches SOURCE_DIR for the entry file (web.tex by default), splices its\n\
        \\input files, and emits one record per statement environment in document\n\
        order. Records go to OUTPUT when given, else to stdout.\n\n\
        Examples:\n  blueprint extract blueprint/src\n  blueprint extract blueprint/src graph.json --pretty")]
    Extract {
        /// Directory containing the blueprint TeX sources
        source: PathBuf,

        /// Write records to this file instead of stdout
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Create a default blueprint.toml configuration file
    #[command(long_about = "Create a default blueprint.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if blueprint.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# Blueprint extraction configuration

[source]
# Entry point searched for under the source directory
# entry_file = "web.tex"
# Maximum nesting of \input / \include
# max_input_depth = 16

[environments]
# Environments extracted as statements
# statements = ["definition", "lemma", "theorem", "proposition", "corollary"]
# Environments treated as proofs
# proofs = ["proof"]

[lean]
# Base URL of the generated Lean documentation, used for lean_urls
# dochome = "https://example.org/docs"

[output]
# pretty = false
# format = "json"
"#;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// `--config`, else a `blueprint.toml` under `source`, else defaults.
fn load_config(explicit: Option<&Path>, source: &Path) -> Result<BlueprintConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => blueprint_tex::source::locate_config(source),
    };
    let Some(path) = path else {
        return Ok(BlueprintConfig::default());
    };
    info!(path = %path.display(), "loading configuration");
    BlueprintConfig::from_file(&path)
        .into_diagnostic()
        .wrap_err(format!("loading {}", path.display()))
}

fn extract(
    source: &Path,
    output: Option<&Path>,
    config: &BlueprintConfig,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    if !source.is_dir() {
        miette::bail!(miette::miette!(
            help = "pass the directory that contains web.tex, e.g. blueprint/src",
            "{} is not a directory",
            source.display()
        ));
    }

    let records = match blueprint_graph::extract(source, config) {
        Ok(records) => records,
        Err(err @ BlueprintError::InputNotFound { .. }) => {
            miette::bail!(miette::miette!(
                help = format!(
                    "set [source] entry_file in {CONFIG_FILE_NAME} if the blueprint uses another entry point"
                ),
                "{err}"
            ));
        }
        Err(err) => {
            return Err(err)
                .into_diagnostic()
                .wrap_err(format!("extracting {}", source.display()));
        }
    };
    debug!(records = records.len(), %format, "rendering records");

    let rendered =
        blueprint_graph::output::format_records(&records, format, pretty).into_diagnostic()?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .into_diagnostic()
                .wrap_err(format!("writing {}", path.display()))?;
            eprintln!("Wrote {} records to {}", records.len(), path.display());
        }
        None if rendered.is_empty() => {}
        None => println!("{}", rendered.trim_end_matches('\n')),
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Extract {
            ref source,
            ref output,
            pretty,
        } => {
            let config = load_config(cli.config.as_deref(), source)?;
            let format = cli.format.unwrap_or(config.output.format);
            extract(
                source,
                output.as_deref(),
                &config,
                format,
                pretty || config.output.pretty,
            )?;
        }
        Command::Init => {
            let path = Path::new(CONFIG_FILE_NAME);
            if path.exists() {
                miette::bail!(miette::miette!(
                    help = "edit the existing file or remove it first",
                    "{CONFIG_FILE_NAME} already exists"
                ));
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE_NAME} with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "blueprint", &mut std::io::stdout());
        }
    }

    Ok(())
}
