use std::fmt::Write;

use blueprint_core::{BlueprintError, OutputFormat};

use crate::record::{StatementRecord, Uses};

/// Render `records` in the requested format.
///
/// `pretty` only affects JSON output.
///
/// # Errors
///
/// Returns [`BlueprintError::Serialization`] if JSON serialization fails.
pub fn format_records(
    records: &[StatementRecord],
    format: OutputFormat,
    pretty: bool,
) -> Result<String, BlueprintError> {
    match format {
        OutputFormat::Json => format_json(records, pretty),
        OutputFormat::Text => Ok(format_text(records)),
        OutputFormat::Markdown => Ok(format_markdown(records)),
    }
}

/// Serialize the records as a JSON array.
///
/// # Errors
///
/// Returns [`BlueprintError::Serialization`] if serialization fails.
///
/// # Examples
///
/// ```
/// use blueprint_graph::output::format_json;
///
/// assert_eq!(format_json(&[], false).unwrap(), "[]");
/// ```
pub fn format_json(records: &[StatementRecord], pretty: bool) -> Result<String, BlueprintError> {
    let json = if pretty {
        serde_json::to_string_pretty(records)?
    } else {
        serde_json::to_string(records)?
    };
    Ok(json)
}

/// One line per statement: type, label, dependencies, and proof dependencies.
///
/// # Examples
///
/// ```
/// use blueprint_graph::output::format_text;
///
/// assert!(format_text(&[]).is_empty());
/// ```
pub fn format_text(records: &[StatementRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let label = record.label.as_deref().unwrap_or("-");
        let _ = write!(out, "{} {label}", record.stmt_type);
        if let Some(uses) = &record.uses {
            let _ = write!(out, " uses: {}", join_uses(uses, ", "));
        }
        if let Some(proof) = &record.proof {
            out.push_str(" [proof");
            if let Some(uses) = &proof.uses {
                let _ = write!(out, " uses: {}", join_uses(uses, ", "));
            }
            out.push(']');
        }
        out.push('\n');
    }
    out
}

/// Markdown listing with one section per statement.
///
/// # Examples
///
/// ```
/// use blueprint_graph::output::format_markdown;
///
/// assert!(format_markdown(&[]).is_empty());
/// ```
pub fn format_markdown(records: &[StatementRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str("# Blueprint\n\n");

    for record in records {
        let _ = write!(out, "## {}", capitalize(&record.stmt_type));
        if let Some(label) = &record.label {
            let _ = write!(out, " `{label}`");
        }
        if let Some(title) = &record.title {
            let _ = write!(out, " ({title})");
        }
        out.push_str("\n\n");

        if !record.processed_text.is_empty() {
            let _ = writeln!(out, "{}\n", record.processed_text);
        }
        if let Some(uses) = record.uses.as_ref().filter(|uses| !uses.is_empty()) {
            let _ = writeln!(out, "- **Uses:** {}", code_list(uses));
        }
        if let Some(proof) = &record.proof {
            match proof.uses.as_ref().filter(|uses| !uses.is_empty()) {
                Some(uses) => {
                    let _ = writeln!(out, "- **Proof uses:** {}", code_list(uses));
                }
                None => out.push_str("- **Proof:** yes\n"),
            }
        }
        out.push('\n');
    }

    out
}

fn join_uses(uses: &Uses, sep: &str) -> String {
    uses.iter()
        .map(|label| label.as_deref().unwrap_or("?"))
        .collect::<Vec<_>>()
        .join(sep)
}

fn code_list(uses: &Uses) -> String {
    uses.iter()
        .map(|label| match label {
            Some(label) => format!("`{label}`"),
            None => "_unlabelled_".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
