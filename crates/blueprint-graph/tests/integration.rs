//! Integration test: TeX sources on disk → statement records → JSON.

use std::fs;
use std::path::Path;

use blueprint_core::BlueprintConfig;
use serde_json::{json, Value};

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn make_blueprint() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "src/web.tex",
        "\\documentclass{report}\n\\begin{document}\n\\input{content}\n\\end{document}\n",
    );
    write(
        root,
        "src/content.tex",
        r"\chapter{Groups}

\begin{definition}[Group]
  \label{def:group}
  \lean{Group} \leanok
  A group is a monoid in which every element has an inverse.
\end{definition}

\begin{lemma}
  \label{lem:inv}
  \uses{def:group}
  Inverses are unique.
\end{lemma}

\begin{proof}
  \uses{def:group}
  \leanok
  Suppose $b$ and $c$ are inverses of $a$.
\end{proof}

\begin{theorem}
  \uses{lem:inv, def:group}
  Every group has exactly one identity.
\end{theorem}
",
    );
    dir
}

fn extract_json(root: &Path) -> Value {
    let records = blueprint_graph::extract(root, &BlueprintConfig::default()).unwrap();
    serde_json::to_value(records).unwrap()
}

#[test]
fn extracts_records_end_to_end() {
    let dir = make_blueprint();
    let json = extract_json(dir.path());
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 3);

    let def = &records[0];
    assert_eq!(def["stmt_type"], "definition");
    assert_eq!(def["label"], "def:group");
    assert_eq!(def["title"], "Group");
    assert_eq!(
        def["processed_text"],
        "A group is a monoid in which every element has an inverse."
    );
    assert_eq!(def["leanok"], true);
    assert_eq!(def["leandecls"], json!(["Group"]));
    assert!(def["raw_text"]
        .as_str()
        .unwrap()
        .starts_with("\\begin{definition}[Group]"));

    let lemma = &records[1];
    assert_eq!(lemma["uses"], json!(["def:group"]));
    assert_eq!(lemma["proof"]["uses"], json!(["def:group"]));
    assert_eq!(lemma["proof"]["leanok"], true);
    assert_eq!(
        lemma["proof"]["text"],
        "Suppose $b$ and $c$ are inverses of $a$."
    );

    let theorem = &records[2];
    assert!(theorem.get("label").is_none());
    assert_eq!(theorem["uses"], json!(["lem:inv", "def:group"]));
    assert!(theorem.get("proof").is_none());
}

#[test]
fn output_is_byte_identical_across_runs() {
    let dir = make_blueprint();
    let config = BlueprintConfig::default();
    let first = blueprint_graph::extract(dir.path(), &config).unwrap();
    let second = blueprint_graph::extract(dir.path(), &config).unwrap();
    assert_eq!(
        blueprint_graph::output::format_json(&first, false).unwrap(),
        blueprint_graph::output::format_json(&second, false).unwrap()
    );
}

#[test]
fn no_record_leaks_reserved_keys() {
    let dir = make_blueprint();
    let json = extract_json(dir.path());
    for record in json.as_array().unwrap() {
        for key in ["proved_by", "proves", "lean_urls"] {
            assert!(record.get(key).is_none());
            if let Some(proof) = record.get("proof") {
                assert!(proof.get(key).is_none());
            }
        }
    }
}

#[test]
fn missing_entry_file_is_input_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = blueprint_graph::extract(dir.path(), &BlueprintConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        blueprint_core::BlueprintError::InputNotFound { .. }
    ));
}

#[test]
fn newtheorem_environments_become_records() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "web.tex",
        "\\documentclass{report}\n\
         \\newtheorem{claim}{Claim}\n\
         \\newtheorem*{assumption}{Assumption}\n\
         \\begin{document}\n\
         \\begin{claim}\\label{c1} Claimed.\\end{claim}\n\n\
         \\begin{assumption}\\label{a1} Assumed.\\end{assumption}\n\n\
         \\begin{theorem}\\label{t}\\uses{c1, a1} Proved.\\end{theorem}\n\
         \\end{document}\n",
    );

    let json = extract_json(dir.path());
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["stmt_type"], "claim");
    assert_eq!(records[0]["label"], "c1");
    assert_eq!(records[0]["processed_text"], "Claimed.");
    assert_eq!(records[1]["stmt_type"], "assumption");
    assert_eq!(records[2]["uses"], json!(["c1", "a1"]));
}

#[test]
fn empty_label_does_not_shadow_real_one() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "web.tex",
        "\\begin{lemma}\\label{ }\\label{real} x\\end{lemma}\n",
    );

    let json = extract_json(dir.path());
    assert_eq!(json[0]["label"], "real");
}
