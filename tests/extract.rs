use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn make_blueprint() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("blueprint/src");
    fs::create_dir_all(&src).unwrap();
    fs::write(
        src.join("web.tex"),
        "\\begin{document}\n\\input{content}\n\\end{document}\n",
    )
    .unwrap();
    fs::write(
        src.join("content.tex"),
        "\\begin{definition}\\label{def1} A thing. \\end{definition}\n\n\
         \\begin{theorem}\\label{thm1}\\uses{def1} Statement body.\\end{theorem}\n\n\
         \\begin{proof}\\uses{def1} QED.\\end{proof}\n",
    )
    .unwrap();
    dir
}

fn blueprint(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blueprint"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn extract_prints_json_to_stdout() {
    let dir = make_blueprint();
    let output = blueprint(&["extract", "."], dir.path());
    assert!(
        output.status.success(),
        "extract failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["label"], "def1");
    assert_eq!(records[1]["processed_text"], "Statement body.");
    assert_eq!(records[1]["uses"], serde_json::json!(["def1"]));
    assert_eq!(records[1]["proof"]["text"], "QED.");
}

#[test]
fn extract_writes_output_file() {
    let dir = make_blueprint();
    let output = blueprint(&["extract", "blueprint", "graph.json", "--pretty"], dir.path());
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let written = fs::read_to_string(dir.path().join("graph.json")).unwrap();
    assert!(written.contains('\n'));
    let records: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 2);
}

#[test]
fn extract_honours_format_flag() {
    let dir = make_blueprint();
    let output = blueprint(&["--format", "text", "extract", "."], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec!["definition def1", "theorem thm1 uses: def1 [proof uses: def1]"]
    );
}

#[test]
fn extract_reads_config_from_source_tree() {
    let dir = make_blueprint();
    fs::write(
        dir.path().join("blueprint/src/blueprint.toml"),
        "[environments]\nstatements = [\"theorem\"]\n\n[output]\nformat = \"markdown\"\n",
    )
    .unwrap();

    let output = blueprint(&["extract", "."], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# Blueprint"));
    assert!(stdout.contains("## Theorem `thm1`"));
    assert!(!stdout.contains("Definition"));
}

#[test]
fn empty_blueprint_prints_nothing_in_text_formats() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("web.tex"), "Just prose, no statements.\n").unwrap();

    for format in ["text", "markdown"] {
        let output = blueprint(&["--format", format, "extract", "."], dir.path());
        assert!(output.status.success());
        assert!(output.stdout.is_empty(), "{format} printed {:?}", output.stdout);
    }

    let output = blueprint(&["extract", "."], dir.path());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "[]\n");
}

#[test]
fn missing_entry_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = blueprint(&["extract", "."], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("web.tex"), "stderr: {stderr}");
}

#[test]
fn unbalanced_source_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("web.tex"), "\\begin{theorem}\nnever closed\n").unwrap();
    let output = blueprint(&["extract", "."], dir.path());
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
