use std::path::{Path, PathBuf};

use blueprint_core::{BlueprintError, SourceConfig, CONFIG_FILE_NAME};
use tracing::{debug, info};

/// The fully spliced TeX of a blueprint, split at `\begin{document}`.
///
/// # Examples
///
/// ```
/// use blueprint_tex::source::BlueprintSource;
///
/// let src = BlueprintSource::from_text(
///     "\\dochome{https://example.org/docs}\n\\begin{document}\nHi\n\\end{document}",
/// );
/// assert_eq!(src.body.trim(), "Hi");
/// assert_eq!(src.preamble_arg("dochome").as_deref(), Some("https://example.org/docs"));
/// ```
#[derive(Debug, Clone)]
pub struct BlueprintSource {
    /// Everything before `\begin{document}`; empty when there is no such marker.
    pub preamble: String,
    /// Document body, or the whole text when there is no `\begin{document}`.
    pub body: String,
}

impl BlueprintSource {
    /// Split already comment-free, spliced text into preamble and body.
    pub fn from_text(text: &str) -> Self {
        const BEGIN: &str = "\\begin{document}";
        const END: &str = "\\end{document}";

        let Some(begin) = text.find(BEGIN) else {
            return Self {
                preamble: String::new(),
                body: text.to_string(),
            };
        };
        let body_start = begin + BEGIN.len();
        let body_end = text[body_start..]
            .find(END)
            .map_or(text.len(), |offset| body_start + offset);
        Self {
            preamble: text[..begin].to_string(),
            body: text[body_start..body_end].to_string(),
        }
    }

    /// Braced argument of the last `\name{...}` in the preamble.
    pub fn preamble_arg(&self, name: &str) -> Option<String> {
        let needle = format!("\\{name}{{");
        let start = self.preamble.rfind(&needle)? + needle.len();
        let end = self.preamble[start..].find('}')?;
        Some(self.preamble[start..start + end].trim().to_string())
    }

    /// Environment names declared with `\newtheorem{name}` or `\newtheorem*{name}`
    /// in the preamble, in declaration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use blueprint_tex::source::BlueprintSource;
    ///
    /// let src = BlueprintSource::from_text(
    ///     "\\newtheorem{claim}{Claim}\n\\newtheorem*{question}{Question}\n\\begin{document}\\end{document}",
    /// );
    /// assert_eq!(src.declared_theorems(), vec!["claim", "question"]);
    /// ```
    pub fn declared_theorems(&self) -> Vec<String> {
        const MACRO: &str = "\\newtheorem";

        let mut names = Vec::new();
        let mut rest = self.preamble.as_str();
        while let Some(offset) = rest.find(MACRO) {
            rest = &rest[offset + MACRO.len()..];
            if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
                // e.g. \newtheoremstyle
                continue;
            }
            let args = rest.strip_prefix('*').unwrap_or(rest).trim_start();
            let Some(inner) = args.strip_prefix('{') else {
                continue;
            };
            let Some(close) = inner.find('}') else {
                break;
            };
            let name = inner[..close].trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            rest = &inner[close + 1..];
        }
        names
    }
}

/// Find the first file called `name` under `root`, respecting `.gitignore`.
///
/// Entries are visited in path order so the result does not depend on the
/// file system's directory ordering.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use blueprint_tex::source::find_file;
///
/// if let Some(web) = find_file(Path::new("blueprint/src"), "web.tex") {
///     println!("{}", web.display());
/// }
/// ```
pub fn find_file(root: &Path, name: &str) -> Option<PathBuf> {
    let walker = ignore::WalkBuilder::new(root)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_file() && entry.file_name() == name {
            return Some(entry.into_path());
        }
    }
    None
}

/// Locate the document entry point (`web.tex` by default) under `root`.
///
/// # Errors
///
/// Returns [`BlueprintError::InputNotFound`] naming the file and `root`.
pub fn locate_entry(root: &Path, config: &SourceConfig) -> Result<PathBuf, BlueprintError> {
    find_file(root, &config.entry_file).ok_or_else(|| BlueprintError::InputNotFound {
        file: config.entry_file.clone(),
        root: root.to_path_buf(),
    })
}

/// Locate a `blueprint.toml` under `root`, if any.
pub fn locate_config(root: &Path) -> Option<PathBuf> {
    let found = find_file(root, CONFIG_FILE_NAME);
    if found.is_none() {
        info!("no {CONFIG_FILE_NAME} found under {}", root.display());
    }
    found
}

/// Read `entry`, strip comments, and splice `\input`/`\include` files.
///
/// Included paths are resolved against the entry file's directory, with
/// `.tex` appended when the name has no extension.
///
/// # Errors
///
/// Returns [`BlueprintError::FileNotFound`] for a missing included file,
/// [`BlueprintError::Parse`] when inclusion nests deeper than `max_depth`, and
/// [`BlueprintError::Io`] for read failures.
pub fn load(entry: &Path, max_depth: usize) -> Result<BlueprintSource, BlueprintError> {
    let base = entry.parent().unwrap_or_else(|| Path::new("."));
    let text = load_file(entry, base, max_depth, 0)?;
    Ok(BlueprintSource::from_text(&text))
}

fn load_file(
    path: &Path,
    base: &Path,
    max_depth: usize,
    depth: usize,
) -> Result<String, BlueprintError> {
    if depth > max_depth {
        return Err(BlueprintError::Parse(format!(
            "\\input nesting deeper than {max_depth} at {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(BlueprintError::FileNotFound(path.to_path_buf()));
    }
    debug!(path = %path.display(), depth, "reading TeX source");
    let raw = std::fs::read_to_string(path)?;
    let text = strip_comments(&raw);

    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some((before, target, after)) = next_inclusion(rest) {
        out.push_str(before);
        let included = resolve_include(base, target);
        out.push_str(&load_file(&included, base, max_depth, depth + 1)?);
        rest = after;
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_include(base: &Path, target: &str) -> PathBuf {
    let mut path = base.join(target.trim());
    if path.extension().is_none() {
        path.set_extension("tex");
    }
    path
}

/// Split `text` around the first `\input{...}` or `\include{...}`.
fn next_inclusion(text: &str) -> Option<(&str, &str, &str)> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('\\') {
        let start = search_from + offset;
        let after_slash = &text[start + 1..];
        let name_len = after_slash
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after_slash.len());
        let name = &after_slash[..name_len];

        if name == "input" || name == "include" {
            let args = after_slash[name_len..].trim_start_matches([' ', '\t']);
            if let Some(inner) = args.strip_prefix('{') {
                if let Some(close) = inner.find('}') {
                    return Some((&text[..start], &inner[..close], &inner[close + 1..]));
                }
            }
        }

        let step = if name_len > 0 {
            name_len
        } else {
            after_slash.chars().next().map_or(0, char::len_utf8)
        };
        search_from = start + 1 + step;
    }
    None
}

/// Remove `%` comments, keeping line breaks and escaped `\%`.
///
/// # Examples
///
/// ```
/// use blueprint_tex::source::strip_comments;
///
/// assert_eq!(strip_comments("a % note\nb 50\\% c"), "a \nb 50\\% c");
/// ```
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (content, newline) = match line.strip_suffix('\n') {
            Some(content) => (content, "\n"),
            None => (line, ""),
        };
        out.push_str(&content[..comment_start(content)]);
        out.push_str(newline);
    }
    out
}

fn comment_start(line: &str) -> usize {
    let mut backslashes = 0usize;
    for (idx, c) in line.char_indices() {
        match c {
            '\\' => backslashes += 1,
            '%' if backslashes % 2 == 0 => return idx,
            _ => backslashes = 0,
        }
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_blueprint() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("blueprint/src/chapters")).unwrap();
        fs::write(
            root.join("blueprint/src/web.tex"),
            "\\documentclass{report}\n\\dochome{https://example.org/docs}\n\\begin{document}\n\\input{content}\n\\end{document}\n",
        )
        .unwrap();
        fs::write(
            root.join("blueprint/src/content.tex"),
            "% the content\n\\include{chapters/one}\n",
        )
        .unwrap();
        fs::write(
            root.join("blueprint/src/chapters/one.tex"),
            "\\begin{lemma}\\label{lem:one} One. % todo\n\\end{lemma}\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn find_file_walks_subdirectories() {
        let dir = make_blueprint();
        let found = find_file(dir.path(), "web.tex").unwrap();
        assert!(found.ends_with("blueprint/src/web.tex"));
        assert!(find_file(dir.path(), "print.tex").is_none());
    }

    #[test]
    fn locate_entry_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_entry(dir.path(), &SourceConfig::default()).unwrap_err();
        match err {
            BlueprintError::InputNotFound { file, root } => {
                assert_eq!(file, "web.tex");
                assert_eq!(root, dir.path());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_splices_inputs_and_strips_comments() {
        let dir = make_blueprint();
        let entry = locate_entry(dir.path(), &SourceConfig::default()).unwrap();
        let src = load(&entry, 16).unwrap();
        assert!(src.body.contains("\\begin{lemma}\\label{lem:one} One. \n\\end{lemma}"));
        assert!(!src.body.contains("the content"));
        assert!(!src.body.contains("\\input"));
        assert_eq!(
            src.preamble_arg("dochome").as_deref(),
            Some("https://example.org/docs")
        );
    }

    #[test]
    fn load_reports_missing_include() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("web.tex");
        fs::write(&entry, "\\input{missing}").unwrap();
        let err = load(&entry, 16).unwrap_err();
        match err {
            BlueprintError::FileNotFound(path) => assert!(path.ends_with("missing.tex")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_rejects_runaway_inclusion() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("web.tex");
        fs::write(&entry, "\\input{web}").unwrap();
        let err = load(&entry, 3).unwrap_err();
        assert!(matches!(err, BlueprintError::Parse(_)));
    }

    #[test]
    fn includegraphics_is_not_an_inclusion() {
        assert!(next_inclusion("\\includegraphics{fig.png}").is_none());
        let (before, target, after) = next_inclusion("a \\input {b} c").unwrap();
        assert_eq!((before, target, after), ("a ", "b", " c"));
    }

    #[test]
    fn strip_comments_handles_escaped_backslashes() {
        assert_eq!(strip_comments("a\\\\% gone"), "a\\\\");
        assert_eq!(strip_comments("keep \\% this"), "keep \\% this");
        assert_eq!(strip_comments("% all\n% lines"), "\n");
    }

    #[test]
    fn declared_theorems_skip_other_macros() {
        let src = BlueprintSource::from_text(
            "\\newtheoremstyle{plain}{}\n\
             \\newtheorem{lemma}[theorem]{Lemma}\n\
             \\newtheorem* {assumption}{Assumption}\n\
             \\newtheorem{lemma}{Lemma again}\n\
             \\begin{document}\n\\newtheorem{late}{Late}\n\\end{document}",
        );
        assert_eq!(src.declared_theorems(), vec!["lemma", "assumption"]);
        assert!(BlueprintSource::from_text("no preamble").declared_theorems().is_empty());
    }

    #[test]
    fn source_without_document_markers_is_all_body() {
        let src = BlueprintSource::from_text("just text");
        assert!(src.preamble.is_empty());
        assert_eq!(src.body, "just text");
        assert!(src.preamble_arg("dochome").is_none());
    }
}
