//! Builds a [`Document`] tree from blueprint TeX.
//!
//! The reader understands just enough structure for dependency extraction:
//! paragraphs separated by blank lines, `\begin`/`\end` environments, brace
//! groups, and the blueprint markers (`\label`, `\uses`, `\lean`, `\leanok`).
//! Everything else is kept verbatim as text or generic macro nodes, so the
//! `source` of every node is an exact slice of the input.

use blueprint_core::{BlueprintError, EnvironmentConfig};
use tracing::warn;

use crate::document::{Document, Node, NodeId, NodeKind};

/// Parse comment-free TeX `text` into a document tree.
///
/// # Errors
///
/// Returns [`BlueprintError::Parse`] for unbalanced braces, mismatched or
/// unterminated environments, and `\begin`/`\end` without a name.
///
/// # Examples
///
/// ```
/// use blueprint_core::EnvironmentConfig;
/// use blueprint_tex::{reader::parse, NodeKind};
///
/// let doc = parse(
///     "\\begin{lemma}\\label{lem:a} Easy.\\end{lemma}",
///     &EnvironmentConfig::default(),
/// )
/// .unwrap();
/// let root = doc.node(doc.root());
/// assert_eq!(root.children.len(), 1);
/// assert_eq!(doc.node(root.children[0]).kind, NodeKind::Statement);
/// ```
pub fn parse(text: &str, envs: &EnvironmentConfig) -> Result<Document, BlueprintError> {
    let mut reader = Reader::new(text, envs);
    reader.run()?;
    Ok(reader.doc)
}

enum FrameKind {
    Root,
    Environment(String),
    Group,
}

struct Frame {
    node: NodeId,
    start: usize,
    kind: FrameKind,
    /// Open paragraph and its start offset. Never set on groups.
    paragraph: Option<(NodeId, usize)>,
    text_start: Option<usize>,
}

struct Reader<'a> {
    text: &'a str,
    pos: usize,
    envs: &'a EnvironmentConfig,
    doc: Document,
    frames: Vec<Frame>,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str, envs: &'a EnvironmentConfig) -> Self {
        let doc = Document::new();
        let root = Frame {
            node: doc.root(),
            start: 0,
            kind: FrameKind::Root,
            paragraph: None,
            text_start: None,
        };
        Self {
            text,
            pos: 0,
            envs,
            doc,
            frames: vec![root],
        }
    }

    fn run(&mut self) -> Result<(), BlueprintError> {
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.control_sequence()?,
                '{' => self.open_group(),
                '}' => self.close_group()?,
                '\n' if !self.in_group() && self.at_blank_line() => {
                    self.flush_text(self.pos);
                    self.close_paragraph(self.pos);
                    self.pos += 1;
                }
                c => self.consume_text(c.len_utf8()),
            }
        }

        let end = self.text.len();
        self.flush_text(end);
        self.close_paragraph(end);

        if let Some(frame) = self.frames.last() {
            let line = self.line_at(frame.start);
            match &frame.kind {
                FrameKind::Root => {}
                FrameKind::Environment(name) => {
                    return Err(BlueprintError::Parse(format!(
                        "unterminated \\begin{{{name}}} on line {line}"
                    )));
                }
                FrameKind::Group => {
                    return Err(BlueprintError::Parse(format!(
                        "unterminated `{{` on line {line}"
                    )));
                }
            }
        }

        let root = self.doc.root();
        self.doc.node_mut(root).source = self.text.to_string();
        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn line_at(&self, pos: usize) -> usize {
        self.text[..pos].matches('\n').count() + 1
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn in_group(&self) -> bool {
        matches!(self.top().kind, FrameKind::Group)
    }

    fn at_blank_line(&self) -> bool {
        let rest = &self.text[self.pos + 1..];
        for c in rest.chars() {
            match c {
                '\n' => return true,
                ' ' | '\t' | '\r' => continue,
                _ => return false,
            }
        }
        false
    }

    /// Node that inline content currently goes into, opening a paragraph at
    /// `at` when the innermost frame is a block.
    fn inline_parent(&mut self, at: usize) -> NodeId {
        let frame = self.top();
        if matches!(frame.kind, FrameKind::Group) {
            return frame.node;
        }
        if let Some((paragraph, _)) = frame.paragraph {
            return paragraph;
        }
        let parent = frame.node;
        let paragraph = self
            .doc
            .append(parent, Node::new(NodeKind::Paragraph, String::new()));
        self.top_mut().paragraph = Some((paragraph, at));
        paragraph
    }

    fn consume_text(&mut self, len: usize) {
        if self.top().text_start.is_none() {
            let starts_blank = self.text[self.pos..self.pos + len]
                .chars()
                .all(char::is_whitespace);
            let frame = self.top();
            if starts_blank && frame.paragraph.is_none() && !self.in_group() {
                self.pos += len;
                return;
            }
            self.inline_parent(self.pos);
            self.top_mut().text_start = Some(self.pos);
        }
        self.pos += len;
    }

    fn flush_text(&mut self, end: usize) {
        let Some(start) = self.top_mut().text_start.take() else {
            return;
        };
        if start < end {
            let parent = self.inline_parent(start);
            self.doc
                .append(parent, Node::text(&self.text[start..end]));
        }
    }

    fn close_paragraph(&mut self, end: usize) {
        if let Some((paragraph, start)) = self.top_mut().paragraph.take() {
            self.doc.node_mut(paragraph).source = self.text[start..end].to_string();
        }
    }

    fn open_group(&mut self) {
        self.flush_text(self.pos);
        let parent = self.inline_parent(self.pos);
        let node = self
            .doc
            .append(parent, Node::new(NodeKind::Group, String::new()));
        self.frames.push(Frame {
            node,
            start: self.pos,
            kind: FrameKind::Group,
            paragraph: None,
            text_start: None,
        });
        self.pos += 1;
    }

    fn close_group(&mut self) -> Result<(), BlueprintError> {
        self.flush_text(self.pos);
        let line = self.line_at(self.pos);
        match &self.top().kind {
            FrameKind::Group => {}
            FrameKind::Environment(name) => {
                return Err(BlueprintError::Parse(format!(
                    "unexpected `}}` on line {line} inside \\begin{{{name}}}"
                )));
            }
            FrameKind::Root => {
                return Err(BlueprintError::Parse(format!(
                    "unmatched `}}` on line {line}"
                )));
            }
        }
        self.pos += 1;
        if let Some(frame) = self.frames.pop() {
            self.doc.node_mut(frame.node).source = self.text[frame.start..self.pos].to_string();
        }
        Ok(())
    }

    fn control_sequence(&mut self) -> Result<(), BlueprintError> {
        let start = self.pos;
        let after = &self.text[start + 1..];
        let mut name_len = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());

        if name_len == 0 {
            // Control symbol such as `\\`, `\{` or `\[`: plain text.
            let symbol_len = after.chars().next().map_or(0, char::len_utf8);
            self.consume_text(1 + symbol_len);
            return Ok(());
        }
        if after[name_len..].starts_with('*') {
            name_len += 1;
        }
        let name = &after[..name_len];
        self.pos = start + 1 + name_len;

        match name {
            "begin" => self.begin_environment(start),
            "end" => self.end_environment(start),
            "label" | "uses" | "lean" => {
                self.marker(start, name);
                Ok(())
            }
            "leanok" => {
                self.flush_text(start);
                let parent = self.inline_parent(start);
                self.doc.append(
                    parent,
                    Node::new(NodeKind::LeanOk, &self.text[start..self.pos]),
                );
                Ok(())
            }
            _ => {
                self.generic_macro(start, name.to_string());
                Ok(())
            }
        }
    }

    fn marker(&mut self, start: usize, name: &str) {
        self.flush_text(start);
        let arg = match self.read_group_arg(true) {
            Ok(Some(arg)) => arg,
            _ => {
                warn!(
                    line = self.line_at(start),
                    "\\{name} without a braced argument; keeping it as a plain macro"
                );
                self.generic_macro(start, name.to_string());
                return;
            }
        };
        let (kind, attribute, value) = match name {
            "label" => (NodeKind::Label, "label", arg.trim().to_string()),
            "uses" => (NodeKind::Uses, "labels", arg),
            _ => (NodeKind::Lean, "decls", arg),
        };
        let parent = self.inline_parent(start);
        self.doc.append(
            parent,
            Node::new(kind, &self.text[start..self.pos]).with_attribute(attribute, value),
        );
    }

    fn generic_macro(&mut self, start: usize, name: String) {
        self.flush_text(start);
        let mut first_arg = None;
        loop {
            let before = self.pos;
            if let Some(Some(_)) = self.read_optional_arg(false) {
                continue;
            }
            self.pos = before;
            match self.read_group_arg(false) {
                Ok(Some(arg)) => {
                    first_arg.get_or_insert(arg);
                }
                _ => {
                    self.pos = before;
                    break;
                }
            }
        }
        let mut node = Node::new(NodeKind::Macro(name), &self.text[start..self.pos]);
        if let Some(arg) = first_arg {
            node = node.with_attribute("arg", arg);
        }
        let parent = self.inline_parent(start);
        self.doc.append(parent, node);
    }

    fn begin_environment(&mut self, start: usize) -> Result<(), BlueprintError> {
        let line = self.line_at(start);
        let name = self.read_group_arg(true)?.ok_or_else(|| {
            BlueprintError::Parse(format!("\\begin without an environment name on line {line}"))
        })?;
        let name = name.trim().to_string();

        if self.envs.is_math(&name) {
            return self.inline_environment(start, name);
        }

        self.flush_text(start);
        self.close_paragraph(start);

        let node = if self.envs.is_statement(&name) {
            Node::statement(name.clone(), String::new())
        } else if self.envs.is_proof(&name) {
            Node::new(NodeKind::Proof, String::new())
        } else {
            Node::new(NodeKind::Environment(name.clone()), String::new())
        };
        let node = if node.kind == NodeKind::Statement || node.kind == NodeKind::Proof {
            match self.read_optional_arg(true) {
                Some(Some(title)) => node.with_attribute("title", title),
                _ => node,
            }
        } else {
            node
        };

        let parent = self.top().node;
        let id = self.doc.append(parent, node);
        self.frames.push(Frame {
            node: id,
            start,
            kind: FrameKind::Environment(name),
            paragraph: None,
            text_start: None,
        });
        Ok(())
    }

    fn inline_environment(&mut self, start: usize, name: String) -> Result<(), BlueprintError> {
        let closing = format!("\\end{{{name}}}");
        let Some(offset) = self.text[self.pos..].find(&closing) else {
            return Err(BlueprintError::Parse(format!(
                "unterminated \\begin{{{name}}} on line {}",
                self.line_at(start)
            )));
        };
        self.flush_text(start);
        let end = self.pos + offset + closing.len();
        let parent = self.inline_parent(start);
        self.doc.append(
            parent,
            Node::new(NodeKind::Environment(name), &self.text[start..end]),
        );
        self.pos = end;
        Ok(())
    }

    fn end_environment(&mut self, start: usize) -> Result<(), BlueprintError> {
        let line = self.line_at(start);
        let name = self.read_group_arg(true)?.ok_or_else(|| {
            BlueprintError::Parse(format!("\\end without an environment name on line {line}"))
        })?;
        let name = name.trim();

        self.flush_text(start);
        self.close_paragraph(start);

        let frame = self.top();
        let opened_on = self.line_at(frame.start);
        match &frame.kind {
            FrameKind::Environment(open) if open == name => {}
            FrameKind::Environment(open) => {
                return Err(BlueprintError::Parse(format!(
                    "\\end{{{name}}} on line {line} does not match \\begin{{{open}}} on line {opened_on}"
                )));
            }
            FrameKind::Group => {
                return Err(BlueprintError::Parse(format!(
                    "\\end{{{name}}} on line {line} inside a group opened on line {opened_on}"
                )));
            }
            FrameKind::Root => {
                return Err(BlueprintError::Parse(format!(
                    "unexpected \\end{{{name}}} on line {line}"
                )));
            }
        }

        if let Some(frame) = self.frames.pop() {
            self.doc.node_mut(frame.node).source = self.text[frame.start..self.pos].to_string();
        }
        Ok(())
    }

    /// Read a `{...}` argument at the cursor. `Ok(None)` when there is none.
    fn read_group_arg(&mut self, skip_spaces: bool) -> Result<Option<String>, BlueprintError> {
        if skip_spaces {
            self.skip_inline_spaces();
        }
        if self.peek() != Some('{') {
            return Ok(None);
        }
        let open = self.pos;
        let Some(close) = matching_delimiter(self.text, open, '{', '}') else {
            return Err(BlueprintError::Parse(format!(
                "unterminated argument starting on line {}",
                self.line_at(open)
            )));
        };
        self.pos = close + 1;
        Ok(Some(self.text[open + 1..close].to_string()))
    }

    /// Read a `[...]` argument at the cursor. `None` when the cursor is not on
    /// a `[`, `Some(None)` when the bracket is never closed (left as text).
    fn read_optional_arg(&mut self, skip_spaces: bool) -> Option<Option<String>> {
        let before = self.pos;
        if skip_spaces {
            self.skip_inline_spaces();
        }
        if self.peek() != Some('[') {
            self.pos = before;
            return None;
        }
        let open = self.pos;
        match matching_delimiter(self.text, open, '[', ']') {
            Some(close) => {
                self.pos = close + 1;
                Some(Some(self.text[open + 1..close].to_string()))
            }
            None => {
                self.pos = before;
                Some(None)
            }
        }
    }

    fn skip_inline_spaces(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }
}

/// Byte offset of the delimiter closing the one at `open`, honouring nested
/// braces and backslash escapes.
fn matching_delimiter(text: &str, open: usize, left: char, right: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut braces = 0usize;
    let mut chars = text[open..].char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' if left != '{' => braces += 1,
            '}' if left != '{' => braces = braces.saturating_sub(1),
            c if c == left => depth += 1,
            c if c == right && braces == 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Document {
        parse(text, &EnvironmentConfig::default()).unwrap()
    }

    fn kinds(doc: &Document, id: NodeId) -> Vec<String> {
        doc.node(id)
            .children
            .iter()
            .map(|&c| doc.node(c).kind.name().to_string())
            .collect()
    }

    fn first_of(doc: &Document, kind: NodeKind) -> NodeId {
        doc.descendants(doc.root())
            .find(|&id| doc.node(id).kind == kind)
            .unwrap()
    }

    #[test]
    fn empty_input_has_only_root() {
        let doc = read("");
        assert!(doc.is_empty());
    }

    #[test]
    fn blank_lines_split_paragraphs() {
        let doc = read("First para.\n\nSecond para.\n");
        assert_eq!(kinds(&doc, doc.root()), vec!["par", "par"]);
        let second = doc.node(doc.root()).children[1];
        assert_eq!(doc.node(second).source, "Second para.\n");
    }

    #[test]
    fn statement_wraps_body_in_paragraph() {
        let text = "\\begin{theorem}\n  \\label{thm1}\n  Statement body.\n\\end{theorem}";
        let doc = read(text);
        let thm = doc.node(doc.root()).children[0];
        let node = doc.node(thm);
        assert_eq!(node.kind, NodeKind::Statement);
        assert_eq!(node.statement_type.as_deref(), Some("theorem"));
        assert_eq!(node.source, text);
        assert_eq!(kinds(&doc, thm), vec!["par"]);
        let par = node.children[0];
        assert_eq!(kinds(&doc, par), vec!["label", "#text"]);
        let label = doc.node(par).children[0];
        assert_eq!(doc.node(label).attribute("label"), Some("thm1"));
    }

    #[test]
    fn statement_title_is_kept_literally() {
        let doc = read("\\begin{theorem}[Smale $1958$]\nBody.\n\\end{theorem}");
        let thm = first_of(&doc, NodeKind::Statement);
        assert_eq!(doc.node(thm).attribute("title"), Some("Smale $1958$"));
    }

    #[test]
    fn unknown_environment_is_generic() {
        let doc = read("\\begin{center}\nHi\n\\end{center}");
        let env = doc.node(doc.root()).children[0];
        assert_eq!(
            doc.node(env).kind,
            NodeKind::Environment("center".to_string())
        );
    }

    #[test]
    fn proof_environment_is_recognized() {
        let doc = read("\\begin{proof}\n\\uses{a, b}\nQED.\n\\end{proof}");
        let proof = first_of(&doc, NodeKind::Proof);
        let uses = first_of(&doc, NodeKind::Uses);
        assert_eq!(doc.node(uses).attribute("labels"), Some("a, b"));
        assert_eq!(doc.ancestor(uses, |n| n.kind == NodeKind::Proof), Some(proof));
    }

    #[test]
    fn math_environment_stays_inline() {
        let doc = read("\\begin{lemma}\nWe have\n\\begin{align*} a &= b \\end{align*}\ndone.\n\\end{lemma}");
        let lemma = first_of(&doc, NodeKind::Statement);
        assert_eq!(kinds(&doc, lemma), vec!["par"]);
        let par = doc.node(lemma).children[0];
        assert_eq!(kinds(&doc, par), vec!["#text", "align*", "#text"]);
    }

    #[test]
    fn lean_markers_are_parsed() {
        let doc = read("\\lean{Foo.bar, Foo.baz}\\leanok text");
        let lean = first_of(&doc, NodeKind::Lean);
        assert_eq!(doc.node(lean).attribute("decls"), Some("Foo.bar, Foo.baz"));
        let leanok = first_of(&doc, NodeKind::LeanOk);
        assert_eq!(doc.node(leanok).source, "\\leanok");
    }

    #[test]
    fn generic_macro_captures_arguments() {
        let doc = read("See \\cite[p.~3]{knuth} here.");
        let cite = first_of(&doc, NodeKind::Macro("cite".into()));
        assert_eq!(doc.node(cite).source, "\\cite[p.~3]{knuth}");
        assert_eq!(doc.node(cite).attribute("arg"), Some("knuth"));
    }

    #[test]
    fn control_symbols_are_text() {
        let doc = read("50\\% of \\{x\\}");
        let par = doc.node(doc.root()).children[0];
        assert_eq!(kinds(&doc, par), vec!["#text"]);
        assert_eq!(doc.node(par).source, "50\\% of \\{x\\}");
    }

    #[test]
    fn groups_nest_inside_paragraphs() {
        let doc = read("a {b {c}} d");
        let par = doc.node(doc.root()).children[0];
        assert_eq!(kinds(&doc, par), vec!["#text", "bgroup", "#text"]);
        let group = doc.node(par).children[1];
        assert_eq!(doc.node(group).source, "{b {c}}");
    }

    #[test]
    fn nested_statement_inside_statement() {
        let doc = read("\\begin{theorem}\nA\n\\begin{proof}\\label{p}B\\end{proof}\n\\end{theorem}");
        let thm = first_of(&doc, NodeKind::Statement);
        assert_eq!(kinds(&doc, thm), vec!["par", "proof"]);
    }

    #[test]
    fn mismatched_end_is_an_error() {
        let err = parse(
            "\\begin{theorem}\nx\n\\end{lemma}",
            &EnvironmentConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BlueprintError::Parse(_)));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn unterminated_environment_is_an_error() {
        let err = parse("\\begin{theorem}\nx\n", &EnvironmentConfig::default()).unwrap_err();
        assert!(err.to_string().contains("unterminated \\begin{theorem}"));
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        assert!(parse("a } b", &EnvironmentConfig::default()).is_err());
        assert!(parse("a { b", &EnvironmentConfig::default()).is_err());
    }

    #[test]
    fn label_without_argument_degrades_to_macro() {
        let doc = read("\\label x");
        assert!(doc
            .descendants(doc.root())
            .all(|id| doc.node(id).kind != NodeKind::Label));
        first_of(&doc, NodeKind::Macro("label".into()));
    }

    #[test]
    fn matching_delimiter_skips_escapes_and_nested_braces() {
        assert_eq!(matching_delimiter("{a\\}b}", 0, '{', '}'), Some(5));
        assert_eq!(matching_delimiter("[a{]}b]", 0, '[', ']'), Some(6));
        assert_eq!(matching_delimiter("{open", 0, '{', '}'), None);
    }
}
