//! AST access layer over tree-sitter.
//!
//! Parsing yields a [`SourceTree`]: the original text plus its concrete
//! syntax tree. Rewrites never mutate the tree; they record byte-range
//! splices in an [`Editor`], and printing applies the splices to the
//! original text. All raw-text manipulation in the crate goes through the
//! `Editor` so that ordering and overlap handling are verified in one
//! place.

pub mod locator;

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::diagnostic::TransposeError;

/// A parsed TypeScript source unit.
pub struct SourceTree {
    tree: Tree,
    text: String,
}

impl SourceTree {
    /// Parses TypeScript source text.
    pub fn parse(text: impl Into<String>, path: &Path) -> Result<Self, TransposeError> {
        let text = text.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .map_err(|_| TransposeError::ParserInitFailed)?;
        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| TransposeError::ParseFailed {
                path: path.to_path_buf(),
            })?;
        Ok(Self { tree, text })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source text covered by a node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.text.as_bytes()).unwrap_or("")
    }

    /// Applies recorded edits and returns the printed source.
    pub fn print(&self, editor: Editor) -> String {
        editor.apply(&self.text)
    }
}

/// One recorded splice.
#[derive(Debug, Clone)]
struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

/// Ordered collection of byte-range splices over one source unit.
///
/// Edits are applied back-to-front so recorded byte offsets stay valid.
/// Overlapping pure deletions merge into one span, since deleting two
/// adjacent list elements legitimately claims the shared separator
/// twice. Any other overlap is a programming error in the rewrite ops;
/// the later-starting edit wins and the overlapped one is dropped, so a
/// bad combination degrades instead of corrupting output.
#[derive(Debug, Default)]
pub struct Editor {
    edits: Vec<Edit>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Replaces the text of a node.
    pub fn replace(&mut self, node: Node, replacement: impl Into<String>) {
        self.replace_range(node.start_byte(), node.end_byte(), replacement);
    }

    /// Replaces an arbitrary byte range.
    pub fn replace_range(&mut self, start: usize, end: usize, replacement: impl Into<String>) {
        self.edits.push(Edit {
            start,
            end,
            replacement: replacement.into(),
        });
    }

    /// Inserts text at a byte offset.
    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.replace_range(at, at, text);
    }

    /// Deletes a byte range.
    pub fn delete(&mut self, start: usize, end: usize) {
        self.replace_range(start, end, "");
    }

    /// Deletes the text of a node.
    pub fn delete_node(&mut self, node: Node) {
        self.delete(node.start_byte(), node.end_byte());
    }

    /// Applies all edits to `text` and returns the result.
    pub fn apply(mut self, text: &str) -> String {
        // Pure insertions at the same offset keep insertion order.
        self.edits.sort_by_key(|e| (e.start, e.end));
        let mut merged: Vec<Edit> = Vec::with_capacity(self.edits.len());
        for edit in self.edits {
            if let Some(last) = merged.last_mut() {
                if last.replacement.is_empty()
                    && edit.replacement.is_empty()
                    && edit.start <= last.end
                {
                    last.end = last.end.max(edit.end);
                    continue;
                }
            }
            merged.push(edit);
        }
        let mut out = text.to_string();
        let mut boundary = usize::MAX;
        for edit in merged.iter().rev() {
            if edit.end > boundary || edit.end > out.len() {
                continue;
            }
            out.replace_range(edit.start..edit.end, &edit.replacement);
            boundary = edit.start;
        }
        out
    }
}

/// Strips one layer of matching quotes from a string/template literal.
pub fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if text.len() >= 2 {
        let (first, last) = (bytes[0], bytes[text.len() - 1]);
        if first == last && (first == b'"' || first == b'\'' || first == b'`') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Preorder traversal of a subtree, in source order.
pub fn preorder(root: Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    out
}
