//! Import specifier rewrites.
//!
//! Transposed files live in a different directory than the sources they
//! were copied from, so every specifier that named a path or an alias in
//! the working tree must be repointed at the generated tree.

use std::collections::BTreeMap;
use std::path::Path;

use tree_sitter::Node;

use crate::ast::{strip_quotes, Editor, SourceTree};
use crate::diagnostic::TransposeError;

/// Alias table from `compilerOptions.paths`, alias name to its target
/// path list. Only the first target of each alias is honored.
pub type AliasTable = BTreeMap<String, Vec<String>>;

/// Reads the alias table out of a tsconfig file. A tsconfig that cannot
/// be parsed is fatal for the whole run; a tsconfig without a `paths`
/// block yields an empty table.
pub fn load_aliases(tsconfig: &Path) -> Result<AliasTable, TransposeError> {
    let text = std::fs::read_to_string(tsconfig)
        .map_err(|err| TransposeError::io(tsconfig, err.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|err| TransposeError::TsconfigParse {
            path: tsconfig.to_path_buf(),
            message: err.to_string(),
        })?;
    match value.pointer("/compilerOptions/paths") {
        None => Ok(AliasTable::new()),
        Some(paths) => {
            serde_json::from_value(paths.clone()).map_err(|err| TransposeError::TsconfigParse {
                path: tsconfig.to_path_buf(),
                message: err.to_string(),
            })
        }
    }
}

/// Repoints `./`-relative imports by replacing the first `./` of each
/// import specifier with `prefix`. Used when a file is appended below a
/// tree copied one directory down.
pub fn rewrite_dot_imports(src: &SourceTree, editor: &mut Editor, prefix: &str) {
    for literal in import_sources(src) {
        let specifier = strip_quotes(src.node_text(literal));
        if let Some(rest) = specifier.strip_prefix("./") {
            editor.replace(literal, format!("'{prefix}{rest}'"));
        }
    }
}

/// Rewrites aliased imports to paths relative to the importing file.
///
/// An alias matches when the whole specifier, or its first `/`-separated
/// segment, appears in the table; trailing segments are carried over
/// unchanged. Returns whether any specifier was rewritten.
pub fn rewrite_alias_imports(
    src: &SourceTree,
    editor: &mut Editor,
    file_dir: &Path,
    alias_base: &Path,
    aliases: &AliasTable,
) -> bool {
    let mut found = false;
    for literal in import_sources(src) {
        let specifier = strip_quotes(src.node_text(literal)).to_string();
        let mut segments = specifier.splitn(2, '/');
        let head = segments.next().unwrap_or_default();
        let tail = segments.next();

        let (alias_name, module_append) = if aliases.contains_key(specifier.as_str()) {
            (specifier.as_str(), String::new())
        } else if aliases.contains_key(head) {
            (head, tail.map(|t| format!("/{t}")).unwrap_or_default())
        } else {
            continue;
        };
        let Some(alias) = aliases.get(alias_name).and_then(|targets| targets.first()) else {
            continue;
        };

        let relative = relative_specifier(&alias_base.join(alias), file_dir);
        // An alias target ending in `/` points at a directory, keep the
        // separator unless the whole thing collapsed to the index file.
        let append = if alias.ends_with('/') && relative != "./index" { "/" } else { "" };
        editor.replace(literal, format!("'{relative}{module_append}{append}'"));
        found = true;
    }
    found
}

/// Repoints imports of the framework entry (`uranio` or `uranio/<sub>`)
/// at the copied framework directory, relative to the importing file.
pub fn rewrite_uranio_imports(
    src: &SourceTree,
    editor: &mut Editor,
    file_dir: &Path,
    repo_dir: &Path,
) {
    for literal in import_sources(src) {
        let specifier = strip_quotes(src.node_text(literal)).to_string();
        let target = if specifier == "uranio" {
            repo_dir.to_path_buf()
        } else if let Some(sub) = specifier.strip_prefix("uranio/") {
            repo_dir.join(sub)
        } else {
            continue;
        };
        let relative = relative_specifier(&target, file_dir);
        editor.replace(literal, format!("'{relative}'"));
    }
}

fn relative_specifier(target: &Path, from: &Path) -> String {
    let relative = pathdiff::diff_paths(target, from)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    if relative.is_empty() {
        return String::from("./index");
    }
    if relative.starts_with('.') {
        relative
    } else {
        format!("./{relative}")
    }
}

/// String literals naming the source of each import statement and each
/// re-exporting export statement.
fn import_sources<'t>(src: &'t SourceTree) -> Vec<Node<'t>> {
    let root = src.root();
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if !matches!(child.kind(), "import_statement" | "export_statement") {
            continue;
        }
        if let Some(source) = child.child_by_field_name("source") {
            out.push(source);
        }
    }
    out
}
