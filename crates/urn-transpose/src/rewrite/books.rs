//! Book declaration rewrites.
//!
//! These operate on the `atom_book` declaration (and its clones) while
//! splitting a book file into the per-concern books the generated repo
//! consumes.

use std::path::Path;

use tree_sitter::Node;

use super::{delete_with_separator, imports::rewrite_dot_imports};
use crate::ast::locator::{declarator_object, find_declaration, find_statement, object_pairs};
use crate::ast::{Editor, SourceTree};
use crate::diagnostic::TransposeError;

/// Deletes the explicit type annotation of a variable declarator,
/// `const b: Book = {...}` becoming `const b = {...}`.
pub fn strip_type_annotation(editor: &mut Editor, decl: Node) {
    if let Some(annotation) = decl.child_by_field_name("type") {
        editor.delete(annotation.start_byte(), annotation.end_byte());
    }
}

/// Drops every first-level property of the declarator's object except
/// the one nested under each atom entry named `keep`.
///
/// Book shape is two levels deep: the book object maps atom names to
/// atom definition objects, and `keep` selects within those definitions.
pub fn keep_only_property(src: &SourceTree, editor: &mut Editor, decl: Node, keep: &str) {
    let Some(book) = declarator_object(decl) else {
        return;
    };
    for (_, atom_pair) in object_pairs(src, book) {
        let Some(atom_value) = atom_pair.child_by_field_name("value") else {
            continue;
        };
        if atom_value.kind() != "object" {
            continue;
        }
        for (prop, pair) in object_pairs(src, atom_value) {
            if prop != keep {
                delete_with_separator(editor, pair);
            }
        }
    }
}

/// Removes one named property from each atom definition of the book.
pub fn remove_property(src: &SourceTree, editor: &mut Editor, decl: Node, prop: &str) {
    let Some(book) = declarator_object(decl) else {
        return;
    };
    for (_, atom_pair) in object_pairs(src, book) {
        let Some(atom_value) = atom_pair.child_by_field_name("value") else {
            continue;
        };
        if atom_value.kind() != "object" {
            continue;
        }
        for (name, pair) in object_pairs(src, atom_value) {
            if name == prop {
                delete_with_separator(editor, pair);
            }
        }
    }
}

/// Renames the declarator's identifier.
pub fn rename_declaration(editor: &mut Editor, decl: Node, new_name: &str) {
    if let Some(id) = decl.child_by_field_name("name") {
        editor.replace(id, new_name);
    }
}

/// Prepends a spread of the framework's required book right after the
/// opening brace of the declarator's object literal, so user entries
/// override the defaults.
pub fn prepend_spread(editor: &mut Editor, decl: Node, spread_expr: &str) {
    let Some(book) = declarator_object(decl) else {
        return;
    };
    editor.insert(book.start_byte() + 1, format!("\n\t...{spread_expr},"));
}

/// Appends ` as const` to the declaration so literal keys survive type
/// inference downstream.
pub fn append_as_const(editor: &mut Editor, decl: Node) {
    if let Some(value) = decl.child_by_field_name("value") {
        editor.insert(value.end_byte(), " as const");
    }
}

const BOOK_DECL: &str = "atom_book";

/// Splits a book file into the three per-concern declarations the
/// generated repo consumes.
///
/// The atom book keeps everything but `bll` and `api` and gains the
/// required-atoms spread; the `bll_book` and `api_book` clones each keep
/// only their namesake property. Relative imports are repointed one
/// level up into the copied source tree.
pub fn build_books(text: &str, path: &Path) -> Result<String, TransposeError> {
    let src = SourceTree::parse(text, path)?;
    let mut editor = Editor::new();
    rewrite_dot_imports(&src, &mut editor, "../src/");

    let Some(decl) = find_declaration(&src, BOOK_DECL) else {
        // Not a book after all. Leave the text untouched apart from the
        // import repointing the copied location requires.
        return Ok(src.print(editor));
    };
    let statement_text = find_statement(&src, BOOK_DECL)
        .map(|s| src.node_text(s).to_string())
        .unwrap_or_default();

    strip_type_annotation(&mut editor, decl);
    remove_property(&src, &mut editor, decl, "bll");
    remove_property(&src, &mut editor, decl, "api");
    prepend_spread(&mut editor, decl, "uranio.types.required_books.atom");
    append_as_const(&mut editor, decl);

    let mut output = src.print(editor);
    for (name, keep, spread) in [
        ("bll_book", "bll", "uranio.types.required_books.bll"),
        ("api_book", "api", "uranio.types.required_books.api"),
    ] {
        let clone = derive_book(&statement_text, path, name, keep, spread)?;
        output.push('\n');
        output.push_str(&clone);
        output.push('\n');
    }
    Ok(output)
}

fn derive_book(
    statement_text: &str,
    path: &Path,
    name: &str,
    keep: &str,
    spread: &str,
) -> Result<String, TransposeError> {
    let src = SourceTree::parse(statement_text, path)?;
    let mut editor = Editor::new();
    let Some(decl) = find_declaration(&src, BOOK_DECL) else {
        return Ok(String::new());
    };
    strip_type_annotation(&mut editor, decl);
    rename_declaration(&mut editor, decl, name);
    keep_only_property(&src, &mut editor, decl, keep);
    prepend_spread(&mut editor, decl, spread);
    append_as_const(&mut editor, decl);
    Ok(src.print(editor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("book.ts")
    }

    fn parse(text: &str) -> SourceTree {
        SourceTree::parse(text, &path()).unwrap()
    }

    #[test]
    fn strips_annotation_and_appends_as_const() {
        let src = parse("export const atom_book: uranio.types.Book = {\n\tproduct: {}\n};\n");
        let decl = find_declaration(&src, "atom_book").unwrap();
        let mut editor = Editor::new();
        strip_type_annotation(&mut editor, decl);
        append_as_const(&mut editor, decl);
        assert_eq!(
            src.print(editor),
            "export const atom_book = {\n\tproduct: {}\n} as const;\n"
        );
    }

    #[test]
    fn keep_only_drops_sibling_properties() {
        let src = parse(
            "const atom_book = {\n\tproduct: {\n\t\tbll: {},\n\t\tapi: {},\n\t\tsecurity: {}\n\t}\n};\n",
        );
        let decl = find_declaration(&src, "atom_book").unwrap();
        let mut editor = Editor::new();
        keep_only_property(&src, &mut editor, decl, "bll");
        let out = src.print(editor);
        assert!(out.contains("bll"));
        assert!(!out.contains("api"));
        assert!(!out.contains("security"));
    }

    #[test]
    fn remove_property_takes_trailing_comma() {
        let src = parse("const atom_book = {\n\tproduct: {\n\t\tapi: {},\n\t\tbll: {}\n\t}\n};\n");
        let decl = find_declaration(&src, "atom_book").unwrap();
        let mut editor = Editor::new();
        remove_property(&src, &mut editor, decl, "api");
        let out = src.print(editor);
        assert!(!out.contains("api"));
        assert!(out.contains("bll: {}"));
        assert_eq!(out.matches(',').count(), 0);
    }

    #[test]
    fn prepend_spread_lands_inside_the_brace() {
        let src = parse("const atom_book = {\n\tproduct: {}\n};\n");
        let decl = find_declaration(&src, "atom_book").unwrap();
        let mut editor = Editor::new();
        prepend_spread(&mut editor, decl, "uranio.types.required_books.atom");
        let out = src.print(editor);
        assert!(out.starts_with("const atom_book = {\n\t...uranio.types.required_books.atom,\n"));
    }

    #[test]
    fn build_books_emits_three_declarations() {
        let text = "import uranio from './uranio';\n\nexport const atom_book: uranio.types.Book = {\n\tproduct: {\n\t\tsecurity: {},\n\t\tbll: { class: () => ({}) },\n\t\tapi: { url: 'products' }\n\t}\n} as const;\n";
        // Input already carries `as const`, clones are derived from it.
        let text = text.replace(" as const;", ";");
        let out = build_books(&text, &path()).unwrap();
        assert!(out.contains("import uranio from '../src/uranio';"));
        assert!(out.contains("const atom_book = {"));
        assert!(out.contains("const bll_book = {"));
        assert!(out.contains("const api_book = {"));
        assert!(out.contains("...uranio.types.required_books.atom,"));
        assert!(out.contains("...uranio.types.required_books.bll,"));
        assert!(out.contains("...uranio.types.required_books.api,"));
        // The atom book keeps security while dropping bll and api.
        let atom_section = out.split("const bll_book").next().unwrap();
        assert!(atom_section.contains("security"));
        assert!(!atom_section.contains("bll:"));
        assert!(!atom_section.contains("api:"));
        // Each clone keeps only its namesake.
        let bll_section = out.split("const bll_book").nth(1).unwrap();
        let bll_section = bll_section.split("const api_book").next().unwrap();
        assert!(bll_section.contains("bll:"));
        assert!(!bll_section.contains("security"));
    }

    #[test]
    fn build_books_without_declaration_is_identity_plus_imports() {
        let text = "import x from './x';\nexport const other = 1;\n";
        let out = build_books(text, &path()).unwrap();
        assert_eq!(out, "import x from '../src/x';\nexport const other = 1;\n");
    }
}
