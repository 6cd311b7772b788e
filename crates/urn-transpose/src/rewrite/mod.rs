//! Rewrite engine.
//!
//! Every operation takes a parsed [`SourceTree`](crate::ast::SourceTree)
//! and records splices into an [`Editor`](crate::ast::Editor); nothing
//! observes a tree mid-rewrite. Operations are no-ops when their expected
//! node shape is absent, so an evolving book schema skips rewrites
//! instead of crashing the pipeline.

mod books;
mod calls;
mod imports;

pub use books::{
    append_as_const, build_books, keep_only_property, prepend_spread, remove_property,
    rename_declaration, strip_type_annotation,
};
pub use calls::{inject_atom_arg, inject_atom_route_args, strip_call_config_property};
pub use imports::{
    load_aliases, rewrite_alias_imports, rewrite_dot_imports, rewrite_uranio_imports, AliasTable,
};

use tree_sitter::Node;

use crate::ast::Editor;

/// Deletes a list element together with its separating comma, preferring
/// the trailing comma and falling back to the leading one.
pub(crate) fn delete_with_separator(editor: &mut Editor, node: Node) {
    let mut start = node.start_byte();
    let mut end = node.end_byte();
    if let Some(next) = node.next_sibling() {
        if next.kind() == "," {
            end = next.end_byte();
            editor.delete(start, end);
            return;
        }
    }
    if let Some(prev) = node.prev_sibling() {
        if prev.kind() == "," {
            start = prev.start_byte();
        }
    }
    editor.delete(start, end);
}
