//! Registration call rewrites.
//!
//! Atom and route modules register themselves through a call whose first
//! argument is a config object. The working tree omits the atom and
//! route names, the transposer injects them from the file's location.

use tree_sitter::Node;

use super::delete_with_separator;
use crate::ast::locator::{call_arguments, object_pairs};
use crate::ast::{Editor, SourceTree};

/// Injects the atom name into a registration call from an atom index
/// module.
///
/// A call with only the config object gains the name as a second
/// argument; a call that already carries a second argument has it
/// replaced.
pub fn inject_atom_arg(editor: &mut Editor, call: Node, atom: &str) {
    let args = call_arguments(call);
    match args.len() {
        0 => {}
        1 => insert_before_close(editor, call, format!(", '{atom}'")),
        _ => editor.replace(args[1], format!("'{atom}'")),
    }
}

/// Injects atom and route names into a registration call from a route
/// module. Existing second and third arguments are replaced in place;
/// missing ones are appended.
pub fn inject_atom_route_args(editor: &mut Editor, call: Node, atom: &str, route: &str) {
    let args = call_arguments(call);
    match args.len() {
        0 => {}
        1 => insert_before_close(editor, call, format!(", '{atom}', '{route}'")),
        2 => {
            editor.replace(args[1], format!("'{atom}'"));
            insert_before_close(editor, call, format!(", '{route}'"));
        }
        _ => {
            editor.replace(args[1], format!("'{atom}'"));
            editor.replace(args[2], format!("'{route}'"));
        }
    }
}

/// Removes one named property from the call's config object. Used to
/// drop server-only handlers from client copies.
pub fn strip_call_config_property(src: &SourceTree, editor: &mut Editor, call: Node, prop: &str) {
    let args = call_arguments(call);
    let Some(config) = args.first().filter(|a| a.kind() == "object") else {
        return;
    };
    for (name, pair) in object_pairs(src, *config) {
        if name == prop {
            delete_with_separator(editor, pair);
        }
    }
}

fn insert_before_close(editor: &mut Editor, call: Node, text: String) {
    let Some(args) = call.child_by_field_name("arguments") else {
        return;
    };
    let mut cursor = args.walk();
    let close = args.children(&mut cursor).find(|c| c.kind() == ")");
    if let Some(close) = close {
        editor.insert(close.start_byte(), text);
    }
}
