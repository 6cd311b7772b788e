//! Book metadata extraction.
//!
//! All extractors are read-only walks over a parsed book file. A missing
//! declaration or facet is never an error; the extractors return empty
//! collections and callers skip the dependent steps.

use std::collections::HashMap;

use crate::ast::{locator, strip_quotes, SourceTree};

use super::{default_routes, AtomDefinition, BookMeta, RouteDefinition};

/// Name of the root book declaration.
pub const BOOK_DECL: &str = "atom_book";

/// Extracts the complete metadata model from a parsed book file.
/// Returns `None` when the file has no `atom_book` declaration.
pub fn extract_book(src: &SourceTree) -> Option<BookMeta> {
    let atoms = extract_atoms(src);
    if atoms.is_empty() && locator::find_declaration(src, BOOK_DECL).is_none() {
        return None;
    }
    let routes = extract_routes(src);
    Some(BookMeta { atoms, routes })
}

/// Extracts atom definitions in declaration order.
pub fn extract_atoms(src: &SourceTree) -> Vec<AtomDefinition> {
    let plurals = extract_plurals(src);
    let auth = extract_flag(src, "authenticate");
    atom_entries(src)
        .into_iter()
        .map(|(name, _)| AtomDefinition {
            plural: plurals.get(&name).cloned(),
            authenticate: auth.get(&name).copied().unwrap_or(false),
            name,
        })
        .collect()
}

/// Maps atom name to its explicitly declared `plural`, where present.
pub fn extract_plurals(src: &SourceTree) -> HashMap<String, String> {
    let mut plurals = HashMap::new();
    for (atom, value) in atom_entries(src) {
        if value.kind() != "object" {
            continue;
        }
        if let Some(plural) = locator::property_value(src, value, "plural") {
            if matches!(plural.kind(), "string" | "template_string") {
                plurals.insert(atom, strip_quotes(src.node_text(plural)).to_string());
            }
        }
    }
    plurals
}

/// Maps atom name to whether its definition sets `prop_name: true`.
pub fn extract_flag(src: &SourceTree, prop_name: &str) -> HashMap<String, bool> {
    let mut flags = HashMap::new();
    for (atom, value) in atom_entries(src) {
        if value.kind() != "object" {
            continue;
        }
        let flag = locator::property_value(src, value, prop_name)
            .map(|v| v.kind() == "true")
            .unwrap_or(false);
        flags.insert(atom, flag);
    }
    flags
}

/// Builds the merged route table per atom: the static default table,
/// with custom `dock.routes` entries merged in by name.
///
/// A custom entry only ever overrides `url`; `method` and `params` are
/// always taken from the default table. This asymmetry is inherited from
/// the original merge logic and kept for compatibility. Custom routes
/// with no default counterpart are appended as GET routes without
/// parameter metadata.
pub fn extract_routes(src: &SourceTree) -> HashMap<String, Vec<RouteDefinition>> {
    let mut by_atom = HashMap::new();
    for (atom, value) in atom_entries(src) {
        let mut merged = default_routes();
        for (route_name, url) in custom_routes(src, value) {
            match merged.iter_mut().find(|r| r.name == route_name) {
                Some(existing) => existing.url = url,
                None => merged.push(RouteDefinition {
                    name: route_name,
                    url,
                    method: super::HttpMethod::Get,
                    params: Default::default(),
                }),
            }
        }
        by_atom.insert(atom, merged);
    }
    by_atom
}

/// Parameter names embedded in a URL template as `:name` segments,
/// in appearance order.
pub fn url_params(url: &str) -> Vec<String> {
    let mut params = Vec::new();
    for segment in url.split('/') {
        if segment.contains(':') {
            let mut parts = segment.split(':');
            parts.next();
            if let Some(param) = parts.next() {
                params.push(param.to_string());
            }
        }
    }
    params
}

/// First-level atom entries of the book declaration.
fn atom_entries<'t>(
    src: &'t SourceTree,
) -> Vec<(String, tree_sitter::Node<'t>)> {
    let Some(decl) = locator::find_declaration(src, BOOK_DECL) else {
        return Vec::new();
    };
    let Some(object) = locator::declarator_object(decl) else {
        return Vec::new();
    };
    locator::object_entries(src, object)
}

/// Custom `(route_name, url)` pairs declared under `dock.routes`.
fn custom_routes(src: &SourceTree, atom_value: tree_sitter::Node) -> Vec<(String, String)> {
    let Some(routes) = locator::dock_routes(src, atom_value) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (route_name, route_value) in locator::object_entries(src, routes) {
        if route_value.kind() != "object" {
            continue;
        }
        if let Some(url) = locator::property_value(src, route_value, "url") {
            if matches!(url.kind(), "string" | "template_string") {
                out.push((route_name, strip_quotes(src.node_text(url)).to_string()));
            }
        }
    }
    out
}
