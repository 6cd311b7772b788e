//! Pattern locator for the declarative shapes the transposer rewrites.
//!
//! Absence is never an error here: every lookup returns an `Option`, and
//! callers treat `None` as "skip this rewrite".

use tree_sitter::Node;

use super::{preorder, strip_quotes, SourceTree};

/// Finds the root-level variable declarator whose identifier equals
/// `name`. Only root statements (and root `export` statements) are
/// searched; the first match wins.
pub fn find_declaration<'t>(src: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    for statement in root_statements(src) {
        if let Some(decl) = declarator_of(statement) {
            if let Some(id) = decl.child_by_field_name("name") {
                if src.node_text(id) == name {
                    return Some(decl);
                }
            }
        }
    }
    None
}

/// Finds the whole root-level statement declaring `name`.
pub fn find_statement<'t>(src: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    for statement in root_statements(src) {
        if let Some(decl) = declarator_of(statement) {
            if let Some(id) = decl.child_by_field_name("name") {
                if src.node_text(id) == name {
                    return Some(statement);
                }
            }
        }
    }
    None
}

/// The initializer of a declarator, when it is an object literal.
pub fn declarator_object(decl: Node) -> Option<Node> {
    decl.child_by_field_name("value").filter(|v| v.kind() == "object")
}

/// First-level `key: value` entries of an object literal, in source
/// order. Quoted and bare keys resolve to the same logical name.
pub fn object_entries<'t>(src: &'t SourceTree, object: Node<'t>) -> Vec<(String, Node<'t>)> {
    let mut entries = Vec::new();
    let mut cursor = object.walk();
    for child in object.children(&mut cursor) {
        if child.kind() == "pair" {
            if let (Some(key), Some(value)) =
                (child.child_by_field_name("key"), child.child_by_field_name("value"))
            {
                entries.push((strip_quotes(src.node_text(key)).to_string(), value));
            }
        }
    }
    entries
}

/// The `pair` nodes of an object literal, keyed by logical name.
pub fn object_pairs<'t>(src: &'t SourceTree, object: Node<'t>) -> Vec<(String, Node<'t>)> {
    let mut pairs = Vec::new();
    let mut cursor = object.walk();
    for child in object.children(&mut cursor) {
        if child.kind() == "pair" {
            if let Some(key) = child.child_by_field_name("key") {
                pairs.push((strip_quotes(src.node_text(key)).to_string(), child));
            }
        }
    }
    pairs
}

/// Looks up one entry of an object literal by logical name.
pub fn property_value<'t>(src: &'t SourceTree, object: Node<'t>, name: &str) -> Option<Node<'t>> {
    object_entries(src, object)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Descends `atom_value -> dock -> routes` and returns the routes object
/// literal, if the atom declares custom routes.
pub fn dock_routes<'t>(src: &'t SourceTree, atom_value: Node<'t>) -> Option<Node<'t>> {
    if atom_value.kind() != "object" {
        return None;
    }
    let dock = property_value(src, atom_value, "dock").filter(|n| n.kind() == "object")?;
    property_value(src, dock, "routes").filter(|n| n.kind() == "object")
}

/// The registration call the orchestrator injects atom/route names
/// into. Atom and route modules register through their default export,
/// so a call under `export default` wins; a file without one falls back
/// to the first call (in source order) whose first argument is an
/// object literal.
pub fn find_registration_call<'t>(src: &'t SourceTree) -> Option<Node<'t>> {
    let root = src.root();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "export_statement" {
            if let Some(value) = child.child_by_field_name("value") {
                if let Some(call) = first_object_call(value) {
                    return Some(call);
                }
            }
        }
    }
    first_object_call(root)
}

/// First call expression under `node` whose first argument is an
/// object literal.
fn first_object_call(node: Node) -> Option<Node> {
    for node in preorder(node) {
        if node.kind() == "call_expression" {
            let args = call_arguments(node);
            if matches!(args.first(), Some(first) if first.kind() == "object") {
                return Some(node);
            }
        }
    }
    None
}

/// Positional arguments of a call expression, punctuation skipped.
pub fn call_arguments(call: Node) -> Vec<Node> {
    let mut out = Vec::new();
    if let Some(args) = call.child_by_field_name("arguments") {
        let mut cursor = args.walk();
        for child in args.children(&mut cursor) {
            if !matches!(child.kind(), "(" | ")" | ",") {
                out.push(child);
            }
        }
    }
    out
}

/// Root-level statements, looking through `export` wrappers.
fn root_statements<'t>(src: &'t SourceTree) -> Vec<Node<'t>> {
    let root = src.root();
    let mut statements = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "export_statement" {
            let mut inner = child.walk();
            for grandchild in child.children(&mut inner) {
                statements.push(grandchild);
            }
        } else {
            statements.push(child);
        }
    }
    statements
}

/// The variable declarator of a declaration statement, if any.
fn declarator_of(statement: Node) -> Option<Node> {
    if !matches!(statement.kind(), "lexical_declaration" | "variable_declaration") {
        return None;
    }
    let mut cursor = statement.walk();
    let declarator = statement
        .children(&mut cursor)
        .find(|c| c.kind() == "variable_declarator");
    declarator
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(text: &str) -> SourceTree {
        SourceTree::parse(text, &PathBuf::from("test.ts")).unwrap()
    }

    const BOOK: &str = r#"
import uranio from 'uranio';

export const atom_book = {
    user: {
        plural: 'users',
        authenticate: true,
        bll: { class: 'UserBll' },
        dock: {
            url: '/users',
            routes: {
                ping: { url: '/ping/:id', method: 'GET' }
            }
        }
    },
    'media': {
        api: { url: '/media' }
    }
};
"#;

    #[test]
    fn finds_root_level_declaration() {
        let src = parse(BOOK);
        let decl = find_declaration(&src, "atom_book").unwrap();
        assert_eq!(decl.kind(), "variable_declarator");
        assert!(declarator_object(decl).is_some());
    }

    #[test]
    fn missing_declaration_is_none() {
        let src = parse("const other_book = {};");
        assert!(find_declaration(&src, "atom_book").is_none());
    }

    #[test]
    fn nested_declaration_is_not_found() {
        let src = parse("function f() { const atom_book = {}; }");
        assert!(find_declaration(&src, "atom_book").is_none());
    }

    #[test]
    fn quoted_keys_resolve_to_bare_names() {
        let src = parse(BOOK);
        let decl = find_declaration(&src, "atom_book").unwrap();
        let object = declarator_object(decl).unwrap();
        let names: Vec<String> = object_entries(&src, object)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["user", "media"]);
    }

    #[test]
    fn descends_into_dock_routes() {
        let src = parse(BOOK);
        let decl = find_declaration(&src, "atom_book").unwrap();
        let object = declarator_object(decl).unwrap();
        let user = property_value(&src, object, "user").unwrap();
        let routes = dock_routes(&src, user).unwrap();
        let entries = object_entries(&src, routes);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "ping");
    }

    #[test]
    fn atom_without_dock_has_no_routes() {
        let src = parse(BOOK);
        let decl = find_declaration(&src, "atom_book").unwrap();
        let object = declarator_object(decl).unwrap();
        let media = property_value(&src, object, "media").unwrap();
        assert!(dock_routes(&src, media).is_none());
    }

    #[test]
    fn finds_registration_call_with_object_arg() {
        let src = parse("export default uranio.register.atom({ properties: {} });");
        let call = find_registration_call(&src).unwrap();
        assert_eq!(call_arguments(call).len(), 1);
    }

    #[test]
    fn default_export_call_wins_over_earlier_helper_calls() {
        let src = parse(
            "configure({level: 'debug'});\nexport default uranio.register.atom({\n\tsecurity: {}\n});\n",
        );
        let call = find_registration_call(&src).unwrap();
        let text = src.node_text(call);
        assert!(text.starts_with("uranio.register.atom"));
    }

    #[test]
    fn file_without_default_export_falls_back_to_first_call() {
        let src = parse("const r = uranio.register.route({url: '/'});\n");
        let call = find_registration_call(&src).unwrap();
        assert!(src.node_text(call).starts_with("uranio.register.route"));
    }

    #[test]
    fn call_without_object_arg_is_skipped() {
        let src = parse("console.log('hi');");
        assert!(find_registration_call(&src).is_none());
    }
}
