//! Typed metadata model extracted from the atom book.
//!
//! Extraction produces these records once; everything downstream (rewrite
//! engine, hook generation) consumes them instead of re-walking the AST,
//! so a malformed book is caught at the extraction boundary.

pub mod extract;

use std::collections::BTreeMap;

/// HTTP method of a route. Only the three the default table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// Per-parameter metadata. Only the `array` flag exists today: an array
/// parameter is typed as `string[]` and serialized as `value.join(',')`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteParam {
    pub array: bool,
}

/// One HTTP-style operation available for an atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub name: String,
    pub url: String,
    pub method: HttpMethod,
    pub params: BTreeMap<String, RouteParam>,
}

impl RouteDefinition {
    fn new(name: &str, url: &str, method: HttpMethod) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            method,
            params: BTreeMap::new(),
        }
    }

    fn with_array_param(mut self, param: &str) -> Self {
        self.params.insert(param.to_string(), RouteParam { array: true });
        self
    }

    /// Parameter names of this route's URL, in appearance order.
    pub fn url_params(&self) -> Vec<String> {
        extract::url_params(&self.url)
    }
}

/// One entity type declared in the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomDefinition {
    pub name: String,
    /// Explicit `plural` property, if declared.
    pub plural: Option<String>,
    /// True when the atom definition carries `authenticate: true`.
    pub authenticate: bool,
}

impl AtomDefinition {
    /// The plural used for route segments and hook bindings;
    /// defaults to `name + "s"`.
    pub fn plural_or_default(&self) -> String {
        self.plural
            .clone()
            .unwrap_or_else(|| format!("{}s", self.name))
    }
}

/// Complete metadata of one book: atoms in declaration order, merged
/// route tables per atom (default-table order, then customs).
#[derive(Debug, Clone, Default)]
pub struct BookMeta {
    pub atoms: Vec<AtomDefinition>,
    pub routes: std::collections::HashMap<String, Vec<RouteDefinition>>,
}

impl BookMeta {
    pub fn routes_of(&self, atom: &str) -> &[RouteDefinition] {
        self.routes.get(atom).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The fixed default CRUD route table, in emission order.
pub fn default_routes() -> Vec<RouteDefinition> {
    use HttpMethod::*;
    vec![
        RouteDefinition::new("count", "/count", Get),
        RouteDefinition::new("find", "/", Get),
        RouteDefinition::new("find_id", "/:id", Get),
        RouteDefinition::new("find_one", "/", Get),
        RouteDefinition::new("insert", "/", Post),
        RouteDefinition::new("update", "/:id", Post),
        RouteDefinition::new("delete", "/:id", Delete),
        RouteDefinition::new("insert_multiple", "/multiple", Post),
        RouteDefinition::new("update_multiple", "/multiple/:ids", Post).with_array_param("ids"),
        RouteDefinition::new("delete_multiple", "/multiple/:ids", Delete).with_array_param("ids"),
    ]
}
