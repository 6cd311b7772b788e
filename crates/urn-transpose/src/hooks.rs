//! Hook source generation.
//!
//! Hooks are a brand-new file, not a transformed one, so this module
//! works by string templating over [`BookMeta`] and never touches the
//! AST layer. Output is deterministic for a given metadata model, atoms
//! in declaration order and routes in merged-table order, so a
//! regeneration without book changes is byte-identical.

use crate::book::{AtomDefinition, BookMeta, HttpMethod, RouteDefinition};

/// Generates the complete hooks source unit for one book.
pub fn generate(meta: &BookMeta) -> String {
    let mut text = String::new();
    text.push_str("/**\n");
    text.push_str(" * Autogenerated TRX Hooks module from uranio\n");
    text.push_str(" *\n");
    text.push_str(" * @packageDocumentation\n");
    text.push_str(" */\n");
    text.push('\n');
    text.push_str("import {urn_response} from 'urn-lib';\n");
    text.push('\n');
    text.push_str("import * as uranio from '../cln/main';\n");
    text.push('\n');
    text.push_str("let hook_token:string|undefined;\n");
    text.push_str("export function set_token(token:string):void{\n");
    text.push_str("\thook_token = token;\n");
    text.push_str("}\n\n");

    for atom in &meta.atoms {
        text.push_str(&format!("export const {} = {{\n", atom.plural_or_default()));
        if atom.authenticate {
            text.push_str(&authenticate_hook(&atom.name));
        }
        if atom.name == "media" {
            text.push_str(&upload_hook());
            text.push_str(&presigned_hook());
        }
        for route in meta.routes_of(&atom.name) {
            text.push_str(&route_hook(atom, route));
        }
        text.push_str("};\n");
    }
    text
}

fn route_hook(atom: &AtomDefinition, route: &RouteDefinition) -> String {
    let atom_name = &atom.name;
    let route_name = &route.name;
    let url_args = url_argument_list(route);
    let body_arg = if route.method == HttpMethod::Post {
        format!("body:uranio.types.Hook.Body<'{atom_name}', '{route_name}'>,\n\t\t")
    } else {
        String::new()
    };

    let mut text = String::new();
    text.push_str(&format!(
        "\t{route_name}: async <D extends uranio.types.Depth>(\n"
    ));
    text.push_str(&format!(
        "\t\t{url_args}{body_arg}options?:uranio.types.Hook.Arguments<'{atom_name}', '{route_name}', D>,\n"
    ));
    text.push_str("\t\ttoken?:string\n");
    text.push_str(&format!(
        "\t):Promise<uranio.types.Hook.Response<'{atom_name}', '{route_name}', D>>  => {{\n"
    ));
    text.push_str(&format!(
        "\t\tconst args:uranio.types.Hook.Arguments<'{atom_name}', '{route_name}', D> = {{\n"
    ));
    let param_lines = params_object_lines(route);
    if !param_lines.is_empty() {
        text.push_str("\t\t\tparams: {\n");
        for line in &param_lines {
            text.push_str(&format!("\t\t\t\t{line}\n"));
        }
        text.push_str("\t\t\t},\n");
    }
    if !body_arg.is_empty() {
        text.push_str("\t\t\tbody: body,\n");
    }
    text.push_str("\t\t\t...options\n");
    text.push_str("\t\t};\n");
    text.push_str("\t\tlet current_token:string|undefined;\n");
    text.push_str("\t\tif(typeof hook_token === 'string' && hook_token !== ''){\n");
    text.push_str("\t\t\tcurrent_token = hook_token;\n");
    text.push_str("\t\t}\n");
    text.push_str("\t\tif(typeof token === 'string' && token !== ''){\n");
    text.push_str("\t\t\tcurrent_token = token;\n");
    text.push_str("\t\t}\n");
    text.push_str(&format!(
        "\t\treturn await uranio.base.create('{atom_name}',current_token).hook<'{route_name}',D>('{route_name}')(args);\n"
    ));
    text.push_str("\t},\n");
    text
}

/// One `name:string,` (or `name:string[],`) per URL parameter, in URL
/// appearance order, indented for the signature position.
fn url_argument_list(route: &RouteDefinition) -> String {
    let mut out = String::new();
    for param in route.url_params() {
        let is_array = route.params.get(&param).map(|p| p.array).unwrap_or(false);
        let param_type = if is_array { "string[]" } else { "string" };
        out.push_str(&format!("{param}:{param_type},\n\t\t"));
    }
    out
}

/// Lines of the `params` sub-object, array parameters serialized with
/// a comma join.
fn params_object_lines(route: &RouteDefinition) -> Vec<String> {
    let mut lines = Vec::new();
    for param in route.url_params() {
        let is_array = route.params.get(&param).map(|p| p.array).unwrap_or(false);
        if is_array {
            lines.push(format!("{param}: {param}.join(',')"));
        } else {
            lines.push(format!("{param}: {param},"));
        }
    }
    lines
}

fn authenticate_hook(atom_name: &str) -> String {
    let mut text = String::new();
    text.push_str("\tauthenticate: async (\n");
    text.push_str("\t\temail: string,\n");
    text.push_str("\t\tpassword: string\n");
    text.push_str("\t): Promise<urn_response.General<uranio.types.Api.AuthResponse>> => {\n");
    text.push_str(&format!(
        "\t\treturn await uranio.auth.create('{atom_name}').authenticate(email, password);\n"
    ));
    text.push_str("\t},\n");
    text
}

fn upload_hook() -> String {
    let mut text = String::new();
    text.push_str("\tupload: async<D extends uranio.types.Depth>(\n");
    text.push_str("\t\tfile: Buffer | ArrayBuffer | Blob,\n");
    text.push_str("\t\ttoken?: string\n");
    text.push_str("\t): Promise<urn_response.General<uranio.types.Atom<'media'>>> => {\n");
    text.push_str("\t\tlet current_token: string | undefined;\n");
    text.push_str("\t\tif (typeof hook_token === \"string\" && hook_token !== \"\") {\n");
    text.push_str("\t\t\tcurrent_token = hook_token;\n");
    text.push_str("\t\t}\n");
    text.push_str("\t\tif (typeof token === \"string\" && token !== \"\") {\n");
    text.push_str("\t\t\tcurrent_token = token;\n");
    text.push_str("\t\t}\n");
    text.push_str(
        "\t\treturn await uranio.media.create(current_token).upload<D>(file, current_token);\n",
    );
    text.push_str("\t},\n");
    text
}

fn presigned_hook() -> String {
    let mut text = String::new();
    text.push_str("\tpresigned: async(\n");
    text.push_str("\t\tfilename: string,\n");
    text.push_str("\t\tsize?: number,\n");
    text.push_str("\t\ttype?: string,\n");
    text.push_str("\t\ttoken?: string\n");
    text.push_str("\t): Promise<urn_response.General<string>> => {\n");
    text.push_str("\t\tlet current_token: string | undefined;\n");
    text.push_str("\t\tif (typeof hook_token === \"string\" && hook_token !== \"\") {\n");
    text.push_str("\t\t\tcurrent_token = hook_token;\n");
    text.push_str("\t\t}\n");
    text.push_str("\t\tif (typeof token === \"string\" && token !== \"\") {\n");
    text.push_str("\t\t\tcurrent_token = token;\n");
    text.push_str("\t\t}\n");
    text.push_str(
        "\t\treturn await uranio.media.create(current_token).presigned(filename, size, type, current_token);\n",
    );
    text.push_str("\t},\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::default_routes;
    use std::collections::HashMap;

    fn meta(atoms: Vec<AtomDefinition>) -> BookMeta {
        let routes: HashMap<_, _> = atoms
            .iter()
            .map(|a| (a.name.clone(), default_routes()))
            .collect();
        BookMeta { atoms, routes }
    }

    fn atom(name: &str) -> AtomDefinition {
        AtomDefinition {
            name: name.to_string(),
            plural: None,
            authenticate: false,
        }
    }

    #[test]
    fn emits_one_binding_per_atom_in_declaration_order() {
        let text = generate(&meta(vec![atom("product"), atom("order")]));
        let products = text.find("export const products = {").unwrap();
        let orders = text.find("export const orders = {").unwrap();
        assert!(products < orders);
    }

    #[test]
    fn explicit_plural_wins_over_the_default() {
        let mut person = atom("person");
        person.plural = Some("people".to_string());
        let text = generate(&meta(vec![person]));
        assert!(text.contains("export const people = {"));
        assert!(!text.contains("export const persons"));
    }

    #[test]
    fn url_parameters_become_typed_arguments() {
        let text = generate(&meta(vec![atom("product")]));
        assert!(text.contains("\tfind_id: async <D extends uranio.types.Depth>(\n\t\tid:string,"));
        assert!(text.contains("ids:string[],"));
        assert!(text.contains("ids: ids.join(',')"));
    }

    #[test]
    fn post_routes_carry_a_body_argument() {
        let text = generate(&meta(vec![atom("product")]));
        assert!(text.contains("body:uranio.types.Hook.Body<'product', 'insert'>,"));
        assert!(text.contains("\t\t\tbody: body,\n"));
        // GET routes must not.
        let find = text.split("\tfind: async").nth(1).unwrap();
        let find = find.split("\tfind_id:").next().unwrap();
        assert!(!find.contains("body:"));
    }

    #[test]
    fn media_atom_gains_upload_and_presigned() {
        let text = generate(&meta(vec![atom("media"), atom("product")]));
        assert!(text.contains("\tupload: async<D extends uranio.types.Depth>("));
        assert!(text.contains("\tpresigned: async("));
        // Only under the media binding.
        let product_section = text.split("export const products").nth(1).unwrap();
        assert!(!product_section.contains("upload:"));
    }

    #[test]
    fn authenticate_flag_adds_the_login_hook() {
        let mut user = atom("user");
        user.authenticate = true;
        let text = generate(&meta(vec![user, atom("product")]));
        assert!(text.contains("\tauthenticate: async ("));
        assert!(text.contains("uranio.auth.create('user').authenticate(email, password);"));
        let product_section = text.split("export const products").nth(1).unwrap();
        assert!(!product_section.contains("authenticate:"));
    }

    #[test]
    fn regeneration_is_byte_identical() {
        let m = meta(vec![atom("media"), atom("product")]);
        assert_eq!(generate(&m), generate(&m));
    }
}
