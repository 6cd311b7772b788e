use std::path::{Path, PathBuf};

use urn_transpose::{
    NullCompiler, NullReporter, Repo, Target, TransposeConfig, TransposeError, Transposer,
};

const BOOK: &str = "import uranio from 'uranio';\n\nexport const atom_book: uranio.types.Book = {\n\tproduct: {\n\t\tplural: 'products',\n\t\tbll: {},\n\t\tapi: {},\n\t\tdock: {\n\t\t\troutes: {\n\t\t\t\tbest_seller: {\n\t\t\t\t\turl: '/best/seller'\n\t\t\t\t}\n\t\t\t}\n\t\t}\n\t}\n};\n";

const ATOM_INDEX: &str = "import uranio from 'uranio';\n\nexport default uranio.register.atom({\n\tsecurity: {}\n});\n";

const ATOM_ROUTE: &str = "import uranio from 'uranio';\n\nexport default uranio.register.route({\n\turl: '/',\n\tcall: async () => true\n});\n";

const TSCONFIG: &str = "{\n\t\"compilerOptions\": {\n\t\t\"paths\": {\n\t\t\t\"books\": [\"src/books\"]\n\t\t}\n\t}\n}\n";

async fn write(path: &Path, text: &str) {
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(path, text).await.unwrap();
}

async fn scaffold(root: &Path) {
    write(&root.join("src/book.ts"), BOOK).await;
    write(&root.join("src/atoms/product/index.ts"), ATOM_INDEX).await;
    write(&root.join("src/atoms/product/routes/find.ts"), ATOM_ROUTE).await;
    write(&root.join(".uranio/server/tsconfig.json"), TSCONFIG).await;
    write(&root.join(".uranio/client/tsconfig.json"), TSCONFIG).await;
}

fn transposer(root: &Path) -> Transposer<'static> {
    static REPORTER: NullReporter = NullReporter;
    static COMPILER: NullCompiler = NullCompiler;
    Transposer::new(TransposeConfig::new(root, Repo::Trx), &REPORTER, &COMPILER)
}

async fn read(path: PathBuf) -> String {
    tokio::fs::read_to_string(path).await.unwrap()
}

#[tokio::test]
async fn whole_tree_transpose_writes_both_targets() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    scaffold(root).await;

    let t = transposer(root);
    t.transpose_all().await.unwrap();

    let server_index = read(root.join(".uranio/server/src/atoms/product/index.ts")).await;
    assert!(server_index.contains(", 'product');"));
    assert!(server_index.contains("import uranio from '../../uranio';"));

    let server_route = read(root.join(".uranio/server/src/atoms/product/routes/find.ts")).await;
    assert!(server_route.contains("'product', 'find');"));
    assert!(server_route.contains("call:"));

    // Client variant of a route must not carry the server callback.
    let client_route = read(root.join(".uranio/client/src/atoms/product/routes/find.ts")).await;
    assert!(client_route.contains("'product', 'find');"));
    assert!(!client_route.contains("call:"));

    // The book file splits into the three per-concern declarations.
    for target in ["server", "client"] {
        let books = read(root.join(format!(".uranio/{target}/src/books/index.ts"))).await;
        assert!(books.contains("const atom_book = {"));
        assert!(books.contains("const bll_book = {"));
        assert!(books.contains("const api_book = {"));
        assert!(books.contains(" as const"));
    }
}

#[tokio::test]
async fn hooks_land_in_both_targets() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    scaffold(root).await;

    let t = transposer(root);
    t.generate_hooks().await.unwrap();

    let server = read(t.config().hooks_file(Target::Server)).await;
    let client = read(t.config().hooks_file(Target::Client)).await;
    assert_eq!(server, client);
    assert!(server.contains("export const products = {"));
    // Custom dock route appears after the default table.
    assert!(server.contains("\tbest_seller: async"));
    let find = server.find("\tfind: async").unwrap();
    let best_seller = server.find("\tbest_seller: async").unwrap();
    assert!(find < best_seller);
}

#[tokio::test]
async fn unlink_removes_exactly_four_artifacts() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    scaffold(root).await;

    let t = transposer(root);
    t.transpose_all().await.unwrap();

    // The null compiler writes nothing, create the dist artifacts the
    // real compiler would have produced.
    for target in ["server", "client"] {
        write(&root.join(format!(".uranio/{target}/dist/atoms/product/routes/find.js")), "x").await;
        write(&root.join(format!(".uranio/{target}/dist/atoms/product/index.js")), "x").await;
    }

    t.transpose_unlink_file(&root.join("src/atoms/product/routes/find.ts"))
        .await
        .unwrap();

    for target in ["server", "client"] {
        assert!(!root
            .join(format!(".uranio/{target}/src/atoms/product/routes/find.ts"))
            .exists());
        assert!(!root
            .join(format!(".uranio/{target}/dist/atoms/product/routes/find.js"))
            .exists());
        // Sibling artifacts stay untouched.
        assert!(root
            .join(format!(".uranio/{target}/src/atoms/product/index.ts"))
            .exists());
        assert!(root
            .join(format!(".uranio/{target}/dist/atoms/product/index.js"))
            .exists());
    }
}

#[tokio::test]
async fn outside_root_is_skippable_and_mutates_nothing() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    scaffold(root).await;

    let t = transposer(root);
    let result = t.transpose_one(Path::new("/tmp/elsewhere/file.ts")).await;
    assert!(matches!(result, Err(TransposeError::OutsideRoot { .. })));
    assert!(!root.join(".uranio/server/src").exists());
}

#[tokio::test]
async fn alias_pass_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    scaffold(root).await;
    write(
        &root.join(".uranio/server/src/routes/web.ts"),
        "import {atoms} from 'books';\n",
    )
    .await;
    write(
        &root.join(".uranio/client/src/routes/web.ts"),
        "import {atoms} from 'books';\n",
    )
    .await;

    let t = transposer(root);
    t.replace_aliases().await.unwrap();
    let first = read(root.join(".uranio/server/src/routes/web.ts")).await;
    assert_eq!(first, "import {atoms} from '../books';\n");

    // A second pass sees only relative specifiers and changes nothing.
    t.replace_aliases().await.unwrap();
    let second = read(root.join(".uranio/server/src/routes/web.ts")).await;
    assert_eq!(first, second);
}
