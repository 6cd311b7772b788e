//! Transposition orchestrator.
//!
//! Per-file pipeline: classify the path, parse once per target, apply
//! the rewrites that target needs, write the variant and hand it to the
//! compiler. Each file's pipeline is strictly sequential; sibling files
//! of a whole-tree pass run concurrently since they read and write
//! disjoint paths.

pub mod watch;

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use futures::future::join_all;

use crate::ast::locator::find_registration_call;
use crate::ast::{Editor, SourceTree};
use crate::book::extract::extract_book;
use crate::compile::TargetCompiler;
use crate::config::{Target, TransposeConfig};
use crate::diagnostic::TransposeError;
use crate::hooks;
use crate::report::Reporter;
use crate::rewrite;

/// What kind of rewrite a source path receives. First match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileClass {
    /// The book file, split into per-concern books.
    Book,
    /// `atoms/<atom>/index.ts`, receives the atom-name injection.
    AtomIndex { atom: String },
    /// `atoms/<atom>/routes/<route>.ts`, deploy repos only.
    AtomRoute { atom: String, route: String },
    /// Copied to both targets unchanged.
    Generic,
    /// VCS metadata and editor swap files.
    Ignored,
}

/// Drives the whole per-file and whole-tree transposition.
pub struct Transposer<'a> {
    config: TransposeConfig,
    reporter: &'a dyn Reporter,
    compiler: &'a dyn TargetCompiler,
}

impl<'a> Transposer<'a> {
    pub fn new(
        config: TransposeConfig,
        reporter: &'a dyn Reporter,
        compiler: &'a dyn TargetCompiler,
    ) -> Self {
        Self {
            config,
            reporter,
            compiler,
        }
    }

    pub fn config(&self) -> &TransposeConfig {
        &self.config
    }

    /// Validates and classifies a source path.
    ///
    /// Empty paths are fatal, paths outside the source root are an
    /// error the caller skips, VCS metadata and swap files classify as
    /// [`FileClass::Ignored`].
    pub fn classify(&self, path: &Path) -> Result<FileClass, TransposeError> {
        if path.as_os_str().is_empty() {
            return Err(TransposeError::EmptyPath);
        }
        if path.components().any(|c| c.as_os_str() == ".git") {
            return Ok(FileClass::Ignored);
        }
        if is_swap_file(path) {
            return Ok(FileClass::Ignored);
        }
        let Some(rel) = self.config.relative_to_src(path) else {
            return Err(TransposeError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.config.src_dir(),
            });
        };
        if path == self.config.book_file() {
            return Ok(FileClass::Book);
        }
        if let Ok(below_atoms) = rel.strip_prefix("atoms") {
            let segments: Vec<String> = below_atoms
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            match segments.as_slice() {
                [atom, index] if index.as_str() == "index.ts" => {
                    return Ok(FileClass::AtomIndex { atom: atom.clone() });
                }
                [atom, routes, route]
                    if routes.as_str() == "routes" && self.config.repo.is_deploy() =>
                {
                    let route = route.strip_suffix(".ts").unwrap_or(route.as_str()).to_string();
                    return Ok(FileClass::AtomRoute {
                        atom: atom.clone(),
                        route,
                    });
                }
                _ => {}
            }
        }
        // TODO: rewrite files under the server and admin subtrees
        // instead of passing them through unchanged.
        Ok(FileClass::Generic)
    }

    /// Transposes a single changed file into both target trees.
    pub async fn transpose_one(&self, path: &Path) -> Result<(), TransposeError> {
        match self.classify(path)? {
            FileClass::Ignored => Ok(()),
            FileClass::Book => self.transpose_book(path).await,
            FileClass::AtomIndex { atom } => self.transpose_atom_file(path, &atom, None).await,
            FileClass::AtomRoute { atom, route } => {
                self.transpose_atom_file(path, &atom, Some(&route)).await
            }
            FileClass::Generic => self.copy_generic(path).await,
        }
    }

    /// Transposes the whole source tree, fanning out across siblings.
    pub async fn transpose_all(&self) -> Result<(), TransposeError> {
        self.reporter.start_loading("Transposing source files...");
        self.transpose_dir(self.config.src_dir()).await?;
        self.reporter.done("trns", "Transposed all source files.");
        Ok(())
    }

    fn transpose_dir(
        &self,
        dir: PathBuf,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransposeError>> + Send + '_>> {
        Box::pin(async move {
            let mut reader = tokio::fs::read_dir(&dir)
                .await
                .map_err(|err| TransposeError::io(&dir, err.to_string()))?;
            let mut tasks: Vec<Pin<Box<dyn Future<Output = Result<(), TransposeError>> + Send + '_>>> =
                Vec::new();
            loop {
                let entry = reader
                    .next_entry()
                    .await
                    .map_err(|err| TransposeError::io(&dir, err.to_string()))?;
                let Some(entry) = entry else {
                    break;
                };
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|err| TransposeError::io(&path, err.to_string()))?;
                if file_type.is_dir() {
                    tasks.push(self.transpose_dir(path));
                } else {
                    tasks.push(Box::pin(async move { self.transpose_one(&path).await }));
                }
            }
            for result in join_all(tasks).await {
                result?;
            }
            Ok(())
        })
    }

    /// Removes the four artifacts derived from a deleted source file:
    /// source and compiled copies, in both targets.
    pub async fn transpose_unlink_file(&self, path: &Path) -> Result<(), TransposeError> {
        if matches!(self.classify(path)?, FileClass::Ignored) {
            return Ok(());
        }
        let rel = self.relative(path)?;
        for target in Target::ALL {
            remove_file_if_present(&self.config.target_src(target).join(&rel)).await?;
            remove_file_if_present(&self.config.target_dist(target).join(rel.with_extension("js")))
                .await?;
        }
        self.reporter
            .verbose("trns", &format!("Removed artifacts of [{}].", path.display()));
        Ok(())
    }

    /// Removes the derived directories of a deleted source directory.
    pub async fn transpose_unlink_dir(&self, path: &Path) -> Result<(), TransposeError> {
        if matches!(self.classify(path)?, FileClass::Ignored) {
            return Ok(());
        }
        let rel = self.relative(path)?;
        for target in Target::ALL {
            remove_dir_if_present(&self.config.target_src(target).join(&rel)).await?;
            remove_dir_if_present(&self.config.target_dist(target).join(&rel)).await?;
        }
        Ok(())
    }

    /// Regenerates the hooks file from the current book and places it
    /// in both target trees.
    pub async fn generate_hooks(&self) -> Result<(), TransposeError> {
        self.reporter.start_loading("Generating hooks...");
        let book_path = self.config.book_file();
        let text = tokio::fs::read_to_string(&book_path)
            .await
            .map_err(|err| TransposeError::io(&book_path, err.to_string()))?;
        let src = SourceTree::parse(text, &book_path)?;
        let Some(meta) = extract_book(&src) else {
            self.reporter
                .verbose("hook", "No atom_book declaration found, skipping hooks.");
            return Ok(());
        };
        let generated = hooks::generate(&meta);

        let server_path = self.config.hooks_file(Target::Server);
        write_file(&server_path, &generated).await?;
        self.reporter
            .verbose("hook", &format!("Created hooks file [{}].", server_path.display()));

        let client_path = self.config.hooks_file(Target::Client);
        copy_file(&server_path, &client_path).await?;
        self.reporter
            .verbose("hook", &format!("Created hooks file [{}].", client_path.display()));
        self.reporter.done("hook", "Hooks generated.");
        Ok(())
    }

    /// Rewrites aliased specifiers across every `.ts` file of both
    /// generated source trees. Static nuxt assets and VCS metadata are
    /// skipped; a file is only rewritten (and rewritten back to disk)
    /// when at least one alias matched, so a second pass over an
    /// already-relative tree is a no-op.
    pub async fn replace_aliases(&self) -> Result<(), TransposeError> {
        self.reporter.start_loading("Updating aliases...");
        for target in Target::ALL {
            let tsconfig = self.config.target_tsconfig(target);
            let aliases = rewrite::load_aliases(&tsconfig)?;
            let alias_base = self.config.out_dir().join(target.folder());
            let skip = self.config.target_repo_dir(target).join("nuxt").join("static");
            let walker = walkdir::WalkDir::new(self.config.target_src(target))
                .into_iter()
                .filter_entry(|e| e.file_name() != ".git" && !e.path().starts_with(&skip));
            for entry in walker {
                let entry = entry.map_err(|err| {
                    TransposeError::io(self.config.target_src(target), err.to_string())
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if path.extension().map(|e| e != "ts").unwrap_or(true) {
                    continue;
                }
                let text = self.read(path).await?;
                let src = SourceTree::parse(text, path)?;
                let mut editor = Editor::new();
                let file_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.config.target_src(target));
                let found = rewrite::rewrite_alias_imports(
                    &src,
                    &mut editor,
                    &file_dir,
                    &alias_base,
                    &aliases,
                );
                if found {
                    write_file(path, &src.print(editor)).await?;
                    self.reporter
                        .verbose("alis", &format!("Updated aliases in [{}].", path.display()));
                }
            }
        }
        self.reporter.done("alis", "Aliases updated.");
        Ok(())
    }

    async fn transpose_book(&self, path: &Path) -> Result<(), TransposeError> {
        let text = self.read(path).await?;
        let books = rewrite::build_books(&text, path)?;
        for target in Target::ALL {
            let dest = self
                .config
                .target_src(target)
                .join("books")
                .join("index.ts");
            write_file(&dest, &books).await?;
            let dist = self
                .config
                .target_dist(target)
                .join("books")
                .join("index.js");
            self.compiler.compile(&dest, &dist)?;
        }
        self.reporter.verbose("trns", "Transposed book file.");
        Ok(())
    }

    async fn transpose_atom_file(
        &self,
        path: &Path,
        atom: &str,
        route: Option<&str>,
    ) -> Result<(), TransposeError> {
        let text = self.read(path).await?;
        let rel = self.relative(path)?;
        for target in Target::ALL {
            let src = SourceTree::parse(text.clone(), path)?;
            let mut editor = Editor::new();
            let dest = self.config.target_src(target).join(&rel);
            self.rewrite_imports(&src, &mut editor, &dest, target)?;
            if let Some(call) = find_registration_call(&src) {
                match route {
                    None => rewrite::inject_atom_arg(&mut editor, call, atom),
                    Some(route) => {
                        rewrite::inject_atom_route_args(&mut editor, call, atom, route);
                        if target == Target::Client {
                            rewrite::strip_call_config_property(&src, &mut editor, call, "call");
                        }
                    }
                }
            } else {
                self.reporter.verbose(
                    "trns",
                    &format!("No registration call in [{}], skipping injection.", path.display()),
                );
            }
            write_file(&dest, &src.print(editor)).await?;
            let dist = self.config.target_dist(target).join(rel.with_extension("js"));
            self.compiler.compile(&dest, &dist)?;
        }
        self.reporter
            .verbose("trns", &format!("Transposed [{}].", path.display()));
        Ok(())
    }

    async fn copy_generic(&self, path: &Path) -> Result<(), TransposeError> {
        let text = self.read(path).await?;
        let rel = self.relative(path)?;
        let compile = rel.extension().map(|e| e == "ts").unwrap_or(false);
        for target in Target::ALL {
            let dest = self.config.target_src(target).join(&rel);
            write_file(&dest, &text).await?;
            if compile {
                let dist = self.config.target_dist(target).join(rel.with_extension("js"));
                self.compiler.compile(&dest, &dist)?;
            }
        }
        Ok(())
    }

    fn rewrite_imports(
        &self,
        src: &SourceTree,
        editor: &mut Editor,
        dest: &Path,
        target: Target,
    ) -> Result<(), TransposeError> {
        let file_dir = dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.target_src(target));
        let tsconfig = self.config.target_tsconfig(target);
        if tsconfig.exists() {
            // The uranio specifier family has its own rule below.
            let mut aliases = rewrite::load_aliases(&tsconfig)?;
            aliases.retain(|name, _| name != "uranio" && !name.starts_with("uranio/"));
            let alias_base = self.config.out_dir().join(target.folder());
            rewrite::rewrite_alias_imports(src, editor, &file_dir, &alias_base, &aliases);
        }
        rewrite::rewrite_uranio_imports(
            src,
            editor,
            &file_dir,
            &self.config.target_repo_dir(target),
        );
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<String, TransposeError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|err| TransposeError::io(path, err.to_string()))
    }

    fn relative(&self, path: &Path) -> Result<PathBuf, TransposeError> {
        self.config
            .relative_to_src(path)
            .ok_or_else(|| TransposeError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.config.src_dir(),
            })
    }
}

fn is_swap_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.ends_with(".swp") || name.ends_with(".swo") || name.ends_with('~')
}

async fn write_file(path: &Path, text: &str) -> Result<(), TransposeError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| TransposeError::io(parent, err.to_string()))?;
    }
    tokio::fs::write(path, text)
        .await
        .map_err(|err| TransposeError::io(path, err.to_string()))
}

async fn copy_file(from: &Path, to: &Path) -> Result<(), TransposeError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| TransposeError::io(parent, err.to_string()))?;
    }
    tokio::fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|err| TransposeError::io(to, err.to_string()))
}

async fn remove_file_if_present(path: &Path) -> Result<(), TransposeError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(TransposeError::io(path, err.to_string())),
    }
}

async fn remove_dir_if_present(path: &Path) -> Result<(), TransposeError> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(TransposeError::io(path, err.to_string())),
    }
}
