//! Transposer configuration.
//!
//! The configuration is an explicit value passed into every entry point;
//! nothing in this crate reads ambient process state. Two transpositions
//! with different configs can run in the same process without
//! cross-contamination.

use std::path::{Path, PathBuf};

/// Output folder created next to `src/` in the project root.
pub const OUT_FOLDER: &str = ".uranio";

/// Folder inside each target tree that holds the uranio repo copy.
pub const REPO_FOLDER: &str = "uranio";

/// Generated entry file carrying the autoupdate counter.
pub const ENTRY_FILE: &str = "server/src/functions/api.ts";

/// Which uranio repo flavour the project is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repo {
    Core,
    Api,
    Trx,
    Adm,
}

impl Repo {
    /// Repos that generate client hooks.
    pub fn is_hooks_capable(&self) -> bool {
        matches!(self, Repo::Trx | Repo::Adm)
    }

    /// Repos that ship an admin frontend subtree.
    pub fn is_admin(&self) -> bool {
        matches!(self, Repo::Adm)
    }

    /// Repos that ship server routes and therefore transpose route files.
    pub fn is_deploy(&self) -> bool {
        matches!(self, Repo::Api | Repo::Trx | Repo::Adm)
    }
}

impl std::str::FromStr for Repo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(Repo::Core),
            "api" => Ok(Repo::Api),
            "trx" => Ok(Repo::Trx),
            "adm" => Ok(Repo::Adm),
            other => Err(format!("unknown repo '{other}' (expected core, api, trx or adm)")),
        }
    }
}

/// One of the two parallel output trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Server,
    Client,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Server, Target::Client];

    /// Folder name under the output root.
    pub fn folder(&self) -> &'static str {
        match self {
            Target::Server => "server",
            Target::Client => "client",
        }
    }
}

/// Configuration for the transposer.
#[derive(Debug, Clone)]
pub struct TransposeConfig {
    /// Project root.
    pub root: PathBuf,

    /// Uranio repo flavour of the project.
    pub repo: Repo,

    /// Verbose logging.
    pub verbose: bool,
}

impl TransposeConfig {
    pub fn new(root: impl Into<PathBuf>, repo: Repo) -> Self {
        Self {
            root: root.into(),
            repo,
            verbose: false,
        }
    }

    /// The watched source tree: `<root>/src`.
    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// The atoms subtree: `<root>/src/atoms`.
    pub fn atoms_dir(&self) -> PathBuf {
        self.src_dir().join("atoms")
    }

    /// The book source file: `<root>/src/book.ts`.
    pub fn book_file(&self) -> PathBuf {
        self.src_dir().join("book.ts")
    }

    /// The generated output root: `<root>/.uranio`.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join(OUT_FOLDER)
    }

    /// Source tree of one target: `<root>/.uranio/<target>/src`.
    pub fn target_src(&self, target: Target) -> PathBuf {
        self.out_dir().join(target.folder()).join("src")
    }

    /// Compiled tree of one target: `<root>/.uranio/<target>/dist`.
    pub fn target_dist(&self, target: Target) -> PathBuf {
        self.out_dir().join(target.folder()).join("dist")
    }

    /// Per-target tsconfig used for the alias table.
    pub fn target_tsconfig(&self, target: Target) -> PathBuf {
        self.out_dir().join(target.folder()).join("tsconfig.json")
    }

    /// The uranio repo copy inside one target tree.
    pub fn target_repo_dir(&self, target: Target) -> PathBuf {
        self.target_src(target).join(REPO_FOLDER)
    }

    /// Generated entry file whose trailing counter is bumped on every
    /// relevant watch event.
    pub fn entry_file(&self) -> PathBuf {
        self.out_dir().join(ENTRY_FILE)
    }

    /// Generated hooks file of one target. Admin projects nest the trx
    /// hooks one level deeper inside the repo copy.
    pub fn hooks_file(&self, target: Target) -> PathBuf {
        let mut dir = self.target_repo_dir(target);
        if self.repo.is_admin() {
            dir = dir.join("trx");
        }
        dir.join("hooks").join("hooks.ts")
    }

    /// Path of `path` relative to the source root, if inside it.
    pub fn relative_to_src(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(self.src_dir()).ok().map(|p| p.to_path_buf())
    }
}
