//! # Uranio Transposer
//!
//! This crate transposes a uranio project's `src/` tree into the two
//! generated build targets (server and client), rewriting TypeScript
//! source with a tree-sitter based rewrite engine and generating the
//! client hooks module from the declarative atom book.
//!
//! ## Pipeline
//!
//! ```text
//! src/ change (file or whole tree)
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Classify   │  book / atom index / atom route / generic
//! └──────┬───────┘
//!        │  per target (server, client)
//!        ▼
//! ┌──────────────┐
//! │   Rewrite    │  imports, call-argument injection,
//! │ (AST splice) │  book splitting, client-only strips
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │ Write + cjs  │  .uranio/<target>/src + dist
//! │   compile    │
//! └──────────────┘
//! ```
//!
//! Independently, the hook generator consumes extracted book metadata
//! and emits one hooks source unit copied into both targets. The watch
//! coordinator re-runs the pipeline per filesystem event and bumps the
//! autoupdate counter of the generated entry file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use urn_transpose::{
//!     EsbuildCompiler, NullReporter, Repo, TransposeConfig, Transposer,
//! };
//!
//! let config = TransposeConfig::new("/path/to/project", Repo::Trx);
//! let transposer = Transposer::new(config, &NullReporter, &EsbuildCompiler);
//! transposer.transpose_all().await?;
//! transposer.generate_hooks().await?;
//! ```

pub mod ast;
pub mod book;
pub mod compile;
pub mod config;
pub mod diagnostic;
pub mod hooks;
pub mod report;
pub mod rewrite;
pub mod transpose;

pub use compile::{EsbuildCompiler, NullCompiler, TargetCompiler};
pub use config::{Repo, Target, TransposeConfig};
pub use diagnostic::TransposeError;
pub use report::{NullReporter, Reporter};
pub use transpose::watch::{WatchCoordinator, WatchEvent, WatchEventKind, WatchedRoot};
pub use transpose::{FileClass, Transposer};
