//! Transposer error types.

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur during transposition.
#[derive(Error, Diagnostic, Debug)]
pub enum TransposeError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to access '{}': {message}", path.display())]
    #[diagnostic(code(uranio::io::error))]
    IoError {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Failed to initialize parser")]
    #[diagnostic(code(uranio::parse::init_failed))]
    ParserInitFailed,

    #[error("Failed to parse file: {}", path.display())]
    #[diagnostic(code(uranio::parse::parse_failed))]
    ParseFailed {
        path: PathBuf,
    },

    // =========================================================================
    // Path Validation Errors
    // =========================================================================
    #[error("Empty or invalid path given to transpose")]
    #[diagnostic(
        code(uranio::path::empty),
        help("Transpose entry points require a non-empty path inside the project source root.")
    )]
    EmptyPath,

    #[error("Path '{}' is outside the source root '{}'", path.display(), root.display())]
    #[diagnostic(code(uranio::path::outside_root))]
    OutsideRoot {
        path: PathBuf,
        root: PathBuf,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Failed to parse tsconfig '{}': {message}", path.display())]
    #[diagnostic(
        code(uranio::config::tsconfig),
        help("Fix the JSON in compilerOptions.paths; the alias table must be an object of string arrays.")
    )]
    TsconfigParse {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Compiler Errors
    // =========================================================================
    #[error("Failed to spawn compiler for '{}': {message}", entry.display())]
    #[diagnostic(code(uranio::compile::spawn))]
    CompilerSpawn {
        entry: PathBuf,
        message: String,
    },

    #[error("Compiler exited with failure for '{}'", entry.display())]
    #[diagnostic(code(uranio::compile::failed))]
    CompilerFailed {
        entry: PathBuf,
    },
}

impl TransposeError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors that one-shot commands must map to a nonzero exit,
    /// even when encountered in an otherwise recoverable phase.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EmptyPath | Self::TsconfigParse { .. })
    }
}
