//! Single-file compilation of written target variants.
//!
//! The orchestrator hands every written file to a [`TargetCompiler`];
//! the production implementation shells out to esbuild, tests use
//! [`NullCompiler`].

use std::path::Path;
use std::process::Command;

use crate::diagnostic::TransposeError;

/// Compiles one written source file into its `dist` counterpart.
pub trait TargetCompiler: Send + Sync {
    fn compile(&self, entry: &Path, outfile: &Path) -> Result<(), TransposeError>;
}

/// Invokes `npx esbuild` per file, node platform, CommonJS output.
#[derive(Debug, Default)]
pub struct EsbuildCompiler;

impl TargetCompiler for EsbuildCompiler {
    fn compile(&self, entry: &Path, outfile: &Path) -> Result<(), TransposeError> {
        let output = Command::new("npx")
            .arg("esbuild")
            .arg(entry)
            .arg(format!("--outfile={}", outfile.display()))
            .arg("--platform=node")
            .arg("--format=cjs")
            .output()
            .map_err(|err| TransposeError::CompilerSpawn {
                entry: entry.to_path_buf(),
                message: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(TransposeError::CompilerFailed {
                entry: entry.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Skips compilation. Used by tests and `--no-compile` runs.
#[derive(Debug, Default)]
pub struct NullCompiler;

impl TargetCompiler for NullCompiler {
    fn compile(&self, _entry: &Path, _outfile: &Path) -> Result<(), TransposeError> {
        Ok(())
    }
}
