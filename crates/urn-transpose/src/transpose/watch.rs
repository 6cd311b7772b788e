//! Watch coordinator.
//!
//! Consumes typed watch events for the two watched roots (user source
//! tree, generated repo folder). Each root starts in `Initializing` and
//! drops every event until its ready signal fires, so the synthetic add
//! storm of the watcher's initial scan never triggers incremental
//! rebuilds. A per-file failure while handling one event is reported
//! and swallowed; the watch loop must outlive bad files. Fatal errors
//! (a tsconfig that stopped parsing) surface to the caller and end the
//! session.

use std::path::{Path, PathBuf};

use crate::config::Target;
use crate::diagnostic::TransposeError;
use crate::report::Reporter;
use crate::transpose::Transposer;

/// Sentinel comment above the autoupdate counter in the entry file.
pub const AUTOUPDATE_SENTINEL: &str = "// uranio autoupdate";

/// Which watched tree an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchedRoot {
    /// The user source tree under `<root>/src`.
    Src,
    /// The uranio repo copy inside the generated server tree.
    RepoLib,
}

/// Normalized watcher event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// One-time initial-scan-complete signal for a root.
    Ready,
    Add,
    AddDir,
    Change,
    Unlink,
    UnlinkDir,
}

/// One `(root, kind, path)` delivery from the watch collaborator.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub root: WatchedRoot,
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Initializing,
    Ready,
}

/// Event-driven re-entry point around the [`Transposer`].
pub struct WatchCoordinator<'a> {
    transposer: &'a Transposer<'a>,
    reporter: &'a dyn Reporter,
    src_state: ScanState,
    lib_state: ScanState,
}

impl<'a> WatchCoordinator<'a> {
    pub fn new(transposer: &'a Transposer<'a>, reporter: &'a dyn Reporter) -> Self {
        Self {
            transposer,
            reporter,
            src_state: ScanState::Initializing,
            lib_state: ScanState::Initializing,
        }
    }

    /// Handles one watch event. Per-file errors are reported and the
    /// coordinator stays alive; fatal errors (see
    /// [`TransposeError::is_fatal`]) are returned so the session ends
    /// with a nonzero exit instead of failing on every event forever.
    pub async fn handle(&mut self, event: WatchEvent) -> Result<(), TransposeError> {
        if event.kind == WatchEventKind::Ready {
            self.mark_ready(event.root);
            return Ok(());
        }
        if self.state(event.root) == ScanState::Initializing {
            return Ok(());
        }
        let result = match event.root {
            WatchedRoot::Src => self.handle_src(&event).await,
            WatchedRoot::RepoLib => self.handle_lib(&event).await,
        };
        if let Err(err) = result {
            if err.is_fatal() {
                return Err(err);
            }
            self.reporter.error("wtch", &err.to_string());
        }
        Ok(())
    }

    fn mark_ready(&mut self, root: WatchedRoot) {
        match root {
            WatchedRoot::Src => self.src_state = ScanState::Ready,
            WatchedRoot::RepoLib => self.lib_state = ScanState::Ready,
        }
        self.reporter.done("wtch", "Initial scanner completed.");
    }

    fn state(&self, root: WatchedRoot) -> ScanState {
        match root {
            WatchedRoot::Src => self.src_state,
            WatchedRoot::RepoLib => self.lib_state,
        }
    }

    async fn handle_src(&self, event: &WatchEvent) -> Result<(), TransposeError> {
        let config = self.transposer.config();
        self.reporter
            .verbose("wtch", &format!("{:?} {}", event.kind, event.path.display()));
        match event.kind {
            WatchEventKind::AddDir => {
                self.provision_dir(&event.path).await?;
                self.reporter.done(
                    "wtch",
                    &format!("[Src watch] Transposed dir [{}].", event.path.display()),
                );
            }
            WatchEventKind::Unlink => {
                self.transposer.transpose_unlink_file(&event.path).await?;
            }
            WatchEventKind::UnlinkDir => {
                self.transposer.transpose_unlink_dir(&event.path).await?;
            }
            WatchEventKind::Add | WatchEventKind::Change => {
                self.transposer.transpose_one(&event.path).await?;
                if config.repo.is_hooks_capable() {
                    self.transposer.generate_hooks().await?;
                }
                self.reporter.done(
                    "wtch",
                    &format!("[Src watch] Transposed [{}].", event.path.display()),
                );
            }
            WatchEventKind::Ready => {}
        }
        bump_autoupdate(&config.entry_file()).await
    }

    async fn handle_lib(&self, event: &WatchEvent) -> Result<(), TransposeError> {
        let path = event.path.to_string_lossy();
        if path.contains("hooks/index.ts") || path.contains("src/books/") || path.contains("nuxt/")
        {
            return Ok(());
        }
        self.reporter
            .verbose("wtch", &format!("{:?} {}", event.kind, event.path.display()));
        bump_autoupdate(&self.transposer.config().entry_file()).await
    }

    /// Provisions a matching empty directory in the destination trees.
    /// Admin frontend directories only exist in the client tree, nested
    /// under the fixed nuxt sub-path.
    async fn provision_dir(&self, path: &Path) -> Result<(), TransposeError> {
        let config = self.transposer.config();
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if config.repo.is_admin() && path.starts_with(config.src_dir().join("frontend")) {
            let dest = config.target_repo_dir(Target::Client).join("nuxt").join(&basename);
            create_dir(&dest).await?;
        } else {
            for target in Target::ALL {
                create_dir(&config.target_src(target).join(&basename)).await?;
            }
        }
        Ok(())
    }
}

/// Bumps the trailing counter of the generated entry file so its
/// content hash changes on every relevant source change and the
/// downstream file-watching compiler reloads.
///
/// If the second-to-last line is not the sentinel comment yet, sentinel
/// and a zero counter are appended; otherwise the trailing numeric
/// comment is incremented in place.
pub async fn bump_autoupdate(entry_file: &Path) -> Result<(), TransposeError> {
    let content = tokio::fs::read_to_string(entry_file)
        .await
        .map_err(|err| TransposeError::io(entry_file, err.to_string()))?;
    let lines: Vec<&str> = content.split('\n').collect();
    let sentinel_present =
        lines.len() >= 2 && lines[lines.len() - 2] == AUTOUPDATE_SENTINEL;
    let new_content = if !sentinel_present {
        format!("{content}\n{AUTOUPDATE_SENTINEL}\n// 0")
    } else {
        let last = lines[lines.len() - 1];
        let counter: u64 = last
            .split(' ')
            .nth(1)
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let mut kept = lines;
        kept.pop();
        format!("{}\n// {}", kept.join("\n"), counter + 1)
    };
    tokio::fs::write(entry_file, new_content)
        .await
        .map_err(|err| TransposeError::io(entry_file, err.to_string()))
}

async fn create_dir(path: &Path) -> Result<(), TransposeError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| TransposeError::io(path, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::NullCompiler;
    use crate::config::{Repo, TransposeConfig};
    use crate::report::NullReporter;

    #[tokio::test]
    async fn autoupdate_appends_then_increments() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("api.ts");
        tokio::fs::write(&entry, "export default handler;").await.unwrap();

        bump_autoupdate(&entry).await.unwrap();
        let text = tokio::fs::read_to_string(&entry).await.unwrap();
        assert_eq!(text, "export default handler;\n// uranio autoupdate\n// 0");

        bump_autoupdate(&entry).await.unwrap();
        let text = tokio::fs::read_to_string(&entry).await.unwrap();
        assert_eq!(text, "export default handler;\n// uranio autoupdate\n// 1");

        bump_autoupdate(&entry).await.unwrap();
        let text = tokio::fs::read_to_string(&entry).await.unwrap();
        assert_eq!(text, "export default handler;\n// uranio autoupdate\n// 2");
    }

    #[tokio::test]
    async fn events_before_ready_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        tokio::fs::create_dir_all(root.join("src")).await.unwrap();
        let source = root.join("src").join("helpers.ts");
        tokio::fs::write(&source, "export const x = 1;").await.unwrap();

        let reporter = NullReporter;
        let compiler = NullCompiler;
        let transposer = Transposer::new(
            TransposeConfig::new(root, Repo::Core),
            &reporter,
            &compiler,
        );
        let mut coordinator = WatchCoordinator::new(&transposer, &reporter);

        let change = WatchEvent {
            root: WatchedRoot::Src,
            kind: WatchEventKind::Change,
            path: source.clone(),
        };
        coordinator.handle(change.clone()).await.unwrap();
        let dest = transposer.config().target_src(Target::Server).join("helpers.ts");
        assert!(!dest.exists());

        coordinator
            .handle(WatchEvent {
                root: WatchedRoot::Src,
                kind: WatchEventKind::Ready,
                path: PathBuf::new(),
            })
            .await.unwrap();
        coordinator.handle(change).await.unwrap();
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn malformed_tsconfig_ends_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let source = root.join("src/atoms/product/index.ts");
        tokio::fs::create_dir_all(source.parent().unwrap()).await.unwrap();
        tokio::fs::write(&source, "export default uranio.register.atom({});")
            .await
            .unwrap();
        let tsconfig = root.join(".uranio/server/tsconfig.json");
        tokio::fs::create_dir_all(tsconfig.parent().unwrap()).await.unwrap();
        tokio::fs::write(&tsconfig, "{ not json").await.unwrap();

        let reporter = NullReporter;
        let compiler = NullCompiler;
        let transposer = Transposer::new(
            TransposeConfig::new(root, Repo::Trx),
            &reporter,
            &compiler,
        );
        let mut coordinator = WatchCoordinator::new(&transposer, &reporter);
        coordinator
            .handle(WatchEvent {
                root: WatchedRoot::Src,
                kind: WatchEventKind::Ready,
                path: PathBuf::new(),
            })
            .await.unwrap();

        let err = coordinator
            .handle(WatchEvent {
                root: WatchedRoot::Src,
                kind: WatchEventKind::Change,
                path: source,
            })
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn lib_events_on_generated_books_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let reporter = NullReporter;
        let compiler = NullCompiler;
        let transposer = Transposer::new(
            TransposeConfig::new(root, Repo::Trx),
            &reporter,
            &compiler,
        );
        let mut coordinator = WatchCoordinator::new(&transposer, &reporter);
        coordinator
            .handle(WatchEvent {
                root: WatchedRoot::RepoLib,
                kind: WatchEventKind::Ready,
                path: PathBuf::new(),
            })
            .await.unwrap();

        // Would fail with a missing entry file if it were not ignored;
        // ignored paths must not touch the counter at all.
        coordinator
            .handle(WatchEvent {
                root: WatchedRoot::RepoLib,
                kind: WatchEventKind::Change,
                path: root.join(".uranio/server/src/uranio/src/books/atom.ts"),
            })
            .await.unwrap();
        assert!(!transposer.config().entry_file().exists());
    }
}
