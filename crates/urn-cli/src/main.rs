//! Uranio transposer CLI.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use notify::event::{CreateKind, RemoveKind};
use notify::{EventKind, RecursiveMode, Watcher};

use urn_transpose::{
    EsbuildCompiler, NullCompiler, Repo, TargetCompiler, TransposeConfig, Transposer,
    WatchCoordinator, WatchEvent, WatchEventKind, WatchedRoot,
};

mod ui;

#[derive(Parser)]
#[command(name = "uranio")]
#[command(version)]
#[command(about = "Uranio transposer - generates server and client targets from a uranio project")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ProjectArgs {
    /// Project root
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Uranio repo flavour (core, api, trx, adm)
    #[arg(short, long, default_value = "trx")]
    repo: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transpose the src tree (or one file) into both targets
    Transpose {
        #[command(flatten)]
        project: ProjectArgs,

        /// Only transpose this file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Skip the per-file esbuild compile
        #[arg(long)]
        no_compile: bool,
    },

    /// Rewrite tsconfig path aliases across both generated trees
    Alias {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Generate the client hooks file from the atom book
    Hooks {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Transpose, generate hooks, then watch and rebuild on change
    Dev {
        #[command(flatten)]
        project: ProjectArgs,

        /// Skip the per-file esbuild compile
        #[arg(long)]
        no_compile: bool,
    },

    /// Watch and rebuild on change without the initial full pass
    Watch {
        #[command(flatten)]
        project: ProjectArgs,

        /// Skip the per-file esbuild compile
        #[arg(long)]
        no_compile: bool,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Transpose {
            project,
            file,
            no_compile,
        } => {
            let (config, reporter) = setup(&project)?;
            let compiler = make_compiler(no_compile);
            let transposer = Transposer::new(config, &reporter, compiler.as_ref());
            match file {
                Some(file) => {
                    let file = absolute(&file)?;
                    transposer.transpose_one(&file).await?;
                }
                None => transposer.transpose_all().await?,
            }
            ui::success("Transpose completed.");
        }

        Commands::Alias { project } => {
            let (config, reporter) = setup(&project)?;
            let compiler = NullCompiler;
            let transposer = Transposer::new(config, &reporter, &compiler);
            transposer.replace_aliases().await?;
            ui::success("Aliases updated.");
        }

        Commands::Hooks { project } => {
            let (config, reporter) = setup(&project)?;
            let compiler = NullCompiler;
            let transposer = Transposer::new(config, &reporter, &compiler);
            transposer.generate_hooks().await?;
            ui::success("Hooks generated.");
        }

        Commands::Dev {
            project,
            no_compile,
        } => {
            run_watch_loop(&project, no_compile, true).await?;
        }

        Commands::Watch {
            project,
            no_compile,
        } => {
            run_watch_loop(&project, no_compile, false).await?;
        }
    }

    Ok(())
}

fn setup(project: &ProjectArgs) -> miette::Result<(TransposeConfig, ui::ConsoleReporter)> {
    ui::print_header(env!("CARGO_PKG_VERSION"));
    let repo: Repo = project
        .repo
        .parse()
        .map_err(|e: String| miette::miette!("{e}"))?;
    let root = absolute(&project.root)?;
    let mut config = TransposeConfig::new(root, repo);
    config.verbose = project.verbose;
    Ok((config, ui::ConsoleReporter::new(project.verbose)))
}

fn make_compiler(no_compile: bool) -> Box<dyn TargetCompiler> {
    if no_compile {
        Box::new(NullCompiler)
    } else {
        Box::new(EsbuildCompiler)
    }
}

fn absolute(path: &Path) -> miette::Result<PathBuf> {
    std::fs::canonicalize(path)
        .map_err(|e| miette::miette!("Cannot resolve path '{}': {e}", path.display()))
}

/// Initial pass (dev only) followed by the watch loop over both roots.
async fn run_watch_loop(
    project: &ProjectArgs,
    no_compile: bool,
    initial: bool,
) -> miette::Result<()> {
    let (config, reporter) = setup(project)?;
    let compiler = make_compiler(no_compile);
    let transposer = Transposer::new(config, &reporter, compiler.as_ref());

    if initial {
        transposer.transpose_all().await?;
        if transposer.config().repo.is_hooks_capable() {
            transposer.generate_hooks().await?;
        }
    }

    let src_dir = transposer.config().src_dir();
    let lib_dir = transposer.config().target_repo_dir(urn_transpose::Target::Server);
    ui::info(&format!("Watching src folder [{}] ...", src_dir.display()));

    let (tx, mut rx) = tokio::sync::mpsc::channel::<WatchEvent>(256);
    let event_src = src_dir.clone();
    let event_tx = tx.clone();
    let mut watcher = notify::recommended_watcher(
        move |result: Result<notify::Event, notify::Error>| {
            let Ok(event) = result else {
                return;
            };
            for path in event.paths {
                let Some(kind) = map_event_kind(&event.kind) else {
                    continue;
                };
                let root = if path.starts_with(&event_src) {
                    WatchedRoot::Src
                } else {
                    WatchedRoot::RepoLib
                };
                let _ = event_tx.blocking_send(WatchEvent { root, kind, path: path.clone() });
            }
        },
    )
    .map_err(|e| miette::miette!("Failed to create file watcher: {e}"))?;

    watcher
        .watch(&src_dir, RecursiveMode::Recursive)
        .map_err(|e| miette::miette!("Failed to watch [{}]: {e}", src_dir.display()))?;
    if lib_dir.is_dir() {
        ui::info(&format!("Watching uranio repo folder [{}] ...", lib_dir.display()));
        watcher
            .watch(&lib_dir, RecursiveMode::Recursive)
            .map_err(|e| miette::miette!("Failed to watch [{}]: {e}", lib_dir.display()))?;
    }

    let mut coordinator = WatchCoordinator::new(&transposer, &reporter);
    // The notify backend delivers no synthetic startup events, both
    // roots are ready as soon as the watches are registered.
    for root in [WatchedRoot::Src, WatchedRoot::RepoLib] {
        coordinator
            .handle(WatchEvent {
                root,
                kind: WatchEventKind::Ready,
                path: PathBuf::new(),
            })
            .await?;
    }
    ui::info("Ready! Waiting for changes...");

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    // Fatal errors end the session with a nonzero exit.
                    Some(event) => coordinator.handle(event).await?,
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                ui::dim("Stopping watch mode.");
                break;
            }
        }
    }

    Ok(())
}

/// Maps raw notify events onto the coordinator's event kinds. Access
/// and metadata-only events are dropped.
fn map_event_kind(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(CreateKind::Folder) => Some(WatchEventKind::AddDir),
        EventKind::Create(_) => Some(WatchEventKind::Add),
        EventKind::Remove(RemoveKind::Folder) => Some(WatchEventKind::UnlinkDir),
        EventKind::Remove(_) => Some(WatchEventKind::Unlink),
        EventKind::Modify(_) => Some(WatchEventKind::Change),
        _ => None,
    }
}
