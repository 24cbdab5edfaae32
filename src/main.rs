//! Pipeflow - Headless Runner
//!
//! Runs a saved pipeline graph without the editor: applies the project as a
//! snapshot, reports every node's status, and optionally keeps the network
//! alive while the project file is edited.

use anyhow::{bail, Context};
use chrono::{DateTime, Local, Utc};
use clap::{ArgAction, Parser, Subcommand};
use pipeflow_rs::{
    config::{EngineConfig, ProjectFile},
    pipeline::{diff, spawn_engine, Dispatcher, FactoryRegistry, NodeId, StatusBoard},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pipeflow-rs")]
#[command(about = "Run and inspect pipeflow pipeline graphs")]
struct Cli {
    /// Engine config file (TOML or JSON); defaults to the app data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a project graph and report node status
    Run(RunArgs),
    /// Print the change events between two project files
    Diff(DiffArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[arg(long)]
    project: PathBuf,
    /// Keep running and re-apply the project whenever the file changes
    #[arg(long, action = ArgAction::SetTrue)]
    watch: bool,
    /// Report immediately instead of waiting for background sources to settle
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "watch")]
    once: bool,
}

#[derive(clap::Args, Debug)]
struct DiffArgs {
    previous: PathBuf,
    next: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::load_or_default(cli.config.as_deref());
    let _log_guard = init_logging(&config);

    match cli.command {
        Commands::Run(args) if args.watch => watch_project(&args.project, &config),
        Commands::Run(args) => run_project(&args.project, args.once, &config),
        Commands::Diff(args) => diff_projects(&args.previous, &args.next),
    }
}

/// Stderr logging, plus a daily rolling file when the config names a log dir.
fn init_logging(config: &EngineConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "pipeflow.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

fn run_project(path: &Path, once: bool, config: &EngineConfig) -> anyhow::Result<()> {
    let project = ProjectFile::load(path)?;
    tracing::info!("Running project '{}' ({} nodes)", project.name, project.graph.nodes.len());
    let node_ids: Vec<NodeId> = project.graph.nodes.iter().map(|n| n.id.clone()).collect();

    let mut dispatcher = Dispatcher::with_builtins(config);
    let applied = dispatcher
        .apply_snapshot(project.graph)
        .context("Failed to apply project graph")?;
    tracing::debug!("Applied {} event(s)", applied);

    if !once {
        // Give background sources a few poll cycles to report.
        let settle = config.file_poll_interval() * 4;
        let deadline = Instant::now() + settle;
        while Instant::now() < deadline {
            dispatcher.poll()?;
            std::thread::sleep(config.file_poll_interval());
        }
        dispatcher.poll()?;
    }

    for id in &node_ids {
        let status = dispatcher.status_board().latest(id);
        match (status, dispatcher.last_output(id)) {
            (Some(update), _) => print_line(id, update.event.kind(), &update.event, update.at),
            (None, Some(last)) => {
                let replay = last.value().map_or("pending".to_string(), |v| v.to_string());
                println!("{:<20} {:<8} {}", id, "ready", replay);
            }
            (None, None) => println!("{:<20} {:<8}", id, "-"),
        }
    }
    Ok(())
}

fn watch_project(path: &Path, config: &EngineConfig) -> anyhow::Result<()> {
    let (bridge, handle) = spawn_engine(FactoryRegistry::with_builtins(config), config)?;
    let mut printed: HashMap<NodeId, DateTime<Utc>> = HashMap::new();
    let mut stamp: Option<SystemTime> = None;
    let mut node_ids: Vec<NodeId> = Vec::new();

    tracing::info!("Watching {:?} (interrupt to stop)", path);
    loop {
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        if modified != stamp {
            stamp = modified;
            match ProjectFile::load(path) {
                Ok(project) => {
                    node_ids = project.graph.nodes.iter().map(|n| n.id.clone()).collect();
                    bridge.push_snapshot(project.graph)?;
                }
                Err(e) => tracing::warn!("Skipping unreadable project: {}", e),
            }
        }

        print_new_status(bridge.status_board(), &node_ids, &mut printed);

        if handle.is_finished() {
            return match handle.join() {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("Engine stopped"),
                Err(_) => bail!("Engine thread panicked"),
            };
        }
        std::thread::sleep(config.file_poll_interval().max(Duration::from_millis(50)));
    }
}

fn print_new_status(
    board: &StatusBoard,
    node_ids: &[NodeId],
    printed: &mut HashMap<NodeId, DateTime<Utc>>,
) {
    for id in node_ids {
        let Some(update) = board.latest(id) else {
            continue;
        };
        if printed.get(id) == Some(&update.at) {
            continue;
        }
        print_line(id, update.event.kind(), &update.event, update.at);
        printed.insert(id.clone(), update.at);
    }
}

fn print_line(id: &NodeId, kind: &str, detail: &impl std::fmt::Display, at: DateTime<Utc>) {
    let at = at.with_timezone(&Local).format("%H:%M:%S%.3f");
    println!("{} {:<20} {:<8} {}", at, id, kind, detail);
}

fn diff_projects(previous: &Path, next: &Path) -> anyhow::Result<()> {
    let previous = ProjectFile::load(previous)?;
    let next = ProjectFile::load(next)?;

    let changes = diff(&previous.graph, &next.graph).into_changes();
    if changes.is_empty() {
        println!("no changes");
    }
    for change in changes {
        println!("{}", change);
    }
    Ok(())
}
