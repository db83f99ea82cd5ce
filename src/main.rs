//! Sonata command-line entry point.
//!
//! Loads the user settings, syncs the configured library roots once and
//! prints the folder tree with per-folder song counts and durations.

use std::{
    collections::BTreeSet,
    path::{PathBuf, absolute},
    sync::Arc,
};

use {
    anyhow::{Result, anyhow},
    clap::Parser,
    tokio::sync::broadcast::{Receiver, error::RecvError},
    tracing::{info, warn},
    tracing_subscriber::EnvFilter,
};

use sonata::{
    AppState, AppStateEvent, FilesystemMediaIndex, LibraryStatus, LoftyTagExtractor,
    RecordDatabase, SettingsManager, SyncCoordinator, SyncEngine, TreeNode,
    error::{ErrorReporter, ResultExt},
    library::{
        SyncConfig, SyncReport, get_database_path,
        paths::resolve_declared_roots,
        projections::{folder_summary, format_duration},
        sources::PreferenceStore,
    },
};

/// Sonata - browse a music library by folder
#[derive(Parser, Debug)]
#[command(name = "sonata")]
#[command(version)]
#[command(about = "Sync a music library and print its folder tree")]
struct Args {
    /// Library root folders; replaces the saved roots when given
    roots: Vec<PathBuf>,

    /// Path to the record cache database
    #[arg(long)]
    database: Option<PathBuf>,

    /// Print songs whose title contains this text
    #[arg(long)]
    search: Option<String>,

    /// Number of folder levels to print
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},sqlx=warn,lofty=error")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let result = run(args).await;
    if let Err(error) = &result {
        ErrorReporter::error(error, "sonata");
    }
    result
}

async fn run(args: Args) -> Result<()> {
    let settings = Arc::new(SettingsManager::new().add_context("Failed to load settings")?);

    if !args.roots.is_empty() {
        let roots = args
            .roots
            .iter()
            .map(|root| absolute(root).map(|path| path.to_string_lossy().into_owned()))
            .collect::<Result<BTreeSet<String>, _>>()
            .add_context("Failed to resolve library roots")?;
        settings
            .set_declared_roots(roots)
            .add_context("Failed to save library roots")?;
    }

    let config = SyncConfig::from(&*settings.get_settings());
    if settings.get_declared_roots().is_empty() {
        warn!("No library roots configured; pass one or more folders to sync");
    }

    let database_path = args.database.unwrap_or_else(get_database_path);
    let cache = RecordDatabase::open(&database_path)
        .await
        .add_contextf(format!(
            "Failed to open record cache at {}",
            database_path.display()
        ))?;

    let volumes: Vec<PathBuf> = config.volume_roots.iter().map(PathBuf::from).collect();
    let engine = Arc::new(SyncEngine::new(
        Arc::new(FilesystemMediaIndex::new(volumes.clone())),
        Arc::new(LoftyTagExtractor::new(volumes)),
        Arc::new(cache),
        config.clone(),
    ));

    let state = AppState::new();
    let declared_roots = resolve_declared_roots(&settings.get_declared_roots(), &config.volume_roots);
    match engine.load_cached(&declared_roots).await {
        Ok(snapshot) => {
            info!(songs = snapshot.songs().len(), "Loaded cached library");
            state.publish_snapshot(snapshot);
        }
        Err(e) => ErrorReporter::warn(&e.into(), "Failed to load cached library"),
    }

    let mut events = state.subscribe();
    let coordinator = SyncCoordinator::spawn(engine, state.clone(), settings);
    coordinator.request_sync();
    let outcome = wait_for_sync(&mut events).await;
    coordinator.shutdown().await;

    print_library(&state, args.depth);
    if let Some(query) = args.search {
        state.update_search_query(Some(query));
        print_search_results(&state);
    }

    match outcome {
        Ok(report) => {
            info!(
                indexed = report.indexed,
                extracted = report.extracted,
                failed = report.failed,
                deleted = report.deleted,
                "Library is up to date"
            );
            Ok(())
        }
        Err(message) => Err(anyhow!(message)),
    }
}

async fn wait_for_sync(events: &mut Receiver<AppStateEvent>) -> Result<SyncReport, String> {
    loop {
        match events.recv().await {
            Ok(AppStateEvent::SyncFinished(report)) => return Ok(report),
            Ok(AppStateEvent::SyncFailed(message)) => return Err(message),
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return Err("Sync worker stopped unexpectedly.".to_string()),
        }
    }
}

fn print_library(state: &AppState, depth: usize) {
    match state.get_status() {
        LibraryStatus::Loading => println!("Library is still loading."),
        LibraryStatus::Empty => println!("No songs found."),
        LibraryStatus::NoAccess => println!("No access to the music folders."),
        LibraryStatus::Ready => {}
    }

    let snapshot = state.get_snapshot();
    for root in snapshot.roots() {
        print_node(root, 0, depth);
    }
    if snapshot.dropped() > 0 {
        println!("({} songs outside the library roots)", snapshot.dropped());
    }
}

fn print_node(node: &TreeNode, level: usize, depth: usize) {
    let indent = "  ".repeat(level);
    if node.is_folder() {
        println!("{indent}{}/  [{}]", node.name(), folder_summary(node));
        if level < depth {
            for child in node.children() {
                print_node(child, level + 1, depth);
            }
        }
    } else if let Some(record) = node.record() {
        println!(
            "{indent}{}  {}",
            record.display_title(),
            format_duration(record.duration_ms)
        );
    }
}

fn print_search_results(state: &AppState) {
    let results = state.search_results();
    println!("{} matching songs", results.len());
    for record in results {
        println!("  {}  ({})", record.display_title(), record.path);
    }
}
