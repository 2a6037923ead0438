//! vehof-ex - Video Essay Hall of Fame offline explorer
//!
//! Imports the archive table into a local SQLite catalog and answers
//! search / filter / sort queries from the command line or over a local
//! HTTP API.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vehof_common::config::{load_toml_config, LoggingConfig, RootFolderInitializer, RootFolderResolver};
use vehof_common::db::init::init_database;
use vehof_common::format::{format_compact_number, format_duration};
use vehof_common::normalize::parse_number_loose;
use vehof_common::FlagKind;
use vehof_ex::api::videos::VideosParams;
use vehof_ex::query::{run_query, topic_counts};
use vehof_ex::services::{ArchiveSource, LoadReport};
use vehof_ex::{build_router, AppState, ExplorerSettings};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "vehof-ex")]
#[command(about = "Offline explorer for the Video Essay Hall of Fame archive")]
#[command(version)]
struct Cli {
    /// Root folder holding the database and, by default, archive.csv
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Configuration file (defaults to <config dir>/vehof/vehof.toml)
    #[arg(short, long, global = true, env = "VEHOF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the archive and serve the HTTP API on 127.0.0.1
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long, env = "VEHOF_PORT")]
        port: Option<u16>,
    },
    /// Import the archive if the catalog is out of date
    Import,
    /// Delete catalog and flags, then import again
    Reset,
    /// Run one query and print the matching videos
    Query {
        /// Free-text fuzzy search
        #[arg(short, long)]
        text: Option<String>,
        /// Topic filter (repeatable, any match)
        #[arg(long = "topic")]
        topics: Vec<String>,
        /// Duration bucket: short, medium, long (repeatable)
        #[arg(long = "duration")]
        durations: Vec<String>,
        /// Exact channel name
        #[arg(long)]
        owner: Option<String>,
        /// discover, favorites, watch_later, watched
        #[arg(long)]
        mode: Option<String>,
        /// newest, oldest, most_views, fewest_views, longest, shortest, none
        #[arg(long)]
        sort: Option<String>,
        /// Shuffle with this seed
        #[arg(long)]
        seed: Option<u64>,
        /// Maximum rows printed
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Print topic counts across the whole catalog
    Topics,
    /// Set or clear a flag on one video
    Flag {
        /// Video id
        id: String,
        /// watched, watch_later, favorite
        kind: String,
        /// Clear the flag instead of setting it
        #[arg(long)]
        off: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_load = load_toml_config(cli.config.as_deref());
    init_tracing(&config_load.config.logging)?;

    info!(
        "Starting VEHOF Explorer (vehof-ex) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_load.log();
    let config = config_load.config;

    let root_folder = RootFolderResolver::new(cli.root_folder.clone(), &config).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let source = ArchiveSource::resolve(&config.archive.source, initializer.root_folder())
        .context("Invalid archive source")?;
    info!("Archive source: {}", source);

    let state = AppState::new(pool, source, ExplorerSettings::from_config(&config));

    match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.explorer.port);
            serve(state, port).await
        }
        Command::Import => {
            let report = state.load_archive().await.context("Import failed")?;
            print_report(&report);
            Ok(())
        }
        Command::Reset => {
            let report = state.reset_archive().await.context("Reset failed")?;
            print_report(&report);
            Ok(())
        }
        Command::Query {
            text,
            topics,
            durations,
            owner,
            mode,
            sort,
            seed,
            limit,
        } => {
            state.startup().await.context("Startup failed")?;
            let params = VideosParams {
                q: text,
                topics: Some(topics.join(",")),
                durations: Some(durations.join(",")),
                owner,
                mode,
                sort,
                seed,
                shuffle: false,
                limit: Some(limit),
            };
            let spec = params.to_spec().map_err(|e| anyhow::anyhow!("{}", e))?;

            let entities = state.snapshot().await;
            let flags = state.flags.snapshot().await;
            let result = run_query(&entities, &flags, &spec, limit);

            for entity in &result.items {
                println!(
                    "{:<14} {:>8} {:>7}  {}  ({})",
                    entity.id,
                    format_duration(entity.duration_seconds, entity.duration.as_deref()),
                    format_compact_number(parse_number_loose(entity.view_count.as_deref())),
                    entity.title,
                    entity.owner.as_deref().unwrap_or("unknown channel"),
                );
            }
            println!(
                "{} of {} shown ({} in list)",
                result.items.len(),
                result.total,
                result.list_total
            );
            Ok(())
        }
        Command::Topics => {
            state.startup().await.context("Startup failed")?;
            for topic in topic_counts(&state.snapshot().await) {
                println!("{:>6}  {}", topic.count, topic.topic);
            }
            Ok(())
        }
        Command::Flag { id, kind, off } => {
            let kind: FlagKind = kind.parse()?;
            state.flags.hydrate().await?;
            if state.catalog.get(&id).await?.is_none() {
                anyhow::bail!("No video with id {}", id);
            }
            let flag = state.flags.set_flag(&id, kind, !off).await?;
            println!(
                "{}: watched={} watch_later={} favorite={}",
                flag.id, flag.watched, flag.watch_later, flag.favorite
            );
            Ok(())
        }
    }
}

async fn serve(state: AppState, port: u16) -> Result<()> {
    // Load failures are reported through /api/status
    if let Some(report) = state.startup().await.context("Startup failed")? {
        info!("{}", report.status_message());
    }

    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("vehof-ex listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over the configured level. A configured log file
/// replaces stderr.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn print_report(report: &LoadReport) {
    println!("{}", report.status_message());
    if report.rejected_rows > 0 || report.parse_errors > 0 {
        println!(
            "Skipped {} rows without url or title, {} unparseable rows",
            report.rejected_rows, report.parse_errors
        );
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
