//! Drip Editor CLI
//!
//! Serves the drip editor API for a course, or prints its drip plan.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use drip_core::{
    create_router, AppState, Config, CourseBackend, DripChainStore, DripPersistence, Inventory,
};
use drip_http::HttpBackend;
use drip_report::{json::JsonRenderer, DripPlan, MarkdownRenderer};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Drip Editor - build prerequisite chains for course lessons
///
/// Loads a course's sections, lessons, and saved drip chains from the course
/// backend and serves an editing API for drag-and-drop front ends.
#[derive(Parser, Debug)]
#[command(name = "drip")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: drip.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the editor API for a course
    Serve {
        /// Course to edit
        #[arg(long, value_name = "ID")]
        course: String,

        /// Port for the editor API (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the unlock plan of a course's saved drip chains
    Plan {
        /// Course to report on
        #[arg(long, value_name = "ID")]
        course: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = PlanFormat::Markdown)]
        format: PlanFormat,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlanFormat {
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?args.config, "Config file");

    let result = match args.command {
        Command::Serve { course, port } => serve(args.config.as_deref(), &course, port).await,
        Command::Plan {
            course,
            format,
            output,
        } => plan(args.config.as_deref(), &course, format, output.as_deref()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads the course and serves the editor API until Ctrl+C.
async fn serve(config_path: Option<&Path>, course_id: &str, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }
    config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

    let ip: IpAddr = config.bind_address.parse().map_err(|e| {
        anyhow::anyhow!(
            "Invalid bind address '{}': {e}\n\nSuggestion: Set bindAddress to an IP such as 127.0.0.1",
            config.bind_address
        )
    })?;
    let addr = SocketAddr::new(ip, config.port);

    let backend: Arc<dyn CourseBackend> =
        Arc::new(HttpBackend::from_config(&config).map_err(|e| anyhow::anyhow!("{e}"))?);

    let inventory = Inventory::load_or_empty(backend.as_ref(), course_id).await;
    let state = AppState::new(config, course_id, inventory, backend);
    match state.reload().await {
        Ok(chains) => tracing::info!(course_id, chains, "Saved chains loaded"),
        Err(e) => tracing::warn!(course_id, error = %e, "Failed to load saved chains; starting empty"),
    }

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port")
    })?;
    tracing::info!(%addr, course_id, "Editor API listening");
    println!("Editing course {course_id} at http://{addr}/api");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;

    Ok(())
}

/// Fetches the course and its saved chains and renders the plan.
async fn plan(
    config_path: Option<&Path>,
    course_id: &str,
    format: PlanFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

    let backend = HttpBackend::from_config(&config).map_err(|e| anyhow::anyhow!("{e}"))?;
    let inventory = Inventory::fetch(&backend, course_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load course {course_id}: {e}"))?;
    let persistence =
        DripPersistence::new(Arc::new(backend), config.placeholder_title_prefix.clone());
    let lists = persistence
        .load(course_id, &inventory)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load drips for course {course_id}: {e}"))?;

    let mut store = DripChainStore::new(config.membership);
    store.replace_chains(lists);
    let plan = DripPlan::build(course_id, &inventory, store.chains());

    match (format, output) {
        (PlanFormat::Markdown, None) => print!("{}", MarkdownRenderer::new(&plan).render()),
        (PlanFormat::Markdown, Some(path)) => {
            std::fs::write(path, MarkdownRenderer::new(&plan).render())?;
        }
        (PlanFormat::Json, None) => println!("{}", JsonRenderer::new(&plan).render_pretty()?),
        (PlanFormat::Json, Some(path)) => JsonRenderer::new(&plan).write_to_file(path, true)?,
    }

    if let Some(path) = output {
        tracing::info!(path = %path.display(), "Plan written");
    }
    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&Path>) -> anyhow::Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}
