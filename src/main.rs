//! Journal server - Main entry point
//!
//! A single-operator personal journal: public blog pages, a JSON API,
//! and a cookie-gated admin area for authoring.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use inkpost::config::{self, Config};
use inkpost::content::clean_post_html;
use inkpost::db::Database;
use inkpost::posts::PostStore;
use inkpost::server::{AppState, run_server};

/// Journal server - personal blog with a cookie-gated admin area
#[derive(Parser)]
#[command(name = "inkpost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value_os_t = Config::default_path())]
    config: PathBuf,

    /// Data directory for the database, uploads, and logs
    #[arg(short, long, default_value_os_t = Config::default_data_dir())]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the journal daemon
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long)]
        listen: Option<SocketAddr>,
    },

    /// Clean up editor-mangled image styles in stored posts
    FixImages {
        /// Post ID to fix (all posts when omitted)
        post_id: Option<String>,
    },

    /// Generate a default configuration file
    InitConfig {
        /// Output path (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    match cli.command {
        Commands::Serve { listen } => {
            // For daemon mode: log to both stdout and file with rotation
            init_daemon_logging(&cli.data_dir, filter)?;
            serve(&cli.config, &cli.data_dir, listen).await
        }
        Commands::FixImages { post_id } => {
            init_cli_logging(filter);
            fix_images(&cli.config, &cli.data_dir, post_id).await
        }
        Commands::InitConfig { output } => {
            init_cli_logging(filter);
            generate_config(output)
        }
    }
}

/// Initialize logging for CLI commands (stdout only).
fn init_cli_logging(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

/// Initialize logging for daemon mode (stdout + rotating file).
fn init_daemon_logging(data_dir: &PathBuf, filter: EnvFilter) -> Result<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    // Create a daily rotating file appender (e.g., inkpost.2026-08-07.log)
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("inkpost")
        .filename_suffix("log")
        .build(&log_dir)
        .with_context(|| "Failed to create log file appender")?;

    // Non-blocking writer for the file
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard to keep the writer alive for the lifetime of the program
    // This is intentional for a long-running daemon
    std::mem::forget(_guard);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false)) // stdout
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking),
        ) // file
        .init();

    info!("Logging to: {}", log_dir.display());
    Ok(())
}

/// Run the journal daemon
async fn serve(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    listen_override: Option<SocketAddr>,
) -> Result<()> {
    ensure_data_dir(data_dir)?;

    let config = Config::load(config_path)?;

    let listen_addr: SocketAddr = match listen_override {
        Some(addr) => addr,
        None => config
            .http
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", config.http.listen_addr))?,
    };

    let db = Database::new(&config.database, data_dir).await?;
    let state = Arc::new(AppState::new(&config, db, data_dir));

    info!("Journal server starting...");
    info!("Site title: {}", config.site.title);
    info!("Upload dir: {}", state.uploads.dir().display());

    run_server(listen_addr, state).await
}

/// Run the image-style cleanup over one post or all posts
async fn fix_images(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    post_id: Option<String>,
) -> Result<()> {
    ensure_data_dir(data_dir)?;

    let config = Config::load(config_path)?;
    let db = Database::new(&config.database, data_dir).await?;
    let posts = PostStore::new(db.pool());

    let targets = match post_id {
        Some(id) => {
            let post = posts
                .get(&id)
                .await?
                .with_context(|| format!("No post with id {id}"))?;
            vec![post]
        }
        None => posts.list_all().await?,
    };

    let mut changed = 0;
    for post in &targets {
        let cleaned = clean_post_html(&post.content);
        if cleaned != post.content {
            posts.update_content(&post.id, &cleaned).await?;
            println!("Fixed: {} ({})", post.title, post.id);
            changed += 1;
        }
    }

    println!("{} of {} post(s) updated.", changed, targets.len());
    Ok(())
}

/// Ensure data directory exists
fn ensure_data_dir(data_dir: &PathBuf) -> Result<()> {
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        info!("Created data directory: {}", data_dir.display());
    }
    Ok(())
}

/// Generate a default configuration file
fn generate_config(output: Option<PathBuf>) -> Result<()> {
    let config = config::default_config_template();

    match output {
        Some(path) => {
            std::fs::write(&path, &config)?;
            println!("Configuration written to: {}", path.display());
        }
        None => {
            print!("{}", config);
        }
    }

    Ok(())
}
