//! # perfmon - Terminal Performance Dashboard
//!
//! Runs the classic Unix diagnostic tools (uptime, vmstat, iostat, sar...)
//! in tabs and keeps rolling sparklines of load, CPU, memory and network.

mod app;
mod config;
pub mod constants;
mod models;
mod monitor;
mod tabs;
mod ui;
mod utils;

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use config::Config;
use constants::{data_dir, log_file_path, ENV_LOG};

/// perfmon - Unix performance tools in one dashboard
#[derive(Parser, Debug)]
#[command(
    name = "perfmon",
    version,
    about = "A terminal dashboard for classic Unix performance tools",
    disable_version_flag = true
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Color theme (ocean, sand, day, or a custom theme name)
    #[arg(long, short = 't')]
    theme: Option<String>,
}

/// Send tracing output to the log file. The terminal belongs to the UI, so
/// when the file cannot be opened logging is simply off.
fn init_logging() {
    if std::fs::create_dir_all(data_dir()).is_err() {
        return;
    }
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path())
    {
        Ok(file) => file,
        Err(_) => return,
    };

    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("perfmon=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting perfmon");

    // Load and apply CLI overrides to config
    let mut config = Config::load();
    if let Some(ref theme_name) = cli.theme {
        config.apply_theme_override(theme_name);
    }

    let mut app = app::App::new(&config);
    app.run().await
}
