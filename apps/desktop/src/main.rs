use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{HttpBackend, UploadController, UserAction};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod terminal;

use config::{load_settings, prepare_preview_dir, DEFAULT_CONFIG_FILE};
use terminal::{read_selection, LineEventSource, TerminalSurface};

#[derive(Parser, Debug)]
#[command(name = "docuquery", about = "Upload documents, extract their text and chat about them")]
struct Args {
    /// Backend base URL; overrides the config file and environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Where rendered PDF pages are written.
    #[arg(long)]
    preview_dir: Option<PathBuf>,
    #[arg(long)]
    typewriter_tick_ms: Option<u64>,
    /// File to select on startup.
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(&args.config);
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(preview_dir) = args.preview_dir {
        settings.preview_dir = preview_dir;
    }
    if let Some(tick) = args.typewriter_tick_ms {
        settings.typewriter_tick_ms = tick;
    }

    let server_url = settings.server_url()?;
    let preview_dir = prepare_preview_dir(&settings.preview_dir)?;
    info!(%server_url, preview_dir = %preview_dir.display(), "docuquery starting");

    let surface = TerminalSurface::new(preview_dir);
    let controller = UploadController::new(
        Arc::new(HttpBackend::new(&server_url)),
        surface.clone(),
        settings.typewriter_tick(),
    );

    let mut initial = Vec::new();
    if let Some(path) = args.file {
        let files = read_selection(std::slice::from_ref(&path)).await;
        if !files.is_empty() {
            initial.push(UserAction::FilesPicked(files));
        }
    }

    println!("{}", commands::help());
    controller
        .run(LineEventSource::new(surface, initial))
        .await;
    info!("docuquery exiting");
    Ok(())
}
