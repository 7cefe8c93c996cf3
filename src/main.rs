// Main entry point - Dependency injection and console loop
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{sync::Arc, time::Duration};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing_subscriber::EnvFilter;

use crate::application::fetch_orchestrator::FetchOrchestrator;
use crate::application::settings_store::MemorySettingsStore;
use crate::infrastructure::config::load_visualizer_config;
use crate::infrastructure::http_loader::HttpJsonLoader;
use crate::presentation::console::{format_status, parse_command, Command, HELP};
use crate::presentation::notifier::ConsoleNotifier;
use crate::presentation::text_renderer::TextRendererFactory;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_visualizer_config()?;

    // Initialize tracing; RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Wire the session (application layer) to its adapters
    let store = Arc::new(MemorySettingsStore::new(config.initial_settings()));
    let loader = Arc::new(HttpJsonLoader::new(REQUEST_TIMEOUT)?);
    let session = FetchOrchestrator::spawn(
        store,
        loader,
        Arc::new(ConsoleNotifier),
        Arc::new(TextRendererFactory),
        config.timings(),
    );

    println!("Starting startup-visualizer against {} (type `help`)", config.server_url);
    session.mount().await?;

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    loop {
        tokio::select! {
            line = lines.next() => {
                let Some(line) = line else {
                    break;
                };
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Change(change)) => session.change(change).await?,
                    Ok(Command::Reload) => session.reload().await?,
                    Ok(Command::Status) => println!("{}", format_status(&session.snapshot().await?)),
                    Ok(Command::Help) => println!("{}", HELP),
                    Ok(Command::Quit) => break,
                    Err(e) => eprintln!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.teardown().await?;
    Ok(())
}
