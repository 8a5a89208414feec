//! Terminal dashboard for the enerdash home energy simulator.
//!
//! Spawns one synchronization panel per device (smart meter, solar,
//! battery, inverter, load) against the backend REST API and renders
//! their live stores in a ratatui interface. Edits made here apply
//! optimistically and post partial updates; the next poll is
//! authoritative.

mod app;
mod config;
mod input;
mod ui;

use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use enerdash_core::{HttpClient, Panel, Transport};
use enerdash_types::DeviceKind;

use app::App;
use config::Config;

/// Terminal dashboard for the energy simulator backend.
#[derive(Debug, Parser)]
#[command(name = "enerdash", version, about)]
struct Args {
    /// Base URL of the simulation backend
    #[arg(long)]
    base_url: Option<String>,

    /// Append logs to this file (the screen belongs to the TUI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Set up the terminal for TUI rendering
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Route tracing output to a file; the alternate screen stays clean.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Main event loop
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        app.clean_expired_messages();
        app.poll_version();

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with a timeout; panel refreshes arrive through
        // the stores regardless.
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = input::handle_key(key.code, input::is_editing(app));
            input::apply_action(app, action);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load();
    init_tracing(args.log_file.as_deref())?;

    let base_url = config.resolve_base_url(args.base_url.clone());
    info!(%base_url, "starting dashboard");

    let client = HttpClient::new(&base_url)?;
    let transport: Arc<dyn Transport> = Arc::new(client.clone());

    // Probe the backend version in the background; the header fills in
    // whenever the answer lands.
    let (version_tx, version_rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Ok(api) = client.version().await {
            let _ = version_tx.send(api.version);
        }
    });

    let panels: Vec<Panel> = DeviceKind::PANELS
        .iter()
        .map(|&kind| Panel::spawn_with_period(kind, transport.clone(), config.poll_period(kind)))
        .collect();
    let mut app = App::new(panels, Some(version_rx));

    let mut terminal = setup_terminal()?;

    // Run the app and ensure terminal is restored even on error
    let result = run_event_loop(&mut terminal, &mut app).await;

    app.shutdown();
    restore_terminal()?;

    result
}
