//! CareBridge TUI - a terminal front end for the CareBridge core.
//!
//! Renders the header with its notification badge, the toast list, the login
//! dialog and the routed pages, and drives the session store and notification
//! queue from the keyboard.

mod app;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use carebridge_core::{CareCore, Config, PlaceholderIdentity, StorageBackend};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Environment variable overriding the configured storage backend
const STORAGE_ENV: &str = "CAREBRIDGE_STORAGE";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a daily file under the data directory so they never draw over
/// the terminal UI. The returned guard flushes on drop.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(log_dir, "carebridge.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

fn load_config() -> Config {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    if let Ok(value) = std::env::var(STORAGE_ENV) {
        match value.parse::<StorageBackend>() {
            Ok(backend) => config.storage = backend,
            Err(e) => warn!(error = %e, "Ignoring {}", STORAGE_ENV),
        }
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_dir = Config::default()
        .data_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("logs");
    let _log_guard = init_tracing(&log_dir);

    let config = load_config();
    info!(storage = ?config.storage, "CareBridge TUI starting");

    let storage = config.open_storage().context("Failed to open credential storage")?;
    let core = CareCore::new(storage, Arc::new(PlaceholderIdentity::default()), &config);

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--logout" {
        core.logout();
        eprintln!("Stored session cleared.");
        return Ok(());
    }

    // Resolve the stored session in the background; the UI shows a
    // placeholder for protected pages until it lands
    let session = core.session().clone();
    tokio::spawn(async move {
        let status = session.initialize().await;
        info!(?status, "Session resolved");
    });

    let mut app = App::new(core, config, Config::config_path().ok());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("CareBridge TUI shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Pick up store changes (timer expiries, session resolution)
        app.check_updates();

        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout so expiring toasts disappear on time
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Let the timer and initialization tasks run between frames
        tokio::task::yield_now().await;
    }
}
