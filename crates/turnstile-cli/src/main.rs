//! `turnstile` — terminal UI for the turnstile check-in tracker.
//!
//! # Usage
//!
//! ```
//! turnstile --store checkins.db
//! turnstile --config ~/.config/turnstile/config.toml
//! ```

mod app;
mod ui;

use std::{io, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use turnstile_store_sqlite::SqliteStore;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  name = "turnstile",
  about = "Terminal UI for the turnstile check-in tracker"
)]
struct Args {
  /// Path to a TOML config file (store_path, export_dir, log_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Path to the SQLite record store (default: turnstile.db).
  #[arg(long, env = "TURNSTILE_STORE")]
  store: Option<PathBuf>,

  /// Directory exported QR code PNGs are written into (default: ".").
  #[arg(long, env = "TURNSTILE_EXPORT_DIR")]
  export_dir: Option<PathBuf>,

  /// Log file (default: turnstile.log). The terminal owns stdout.
  #[arg(long, env = "TURNSTILE_LOG")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  store_path: String,
  #[serde(default)]
  export_dir: String,
  #[serde(default)]
  log_file:   String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let store_path = args
    .store
    .or_else(|| {
      (!file_cfg.store_path.is_empty())
        .then(|| PathBuf::from(&file_cfg.store_path))
    })
    .unwrap_or_else(|| PathBuf::from("turnstile.db"));
  let export_dir = args
    .export_dir
    .or_else(|| {
      (!file_cfg.export_dir.is_empty())
        .then(|| PathBuf::from(&file_cfg.export_dir))
    })
    .unwrap_or_else(|| PathBuf::from("."));
  let log_file = args
    .log_file
    .or_else(|| {
      (!file_cfg.log_file.is_empty()).then(|| PathBuf::from(&file_cfg.log_file))
    })
    .unwrap_or_else(|| PathBuf::from("turnstile.log"));

  // Initialise tracing into the log file; the TUI owns the terminal.
  let log = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(&log_file)
    .with_context(|| format!("opening log file {}", log_file.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(Arc::new(log))
    .with_ansi(false)
    .init();

  // Open the store and hand it to the app as an explicit dependency.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {}", store_path.display()))?;
  let mut app = App::new(store, export_dir);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Load initial data.
  let load_result = app.load_records().await;

  // Run the event loop; restore terminal even on error.
  let run_result = if load_result.is_ok() {
    run_event_loop(&mut terminal, &mut app).await
  } else {
    load_result
  };

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<SqliteStore>,
) -> Result<()> {
  loop {
    // Apply any pushed list updates before drawing.
    app.drain_changes().await;

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(evt) = maybe_event {
      match evt {
        Event::Key(key) => {
          let cont = app.handle_key(key).await?;
          if !cont {
            break;
          }
        }
        Event::Resize(_, _) => {
          // Terminal will redraw on next iteration.
        }
        _ => {}
      }
    }
  }

  Ok(())
}
