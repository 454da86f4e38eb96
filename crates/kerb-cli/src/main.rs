//! `kerb` — terminal UI for the household waste and wastewater survey.
//!
//! # Usage
//!
//! ```
//! kerb --endpoint https://script.example.com/exec --sheet-id 1AbC...
//! kerb --config ~/.config/kerb/kerb.toml
//! ```
//!
//! Settings are layered: built-in defaults, then the TOML file, then
//! `KERB_*` environment variables, then command-line flags.

mod app;
mod client;
mod form;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  path::PathBuf,
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result, bail};
use app::App;
use clap::Parser;
use client::{ApiConfig, SheetClient};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kerb_core::{coordinator::Coordinator, store::RecordStore};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kerb", version, about = "Household waste and wastewater survey")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", env = "KERB_CONFIG", default_value = "kerb.toml")]
  config: PathBuf,

  /// URL of the scripted spreadsheet endpoint.
  #[arg(long)]
  endpoint: Option<String>,

  /// Spreadsheet holding the records.
  #[arg(long)]
  sheet_id: Option<String>,

  /// Drive folder that receives uploaded photos.
  #[arg(long)]
  folder_id: Option<String>,

  /// Request timeout in seconds.
  #[arg(long)]
  timeout_secs: Option<u64>,

  /// Where log output goes; the terminal is taken by the UI.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Settings ─────────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct Settings {
  endpoint:     String,
  sheet_id:     String,
  #[serde(default)]
  folder_id:    String,
  timeout_secs: u64,
  log_file:     PathBuf,
}

impl Settings {
  fn load(args: &Args) -> Result<Self> { Self::layered(args, None) }

  /// Layer defaults, the config file, `KERB_*` variables and flags. `env`
  /// stands in for the process environment when given.
  fn layered(args: &Args, env: Option<config::Map<String, String>>) -> Result<Self> {
    let settings = config::Config::builder()
      .set_default("timeout_secs", 30)?
      .set_default("log_file", "kerb.log")?
      .add_source(config::File::from(args.config.as_path()).required(false))
      .add_source(config::Environment::with_prefix("KERB").source(env))
      .set_override_option("endpoint", args.endpoint.clone())?
      .set_override_option("sheet_id", args.sheet_id.clone())?
      .set_override_option("folder_id", args.folder_id.clone())?
      .set_override_option("timeout_secs", args.timeout_secs)?
      .set_override_option(
        "log_file",
        args.log_file.as_ref().map(|p| p.display().to_string()),
      )?
      .build()
      .with_context(|| format!("reading config from {}", args.config.display()))?;

    let settings: Settings = settings
      .try_deserialize()
      .context("endpoint and sheet_id must be set (config file, KERB_* env or flags)")?;

    if settings.endpoint.trim().is_empty() {
      bail!("endpoint is empty");
    }
    if settings.sheet_id.trim().is_empty() {
      bail!("sheet_id is empty");
    }
    Ok(settings)
  }

  fn api_config(&self) -> ApiConfig {
    ApiConfig {
      endpoint:  self.endpoint.clone(),
      sheet_id:  self.sheet_id.clone(),
      folder_id: self.folder_id.clone(),
      timeout:   Duration::from_secs(self.timeout_secs),
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let settings = Settings::load(&args)?;

  let log = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&settings.log_file)
    .with_context(|| format!("opening log file {}", settings.log_file.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(Mutex::new(log))
    .with_ansi(false)
    .init();

  info!(endpoint = %settings.endpoint, sheet = %settings.sheet_id, "starting");
  if settings.folder_id.trim().is_empty() {
    warn!("folder_id is not set; photo uploads will be refused");
  }

  let client = SheetClient::new(settings.api_config())?;
  let mut app = App::new(Coordinator::new(client));

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<S: RecordStore>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<S>,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Queued store work runs after the frame showing its busy indicator.
    if app.run_queued().await {
      continue;
    }

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key) {
          break;
        }
      }
      // Resize and everything else: redraw on the next iteration.
      _ => {}
    }
  }

  info!("exiting");
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn args(flags: &[&str]) -> Args {
    Args::parse_from(std::iter::once("kerb").chain(flags.iter().copied()))
  }

  fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
    Some(
      vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    )
  }

  #[test]
  fn flags_beat_env_beat_file_beat_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kerb.toml");
    fs::write(
      &path,
      r#"
endpoint = "https://file/exec"
sheet_id = "file-sheet"
folder_id = "file-folder"
timeout_secs = 10
"#,
    )
    .unwrap();
    let path = path.display().to_string();

    let settings = Settings::layered(
      &args(&["--config", &path, "--folder-id", "flag-folder"]),
      env(&[("KERB_SHEET_ID", "env-sheet"), ("KERB_FOLDER_ID", "env-folder")]),
    )
    .unwrap();

    assert_eq!(settings.endpoint, "https://file/exec");
    assert_eq!(settings.sheet_id, "env-sheet");
    assert_eq!(settings.folder_id, "flag-folder");
    assert_eq!(settings.timeout_secs, 10);
    assert_eq!(settings.log_file, PathBuf::from("kerb.log"));
  }

  #[test]
  fn defaults_fill_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml").display().to_string();
    let settings = Settings::layered(
      &args(&["--config", &missing, "--endpoint", "https://x/exec", "--sheet-id", "s"]),
      env(&[]),
    )
    .unwrap();

    assert_eq!(settings.timeout_secs, 30);
    assert_eq!(settings.folder_id, "");
    assert_eq!(settings.api_config().timeout, Duration::from_secs(30));
  }

  #[test]
  fn missing_or_blank_sheet_id_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml").display().to_string();

    let err = Settings::layered(
      &args(&["--config", &missing, "--endpoint", "https://x/exec"]),
      env(&[]),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("sheet_id"));

    let err = Settings::layered(
      &args(&["--config", &missing, "--endpoint", "https://x/exec"]),
      env(&[("KERB_SHEET_ID", "  ")]),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "sheet_id is empty");
  }
}
