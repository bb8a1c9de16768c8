mod catalog;
mod config;
mod constants;
mod deleter;
mod engine;
mod exclude;
mod model;
mod runlog;
mod scanner;
mod schedule;
mod trash;
mod ui;

use anyhow::Result;
use clap::Parser;
use config::Settings;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use ui::app::App;

#[derive(Parser)]
#[command(version, about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Read settings from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = runlog::default_log_dir();
    if let Some(dir) = &log_dir
        && let Err(err) = init_tracing(dir)
    {
        eprintln!("diagnostic logging disabled: {err:#}");
    }

    let settings = cli
        .settings
        .as_deref()
        .map_or_else(Settings::load, Settings::load_from);
    let engine = Arc::new(engine::ReclaimEngine::new(
        catalog::PathCatalog::system()?,
        trash::TrashEmptier::system(),
    ));

    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(engine, settings, log_dir);

    let res = ui::run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

/// Diagnostics go to a file so they never draw over the terminal UI.
fn init_tracing(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(log_dir.join(constants::DIAGNOSTICS_LOG))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
