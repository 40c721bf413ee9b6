// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use money_tracker::config::{default_config_path, AppConfig};
use money_tracker::lock::now_ms;
use money_tracker::{logging, LockMachine, SqliteStore, Storage, Store};

/// Personal expense tracker with monthly budgets and a PIN lock
#[derive(Parser, Debug)]
#[command(name = "money-tracker")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: <config dir>/money-tracker/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite file holding the app data
    #[arg(long)]
    data: Option<PathBuf>,

    /// Log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = AppConfig::load_from(&config_path)?;
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(log_file) = args.log_file {
        config.log_path = log_file;
    }

    let _guard = logging::init(&config.log_path)?;
    tracing::info!(
        version = money_tracker::VERSION,
        data = ?config.data_path,
        "money-tracker starting"
    );

    let backend = SqliteStore::open(&config.data_path)
        .with_context(|| format!("Failed to open data file {:?}", config.data_path))?;
    let store = Store::open(Storage::new(backend));
    let lock = LockMachine::restore(
        store.storage(),
        &config.pin,
        config.inactivity_timeout_ms(),
        now_ms(),
    );

    run_ui_mode(store, lock, &config)?;

    tracing::info!("money-tracker exiting");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: Store, lock: LockMachine, config: &AppConfig) -> Result<()> {
    let mut app = ui::App::new(store, lock, config.lock_check_interval(), now_ms());
    ui::run_ui(&mut app)?;

    println!("✅ Data saved to {}", config.data_path.display());
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: Store, _lock: LockMachine, _config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
