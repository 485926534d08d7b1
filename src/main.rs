use std::fs::File;
use std::io;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event as CEvent, KeyCode, KeyEvent},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tui::{backend::CrosstermBackend, Terminal};

use crate::bindings::{Dashboard, Selections};
use crate::config::{Cli, Config, LoggingConfig};
use crate::controls::ControlPanel;
use crate::dataset::LoadedDataset;
use crate::ui::Header;

mod aggregate;
mod bindings;
mod chart;
mod config;
mod controls;
mod csv_reader;
mod dataset;
mod error;
mod fetch;
mod ui;

enum Event<I> {
    Input(I),
    Tick,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    init_logging(&config.logging, cli.debug)?;
    info!(debug = cli.debug, "startup");

    let loaded = dataset::load(&config.dataset).context("loading dataset")?;

    enable_raw_mode().context("enabling raw mode")?;
    let result = run(&loaded, &config);
    disable_raw_mode()?;
    if let Err(e) = &result {
        error!(error = %e, "dashboard stopped");
    }
    result
}

/// The terminal belongs to the dashboard, so logs go to a file.
fn init_logging(config: &LoggingConfig, debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug,income_insights=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
    };
    let file = File::create(&config.file)
        .with_context(|| format!("creating log file {}", config.file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(loaded: &LoadedDataset, config: &Config) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms);
    thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            match event::poll(timeout) {
                Ok(true) => {
                    if let Ok(CEvent::Key(key)) = event::read() {
                        if tx.send(Event::Input(key)).is_err() {
                            return;
                        }
                    }
                }
                Ok(false) => {}
                Err(_) => return,
            }

            if last_tick.elapsed() >= tick_rate {
                if let Ok(_) = tx.send(Event::Tick) {
                    last_tick = Instant::now();
                }
            }
        }
    });

    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let table = &loaded.table;
    let mut dashboard = Dashboard::new(table, Selections::from_config(&config.ui));
    let mut panel = ControlPanel::new(table);
    let header = Header {
        source: &loaded.source,
        rows: dashboard.table().len(),
        loaded_at: loaded.loaded_at,
        fetched: loaded.fetched,
    };

    loop {
        terminal.draw(|rect| {
            ui::draw(rect, &dashboard, &panel, &header, config.ui.parallel_max_lines);
        })?;

        match rx.recv()? {
            Event::Input(KeyEvent { code: KeyCode::Char('q'), .. }) => {
                terminal.clear()?;
                terminal.show_cursor()?;
                break;
            }
            Event::Input(key) => {
                if let Some(change) = panel.handle_key(key.code, dashboard.selections()) {
                    debug!(control = change.control().id(), "control changed");
                    let updated = dashboard.apply(change);
                    debug!(charts = updated.len(), "charts replaced");
                }
            }
            Event::Tick => {}
        }
    }

    info!("shutdown");
    Ok(())
}
