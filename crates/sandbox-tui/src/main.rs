//! Terminal UI for a local chain sandbox session.
mod app;
mod ui;

use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use sandbox_core::{constants::GENESIS_DATA, ChainConfig, Session, TimestampMode};
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::{handle_key, App};

#[derive(Parser, Debug, Clone)]
struct Args {
    /// Whether block timestamps are committed into the hash (`committed` or `excluded`)
    #[arg(long, default_value_t = TimestampMode::Committed)]
    timestamp_mode: TimestampMode,

    /// Payload of the genesis block
    #[arg(long, default_value = GENESIS_DATA)]
    genesis_data: String,

    /// Write logs here; the terminal is owned by the UI
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(File::create(path)?))
            .init();
    }

    let session = Session::new(
        ChainConfig::default()
            .with_timestamp_mode(args.timestamp_mode)
            .with_genesis_data(args.genesis_data),
    );

    // terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = run_app(&mut terminal, &mut app).await;
    app.session.cancel_mining();

    // restore
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if handle_key(app, key)? {
                    break;
                }
            }
        }
        app.tick();
        tokio::task::yield_now().await;
    }
    Ok(())
}
