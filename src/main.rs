mod api;
mod app;
mod config;
mod dispatch;
mod error;
mod form;
mod task;
mod task_manager;
mod ui;

use std::{fs::OpenOptions, io, path::Path, sync::Arc, sync::Mutex};

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{api::HttpTaskApi, app::App, config::Config, dispatch::Dispatcher};

fn init_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_logging(&config.log_file)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let api = HttpTaskApi::new(&config.api_url, config.timeout())?;
    let (dispatcher, mut events) = Dispatcher::new(Arc::new(api), runtime.handle().clone());
    info!(api_url = %config.api_url, "starting task view");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let result = ui::run_app(&mut terminal, &mut app, &dispatcher, &mut events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(%err, "terminal loop failed");
        eprintln!("{:?}", err);
    }
    Ok(())
}
