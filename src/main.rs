use std::path::PathBuf;
use std::process::ExitCode;

mod controller;
mod domain;
mod feed;
mod model;
mod table;
mod ui;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use controller::Controller;
use domain::{CovConfig, CovError};
use model::{Model, Status};
use ui::TableUI;

#[derive(Parser, Debug)]
#[command(version, about = "A tui based viewer for statewise COVID-19 statistics.")]
struct Args {
    /// Override the feed URL
    #[arg(long)]
    url: Option<String>,

    /// Initial rows per page (5, 10 or 15)
    #[arg(long)]
    page_size: Option<usize>,

    /// Append logs to this file (filtered with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn run() -> Result<(), CovError> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let mut cfg = CovConfig::default();
    if let Some(url) = args.url {
        cfg = cfg.url(url);
    }
    if let Some(page_size) = args.page_size {
        cfg = cfg.page_size(page_size);
    }

    let mut model = Model::init(&cfg)?;
    let ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    model.start_fetch()?;

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Apply a finished fetch, expire stale notifications
        model.poll();

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}

fn init_logging(path: &PathBuf) -> Result<(), CovError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .init();
    info!("Started covview!");
    Ok(())
}
