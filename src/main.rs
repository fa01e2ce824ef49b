mod alert;
mod cli;
mod commands;
mod config;
mod logging;
mod model;
mod seed;
mod store;
mod timer;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let location = config::locate_config(args.config.clone())?;
    let config = config::load_config(&location)?;
    let command = args.command.unwrap_or(cli::Command::Tui);
    let target = match command {
        cli::Command::Tui => logging::LogTarget::File,
        _ => logging::LogTarget::Stderr,
    };
    logging::init(&config, args.verbose, target)?;
    tracing::debug!(
        path = %location.path.display(),
        explicit = location.explicit,
        "configuration loaded"
    );

    let store = commands::open_store(&config, args.empty);
    match command {
        cli::Command::Tui => commands::tui(&config, store),
        cli::Command::List { format } => commands::list(&store, format),
        cli::Command::Board { status } => commands::board(&store, status),
        cli::Command::Priority {
            urgency,
            importance,
        } => commands::priority_score(urgency, importance),
        cli::Command::Timer {
            work,
            break_minutes,
            cycles,
            silent,
        } => commands::timer(&config, work, break_minutes, cycles, silent),
    }
}
