use crate::model::Status;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "taskdeck",
    version,
    about = "Terminal task tracker with priority scoring and a Pomodoro timer"
)]
pub struct Cli {
    /// Path to a config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Start without the demo tasks
    #[arg(long, global = true)]
    pub empty: bool,
    /// Raise log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the interactive TUI
    Tui,
    /// Print tasks in priority order
    List {
        #[arg(long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },
    /// Print the status board
    Board {
        /// Only show one column
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Compute the priority score for a pair of ratings
    Priority {
        /// Urgency, 1-5
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        urgency: u8,
        /// Importance, 1-5
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        importance: u8,
    },
    /// Run the work/break timer without the TUI
    Timer {
        /// Work interval in minutes
        #[arg(long)]
        work: Option<String>,
        /// Break interval in minutes
        #[arg(long = "break")]
        break_minutes: Option<String>,
        /// Stop after this many completed intervals
        #[arg(long)]
        cycles: Option<u32>,
        /// Do not ring the bell
        #[arg(long)]
        silent: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Text,
    Yaml,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Todo,
    InProgress,
    Done,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Todo => Status::Todo,
            StatusArg::InProgress => Status::InProgress,
            StatusArg::Done => Status::Done,
        }
    }
}
