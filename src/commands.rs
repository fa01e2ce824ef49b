use crate::alert::{Alert, Silent};
use crate::cli::{ListFormat, StatusArg};
use crate::config::Config;
use crate::model::{priority, Status, Task, TaskId};
use crate::seed::seed_demo;
use crate::store::TaskStore;
use crate::timer::{parse_minutes, PomodoroTimer};
use crate::ui;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::{self, Write};
use std::thread;
use std::time::Instant;

/// Builds the in-memory store for this session.
pub fn open_store(config: &Config, empty: bool) -> TaskStore {
    let mut store = TaskStore::new();
    if config.seed_demo_tasks && !empty {
        seed_demo(&mut store);
    }
    store
}

pub fn list(store: &TaskStore, format: ListFormat) -> Result<()> {
    let view = store.sorted_view();
    match format {
        ListFormat::Text => {
            if view.is_empty() {
                println!("No tasks yet");
            }
            for task in view {
                print_task(task);
            }
        }
        ListFormat::Yaml => {
            let rows: Vec<TaskRow<'_>> = view.into_iter().map(TaskRow::from).collect();
            let out = serde_yaml::to_string(&rows).context("serializing task list")?;
            print!("{}", out);
        }
    }
    Ok(())
}

pub fn board(store: &TaskStore, only: Option<StatusArg>) -> Result<()> {
    let filter = only.map(Status::from);
    for status in Status::ALL {
        if filter.is_some_and(|f| f != status) {
            continue;
        }
        let tasks = store.by_status(status);
        println!("{} ({})", status.label(), tasks.len());
        if tasks.is_empty() {
            println!("  (empty)");
        }
        for task in tasks {
            print_task(task);
        }
        println!();
    }
    Ok(())
}

pub fn priority_score(urgency: u8, importance: u8) -> Result<()> {
    println!("{}", priority(urgency, importance));
    Ok(())
}

pub fn timer(
    config: &Config,
    work: Option<String>,
    break_minutes: Option<String>,
    cycles: Option<u32>,
    silent: bool,
) -> Result<()> {
    let work = work
        .as_deref()
        .map(parse_minutes)
        .unwrap_or(config.timer.work_minutes);
    let rest = break_minutes
        .as_deref()
        .map(parse_minutes)
        .unwrap_or(config.timer.break_minutes);
    let alert: Box<dyn Alert> = if silent {
        Box::new(Silent)
    } else {
        config.timer.alert.build()
    };
    let mut timer = PomodoroTimer::new(work, rest, alert);
    tracing::info!(work, rest, ?cycles, "starting headless timer");
    timer.toggle();

    let mut out = io::stdout();
    let mut completed = 0u32;
    let finished = |completed: u32| cycles.is_some_and(|limit| completed >= limit);
    while !finished(completed) {
        write!(out, "\r{:<17} {}", timer.mode().label(), timer.clock())?;
        out.flush()?;
        if let Some(deadline) = timer.next_deadline() {
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
        }
        for done in timer.advance(Instant::now()) {
            completed += 1;
            writeln!(
                out,
                "\r{} interval finished, {} started",
                done.finished, done.started
            )?;
        }
    }
    timer.reset();
    writeln!(out)?;
    Ok(())
}

pub fn tui(config: &Config, store: TaskStore) -> Result<()> {
    let timer = PomodoroTimer::new(
        config.timer.work_minutes,
        config.timer.break_minutes,
        config.timer.alert.build(),
    );
    ui::run(store, timer)
}

#[derive(Serialize)]
struct TaskRow<'a> {
    id: &'a TaskId,
    title: &'a str,
    description: &'a str,
    due_date: NaiveDate,
    urgency: u8,
    importance: u8,
    priority_score: u32,
    status: Status,
}

impl<'a> From<&'a Task> for TaskRow<'a> {
    fn from(task: &'a Task) -> Self {
        TaskRow {
            id: &task.id,
            title: &task.title,
            description: &task.description,
            due_date: task.due_date,
            urgency: task.urgency,
            importance: task.importance,
            priority_score: task.priority_score(),
            status: task.status,
        }
    }
}

fn print_task(task: &Task) {
    println!(
        "  - [{:>2}] {}: {}",
        task.priority_score(),
        task.id,
        task.title
    );
    if !task.description.is_empty() {
        println!("    {}", task.description);
    }
    println!(
        "    due: {}  urgency: {}  importance: {}  status: {}",
        format_due(task.due_date),
        task.urgency,
        task.importance,
        task.status
    );
}

pub fn format_due(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
