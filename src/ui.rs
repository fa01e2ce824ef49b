use crate::model::{priority, PriorityTier, Status, Task, TaskFields, TaskId, RATING_RANGE};
use crate::store::TaskStore;
use crate::timer::{parse_minutes, Mode as TimerMode, PomodoroTimer};
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const DUE_FORMAT: &str = "%Y-%m-%d";
const TIMER_PANEL_WIDTH: u16 = 34;
const FORM_HINT: &str = "Enter saves (in Description: Tab out first, or Ctrl+Enter) • Esc cancels • Tab/Shift-Tab move • ←→ adjust ratings";

pub fn run(store: TaskStore, timer: PomodoroTimer) -> Result<()> {
    let (mut terminal, enhanced_keys) = setup_terminal()?;
    let mut app = App::new(store, timer);
    tracing::info!(tasks = app.store.len(), enhanced_keys, "tui started");
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal, enhanced_keys)?;
    tracing::info!("tui closed");
    result
}

struct App {
    store: TaskStore,
    timer: PomodoroTimer,
    view: ViewMode,
    mode: Mode,
    dashboard_idx: usize,
    dashboard_offset: usize,
    selected_column: usize,
    selected_task: usize,
    scroll_offsets: [usize; 3],
    status: String,
}

enum Mode {
    Normal,
    Creating(TaskForm),
    Editing { task_id: TaskId, form: TaskForm },
    ConfirmDelete { task_id: TaskId },
    Durations(DurationForm),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ViewMode {
    Dashboard,
    Board,
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Dashboard => "Dashboard",
            ViewMode::Board => "Board",
        }
    }
}

struct TaskForm {
    title: FieldValue,
    description: FieldValue,
    due: FieldValue,
    urgency: u8,
    importance: u8,
    field: FormField,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FormField {
    Title,
    Description,
    Due,
    Urgency,
    Importance,
}

enum FormAction {
    Create,
    Edit(TaskId),
}

struct DurationForm {
    work: FieldValue,
    rest: FieldValue,
    field: DurationField,
    work_touched: bool,
    rest_touched: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DurationField {
    Work,
    Break,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char_boundary(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char_boundary(self.cursor, &self.value);
    }

    fn move_up(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx == 0 {
            return;
        }
        let target_start = line_starts[line_idx - 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn move_down(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx + 1 >= line_starts.len() {
            return;
        }
        let target_start = line_starts[line_idx + 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl App {
    fn new(store: TaskStore, timer: PomodoroTimer) -> Self {
        let status = format!("{} task(s) loaded", store.len());
        App {
            store,
            timer,
            view: ViewMode::Dashboard,
            mode: Mode::Normal,
            dashboard_idx: 0,
            dashboard_offset: 0,
            selected_column: 0,
            selected_task: 0,
            scroll_offsets: [0; 3],
            status,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key)? {
                        break;
                    }
                }
            }
            self.pump_timer(Instant::now());
        }
        self.timer.reset();
        Ok(())
    }

    fn pump_timer(&mut self, now: Instant) {
        for done in self.timer.advance(now) {
            self.status = match done.started {
                TimerMode::Break => "Work interval done, break started".into(),
                TimerMode::Work => "Break over, back to work".into(),
            };
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Creating(_) | Mode::Editing { .. } => self.handle_form_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
            Mode::Durations(_) => self.handle_duration_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => {
                self.set_view(ViewMode::Dashboard);
                return Ok(false);
            }
            KeyCode::Char('2') => {
                self.set_view(ViewMode::Board);
                return Ok(false);
            }
            KeyCode::Char('n') => {
                self.mode = Mode::Creating(TaskForm::new(today()));
                self.status =
                    "Creating new task (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
                return Ok(false);
            }
            KeyCode::Char('e') => {
                let picked = self
                    .current_task()
                    .map(|task| (task.id.clone(), task.title.clone(), TaskForm::from_task(task)));
                if let Some((task_id, title, form)) = picked {
                    self.status = format!("Editing {}", title);
                    self.mode = Mode::Editing { task_id, form };
                } else {
                    self.status = "No task selected to edit".into();
                }
                return Ok(false);
            }
            KeyCode::Char('d') => {
                let picked = self
                    .current_task()
                    .map(|task| (task.id.clone(), task.title.clone()));
                if let Some((task_id, title)) = picked {
                    self.status = format!("Delete {}? (y to confirm, n/Esc to cancel)", title);
                    self.mode = Mode::ConfirmDelete { task_id };
                } else {
                    self.status = "No task selected to delete".into();
                }
                return Ok(false);
            }
            KeyCode::Char(' ') => {
                self.timer.toggle();
                self.status = if self.timer.is_active() {
                    format!("Timer running ({})", self.timer.mode())
                } else {
                    "Timer paused".into()
                };
                return Ok(false);
            }
            KeyCode::Char('r') => {
                self.timer.reset();
                self.status = "Timer reset".into();
                return Ok(false);
            }
            KeyCode::Char('t') => {
                self.timer.toggle_minimized();
                return Ok(false);
            }
            KeyCode::Char('w') => {
                self.mode = Mode::Durations(DurationForm::from_timer(&self.timer));
                self.status = "Timer durations in minutes (Tab switch, Enter save, Esc cancel)".into();
                return Ok(false);
            }
            _ => {}
        }

        match self.view {
            ViewMode::Dashboard => self.handle_dashboard_key(key),
            ViewMode::Board => self.handle_board_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.dashboard_idx = self.dashboard_idx.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.dashboard_idx + 1 < self.store.len() {
                    self.dashboard_idx += 1;
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.prev_column(),
            KeyCode::Right | KeyCode::Char('l') => self.next_column(),
            KeyCode::Up | KeyCode::Char('k') => self.prev_task(),
            KeyCode::Down | KeyCode::Char('j') => self.next_task(),
            KeyCode::Char('m') | KeyCode::Char('>') => self.move_selected(1),
            KeyCode::Char('b') | KeyCode::Char('<') => self.move_selected(-1),
            _ => {}
        }
        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut close_form = false;
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match &mut mode {
            Mode::Creating(form) => {
                close_form = self.process_form_key(FormAction::Create, form, key);
            }
            Mode::Editing { task_id, form } => {
                let id = task_id.clone();
                close_form = self.process_form_key(FormAction::Edit(id), form, key);
            }
            _ => {}
        }
        self.mode = if close_form { Mode::Normal } else { mode };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let task_id = match &self.mode {
            Mode::ConfirmDelete { task_id } => task_id.clone(),
            _ => return Ok(false),
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match self.store.delete(&task_id) {
                    Ok(task) => self.status = format!("Deleted {}", task.title),
                    Err(err) => tracing::debug!(error = %err, "delete ignored"),
                }
                self.clamp_selection();
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_duration_key(&mut self, key: KeyEvent) -> Result<bool> {
        let Mode::Durations(form) = &mut self.mode else {
            return Ok(false);
        };
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Canceled".into();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Left => form.active_field_mut().move_left(),
            KeyCode::Right => form.active_field_mut().move_right(),
            KeyCode::Backspace => form.edit_active(FieldValue::backspace),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                form.edit_active(|field| field.insert_char(c))
            }
            KeyCode::Enter => {
                // Only fields the user typed into are applied, so an untouched
                // field never resets a paused countdown.
                let (work, rest) = form.edited_minutes();
                if let Some(minutes) = work {
                    self.timer.set_work_minutes(minutes);
                }
                if let Some(minutes) = rest {
                    self.timer.set_break_minutes(minutes);
                }
                let (work, rest) = (self.timer.work_secs() / 60, self.timer.break_secs() / 60);
                tracing::info!(work, rest, "timer durations changed");
                self.status = format!("Work {} min, break {} min", work, rest);
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            self.status = format!("Switched to {} view", view.label());
        }
        self.clamp_selection();
    }

    fn process_form_key(&mut self, action: FormAction, form: &mut TaskForm, key: KeyEvent) -> bool {
        let mut close_form = false;
        match key.code {
            KeyCode::Esc => {
                close_form = true;
                self.status = "Canceled".into();
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Left => form.left(),
            KeyCode::Right => form.right(),
            KeyCode::Up => {
                if let Some(field) = form.active_text_mut() {
                    field.move_up();
                }
            }
            KeyCode::Down => {
                if let Some(field) = form.active_text_mut() {
                    field.move_down();
                }
            }
            KeyCode::Enter => {
                let control = key.modifiers.contains(KeyModifiers::CONTROL);
                if form.field == FormField::Description && !control {
                    form.insert_char('\n');
                } else {
                    close_form = self.try_submit(action, form);
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = form.active_text_mut() {
                    field.backspace();
                }
            }
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.insert_char(c);
                }
            }
            _ => {}
        }
        close_form
    }

    fn try_submit(&mut self, action: FormAction, form: &TaskForm) -> bool {
        let fields = match form.to_fields() {
            Ok(fields) => fields,
            Err(err) => {
                self.status = format!("Could not save: {}", err);
                return false;
            }
        };
        match action {
            FormAction::Create => {
                let task = self.store.create(fields);
                self.status = format!("Created {} (priority {})", task.title, task.priority_score());
                let id = task.id.clone();
                self.select_task(&id);
            }
            FormAction::Edit(task_id) => match self.store.update(&task_id, fields) {
                Ok(task) => {
                    self.status = format!("Updated {} (priority {})", task.title, task.priority_score());
                    self.select_task(&task_id);
                }
                Err(err) => tracing::debug!(error = %err, "update ignored"),
            },
        }
        true
    }

    fn current_task(&self) -> Option<&Task> {
        match self.view {
            ViewMode::Dashboard => self.store.sorted_view().get(self.dashboard_idx).copied(),
            ViewMode::Board => self
                .store
                .by_status(self.current_status())
                .get(self.selected_task)
                .copied(),
        }
    }

    fn current_status(&self) -> Status {
        Status::ALL[self.selected_column.min(Status::ALL.len() - 1)]
    }

    fn prev_column(&mut self) {
        if self.selected_column > 0 {
            self.selected_column -= 1;
            self.selected_task = 0;
        }
    }

    fn next_column(&mut self) {
        if self.selected_column + 1 < Status::ALL.len() {
            self.selected_column += 1;
            self.selected_task = 0;
        }
    }

    fn prev_task(&mut self) {
        self.selected_task = self.selected_task.saturating_sub(1);
    }

    fn next_task(&mut self) {
        let len = self.store.by_status(self.current_status()).len();
        if self.selected_task + 1 < len {
            self.selected_task += 1;
        }
    }

    fn move_selected(&mut self, delta: isize) {
        let Some((task_id, title, from)) = self
            .current_task()
            .map(|task| (task.id.clone(), task.title.clone(), task.status))
        else {
            self.status = "No task selected to move".into();
            return;
        };
        let to = if delta > 0 { from.next() } else { from.prev() };
        if to == from {
            self.status = format!("{} is already in {}", title, from.label());
            return;
        }
        match self.store.set_status(&task_id, to) {
            Ok(task) => {
                self.status = format!("Moved {} to {}", task.title, to.label());
                self.select_task(&task_id);
            }
            Err(err) => tracing::debug!(error = %err, "move ignored"),
        }
    }

    /// Points both views' selection at `id`.
    fn select_task(&mut self, id: &TaskId) {
        if let Some(idx) = self.store.sorted_view().iter().position(|t| &t.id == id) {
            self.dashboard_idx = idx;
        }
        if let Some(task) = self.store.get(id) {
            let status = task.status;
            self.selected_column = status.index();
            self.selected_task = self
                .store
                .by_status(status)
                .iter()
                .position(|t| &t.id == id)
                .unwrap_or(0);
        }
    }

    fn clamp_selection(&mut self) {
        self.dashboard_idx = self.dashboard_idx.min(self.store.len().saturating_sub(1));
        let column_len = self.store.by_status(self.current_status()).len();
        self.selected_task = self.selected_task.min(column_len.saturating_sub(1));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);

        let body = if self.timer.is_minimized() {
            layout[1]
        } else {
            let split = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(20), Constraint::Length(TIMER_PANEL_WIDTH)])
                .split(layout[1]);
            self.draw_timer(f, split[1]);
            split[0]
        };
        match self.view {
            ViewMode::Dashboard => self.draw_dashboard(f, body),
            ViewMode::Board => self.draw_board(f, body),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(f, "New Task", form),
            Mode::Editing { form, .. } => self.draw_form(f, "Edit Task", form),
            Mode::ConfirmDelete { task_id } => self.draw_confirm(f, task_id),
            Mode::Durations(form) => self.draw_durations(f, form),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let mut spans = vec![
            Span::styled(
                "taskdeck ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} task(s)", self.store.len()),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
        ];
        if self.timer.is_minimized() {
            spans.push(Span::raw("  •  "));
            spans.push(Span::styled(
                format!(
                    "⏱ {} {}{}",
                    self.timer.clock(),
                    self.timer.mode(),
                    if self.timer.is_active() { "" } else { " (paused)" }
                ),
                Style::default().fg(mode_color(self.timer.mode())),
            ));
        }

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_dashboard(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.store.sorted_view();
        let block = Block::default()
            .title(Span::styled(
                format!("Prioritized Tasks ({})", view.len()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if view.is_empty() {
            let msg = Paragraph::new("All clear! Press n to add a task.")
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(msg, area);
            return;
        }

        let width = area.width.saturating_sub(2);
        let selected = self.dashboard_idx.min(view.len() - 1);
        let items = view
            .iter()
            .enumerate()
            .map(|(idx, task)| dashboard_item(task, width, idx == selected))
            .collect::<Vec<_>>();
        let viewport = area.height.saturating_sub(2) as usize / DASHBOARD_ITEM_HEIGHT;
        let offset = adjust_offset(selected, self.dashboard_offset, viewport, 1, items.len());
        let mut state = ListState::default();
        state.select(Some(selected));
        *state.offset_mut() = offset;
        drop(view);
        self.dashboard_offset = offset;

        let list = List::new(items).block(block);
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_board(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        for (idx, status) in Status::ALL.iter().enumerate() {
            let accent = status_color(*status);
            let tasks = self.store.by_status(*status);
            let card_width = chunks[idx].width.saturating_sub(2);
            let items = tasks
                .iter()
                .enumerate()
                .map(|(t_idx, task)| {
                    card_item(
                        task,
                        card_width,
                        idx == self.selected_column && t_idx == self.selected_task,
                    )
                })
                .collect::<Vec<_>>();
            let mut state = ListState::default();
            let mut offset = self.scroll_offsets[idx];
            let viewport = chunks[idx].height.saturating_sub(2) as usize / CARD_ITEM_HEIGHT;
            if idx == self.selected_column {
                let sel = self.selected_task.min(items.len().saturating_sub(1));
                offset = adjust_offset(sel, offset, viewport, 1, items.len());
                self.scroll_offsets[idx] = offset;
                if !items.is_empty() {
                    state.select(Some(sel));
                }
                *state.offset_mut() = offset;
            } else {
                *state.offset_mut() = offset.min(items.len().saturating_sub(1));
            }

            let title = format!("{} ({})", status.label(), tasks.len());
            let block = Block::default()
                .title(Span::styled(
                    title,
                    Style::default()
                        .fg(accent)
                        .add_modifier(if idx == self.selected_column {
                            Modifier::BOLD | Modifier::UNDERLINED
                        } else {
                            Modifier::BOLD
                        }),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent))
                .style(Style::default().bg(Color::Rgb(16, 18, 24)));

            let list = List::new(items).block(block);
            f.render_stateful_widget(list, chunks[idx], &mut state);
        }
    }

    fn draw_timer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let mode = self.timer.mode();
        let accent = mode_color(mode);
        let block = Block::default()
            .title(Span::styled(
                "Pomodoro Timer",
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(inner);

        let heading = Paragraph::new(vec![
            Line::from(Span::styled(
                mode.label(),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                if self.timer.is_active() { "running" } else { "paused" },
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center);
        f.render_widget(heading, rows[0]);

        let clock = Paragraph::new(Span::styled(
            self.timer.clock(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        f.render_widget(clock, rows[1]);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(accent).bg(Color::Rgb(40, 42, 50)))
            .ratio(self.timer.progress())
            .label(format!("{:.0}%", self.timer.progress() * 100.0));
        f.render_widget(gauge, rows[2]);

        let durations = Paragraph::new(vec![
            Line::from(format!(
                "work {} min  •  break {} min",
                self.timer.work_secs() / 60,
                self.timer.break_secs() / 60
            )),
            Line::from(Span::styled(
                "space start/pause  r reset  w set",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        f.render_widget(durations, rows[3]);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let detail_line = match self.current_task() {
            Some(task) => selected_task_detail(task),
            None => Line::from("No task selected"),
        };
        let detail = Paragraph::new(detail_line)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title("Selected"),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("1", Style::default().fg(Color::LightCyan)),
            Span::raw(" dashboard  "),
            Span::styled("2", Style::default().fg(Color::LightCyan)),
            Span::raw(" board  "),
        ];
        match self.view {
            ViewMode::Dashboard => spans.extend([
                Span::styled("↑↓ / j k", Style::default().fg(Color::LightCyan)),
                Span::raw(" select  "),
            ]),
            ViewMode::Board => spans.extend([
                Span::styled("←↑↓→ / h j k l", Style::default().fg(Color::LightCyan)),
                Span::raw(" move  "),
                Span::styled("m/>", Style::default().fg(Color::LightGreen)),
                Span::raw(" forward  "),
                Span::styled("b/<", Style::default().fg(Color::LightGreen)),
                Span::raw(" back  "),
            ]),
        }
        spans.extend([
            Span::styled("n", Style::default().fg(Color::LightMagenta)),
            Span::raw(" new  "),
            Span::styled("e", Style::default().fg(Color::LightYellow)),
            Span::raw(" edit  "),
            Span::styled("d", Style::default().fg(Color::LightRed)),
            Span::raw(" delete  "),
            Span::styled("space/r/w/t", Style::default().fg(Color::LightBlue)),
            Span::raw(" timer  "),
            Span::styled("q", Style::default().fg(Color::LightRed)),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &TaskForm) {
        let area = centered_rect(70, 70, f.size());
        let mut lines = Vec::new();
        lines.extend(field_lines(
            "Title",
            &form.title,
            form.field == FormField::Title,
        ));
        lines.extend(field_lines(
            "Description",
            &form.description,
            form.field == FormField::Description,
        ));
        lines.extend(field_lines(
            "Due (YYYY-MM-DD)",
            &form.due,
            form.field == FormField::Due,
        ));
        lines.push(slider_line(
            "Urgency",
            form.urgency,
            ("Not Urgent", "Critical"),
            form.field == FormField::Urgency,
        ));
        lines.push(slider_line(
            "Importance",
            form.importance,
            ("Not Important", "Very Important"),
            form.field == FormField::Importance,
        ));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            FORM_HINT,
            Style::default().fg(Color::Gray),
        )));

        let score = form.priority_preview();
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Line::from(vec![
                        Span::styled(
                            title.to_string(),
                            Style::default()
                                .fg(Color::Cyan)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::raw("  •  calculated priority "),
                        Span::styled(
                            score.to_string(),
                            Style::default()
                                .fg(tier_color(PriorityTier::of(score)))
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_durations(&self, f: &mut ratatui::Frame<'_>, form: &DurationForm) {
        let area = centered_rect(40, 30, f.size());
        let mut lines = Vec::new();
        lines.extend(field_lines(
            "Work (min)",
            &form.work,
            form.field == DurationField::Work,
        ));
        lines.extend(field_lines(
            "Break (min)",
            &form.rest,
            form.field == DurationField::Break,
        ));
        lines.push(Line::from(""));
        let note = if self.timer.is_active() {
            "Running interval keeps its length; new values apply next interval"
        } else {
            "Enter to save • Esc to cancel"
        };
        lines.push(Line::from(Span::styled(note, Style::default().fg(Color::Gray))));
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        "Timer Durations",
                        Style::default()
                            .fg(Color::LightBlue)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightBlue)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, task_id: &TaskId) {
        let area = centered_rect(50, 30, f.size());
        let title = self
            .store
            .get(task_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| task_id.to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", title),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

impl TaskForm {
    /// Blank form: due tomorrow, both ratings in the middle.
    fn new(today: NaiveDate) -> Self {
        let due = today.succ_opt().unwrap_or(today);
        TaskForm {
            title: FieldValue::new(""),
            description: FieldValue::new(""),
            due: FieldValue::new(&due.format(DUE_FORMAT).to_string()),
            urgency: 3,
            importance: 3,
            field: FormField::Title,
        }
    }

    fn from_task(task: &Task) -> Self {
        let fields = task.fields();
        TaskForm {
            title: FieldValue::new(&fields.title),
            description: FieldValue::new(&fields.description),
            due: FieldValue::new(&fields.due_date.format(DUE_FORMAT).to_string()),
            urgency: fields.urgency,
            importance: fields.importance,
            field: FormField::Title,
        }
    }

    fn priority_preview(&self) -> u32 {
        priority(self.urgency, self.importance)
    }

    fn to_fields(&self) -> Result<TaskFields> {
        let raw_due = self.due.value.trim();
        if raw_due.is_empty() {
            return Err(anyhow!("due date is required"));
        }
        let due_date = NaiveDate::parse_from_str(raw_due, DUE_FORMAT)
            .map_err(|_| anyhow!("invalid date format (use YYYY-MM-DD): {}", raw_due))?;
        let fields = TaskFields {
            title: self.title.value.trim().to_string(),
            description: self.description.value.clone(),
            due_date,
            urgency: self.urgency,
            importance: self.importance,
        };
        fields.validate()?;
        Ok(fields)
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Due,
            FormField::Due => FormField::Urgency,
            FormField::Urgency => FormField::Importance,
            FormField::Importance => FormField::Title,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Importance,
            FormField::Description => FormField::Title,
            FormField::Due => FormField::Description,
            FormField::Urgency => FormField::Due,
            FormField::Importance => FormField::Urgency,
        };
    }

    fn active_text_mut(&mut self) -> Option<&mut FieldValue> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Due => Some(&mut self.due),
            FormField::Urgency | FormField::Importance => None,
        }
    }

    fn active_rating_mut(&mut self) -> Option<&mut u8> {
        match self.field {
            FormField::Urgency => Some(&mut self.urgency),
            FormField::Importance => Some(&mut self.importance),
            _ => None,
        }
    }

    fn left(&mut self) {
        if let Some(rating) = self.active_rating_mut() {
            *rating = step_rating(*rating, -1);
        } else if let Some(field) = self.active_text_mut() {
            field.move_left();
        }
    }

    fn right(&mut self) {
        if let Some(rating) = self.active_rating_mut() {
            *rating = step_rating(*rating, 1);
        } else if let Some(field) = self.active_text_mut() {
            field.move_right();
        }
    }

    /// Text fields take the character; sliders take a digit in range.
    fn insert_char(&mut self, ch: char) {
        if let Some(rating) = self.active_rating_mut() {
            if let Some(value) = ch.to_digit(10).and_then(|d| u8::try_from(d).ok()) {
                if RATING_RANGE.contains(&value) {
                    *rating = value;
                }
            }
        } else if let Some(field) = self.active_text_mut() {
            field.insert_char(ch);
        }
    }
}

impl DurationForm {
    fn from_timer(timer: &PomodoroTimer) -> Self {
        DurationForm {
            work: FieldValue::new(&(timer.work_secs() / 60).to_string()),
            rest: FieldValue::new(&(timer.break_secs() / 60).to_string()),
            field: DurationField::Work,
            work_touched: false,
            rest_touched: false,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            DurationField::Work => DurationField::Break,
            DurationField::Break => DurationField::Work,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            DurationField::Work => &mut self.work,
            DurationField::Break => &mut self.rest,
        }
    }

    fn edit_active(&mut self, edit: impl FnOnce(&mut FieldValue)) {
        match self.field {
            DurationField::Work => self.work_touched = true,
            DurationField::Break => self.rest_touched = true,
        }
        edit(self.active_field_mut());
    }

    fn edited_minutes(&self) -> (Option<u32>, Option<u32>) {
        let parse = |touched: bool, field: &FieldValue| touched.then(|| parse_minutes(&field.value));
        (
            parse(self.work_touched, &self.work),
            parse(self.rest_touched, &self.rest),
        )
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn step_rating(value: u8, delta: i8) -> u8 {
    let next = i16::from(value) + i16::from(delta);
    let (lo, hi) = (i16::from(*RATING_RANGE.start()), i16::from(*RATING_RANGE.end()));
    next.clamp(lo, hi) as u8
}

/// Enters raw mode on the alternate screen. The returned flag says whether
/// the terminal reports modified Enter (Ctrl+Enter) as its own key.
fn setup_terminal() -> Result<(Terminal<CrosstermBackend<Stdout>>, bool)> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        execute!(
            out,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    Ok((Terminal::new(CrosstermBackend::new(out))?, enhanced_keys))
}

fn teardown_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    enhanced_keys: bool,
) -> Result<()> {
    if enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Todo => Color::Gray,
        Status::InProgress => Color::LightBlue,
        Status::Done => Color::LightGreen,
    }
}

fn tier_color(tier: PriorityTier) -> Color {
    match tier {
        PriorityTier::Critical => Color::LightRed,
        PriorityTier::High => Color::Rgb(255, 165, 0),
        PriorityTier::Medium => Color::LightYellow,
        PriorityTier::Low => Color::Gray,
    }
}

fn mode_color(mode: TimerMode) -> Color {
    match mode {
        TimerMode::Work => Color::LightBlue,
        TimerMode::Break => Color::LightGreen,
    }
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn prev_char_boundary(cursor: usize, text: &str) -> usize {
    text.char_indices()
        .map(|(idx, _)| idx)
        .take_while(|&idx| idx < cursor)
        .last()
        .unwrap_or(0)
}

fn next_char_boundary(cursor: usize, text: &str) -> usize {
    text.char_indices()
        .map(|(idx, _)| idx)
        .find(|&idx| idx > cursor)
        .unwrap_or(text.len())
}

fn line_state(text: &str, cursor: usize) -> (Vec<usize>, usize, usize) {
    let mut starts = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    let line_idx = starts
        .iter()
        .rposition(|start| *start <= cursor)
        .unwrap_or(0);
    let col = text[starts[line_idx]..cursor].chars().count();
    (starts, line_idx, col)
}

fn index_at_col(text: &str, start: usize, target_col: usize) -> usize {
    let slice = &text[start..];
    let limit = slice.find('\n').unwrap_or(slice.len());
    slice[..limit]
        .char_indices()
        .nth(target_col)
        .map(|(idx, _)| start + idx)
        .unwrap_or(start + limit)
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&"..."[..max.min(3)]);
    out
}

const DASHBOARD_ITEM_HEIGHT: usize = 3;
const CARD_ITEM_HEIGHT: usize = 4;

fn dashboard_item(task: &Task, width: u16, selected: bool) -> ListItem<'static> {
    let score = task.priority_score();
    let accent = tier_color(PriorityTier::of(score));
    let inner = width.saturating_sub(8).max(10) as usize;
    let first_line = Line::from(vec![
        Span::styled("▌", Style::default().fg(accent)),
        Span::styled(
            format!(" {:>2} ", score),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            truncate_text(&task.title, inner),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    let second_line = Line::from(vec![
        Span::styled("▌", Style::default().fg(accent)),
        Span::raw("    "),
        Span::styled(
            truncate_text(&task.description.replace('\n', " "), inner),
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        ),
    ]);
    let third_line = Line::from(vec![
        Span::styled("▌", Style::default().fg(accent)),
        Span::raw("    "),
        Span::styled(
            format!("due {}", task.due_date.format(DUE_FORMAT)),
            Style::default().fg(Color::LightYellow),
        ),
        Span::raw("  "),
        Span::styled(
            task.status.label().to_lowercase(),
            Style::default().fg(status_color(task.status)),
        ),
    ]);
    let mut item = ListItem::new(vec![first_line, second_line, third_line])
        .style(Style::default().fg(Color::White));
    if selected {
        item = item.style(
            Style::default()
                .bg(Color::Rgb(40, 44, 58))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    }
    item
}

fn card_item(task: &Task, width: u16, selected: bool) -> ListItem<'static> {
    let inner_width = width.saturating_sub(4).max(10) as usize;
    let border_char = if selected { "=" } else { "-" };
    let horiz = border_char.repeat(inner_width);
    let top = format!("+{}+", horiz);
    let title = truncate_text(&task.title, inner_width.saturating_sub(2));
    let meta = truncate_text(
        &format!(
            "p{}  due {}",
            task.priority_score(),
            task.due_date.format(DUE_FORMAT)
        ),
        inner_width.saturating_sub(2),
    );
    let lines = vec![
        Line::raw(top.clone()),
        Line::raw(format!("| {:width$} |", title, width = inner_width.saturating_sub(2))),
        Line::raw(format!("| {:width$} |", meta, width = inner_width.saturating_sub(2))),
        Line::raw(top),
    ];
    let base = Style::default()
        .bg(Color::Rgb(22, 24, 30))
        .fg(tier_color(PriorityTier::of(task.priority_score())));
    let mut item = ListItem::new(lines).style(base);
    if selected {
        item = item.style(
            Style::default()
                .bg(Color::Rgb(252, 214, 112))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    }
    item
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            Line::from(vec![
                Span::styled(
                    if idx == 0 {
                        prefix.clone()
                    } else {
                        spacer.clone()
                    },
                    label_style,
                ),
                Span::styled(line.to_string(), value_style),
            ])
        })
        .collect()
}

fn slider_line(label: &str, value: u8, ends: (&str, &str), active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let accent = if active { Color::Cyan } else { Color::White };
    let filled = "●".repeat(usize::from(value));
    let empty = "○".repeat(usize::from(RATING_RANGE.end().saturating_sub(value)));
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(format!("{} ", ends.0), Style::default().fg(Color::DarkGray)),
        Span::styled(filled, Style::default().fg(accent)),
        Span::styled(empty, Style::default().fg(Color::DarkGray)),
        Span::styled(format!(" {}", ends.1), Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("  {}", value),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
    ])
}

fn selected_task_detail(task: &Task) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            task.title.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "priority {} (u{} i{})",
                task.priority_score(),
                task.urgency,
                task.importance
            ),
            Style::default().fg(tier_color(PriorityTier::of(task.priority_score()))),
        ),
        Span::raw("  "),
        Span::styled(
            task.due_date.format(DUE_FORMAT).to_string(),
            Style::default().fg(Color::LightRed),
        ),
    ];
    if !task.description.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            task.description.clone(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        ));
    }
    Line::from(spans)
}
