use crate::alert::Alert;
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Work,
    Break,
}

impl Mode {
    pub fn flipped(self) -> Mode {
        match self {
            Mode::Work => Mode::Break,
            Mode::Break => Mode::Work,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Work => "Time to Focus",
            Mode::Break => "Time for a Break",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Work => f.write_str("work"),
            Mode::Break => f.write_str("break"),
        }
    }
}

/// Emitted by [`PomodoroTimer::tick`] when an interval runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalComplete {
    pub finished: Mode,
    pub started: Mode,
}

/// A single pending deadline for the recurring one-second tick.
///
/// There is never more than one outstanding deadline: `arm` replaces it and
/// `cancel` clears it.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Option<Instant>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Ticker { period, next: None }
    }

    pub fn arm(&mut self, now: Instant) {
        self.next = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Number of whole periods elapsed by `now`. Re-arms past them.
    pub fn due(&mut self, now: Instant) -> u32 {
        let Some(mut next) = self.next else {
            return 0;
        };
        let mut fired = 0;
        while next <= now {
            fired += 1;
            next += self.period;
        }
        self.next = Some(next);
        fired
    }
}

/// Work/break countdown.
///
/// Intervals roll over on their own: when one ends the alert plays, the mode
/// flips and the next interval keeps counting without user action.
pub struct PomodoroTimer {
    mode: Mode,
    work_secs: u32,
    break_secs: u32,
    remaining: u32,
    active: bool,
    minimized: bool,
    ticker: Ticker,
    alert: Box<dyn Alert>,
}

impl PomodoroTimer {
    pub fn new(work_minutes: u32, break_minutes: u32, alert: Box<dyn Alert>) -> Self {
        let work_secs = minutes_to_secs(work_minutes);
        PomodoroTimer {
            mode: Mode::Work,
            work_secs,
            break_secs: minutes_to_secs(break_minutes),
            remaining: work_secs,
            active: false,
            minimized: true,
            ticker: Ticker::new(Duration::from_secs(1)),
            alert,
        }
    }

    pub fn toggle(&mut self) {
        self.toggle_at(Instant::now());
    }

    /// Start or pause. Neither the mode nor the remaining time changes.
    pub fn toggle_at(&mut self, now: Instant) {
        self.active = !self.active;
        if self.active {
            self.ticker.arm(now);
        } else {
            self.ticker.cancel();
        }
        tracing::debug!(active = self.active, mode = %self.mode, remaining = self.remaining, "timer toggled");
    }

    /// One elapsed second. Does nothing while paused.
    pub fn tick(&mut self) -> Option<IntervalComplete> {
        if !self.active {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return None;
        }
        if let Err(err) = self.alert.play() {
            tracing::warn!(error = %err, "interval alert failed");
        }
        let finished = self.mode;
        self.mode = finished.flipped();
        self.remaining = self.duration_of(self.mode);
        tracing::info!(finished = %finished, started = %self.mode, "interval complete");
        Some(IntervalComplete {
            finished,
            started: self.mode,
        })
    }

    /// Runs every tick the schedule owes by `now`.
    pub fn advance(&mut self, now: Instant) -> Vec<IntervalComplete> {
        if !self.active {
            self.ticker.cancel();
            return Vec::new();
        }
        if !self.ticker.is_armed() {
            self.ticker.arm(now);
        }
        let owed = self.ticker.due(now);
        (0..owed).filter_map(|_| self.tick()).collect()
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.ticker.cancel();
        self.mode = Mode::Work;
        self.remaining = self.work_secs;
        tracing::debug!("timer reset");
    }

    pub fn set_work_minutes(&mut self, minutes: u32) {
        self.work_secs = minutes_to_secs(minutes);
        self.sync_idle(Mode::Work);
    }

    pub fn set_break_minutes(&mut self, minutes: u32) {
        self.break_secs = minutes_to_secs(minutes);
        self.sync_idle(Mode::Break);
    }

    pub fn toggle_minimized(&mut self) {
        self.minimized = !self.minimized;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn work_secs(&self) -> u32 {
        self.work_secs
    }

    pub fn break_secs(&self) -> u32 {
        self.break_secs
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.ticker.deadline()
    }

    pub fn duration_of(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Work => self.work_secs,
            Mode::Break => self.break_secs,
        }
    }

    /// Fraction of the current interval already elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let total = self.duration_of(self.mode);
        if total == 0 {
            return 0.0;
        }
        let elapsed = total.saturating_sub(self.remaining);
        (f64::from(elapsed) / f64::from(total)).clamp(0.0, 1.0)
    }

    pub fn clock(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    // A running countdown is never touched by a duration edit.
    fn sync_idle(&mut self, edited: Mode) {
        if !self.active && self.mode == edited {
            self.remaining = self.duration_of(edited);
        }
    }
}

fn minutes_to_secs(minutes: u32) -> u32 {
    minutes.max(1).saturating_mul(60)
}

/// Reads a minutes value typed by the user. Anything unusable becomes 1.
pub fn parse_minutes(input: &str) -> u32 {
    input
        .trim()
        .parse::<i64>()
        .ok()
        .map(|m| m.clamp(1, i64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertError, Silent};
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    struct Counting(Rc<Cell<u32>>);

    impl Alert for Counting {
        fn play(&mut self) -> Result<(), AlertError> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    struct Broken;

    impl Alert for Broken {
        fn play(&mut self) -> Result<(), AlertError> {
            Err(io::Error::new(io::ErrorKind::Other, "no audio device").into())
        }
    }

    fn timer() -> PomodoroTimer {
        PomodoroTimer::new(25, 5, Box::new(Silent))
    }

    #[test]
    fn starts_idle_in_work_mode() {
        let t = timer();
        assert_eq!(t.mode(), Mode::Work);
        assert!(!t.is_active());
        assert_eq!(t.remaining_secs(), 1500);
        assert_eq!(t.break_secs(), 300);
        assert_eq!(t.clock(), "25:00");
        assert!(t.next_deadline().is_none());
    }

    #[test]
    fn tick_does_nothing_while_paused() {
        let mut t = timer();
        assert!(t.tick().is_none());
        assert_eq!(t.remaining_secs(), 1500);
    }

    #[test]
    fn toggle_leaves_countdown_alone() {
        let mut t = timer();
        t.toggle();
        t.tick();
        assert_eq!(t.remaining_secs(), 1499);
        t.toggle();
        assert!(!t.is_active());
        assert_eq!(t.remaining_secs(), 1499);
        assert_eq!(t.mode(), Mode::Work);
    }

    #[test]
    fn work_rolls_into_break_and_keeps_running() {
        let plays = Rc::new(Cell::new(0));
        let mut t = PomodoroTimer::new(25, 5, Box::new(Counting(plays.clone())));
        t.toggle();
        for _ in 0..1499 {
            assert!(t.tick().is_none());
        }
        assert_eq!(plays.get(), 0);
        let done = t.tick().expect("interval should complete");
        assert_eq!(
            done,
            IntervalComplete {
                finished: Mode::Work,
                started: Mode::Break
            }
        );
        assert_eq!(t.mode(), Mode::Break);
        assert_eq!(t.remaining_secs(), 300);
        assert!(t.is_active());
        assert_eq!(plays.get(), 1);

        for _ in 0..300 {
            t.tick();
        }
        assert_eq!(t.mode(), Mode::Work);
        assert_eq!(t.remaining_secs(), 1500);
        assert_eq!(plays.get(), 2);
    }

    #[test]
    fn failing_alert_still_flips_mode() {
        let mut t = PomodoroTimer::new(1, 1, Box::new(Broken));
        t.toggle();
        let mut completed = None;
        for _ in 0..60 {
            completed = completed.or(t.tick());
        }
        assert!(completed.is_some());
        assert_eq!(t.mode(), Mode::Break);
        assert_eq!(t.remaining_secs(), 60);
        assert!(t.is_active());
    }

    #[test]
    fn reset_from_running_break_returns_to_idle_work() {
        let mut t = PomodoroTimer::new(1, 2, Box::new(Silent));
        t.toggle();
        for _ in 0..70 {
            t.tick();
        }
        assert_eq!(t.mode(), Mode::Break);
        assert!(t.is_active());
        t.reset();
        assert_eq!(t.mode(), Mode::Work);
        assert!(!t.is_active());
        assert_eq!(t.remaining_secs(), 60);
        assert!(t.next_deadline().is_none());
    }

    #[test]
    fn duration_edit_applies_immediately_when_idle() {
        let mut t = timer();
        t.set_work_minutes(10);
        assert_eq!(t.remaining_secs(), 600);
        assert_eq!(t.work_secs(), 600);
    }

    #[test]
    fn duration_edit_is_deferred_while_running() {
        let mut t = timer();
        t.toggle();
        t.tick();
        t.set_work_minutes(10);
        assert_eq!(t.remaining_secs(), 1499);
        assert_eq!(t.work_secs(), 600);
        t.reset();
        assert_eq!(t.remaining_secs(), 600);
    }

    #[test]
    fn editing_other_mode_is_deferred() {
        let mut t = timer();
        t.set_break_minutes(15);
        assert_eq!(t.remaining_secs(), 1500);
        assert_eq!(t.break_secs(), 900);
    }

    #[test]
    fn durations_clamp_to_one_minute() {
        let mut t = timer();
        t.set_work_minutes(0);
        t.set_break_minutes(0);
        assert_eq!(t.work_secs(), 60);
        assert_eq!(t.break_secs(), 60);
        assert_eq!(t.remaining_secs(), 60);
        assert_eq!(PomodoroTimer::new(0, 0, Box::new(Silent)).remaining_secs(), 60);
    }

    #[test]
    fn parse_minutes_clamps_bad_input() {
        assert_eq!(parse_minutes("10"), 10);
        assert_eq!(parse_minutes(" 3 "), 3);
        assert_eq!(parse_minutes("0"), 1);
        assert_eq!(parse_minutes("-4"), 1);
        assert_eq!(parse_minutes("abc"), 1);
        assert_eq!(parse_minutes(""), 1);
    }

    #[test]
    fn progress_and_clock_track_remaining() {
        let mut t = PomodoroTimer::new(1, 1, Box::new(Silent));
        assert_eq!(t.progress(), 0.0);
        t.toggle();
        for _ in 0..15 {
            t.tick();
        }
        assert_eq!(t.clock(), "00:45");
        assert!((t.progress() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn ticker_counts_whole_periods() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_secs(1));
        assert_eq!(ticker.due(start + Duration::from_secs(5)), 0);
        ticker.arm(start);
        assert_eq!(ticker.due(start + Duration::from_millis(999)), 0);
        assert_eq!(ticker.due(start + Duration::from_millis(1000)), 1);
        assert_eq!(ticker.due(start + Duration::from_millis(3500)), 2);
        ticker.cancel();
        assert!(!ticker.is_armed());
        assert_eq!(ticker.due(start + Duration::from_secs(10)), 0);
    }

    #[test]
    fn advance_follows_the_schedule() {
        let start = Instant::now();
        let mut t = PomodoroTimer::new(1, 1, Box::new(Silent));
        t.toggle_at(start);
        assert!(t.advance(start + Duration::from_millis(500)).is_empty());
        assert_eq!(t.remaining_secs(), 60);
        assert!(t.advance(start + Duration::from_secs(3)).is_empty());
        assert_eq!(t.remaining_secs(), 57);

        let done = t.advance(start + Duration::from_secs(60));
        assert_eq!(done.len(), 1);
        assert_eq!(t.mode(), Mode::Break);
        assert_eq!(t.remaining_secs(), 60);
    }

    #[test]
    fn pausing_cancels_the_schedule() {
        let start = Instant::now();
        let mut t = timer();
        t.toggle_at(start);
        assert!(t.next_deadline().is_some());
        t.toggle_at(start + Duration::from_millis(400));
        assert!(t.next_deadline().is_none());
        t.advance(start + Duration::from_secs(30));
        assert_eq!(t.remaining_secs(), 1500);

        let resumed = start + Duration::from_secs(40);
        t.toggle_at(resumed);
        t.advance(resumed + Duration::from_secs(2));
        assert_eq!(t.remaining_secs(), 1498);
    }
}
