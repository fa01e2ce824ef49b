use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Accepted values for urgency and importance.
pub const RATING_RANGE: RangeInclusive<u8> = 1..=5;

/// Priority score for a pair of ratings: `importance * 2 + urgency * 3`.
///
/// Inputs are expected to be in [`RATING_RANGE`]; nothing is clamped here.
pub fn priority(urgency: u8, importance: u8) -> u32 {
    u32::from(importance) * 2 + u32::from(urgency) * 3
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(raw: impl Into<String>) -> Self {
        TaskId(raw.into())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

impl Status {
    /// Board column order.
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn label(&self) -> &'static str {
        match self {
            Status::Todo => "To-Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Status::Todo => 0,
            Status::InProgress => 1,
            Status::Done => 2,
        }
    }

    pub fn next(&self) -> Status {
        Status::ALL[(self.index() + 1).min(Status::ALL.len() - 1)]
    }

    pub fn prev(&self) -> Status {
        Status::ALL[self.index().saturating_sub(1)]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display bucket for a priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityTier {
    Critical,
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub fn of(score: u32) -> Self {
        if score > 20 {
            PriorityTier::Critical
        } else if score > 15 {
            PriorityTier::High
        } else if score > 10 {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }
}

/// The caller-editable part of a task, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub urgency: u8,
    pub importance: u8,
}

impl TaskFields {
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.title.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        if !RATING_RANGE.contains(&self.urgency) {
            return Err(TaskError::RatingOutOfRange {
                field: "urgency",
                value: self.urgency,
            });
        }
        if !RATING_RANGE.contains(&self.importance) {
            return Err(TaskError::RatingOutOfRange {
                field: "importance",
                value: self.importance,
            });
        }
        Ok(())
    }

    pub fn priority_score(&self) -> u32 {
        priority(self.urgency, self.importance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub urgency: u8,
    pub importance: u8,
    pub status: Status,
}

impl Task {
    pub(crate) fn new(id: TaskId, fields: TaskFields) -> Self {
        Task {
            id,
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            urgency: fields.urgency,
            importance: fields.importance,
            status: Status::Todo,
        }
    }

    /// Always derived from the current ratings; there is no stored copy.
    pub fn priority_score(&self) -> u32 {
        priority(self.urgency, self.importance)
    }

    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            urgency: self.urgency,
            importance: self.importance,
        }
    }

    pub(crate) fn apply(&mut self, fields: TaskFields) {
        self.title = fields.title;
        self.description = fields.description;
        self.due_date = fields.due_date;
        self.urgency = fields.urgency;
        self.importance = fields.importance;
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("title is required")]
    EmptyTitle,
    #[error("{field} must be between 1 and 5, got {value}")]
    RatingOutOfRange { field: &'static str, value: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(urgency: u8, importance: u8) -> TaskFields {
        TaskFields {
            title: "Write report".into(),
            description: String::new(),
            due_date: NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
            urgency,
            importance,
        }
    }

    #[test]
    fn priority_matches_formula_over_whole_range() {
        for u in RATING_RANGE {
            for i in RATING_RANGE {
                let score = priority(u, i);
                assert_eq!(score, u32::from(i) * 2 + u32::from(u) * 3);
                assert!((5..=25).contains(&score), "{u},{i} -> {score}");
            }
        }
    }

    #[test]
    fn urgency_weighs_more_than_importance() {
        assert_eq!(priority(5, 3), 21);
        assert_eq!(priority(3, 5), 19);
    }

    #[test]
    fn task_score_follows_ratings() {
        let mut task = Task::new(TaskId::new("1"), fields(1, 1));
        assert_eq!(task.priority_score(), 5);
        task.apply(fields(5, 5));
        assert_eq!(task.priority_score(), 25);
        assert_eq!(task.status, Status::Todo);
    }

    #[test]
    fn validate_rejects_blank_title_and_bad_ratings() {
        let mut f = fields(3, 3);
        assert!(f.validate().is_ok());
        f.title = "   ".into();
        assert_eq!(f.validate(), Err(TaskError::EmptyTitle));
        let f = fields(0, 3);
        assert_eq!(
            f.validate(),
            Err(TaskError::RatingOutOfRange {
                field: "urgency",
                value: 0
            })
        );
        let f = fields(3, 6);
        assert!(matches!(
            f.validate(),
            Err(TaskError::RatingOutOfRange {
                field: "importance",
                ..
            })
        ));
    }

    #[test]
    fn status_steps_saturate_at_board_edges() {
        assert_eq!(Status::Todo.prev(), Status::Todo);
        assert_eq!(Status::Todo.next(), Status::InProgress);
        assert_eq!(Status::InProgress.next(), Status::Done);
        assert_eq!(Status::Done.next(), Status::Done);
        assert_eq!(Status::Done.prev(), Status::InProgress);
    }

    #[test]
    fn status_serializes_kebab_case() {
        let yaml = serde_yaml::to_string(&Status::InProgress).unwrap();
        assert_eq!(yaml.trim(), "in-progress");
    }

    #[test]
    fn tiers_bucket_scores() {
        assert_eq!(PriorityTier::of(25), PriorityTier::Critical);
        assert_eq!(PriorityTier::of(21), PriorityTier::Critical);
        assert_eq!(PriorityTier::of(20), PriorityTier::High);
        assert_eq!(PriorityTier::of(16), PriorityTier::High);
        assert_eq!(PriorityTier::of(11), PriorityTier::Medium);
        assert_eq!(PriorityTier::of(10), PriorityTier::Low);
    }
}
