use crate::model::{Status, TaskFields};
use crate::store::TaskStore;
use chrono::NaiveDate;

struct DemoTask {
    title: &'static str,
    description: &'static str,
    due: (i32, u32, u32),
    urgency: u8,
    importance: u8,
    status: Status,
}

const DEMO_TASKS: [DemoTask; 5] = [
    DemoTask {
        title: "Finalize Q3 report",
        description: "Compile sales data and create final presentation slides.",
        due: (2025, 9, 30),
        urgency: 5,
        importance: 5,
        status: Status::Todo,
    },
    DemoTask {
        title: "Design new landing page",
        description: "Create mockups and prototypes in Figma.",
        due: (2025, 10, 15),
        urgency: 4,
        importance: 4,
        status: Status::InProgress,
    },
    DemoTask {
        title: "Fix login bug",
        description: "Investigate and resolve the authentication issue on the staging server.",
        due: (2025, 9, 28),
        urgency: 5,
        importance: 3,
        status: Status::InProgress,
    },
    DemoTask {
        title: "User research interviews",
        description: "Schedule and conduct interviews with 5 target users.",
        due: (2025, 10, 5),
        urgency: 3,
        importance: 5,
        status: Status::Todo,
    },
    DemoTask {
        title: "Deploy v2.1 to production",
        description: "Merge all feature branches and deploy to the live environment.",
        due: (2025, 9, 25),
        urgency: 2,
        importance: 2,
        status: Status::Done,
    },
];

/// Fills `store` with the five demonstration tasks.
pub fn seed_demo(store: &mut TaskStore) {
    for demo in &DEMO_TASKS {
        let (y, m, d) = demo.due;
        let Some(due_date) = NaiveDate::from_ymd_opt(y, m, d) else {
            tracing::warn!(title = demo.title, "skipping demo task with bad date");
            continue;
        };
        let id = store
            .create(TaskFields {
                title: demo.title.to_string(),
                description: demo.description.to_string(),
                due_date,
                urgency: demo.urgency,
                importance: demo.importance,
            })
            .id
            .clone();
        if demo.status != Status::Todo {
            if let Err(err) = store.set_status(&id, demo.status) {
                tracing::warn!(error = %err, "could not place demo task");
            }
        }
    }
    tracing::debug!(count = store.len(), "seeded demo tasks");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_five_tasks_across_columns() {
        let mut store = TaskStore::new();
        seed_demo(&mut store);
        assert_eq!(store.len(), 5);
        assert_eq!(store.by_status(Status::Todo).len(), 2);
        assert_eq!(store.by_status(Status::InProgress).len(), 2);
        assert_eq!(store.by_status(Status::Done).len(), 1);
    }

    #[test]
    fn demo_dashboard_order() {
        let mut store = TaskStore::new();
        seed_demo(&mut store);
        let view: Vec<(&str, u32)> = store
            .sorted_view()
            .iter()
            .map(|t| (t.title.as_str(), t.priority_score()))
            .collect();
        assert_eq!(
            view,
            vec![
                ("Finalize Q3 report", 25),
                ("Fix login bug", 21),
                ("Design new landing page", 20),
                ("User research interviews", 19),
                ("Deploy v2.1 to production", 10),
            ]
        );
    }
}
