//! Rule-based daily task templates.

use chrono::{DateTime, Datelike, Utc};

use crate::models::{DailyTask, TaskType, DEFAULT_PHASE_TITLE, PRIORITY_HIGH, PRIORITY_MEDIUM};

/// Tasks produced for every day.
pub const TASKS_PER_DAY: usize = 3;

struct Slot {
    task_type: TaskType,
    title: &'static str,
    minutes: u32,
    priority: u8,
}

static CODING: Slot = Slot {
    task_type: TaskType::Coding,
    title: "Complete 2 LeetCode Problems",
    minutes: 60,
    priority: PRIORITY_HIGH,
};

/// Second-slot rotation, indexed by `day_index % 3`.
static ROTATION: [Slot; 3] = [
    Slot {
        task_type: TaskType::Study,
        title: "Study New Concept",
        minutes: 45,
        priority: PRIORITY_HIGH,
    },
    Slot {
        task_type: TaskType::Practice,
        title: "Hands-on Practice",
        minutes: 45,
        priority: PRIORITY_HIGH,
    },
    Slot {
        task_type: TaskType::Review,
        title: "Review Previous Topics",
        minutes: 30,
        priority: PRIORITY_MEDIUM,
    },
];

static PROJECT: Slot = Slot {
    task_type: TaskType::Project,
    title: "Work on Portfolio Project",
    minutes: 90,
    priority: PRIORITY_HIGH,
};

static READING: Slot = Slot {
    task_type: TaskType::Study,
    title: "Read Documentation",
    minutes: 30,
    priority: PRIORITY_MEDIUM,
};

/// Day-of-month modulo 7.
///
/// This is not the weekday. Stored schedules were produced with this exact
/// arithmetic, so the rotation must keep using it.
pub fn day_index(date: DateTime<Utc>) -> u32 {
    date.day() % 7
}

fn describe(slot: &Slot, phase: &str) -> String {
    match (slot.task_type, slot.title) {
        (TaskType::Coding, _) => {
            format!("Practice data structures and algorithms while working through {phase}")
        }
        (TaskType::Practice, _) => format!("Apply what you learned in {phase} with hands-on exercises"),
        (TaskType::Review, _) => format!("Revisit and reinforce earlier topics from {phase}"),
        (TaskType::Project, _) => format!("Build portfolio features using skills from {phase}"),
        (_, "Read Documentation") => format!("Read official documentation for the tools used in {phase}"),
        _ => format!("Learn a new concept from {phase}"),
    }
}

/// Produces the three tasks for `date`.
///
/// Ids are `<path_id>_<epoch millis of date>_<slot>`, so regenerating the
/// same path and instant overwrites the previous batch.
pub fn generate_tasks_for_day(
    path_id: &str,
    date: DateTime<Utc>,
    phase_labels: &[String],
) -> Vec<DailyTask> {
    let phase = phase_labels
        .first()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .unwrap_or(DEFAULT_PHASE_TITLE);
    let idx = day_index(date) as usize % 3;
    let third = if idx == 0 { &PROJECT } else { &READING };
    let millis = date.timestamp_millis();

    [&CODING, &ROTATION[idx], third]
        .into_iter()
        .enumerate()
        .map(|(n, slot)| DailyTask {
            id: format!("{path_id}_{millis}_{n}"),
            path_id: path_id.to_string(),
            phase_title: phase.to_string(),
            title: slot.title.to_string(),
            description: describe(slot, phase),
            task_type: slot.task_type,
            scheduled_date: date,
            estimated_minutes: slot.minutes,
            is_completed: false,
            completed_at: None,
            notes: None,
            priority: slot.priority,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn on_day(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 14, 0, 0).unwrap()
    }

    fn labels() -> Vec<String> {
        vec!["Foundations".to_string(), "Advanced".to_string()]
    }

    #[test]
    fn always_three_tasks_with_coding_first() {
        for day in 1..=31 {
            let tasks = generate_tasks_for_day("p", on_day(day), &labels());
            assert_eq!(tasks.len(), TASKS_PER_DAY);
            assert_eq!(tasks[0].task_type, TaskType::Coding);
            assert_eq!(tasks[0].title, "Complete 2 LeetCode Problems");
            assert_eq!(tasks[0].estimated_minutes, 60);
            assert_eq!(
                tasks.iter().filter(|t| t.task_type == TaskType::Coding).count(),
                1
            );
        }
    }

    #[test]
    fn second_slot_rotates_on_day_of_month() {
        // day 1 -> index 1 -> practice; day 3 -> 3 -> study; day 7 -> 0 -> study
        assert_eq!(generate_tasks_for_day("p", on_day(1), &labels())[1].task_type, TaskType::Practice);
        assert_eq!(generate_tasks_for_day("p", on_day(3), &labels())[1].task_type, TaskType::Study);
        assert_eq!(generate_tasks_for_day("p", on_day(7), &labels())[1].task_type, TaskType::Study);
        let review = &generate_tasks_for_day("p", on_day(5), &labels())[1];
        assert_eq!(review.task_type, TaskType::Review);
        assert_eq!(review.estimated_minutes, 30);
        assert_eq!(review.priority, PRIORITY_MEDIUM);
    }

    #[test]
    fn day_index_is_not_weekday() {
        // 2025-03-09 is a Sunday but its index is 9 % 7 = 2.
        assert_eq!(day_index(on_day(9)), 2);
    }

    #[test]
    fn third_slot_is_project_only_on_index_multiple_of_three() {
        for day in 1..=31 {
            let tasks = generate_tasks_for_day("p", on_day(day), &labels());
            let third = &tasks[2];
            if (day % 7) % 3 == 0 {
                assert_eq!(third.task_type, TaskType::Project);
                assert_eq!(third.estimated_minutes, 90);
                assert_eq!(third.title, "Work on Portfolio Project");
            } else {
                assert_eq!(third.task_type, TaskType::Study);
                assert_eq!(third.title, "Read Documentation");
                assert_eq!(third.priority, PRIORITY_MEDIUM);
            }
        }
    }

    #[test]
    fn ids_and_phase_title() {
        let date = on_day(4);
        let tasks = generate_tasks_for_day("path-9", date, &labels());
        let millis = date.timestamp_millis();
        assert_eq!(tasks[0].id, format!("path-9_{millis}_0"));
        assert_eq!(tasks[2].id, format!("path-9_{millis}_2"));
        assert!(tasks.iter().all(|t| t.phase_title == "Foundations"));
        assert!(tasks.iter().all(|t| t.description.contains("Foundations")));
        assert!(tasks.iter().all(|t| !t.is_completed && t.completed_at.is_none()));
    }

    #[test]
    fn missing_phase_uses_default_label() {
        let tasks = generate_tasks_for_day("p", on_day(2), &[]);
        assert_eq!(tasks[0].phase_title, "Learning Phase");
        let tasks = generate_tasks_for_day("p", on_day(2), &[String::new()]);
        assert_eq!(tasks[1].phase_title, "Learning Phase");
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_tasks_for_day("p", on_day(12), &labels());
        let b = generate_tasks_for_day("p", on_day(12), &labels());
        assert_eq!(a, b);
    }
}
