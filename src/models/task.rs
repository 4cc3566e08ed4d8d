use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

use super::FromRecord;
use crate::clock::Clock;
use crate::normalize::{
    to_bool, to_date, to_int, to_optional_date, to_optional_string, to_string, Record,
};

pub const PRIORITY_HIGH: u8 = 1;
pub const PRIORITY_MEDIUM: u8 = 2;
pub const PRIORITY_LOW: u8 = 3;

/// Used when a record's `estimated_minutes` is missing or not positive.
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 30;

/// Kind of work a daily task represents.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Coding,
    Study,
    Project,
    Practice,
    Review,
    Quiz,
    Networking,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Coding => "coding",
            TaskType::Study => "study",
            TaskType::Project => "project",
            TaskType::Practice => "practice",
            TaskType::Review => "review",
            TaskType::Quiz => "quiz",
            TaskType::Networking => "networking",
        }
    }

    /// Case-insensitive lookup; unknown names decode as `Study`.
    pub fn parse_lenient(raw: &str) -> TaskType {
        match raw.trim().to_lowercase().as_str() {
            "coding" => TaskType::Coding,
            "project" => TaskType::Project,
            "practice" => TaskType::Practice,
            "review" => TaskType::Review,
            "quiz" => TaskType::Quiz,
            "networking" => TaskType::Networking,
            _ => TaskType::Study,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of scheduled work on one calendar day.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DailyTask {
    pub id: String,
    pub path_id: String,
    pub phase_title: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Only the calendar day is meaningful.
    pub scheduled_date: DateTime<Utc>,
    pub estimated_minutes: u32,
    pub is_completed: bool,
    /// Set exactly when `is_completed` is true.
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// 1 = high, 2 = medium, 3 = low.
    pub priority: u8,
}

impl DailyTask {
    pub fn scheduled_day(&self) -> NaiveDate {
        self.scheduled_date.date_naive()
    }

    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(at);
    }

    pub fn mark_incomplete(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
    }

    /// Flips completion, returning the new state.
    pub fn toggle(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_completed {
            self.mark_incomplete();
        } else {
            self.mark_completed(at);
        }
        self.is_completed
    }

    pub fn priority_label(&self) -> &'static str {
        match self.priority {
            PRIORITY_HIGH => "High",
            PRIORITY_LOW => "Low",
            _ => "Medium",
        }
    }
}

impl FromRecord for DailyTask {
    fn from_record(record: &Record, clock: &dyn Clock) -> Self {
        let estimated = to_int(record.get("estimated_minutes"), DEFAULT_ESTIMATED_MINUTES as i64);
        let priority = to_int(record.get("priority"), PRIORITY_MEDIUM as i64);
        DailyTask {
            id: to_string(record.get("id")),
            path_id: to_string(record.get("path_id")),
            phase_title: to_string(record.get("phase_title")),
            title: to_string(record.get("title")),
            description: to_string(record.get("description")),
            task_type: TaskType::parse_lenient(&to_string(record.get("type"))),
            scheduled_date: to_date(record.get("scheduled_date"), clock.now()),
            estimated_minutes: u32::try_from(estimated)
                .ok()
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_ESTIMATED_MINUTES),
            is_completed: to_bool(record.get("is_completed"), false),
            completed_at: to_optional_date(record.get("completed_at")),
            notes: to_optional_string(record.get("notes")),
            priority: u8::try_from(priority)
                .ok()
                .filter(|p| (PRIORITY_HIGH..=PRIORITY_LOW).contains(p))
                .unwrap_or(PRIORITY_MEDIUM),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::ToRecord;
    use chrono::TimeZone;
    use serde_json::json;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2031, 5, 5, 9, 0, 0).unwrap())
    }

    fn sample() -> DailyTask {
        DailyTask {
            id: "p1_1700000000000_0".into(),
            path_id: "p1".into(),
            phase_title: "Foundations".into(),
            title: "Complete 2 LeetCode Problems".into(),
            description: "desc".into(),
            task_type: TaskType::Coding,
            scheduled_date: Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap(),
            estimated_minutes: 60,
            is_completed: true,
            completed_at: Some(Utc.with_ymd_and_hms(2023, 11, 15, 8, 0, 0).unwrap()),
            notes: Some("went well".into()),
            priority: PRIORITY_HIGH,
        }
    }

    #[test]
    fn record_uses_snake_case_keys() {
        let record = sample().to_record();
        assert_eq!(record["type"], json!("coding"));
        assert_eq!(record["path_id"], json!("p1"));
        assert_eq!(record["scheduled_date"], json!("2023-11-14T22:13:20Z"));
        assert_eq!(record["is_completed"], json!(true));
        assert_eq!(record["estimated_minutes"], json!(60));
    }

    #[test]
    fn out_of_range_integers_take_defaults() {
        for (minutes, priority) in [(-15, 9), (0, 0), (45, -1)] {
            let raw = json!({"estimated_minutes": minutes, "priority": priority});
            let task = DailyTask::from_value(&raw, &clock()).unwrap();
            let expected_minutes = if minutes > 0 { minutes as u32 } else { DEFAULT_ESTIMATED_MINUTES };
            assert_eq!(task.estimated_minutes, expected_minutes);
            assert_eq!(task.priority, PRIORITY_MEDIUM);
        }
        let raw = json!({"estimated_minutes": 5_000_000_000i64, "priority": 3});
        let task = DailyTask::from_value(&raw, &clock()).unwrap();
        assert_eq!(task.estimated_minutes, DEFAULT_ESTIMATED_MINUTES);
        assert_eq!(task.priority, PRIORITY_LOW);
    }

    #[test]
    fn record_round_trip() {
        let task = sample();
        let back = DailyTask::from_record(&task.to_record(), &clock());
        assert_eq!(back, task);
    }

    #[test]
    fn garbage_record_decodes_to_defaults() {
        let raw = json!({
            "id": 17,
            "path_id": ["x"],
            "title": null,
            "type": 3,
            "scheduled_date": {"nope": true},
            "estimated_minutes": "lots",
            "is_completed": "yes",
            "completed_at": "yesterday",
            "notes": "",
            "priority": -4
        });
        let task = DailyTask::from_record(raw.as_object().unwrap(), &clock());
        assert_eq!(task.id, "17");
        assert_eq!(task.path_id, "[\"x\"]");
        assert_eq!(task.title, "");
        assert_eq!(task.task_type, TaskType::Study);
        assert_eq!(task.scheduled_date, clock().now());
        assert_eq!(task.estimated_minutes, 30);
        assert!(!task.is_completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.notes, None);
        assert_eq!(task.priority, PRIORITY_MEDIUM);
    }

    #[test]
    fn timestamp_object_dates_decode() {
        let raw = json!({"scheduled_date": {"seconds": 1_700_000_000}, "priority": "3"});
        let task = DailyTask::from_record(raw.as_object().unwrap(), &clock());
        assert_eq!(task.scheduled_date, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        assert_eq!(task.priority, PRIORITY_LOW);
    }

    #[test]
    fn toggle_keeps_completed_at_in_step() {
        let mut task = sample();
        task.mark_incomplete();
        assert_eq!(task.completed_at, None);
        let at = clock().now();
        assert!(task.toggle(at));
        assert_eq!(task.completed_at, Some(at));
        assert!(!task.toggle(at));
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn type_parse_is_lenient() {
        assert_eq!(TaskType::parse_lenient("REVIEW"), TaskType::Review);
        assert_eq!(TaskType::parse_lenient(" networking "), TaskType::Networking);
        assert_eq!(TaskType::parse_lenient("unknown"), TaskType::Study);
    }
}
