use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::FromRecord;
use crate::clock::Clock;
use crate::normalize::{
    decode_list, pick, to_date, to_double, to_int, to_optional_date, to_string, to_string_list,
    Record,
};

/// Fallback phase label when a path has none.
pub const DEFAULT_PHASE_TITLE: &str = "Learning Phase";

/// A generated learning path and its phases.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub total_duration: String,
    pub difficulty_level: String,
    pub phases: Vec<Phase>,
    /// Ordered phase labels the task generator indexes into.
    pub milestones: Vec<String>,
    pub courses: Vec<Course>,
    pub skills_acquired: Vec<String>,
    pub prerequisites: Vec<String>,
    pub daily_time_commitment: String,
    pub next_steps: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl LearningPath {
    /// Milestones when present, otherwise the non-empty phase titles.
    pub fn phase_labels(&self) -> Vec<String> {
        if !self.milestones.is_empty() {
            return self.milestones.clone();
        }
        self.phases
            .iter()
            .map(|p| p.title.clone())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// All courses, top-level first, then those attached to phases.
    pub fn all_courses(&self) -> impl Iterator<Item = &Course> {
        self.courses
            .iter()
            .chain(self.phases.iter().flat_map(|p| p.resources.iter()))
    }
}

impl FromRecord for LearningPath {
    fn from_record(record: &Record, clock: &dyn Clock) -> Self {
        LearningPath {
            id: to_string(record.get("id")),
            user_id: to_string(pick(record, &["userId", "user_id"])),
            title: to_string(record.get("title")),
            description: to_string(record.get("description")),
            total_duration: to_string(pick(record, &["totalDuration", "total_duration"])),
            difficulty_level: to_string(pick(record, &["difficultyLevel", "difficulty_level"])),
            phases: decode_list(record.get("phases"), |v| Phase::from_value(v, clock)),
            milestones: to_string_list(record.get("milestones")),
            courses: decode_list(record.get("courses"), |v| Course::from_value(v, clock)),
            skills_acquired: to_string_list(pick(record, &["skillsAcquired", "skills_acquired"])),
            prerequisites: to_string_list(record.get("prerequisites")),
            daily_time_commitment: to_string(pick(
                record,
                &["dailyTimeCommitment", "daily_time_commitment"],
            )),
            next_steps: to_string_list(pick(record, &["nextSteps", "next_steps"])),
            created_at: to_date(pick(record, &["createdAt", "created_at"]), clock.now()),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub phase_number: i64,
    pub title: String,
    pub duration: String,
    pub description: String,
    pub topics: Vec<Topic>,
    #[serde(rename = "learningResources")]
    pub resources: Vec<Course>,
    #[serde(rename = "practiceProjects")]
    pub projects: Vec<PracticeProject>,
    #[serde(rename = "weekByWeekPlan")]
    pub weekly_plan: Vec<WeekPlan>,
    pub assessment_criteria: Vec<String>,
}

impl FromRecord for Phase {
    fn from_record(record: &Record, clock: &dyn Clock) -> Self {
        Phase {
            phase_number: to_int(pick(record, &["phaseNumber", "phase_number"]), 0),
            title: to_string(record.get("title")),
            duration: to_string(record.get("duration")),
            description: to_string(record.get("description")),
            topics: decode_list(record.get("topics"), |v| Topic::from_value(v, clock)),
            resources: decode_list(
                pick(record, &["learningResources", "learning_resources", "resources"]),
                |v| Course::from_value(v, clock),
            ),
            projects: decode_list(
                pick(record, &["practiceProjects", "practice_projects"]),
                |v| PracticeProject::from_value(v, clock),
            ),
            weekly_plan: decode_list(
                pick(record, &["weekByWeekPlan", "week_by_week_plan"]),
                |v| WeekPlan::from_value(v, clock),
            ),
            assessment_criteria: to_string_list(pick(
                record,
                &["assessmentCriteria", "assessment_criteria"],
            )),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    pub subtopics: Vec<String>,
    pub estimated_hours: i64,
    pub difficulty: String,
}

impl FromRecord for Topic {
    fn from_record(record: &Record, _clock: &dyn Clock) -> Self {
        Topic {
            name: to_string(pick(record, &["name", "title"])),
            subtopics: to_string_list(record.get("subtopics")),
            estimated_hours: to_int(pick(record, &["estimatedHours", "estimated_hours"]), 0),
            difficulty: to_string(record.get("difficulty")),
        }
    }

    /// Topics are sometimes a bare name instead of an object.
    fn from_value(value: &Value, clock: &dyn Clock) -> Option<Self> {
        match value {
            Value::String(name) if !name.trim().is_empty() => Some(Topic {
                name: name.clone(),
                subtopics: Vec::new(),
                estimated_hours: 0,
                difficulty: String::new(),
            }),
            Value::Object(record) => Some(Self::from_record(record, clock)),
            _ => None,
        }
    }
}

/// A course or other learning resource.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: String,
    pub url: String,
    pub duration: String,
    pub cost: String,
    pub description: String,
}

impl Course {
    pub fn is_free(&self) -> bool {
        self.cost.trim().eq_ignore_ascii_case("free")
    }
}

impl FromRecord for Course {
    fn from_record(record: &Record, _clock: &dyn Clock) -> Self {
        Course {
            title: to_string(pick(record, &["title", "name"])),
            kind: to_string(record.get("type")),
            provider: to_string(record.get("provider")),
            url: to_string(record.get("url")),
            duration: to_string(record.get("duration")),
            cost: to_string(record.get("cost")),
            description: to_string(record.get("description")),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PracticeProject {
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub estimated_hours: i64,
    pub skills: Vec<String>,
}

impl FromRecord for PracticeProject {
    fn from_record(record: &Record, _clock: &dyn Clock) -> Self {
        PracticeProject {
            title: to_string(record.get("title")),
            description: to_string(record.get("description")),
            difficulty: to_string(record.get("difficulty")),
            estimated_hours: to_int(pick(record, &["estimatedHours", "estimated_hours"]), 0),
            skills: to_string_list(record.get("skills")),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WeekPlan {
    pub week: i64,
    pub focus: String,
    pub tasks: Vec<String>,
    pub deliverable: String,
}

impl FromRecord for WeekPlan {
    fn from_record(record: &Record, _clock: &dyn Clock) -> Self {
        WeekPlan {
            week: to_int(record.get("week"), 0),
            focus: to_string(record.get("focus")),
            tasks: to_string_list(record.get("tasks")),
            deliverable: to_string(record.get("deliverable")),
        }
    }
}

/// A user's progress through one learning path.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathProgress {
    pub user_id: String,
    pub path_id: String,
    pub completed_milestones: Vec<String>,
    pub current_phase: i64,
    pub completed_tasks: i64,
    pub total_tasks: i64,
    pub progress_percent: f64,
    pub started_at: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl FromRecord for LearningPathProgress {
    fn from_record(record: &Record, clock: &dyn Clock) -> Self {
        LearningPathProgress {
            user_id: to_string(pick(record, &["userId", "user_id"])),
            path_id: to_string(pick(record, &["pathId", "path_id"])),
            completed_milestones: to_string_list(pick(
                record,
                &["completedMilestones", "completed_milestones"],
            )),
            current_phase: to_int(pick(record, &["currentPhase", "current_phase"]), 0),
            completed_tasks: to_int(pick(record, &["completedTasks", "completed_tasks"]), 0),
            total_tasks: to_int(pick(record, &["totalTasks", "total_tasks"]), 0),
            progress_percent: to_double(pick(record, &["progressPercent", "progress_percent"]), 0.0),
            started_at: to_date(pick(record, &["startedAt", "started_at"]), clock.now()),
            last_updated: to_optional_date(pick(record, &["lastUpdated", "last_updated"])),
        }
    }
}
