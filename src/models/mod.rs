//! Domain entities and their record codecs.

mod interview;
mod path;
mod profile;
mod resume;
mod task;

pub use interview::{
    AnswerFeedback, CategoryScores, InterviewQuestion, InterviewReport, InterviewSession,
};
pub use path::{
    Course, LearningPath, LearningPathProgress, Phase, PracticeProject, Topic, WeekPlan,
    DEFAULT_PHASE_TITLE,
};
pub use profile::UserProfile;
pub use resume::{ExtractedInfo, ResumeAnalysis};
pub use task::{
    DailyTask, TaskType, DEFAULT_ESTIMATED_MINUTES, PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MEDIUM,
};

use crate::clock::Clock;
use crate::normalize::Record;
use serde::Serialize;
use serde_json::Value;

/// Tolerant construction from a raw record.
///
/// Implementations never fail: unusable fields take their documented default.
pub trait FromRecord: Sized {
    fn from_record(record: &Record, clock: &dyn Clock) -> Self;

    /// Decodes a list element. Only objects are accepted.
    fn from_value(value: &Value, clock: &dyn Clock) -> Option<Self> {
        value.as_object().map(|record| Self::from_record(record, clock))
    }
}

/// Outbound record shape, driven by each entity's `Serialize` impl.
pub trait ToRecord {
    fn to_record(&self) -> Record;
}

impl<T: Serialize> ToRecord for T {
    fn to_record(&self) -> Record {
        match serde_json::to_value(self) {
            Ok(Value::Object(record)) => record,
            _ => Record::new(),
        }
    }
}
