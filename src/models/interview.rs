use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::FromRecord;
use crate::clock::Clock;
use crate::normalize::{
    decode_list, pick, to_date, to_double, to_int, to_optional_date, to_optional_string,
    to_record, to_string, to_string_list, Record,
};

const MAX_HIGHLIGHTS: usize = 5;
const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InterviewQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub topic: String,
    pub expected_points: Vec<String>,
}

impl FromRecord for InterviewQuestion {
    fn from_record(record: &Record, _clock: &dyn Clock) -> Self {
        InterviewQuestion {
            id: to_string(record.get("id")),
            question: to_string(pick(record, &["question", "text"])),
            question_type: to_string(pick(record, &["type", "question_type"])),
            topic: to_string(record.get("topic")),
            expected_points: to_string_list(record.get("expected_points")),
        }
    }
}

/// Evaluation of a single answer.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub question_id: String,
    pub question_type: String,
    pub answer: String,
    /// 0..=10.
    pub score: f64,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub feedback: String,
    pub follow_up_suggestion: Option<String>,
}

impl FromRecord for AnswerFeedback {
    fn from_record(record: &Record, _clock: &dyn Clock) -> Self {
        AnswerFeedback {
            question_id: to_string(record.get("question_id")),
            question_type: to_string(record.get("question_type")),
            answer: to_string(record.get("answer")),
            score: to_double(record.get("score"), 0.0),
            strengths: to_string_list(record.get("strengths")),
            areas_for_improvement: to_string_list(record.get("areas_for_improvement")),
            feedback: to_string(record.get("feedback")),
            follow_up_suggestion: to_optional_string(record.get("follow_up_suggestion")),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InterviewSession {
    pub session_id: String,
    pub user_id: String,
    pub interview_type: String,
    pub role: String,
    pub questions: Vec<InterviewQuestion>,
    pub feedback: Vec<AnswerFeedback>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl FromRecord for InterviewSession {
    fn from_record(record: &Record, clock: &dyn Clock) -> Self {
        InterviewSession {
            session_id: to_string(pick(record, &["session_id", "id"])),
            user_id: to_string(record.get("user_id")),
            interview_type: to_string(record.get("interview_type")),
            role: to_string(record.get("role")),
            questions: decode_list(record.get("questions"), |v| {
                InterviewQuestion::from_value(v, clock)
            }),
            feedback: decode_list(record.get("feedback"), |v| AnswerFeedback::from_value(v, clock)),
            started_at: to_date(record.get("started_at"), clock.now()),
            completed_at: to_optional_date(record.get("completed_at")),
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct CategoryScores {
    pub technical: Option<f64>,
    pub behavioral: Option<f64>,
}

/// Summary of a finished (or abandoned) interview session.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InterviewReport {
    pub session_id: String,
    pub interview_type: String,
    pub overall_score: f64,
    pub overall_assessment: String,
    pub scores_by_category: CategoryScores,
    pub total_questions: i64,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub duration_minutes: i64,
    pub recommendations: Vec<String>,
}

impl InterviewReport {
    /// Aggregates per-answer feedback into a report.
    ///
    /// An unfinished session is measured up to `clock.now()`. A start after
    /// the end counts as zero minutes.
    pub fn from_session(session: &InterviewSession, clock: &dyn Clock) -> Self {
        let scores: Vec<f64> = session.feedback.iter().map(|f| f.score).collect();
        let average = mean(&scores).unwrap_or(0.0);

        let by_type = |kind: &str| {
            let scores: Vec<f64> = session
                .feedback
                .iter()
                .filter(|f| f.question_type == kind)
                .map(|f| f.score)
                .collect();
            mean(&scores).map(round2)
        };

        let strengths: Vec<String> = session
            .feedback
            .iter()
            .flat_map(|f| f.strengths.iter().cloned())
            .collect();
        let improvements: Vec<String> = session
            .feedback
            .iter()
            .flat_map(|f| f.areas_for_improvement.iter().cloned())
            .collect();

        let end = session.completed_at.unwrap_or_else(|| clock.now());

        InterviewReport {
            session_id: session.session_id.clone(),
            interview_type: session.interview_type.clone(),
            overall_score: round2(average),
            overall_assessment: assessment_for(average).to_string(),
            scores_by_category: CategoryScores {
                technical: by_type("technical"),
                behavioral: by_type("behavioral"),
            },
            total_questions: session.questions.len() as i64,
            strengths: dedup_first(&strengths, MAX_HIGHLIGHTS),
            areas_for_improvement: dedup_first(&improvements, MAX_HIGHLIGHTS),
            duration_minutes: (end - session.started_at).num_minutes().max(0),
            recommendations: recommendations_for(average, &improvements),
        }
    }
}

impl FromRecord for InterviewReport {
    fn from_record(record: &Record, _clock: &dyn Clock) -> Self {
        let categories = to_record(record.get("scores_by_category"));
        let category = |key: &str| match categories.get(key) {
            None | Some(Value::Null) => None,
            Some(v) => Some(to_double(Some(v), 0.0)),
        };
        InterviewReport {
            session_id: to_string(record.get("session_id")),
            interview_type: to_string(record.get("interview_type")),
            overall_score: to_double(record.get("overall_score"), 0.0),
            overall_assessment: to_string(record.get("overall_assessment")),
            scores_by_category: CategoryScores {
                technical: category("technical"),
                behavioral: category("behavioral"),
            },
            total_questions: to_int(record.get("total_questions"), 0),
            strengths: to_string_list(record.get("strengths")),
            areas_for_improvement: to_string_list(record.get("areas_for_improvement")),
            duration_minutes: to_int(record.get("duration_minutes"), 0),
            recommendations: to_string_list(record.get("recommendations")),
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn assessment_for(score: f64) -> &'static str {
    if score >= 8.0 {
        "Excellent"
    } else if score >= 6.0 {
        "Good"
    } else if score >= 4.0 {
        "Average"
    } else {
        "Needs Improvement"
    }
}

fn dedup_first(items: &[String], limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if out.len() == limit {
            break;
        }
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

fn recommendations_for(score: f64, improvements: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    if score < 5.0 {
        out.push("Practice more mock interviews to build confidence");
        out.push("Focus on articulating your thoughts clearly");
    }
    if score < 7.0 {
        out.push("Provide more specific examples from your experience");
        out.push("Work on structuring your answers using the STAR method");
    }
    let mentions = |needle: &str| improvements.iter().any(|i| i.to_lowercase().contains(needle));
    if mentions("technical") {
        out.push("Review core technical concepts in your skill areas");
    }
    if mentions("example") {
        out.push("Prepare specific examples for common interview questions");
    }
    if out.is_empty() {
        out.push("Keep practicing to maintain your strong interview skills");
        out.push("Focus on showcasing your unique experiences");
    }
    out.into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::ToRecord;
    use chrono::TimeZone;
    use serde_json::json;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2030, 4, 1, 10, 30, 0).unwrap())
    }

    fn session() -> InterviewSession {
        let raw = json!({
            "session_id": "s1",
            "interview_type": "technical",
            "questions": [
                {"id": "q_0", "question": "Intro?", "type": "introduction"},
                {"id": "q_1", "question": "Threads?", "type": "technical"},
                "not a question"
            ],
            "feedback": [
                {"question_id": "q_0", "question_type": "introduction", "score": 9,
                 "strengths": ["clear"], "areas_for_improvement": []},
                {"question_id": "q_1", "question_type": "technical", "score": "6.5",
                 "strengths": ["clear", "depth"],
                 "areas_for_improvement": ["More technical detail", "Give an example"]}
            ],
            "started_at": "2030-04-01T10:00:00Z"
        });
        InterviewSession::from_value(&raw, &clock()).unwrap()
    }

    #[test]
    fn report_aggregates_feedback() {
        let report = InterviewReport::from_session(&session(), &clock());
        assert_eq!(report.total_questions, 2);
        assert_eq!(report.overall_score, 7.75);
        assert_eq!(report.overall_assessment, "Good");
        assert_eq!(report.scores_by_category.technical, Some(6.5));
        assert_eq!(report.scores_by_category.behavioral, None);
        assert_eq!(report.strengths, vec!["clear", "depth"]);
        assert_eq!(report.duration_minutes, 30);
        assert_eq!(
            report.recommendations,
            vec![
                "Review core technical concepts in your skill areas",
                "Prepare specific examples for common interview questions",
            ]
        );
    }

    #[test]
    fn empty_session_reports_needs_improvement() {
        let empty = InterviewSession::from_record(&Record::new(), &clock());
        let report = InterviewReport::from_session(&empty, &clock());
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.overall_assessment, "Needs Improvement");
        assert_eq!(report.duration_minutes, 0);
        assert_eq!(report.recommendations.len(), 4);
    }

    #[test]
    fn duration_is_never_negative() {
        let mut session = session();
        session.completed_at = Some(Utc.with_ymd_and_hms(2030, 4, 1, 9, 0, 0).unwrap());
        let report = InterviewReport::from_session(&session, &clock());
        assert_eq!(report.duration_minutes, 0);

        session.completed_at = Some(Utc.with_ymd_and_hms(2030, 4, 1, 10, 45, 0).unwrap());
        assert_eq!(InterviewReport::from_session(&session, &clock()).duration_minutes, 45);
    }

    #[test]
    fn report_round_trip() {
        let report = InterviewReport::from_session(&session(), &clock());
        assert_eq!(InterviewReport::from_record(&report.to_record(), &clock()), report);
    }

    #[test]
    fn session_round_trip() {
        let session = session();
        assert_eq!(InterviewSession::from_record(&session.to_record(), &clock()), session);
    }
}
