use chrono::{DateTime, Utc};
use serde::Serialize;

use super::FromRecord;
use crate::clock::Clock;
use crate::normalize::{pick, to_date, to_int, to_record, to_string, to_string_list, Record};

/// Fields pulled out of a resume's text.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ExtractedInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub projects: Vec<String>,
    pub certifications: Vec<String>,
}

impl FromRecord for ExtractedInfo {
    fn from_record(record: &Record, _clock: &dyn Clock) -> Self {
        ExtractedInfo {
            name: to_string(record.get("name")),
            email: to_string(record.get("email")),
            phone: to_string(record.get("phone")),
            skills: to_string_list(record.get("skills")),
            education: to_string_list(record.get("education")),
            experience: to_string_list(record.get("experience")),
            projects: to_string_list(record.get("projects")),
            certifications: to_string_list(record.get("certifications")),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResumeAnalysis {
    pub file_name: String,
    pub extracted_info: ExtractedInfo,
    /// 0..=100; out-of-range stored values are clamped.
    pub ats_score: i64,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl FromRecord for ResumeAnalysis {
    fn from_record(record: &Record, clock: &dyn Clock) -> Self {
        let info = to_record(pick(record, &["extracted_info", "extractedInfo"]));
        ResumeAnalysis {
            file_name: to_string(pick(record, &["file_name", "fileName"])),
            extracted_info: ExtractedInfo::from_record(&info, clock),
            ats_score: to_int(pick(record, &["ats_score", "atsScore"]), 0).clamp(0, 100),
            strengths: to_string_list(record.get("strengths")),
            improvements: to_string_list(pick(record, &["improvements", "areas_for_improvement"])),
            analyzed_at: to_date(pick(record, &["analyzed_at", "analyzedAt"]), clock.now()),
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

    #[test]
    fn analysis_decodes_and_clamps() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let raw = json!({
            "file_name": "cv.pdf",
            "extracted_info": {"name": "Ana", "skills": ["Rust", "SQL"], "phone": 5551234},
            "ats_score": "140",
            "analyzed_at": "2029-12-31"
        });
        let analysis = ResumeAnalysis::from_value(&raw, &clock).unwrap();
        assert_eq!(analysis.extracted_info.phone, "5551234");
        assert_eq!(analysis.ats_score, 100);
        assert_eq!(analysis.extracted_info.skills, vec!["Rust", "SQL"]);
        assert_eq!(ResumeAnalysis::from_record(&analysis.to_record(), &clock), analysis);
    }

    #[test]
    fn missing_nested_info_defaults() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let raw = json!({"extracted_info": "n/a", "ats_score": null});
        let analysis = ResumeAnalysis::from_value(&raw, &clock).unwrap();
        assert_eq!(analysis.extracted_info, ExtractedInfo::default());
        assert_eq!(analysis.ats_score, 0);
        assert_eq!(analysis.analyzed_at, clock.now());
    }
}
