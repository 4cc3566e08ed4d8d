use chrono::{DateTime, Utc};
use serde::Serialize;

use super::FromRecord;
use crate::clock::Clock;
use crate::normalize::{pick, to_date, to_optional_date, to_optional_string, to_string, to_string_list, Record};

/// A student's onboarding profile.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub interests: Vec<String>,
    pub skills: Vec<String>,
    pub career_goal: String,
    pub education_level: String,
    pub time_commitment: String,
    pub active_path_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FromRecord for UserProfile {
    fn from_record(record: &Record, clock: &dyn Clock) -> Self {
        UserProfile {
            uid: to_string(pick(record, &["uid", "id"])),
            name: to_string(pick(record, &["name", "displayName"])),
            email: to_string(record.get("email")),
            interests: to_string_list(record.get("interests")),
            skills: to_string_list(record.get("skills")),
            career_goal: to_string(pick(record, &["careerGoal", "career_goal"])),
            education_level: to_string(pick(record, &["educationLevel", "education_level"])),
            time_commitment: to_string(pick(record, &["timeCommitment", "time_commitment"])),
            active_path_id: to_optional_string(pick(record, &["activePathId", "active_path_id"])),
            created_at: to_date(pick(record, &["createdAt", "created_at"]), clock.now()),
            updated_at: to_optional_date(pick(record, &["updatedAt", "updated_at"])),
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
    fn profile_round_trip_and_garbage() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2030, 2, 2, 2, 2, 2).unwrap());
        let raw = json!({
            "uid": "u1",
            "name": "Sam",
            "email": "sam@example.com",
            "interests": ["ml"],
            "skills": ["python", "rust"],
            "careerGoal": "ML engineer",
            "createdAt": "2024-09-01T10:00:00Z",
            "updatedAt": {"seconds": 1_725_184_800}
        });
        let profile = UserProfile::from_value(&raw, &clock).unwrap();
        assert_eq!(profile.skills.len(), 2);
        assert_eq!(profile.active_path_id, None);
        assert_eq!(UserProfile::from_record(&profile.to_record(), &clock), profile);

        let junk = json!({"uid": 9, "interests": "ml", "createdAt": [], "updatedAt": 1});
        let profile = UserProfile::from_value(&junk, &clock).unwrap();
        assert_eq!(profile.uid, "9");
        assert!(profile.interests.is_empty());
        assert_eq!(profile.created_at, clock.now());
        assert_eq!(profile.updated_at, None);
    }
}
