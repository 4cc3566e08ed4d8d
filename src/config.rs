use std::path::{Path, PathBuf};

pub const DB_ENV: &str = "STUDYWEEK_DB";
pub const CALENDAR_ENV: &str = "STUDYWEEK_CALENDAR";
pub const USER_ENV: &str = "STUDYWEEK_USER";
pub const DEFAULT_USER: &str = "local";

/// File locations and defaults resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Task database (`tasks.json`).
    pub db_path: PathBuf,
    /// iCalendar file that generated weeks are mirrored into.
    pub calendar_path: PathBuf,
    pub default_user: String,
}

impl Config {
    /// Resolves paths in the following order:
    /// 1. `STUDYWEEK_DB` / `STUDYWEEK_CALENDAR` environment variables.
    /// 2. `~/.local/share/studyweek/` (platform data dir).
    /// 3. `./` as a last resort.
    pub fn from_env() -> Config {
        let db_path = std::env::var(DB_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
                p.push("studyweek");
                p.push("tasks.json");
                p
            });
        let calendar_path = std::env::var(CALENDAR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| sibling(&db_path, "calendar.ics"));
        let default_user = std::env::var(USER_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        Config {
            db_path,
            calendar_path,
            default_user,
        }
    }

    /// Config rooted at an explicit database path.
    pub fn with_db(db_path: impl Into<PathBuf>) -> Config {
        let db_path = db_path.into();
        Config {
            calendar_path: sibling(&db_path, "calendar.ics"),
            db_path,
            default_user: DEFAULT_USER.to_string(),
        }
    }

    /// Learning path records, stored beside the task database.
    pub fn paths_path(&self) -> PathBuf {
        sibling(&self.db_path, "paths.json")
    }

    /// Profile records, stored beside the task database.
    pub fn profiles_path(&self) -> PathBuf {
        sibling(&self.db_path, "profiles.json")
    }

    pub fn user_or_default(&self, user: Option<String>) -> String {
        user.unwrap_or_else(|| self.default_user.clone())
    }
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    let mut p = path.to_path_buf();
    p.pop();
    p.push(name);
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_share_the_db_directory() {
        let config = Config::with_db("/tmp/sw/tasks.json");
        assert_eq!(config.paths_path(), PathBuf::from("/tmp/sw/paths.json"));
        assert_eq!(config.profiles_path(), PathBuf::from("/tmp/sw/profiles.json"));
        assert_eq!(config.calendar_path, PathBuf::from("/tmp/sw/calendar.ics"));
        assert_eq!(config.user_or_default(None), DEFAULT_USER);
        assert_eq!(config.user_or_default(Some("u2".into())), "u2");
    }
}
