use thiserror::Error;

/// Errors surfaced by persistence, calendar sync and the CLI.
///
/// Record decoding never produces one of these; it degrades to defaults.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("task {task_id} not found for user {user_id}")]
    TaskNotFound { user_id: String, task_id: String },

    #[error("no learning path for user {0}: pass --path or set an active path in the profile")]
    NoActivePath(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("calendar error: {0}")]
    Calendar(String),

    #[error("invalid date '{0}', use YYYY-MM-DD")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = Error::TaskNotFound {
            user_id: "u1".into(),
            task_id: "t9".into(),
        };
        assert_eq!(err.to_string(), "task t9 not found for user u1");
        assert!(Error::InvalidDate("x".into()).to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
