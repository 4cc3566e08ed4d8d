//! Persistence for daily tasks, learning paths and profiles.
//!
//! Everything is kept as raw JSON records and decoded through the
//! normalizer on the way back in, so hand-edited or older files still load.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::models::{DailyTask, FromRecord, LearningPath, ToRecord, UserProfile};
use crate::normalize::{decode_list, Record};

/// Where generated tasks live.
pub trait TaskStore {
    /// Persists a batch. Tasks whose id already exists are overwritten.
    fn save_daily_tasks(&mut self, user_id: &str, tasks: &[DailyTask]) -> Result<()>;

    /// Tasks scheduled on `date` (calendar day), in stored order.
    fn get_tasks_for_date(&self, user_id: &str, date: NaiveDate) -> Result<Vec<DailyTask>>;

    fn find_task(&self, user_id: &str, task_id: &str) -> Result<Option<DailyTask>>;

    /// Sets completion state; `Some(at)` completes, `None` reopens.
    fn set_task_completion(
        &mut self,
        user_id: &str,
        task_id: &str,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<DailyTask>;

    fn complete_task(&mut self, user_id: &str, task_id: &str, at: DateTime<Utc>) -> Result<DailyTask> {
        self.set_task_completion(user_id, task_id, Some(at))
    }
}

fn merge_tasks(existing: &mut Vec<DailyTask>, incoming: &[DailyTask]) {
    for task in incoming {
        if let Some(slot) = existing.iter_mut().find(|t| t.id == task.id) {
            *slot = task.clone();
        } else {
            existing.push(task.clone());
        }
    }
}

fn apply_completion(
    tasks: &mut [DailyTask],
    user_id: &str,
    task_id: &str,
    completed_at: Option<DateTime<Utc>>,
) -> Result<DailyTask> {
    let task = tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| Error::TaskNotFound {
            user_id: user_id.to_string(),
            task_id: task_id.to_string(),
        })?;
    match completed_at {
        Some(at) => task.mark_completed(at),
        None => task.mark_incomplete(),
    }
    Ok(task.clone())
}

fn on_day(tasks: &[DailyTask], date: NaiveDate) -> Vec<DailyTask> {
    tasks
        .iter()
        .filter(|t| t.scheduled_day() == date)
        .cloned()
        .collect()
}

/// In-process store.
#[derive(Debug, Default, Clone)]
pub struct MemoryTaskStore {
    tasks: HashMap<String, Vec<DailyTask>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All tasks of a user, in stored order.
    pub fn all_tasks(&self, user_id: &str) -> &[DailyTask] {
        self.tasks.get(user_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl TaskStore for MemoryTaskStore {
    fn save_daily_tasks(&mut self, user_id: &str, tasks: &[DailyTask]) -> Result<()> {
        merge_tasks(self.tasks.entry(user_id.to_string()).or_default(), tasks);
        Ok(())
    }

    fn get_tasks_for_date(&self, user_id: &str, date: NaiveDate) -> Result<Vec<DailyTask>> {
        Ok(on_day(self.all_tasks(user_id), date))
    }

    fn find_task(&self, user_id: &str, task_id: &str) -> Result<Option<DailyTask>> {
        Ok(self.all_tasks(user_id).iter().find(|t| t.id == task_id).cloned())
    }

    fn set_task_completion(
        &mut self,
        user_id: &str,
        task_id: &str,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<DailyTask> {
        let tasks = self.tasks.get_mut(user_id).map(Vec::as_mut_slice).unwrap_or(&mut []);
        apply_completion(tasks, user_id, task_id, completed_at)
    }
}

/// File-backed store: one JSON object mapping user id to task records.
///
/// The whole file is rewritten on every save.
pub struct JsonTaskStore {
    path: PathBuf,
    clock: Box<dyn Clock>,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }

    /// `clock` supplies the fallback for unreadable `scheduled_date` fields.
    pub fn with_clock(path: impl Into<PathBuf>, clock: impl Clock + 'static) -> Self {
        JsonTaskStore {
            path: path.into(),
            clock: Box::new(clock),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every user's tasks.
    ///
    /// A missing file is an empty store. A file that is not valid JSON is an
    /// error so that a later save cannot silently clobber it.
    pub fn load_all(&self) -> Result<BTreeMap<String, Vec<DailyTask>>> {
        let Some(text) = read_file(&self.path)? else {
            return Ok(BTreeMap::new());
        };
        let root: Value = serde_json::from_str(&text)?;
        let Value::Object(users) = root else {
            return Err(Error::Storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            )));
        };
        let clock = self.clock.as_ref();
        Ok(users
            .iter()
            .map(|(user, records)| {
                let tasks = decode_list(Some(records), |v| DailyTask::from_value(v, clock));
                (user.clone(), tasks)
            })
            .collect())
    }

    fn save_all(&self, users: &BTreeMap<String, Vec<DailyTask>>) -> Result<()> {
        let root: Record = users
            .iter()
            .map(|(user, tasks)| {
                let records = tasks.iter().map(|t| Value::Object(t.to_record())).collect();
                (user.clone(), Value::Array(records))
            })
            .collect();
        write_file(&self.path, &serde_json::to_string_pretty(&root)?)
    }

    fn user_tasks(&self, user_id: &str) -> Result<Vec<DailyTask>> {
        Ok(self.load_all()?.remove(user_id).unwrap_or_default())
    }
}

impl TaskStore for JsonTaskStore {
    fn save_daily_tasks(&mut self, user_id: &str, tasks: &[DailyTask]) -> Result<()> {
        let mut users = self.load_all()?;
        merge_tasks(users.entry(user_id.to_string()).or_default(), tasks);
        self.save_all(&users)?;
        tracing::debug!(user_id, count = tasks.len(), path = ?self.path, "saved daily tasks");
        Ok(())
    }

    fn get_tasks_for_date(&self, user_id: &str, date: NaiveDate) -> Result<Vec<DailyTask>> {
        Ok(on_day(&self.user_tasks(user_id)?, date))
    }

    fn find_task(&self, user_id: &str, task_id: &str) -> Result<Option<DailyTask>> {
        Ok(self.user_tasks(user_id)?.into_iter().find(|t| t.id == task_id))
    }

    fn set_task_completion(
        &mut self,
        user_id: &str,
        task_id: &str,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<DailyTask> {
        let mut users = self.load_all()?;
        let tasks = users.get_mut(user_id).map(Vec::as_mut_slice).unwrap_or(&mut []);
        let updated = apply_completion(tasks, user_id, task_id, completed_at)?;
        self.save_all(&users)?;
        Ok(updated)
    }
}

/// Reads a file, `None` if it does not exist.
fn read_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut f = OpenOptions::new().read(true).open(path)?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    Ok(Some(s))
}

/// Overwrites a file, creating parent directories as needed.
fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(contents.as_bytes())?;
    Ok(())
}

/// Loads a JSON array of raw records.
///
/// Missing or unreadable files load as empty, non-object elements are dropped.
pub fn load_records(path: &Path) -> Vec<Record> {
    let text = match read_file(path) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "failed to read records, using none");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => decode_list(Some(&value), |v| v.as_object().cloned()),
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "failed to parse records, using none");
            Vec::new()
        }
    }
}

fn save_records(path: &Path, records: &[Record]) -> Result<()> {
    write_file(path, &serde_json::to_string_pretty(records)?)
}

/// Inserts or replaces the record whose `key` field equals `id`.
fn upsert_record(path: &Path, key: &str, id: &str, record: Record) -> Result<()> {
    let mut records = load_records(path);
    let existing = records
        .iter_mut()
        .find(|r| r.get(key).and_then(Value::as_str) == Some(id));
    match existing {
        Some(slot) => *slot = record,
        None => records.push(record),
    }
    save_records(path, &records)
}

pub fn load_paths(path: &Path, clock: &dyn Clock) -> Vec<LearningPath> {
    load_records(path)
        .iter()
        .map(|r| LearningPath::from_record(r, clock))
        .collect()
}

pub fn find_path(path: &Path, id: &str, clock: &dyn Clock) -> Option<LearningPath> {
    load_paths(path, clock).into_iter().find(|p| p.id == id)
}

pub fn save_path(path: &Path, learning_path: &LearningPath) -> Result<()> {
    upsert_record(path, "id", &learning_path.id, learning_path.to_record())
}

pub fn load_profile(path: &Path, uid: &str, clock: &dyn Clock) -> Option<UserProfile> {
    load_records(path)
        .iter()
        .map(|r| UserProfile::from_record(r, clock))
        .find(|p| p.uid == uid)
}

pub fn save_profile(path: &Path, profile: &UserProfile) -> Result<()> {
    upsert_record(path, "uid", &profile.uid, profile.to_record())
}

/// Deletes the task, path, profile and calendar files that exist.
pub fn delete_database(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        if path.exists() {
            fs::remove_file(path)?;
        }
    }
    Ok(())
}
