//! Mirroring generated tasks into a calendar.
//!
//! Sync is best-effort: a task that fails to sync is logged and skipped,
//! and persisted tasks are never rolled back because of it.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};
use crate::models::DailyTask;

pub trait CalendarSync {
    /// Adds each task, reporting the running success count through
    /// `on_progress`. Returns the number of tasks added.
    fn add_tasks_to_calendar(
        &mut self,
        tasks: &[DailyTask],
        on_progress: &mut dyn FnMut(usize),
    ) -> usize;
}

/// Calendar sync that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCalendar;

impl CalendarSync for NoCalendar {
    fn add_tasks_to_calendar(&mut self, _tasks: &[DailyTask], _on_progress: &mut dyn FnMut(usize)) -> usize {
        0
    }
}

const UID_DOMAIN: &str = "studyweek";

/// Writes tasks as VEVENTs into an iCalendar file.
///
/// Events already in the file are kept; an event with the same UID is
/// replaced, so re-syncing a regenerated week does not duplicate it.
pub struct IcsCalendar {
    path: PathBuf,
    generated_at: DateTime<Utc>,
}

impl IcsCalendar {
    pub fn new(path: impl Into<PathBuf>, generated_at: DateTime<Utc>) -> Self {
        IcsCalendar {
            path: path.into(),
            generated_at,
        }
    }

    fn read_events(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(split_events(&text))
    }

    fn write_events(&self, events: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut output = String::new();
        output.push_str("BEGIN:VCALENDAR\r\n");
        output.push_str("VERSION:2.0\r\n");
        output.push_str("PRODID:-//studyweek//Weekly Plan//EN\r\n");
        output.push_str("CALSCALE:GREGORIAN\r\n");
        for event in events {
            output.push_str(event);
        }
        output.push_str("END:VCALENDAR\r\n");
        fs::write(&self.path, output)?;
        Ok(())
    }
}

impl CalendarSync for IcsCalendar {
    fn add_tasks_to_calendar(
        &mut self,
        tasks: &[DailyTask],
        on_progress: &mut dyn FnMut(usize),
    ) -> usize {
        let mut events = match self.read_events() {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "calendar file unreadable, skipping sync");
                return 0;
            }
        };

        let mut added = 0;
        for task in tasks {
            match build_event(task, self.generated_at) {
                Ok(event) => {
                    let uid = event_uid(&task.id);
                    events.retain(|e| !e.contains(&uid));
                    events.push(event);
                    added += 1;
                    on_progress(added);
                }
                Err(e) => tracing::warn!(task_id = %task.id, error = %e, "skipping calendar event"),
            }
        }

        if let Err(e) = self.write_events(&events) {
            tracing::warn!(path = ?self.path, error = %e, "failed to write calendar file");
            return 0;
        }
        added
    }
}

fn event_uid(task_id: &str) -> String {
    format!("UID:{}@{}\r\n", escape_ical_text(task_id), UID_DOMAIN)
}

fn build_event(task: &DailyTask, generated_at: DateTime<Utc>) -> Result<String> {
    if task.id.trim().is_empty() {
        return Err(Error::Calendar("task has no id".to_string()));
    }
    let day = task.scheduled_day();
    let next = day
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| Error::Calendar(format!("date out of range: {day}")))?;
    let status = if task.is_completed { "COMPLETED" } else { "NEEDS-ACTION" };

    let mut event = String::new();
    event.push_str("BEGIN:VEVENT\r\n");
    event.push_str(&event_uid(&task.id));
    event.push_str(&format!("DTSTAMP:{}\r\n", format_ical_datetime_utc(generated_at)));
    event.push_str(&format!("DTSTART;VALUE=DATE:{}\r\n", day.format("%Y%m%d")));
    event.push_str(&format!("DTEND;VALUE=DATE:{}\r\n", next.format("%Y%m%d")));
    event.push_str(&format!("SUMMARY:{}\r\n", escape_ical_text(&task.title)));
    event.push_str(&format!(
        "DESCRIPTION:{}\r\n",
        escape_ical_text(&format!(
            "{} ({} min, {} priority)",
            task.description,
            task.estimated_minutes,
            task.priority_label()
        ))
    ));
    event.push_str(&format!("CATEGORIES:{}\r\n", task.task_type));
    event.push_str(&format!("STATUS:{}\r\n", status));
    event.push_str("END:VEVENT\r\n");
    Ok(event)
}

/// Splits an iCalendar document into whole VEVENT blocks.
fn split_events(text: &str) -> Vec<String> {
    let mut events = Vec::new();
    let mut current: Option<String> = None;
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line == "BEGIN:VEVENT" {
            current = Some(String::new());
        }
        if let Some(buf) = current.as_mut() {
            buf.push_str(line);
            buf.push_str("\r\n");
        }
        if line == "END:VEVENT" {
            events.extend(current.take());
        }
    }
    events
}

fn format_ical_datetime_utc(value: DateTime<Utc>) -> String {
    value.format("%Y%m%dT%H%M%SZ").to_string()
}

fn escape_ical_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\r', "")
        .replace('\n', "\\n")
        .replace(';', "\\;")
        .replace(',', "\\,")
}
