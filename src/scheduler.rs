//! Rolling seven-day week built on the task generator.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::fmt;

use crate::calendar::CalendarSync;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::generator::generate_tasks_for_day;
use crate::models::DailyTask;
use crate::store::TaskStore;

/// Days in a week window, starting at "today".
pub const WEEK_DAYS: i64 = 7;

/// Lifecycle of a week window as seen from "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStatus {
    /// No tasks exist in the window.
    NotStarted,
    /// Tasks exist and the last one is today or later.
    Active,
    /// Tasks exist and every one is scheduled before today.
    Ended,
}

impl fmt::Display for WeekStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeekStatus::NotStarted => "not started",
            WeekStatus::Active => "active",
            WeekStatus::Ended => "ended",
        })
    }
}

/// A set of tasks and the calendar-day span they cover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekWindow {
    pub tasks: Vec<DailyTask>,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
}

impl WeekWindow {
    pub fn from_tasks(tasks: Vec<DailyTask>) -> Self {
        let earliest_date = tasks.iter().map(DailyTask::scheduled_day).min();
        let latest_date = tasks.iter().map(DailyTask::scheduled_day).max();
        WeekWindow {
            tasks,
            earliest_date,
            latest_date,
        }
    }

    /// True iff the window is non-empty and its last day is before `today`.
    pub fn has_ended(&self, today: NaiveDate) -> bool {
        self.latest_date.is_some_and(|latest| latest < today)
    }

    pub fn status(&self, today: NaiveDate) -> WeekStatus {
        match self.latest_date {
            None => WeekStatus::NotStarted,
            Some(latest) if latest < today => WeekStatus::Ended,
            Some(_) => WeekStatus::Active,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed).count()
    }

    pub fn total_minutes(&self) -> u32 {
        self.tasks.iter().map(|t| t.estimated_minutes).sum()
    }
}

/// What one day's fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    Loaded(Vec<DailyTask>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub outcome: DayOutcome,
}

/// Result of loading a week: per-day outcomes plus the derived window.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekReport {
    pub today: NaiveDate,
    pub days: Vec<DayReport>,
    pub window: WeekWindow,
    pub status: WeekStatus,
}

impl WeekReport {
    pub fn failed_days(&self) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|d| matches!(d.outcome, DayOutcome::Failed(_)))
            .map(|d| d.date)
            .collect()
    }

    pub fn has_ended(&self) -> bool {
        self.window.has_ended(self.today)
    }
}

/// Result of generating a week.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOutcome {
    pub tasks: Vec<DailyTask>,
    /// Tasks mirrored into the calendar. Less than `tasks.len()` on partial sync.
    pub calendar_synced: usize,
}

/// Tasks for the seven days starting at `start`, in date then slot order.
///
/// Every task is stamped at midnight UTC of its day, so ids repeat for the
/// same (path, day) no matter what time of day the week is planned.
pub fn plan_week(path_id: &str, phase_labels: &[String], start: NaiveDate) -> Vec<DailyTask> {
    (0..WEEK_DAYS)
        .map(|offset| midnight_utc(start + Duration::days(offset)))
        .flat_map(|day| generate_tasks_for_day(path_id, day, phase_labels))
        .collect()
}

fn midnight_utc(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Drives generation, persistence and calendar sync for one store.
pub struct WeekScheduler<S, C, K> {
    store: S,
    calendar: C,
    clock: K,
}

impl<S: TaskStore, C: CalendarSync, K: Clock> WeekScheduler<S, C, K> {
    pub fn new(store: S, calendar: C, clock: K) -> Self {
        WeekScheduler {
            store,
            calendar,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Generates and persists a week anchored at the clock's today.
    ///
    /// The batch is saved in one call; if that fails nothing is considered
    /// committed and calendar sync is not attempted. Calendar failures are
    /// reported through `calendar_synced` only.
    ///
    /// Two concurrent calls for the same user are last-write-wins.
    pub fn generate_week(
        &mut self,
        path_id: &str,
        user_id: &str,
        phase_labels: &[String],
    ) -> Result<GenerateOutcome> {
        let today = self.clock.today();
        let tasks = plan_week(path_id, phase_labels, today);

        self.store.save_daily_tasks(user_id, &tasks)?;
        tracing::info!(path_id, user_id, tasks = tasks.len(), start = %today, "generated week");

        let calendar_synced = self.calendar.add_tasks_to_calendar(&tasks, &mut |count| {
            tracing::debug!(count, "calendar sync progress");
        });
        if calendar_synced < tasks.len() {
            tracing::warn!(synced = calendar_synced, total = tasks.len(), "calendar sync incomplete");
        }

        Ok(GenerateOutcome {
            tasks,
            calendar_synced,
        })
    }

    /// Loads the seven days starting at the clock's today.
    ///
    /// A failing day is recorded as [`DayOutcome::Failed`] and contributes no
    /// tasks; the other days still load.
    pub fn load_week(&self, user_id: &str) -> WeekReport {
        self.load_week_from(user_id, self.clock.today())
    }

    /// Loads the seven days starting at `start`, judged against the clock's
    /// today. Lets callers re-open an earlier week to see whether it ended.
    pub fn load_week_from(&self, user_id: &str, start: NaiveDate) -> WeekReport {
        let today = self.clock.today();
        let mut days = Vec::with_capacity(WEEK_DAYS as usize);
        let mut tasks = Vec::new();

        for offset in 0..WEEK_DAYS {
            let date = start + Duration::days(offset);
            let outcome = match self.store.get_tasks_for_date(user_id, date) {
                Ok(found) => {
                    tasks.extend(found.iter().cloned());
                    DayOutcome::Loaded(found)
                }
                Err(e) => {
                    tracing::warn!(user_id, %date, error = %e, "failed to load tasks for day");
                    DayOutcome::Failed(e.to_string())
                }
            };
            days.push(DayReport { date, outcome });
        }

        let window = WeekWindow::from_tasks(tasks);
        let status = window.status(today);
        WeekReport {
            today,
            days,
            window,
            status,
        }
    }

    /// Marks a task completed at the clock's now.
    pub fn complete_task(&mut self, user_id: &str, task_id: &str) -> Result<DailyTask> {
        self.store.complete_task(user_id, task_id, self.clock.now())
    }

    /// Flips a task's completion state.
    pub fn toggle_task(&mut self, user_id: &str, task_id: &str) -> Result<DailyTask> {
        let mut task = self
            .store
            .find_task(user_id, task_id)?
            .ok_or_else(|| Error::TaskNotFound {
                user_id: user_id.to_string(),
                task_id: task_id.to_string(),
            })?;
        task.toggle(self.clock.now());
        self.store.set_task_completion(user_id, task_id, task.completed_at)
    }
}
