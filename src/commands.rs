use std::io::{self, Write};
use std::path::Path;

use chrono::{NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde_json::Value;

use crate::calendar::{CalendarSync, IcsCalendar, NoCalendar};
use crate::clock::{Clock, FixedClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{DailyTask, FromRecord, LearningPath, UserProfile, PRIORITY_HIGH, PRIORITY_LOW};
use crate::normalize::Record;
use crate::scheduler::{DayOutcome, GenerateOutcome, WeekReport, WeekScheduler, WeekStatus};
use crate::store::{self, JsonTaskStore, TaskStore};

/// Pins "now" for one invocation: midnight of `date` when given, else the wall clock.
pub fn resolve_clock(date: Option<&str>) -> Result<FixedClock> {
    match date {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(FixedClock::at_day)
            .map_err(|_| Error::InvalidDate(raw.to_string())),
        None => Ok(FixedClock(Utc::now())),
    }
}

fn scheduler<C: CalendarSync>(
    config: &Config,
    calendar: C,
    clock: FixedClock,
) -> WeekScheduler<JsonTaskStore, C, FixedClock> {
    WeekScheduler::new(JsonTaskStore::with_clock(&config.db_path, clock), calendar, clock)
}

/// Generates a week for `path_id` and persists it.
///
/// Without a path id, the user's profile must name an active path. When no
/// phases are given, labels come from the stored learning path with that id,
/// if any.
pub fn cmd_generate(
    config: &Config,
    user: Option<String>,
    path_id: Option<String>,
    phases: Vec<String>,
    date: Option<String>,
    sync_calendar: bool,
    silent: bool,
) -> Result<GenerateOutcome> {
    let clock = resolve_clock(date.as_deref())?;
    let user_id = config.user_or_default(user);
    let path_id = match path_id {
        Some(id) => id,
        None => store::load_profile(&config.profiles_path(), &user_id, &clock)
            .and_then(|p| p.active_path_id)
            .ok_or_else(|| Error::NoActivePath(user_id.clone()))?,
    };
    let phases = if phases.is_empty() {
        store::find_path(&config.paths_path(), &path_id, &clock)
            .map(|p| p.phase_labels())
            .unwrap_or_default()
    } else {
        phases
    };

    let outcome = if sync_calendar {
        let calendar = IcsCalendar::new(&config.calendar_path, clock.now());
        scheduler(config, calendar, clock).generate_week(&path_id, &user_id, &phases)?
    } else {
        scheduler(config, NoCalendar, clock).generate_week(&path_id, &user_id, &phases)?
    };

    if !silent {
        println!(
            "Generated {} tasks for {} starting {}.",
            outcome.tasks.len(),
            user_id,
            clock.today()
        );
        if sync_calendar {
            println!(
                "Added {} of {} tasks to {}.",
                outcome.calendar_synced,
                outcome.tasks.len(),
                config.calendar_path.display()
            );
        }
    }
    Ok(outcome)
}

/// Loads and prints the week starting at `from` (default: today).
pub fn cmd_week(
    config: &Config,
    user: Option<String>,
    from: Option<String>,
    date: Option<String>,
    silent: bool,
) -> Result<WeekReport> {
    let clock = resolve_clock(date.as_deref())?;
    let user_id = config.user_or_default(user);
    let scheduler = scheduler(config, NoCalendar, clock);
    let report = match from {
        Some(raw) => {
            let start = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| Error::InvalidDate(raw.clone()))?;
            scheduler.load_week_from(&user_id, start)
        }
        None => scheduler.load_week(&user_id),
    };

    if !silent {
        print_week(&report);
    }
    Ok(report)
}

/// Lists one day's tasks.
pub fn cmd_day(config: &Config, user: Option<String>, date: Option<String>, silent: bool) -> Result<Vec<DailyTask>> {
    let clock = resolve_clock(date.as_deref())?;
    let user_id = config.user_or_default(user);
    let store = JsonTaskStore::with_clock(&config.db_path, clock);
    let tasks = store.get_tasks_for_date(&user_id, clock.today())?;
    if !silent {
        if tasks.is_empty() {
            println!("No tasks for {}.", clock.today());
        } else {
            println!("{}", task_table(&tasks));
        }
    }
    Ok(tasks)
}

/// Marks a task as complete.
pub fn cmd_complete(config: &Config, user: Option<String>, task_id: String, silent: bool) -> Result<DailyTask> {
    let clock = resolve_clock(None)?;
    let user_id = config.user_or_default(user);
    let task = scheduler(config, NoCalendar, clock).complete_task(&user_id, &task_id)?;
    if !silent {
        println!("Task {} marked as complete.", task.id);
    }
    Ok(task)
}

/// Flips a task between complete and pending.
pub fn cmd_toggle(config: &Config, user: Option<String>, task_id: String, silent: bool) -> Result<DailyTask> {
    let clock = resolve_clock(None)?;
    let user_id = config.user_or_default(user);
    let task = scheduler(config, NoCalendar, clock).toggle_task(&user_id, &task_id)?;
    if !silent {
        let state = if task.is_completed { "complete" } else { "pending" };
        println!("Task {} is now {}.", task.id, state);
    }
    Ok(task)
}

/// Imports a learning path record (e.g. a saved generator response).
///
/// The record is normalized first, so only the decoded shape is stored.
/// A record without an id gets one from `id_override` or its title.
pub fn cmd_path_import(
    config: &Config,
    file: &Path,
    id_override: Option<String>,
    silent: bool,
) -> Result<LearningPath> {
    let clock = resolve_clock(None)?;
    let record = read_record(file)?;
    let mut path = LearningPath::from_record(&record, &clock);
    if let Some(id) = id_override {
        path.id = id;
    }
    if path.id.is_empty() {
        path.id = slug(&path.title);
    }
    if path.id.is_empty() {
        return Err(Error::Storage("learning path has no id or title".to_string()));
    }
    store::save_path(&config.paths_path(), &path)?;
    if !silent {
        println!(
            "Imported path '{}' ({} phases, labels: {}).",
            path.id,
            path.phases.len(),
            path.phase_labels().join(", ")
        );
    }
    Ok(path)
}

/// Imports a user profile record. The record must carry a `uid`.
pub fn cmd_profile_import(config: &Config, file: &Path, silent: bool) -> Result<UserProfile> {
    let clock = resolve_clock(None)?;
    let record = read_record(file)?;
    let profile = UserProfile::from_record(&record, &clock);
    if profile.uid.is_empty() {
        return Err(Error::Storage(format!("{} has no uid", file.display())));
    }
    store::save_profile(&config.profiles_path(), &profile)?;
    if !silent {
        println!(
            "Imported profile '{}' (active path: {}).",
            profile.uid,
            profile.active_path_id.as_deref().unwrap_or("none")
        );
    }
    Ok(profile)
}

/// Shows a stored profile.
pub fn cmd_profile_show(config: &Config, user: Option<String>, silent: bool) -> Result<Option<UserProfile>> {
    let clock = resolve_clock(None)?;
    let user_id = config.user_or_default(user);
    let profile = store::load_profile(&config.profiles_path(), &user_id, &clock);
    if !silent {
        match &profile {
            None => println!("No profile for {}.", user_id),
            Some(p) => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.add_row(vec!["User", p.uid.as_str()]);
                table.add_row(vec!["Name", p.name.as_str()]);
                table.add_row(vec!["Career goal", p.career_goal.as_str()]);
                table.add_row(vec!["Education", p.education_level.as_str()]);
                table.add_row(vec!["Time commitment", p.time_commitment.as_str()]);
                table.add_row(vec!["Skills", p.skills.join(", ").as_str()]);
                table.add_row(vec!["Interests", p.interests.join(", ").as_str()]);
                table.add_row(vec!["Active path", p.active_path_id.as_deref().unwrap_or("-")]);
                println!("{table}");
            }
        }
    }
    Ok(profile)
}

/// Lists imported learning paths.
pub fn cmd_path_list(config: &Config) -> Result<()> {
    let clock = resolve_clock(None)?;
    let paths = store::load_paths(&config.paths_path(), &clock);
    if paths.is_empty() {
        println!("No learning paths found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Title", "Difficulty", "Phases", "Courses", "Duration"]);
    for p in paths {
        table.add_row(vec![
            p.id.clone(),
            p.title.clone(),
            p.difficulty_level.clone(),
            p.phase_labels().join(", "),
            course_summary(&p),
            p.total_duration.clone(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Deletes the task database, imported paths, profiles and calendar file.
pub fn cmd_reset(config: &Config, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks and paths? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    store::delete_database(&[
        config.db_path.clone(),
        config.paths_path(),
        config.profiles_path(),
        config.calendar_path.clone(),
    ])?;
    println!("Database reset successfully.");
    Ok(())
}

/// Course count across the path and its phases, with how many are free.
fn course_summary(path: &LearningPath) -> String {
    let total = path.all_courses().count();
    let free = path.all_courses().filter(|c| c.is_free()).count();
    if free == 0 {
        total.to_string()
    } else {
        format!("{total} ({free} free)")
    }
}

fn read_record(file: &Path) -> Result<Record> {
    let text = std::fs::read_to_string(file)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(record) => Ok(record),
        _ => Err(Error::Storage(format!("{} does not contain a JSON object", file.display()))),
    }
}

fn slug(title: &str) -> String {
    let mut out = String::new();
    for ch in title.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

fn task_table(tasks: &[DailyTask]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Day").add_attribute(Attribute::Bold),
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Task").add_attribute(Attribute::Bold),
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Min").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let priority_color = match t.priority {
            PRIORITY_HIGH => Color::Red,
            PRIORITY_LOW => Color::Green,
            _ => Color::Yellow,
        };
        let (status, status_color) = if t.is_completed {
            ("Done", Color::Green)
        } else {
            ("Pending", Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(t.scheduled_day().format("%a %Y-%m-%d")),
            Cell::new(&t.id),
            Cell::new(&t.title),
            Cell::new(t.task_type),
            Cell::new(t.estimated_minutes),
            Cell::new(t.priority_label()).fg(priority_color),
            Cell::new(status).fg(status_color),
        ]);
    }
    table
}

fn print_week(report: &WeekReport) {
    match report.status {
        WeekStatus::NotStarted => {
            println!("No tasks yet for the week of {}. Run `studyweek generate` to start one.", report.today);
        }
        WeekStatus::Ended => {
            println!("{}", task_table(&report.window.tasks));
            println!("This week has ended. Run `studyweek generate` to start a new week.");
        }
        WeekStatus::Active => {
            println!("{}", task_table(&report.window.tasks));
            println!(
                "Week {} to {}: {}/{} tasks done, {} min planned.",
                report.window.earliest_date.map(|d| d.to_string()).unwrap_or_default(),
                report.window.latest_date.map(|d| d.to_string()).unwrap_or_default(),
                report.window.completed_count(),
                report.window.tasks.len(),
                report.window.total_minutes()
            );
        }
    }
    for day in &report.days {
        if let DayOutcome::Failed(reason) = &day.outcome {
            eprintln!("Could not load tasks for {}: {}", day.date, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_title() {
        assert_eq!(slug("Backend Engineer: Rust & Go!"), "backend-engineer-rust-go");
        assert_eq!(slug("  "), "");
    }

    #[test]
    fn course_summary_counts_free_courses() {
        let raw = serde_json::json!({
            "courses": [{"title": "Intro", "cost": "Free"}, {"title": "Deep dive", "cost": "$49"}],
            "phases": [{"title": "Basics", "learningResources": [{"title": "Docs", "cost": " free "}]}]
        });
        let clock = FixedClock::at_day(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let path = LearningPath::from_value(&raw, &clock).unwrap();
        assert_eq!(course_summary(&path), "3 (2 free)");

        let bare = LearningPath::from_value(&serde_json::json!({"title": "x"}), &clock).unwrap();
        assert_eq!(course_summary(&bare), "0");
    }

    #[test]
    fn resolve_clock_parses_dates() {
        let clock = resolve_clock(Some("2025-03-04")).unwrap();
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert!(matches!(resolve_clock(Some("03/04/2025")), Err(Error::InvalidDate(_))));
    }
}
