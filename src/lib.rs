//! # studyweek
//!
//! Weekly study planning for learning paths: a rule-based daily task
//! generator, a rolling seven-day scheduler, and a tolerant record decoder
//! for the loosely-typed documents those tasks, paths and profiles are
//! stored as.
//!
//! ```no_run
//! use studyweek::calendar::NoCalendar;
//! use studyweek::clock::SystemClock;
//! use studyweek::scheduler::WeekScheduler;
//! use studyweek::store::MemoryTaskStore;
//!
//! let mut scheduler = WeekScheduler::new(MemoryTaskStore::new(), NoCalendar, SystemClock);
//! let outcome = scheduler
//!     .generate_week("rust-path", "u1", &["Foundations".to_string()])
//!     .unwrap();
//! assert_eq!(outcome.tasks.len(), 21);
//! let report = scheduler.load_week("u1");
//! println!("week is {}", report.status);
//! ```

pub mod calendar;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod scheduler;
pub mod store;

pub use error::{Error, Result};
