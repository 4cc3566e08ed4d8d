//! # studyweek
//!
//! Plan a week of study tasks for a learning path from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! # Import a learning path (e.g. a saved generator response)
//! studyweek path import backend.json --id backend
//!
//! # Generate seven days of tasks starting today, phases taken from the path
//! studyweek generate --path backend
//!
//! # Or name the phases explicitly and anchor on a date
//! studyweek generate --path backend --phase Foundations --date 2025-03-03
//!
//! # Or let the profile's active path pick it
//! studyweek profile import me.json
//! studyweek generate
//!
//! # Show the week and whether it has ended
//! studyweek week
//!
//! # Work through tasks
//! studyweek complete backend_1740960000000_0
//! studyweek toggle backend_1740960000000_0
//! ```
//!
//! ## Data Storage
//!
//! Tasks are saved in your local data directory:
//! *   Linux: `~/.local/share/studyweek/tasks.json`
//! *   macOS: `~/Library/Application Support/studyweek/tasks.json`
//! *   Windows: `%APPDATA%\studyweek\tasks.json`
//!
//! Override with `STUDYWEEK_DB`. Imported paths and the calendar export
//! (`calendar.ics`, override with `STUDYWEEK_CALENDAR`) live beside it.
//! `STUDYWEEK_USER` sets the default user id.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use studyweek::commands::*;
use studyweek::config::Config;
use studyweek::logging::init_logging;

#[derive(Parser)]
#[command(name = "studyweek")]
#[command(about = "Weekly study planner for learning paths", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and save seven days of tasks
    Generate {
        /// Learning path id (default: the profile's active path)
        #[arg(short, long)]
        path: Option<String>,
        /// User id (defaults to STUDYWEEK_USER or "local")
        #[arg(short, long)]
        user: Option<String>,
        /// Phase label; repeat for several. Defaults to the stored path's phases
        #[arg(long = "phase")]
        phases: Vec<String>,
        /// First day of the week in YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// Skip writing the calendar file
        #[arg(long)]
        no_calendar: bool,
    },
    /// Show the seven-day window and its status
    Week {
        #[arg(short, long)]
        user: Option<String>,
        /// First day of the window in YYYY-MM-DD (default: today)
        #[arg(short, long)]
        from: Option<String>,
        /// Treat this YYYY-MM-DD as today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// List one day's tasks
    Day {
        #[arg(short, long)]
        user: Option<String>,
        /// Day in YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Mark a task as complete
    Complete {
        id: String,
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Toggle a task between complete and pending
    Toggle {
        id: String,
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Manage learning paths
    Path {
        #[command(subcommand)]
        command: PathCommands,
    },
    /// Manage user profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Reset the database (delete all tasks, paths and the calendar file)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

#[derive(Subcommand)]
enum PathCommands {
    /// Import a learning path JSON record
    Import {
        file: PathBuf,
        /// Id to store the path under
        #[arg(long)]
        id: Option<String>,
    },
    /// List imported paths
    List,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Import a user profile JSON record
    Import { file: PathBuf },
    /// Show a stored profile
    Show {
        #[arg(short, long)]
        user: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::from_env();
    tracing::debug!(db = ?config.db_path, "using task database");

    let result = match cli.command {
        Commands::Generate { path, user, phases, date, no_calendar } => {
            cmd_generate(&config, user, path, phases, date, !no_calendar, false).map(|_| ())
        }
        Commands::Week { user, from, date } => cmd_week(&config, user, from, date, false).map(|_| ()),
        Commands::Day { user, date } => cmd_day(&config, user, date, false).map(|_| ()),
        Commands::Complete { id, user } => cmd_complete(&config, user, id, false).map(|_| ()),
        Commands::Toggle { id, user } => cmd_toggle(&config, user, id, false).map(|_| ()),
        Commands::Path { command } => match command {
            PathCommands::Import { file, id } => cmd_path_import(&config, &file, id, false).map(|_| ()),
            PathCommands::List => cmd_path_list(&config),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Import { file } => cmd_profile_import(&config, &file, false).map(|_| ()),
            ProfileCommands::Show { user } => cmd_profile_show(&config, user, false).map(|_| ()),
        },
        Commands::Reset { force } => cmd_reset(&config, force),
        Commands::Completions { shell } => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return ExitCode::FAILURE;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "studyweek", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
