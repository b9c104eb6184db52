//! Command-line surface of the `registry` binary.
//!
//! Global options fall back to `REGISTRY_*` environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "registry",
    about = "Student-programme registry with cascade-safe storage",
    version
)]
pub struct Cli {
    /// SQLite database file
    #[arg(
        long,
        global = true,
        env = "REGISTRY_DB",
        default_value = "registry.sqlite3"
    )]
    pub db: PathBuf,

    /// Use a throwaway in-memory store instead of `--db`
    #[arg(long, global = true)]
    pub memory: bool,

    /// Log level: trace, debug, info, warn or error (default depends on build)
    #[arg(long, global = true, env = "REGISTRY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "REGISTRY_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Manage programmes
    Programme {
        #[command(subcommand)]
        command: ProgrammeCommands,
    },

    /// Manage students
    Student {
        #[command(subcommand)]
        command: StudentCommands,
    },

    /// Run a create/enrol/cascade walkthrough against the selected store
    Demo,

    /// Print the core library version
    Version,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ProgrammeCommands {
    /// Create a programme
    Add {
        /// Programme name (at most 100 characters)
        name: String,
    },

    /// List all programmes
    List,

    /// Show one programme and its enrolment count
    Show {
        /// Programme id
        id: String,
    },

    /// Find programmes by exact name
    Find {
        /// Programme name
        name: String,
    },

    /// Rename a programme
    Rename {
        /// Programme id
        id: String,

        /// New name
        name: String,
    },

    /// Delete a programme and every student enrolled in it
    Delete {
        /// Programme id
        id: String,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum StudentCommands {
    /// Enrol a student in an existing programme
    Add {
        /// Institutional student id, e.g. S001 (at most 20 characters)
        student_id: String,

        /// Student name (at most 100 characters)
        name: String,

        /// Programme id
        programme_id: String,
    },

    /// Show one student by row id
    Show {
        /// Student row id
        id: String,
    },

    /// Find one student by institutional id
    Lookup {
        /// Institutional student id
        student_id: String,
    },

    /// List students enrolled in a programme
    List {
        /// Programme id
        programme_id: String,
    },

    /// Rename and/or transfer a student
    Update {
        /// Student row id
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Target programme id
        #[arg(long)]
        programme: Option<String>,
    },

    /// Delete a student
    Delete {
        /// Student row id
        id: String,
    },
}
