use clap::{Parser, Subcommand};

use crate::types::Mood;

#[derive(Parser)]
#[command(name = "ironlog", version, about = "CLI workout log")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Workout logging
    #[command(subcommand, visible_alias = "w")]
    Workout(WorkoutCmd),

    /// Exercise management
    #[command(subcommand, visible_alias = "ex")]
    Exercise(ExerciseCmd),

    /// Grease-the-groove interval sessions
    #[command(subcommand)]
    Gtg(GtgCmd),

    /// Summarize the log: volume, distribution, rest times, progression
    Stats {
        /// Window length in days (defaults to config `window-days`, else 30)
        #[arg(short, long)]
        days: Option<u32>,

        /// Show ASCII graphs alongside the summary
        #[arg(short, long)]
        graph: bool,
    },

    /// Show logged workouts in a calendar view
    #[command(visible_alias = "cal")]
    Calendar {
        /// Year to show (defaults to current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to show (1-12, defaults to current month)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// Db operations
    #[command(subcommand)]
    Db(DbCmd),

    /// View or edit ironlog config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum WorkoutCmd {
    /// Start a workout for today
    #[command(visible_alias = "s")]
    Start {
        /// Workout name (defaults to "Workout")
        #[arg(short, long)]
        name: Option<String>,

        /// How you feel going in
        #[arg(long)]
        mood: Option<Mood>,
    },

    /// Add an exercise to the active workout
    #[command(visible_alias = "a")]
    AddEx {
        /// Exercise index or name
        exercise: String,

        /// Rest time between sets, in seconds
        #[arg(short, long)]
        rest: Option<u32>,
    },

    /// Log a set on an exercise of the active workout; omitted metrics stay unrecorded
    #[command(override_usage = "workout set <EX_IDX> [--weight KG] [--reps N] [--duration SECS] [--distance KM] [--calories KCAL]")]
    Set {
        /// 1-based index of the exercise (same order shown in `workout show`)
        #[arg(value_name = "EX_IDX")]
        exercise: usize,

        /// Weight in kg
        #[arg(short, long)]
        weight: Option<f64>,

        /// Number of reps
        #[arg(short, long)]
        reps: Option<u32>,

        /// Duration in seconds
        #[arg(short, long)]
        duration: Option<u32>,

        /// Distance in km
        #[arg(long)]
        distance: Option<f64>,

        /// Calories burned
        #[arg(long)]
        calories: Option<u32>,

        /// Free-form note on the set
        #[arg(long)]
        note: Option<String>,
    },

    #[command(visible_alias = "n")]
    #[command(override_usage = "workout note <EX_IDX> <NOTE_STRING>")]
    Note {
        /// 1-based index of the exercise (same order shown in `workout show`)
        #[arg(value_name = "EX_IDX")]
        exercise: usize,

        /// Free-form text
        #[arg(value_name = "NOTE_STRING")]
        note: String,
    },

    /// Show the active workout
    #[command(visible_alias = "i")]
    Show,

    /// Finish the active workout
    End {
        /// How you feel coming out
        #[arg(long)]
        mood: Option<Mood>,
    },

    /// Discard the active workout
    #[command(visible_alias = "c")]
    Cancel,

    /// List recent workouts
    #[command(visible_alias = "l")]
    List {
        /// How many workouts to show
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// Show details of a completed workout from a specific date
    Log {
        /// Date in DD-MM-YYYY format
        #[arg(short, long)]
        date: String,
    },

    /// Delete a workout by id
    #[command(visible_alias = "d")]
    Delete {
        /// Workout id (from `workout list`)
        workout: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExerciseCmd {
    /// Add a new exercise
    #[command(visible_alias = "a")]
    Add {
        /// Exercise name
        name: String,

        /// Primary muscle group
        #[arg(short, long)]
        muscle: String,

        /// How sets are recorded for this exercise
        #[arg(short, long, default_value = "weight-reps")]
        category: crate::types::Category,

        /// Exercise description
        #[arg(short, long)]
        desc: Option<String>,
    },

    /// Import exercises from a TOML file
    #[command(visible_alias = "i")]
    Import {
        /// Path to TOML file
        file: String,
    },

    /// List all exercises
    #[command(visible_alias = "l")]
    List {
        /// Filter by muscle group
        #[arg(short, long)]
        muscle: Option<String>,
    },

    /// Delete an exercise
    #[command(visible_alias = "d")]
    Delete {
        /// Exercise index or name
        exercise: String,
    },
}

#[derive(Subcommand)]
pub enum GtgCmd {
    /// Start a grease-the-groove session for today
    #[command(visible_alias = "s")]
    Start {
        /// Exercise index or name
        exercise: String,

        /// Minutes between sets
        #[arg(short, long, default_value = "60")]
        interval: u32,

        /// Target number of sets for the day
        #[arg(short, long, default_value = "10")]
        target: u32,

        /// Planned reps per set
        #[arg(long)]
        reps: Option<u32>,

        /// Planned seconds per set
        #[arg(long)]
        time: Option<u32>,

        /// Planned weight per set, in kg
        #[arg(long)]
        weight: Option<f64>,
    },

    /// Log one completed set on the active session
    #[command(visible_alias = "l")]
    Log {
        /// Reps done (defaults to the session's planned reps)
        #[arg(long)]
        reps: Option<u32>,

        /// Seconds held (defaults to the session's planned time)
        #[arg(long)]
        time: Option<u32>,

        /// Weight used, in kg (defaults to the session's planned weight)
        #[arg(long)]
        weight: Option<f64>,

        /// Free-form note on the set
        #[arg(long)]
        note: Option<String>,
    },

    /// Close the active session
    Stop,

    /// List sessions, most recent first
    List {
        /// How many sessions to show
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// Delete a session and its logged sets
    #[command(visible_alias = "d")]
    Delete {
        /// Session id (from `gtg list`)
        session: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}

#[derive(Subcommand)]
pub enum DbCmd {
    /// Export database to a TOML file
    Export {
        /// Output file path (defaults to dump.toml)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Import database from a TOML file
    Import {
        /// Input TOML file path
        file: String,
    },
}
