use std::str::FromStr;

use anyhow::Result;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS exercises (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    muscle      TEXT NOT NULL,
    category    TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS workouts (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    date       TEXT NOT NULL,
    start_time TEXT,
    end_time   TEXT,
    notes      TEXT,
    mood       TEXT,
    final_mood TEXT
);

CREATE TABLE IF NOT EXISTS workout_exercises (
    id          TEXT PRIMARY KEY,
    workout_id  TEXT NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    exercise_id TEXT NOT NULL REFERENCES exercises(id),
    position    INTEGER NOT NULL,
    rest_time   INTEGER,
    notes       TEXT
);

CREATE TABLE IF NOT EXISTS workout_sets (
    id                  TEXT PRIMARY KEY,
    workout_exercise_id TEXT NOT NULL REFERENCES workout_exercises(id) ON DELETE CASCADE,
    position            INTEGER NOT NULL,
    weight              REAL,
    reps                INTEGER,
    duration            INTEGER,
    distance            REAL,
    calories            INTEGER,
    notes               TEXT
);

CREATE TABLE IF NOT EXISTS gtg_sessions (
    id               TEXT PRIMARY KEY,
    exercise_id      TEXT NOT NULL REFERENCES exercises(id),
    date             TEXT NOT NULL,
    start_time       TEXT,
    interval_minutes INTEGER NOT NULL,
    target_sets      INTEGER NOT NULL,
    sets_completed   INTEGER NOT NULL DEFAULT 0,
    reps_per_set     INTEGER,
    time_per_set     INTEGER,
    weight           REAL,
    is_active        INTEGER NOT NULL DEFAULT 0,
    notes            TEXT
);

CREATE TABLE IF NOT EXISTS gtg_sets (
    id         TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES gtg_sessions(id) ON DELETE CASCADE,
    timestamp  TEXT NOT NULL,
    reps       INTEGER,
    time       INTEGER,
    weight     REAL,
    notes      TEXT
);
"#;

pub async fn open(path: &str) -> Result<DB> {
    let opts = SqliteConnectOptions::from_str(path)?
        .create_if_missing(true)
        .foreign_keys(true);

    Ok(SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?)
}

/// Create any missing tables. Safe to run on every startup.
pub async fn init(pool: &DB) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
