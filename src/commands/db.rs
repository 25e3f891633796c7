use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::cli::DbCmd;

/* ────────────────────────── public entry point ───────────────────────── */

pub async fn handle(cmd: DbCmd, pool: &SqlitePool) -> Result<()> {
    match cmd {
        DbCmd::Export { file } => export(pool, file.unwrap_or_else(|| "dump.toml".to_string())).await,
        DbCmd::Import { file } => import(pool, &file).await,
    }
}

/* ──────────────────────────── dump format ────────────────────────────── */

// Row-for-row mirror of the schema, so a dump round-trips losslessly.

#[derive(Serialize, Deserialize, sqlx::FromRow)]
struct ExerciseRow {
    id: String,
    name: String,
    muscle: String,
    category: String,
    description: Option<String>,
    created_at: String,
}

#[derive(Serialize, Deserialize, sqlx::FromRow)]
struct WorkoutRow {
    id: String,
    name: String,
    date: String,
    start_time: Option<String>,
    end_time: Option<String>,
    notes: Option<String>,
    mood: Option<String>,
    final_mood: Option<String>,
}

#[derive(Serialize, Deserialize, sqlx::FromRow)]
struct WorkoutExerciseRow {
    id: String,
    workout_id: String,
    exercise_id: String,
    position: i64,
    rest_time: Option<i64>,
    notes: Option<String>,
}

#[derive(Serialize, Deserialize, sqlx::FromRow)]
struct WorkoutSetRow {
    id: String,
    workout_exercise_id: String,
    position: i64,
    weight: Option<f64>,
    reps: Option<i64>,
    duration: Option<i64>,
    distance: Option<f64>,
    calories: Option<i64>,
    notes: Option<String>,
}

#[derive(Serialize, Deserialize, sqlx::FromRow)]
struct GtgSessionRow {
    id: String,
    exercise_id: String,
    date: String,
    start_time: Option<String>,
    interval_minutes: i64,
    target_sets: i64,
    sets_completed: i64,
    reps_per_set: Option<i64>,
    time_per_set: Option<i64>,
    weight: Option<f64>,
    is_active: i64,
    notes: Option<String>,
}

#[derive(Serialize, Deserialize, sqlx::FromRow)]
struct GtgSetRow {
    id: String,
    session_id: String,
    timestamp: String,
    reps: Option<i64>,
    time: Option<i64>,
    weight: Option<f64>,
    notes: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
struct Dump {
    #[serde(default)]
    exercise: Vec<ExerciseRow>,
    #[serde(default)]
    workout: Vec<WorkoutRow>,
    #[serde(default)]
    workout_exercise: Vec<WorkoutExerciseRow>,
    #[serde(default)]
    workout_set: Vec<WorkoutSetRow>,
    #[serde(default)]
    gtg_session: Vec<GtgSessionRow>,
    #[serde(default)]
    gtg_set: Vec<GtgSetRow>,
}

/* ─────────────────────────────── export ──────────────────────────────── */

async fn export(pool: &SqlitePool, file: String) -> Result<()> {
    let dump = Dump {
        exercise: sqlx::query_as(
            "SELECT id, name, muscle, category, description, created_at FROM exercises ORDER BY name",
        )
        .fetch_all(pool)
        .await?,
        workout: sqlx::query_as(
            "SELECT id, name, date, start_time, end_time, notes, mood, final_mood
             FROM workouts ORDER BY date, id",
        )
        .fetch_all(pool)
        .await?,
        workout_exercise: sqlx::query_as(
            "SELECT id, workout_id, exercise_id, position, rest_time, notes
             FROM workout_exercises ORDER BY workout_id, position",
        )
        .fetch_all(pool)
        .await?,
        workout_set: sqlx::query_as(
            "SELECT id, workout_exercise_id, position, weight, reps, duration, distance, calories, notes
             FROM workout_sets ORDER BY workout_exercise_id, position",
        )
        .fetch_all(pool)
        .await?,
        gtg_session: sqlx::query_as(
            "SELECT id, exercise_id, date, start_time, interval_minutes, target_sets,
                    sets_completed, reps_per_set, time_per_set, weight, is_active, notes
             FROM gtg_sessions ORDER BY date, id",
        )
        .fetch_all(pool)
        .await?,
        gtg_set: sqlx::query_as(
            "SELECT id, session_id, timestamp, reps, time, weight, notes
             FROM gtg_sets ORDER BY timestamp, id",
        )
        .fetch_all(pool)
        .await?,
    };

    let total = dump.exercise.len()
        + dump.workout.len()
        + dump.workout_exercise.len()
        + dump.workout_set.len()
        + dump.gtg_session.len()
        + dump.gtg_set.len();

    let content = toml::to_string_pretty(&dump).context("Failed to serialize dump")?;
    tokio::fs::write(&file, content)
        .await
        .with_context(|| format!("Failed to write `{}`", file))?;

    println!(
        "{} {} rows exported to {}",
        "ok:".green().bold(),
        total,
        file.bold()
    );
    Ok(())
}

/* ─────────────────────────────── import ──────────────────────────────── */

async fn import(pool: &SqlitePool, file: &str) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Could not read file: `{}`", file))?;

    let dump: Dump = toml::from_str(&content)
        .with_context(|| format!("Invalid dump file: `{}`", file))?;

    // Insert in foreign-key order, ignoring rows that already exist.
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for r in &dump.exercise {
        inserted += sqlx::query(
            "INSERT OR IGNORE INTO exercises (id, name, muscle, category, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&r.id)
        .bind(&r.name)
        .bind(&r.muscle)
        .bind(&r.category)
        .bind(&r.description)
        .bind(&r.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for r in &dump.workout {
        inserted += sqlx::query(
            "INSERT OR IGNORE INTO workouts (id, name, date, start_time, end_time, notes, mood, final_mood)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&r.id)
        .bind(&r.name)
        .bind(&r.date)
        .bind(&r.start_time)
        .bind(&r.end_time)
        .bind(&r.notes)
        .bind(&r.mood)
        .bind(&r.final_mood)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for r in &dump.workout_exercise {
        inserted += sqlx::query(
            "INSERT OR IGNORE INTO workout_exercises (id, workout_id, exercise_id, position, rest_time, notes)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&r.id)
        .bind(&r.workout_id)
        .bind(&r.exercise_id)
        .bind(r.position)
        .bind(r.rest_time)
        .bind(&r.notes)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for r in &dump.workout_set {
        inserted += sqlx::query(
            "INSERT OR IGNORE INTO workout_sets
               (id, workout_exercise_id, position, weight, reps, duration, distance, calories, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&r.id)
        .bind(&r.workout_exercise_id)
        .bind(r.position)
        .bind(r.weight)
        .bind(r.reps)
        .bind(r.duration)
        .bind(r.distance)
        .bind(r.calories)
        .bind(&r.notes)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for r in &dump.gtg_session {
        inserted += sqlx::query(
            "INSERT OR IGNORE INTO gtg_sessions
               (id, exercise_id, date, start_time, interval_minutes, target_sets,
                sets_completed, reps_per_set, time_per_set, weight, is_active, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&r.id)
        .bind(&r.exercise_id)
        .bind(&r.date)
        .bind(&r.start_time)
        .bind(r.interval_minutes)
        .bind(r.target_sets)
        .bind(r.sets_completed)
        .bind(r.reps_per_set)
        .bind(r.time_per_set)
        .bind(r.weight)
        .bind(r.is_active)
        .bind(&r.notes)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for r in &dump.gtg_set {
        inserted += sqlx::query(
            "INSERT OR IGNORE INTO gtg_sets (id, session_id, timestamp, reps, time, weight, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&r.id)
        .bind(&r.session_id)
        .bind(&r.timestamp)
        .bind(r.reps)
        .bind(r.time)
        .bind(r.weight)
        .bind(&r.notes)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;

    println!("{} {} rows imported from {}", "ok:".green().bold(), inserted, file.bold());
    Ok(())
}
