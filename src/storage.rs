use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::SqlitePool;

use crate::models::{ExerciseRef, GtgSession, GtgSet, SetEntry, Workout, WorkoutExercise};
use crate::types::{Category, Mood};

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const TIME_FMT: &str = "%H:%M";
pub const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).with_context(|| format!("Invalid stored date: {s}"))
}

fn parse_time(s: Option<String>) -> Option<NaiveTime> {
    s.and_then(|s| NaiveTime::parse_from_str(&s, TIME_FMT).ok())
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT)
        .with_context(|| format!("Invalid stored timestamp: {s}"))
}

/// Resolve a user-supplied exercise argument (1-based list index or exact
/// name) to `(id, name)`. `None` if nothing matches.
pub async fn resolve_exercise(pool: &SqlitePool, arg: &str) -> Result<Option<(String, String)>> {
    let row: Option<(String, String)> = if let Ok(idx) = arg.parse::<i64>() {
        sqlx::query_as(
            r#"
            SELECT id, name
            FROM (
              SELECT id, name, ROW_NUMBER() OVER (ORDER BY name) AS rn
              FROM exercises
            ) t
            WHERE t.rn = ?
            "#,
        )
        .bind(idx)
        .fetch_optional(pool)
        .await?
    } else {
        sqlx::query_as("SELECT id, name FROM exercises WHERE name = ?")
            .bind(arg)
            .fetch_optional(pool)
            .await?
    };

    Ok(row)
}

/// Id of the workout still missing an end time, if any.
pub async fn active_workout(pool: &SqlitePool) -> Result<Option<String>> {
    Ok(
        sqlx::query_scalar("SELECT id FROM workouts WHERE end_time IS NULL ORDER BY date DESC, id LIMIT 1")
            .fetch_optional(pool)
            .await?,
    )
}

/// The GTG session currently flagged active, as `(id, exercise name)`.
pub async fn active_gtg_session(pool: &SqlitePool) -> Result<Option<(String, String)>> {
    Ok(sqlx::query_as(
        r#"
        SELECT g.id, e.name
        FROM gtg_sessions g
        JOIN exercises e ON e.id = g.exercise_id
        WHERE g.is_active = 1
        ORDER BY g.date DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?)
}

/// Load the whole workout log as nested in-memory records, ready for the
/// statistics engine. Three queries, assembled here; the aggregator itself
/// never sees the database.
pub async fn load_workouts(pool: &SqlitePool) -> Result<Vec<Workout>> {
    type SetRow = (
        String,
        String,
        Option<f64>,
        Option<i64>,
        Option<i64>,
        Option<f64>,
        Option<i64>,
        Option<String>,
    );
    let set_rows: Vec<SetRow> = sqlx::query_as(
        r#"
        SELECT id, workout_exercise_id, weight, reps, duration, distance, calories, notes
        FROM workout_sets
        ORDER BY workout_exercise_id, position
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut sets_by_entry: HashMap<String, Vec<SetEntry>> = HashMap::new();
    for (_, entry_id, weight, reps, duration, distance, calories, notes) in set_rows {
        sets_by_entry.entry(entry_id).or_default().push(SetEntry {
            weight,
            reps: reps.map(|v| v as u32),
            duration: duration.map(|v| v as u32),
            distance,
            calories: calories.map(|v| v as u32),
            notes,
        });
    }

    type EntryRow = (
        String,
        String,
        Option<i64>,
        Option<String>,
        String,
        String,
        Category,
    );
    let entry_rows: Vec<EntryRow> = sqlx::query_as(
        r#"
        SELECT we.id, we.workout_id, we.rest_time, we.notes, e.name, e.muscle, e.category
        FROM workout_exercises we
        JOIN exercises e ON e.id = we.exercise_id
        ORDER BY we.workout_id, we.position
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut entries_by_workout: HashMap<String, Vec<WorkoutExercise>> = HashMap::new();
    for (id, workout_id, rest_time, notes, name, muscle, category) in entry_rows {
        let sets = sets_by_entry.remove(&id).unwrap_or_default();
        entries_by_workout
            .entry(workout_id)
            .or_default()
            .push(WorkoutExercise {
                id,
                exercise: ExerciseRef {
                    name,
                    muscle,
                    category,
                },
                sets,
                notes,
                rest_time: rest_time.map(|v| v as u32),
            });
    }

    type WorkoutRow = (
        String,
        String,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<Mood>,
        Option<Mood>,
    );
    let workout_rows: Vec<WorkoutRow> = sqlx::query_as(
        r#"
        SELECT id, name, date, start_time, end_time, notes, mood, final_mood
        FROM workouts
        ORDER BY date, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut workouts = Vec::with_capacity(workout_rows.len());
    for (id, name, date, start_time, end_time, notes, mood, final_mood) in workout_rows {
        let exercises = entries_by_workout.remove(&id).unwrap_or_default();
        workouts.push(Workout {
            date: parse_date(&date)?,
            start_time: parse_time(start_time),
            end_time: parse_time(end_time),
            id,
            name,
            exercises,
            notes,
            mood,
            final_mood,
        });
    }

    Ok(workouts)
}

/// Load all GTG sessions with their completions, exercise names resolved.
pub async fn load_gtg_sessions(pool: &SqlitePool) -> Result<Vec<GtgSession>> {
    type CompletionRow = (
        String,
        String,
        String,
        Option<i64>,
        Option<i64>,
        Option<f64>,
        Option<String>,
    );
    let completion_rows: Vec<CompletionRow> = sqlx::query_as(
        r#"
        SELECT id, session_id, timestamp, reps, time, weight, notes
        FROM gtg_sets
        ORDER BY timestamp, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut sets_by_session: HashMap<String, Vec<GtgSet>> = HashMap::new();
    for (id, session_id, timestamp, reps, time, weight, notes) in completion_rows {
        sets_by_session.entry(session_id).or_default().push(GtgSet {
            timestamp: parse_timestamp(&timestamp)?,
            id,
            reps: reps.map(|v| v as u32),
            time: time.map(|v| v as u32),
            weight,
            notes,
        });
    }

    type SessionRow = (
        String,
        String,
        String,
        Option<String>,
        i64,
        i64,
        i64,
        Option<i64>,
        Option<i64>,
        Option<f64>,
        i64,
        Option<String>,
    );
    let session_rows: Vec<SessionRow> = sqlx::query_as(
        r#"
        SELECT g.id, e.name, g.date, g.start_time, g.interval_minutes, g.target_sets,
               g.sets_completed, g.reps_per_set, g.time_per_set, g.weight, g.is_active, g.notes
        FROM gtg_sessions g
        JOIN exercises e ON e.id = g.exercise_id
        ORDER BY g.date, g.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut sessions = Vec::with_capacity(session_rows.len());
    for (
        id,
        exercise,
        date,
        start_time,
        interval_minutes,
        target_sets,
        sets_completed,
        reps_per_set,
        time_per_set,
        weight,
        is_active,
        notes,
    ) in session_rows
    {
        let sets = sets_by_session.remove(&id).unwrap_or_default();
        sessions.push(GtgSession {
            date: parse_date(&date)?,
            start_time: parse_time(start_time),
            id,
            exercise,
            interval_minutes: interval_minutes as u32,
            target_sets: target_sets as u32,
            sets_completed: sets_completed as u32,
            reps_per_set: reps_per_set.map(|v| v as u32),
            time_per_set: time_per_set.map(|v| v as u32),
            weight,
            is_active: is_active != 0,
            notes,
            sets,
        });
    }

    Ok(sessions)
}
