use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime};
use colored::Colorize;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::cli::WorkoutCmd;
use crate::storage::{self, DATE_FMT, TIME_FMT};
use crate::types::{Mood, OutputFmt, emit};

#[derive(Serialize)]
struct WorkoutJson {
    id: String,
    name: String,
    date: String,
    start_time: Option<String>,
    end_time: Option<String>,
    exercises: i64,
    sets: i64,
    mood: Option<Mood>,
}

/// One displayable line for a set row. Only recorded metrics show up;
/// an absent field is not a zero.
fn format_set(
    weight: Option<f64>,
    reps: Option<i64>,
    duration: Option<i64>,
    distance: Option<f64>,
    calories: Option<i64>,
) -> String {
    let mut parts = Vec::new();

    match (weight, reps) {
        (Some(w), Some(r)) => parts.push(format!("{w}kg × {r}")),
        (Some(w), None) => parts.push(format!("{w}kg")),
        (None, Some(r)) => parts.push(format!("{r} reps")),
        (None, None) => {}
    }
    if let Some(d) = duration {
        parts.push(format!("{d}s"));
    }
    if let Some(d) = distance {
        parts.push(format!("{d}km"));
    }
    if let Some(c) = calories {
        parts.push(format!("{c}kcal"));
    }

    if parts.is_empty() {
        "(empty set)".to_string()
    } else {
        parts.join(" · ")
    }
}

async fn print_workout(pool: &SqlitePool, workout_id: &str) -> Result<()> {
    let (name, date, start_time, end_time, notes, mood, final_mood): (
        String,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
    ) = sqlx::query_as(
        "SELECT name, date, start_time, end_time, notes, mood, final_mood FROM workouts WHERE id = ?",
    )
    .bind(workout_id)
    .fetch_one(pool)
    .await?;

    println!("{} {} ({})", "Workout:".cyan().bold(), name.bold(), date);
    match (&start_time, &end_time) {
        (Some(s), Some(e)) => println!("{} {} – {}", "Time:".cyan().bold(), s, e),
        (Some(s), None) => println!("{} started {}", "Time:".cyan().bold(), s),
        _ => {}
    }
    if let Some(m) = mood {
        println!("{} {}", "Mood:".cyan().bold(), m);
    }
    if let Some(m) = final_mood {
        println!("{} {}", "Final mood:".cyan().bold(), m);
    }
    if let Some(n) = notes {
        if !n.is_empty() {
            println!("{} {}", "Notes:".cyan().bold(), n.dimmed());
        }
    }

    let entries: Vec<(String, String, String, Option<i64>, Option<String>)> = sqlx::query_as(
        r#"
        SELECT we.id, e.name, e.muscle, we.rest_time, we.notes
        FROM workout_exercises we
        JOIN exercises e ON e.id = we.exercise_id
        WHERE we.workout_id = ?
        ORDER BY we.position
        "#,
    )
    .bind(workout_id)
    .fetch_all(pool)
    .await?;

    if entries.is_empty() {
        println!("\n{}", "(no exercises yet)".dimmed());
        return Ok(());
    }

    for (i, (entry_id, ex_name, muscle, rest_time, entry_notes)) in entries.iter().enumerate() {
        let idx = format!("{}", i + 1).yellow();
        let rest = rest_time
            .map(|r| format!(" — rest {r}s"))
            .unwrap_or_default();
        println!("\n{} • {} ({}){}", idx, ex_name.bold(), muscle, rest.dimmed());

        let sets: Vec<(Option<f64>, Option<i64>, Option<i64>, Option<f64>, Option<i64>, Option<String>)> =
            sqlx::query_as(
                r#"
                SELECT weight, reps, duration, distance, calories, notes
                FROM workout_sets
                WHERE workout_exercise_id = ?
                ORDER BY position
                "#,
            )
            .bind(entry_id)
            .fetch_all(pool)
            .await?;

        for (set_idx, (weight, reps, duration, distance, calories, set_notes)) in
            sets.iter().enumerate()
        {
            let line = format_set(*weight, *reps, *duration, *distance, *calories);
            let note = set_notes
                .as_deref()
                .map(|n| format!(" - {n}"))
                .unwrap_or_default();
            println!("  Set {}: {}{}", set_idx + 1, line, note.dimmed());
        }

        if let Some(n) = entry_notes {
            if !n.is_empty() {
                println!("  {}", n.dimmed());
            }
        }
    }

    Ok(())
}

/// Resolve the 1-based exercise index inside the active workout to the
/// `workout_exercises` row id.
async fn resolve_entry(
    pool: &SqlitePool,
    workout_id: &str,
    index: usize,
) -> Result<Option<(String, String)>> {
    let Some(index) = index.checked_sub(1) else {
        return Ok(None);
    };

    Ok(sqlx::query_as(
        r#"
        SELECT we.id, e.name
        FROM workout_exercises we
        JOIN exercises e ON e.id = we.exercise_id
        WHERE we.workout_id = ?
        ORDER BY we.position
        LIMIT 1 OFFSET ?
        "#,
    )
    .bind(workout_id)
    .bind(index as i64)
    .fetch_optional(pool)
    .await?)
}

pub async fn handle(cmd: WorkoutCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    match cmd {
        WorkoutCmd::Start { name, mood } => {
            if let Some(id) = storage::active_workout(pool).await? {
                println!(
                    "{} there is already an active workout (id: {})",
                    "error:".red().bold(),
                    id
                );
                return Ok(());
            }

            let now = Local::now();
            let workout_id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO workouts (id, name, date, start_time, mood) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&workout_id)
            .bind(name.unwrap_or_else(|| "Workout".to_string()))
            .bind(now.format(DATE_FMT).to_string())
            .bind(now.format(TIME_FMT).to_string())
            .bind(mood.map(|m| m.to_string()))
            .execute(pool)
            .await?;

            println!("{} workout started (id: {})", "ok:".green().bold(), workout_id);
        }

        WorkoutCmd::AddEx { exercise, rest } => {
            let Some(workout_id) = storage::active_workout(pool).await? else {
                println!("{} no active workout — `workout start` first", "error:".red().bold());
                return Ok(());
            };

            let Some((exercise_id, name)) = storage::resolve_exercise(pool, &exercise).await? else {
                println!("{} no exercise matching `{}`", "error:".red().bold(), exercise);
                return Ok(());
            };

            let position: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM workout_exercises WHERE workout_id = ?",
            )
            .bind(&workout_id)
            .fetch_one(pool)
            .await?;

            sqlx::query(
                "INSERT INTO workout_exercises (id, workout_id, exercise_id, position, rest_time)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&workout_id)
            .bind(&exercise_id)
            .bind(position + 1)
            .bind(rest.map(i64::from))
            .execute(pool)
            .await?;

            println!("{} added {} at position {}", "ok:".green().bold(), name.bold(), position + 1);
        }

        WorkoutCmd::Set {
            exercise,
            weight,
            reps,
            duration,
            distance,
            calories,
            note,
        } => {
            let Some(workout_id) = storage::active_workout(pool).await? else {
                println!("{} no active workout — `workout start` first", "error:".red().bold());
                return Ok(());
            };

            let Some((entry_id, name)) = resolve_entry(pool, &workout_id, exercise).await? else {
                println!("{} no exercise at index {}", "error:".red().bold(), exercise);
                return Ok(());
            };

            if weight.is_none()
                && reps.is_none()
                && duration.is_none()
                && distance.is_none()
                && calories.is_none()
            {
                println!(
                    "{} no metrics given — pass at least one of --weight/--reps/--duration/--distance/--calories",
                    "warning:".yellow().bold()
                );
                return Ok(());
            }

            let position: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM workout_sets WHERE workout_exercise_id = ?",
            )
            .bind(&entry_id)
            .fetch_one(pool)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO workout_sets
                  (id, workout_exercise_id, position, weight, reps, duration, distance, calories, notes)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&entry_id)
            .bind(position + 1)
            .bind(weight)
            .bind(reps.map(i64::from))
            .bind(duration.map(i64::from))
            .bind(distance)
            .bind(calories.map(i64::from))
            .bind(note)
            .execute(pool)
            .await?;

            let line = format_set(
                weight,
                reps.map(i64::from),
                duration.map(i64::from),
                distance,
                calories.map(i64::from),
            );
            println!("{} {} set {}: {}", "ok:".green().bold(), name.bold(), position + 1, line);
        }

        WorkoutCmd::Note { exercise, note } => {
            let Some(workout_id) = storage::active_workout(pool).await? else {
                println!("{} no active workout", "error:".red().bold());
                return Ok(());
            };

            let Some((entry_id, name)) = resolve_entry(pool, &workout_id, exercise).await? else {
                println!("{} no exercise at index {}", "error:".red().bold(), exercise);
                return Ok(());
            };

            sqlx::query("UPDATE workout_exercises SET notes = ? WHERE id = ?")
                .bind(&note)
                .bind(&entry_id)
                .execute(pool)
                .await?;

            println!("{} note added to {}", "ok:".green().bold(), name.bold());
        }

        WorkoutCmd::Show => {
            let Some(workout_id) = storage::active_workout(pool).await? else {
                println!("{} no active workout", "error:".red().bold());
                return Ok(());
            };

            print_workout(pool, &workout_id).await?;
        }

        WorkoutCmd::End { mood } => {
            let Some(workout_id) = storage::active_workout(pool).await? else {
                println!("{} no active workout to end", "error:".red().bold());
                return Ok(());
            };

            let now = Local::now();
            sqlx::query("UPDATE workouts SET end_time = ?, final_mood = ? WHERE id = ?")
                .bind(now.format(TIME_FMT).to_string())
                .bind(mood.map(|m| m.to_string()))
                .bind(&workout_id)
                .execute(pool)
                .await?;

            // Report the duration when the start time parses.
            let start: Option<String> =
                sqlx::query_scalar("SELECT start_time FROM workouts WHERE id = ?")
                    .bind(&workout_id)
                    .fetch_one(pool)
                    .await?;

            match start.and_then(|s| NaiveTime::parse_from_str(&s, TIME_FMT).ok()) {
                Some(start) => {
                    let minutes = (now.time() - start).num_minutes();
                    println!("{} workout finished in {} minutes", "ok:".green().bold(), minutes);
                }
                None => println!("{} workout finished", "ok:".green().bold()),
            }
        }

        WorkoutCmd::Cancel => {
            let Some(workout_id) = storage::active_workout(pool).await? else {
                println!("{} no active workout to cancel", "error:".red().bold());
                return Ok(());
            };

            // Cascade removes entries and sets.
            sqlx::query("DELETE FROM workouts WHERE id = ?")
                .bind(&workout_id)
                .execute(pool)
                .await?;

            println!("{} workout cancelled (id: {})", "ok:".green().bold(), workout_id);
        }

        WorkoutCmd::List { limit } => {
            let rows: Vec<(String, String, String, Option<String>, Option<String>, Option<Mood>, i64, i64)> =
                sqlx::query_as(
                    r#"
                    SELECT w.id, w.name, w.date, w.start_time, w.end_time, w.mood,
                           (SELECT COUNT(*) FROM workout_exercises we WHERE we.workout_id = w.id),
                           (SELECT COUNT(*) FROM workout_sets ws
                              JOIN workout_exercises we ON we.id = ws.workout_exercise_id
                             WHERE we.workout_id = w.id)
                    FROM workouts w
                    ORDER BY w.date DESC, w.start_time DESC
                    LIMIT ?
                    "#,
                )
                .bind(i64::from(limit))
                .fetch_all(pool)
                .await?;

            let json_rows: Vec<WorkoutJson> = rows
                .into_iter()
                .map(|(id, name, date, start_time, end_time, mood, exercises, sets)| WorkoutJson {
                    id,
                    name,
                    date,
                    start_time,
                    end_time,
                    mood,
                    exercises,
                    sets,
                })
                .collect();

            emit(fmt, &json_rows, || {
                if json_rows.is_empty() {
                    println!("{}", "(no workouts logged)".dimmed());
                    return;
                }

                println!("{}", "Workouts:".cyan().bold());
                for w in &json_rows {
                    let status = if w.end_time.is_none() {
                        " (active)".green().to_string()
                    } else {
                        String::new()
                    };
                    println!(
                        "  {} {} — {} exercises, {} sets{} | {}",
                        w.date.green(),
                        w.name.bold(),
                        w.exercises,
                        w.sets,
                        status,
                        w.id.dimmed()
                    );
                }
            })?;
        }

        WorkoutCmd::Log { date } => {
            // Accept the human DD-MM-YYYY form, store ISO.
            let parsed = match NaiveDate::parse_from_str(&date, "%d-%m-%Y") {
                Ok(d) => d,
                Err(_) => {
                    println!("{} invalid date `{}` (expected DD-MM-YYYY)", "error:".red().bold(), date);
                    return Ok(());
                }
            };

            let ids: Vec<String> =
                sqlx::query_scalar("SELECT id FROM workouts WHERE date = ? ORDER BY start_time")
                    .bind(parsed.format(DATE_FMT).to_string())
                    .fetch_all(pool)
                    .await?;

            if ids.is_empty() {
                println!("{} no workouts on {}", "warning:".yellow().bold(), date);
                return Ok(());
            }

            for (i, id) in ids.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_workout(pool, id).await?;
            }
        }

        WorkoutCmd::Delete { workout } => {
            let res = sqlx::query("DELETE FROM workouts WHERE id = ?")
                .bind(&workout)
                .execute(pool)
                .await?;

            if res.rows_affected() == 1 {
                println!("{} workout {} deleted", "ok:".green().bold(), workout);
            } else {
                println!("{} no workout with id `{}`", "error:".red().bold(), workout);
            }
        }
    }

    Ok(())
}
