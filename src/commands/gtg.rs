use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::cli::GtgCmd;
use crate::storage::{self, DATE_FMT, TIME_FMT, TIMESTAMP_FMT};

pub async fn handle(cmd: GtgCmd, pool: &SqlitePool) -> Result<()> {
    match cmd {
        GtgCmd::Start {
            exercise,
            interval,
            target,
            reps,
            time,
            weight,
        } => {
            if let Some((id, name)) = storage::active_gtg_session(pool).await? {
                println!(
                    "{} there is already an active GTG session for {} (id: {})",
                    "error:".red().bold(),
                    name.bold(),
                    id
                );
                return Ok(());
            }

            let Some((exercise_id, name)) = storage::resolve_exercise(pool, &exercise).await? else {
                println!("{} no exercise matching `{}`", "error:".red().bold(), exercise);
                return Ok(());
            };

            if target == 0 {
                println!("{} target must be at least 1 set", "error:".red().bold());
                return Ok(());
            }

            let now = Local::now();
            let session_id = Uuid::new_v4().to_string();
            sqlx::query(
                r#"
                INSERT INTO gtg_sessions
                  (id, exercise_id, date, start_time, interval_minutes, target_sets,
                   sets_completed, reps_per_set, time_per_set, weight, is_active)
                VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, 1)
                "#,
            )
            .bind(&session_id)
            .bind(&exercise_id)
            .bind(now.format(DATE_FMT).to_string())
            .bind(now.format(TIME_FMT).to_string())
            .bind(i64::from(interval))
            .bind(i64::from(target))
            .bind(reps.map(i64::from))
            .bind(time.map(i64::from))
            .bind(weight)
            .execute(pool)
            .await?;

            println!(
                "{} GTG session started: {} — {} sets, one every {} min (id: {})",
                "ok:".green().bold(),
                name.bold(),
                target,
                interval,
                session_id
            );
        }

        GtgCmd::Log {
            reps,
            time,
            weight,
            note,
        } => {
            let Some((session_id, name)) = storage::active_gtg_session(pool).await? else {
                println!("{} no active GTG session — `gtg start` first", "error:".red().bold());
                return Ok(());
            };

            // Fall back to the session's planned per-set targets.
            let (planned_reps, planned_time, planned_weight, completed, target): (
                Option<i64>,
                Option<i64>,
                Option<f64>,
                i64,
                i64,
            ) = sqlx::query_as(
                "SELECT reps_per_set, time_per_set, weight, sets_completed, target_sets
                 FROM gtg_sessions WHERE id = ?",
            )
            .bind(&session_id)
            .fetch_one(pool)
            .await?;

            let reps = reps.map(i64::from).or(planned_reps);
            let time = time.map(i64::from).or(planned_time);
            let weight = weight.or(planned_weight);

            let mut tx = pool.begin().await?;

            sqlx::query(
                "INSERT INTO gtg_sets (id, session_id, timestamp, reps, time, weight, notes)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&session_id)
            .bind(Local::now().format(TIMESTAMP_FMT).to_string())
            .bind(reps)
            .bind(time)
            .bind(weight)
            .bind(note)
            .execute(&mut *tx)
            .await?;

            // The session keeps its own completed-set counter.
            sqlx::query("UPDATE gtg_sessions SET sets_completed = sets_completed + 1 WHERE id = ?")
                .bind(&session_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;

            let done = completed + 1;
            println!(
                "{} {} set {}/{} logged",
                "ok:".green().bold(),
                name.bold(),
                done,
                target
            );
            if done >= target {
                println!("{} target reached — `gtg stop` to close the session", "info:".blue().bold());
            }
        }

        GtgCmd::Stop => {
            let Some((session_id, name)) = storage::active_gtg_session(pool).await? else {
                println!("{} no active GTG session", "error:".red().bold());
                return Ok(());
            };

            sqlx::query("UPDATE gtg_sessions SET is_active = 0 WHERE id = ?")
                .bind(&session_id)
                .execute(pool)
                .await?;

            let (completed, target): (i64, i64) = sqlx::query_as(
                "SELECT sets_completed, target_sets FROM gtg_sessions WHERE id = ?",
            )
            .bind(&session_id)
            .fetch_one(pool)
            .await?;

            println!(
                "{} {} session closed: {}/{} sets",
                "ok:".green().bold(),
                name.bold(),
                completed,
                target
            );
        }

        GtgCmd::List { limit } => {
            let rows: Vec<(String, String, String, i64, i64, i64, i64)> = sqlx::query_as(
                r#"
                SELECT g.id, e.name, g.date, g.interval_minutes, g.target_sets,
                       g.sets_completed, g.is_active
                FROM gtg_sessions g
                JOIN exercises e ON e.id = g.exercise_id
                ORDER BY g.date DESC, g.start_time DESC
                LIMIT ?
                "#,
            )
            .bind(i64::from(limit))
            .fetch_all(pool)
            .await?;

            if rows.is_empty() {
                println!("{}", "(no GTG sessions)".dimmed());
                return Ok(());
            }

            println!("{}", "GTG sessions:".cyan().bold());
            for (id, name, date, interval, target, completed, is_active) in rows {
                let status = if is_active != 0 {
                    " (active)".green().to_string()
                } else {
                    String::new()
                };
                println!(
                    "  {} {} — {}/{} sets @ {} min{} | {}",
                    date.green(),
                    name.bold(),
                    completed,
                    target,
                    interval,
                    status,
                    id.dimmed()
                );
            }
        }

        GtgCmd::Delete { session } => {
            // Cascade removes the logged sets.
            let res = sqlx::query("DELETE FROM gtg_sessions WHERE id = ?")
                .bind(&session)
                .execute(pool)
                .await?;

            if res.rows_affected() == 1 {
                println!("{} GTG session {} deleted", "ok:".green().bold(), session);
            } else {
                println!("{} no GTG session with id `{}`", "error:".red().bold(), session);
            }
        }
    }

    Ok(())
}
