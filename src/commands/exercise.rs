use std::{collections::BTreeSet, path::Path};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::cli::ExerciseCmd;
use crate::storage::resolve_exercise;
use crate::types::{
    ALLOWED_MUSCLES, Category, ExerciseImport, OutputFmt, best_muscle_suggestion,
    canonical_muscle, emit,
};

#[derive(Serialize)]
struct ExJson {
    idx: i64,
    name: String,
    muscle: String,
    category: Category,
    description: String,
    created_at: String,
}

pub async fn handle(cmd: ExerciseCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    match cmd {
        ExerciseCmd::Add {
            name,
            muscle,
            category,
            desc,
        } => {
            let Some(muscle) = canonical_muscle(&muscle) else {
                if let Some(sug) = best_muscle_suggestion(&muscle) {
                    println!(
                        "{} unknown muscle `{}` — did you mean: `{}`?",
                        "error:".red().bold(),
                        muscle,
                        sug.green()
                    );
                } else {
                    let allowed = ALLOWED_MUSCLES.iter().copied().collect::<Vec<_>>().join(", ");
                    println!(
                        "{} unknown muscle `{}` — allowed: {}",
                        "error:".red().bold(),
                        muscle,
                        allowed
                    );
                }
                return Ok(());
            };

            let res = sqlx::query(
                r#"
                INSERT INTO exercises
                (id, name, muscle, category, description, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
                "#,
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&name)
            .bind(&muscle)
            .bind(category.to_string())
            .bind(desc.unwrap_or_default())
            .execute(pool)
            .await;

            match res {
                Ok(info) if info.rows_affected() == 1 => {
                    println!("{} Exercise \"{}\" added", "info:".blue().bold(), &name)
                }
                Ok(_) => println!(
                    "{} Exercise \"{}\" was not inserted",
                    "info:".blue().bold(),
                    &name
                ),
                Err(sqlx::Error::Database(db_err)) if db_err.code() == Some("2067".into()) => {
                    // 2067 = SQLITE_CONSTRAINT_UNIQUE
                    println!(
                        "{} Exercise \"{}\" already exists — use `ex list` to view all exercises",
                        "warning:".yellow().bold(),
                        name
                    );
                }
                Err(e) => {
                    println!("{} {}", "error:".red().bold(), e.to_string().red());
                    return Err(e.into());
                }
            }
        }

        ExerciseCmd::Import { file } => {
            let path = Path::new(&file);
            let toml_str = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Could not read file: `{}`", file))?;

            // Parse into Vec<ExerciseDef>.
            let import: ExerciseImport = toml::from_str(&toml_str)
                .context("Failed to parse TOML: Expected `[[exercise]]` entries")?;

            if import.exercise.is_empty() {
                println!(
                    "{}",
                    "warning: no [[exercise]] entries found".yellow().bold()
                );
                return Ok(());
            }

            // Loop and insert/ignore.
            let mut inserted = 0;
            let mut skipped = 0;
            let mut unknowns: BTreeSet<String> = BTreeSet::new();

            for ex in import.exercise {
                assert!(
                    !ex.name.trim().is_empty(),
                    "exercise.name must not be empty"
                );

                // Validate the `muscle` field.
                let muscle = match canonical_muscle(&ex.muscle) {
                    Some(m) => m,
                    None => {
                        // Did you mean?
                        if let Some(sug) = best_muscle_suggestion(&ex.muscle) {
                            println!(
                                "{} `{}` skipped – unknown muscle `{}` -- did you mean: `{}`?",
                                "warning:".yellow().bold(),
                                ex.name,
                                ex.muscle,
                                sug.green()
                            );
                        } else {
                            println!(
                                "{} `{}` skipped – unknown muscle `{}`",
                                "warning:".yellow().bold(),
                                ex.name,
                                ex.muscle
                            );
                        }

                        skipped += 1;
                        unknowns.insert(ex.muscle);
                        continue;
                    }
                };

                let category = ex.category.unwrap_or(Category::WeightReps);
                let desc = ex.description.unwrap_or_default();

                let res = sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO exercises
                      (id, name, muscle, category, description, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
                    "#,
                )
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(&ex.name)
                .bind(&muscle)
                .bind(category.to_string())
                .bind(desc)
                .execute(pool)
                .await
                .with_context(|| format!("DB error inserting `{}`", ex.name))?;

                if res.rows_affected() == 1 {
                    inserted += 1;
                    println!("{} `{}`", "ok:".green().bold(), ex.name);
                } else {
                    skipped += 1;
                    println!("{} `{}` (already exists)", "info:".blue().bold(), ex.name);
                }
            }

            // Summary.
            println!(
                "\n{} {} inserted, {} skipped",
                "Summary:".cyan().bold(),
                inserted,
                skipped
            );

            // Print allowed list if at least one exercise is unknown.
            if !unknowns.is_empty() {
                let allowed = ALLOWED_MUSCLES
                    .iter()
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", ");

                let bad = unknowns.into_iter().collect::<Vec<_>>().join(", ");

                println!();
                println!("{} {}", "Unknown muscles:".yellow().bold(), bad);
                println!("{} {}", "Allowed muscles:".cyan().bold(), allowed);
            }
        }

        ExerciseCmd::List { muscle } => {
            let base = r#"
                SELECT ROW_NUMBER() OVER (ORDER BY name) AS idx,
                       name, muscle, category,
                       COALESCE(description, '') AS description,
                       created_at
                FROM exercises
            "#;

            // Add a filter if requested.
            let rows: Vec<(i64, String, String, Category, String, String)> =
                if let Some(muscle) = muscle {
                    let q = format!("SELECT * FROM ({base}) WHERE muscle = ? ORDER BY idx");
                    sqlx::query_as(&q).bind(muscle).fetch_all(pool).await?
                } else {
                    let q = format!("{base} ORDER BY idx");
                    sqlx::query_as(&q).fetch_all(pool).await?
                };

            let json_rows: Vec<ExJson> = rows
                .into_iter()
                .map(|(idx, name, muscle, category, description, created_at)| ExJson {
                    idx,
                    name,
                    muscle,
                    category,
                    description,
                    created_at,
                })
                .collect();

            emit(fmt, &json_rows, || {
                if json_rows.is_empty() {
                    println!("{}", "(no exercises)".dimmed());
                    return;
                }

                println!("{}", "Exercises:".cyan().bold());

                let idx_w = json_rows
                    .iter()
                    .map(|e| e.idx.to_string().len())
                    .max()
                    .unwrap_or(1);

                for ex in &json_rows {
                    let idx_col = format!("{:>width$}", ex.idx, width = idx_w).yellow();
                    let desc = if ex.description.is_empty() {
                        String::new()
                    } else {
                        format!(" – {}", ex.description).dimmed().to_string()
                    };
                    println!(
                        " {} • {} ({}, {}){}",
                        idx_col,
                        ex.name.bold(),
                        ex.muscle,
                        ex.category,
                        desc
                    );
                }
            })?;
        }

        ExerciseCmd::Delete { exercise } => {
            let Some((id, name)) = resolve_exercise(pool, &exercise).await? else {
                println!("{} no exercise matching `{}`", "error:".red().bold(), exercise);
                return Ok(());
            };

            // Refuse to orphan logged history.
            let references: i64 = sqlx::query_scalar(
                r#"
                SELECT (SELECT COUNT(*) FROM workout_exercises WHERE exercise_id = ?1)
                     + (SELECT COUNT(*) FROM gtg_sessions WHERE exercise_id = ?1)
                "#,
            )
            .bind(&id)
            .fetch_one(pool)
            .await?;

            if references > 0 {
                println!(
                    "{} `{}` appears in {} logged entries — delete those first",
                    "error:".red().bold(),
                    name,
                    references
                );
                return Ok(());
            }

            sqlx::query("DELETE FROM exercises WHERE id = ?")
                .bind(&id)
                .execute(pool)
                .await?;

            println!("{} exercise `{}` deleted", "ok:".green().bold(), name);
        }
    }

    Ok(())
}
