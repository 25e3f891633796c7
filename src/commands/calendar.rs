use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveTime};
use colored::Colorize;
use sqlx::SqlitePool;

use crate::storage::{DATE_FMT, TIME_FMT};
use crate::utils::format_minutes;

pub async fn handle(pool: &SqlitePool, year: Option<i32>, month: Option<u32>) -> Result<()> {
    // Get current date if year/month not specified
    let now = chrono::Local::now();
    let year = year.unwrap_or(now.year());
    let month = month.unwrap_or(now.month());

    // Validate month
    if month < 1 || month > 12 {
        println!("{} month must be between 1 and 12", "error:".red().bold());
        return Ok(());
    }

    // Get first and last day of the month
    let Some(first_day) = NaiveDate::from_ymd_opt(year, month, 1) else {
        println!("{} invalid year {}", "error:".red().bold(), year);
        return Ok(());
    };
    let last_day = match month {
        12 => NaiveDate::from_ymd_opt(year + 1, 1, 1),
        _ => NaiveDate::from_ymd_opt(year, month + 1, 1),
    }
    .and_then(|d| d.pred_opt())
    .expect("month bounds already validated");

    // Get all workouts in the month
    let workouts: Vec<(String, String, Option<String>, Option<String>, Option<String>, i64)> =
        sqlx::query_as(
            r#"
            SELECT w.name, w.date, w.start_time, w.end_time, w.notes,
                   (SELECT COUNT(*) FROM workout_exercises we WHERE we.workout_id = w.id)
            FROM workouts w
            WHERE w.date >= ? AND w.date <= ?
            ORDER BY w.date, w.start_time
            "#,
        )
        .bind(first_day.format(DATE_FMT).to_string())
        .bind(last_day.format(DATE_FMT).to_string())
        .fetch_all(pool)
        .await?;

    // Print calendar header
    let month_name = first_day.format("%B %Y").to_string();
    println!("\n{}", month_name.bold().cyan());
    println!("{}", "Su Mo Tu We Th Fr Sa".dimmed());

    // Get the day of week for the first day (0 = Sunday)
    let first_weekday = first_day.weekday().num_days_from_sunday() as usize;

    // Print leading spaces
    print!("{}", "   ".repeat(first_weekday));

    // Create a map of workouts by day
    let mut days_with_workouts = std::collections::HashSet::new();
    for workout in &workouts {
        if let Ok(date) = NaiveDate::parse_from_str(&workout.1, DATE_FMT) {
            days_with_workouts.insert(date.day() as usize);
        }
    }

    // Print calendar days
    for day in 1..=last_day.day() {
        let day_num = day as usize;

        // Print day number
        if days_with_workouts.contains(&day_num) {
            // Day has workouts - print in green
            print!("{:2} ", day.to_string().green().bold());
        } else {
            // Regular day
            print!("{:2} ", day);
        }

        // New line at end of week
        if (first_weekday + day_num) % 7 == 0 {
            println!();
        }
    }
    println!("\n");

    // Print workout details
    if !workouts.is_empty() {
        println!("{}", "Workouts:".bold().cyan());
        for (name, date, start_time, end_time, notes, exercises) in workouts {
            let times = start_time
                .as_deref()
                .and_then(|s| NaiveTime::parse_from_str(s, TIME_FMT).ok())
                .zip(end_time.as_deref().and_then(|e| NaiveTime::parse_from_str(e, TIME_FMT).ok()));

            let duration = match times {
                Some((start, end)) if end > start => {
                    format!(" ({})", format_minutes(end - start))
                }
                _ => String::new(),
            };

            println!(
                "  {} | {}{} — {} exercises",
                date.green(),
                name.bold(),
                duration,
                exercises
            );

            if let Some(notes) = notes {
                if !notes.is_empty() {
                    println!("    {}", notes.dimmed());
                }
            }
        }
    }

    Ok(())
}
