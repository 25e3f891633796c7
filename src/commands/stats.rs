use anyhow::Result;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use itertools::Itertools;
use sqlx::SqlitePool;

use crate::stats::{StatisticsReport, Trend, compute};
use crate::storage;
use crate::types::{Config, OutputFmt, emit};

fn create_ascii_graph(data: &[(NaiveDate, f64)], width: usize, height: usize, title: &str) -> Vec<String> {
    if data.is_empty() {
        return vec!["No data available".to_string()];
    }

    let min_value = data.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max_value = data.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let range = max_value - min_value;

    if range == 0.0 {
        return vec!["No variation in data".to_string()];
    }

    // Create the graph grid
    let mut grid = vec![vec![' '; width]; height];

    // Draw the data points and lines
    for i in 0..data.len() {
        let (_, value) = data[i];
        let x = (i as f64 / (data.len() - 1).max(1) as f64 * (width - 1) as f64) as usize;
        let y = ((value - min_value) / range * (height - 1) as f64) as usize;
        let y = height - 1 - y; // Flip the y-axis

        if y < height && x < width {
            grid[y][x] = '●';
        }

        // Draw connecting lines
        if i > 0 {
            let prev_x = ((i - 1) as f64 / (data.len() - 1).max(1) as f64 * (width - 1) as f64) as usize;
            let prev_y = ((data[i - 1].1 - min_value) / range * (height - 1) as f64) as usize;
            let prev_y = height - 1 - prev_y;

            // Draw line between points
            let dx = x as isize - prev_x as isize;
            let dy = y as isize - prev_y as isize;
            let steps = dx.abs().max(dy.abs());

            for step in 1..steps {
                let px = prev_x as isize + (dx * step / steps);
                let py = prev_y as isize + (dy * step / steps);

                if px >= 0 && px < width as isize && py >= 0 && py < height as isize {
                    let px = px as usize;
                    let py = py as usize;
                    if grid[py][px] == ' ' {
                        grid[py][px] = '·';
                    }
                }
            }
        }
    }

    // Convert grid to strings with y-axis labels
    let mut result = Vec::new();
    let step = range / (height - 1) as f64;

    result.push(format!("\n{}", title.bold()));
    result.push("─".repeat(width + 7));

    for (i, row) in grid.iter().enumerate() {
        let value = min_value + step * (height - 1 - i) as f64;
        let label = format!("{:4.0} │{}", value, row.iter().collect::<String>());
        result.push(label);
    }

    result.push(format!("     └{}", "─".repeat(width)));

    // Add date labels
    if let (Some(first), Some(last)) = (data.first(), data.last()) {
        result.push(format!(
            "     {}  {}",
            first.0.format("%Y-%m-%d"),
            last.0.format("%Y-%m-%d")
        ));
    }

    result
}

fn trend_mark(trend: Option<f64>) -> String {
    match trend {
        Some(t) if t > 0.0 => format!("{} {:+.1}%", "▲".green(), t),
        Some(t) if t < 0.0 => format!("{} {:+.1}%", "▼".red(), t),
        Some(_) => "0.0%".to_string(),
        None => "n/a".dimmed().to_string(),
    }
}

fn has_signal(trend: &Trend) -> bool {
    trend.weight.is_some() || trend.volume.is_some() || trend.reps.is_some()
}

fn render(report: &StatisticsReport, days: u32, graph: bool) {
    println!("{} (last {} days)", "Training Statistics".cyan().bold(), days);
    println!();

    // Quick stats.
    println!("{}: {} reps", "Total volume".cyan().bold(), report.total_reps);
    println!("{}: {:.0} kg", "Total weight".cyan().bold(), report.total_weight);
    println!(
        "{}: {:.1} workouts/week",
        "Frequency".cyan().bold(),
        report.workouts_per_week
    );
    if report.avg_session_duration > 0.0 {
        println!(
            "{}: {:.0} min/workout",
            "Avg duration".cyan().bold(),
            report.avg_session_duration
        );
    }

    // Volume distribution.
    if !report.volume_by_muscle.is_empty() || !report.reps_by_muscle.is_empty() {
        println!();
        println!("{}", "Volume by muscle group:".cyan().bold());
        for (muscle, volume) in report
            .volume_by_muscle
            .iter()
            .sorted_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal))
        {
            let reps = report.reps_by_muscle.get(muscle).copied().unwrap_or(0);
            let times = report.muscle_frequency.get(muscle).copied().unwrap_or(0);
            println!(
                "  {} — {:.0} kg, {} reps ({} entries)",
                muscle.bold(),
                volume,
                reps,
                times
            );
        }
        // Rep-only muscles (bodyweight work) have no weighted bucket.
        for (muscle, reps) in report
            .reps_by_muscle
            .iter()
            .filter(|(m, _)| !report.volume_by_muscle.contains_key(*m))
            .sorted_by(|a, b| b.1.cmp(a.1))
        {
            let times = report.muscle_frequency.get(muscle).copied().unwrap_or(0);
            println!("  {} — {} reps ({} entries)", muscle.bold(), reps, times);
        }
    }

    if !report.volume_by_exercise.is_empty() {
        println!();
        println!("{}", "Top exercises by weighted volume:".cyan().bold());
        for (name, volume) in report
            .volume_by_exercise
            .iter()
            .sorted_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal))
            .take(5)
        {
            println!("  {} — {:.0} kg", name.bold(), volume);
        }
    }

    // Rest times.
    if !report.rest_time_by_exercise.is_empty() {
        println!();
        println!("{}", "Rest time between sets:".cyan().bold());
        println!("  overall average: {:.0}s", report.avg_rest_time);
        for (muscle, rest) in &report.rest_time_by_muscle {
            println!("  {} — {:.0}s", muscle.bold(), rest);
        }
    }

    // Progression: whole-log view, not limited to the window.
    let active: Vec<_> = report
        .progression
        .iter()
        .filter(|(_, p)| has_signal(&p.trend) || p.current_week.weight > 0.0 || p.last_week.weight > 0.0)
        .collect();

    if !active.is_empty() {
        println!();
        println!("{}", "Weekly progression:".cyan().bold());
        for (name, prog) in active {
            println!(
                "  {} {} | PB {:.0} kg",
                name.bold(),
                trend_mark(prog.trend.weight),
                prog.personal_best.weight
            );
            println!(
                "    top set: {} → {} → {} kg",
                if prog.two_weeks_ago.weight > 0.0 {
                    format!("{:.0}", prog.two_weeks_ago.weight)
                } else {
                    "-".to_string()
                },
                if prog.last_week.weight > 0.0 {
                    format!("{:.0}", prog.last_week.weight)
                } else {
                    "-".to_string()
                },
                if prog.current_week.weight > 0.0 {
                    format!("{:.0}", prog.current_week.weight)
                } else {
                    "-".to_string()
                },
            );
            println!(
                "    volume {} · reps {}",
                trend_mark(prog.trend.volume),
                trend_mark(prog.trend.reps)
            );
        }
    }

    // GTG section, only when sessions exist.
    if let Some(gtg) = &report.gtg {
        println!();
        println!("{}", "Grease the groove:".cyan().bold());
        println!(
            "  {} sets, {} reps, {:.1}% completion",
            gtg.total_sets, gtg.total_reps, gtg.completion_rate
        );
        for (name, stats) in &gtg.by_exercise {
            println!(
                "  {} — {} sessions, {} sets, {} reps, {:.1}% completion",
                name.bold(),
                stats.sessions,
                stats.total_sets,
                stats.total_reps,
                stats.completion_rate
            );
        }

        if graph && !gtg.sets_per_day.is_empty() {
            let series: Vec<(NaiveDate, f64)> = gtg
                .sets_per_day
                .iter()
                .map(|(date, sets)| (*date, *sets as f64))
                .collect();

            let (term_width, term_height) = term_size::dimensions().unwrap_or((80, 24));
            let width = (term_width / 2).min(60);
            let height = (term_height / 2).min(15);

            for line in create_ascii_graph(&series, width, height, "GTG sets per day") {
                println!("{}", line);
            }
        }
    }
}

pub async fn handle(
    days: Option<u32>,
    graph: bool,
    pool: &SqlitePool,
    fmt: OutputFmt,
) -> Result<()> {
    let days = match days {
        Some(d) => d,
        None => super::config::config_path()
            .ok()
            .and_then(|p| Config::load(&p).ok())
            .and_then(|c| c.get_u32("window-days"))
            .unwrap_or(30),
    };

    let workouts = storage::load_workouts(pool).await?;
    let sessions = storage::load_gtg_sessions(pool).await?;

    // One clock read for the whole computation.
    let report = compute(&workouts, Some(&sessions), days, Local::now());

    emit(fmt, &report, || render(&report, days, graph))
}
