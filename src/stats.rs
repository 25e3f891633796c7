use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

use crate::models::{GtgSession, Workout};

/// Everything the `stats` command renders, computed in one pass over the
/// log. Volume, frequency and rest-time aggregates respect the selected
/// window; progression and personal bests always scan the whole log.
///
/// Keyed aggregates are `BTreeMap`s so identical inputs serialize
/// identically.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatisticsReport {
    pub total_reps: u64,
    pub total_weight: f64,
    pub workouts_per_week: f64,
    pub avg_session_duration: f64,
    pub volume_by_exercise: BTreeMap<String, f64>,
    pub volume_by_muscle: BTreeMap<String, f64>,
    pub reps_by_exercise: BTreeMap<String, u64>,
    pub reps_by_muscle: BTreeMap<String, u64>,
    pub muscle_frequency: BTreeMap<String, u64>,
    pub rest_time_by_exercise: BTreeMap<String, f64>,
    pub rest_time_by_muscle: BTreeMap<String, f64>,
    pub avg_rest_time: f64,
    pub progression: BTreeMap<String, Progression>,
    pub gtg: Option<GtgReport>,
}

/// Running maxima for one 7-day period (or for the whole log, in the
/// personal-best case). Zero means "nothing seen".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodBests {
    /// Heaviest single set.
    pub weight: f64,
    /// Largest per-workout weighted volume (Σ weight × reps).
    pub volume: f64,
    /// Largest per-workout rep volume (Σ reps).
    pub reps: u64,
}

/// Week-over-week change in percent. `None` when either period is zero —
/// a trend off a zero baseline is meaningless, not infinite.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Trend {
    pub weight: Option<f64>,
    pub volume: Option<f64>,
    pub reps: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Progression {
    pub current_week: PeriodBests,
    pub last_week: PeriodBests,
    pub two_weeks_ago: PeriodBests,
    pub trend: Trend,
    pub personal_best: PeriodBests,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GtgExerciseStats {
    pub sessions: u64,
    pub total_sets: u64,
    pub total_reps: u64,
    pub completion_rate: f64,
}

/// Present only when the caller supplied a non-empty GTG session log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GtgReport {
    pub total_sets: u64,
    pub total_reps: u64,
    pub completion_rate: f64,
    pub by_exercise: BTreeMap<String, GtgExerciseStats>,
    pub sets_per_day: BTreeMap<NaiveDate, u64>,
}

/// Which 7-day band a workout falls in, counted back from `now`.
/// Workouts older than 21 days land in no band but still feed personal bests.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Period {
    CurrentWeek,
    LastWeek,
    TwoWeeksAgo,
}

fn classify(age_days: i64) -> Option<Period> {
    // Future-dated records count as current; the store does not forbid them.
    match age_days {
        i64::MIN..=7 => Some(Period::CurrentWeek),
        8..=14 => Some(Period::LastWeek),
        15..=21 => Some(Period::TwoWeeksAgo),
        _ => None,
    }
}

/// The rest-time buckets are a deliberate halving recurrence, not a mean:
/// each new observation pulls the bucket halfway toward itself, so later
/// observations weigh more. `avg_rest_time` carries the true mean instead.
fn fold_rest(buckets: &mut BTreeMap<String, f64>, key: &str, rest: f64) {
    buckets
        .entry(key.to_string())
        .and_modify(|b| *b = (*b + rest) / 2.0)
        .or_insert(rest);
}

fn trend_pct(current: f64, last: f64) -> Option<f64> {
    if current != 0.0 && last != 0.0 {
        Some((current - last) / last * 100.0)
    } else {
        None
    }
}

/// One workout's totals for a single exercise: heaviest set plus summed
/// volume across every set of that exercise in the workout.
#[derive(Default)]
struct WorkoutTotals {
    top_weight: f64,
    volume: f64,
    reps: u64,
}

/// Fold the workout log (and optionally the GTG session log) into a
/// statistics report.
///
/// Pure and deterministic: no I/O, no clock reads — `now` is injected once
/// so a long computation cannot drift across midnight. Tolerates any
/// workout ordering and any malformed record by counting it as "no
/// contribution" rather than failing; there is no error path.
pub fn compute(
    workouts: &[Workout],
    gtg_sessions: Option<&[GtgSession]>,
    window_days: u32,
    now: DateTime<Local>,
) -> StatisticsReport {
    let today = now.date_naive();
    let mut report = StatisticsReport::default();

    let mut windowed_workouts = 0u64;
    let mut duration_sum = 0i64;
    let mut duration_count = 0u64;
    let mut rest_sum = 0.0;
    let mut rest_count = 0u64;

    for workout in workouts {
        let age_days = (today - workout.date).num_days();
        // `date >= today - window`, except that a zero window excludes
        // everything (including today).
        let in_window = window_days > 0 && age_days <= i64::from(window_days);

        if in_window {
            windowed_workouts += 1;

            if let (Some(start), Some(end)) = (workout.start_time, workout.end_time) {
                let minutes = (end - start).num_minutes();
                // End before start is malformed input; leave it out of the
                // average entirely rather than dragging it to zero.
                if minutes > 0 {
                    duration_sum += minutes;
                    duration_count += 1;
                }
            }
        }

        // Per-exercise totals within this one workout. Entries of the same
        // exercise merge, so progression sees one contribution per workout.
        let mut by_exercise: BTreeMap<&str, WorkoutTotals> = BTreeMap::new();

        for entry in &workout.exercises {
            let name = entry.exercise.name.as_str();
            let muscle = entry.exercise.muscle.as_str();

            if in_window {
                // Frequency counts entries, not sets.
                *report.muscle_frequency.entry(muscle.to_string()).or_default() += 1;

                if let Some(rest) = entry.rest_time {
                    let rest = f64::from(rest);
                    fold_rest(&mut report.rest_time_by_exercise, name, rest);
                    fold_rest(&mut report.rest_time_by_muscle, muscle, rest);
                    rest_sum += rest;
                    rest_count += 1;
                }
            }

            let totals = by_exercise.entry(name).or_default();

            for set in &entry.sets {
                if let Some(weight) = set.weight {
                    totals.top_weight = totals.top_weight.max(weight);
                }

                // A set without recorded reps contributes to no volume
                // bucket. Recorded zero still passes through and adds zero.
                let Some(reps) = set.reps else { continue };

                if in_window {
                    report.total_reps += u64::from(reps);
                    *report.reps_by_exercise.entry(name.to_string()).or_default() +=
                        u64::from(reps);
                    *report.reps_by_muscle.entry(muscle.to_string()).or_default() +=
                        u64::from(reps);
                }
                totals.reps += u64::from(reps);

                if let Some(weight) = set.weight {
                    let volume = weight * f64::from(reps);
                    if in_window {
                        report.total_weight += volume;
                        *report.volume_by_exercise.entry(name.to_string()).or_default() +=
                            volume;
                        *report.volume_by_muscle.entry(muscle.to_string()).or_default() +=
                            volume;
                    }
                    totals.volume += volume;
                }
            }
        }

        // Progression ignores the selected window on purpose: the weekly
        // bands and personal bests always scan the whole log.
        let period = classify(age_days);
        for (name, totals) in by_exercise {
            let prog = report.progression.entry(name.to_string()).or_default();

            if let Some(period) = period {
                let bucket = match period {
                    Period::CurrentWeek => &mut prog.current_week,
                    Period::LastWeek => &mut prog.last_week,
                    Period::TwoWeeksAgo => &mut prog.two_weeks_ago,
                };
                bucket.weight = bucket.weight.max(totals.top_weight);
                bucket.volume = bucket.volume.max(totals.volume);
                bucket.reps = bucket.reps.max(totals.reps);
            }

            let pb = &mut prog.personal_best;
            pb.weight = pb.weight.max(totals.top_weight);
            pb.volume = pb.volume.max(totals.volume);
            pb.reps = pb.reps.max(totals.reps);
        }
    }

    for prog in report.progression.values_mut() {
        prog.trend = Trend {
            weight: trend_pct(prog.current_week.weight, prog.last_week.weight),
            volume: trend_pct(prog.current_week.volume, prog.last_week.volume),
            reps: trend_pct(prog.current_week.reps as f64, prog.last_week.reps as f64),
        };
    }

    if window_days > 0 {
        report.workouts_per_week = windowed_workouts as f64 / (f64::from(window_days) / 7.0);
    }
    if duration_count > 0 {
        report.avg_session_duration = duration_sum as f64 / duration_count as f64;
    }
    if rest_count > 0 {
        report.avg_rest_time = rest_sum / rest_count as f64;
    }

    report.gtg = gtg_sessions
        .filter(|sessions| !sessions.is_empty())
        .map(compute_gtg);

    report
}

fn compute_gtg(sessions: &[GtgSession]) -> GtgReport {
    let mut report = GtgReport::default();
    // (rate sum, sessions with a usable target) per exercise and overall.
    let mut rates: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    let mut total_rate = (0.0, 0u64);

    for session in sessions {
        let stats = report
            .by_exercise
            .entry(session.exercise.clone())
            .or_default();

        stats.sessions += 1;
        stats.total_sets += u64::from(session.sets_completed);
        report.total_sets += u64::from(session.sets_completed);

        let reps: u64 = session
            .sets
            .iter()
            .filter_map(|s| s.reps)
            .map(u64::from)
            .sum();
        stats.total_reps += reps;
        report.total_reps += reps;

        // A zero target cannot yield a completion rate; skip the session
        // from the mean instead of dividing by it.
        if session.target_sets > 0 {
            let rate =
                f64::from(session.sets_completed) / f64::from(session.target_sets) * 100.0;
            let per_ex = rates.entry(session.exercise.as_str()).or_insert((0.0, 0));
            per_ex.0 += rate;
            per_ex.1 += 1;
            total_rate.0 += rate;
            total_rate.1 += 1;
        }

        *report.sets_per_day.entry(session.date).or_default() +=
            u64::from(session.sets_completed);
    }

    for (name, (sum, count)) in rates {
        if let Some(stats) = report.by_exercise.get_mut(name) {
            stats.completion_rate = sum / count as f64;
        }
    }
    if total_rate.1 > 0 {
        report.completion_rate = total_rate.0 / total_rate.1 as f64;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseRef, GtgSet, SetEntry, Workout, WorkoutExercise};
    use crate::types::Category;
    use chrono::{Duration, NaiveTime, TimeZone};
    use itertools::Itertools;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn set(weight: Option<f64>, reps: Option<u32>) -> SetEntry {
        SetEntry {
            weight,
            reps,
            ..Default::default()
        }
    }

    fn entry(
        name: &str,
        muscle: &str,
        rest_time: Option<u32>,
        sets: Vec<SetEntry>,
    ) -> WorkoutExercise {
        WorkoutExercise {
            id: format!("entry-{name}"),
            exercise: ExerciseRef {
                name: name.to_string(),
                muscle: muscle.to_string(),
                category: Category::WeightReps,
            },
            sets,
            notes: None,
            rest_time,
        }
    }

    fn workout(days_ago: i64, exercises: Vec<WorkoutExercise>) -> Workout {
        Workout {
            id: format!("workout-{days_ago}"),
            name: "Training".to_string(),
            date: fixed_now().date_naive() - Duration::days(days_ago),
            start_time: None,
            end_time: None,
            exercises,
            notes: None,
            mood: None,
            final_mood: None,
        }
    }

    fn gtg_session(
        exercise: &str,
        days_ago: i64,
        target_sets: u32,
        sets_completed: u32,
        reps_per_set: u32,
    ) -> GtgSession {
        let date = fixed_now().date_naive() - Duration::days(days_ago);
        let sets = (0..sets_completed)
            .map(|i| GtgSet {
                id: format!("gtg-set-{i}"),
                timestamp: date.and_hms_opt(9 + i, 0, 0).unwrap(),
                reps: Some(reps_per_set),
                time: None,
                weight: None,
                notes: None,
            })
            .collect();

        GtgSession {
            id: format!("gtg-{exercise}-{days_ago}"),
            exercise: exercise.to_string(),
            date,
            start_time: None,
            interval_minutes: 60,
            target_sets,
            sets_completed,
            reps_per_set: Some(reps_per_set),
            time_per_set: None,
            weight: None,
            is_active: false,
            notes: None,
            sets,
        }
    }

    #[test]
    fn empty_log_yields_empty_report() {
        let report = compute(&[], None, 30, fixed_now());

        assert_eq!(report.total_reps, 0);
        assert_eq!(report.total_weight, 0.0);
        assert_eq!(report.workouts_per_week, 0.0);
        assert_eq!(report.avg_session_duration, 0.0);
        assert_eq!(report.avg_rest_time, 0.0);
        assert!(report.volume_by_exercise.is_empty());
        assert!(report.volume_by_muscle.is_empty());
        assert!(report.reps_by_exercise.is_empty());
        assert!(report.muscle_frequency.is_empty());
        assert!(report.rest_time_by_exercise.is_empty());
        assert!(report.progression.is_empty());
        assert!(report.gtg.is_none());
    }

    #[test]
    fn identical_inputs_yield_identical_reports() {
        let workouts = vec![
            workout(3, vec![entry("Bench Press", "chest", Some(90), vec![set(Some(100.0), Some(5))])]),
            workout(10, vec![entry("Squat", "legs", None, vec![set(Some(140.0), Some(3))])]),
        ];
        let sessions = vec![gtg_session("Pull-up", 2, 10, 6, 5)];

        let a = compute(&workouts, Some(&sessions), 30, fixed_now());
        let b = compute(&workouts, Some(&sessions), 30, fixed_now());

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn absent_fields_contribute_nothing() {
        let workouts = vec![workout(
            1,
            vec![entry(
                "Bench Press",
                "chest",
                None,
                vec![
                    // Weight without reps: no volume bucket is touched.
                    set(Some(5.0), None),
                    // Recorded zero reps is a real observation of zero.
                    set(Some(60.0), Some(0)),
                ],
            )],
        )];

        let report = compute(&workouts, None, 30, fixed_now());

        assert_eq!(report.total_reps, 0);
        assert_eq!(report.total_weight, 0.0);
        // The explicit zero created the bucket; the absent one did not.
        assert_eq!(report.reps_by_exercise.get("Bench Press"), Some(&0));
        assert_eq!(report.volume_by_exercise.get("Bench Press"), Some(&0.0));
        // Max single-set weight still sees every weighted set.
        assert_eq!(report.progression["Bench Press"].personal_best.weight, 60.0);
    }

    #[test]
    fn rest_time_uses_halving_recurrence() {
        let workouts = vec![workout(
            1,
            vec![
                entry("Bench Press", "chest", Some(60), vec![set(Some(80.0), Some(5))]),
                entry("Bench Press", "chest", Some(90), vec![set(Some(80.0), Some(5))]),
                entry("Bench Press", "chest", Some(30), vec![set(Some(80.0), Some(5))]),
            ],
        )];

        let report = compute(&workouts, None, 30, fixed_now());

        // 60 -> (60+90)/2 = 75 -> (75+30)/2 = 52.5, not the mean of 60.
        assert_eq!(report.rest_time_by_exercise["Bench Press"], 52.5);
        assert_eq!(report.rest_time_by_muscle["chest"], 52.5);
        // The overall average is the true mean.
        assert_eq!(report.avg_rest_time, 60.0);
    }

    #[test]
    fn muscle_frequency_counts_entries_not_sets() {
        let workouts = vec![workout(
            2,
            vec![
                entry(
                    "Squat",
                    "legs",
                    None,
                    vec![set(Some(100.0), Some(5)), set(Some(100.0), Some(5)), set(Some(100.0), Some(5))],
                ),
                entry("Leg Press", "legs", None, vec![set(Some(180.0), Some(8))]),
            ],
        )];

        let report = compute(&workouts, None, 30, fixed_now());

        assert_eq!(report.muscle_frequency["legs"], 2);
    }

    #[test]
    fn bench_press_week_over_week() {
        let workouts = vec![
            workout(3, vec![entry("Bench Press", "chest", None, vec![set(Some(100.0), Some(5))])]),
            workout(10, vec![entry("Bench Press", "chest", None, vec![set(Some(90.0), Some(5))])]),
        ];

        let report = compute(&workouts, None, 30, fixed_now());
        let prog = &report.progression["Bench Press"];

        assert_eq!(prog.current_week.weight, 100.0);
        assert_eq!(prog.last_week.weight, 90.0);
        assert_eq!(prog.personal_best.weight, 100.0);
        assert!((prog.trend.weight.unwrap() - 11.11).abs() < 0.01);
        // Same reps both weeks: a real trend of exactly zero is reported
        // as no trend only when a period itself is zero; 5 vs 5 is 0%.
        assert_eq!(prog.trend.reps, Some(0.0));
        assert_eq!(prog.current_week.volume, 500.0);
        assert_eq!(prog.last_week.volume, 450.0);
    }

    #[test]
    fn trend_is_absent_on_zero_baseline() {
        // Only trained this week: no last-week baseline.
        let workouts = vec![workout(
            2,
            vec![entry("Deadlift", "back", None, vec![set(Some(180.0), Some(3))])],
        )];

        let report = compute(&workouts, None, 30, fixed_now());
        let trend = report.progression["Deadlift"].trend;

        assert!(trend.weight.is_none());
        assert!(trend.volume.is_none());
        assert!(trend.reps.is_none());
    }

    #[test]
    fn personal_best_outlives_the_weekly_bands() {
        let workouts = vec![
            workout(40, vec![entry("Squat", "legs", None, vec![set(Some(150.0), Some(1))])]),
            workout(2, vec![entry("Squat", "legs", None, vec![set(Some(120.0), Some(5))])]),
        ];

        let report = compute(&workouts, None, 7, fixed_now());
        let prog = &report.progression["Squat"];

        assert_eq!(prog.personal_best.weight, 150.0);
        assert_eq!(prog.current_week.weight, 120.0);
        // 40 days old: outside every band.
        assert_eq!(prog.last_week, PeriodBests::default());
        assert_eq!(prog.two_weeks_ago, PeriodBests::default());
        // And outside the 7-day window.
        assert!(report.volume_by_exercise["Squat"] < 150.0 * 1.0 + 120.0 * 5.0);
    }

    #[test]
    fn personal_best_is_order_independent() {
        let base = vec![
            workout(2, vec![entry("Squat", "legs", None, vec![set(Some(120.0), Some(5))])]),
            workout(12, vec![entry("Squat", "legs", None, vec![set(Some(130.0), Some(3))])]),
            workout(40, vec![entry("Squat", "legs", None, vec![set(Some(150.0), Some(1))])]),
        ];

        for perm in base.iter().cloned().permutations(base.len()) {
            let report = compute(&perm, None, 30, fixed_now());
            let prog = &report.progression["Squat"];
            assert_eq!(prog.personal_best.weight, 150.0);
            assert_eq!(prog.current_week.weight, 120.0);
            assert_eq!(prog.last_week.weight, 130.0);
        }
    }

    #[test]
    fn same_exercise_entries_merge_per_workout() {
        // Two entries of the same exercise in one workout count as one
        // workout-level volume, not two competing ones.
        let workouts = vec![workout(
            2,
            vec![
                entry("Squat", "legs", None, vec![set(Some(100.0), Some(5))]),
                entry("Squat", "legs", None, vec![set(Some(100.0), Some(5))]),
            ],
        )];

        let report = compute(&workouts, None, 30, fixed_now());

        assert_eq!(report.progression["Squat"].current_week.volume, 1000.0);
        assert_eq!(report.progression["Squat"].current_week.reps, 10);
    }

    #[test]
    fn widening_the_window_never_loses_volume() {
        let workouts = vec![
            workout(3, vec![entry("Row", "back", None, vec![set(Some(60.0), Some(10))])]),
            workout(20, vec![entry("Row", "back", None, vec![set(Some(55.0), Some(10))])]),
            workout(80, vec![entry("Row", "back", None, vec![set(Some(50.0), Some(10))])]),
        ];

        let mut last_reps = 0;
        let mut last_weight = 0.0;
        for days in [7, 30, 90] {
            let report = compute(&workouts, None, days, fixed_now());
            assert!(report.total_reps >= last_reps);
            assert!(report.total_weight >= last_weight);
            last_reps = report.total_reps;
            last_weight = report.total_weight;
        }
    }

    #[test]
    fn zero_window_excludes_everything() {
        let workouts = vec![workout(
            0,
            vec![entry("Bench Press", "chest", Some(60), vec![set(Some(100.0), Some(5))])],
        )];

        let report = compute(&workouts, None, 0, fixed_now());

        assert_eq!(report.total_reps, 0);
        assert_eq!(report.workouts_per_week, 0.0);
        assert!(report.volume_by_exercise.is_empty());
        assert!(report.rest_time_by_exercise.is_empty());
        // The whole-log views still see the workout.
        assert_eq!(report.progression["Bench Press"].personal_best.weight, 100.0);
    }

    #[test]
    fn session_metrics_skip_partial_timestamps() {
        let mut with_times = workout(1, vec![]);
        with_times.start_time = NaiveTime::from_hms_opt(10, 0, 0);
        with_times.end_time = NaiveTime::from_hms_opt(11, 0, 0);

        let mut missing_end = workout(2, vec![]);
        missing_end.start_time = NaiveTime::from_hms_opt(18, 0, 0);

        let mut inverted = workout(3, vec![]);
        inverted.start_time = NaiveTime::from_hms_opt(12, 0, 0);
        inverted.end_time = NaiveTime::from_hms_opt(11, 0, 0);

        let workouts = vec![with_times, missing_end, inverted];
        let report = compute(&workouts, None, 7, fixed_now());

        // Only the fully-timed, positive-duration workout counts.
        assert_eq!(report.avg_session_duration, 60.0);
        // But all three are windowed workouts: 3 / (7/7).
        assert_eq!(report.workouts_per_week, 3.0);
    }

    #[test]
    fn gtg_report_summarizes_sessions() {
        let sessions = vec![
            gtg_session("Pull-up", 1, 10, 5, 5),
            gtg_session("Pull-up", 2, 10, 10, 5),
            // Malformed zero target: sets still count, rate does not.
            gtg_session("Push-up", 1, 0, 4, 20),
        ];

        let report = compute(&[], Some(&sessions), 30, fixed_now());
        let gtg = report.gtg.expect("sessions present");

        assert_eq!(gtg.total_sets, 19);
        assert_eq!(gtg.total_reps, 5 * 5 + 10 * 5 + 4 * 20);
        assert_eq!(gtg.completion_rate, 75.0);

        let pull_up = &gtg.by_exercise["Pull-up"];
        assert_eq!(pull_up.sessions, 2);
        assert_eq!(pull_up.total_sets, 15);
        assert_eq!(pull_up.completion_rate, 75.0);
        assert_eq!(gtg.by_exercise["Push-up"].completion_rate, 0.0);

        // Two sessions on the same calendar day merge.
        let day = fixed_now().date_naive() - Duration::days(1);
        assert_eq!(gtg.sets_per_day[&day], 5 + 4);
    }

    #[test]
    fn gtg_report_absent_without_sessions() {
        assert!(compute(&[], None, 30, fixed_now()).gtg.is_none());
        assert!(compute(&[], Some(&[]), 30, fixed_now()).gtg.is_none());
    }
}
