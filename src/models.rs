use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::types::{Category, Mood};

/// A logged workout: one calendar day's training, with optional wall-clock
/// start/end times. An active workout has `end_time = None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub exercises: Vec<WorkoutExercise>,
    pub notes: Option<String>,
    pub mood: Option<Mood>,
    pub final_mood: Option<Mood>,
}

/// One exercise performed within a workout, in logged order.
/// Rest time is a single between-sets value for the whole entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub id: String,
    pub exercise: ExerciseRef,
    pub sets: Vec<SetEntry>,
    pub notes: Option<String>,
    pub rest_time: Option<u32>,
}

/// Embedded exercise definition snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRef {
    pub name: String,
    pub muscle: String,
    pub category: Category,
}

/// A single set. Every metric is optional; which ones get recorded depends
/// on the exercise category. An absent field means "not recorded" and must
/// never be read as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetEntry {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub duration: Option<u32>,
    pub distance: Option<f64>,
    pub calories: Option<u32>,
    pub notes: Option<String>,
}

/// A grease-the-groove session: spaced single sets of one exercise across
/// the day, logged against a target set count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GtgSession {
    pub id: String,
    pub exercise: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub interval_minutes: u32,
    pub target_sets: u32,
    pub sets_completed: u32,
    pub reps_per_set: Option<u32>,
    pub time_per_set: Option<u32>,
    pub weight: Option<f64>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub sets: Vec<GtgSet>,
}

/// One completed GTG set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GtgSet {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub reps: Option<u32>,
    pub time: Option<u32>,
    pub weight: Option<f64>,
    pub notes: Option<String>,
}
