use once_cell::sync::Lazy;
use std::{
    collections::{BTreeMap, HashSet},
    fmt::Display,
    path::Path,
};
use strsim::jaro_winkler;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;

#[derive(Clone, Debug, ValueEnum, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Muscle {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    Cardio,
    Other,
}

impl Display for Muscle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Chest => "chest",
            Self::Back => "back",
            Self::Legs => "legs",
            Self::Shoulders => "shoulders",
            Self::Arms => "arms",
            Self::Core => "core",
            Self::Cardio => "cardio",
            Self::Other => "other",
        };

        write!(f, "{}", s)
    }
}

/// How a set for this exercise is normally recorded. The statistics engine
/// does not enforce the category; it only looks at which fields are present.
#[derive(Clone, Debug, ValueEnum, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    WeightReps,
    WeightTime,
    BodyweightReps,
    BodyweightTime,
    Cardio,
    Other,
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WeightReps => "weight-reps",
            Self::WeightTime => "weight-time",
            Self::BodyweightReps => "bodyweight-reps",
            Self::BodyweightTime => "bodyweight-time",
            Self::Cardio => "cardio",
            Self::Other => "other",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Bad,
    Terrible,
}

impl Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Great => "great",
            Self::Good => "good",
            Self::Neutral => "neutral",
            Self::Bad => "bad",
            Self::Terrible => "terrible",
        };

        write!(f, "{}", s)
    }
}

pub static ALLOWED_MUSCLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "chest",
        "back",
        "legs",
        "shoulders",
        "arms",
        "core",
        "cardio",
        "other",
    ])
});

/// Returns the canonical lowercase muscle name or `None` if not allowed.
pub fn canonical_muscle<S: AsRef<str>>(m: S) -> Option<String> {
    let raw = m.as_ref();
    assert!(raw.chars().all(|c| !c.is_control()), "received control chars in muscle name: {raw:?}");

    let m = raw.to_ascii_lowercase();
    if ALLOWED_MUSCLES.contains(m.as_str()) {
        Some(m)
    } else {
        None
    }
}

/// Return the closest allowed muscle for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
/// Otherwise return `None` (no suggestion shown).
pub fn best_muscle_suggestion(input: &str) -> Option<&'static str> {
    assert!(!ALLOWED_MUSCLES.is_empty(), "ALLOWED_MUSCLES must contain at least one entry");

    let inp = input.to_ascii_lowercase();
    assert!(!inp.trim().is_empty(), "best_muscle_suggestion called with empty input"); // Sanity check.

    // Collect (muscle, score) pairs.
    let mut scores: Vec<(&'static str, f64)> = ALLOWED_MUSCLES
        .iter()
        .copied()
        .map(|m| (m, jaro_winkler(&inp, m)))
        .collect();

    // Highest score first.
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    let (best_muscle, best_score) = scores[0];
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best_muscle)
    } else {
        None
    }
}

//
// Output format
//

/// Selected by the global `--json` flag.
#[derive(Clone, Copy, Debug)]
pub enum OutputFmt {
    Text,
    Json,
}

/// Print `value` as pretty JSON, or run the plain-text closure.
pub fn emit<T: Serialize>(fmt: OutputFmt, value: &T, text: impl FnOnce()) -> Result<()> {
    match fmt {
        OutputFmt::Json => {
            let s = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
            println!("{}", s);
        }
        OutputFmt::Text => text(),
    }

    Ok(())
}

//
// Config
//

/// Flat key/value config persisted as TOML.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub map: BTreeMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// Parsed integer config value, `None` if unset or not a number.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.map.get(key).and_then(|v| v.parse().ok())
    }
}

/// Exercise definition as it appears in a TOML import file.
#[derive(Deserialize)]
pub struct ExerciseDef {
    pub name: String,
    pub description: Option<String>,
    pub muscle: String,
    pub category: Option<Category>,
}

#[derive(Deserialize)]
pub struct ExerciseImport {
    pub exercise: Vec<ExerciseDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_muscle_is_case_insensitive() {
        assert_eq!(canonical_muscle("Chest"), Some("chest".to_string()));
        assert_eq!(canonical_muscle("SHOULDERS"), Some("shoulders".to_string()));
        assert_eq!(canonical_muscle("quadriceps"), None);
    }

    #[test]
    fn suggestion_close_match() {
        assert_eq!(best_muscle_suggestion("shoulderz"), Some("shoulders"));
        assert_eq!(best_muscle_suggestion("xyzzy"), None);
    }
}
