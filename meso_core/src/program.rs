//! Program definition loading.
//!
//! A program is a mesocycle (ordered training weeks, each with its own
//! main-lift schedule) plus the training days every week runs through.

use crate::{
    AccessoryTarget, DayTemplate, Error, ExerciseParams, ProgressionEntry, RepTarget, Result,
    SetType, TrainingWeek,
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Upper bound on repeated accessory sets per exercise in a week
pub const MAX_ACCESSORY_SETS: u32 = 20;

/// Built-in ten-rep mesocycle, built once
static TEN_REP_MESOCYCLE: Lazy<Vec<TrainingWeek>> = Lazy::new(build_ten_rep_mesocycle);

/// Get a reference to the built-in ten-rep mesocycle
pub fn ten_rep_mesocycle() -> &'static [TrainingWeek] {
    &TEN_REP_MESOCYCLE
}

/// A complete program definition
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Program {
    #[serde(default = "default_weeks")]
    pub weeks: Vec<TrainingWeek>,
    pub days: Vec<DayTemplate>,
}

fn default_weeks() -> Vec<TrainingWeek> {
    ten_rep_mesocycle().to_vec()
}

impl Program {
    /// Run the given days through the built-in mesocycle
    pub fn with_default_mesocycle(days: Vec<DayTemplate>) -> Self {
        Self {
            weeks: default_weeks(),
            days,
        }
    }

    /// Parse a TOML program definition and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let program: Program = toml::from_str(contents)?;
        let errors = program.validate();
        if !errors.is_empty() {
            return Err(Error::Program(errors.join("; ")));
        }
        Ok(program)
    }

    /// Load a program definition from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let program = Self::from_toml_str(&contents)?;
        tracing::info!(
            "Loaded program from {:?}: {} weeks x {} days",
            path,
            program.weeks.len(),
            program.days.len()
        );
        Ok(program)
    }

    /// Validate the program for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.weeks.is_empty() {
            errors.push("Program has no weeks".to_string());
        }
        if self.days.is_empty() {
            errors.push("Program has no days".to_string());
        }

        let mut week_names = HashSet::new();
        for week in &self.weeks {
            if !week_names.insert(week.name.as_str()) {
                errors.push(format!("Duplicate week name '{}'", week.name));
            }
            if week.accessory_sets > MAX_ACCESSORY_SETS {
                errors.push(format!(
                    "Week '{}': accessory_sets {} exceeds {}",
                    week.name, week.accessory_sets, MAX_ACCESSORY_SETS
                ));
            }
            for (i, entry) in week.main_sets.iter().enumerate() {
                validate_entry(&week.name, i, entry, &mut errors);
            }
        }

        let mut day_names = HashSet::new();
        for day in &self.days {
            if !day_names.insert(day.name.as_str()) {
                errors.push(format!("Duplicate day name '{}'", day.name));
            }
            for exercise in &day.exercises {
                match &exercise.params {
                    ExerciseParams::MainLift { one_rm, .. } => {
                        if !one_rm.is_finite() || *one_rm < 0.0 {
                            errors.push(format!(
                                "Day '{}': '{}' has invalid one_rm {}",
                                day.name, exercise.title, one_rm
                            ));
                        }
                    }
                    ExerciseParams::Accessory {
                        target: AccessoryTarget::Reps(reps),
                        ..
                    } => {
                        if reps.start() > reps.end() {
                            errors.push(format!(
                                "Day '{}': '{}' rep range {}-{} is reversed",
                                day.name,
                                exercise.title,
                                reps.start(),
                                reps.end()
                            ));
                        }
                    }
                    ExerciseParams::Accessory { .. } => {}
                }
            }
        }

        errors
    }
}

fn validate_entry(week: &str, index: usize, entry: &ProgressionEntry, errors: &mut Vec<String>) {
    if !(entry.pct > 0.0 && entry.pct <= 1.5) {
        errors.push(format!(
            "Week '{}' set {}: pct {} outside (0, 1.5]",
            week,
            index + 1,
            entry.pct
        ));
    }
    if entry.reps.start() > entry.reps.end() {
        errors.push(format!(
            "Week '{}' set {}: rep range is reversed",
            week,
            index + 1
        ));
    }
    if entry.set_type != SetType::Failure && matches!(entry.reps, RepTarget::Range(_)) {
        errors.push(format!(
            "Week '{}' set {}: only failure sets take a rep range",
            week,
            index + 1
        ));
    }
}

fn set(set_type: SetType, pct: f64, reps: u32, rest_seconds: u32) -> ProgressionEntry {
    ProgressionEntry {
        set_type,
        pct,
        reps: RepTarget::Fixed(reps),
        rest_seconds: Some(rest_seconds),
        target: None,
    }
}

fn amrap(pct: f64, range: [u32; 2], goal: &str, rest_seconds: u32) -> ProgressionEntry {
    ProgressionEntry {
        set_type: SetType::Failure,
        pct,
        reps: RepTarget::Range(range),
        rest_seconds: Some(rest_seconds),
        target: Some(goal.to_string()),
    }
}

fn week(name: &str, main_sets: Vec<ProgressionEntry>, accessory_sets: u32) -> TrainingWeek {
    TrainingWeek {
        name: name.to_string(),
        main_sets,
        accessory_sets,
    }
}

fn build_ten_rep_mesocycle() -> Vec<TrainingWeek> {
    let warmups = || vec![set(SetType::Warmup, 0.40, 10, 90); 2];
    let with_warmups = |work: Vec<ProgressionEntry>| {
        let mut sets = warmups();
        sets.extend(work);
        sets
    };

    vec![
        week(
            "1RM Estimation Week",
            vec![
                set(SetType::Warmup, 0.40, 15, 90),
                set(SetType::Warmup, 0.40, 12, 90),
                set(SetType::Normal, 0.55, 10, 120),
                set(SetType::Normal, 0.60, 10, 150),
                amrap(0.80, [8, 12], "10", 180),
            ],
            0,
        ),
        week(
            "W1",
            with_warmups(vec![set(SetType::Normal, 0.60, 10, 150); 5]),
            3,
        ),
        week(
            "W2",
            with_warmups(vec![set(SetType::Normal, 0.65, 10, 150); 4]),
            3,
        ),
        week(
            "W3",
            with_warmups(vec![set(SetType::Normal, 0.70, 10, 150); 3]),
            3,
        ),
        week(
            "W4",
            with_warmups(vec![
                set(SetType::Normal, 0.50, 10, 120),
                set(SetType::Normal, 0.65, 10, 150),
                amrap(0.74, [8, 12], "10", 180),
            ]),
            3,
        ),
        week(
            "Deload Week",
            with_warmups(vec![set(SetType::Normal, 0.50, 10, 150); 2]),
            2,
        ),
    ]
}
