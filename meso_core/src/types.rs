//! Core domain types for the mesocycle planner.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise templates and implements (reference data)
//! - Progression schedules and day templates (program definition)
//! - Compiled sets, exercise blocks and routines (compiler output)

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// Reference Data
// ============================================================================

/// Physical equipment category of an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Implement {
    Dumbbell,
    Smith,
    Machine,
    Barbell,
    Other(String),
}

impl Implement {
    /// Derive the implement from a template title, falling back to the
    /// equipment field of the template export.
    pub fn classify(title: &str, equipment: Option<&str>) -> Self {
        let title = title.to_lowercase();
        if title.contains("dumbbell") {
            return Implement::Dumbbell;
        }
        if title.contains("smith machine") {
            return Implement::Smith;
        }
        if title.contains("machine") {
            return Implement::Machine;
        }
        if title.contains("barbell") {
            return Implement::Barbell;
        }

        match equipment.map(|e| e.trim().to_lowercase()) {
            Some(e) if e == "dumbbell" => Implement::Dumbbell,
            Some(e) if e == "smith" || e == "smith_machine" => Implement::Smith,
            Some(e) if e == "machine" => Implement::Machine,
            Some(e) if e == "barbell" => Implement::Barbell,
            Some(e) => Implement::Other(e),
            None => Implement::Other("unknown".into()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Implement::Dumbbell => "dumbbell",
            Implement::Smith => "smith",
            Implement::Machine => "machine",
            Implement::Barbell => "barbell",
            Implement::Other(name) => name,
        }
    }
}

/// One exercise from the remote service's template catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseTemplate {
    pub id: String,
    pub title: String,
    pub implement: Implement,
    pub primary_muscle_group: String,
    #[serde(default)]
    pub secondary_muscle_groups: BTreeSet<String>,
}

// ============================================================================
// Program Definition
// ============================================================================

/// Kind of a set as understood by the remote service
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SetType {
    Warmup,
    #[default]
    Normal,
    Failure,
}

impl SetType {
    /// Whether sets of this kind count toward training volume
    pub fn is_working(self) -> bool {
        matches!(self, SetType::Normal | SetType::Failure)
    }
}

/// Inclusive rep range
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepRange {
    pub start: u32,
    pub end: u32,
}

/// Rep target written either as `10` or as `[8, 12]`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RepTarget {
    Fixed(u32),
    Range([u32; 2]),
}

impl RepTarget {
    pub fn start(self) -> u32 {
        match self {
            RepTarget::Fixed(n) => n,
            RepTarget::Range([start, _]) => start,
        }
    }

    pub fn end(self) -> u32 {
        match self {
            RepTarget::Fixed(n) => n,
            RepTarget::Range([_, end]) => end,
        }
    }

    pub fn as_range(self) -> RepRange {
        RepRange {
            start: self.start(),
            end: self.end(),
        }
    }
}

/// One row of a training week's main-lift schedule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionEntry {
    #[serde(rename = "type", default)]
    pub set_type: SetType,
    /// Fraction of the one-rep-max
    pub pct: f64,
    pub reps: RepTarget,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    /// Goal text for failure sets ("aim 10")
    #[serde(default)]
    pub target: Option<String>,
}

/// A named week of the mesocycle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingWeek {
    pub name: String,
    pub main_sets: Vec<ProgressionEntry>,
    /// Number of sets every accessory exercise gets this week (0 = none)
    #[serde(default)]
    pub accessory_sets: u32,
}

impl TrainingWeek {
    /// Main sets that count toward volume (warmups excluded)
    pub fn working_set_count(&self) -> usize {
        self.main_sets
            .iter()
            .filter(|s| s.set_type.is_working())
            .count()
    }
}

/// What an accessory exercise asks for on each set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessoryTarget {
    Reps(RepTarget),
    Duration(u32),
}

/// Per-exercise parameters, decided when the program is loaded
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "ExerciseEntrySpec")]
pub enum ExerciseParams {
    /// Percentage-based lift driven by the week's progression schedule
    MainLift {
        one_rm: f64,
        superset_id: Option<u32>,
    },
    /// Fixed homogeneous sets repeated `accessory_sets` times
    Accessory {
        target: AccessoryTarget,
        rest_seconds: u32,
        note: Option<String>,
        superset_id: Option<u32>,
    },
}

impl ExerciseParams {
    pub fn superset_id(&self) -> Option<u32> {
        match self {
            ExerciseParams::MainLift { superset_id, .. }
            | ExerciseParams::Accessory { superset_id, .. } => *superset_id,
        }
    }
}

/// Raw on-disk shape of an exercise entry
#[derive(Debug, Deserialize)]
struct ExerciseEntrySpec {
    one_rm: Option<f64>,
    reps: Option<RepTarget>,
    duration_seconds: Option<u32>,
    rest_seconds: Option<u32>,
    note: Option<String>,
    superset_id: Option<u32>,
}

impl TryFrom<ExerciseEntrySpec> for ExerciseParams {
    type Error = String;

    fn try_from(spec: ExerciseEntrySpec) -> std::result::Result<Self, Self::Error> {
        if let Some(one_rm) = spec.one_rm {
            if spec.reps.is_some() || spec.duration_seconds.is_some() {
                return Err("a main lift (one_rm) cannot also set reps or duration_seconds".into());
            }
            return Ok(ExerciseParams::MainLift {
                one_rm,
                superset_id: spec.superset_id,
            });
        }

        let target = match (spec.reps, spec.duration_seconds) {
            (Some(reps), None) => AccessoryTarget::Reps(reps),
            (None, Some(secs)) => AccessoryTarget::Duration(secs),
            (Some(_), Some(_)) => {
                return Err("accessory sets either reps or duration_seconds, not both".into())
            }
            (None, None) => {
                return Err("exercise needs one_rm, reps or duration_seconds".into());
            }
        };

        Ok(ExerciseParams::Accessory {
            target,
            rest_seconds: spec.rest_seconds.unwrap_or(0),
            note: spec.note,
            superset_id: spec.superset_id,
        })
    }
}

/// An exercise slot in a training day, in program order
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ExerciseEntry {
    pub title: String,
    #[serde(flatten)]
    pub params: ExerciseParams,
}

/// A training day: ordered exercises
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DayTemplate {
    pub name: String,
    pub exercises: Vec<ExerciseEntry>,
}

// ============================================================================
// Compiled Output
// ============================================================================

/// What one compiled set asks for
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SetTarget {
    Reps(u32),
    RepRange(RepRange),
    DurationSeconds(u32),
}

/// One concrete set in the remote write schema
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CompiledSet {
    #[serde(rename = "type")]
    pub set_type: SetType,
    #[serde(flatten)]
    pub target: SetTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
}

/// Ordered sets for one exercise instance within a day
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExerciseBlock {
    pub exercise_template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superset_id: Option<u32>,
    pub rest_seconds: u32,
    pub notes: String,
    pub sets: Vec<CompiledSet>,
}

/// A compiled routine for one (week, day) pair
#[derive(Clone, Debug, PartialEq)]
pub struct Routine {
    pub title: String,
    /// Unknown until the destination folder has been resolved
    pub folder_id: Option<u64>,
    pub notes: String,
    pub exercises: Vec<ExerciseBlock>,
}

impl Routine {
    /// Routine title for a (week, day) pair
    pub fn title_for(week: &str, day: &str) -> String {
        format!("{} — {}", week, day)
    }

    pub fn with_folder(&self, folder_id: u64) -> Routine {
        Routine {
            folder_id: Some(folder_id),
            ..self.clone()
        }
    }
}

/// A day of a compiled week
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledDay {
    pub name: String,
    pub routine: Routine,
}

/// A compiled week: only days that produced at least one block
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledWeek {
    pub name: String,
    pub days: Vec<CompiledDay>,
}

/// Data-quality problem found while compiling
#[derive(Clone, Debug, PartialEq)]
pub struct CompileWarning {
    pub week: String,
    pub day: String,
    pub exercise: String,
    pub message: String,
}

/// Full compiler output
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CompiledPlan {
    pub weeks: Vec<CompiledWeek>,
    pub warnings: Vec<CompileWarning>,
}

impl CompiledPlan {
    pub fn week(&self, name: &str) -> Option<&CompiledWeek> {
        self.weeks.iter().find(|w| w.name == name)
    }

    /// All routines in week then day order
    pub fn routines(&self) -> impl Iterator<Item = &Routine> {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter().map(|d| &d.routine))
    }
}

// ============================================================================
// Remote Resources
// ============================================================================

/// A routine folder on the remote service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    pub id: u64,
    pub title: String,
}

/// Remote ids arrive as strings or bare numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

/// Deserialize a string-or-number id into its string form
pub(crate) fn deserialize_remote_id<'de, D>(
    deserializer: D,
) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// A routine as it appears in the remote listing
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RemoteRoutine {
    #[serde(deserialize_with = "deserialize_remote_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub folder_id: Option<u64>,
}
