//! Set expansion for a single exercise instance.
//!
//! Main lifts get one set per progression entry with a rounded load;
//! accessories get `accessory_sets` identical sets.

use crate::rounding::Rounder;
use crate::{
    AccessoryTarget, CompiledSet, ExerciseBlock, ExerciseTemplate, ProgressionEntry, RepTarget,
    SetTarget, SetType,
};

/// A compiled block plus any warnings raised while rounding its loads
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandedBlock {
    pub block: ExerciseBlock,
    pub warnings: Vec<String>,
}

/// Format a rest period as minutes: "2 min", "1.5 min"
pub fn format_rest(seconds: u32) -> String {
    if seconds == 0 {
        return String::new();
    }
    if seconds % 60 == 0 {
        format!("{} min", seconds / 60)
    } else {
        format!("{:.1} min", f64::from(seconds) / 60.0)
    }
}

fn percent(pct: f64) -> i64 {
    (pct * 100.0).round() as i64
}

/// Expand a percentage-based lift against the week's schedule
pub fn expand_main_lift(
    template: &ExerciseTemplate,
    one_rm: f64,
    schedule: &[ProgressionEntry],
    rounder: &Rounder<'_>,
    superset_id: Option<u32>,
) -> ExpandedBlock {
    let mut sets = Vec::with_capacity(schedule.len());
    let mut note_lines = Vec::with_capacity(schedule.len());
    let mut warnings = Vec::new();
    let mut max_rest = 0;

    for entry in schedule {
        let target = one_rm * entry.pct;
        let rounded = rounder.round(target, &template.implement);
        if let Some(warning) = rounded.warning {
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }

        let (set_target, mut line) = match entry.set_type {
            SetType::Failure => {
                let goal = entry.target.as_deref().unwrap_or("");
                (
                    SetTarget::RepRange(entry.reps.as_range()),
                    format!(
                        "AMRAP @ {}% (aim {}). {}",
                        percent(entry.pct),
                        goal,
                        rounded.note
                    ),
                )
            }
            SetType::Warmup | SetType::Normal => {
                let reps = entry.reps.start();
                (
                    SetTarget::Reps(reps),
                    format!("{} reps @ {}%. {}", reps, percent(entry.pct), rounded.note),
                )
            }
        };

        if let Some(rest) = entry.rest_seconds.filter(|r| *r > 0) {
            line.push_str(&format!(" Rest {}.", format_rest(rest)));
            max_rest = max_rest.max(rest);
        }

        note_lines.push(line);
        sets.push(CompiledSet {
            set_type: entry.set_type,
            target: set_target,
            weight_kg: rounded.weight_kg,
        });
    }

    ExpandedBlock {
        block: ExerciseBlock {
            exercise_template_id: template.id.clone(),
            superset_id,
            rest_seconds: max_rest,
            notes: note_lines.join("\n"),
            sets,
        },
        warnings,
    }
}

/// Expand an accessory exercise into `slots` identical sets
///
/// Returns `None` when the week programs no accessory work.
pub fn expand_accessory(
    template: &ExerciseTemplate,
    target: AccessoryTarget,
    rest_seconds: u32,
    note: Option<&str>,
    superset_id: Option<u32>,
    slots: u32,
) -> Option<ExerciseBlock> {
    if slots == 0 {
        return None;
    }

    let mut bits = Vec::new();
    let set_target = match target {
        AccessoryTarget::Reps(reps) => {
            bits.push(format!("Target reps: {}–{}", reps.start(), reps.end()));
            match reps {
                RepTarget::Range([start, end]) if start != end => {
                    SetTarget::RepRange(reps.as_range())
                }
                _ => SetTarget::Reps(reps.start()),
            }
        }
        AccessoryTarget::Duration(seconds) => SetTarget::DurationSeconds(seconds),
    };

    if let Some(note) = note.filter(|n| !n.is_empty()) {
        bits.push(note.to_string());
    }
    if rest_seconds > 0 {
        bits.push(format!("Rest {}.", format_rest(rest_seconds)));
    }

    let set = CompiledSet {
        set_type: SetType::Normal,
        target: set_target,
        weight_kg: None,
    };

    Some(ExerciseBlock {
        exercise_template_id: template.id.clone(),
        superset_id,
        rest_seconds,
        notes: bits.join(" | "),
        sets: vec![set; slots as usize],
    })
}
