//! Weekly volume and frequency per muscle group.
//!
//! Working sets (normal and failure) count fully toward an exercise's
//! primary muscle group and at a fractional weight toward each secondary
//! group. Frequency is the number of days in the week touching a muscle.

use crate::catalog::Catalog;
use crate::config::AnalysisConfig;
use crate::{CompiledWeek, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

/// Default weight of a set for a secondary muscle group
pub const SECONDARY_WEIGHT: f64 = 0.5;

/// Per-muscle weighted set counts and training frequency
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MuscleReport {
    pub volume: BTreeMap<String, f64>,
    pub frequency: BTreeMap<String, u32>,
}

#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    muscle_group: &'a str,
    weighted_sets: f64,
    days_per_week: u32,
}

impl MuscleReport {
    /// Write one row per muscle group, overwriting `path`
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        let muscles: BTreeSet<&String> =
            self.volume.keys().chain(self.frequency.keys()).collect();
        for muscle in &muscles {
            writer.serialize(CsvRow {
                muscle_group: muscle,
                weighted_sets: self.volume.get(*muscle).copied().unwrap_or(0.0),
                days_per_week: self.frequency.get(*muscle).copied().unwrap_or(0),
            })?;
        }

        writer.flush()?;
        tracing::info!("Wrote {} muscle groups to {:?}", muscles.len(), path);
        Ok(())
    }
}

/// Analyze a week with the default secondary weight
pub fn analyze_week(week: &CompiledWeek, catalog: &Catalog) -> MuscleReport {
    analyze_week_weighted(week, catalog, SECONDARY_WEIGHT)
}

/// Analyze a week with the configured secondary weight
pub fn analyze_week_with_config(
    week: &CompiledWeek,
    catalog: &Catalog,
    config: &AnalysisConfig,
) -> MuscleReport {
    analyze_week_weighted(week, catalog, config.secondary_weight)
}

/// Analyze a week with an explicit secondary weight
pub fn analyze_week_weighted(
    week: &CompiledWeek,
    catalog: &Catalog,
    secondary_weight: f64,
) -> MuscleReport {
    let mut report = MuscleReport::default();

    for day in &week.days {
        let mut muscles_today = BTreeSet::new();

        for block in &day.routine.exercises {
            let Some(template) = catalog.get_by_id(&block.exercise_template_id) else {
                tracing::warn!(
                    "Template {} not in catalog; left out of volume",
                    block.exercise_template_id
                );
                continue;
            };

            let sets = block
                .sets
                .iter()
                .filter(|s| s.set_type.is_working())
                .count() as f64;
            if sets == 0.0 {
                continue;
            }

            *report
                .volume
                .entry(template.primary_muscle_group.clone())
                .or_insert(0.0) += sets;
            muscles_today.insert(template.primary_muscle_group.clone());

            for secondary in &template.secondary_muscle_groups {
                *report.volume.entry(secondary.clone()).or_insert(0.0) +=
                    sets * secondary_weight;
                muscles_today.insert(secondary.clone());
            }
        }

        for muscle in muscles_today {
            *report.frequency.entry(muscle).or_insert(0) += 1;
        }
    }

    report
}
