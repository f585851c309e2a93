//! Plan compiler: program definition in, routines out.
//!
//! Walks weeks, then days, then exercises, all in program order. Pure and
//! deterministic: no network, no clock, no randomness.

use crate::catalog::Catalog;
use crate::config::EquipmentConfig;
use crate::expand::{expand_accessory, expand_main_lift};
use crate::program::Program;
use crate::rounding::Rounder;
use crate::{
    CompileWarning, CompiledDay, CompiledPlan, CompiledWeek, DayTemplate, Error, ExerciseBlock,
    ExerciseParams, Result, Routine, TrainingWeek,
};

/// Notes attached to every compiled routine
pub const ROUTINE_NOTES: &str = "Auto-generated gym routine";

/// Compiles programs against an exercise catalog and equipment setup
pub struct PlanCompiler<'a> {
    catalog: &'a Catalog,
    rounder: Rounder<'a>,
}

impl<'a> PlanCompiler<'a> {
    pub fn new(catalog: &'a Catalog, equipment: &'a EquipmentConfig) -> Self {
        Self {
            catalog,
            rounder: Rounder::new(equipment),
        }
    }

    /// Compile every (week, day) pair of the program
    ///
    /// Days that compile to zero blocks are left out of the plan. Rounding
    /// problems are collected in `CompiledPlan::warnings`.
    pub fn compile(&self, program: &Program) -> Result<CompiledPlan> {
        let errors = program.validate();
        if !errors.is_empty() {
            return Err(Error::Program(errors.join("; ")));
        }

        let mut plan = CompiledPlan::default();

        for week in &program.weeks {
            let mut compiled_week = CompiledWeek {
                name: week.name.clone(),
                days: Vec::new(),
            };

            for day in &program.days {
                let exercises = self.compile_day(week, day, &mut plan.warnings)?;

                if exercises.is_empty() {
                    tracing::info!(
                        "Skipping day '{}' in week '{}': empty exercise list",
                        day.name,
                        week.name
                    );
                    continue;
                }

                compiled_week.days.push(CompiledDay {
                    name: day.name.clone(),
                    routine: Routine {
                        title: Routine::title_for(&week.name, &day.name),
                        folder_id: None,
                        notes: ROUTINE_NOTES.to_string(),
                        exercises,
                    },
                });
            }

            tracing::debug!(
                "Compiled week '{}': {} routines",
                week.name,
                compiled_week.days.len()
            );
            plan.weeks.push(compiled_week);
        }

        for warning in &plan.warnings {
            tracing::warn!(
                "{} / {} / {}: {}",
                warning.week,
                warning.day,
                warning.exercise,
                warning.message
            );
        }

        Ok(plan)
    }

    fn compile_day(
        &self,
        week: &TrainingWeek,
        day: &DayTemplate,
        warnings: &mut Vec<CompileWarning>,
    ) -> Result<Vec<ExerciseBlock>> {
        let mut blocks = Vec::new();

        for exercise in &day.exercises {
            let template = self.catalog.require(&exercise.title)?;

            match &exercise.params {
                ExerciseParams::MainLift {
                    one_rm,
                    superset_id,
                } => {
                    let expanded = expand_main_lift(
                        template,
                        *one_rm,
                        &week.main_sets,
                        &self.rounder,
                        *superset_id,
                    );
                    warnings.extend(expanded.warnings.into_iter().map(|message| {
                        CompileWarning {
                            week: week.name.clone(),
                            day: day.name.clone(),
                            exercise: exercise.title.clone(),
                            message,
                        }
                    }));
                    if !expanded.block.sets.is_empty() {
                        blocks.push(expanded.block);
                    }
                }
                ExerciseParams::Accessory {
                    target,
                    rest_seconds,
                    note,
                    superset_id,
                } => {
                    if let Some(block) = expand_accessory(
                        template,
                        *target,
                        *rest_seconds,
                        note.as_deref(),
                        *superset_id,
                        week.accessory_sets,
                    ) {
                        blocks.push(block);
                    }
                }
            }
        }

        Ok(blocks)
    }
}
