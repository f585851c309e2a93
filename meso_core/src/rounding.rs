//! Equipment-aware load rounding.
//!
//! Turns a target load into something that can actually be loaded:
//! - Dumbbells: split across two hands, per-hand discrete increments
//! - Plate-loaded bars (smith machine, optionally barbell): bar weight plus a
//!   greedy per-side plate breakdown, with any unmatched remainder reported
//! - Anything else: no load, plus a warning naming the implement

use crate::config::{EquipmentConfig, PlateConfig};
use crate::Implement;

/// Tolerance for floating-point drift in load arithmetic
const EPSILON: f64 = 1e-6;

/// Round to two decimals, the resolution plates are labelled in
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Dumbbell rounding result
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DumbbellLoad {
    pub total: f64,
    pub per_hand: f64,
}

/// Round a per-hand dumbbell load: 1 kg floor, 1 kg steps below 10 kg,
/// 2 kg steps from 10 kg up.
pub fn round_dumbbell_per_hand(x: f64) -> f64 {
    if x <= 1.0 {
        1.0
    } else if x < 10.0 {
        x.round()
    } else {
        (x / 2.0).round() * 2.0
    }
}

/// Round a total dumbbell load (both hands)
pub fn round_dumbbell_total(total: f64) -> DumbbellLoad {
    let per_hand = round_dumbbell_per_hand(total / 2.0);
    DumbbellLoad {
        total: 2.0 * per_hand,
        per_hand,
    }
}

/// Plates needed on one side, plus whatever could not be matched
#[derive(Clone, Debug, PartialEq)]
pub struct PlateBreakdown {
    /// Plates in descending order
    pub plates: Vec<f64>,
    /// Weight no plate combination covered
    pub residual: f64,
}

impl PlateBreakdown {
    pub fn has_residual(&self) -> bool {
        self.residual > EPSILON
    }
}

/// Greedy largest-first decomposition of a per-side load
pub fn plate_breakdown(per_side: f64, plates: &[f64]) -> PlateBreakdown {
    let mut available: Vec<f64> = plates.iter().copied().filter(|p| *p > 0.0).collect();
    available.sort_by(|a, b| b.total_cmp(a));

    let mut remaining = round2(per_side + 1e-9);
    let mut out = Vec::new();

    for plate in available {
        if remaining <= 1e-9 {
            break;
        }
        let count = ((remaining + EPSILON) / plate).floor() as usize;
        if count > 0 {
            out.extend(std::iter::repeat(plate).take(count));
            remaining = round2(remaining - count as f64 * plate);
        }
    }

    PlateBreakdown {
        plates: out,
        residual: remaining.max(0.0),
    }
}

/// Render a breakdown as "20 + 10x2 + 2.5", or "none"
pub fn format_plates(plates: &[f64]) -> String {
    if plates.is_empty() {
        return "none".into();
    }

    let mut groups: Vec<(f64, usize)> = Vec::new();
    for plate in plates {
        match groups.iter_mut().find(|(p, _)| (*p - plate).abs() < EPSILON) {
            Some((_, count)) => *count += 1,
            None => groups.push((*plate, 1)),
        }
    }
    groups.sort_by(|a, b| b.0.total_cmp(&a.0));

    groups
        .into_iter()
        .map(|(plate, count)| {
            if count > 1 {
                format!("{}x{}", plate, count)
            } else {
                format!("{}", plate)
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Plate-loaded rounding result
#[derive(Clone, Debug, PartialEq)]
pub struct PlateLoad {
    pub total: f64,
    pub per_side: f64,
    pub breakdown: PlateBreakdown,
}

/// Round a total load on a fixed bar to the nearest per-side step
pub fn round_plate_loaded_total(target: f64, config: &PlateConfig) -> PlateLoad {
    if target <= config.bar + EPSILON {
        return PlateLoad {
            total: config.bar,
            per_side: 0.0,
            breakdown: PlateBreakdown {
                plates: Vec::new(),
                residual: 0.0,
            },
        };
    }

    let desired_side = (target - config.bar) / 2.0;
    let per_side = if config.step > 0.0 {
        round2((desired_side / config.step).round() * config.step)
    } else {
        round2(desired_side)
    };
    let total = round2(config.bar + 2.0 * per_side);
    let breakdown = plate_breakdown(per_side, &config.plates);

    PlateLoad {
        total,
        per_side,
        breakdown,
    }
}

/// A realizable load and the note explaining it
#[derive(Clone, Debug, PartialEq)]
pub struct RoundedLoad {
    pub weight_kg: Option<f64>,
    pub note: String,
    /// Set when the operator must act before uploading
    pub warning: Option<String>,
}

/// Rounds loads for the implements configured in [`EquipmentConfig`]
#[derive(Clone, Debug)]
pub struct Rounder<'a> {
    equipment: &'a EquipmentConfig,
}

impl<'a> Rounder<'a> {
    pub fn new(equipment: &'a EquipmentConfig) -> Self {
        Self { equipment }
    }

    /// Round `target` kg for the given implement
    pub fn round(&self, target: f64, implement: &Implement) -> RoundedLoad {
        match implement {
            Implement::Dumbbell => {
                let load = round_dumbbell_total(target);
                RoundedLoad {
                    weight_kg: Some(load.total),
                    note: format!(
                        "DBs {:.0} kg/hand or total {:.0} (~{:.1}).",
                        load.per_hand, load.total, target
                    ),
                    warning: None,
                }
            }
            Implement::Smith => self.round_plate_loaded(target, "Smith", &self.equipment.smith),
            Implement::Barbell => match &self.equipment.barbell {
                Some(config) => self.round_plate_loaded(target, "Barbell", config),
                None => unsupported(implement),
            },
            other => unsupported(other),
        }
    }

    fn round_plate_loaded(&self, target: f64, label: &str, config: &PlateConfig) -> RoundedLoad {
        let load = round_plate_loaded_total(target, config);
        let mut note = format!(
            "{} total {:.1} (bar {:.1} + {:.2}/side). Plates/side: {}. Rounded from {:.1}.",
            label,
            load.total,
            config.bar,
            load.per_side,
            format_plates(&load.breakdown.plates),
            target
        );

        let warning = if load.breakdown.has_residual() {
            let message = format!(
                "unmatched {:.2}kg: adjust plate set",
                load.breakdown.residual
            );
            note.push_str(&format!(" ({})", message));
            Some(message)
        } else {
            None
        };

        RoundedLoad {
            weight_kg: Some(load.total),
            note,
            warning,
        }
    }
}

fn unsupported(implement: &Implement) -> RoundedLoad {
    let message = format!("Unknown implement '{}'.", implement.name());
    RoundedLoad {
        weight_kg: None,
        note: message.clone(),
        warning: Some(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smith() -> PlateConfig {
        EquipmentConfig::default().smith
    }

    #[test]
    fn test_dumbbell_exact_multiple() {
        let load = round_dumbbell_total(100.0);
        assert_eq!(load.total, 100.0);
        assert_eq!(load.per_hand, 50.0);
    }

    #[test]
    fn test_dumbbell_rounding_bands() {
        assert_eq!(round_dumbbell_per_hand(0.3), 1.0);
        assert_eq!(round_dumbbell_per_hand(1.0), 1.0);
        assert_eq!(round_dumbbell_per_hand(7.4), 7.0);
        assert_eq!(round_dumbbell_per_hand(9.6), 10.0);
        assert_eq!(round_dumbbell_per_hand(12.9), 12.0);
        assert_eq!(round_dumbbell_per_hand(13.1), 14.0);
    }

    #[test]
    fn test_dumbbell_totals_are_realizable() {
        let mut target = 0.0;
        while target < 200.0 {
            let load = round_dumbbell_total(target);
            assert_eq!(load.total, 2.0 * load.per_hand);
            assert_eq!(load.per_hand.fract(), 0.0, "target {}", target);
            if load.per_hand >= 10.0 {
                assert_eq!(load.per_hand % 2.0, 0.0, "target {}", target);
            } else {
                assert!(load.per_hand >= 1.0);
            }
            target += 0.7;
        }
    }

    #[test]
    fn test_smith_scenario() {
        let load = round_plate_loaded_total(61.0, &smith());
        assert_eq!(load.per_side, 25.0);
        assert!((load.total - 61.3).abs() < 1e-9);
        assert_eq!(load.breakdown.plates, vec![20.0, 5.0]);
        assert_eq!(load.breakdown.residual, 0.0);
    }

    #[test]
    fn test_smith_at_or_below_bar() {
        for target in [0.0, 5.0, 11.3] {
            let load = round_plate_loaded_total(target, &smith());
            assert_eq!(load.total, 11.3);
            assert_eq!(load.per_side, 0.0);
            assert!(load.breakdown.plates.is_empty());
            assert_eq!(load.breakdown.residual, 0.0);
        }
    }

    #[test]
    fn test_plate_breakdown_is_idempotent() {
        let plates = smith().plates;
        for per_side in [1.25, 3.75, 17.5, 26.25, 41.25, 58.75] {
            let first = plate_breakdown(per_side, &plates);
            let summed: f64 = first.plates.iter().sum();
            let second = plate_breakdown(summed, &plates);
            assert_eq!(first.plates, second.plates);
        }
    }

    #[test]
    fn test_plate_breakdown_reports_residual() {
        let breakdown = plate_breakdown(3.0, &[2.5, 1.25]);
        assert_eq!(breakdown.plates, vec![2.5]);
        assert!((breakdown.residual - 0.5).abs() < 1e-9);
        assert!(breakdown.has_residual());
    }

    #[test]
    fn test_residual_surfaces_as_warning() {
        let equipment = EquipmentConfig {
            smith: PlateConfig {
                bar: 10.0,
                step: 1.0,
                plates: vec![20.0, 10.0, 5.0],
            },
            barbell: None,
        };
        let rounded = Rounder::new(&equipment).round(24.0, &Implement::Smith);
        assert_eq!(rounded.weight_kg, Some(24.0));
        assert!(rounded.note.contains("unmatched 2.00kg"));
        assert!(rounded.warning.is_some());
    }

    #[test]
    fn test_format_plates() {
        assert_eq!(format_plates(&[]), "none");
        assert_eq!(format_plates(&[20.0, 5.0]), "20 + 5");
        assert_eq!(format_plates(&[20.0, 10.0, 10.0, 2.5]), "20 + 10x2 + 2.5");
    }

    #[test]
    fn test_unknown_implement_has_no_load() {
        let equipment = EquipmentConfig::default();
        let rounder = Rounder::new(&equipment);

        let rounded = rounder.round(80.0, &Implement::Machine);
        assert_eq!(rounded.weight_kg, None);
        assert_eq!(rounded.note, "Unknown implement 'machine'.");

        let rounded = rounder.round(80.0, &Implement::Barbell);
        assert_eq!(rounded.weight_kg, None);
        assert!(rounded.note.contains("barbell"));
    }

    #[test]
    fn test_barbell_uses_configured_plates() {
        let equipment = EquipmentConfig {
            barbell: Some(PlateConfig {
                bar: 20.0,
                step: 2.5,
                plates: vec![20.0, 10.0, 5.0, 2.5],
            }),
            ..EquipmentConfig::default()
        };
        let rounded = Rounder::new(&equipment).round(100.0, &Implement::Barbell);
        assert_eq!(rounded.weight_kg, Some(100.0));
        assert!(rounded.note.starts_with("Barbell total 100.0"));
        assert!(rounded.warning.is_none());
    }

    #[test]
    fn test_dumbbell_note() {
        let equipment = EquipmentConfig::default();
        let rounded = Rounder::new(&equipment).round(41.0, &Implement::Dumbbell);
        assert_eq!(rounded.weight_kg, Some(40.0));
        assert_eq!(rounded.note, "DBs 20 kg/hand or total 40 (~41.0).");
    }
}
