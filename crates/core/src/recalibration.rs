//! Recompute stored measurements after a calibration change
//!
//! Values are always rebuilt from the stored normalized points, so repeated
//! recalibration never compounds error. Measurements are independent and are
//! processed in parallel; one failure is logged and reported without
//! affecting the rest of the batch.

use rayon::prelude::*;

use crate::calibration::ScaleContext;
use crate::cutout::{apply_cutouts, CutoutTarget};
use crate::geometry::MeasurementCalculator;
use crate::measurement::{Measurement, MeasurementId, MeasurementShape, MeasurementUpdate};
use crate::scope::{resolve, Calibration};

/// A measurement that could not be recomputed
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecalculationFailure {
    pub id: MeasurementId,
    pub reason: String,
}

/// Outcome of a recalculation batch
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecalculationReport {
    /// Updates in input order (counts are never included)
    pub updates: Vec<MeasurementUpdate>,
    /// Measurements left untouched because they could not be computed
    pub failures: Vec<RecalculationFailure>,
}

impl RecalculationReport {
    /// Whether every measurement was recomputed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Updated(MeasurementUpdate),
    Skipped,
    Failed(RecalculationFailure),
}

/// Recompute every non-count measurement under a new scale
pub fn recalculate(
    calculator: &MeasurementCalculator,
    measurements: &[Measurement],
    scale: &ScaleContext,
) -> RecalculationReport {
    let outcomes: Vec<Outcome> = measurements
        .par_iter()
        .map(|measurement| recalculate_one(calculator, measurement, scale))
        .collect();

    let mut report = RecalculationReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Updated(update) => report.updates.push(update),
            Outcome::Skipped => {}
            Outcome::Failed(failure) => {
                log::warn!("skipping measurement {}: {}", failure.id, failure.reason);
                report.failures.push(failure);
            }
        }
    }

    log::debug!(
        "recalculated {} measurement(s) at {} {}/px, {} failed",
        report.updates.len(),
        scale.scale_factor,
        scale.unit,
        report.failures.len()
    );
    report
}

fn recalculate_one(
    calculator: &MeasurementCalculator,
    measurement: &Measurement,
    scale: &ScaleContext,
) -> Outcome {
    let target = match &measurement.shape {
        MeasurementShape::Count { .. } => return Outcome::Skipped,
        MeasurementShape::Linear { .. } => None,
        MeasurementShape::Area { .. } => Some(CutoutTarget::Area),
        MeasurementShape::Volume { depth, .. } => Some(CutoutTarget::Volume { depth: *depth }),
    };

    let result = measurement.calculate(calculator, scale);
    if !result.is_valid() {
        return Outcome::Failed(RecalculationFailure {
            id: measurement.id,
            reason: result.validation.errors.join("; "),
        });
    }

    let mut validation = result.validation;
    let net_calculated_value = match target {
        Some(target) if !measurement.shape.cutouts().is_empty() => {
            let resolution = apply_cutouts(
                calculator,
                result.calculated_value,
                target,
                measurement.shape.cutouts(),
                scale,
            );
            validation.merge(resolution.validation);
            Some(resolution.net_value)
        }
        _ => None,
    };
    if !validation.is_valid {
        return Outcome::Failed(RecalculationFailure {
            id: measurement.id,
            reason: validation.errors.join("; "),
        });
    }

    log::trace!(
        "measurement {} -> {} {}",
        measurement.id,
        result.calculated_value,
        result.unit
    );

    Outcome::Updated(MeasurementUpdate {
        id: measurement.id,
        calculated_value: result.calculated_value,
        unit: result.unit,
        perimeter_value: result.perimeter_value,
        area_value: result.area_value,
        net_calculated_value,
        warnings: validation.warnings,
    })
}

/// Measurements whose effective calibration is `changed`
///
/// A page calibration reaches only its page. A document calibration reaches
/// every page of the sheet that has no page calibration of its own.
/// `calibrations` must already include `changed`.
pub fn measurements_in_scope<'a>(
    measurements: &'a [Measurement],
    calibrations: &[Calibration],
    changed: &Calibration,
) -> Vec<&'a Measurement> {
    measurements
        .iter()
        .filter(|m| m.project_id == changed.project_id && m.sheet_id == changed.sheet_id)
        .filter(|m| {
            resolve(calibrations, m.project_id, m.sheet_id, m.page_number)
                .is_some_and(|effective| effective.same_key(changed))
        })
        .collect()
}
