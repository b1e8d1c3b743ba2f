//! Net values for areas and volumes with cutouts
//!
//! Each cutout is measured with the same area path as its parent, under the
//! same scale. Volume cutouts use the parent's depth. The net value is
//! rounded once, after subtraction.

use crate::calibration::ScaleContext;
use crate::geometry::{check_scale, GeometryError, MeasurementCalculator};
use crate::measurement::Cutout;
use crate::units::round2;
use crate::validation::ValidationResult;

/// Parent shape the cutouts are subtracted from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoutTarget {
    Area,
    Volume { depth: f64 },
}

/// Net value and the contribution of each cutout
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CutoutResolution {
    /// Gross minus cutouts, floored at zero, rounded to 2 decimals
    pub net_value: f64,
    /// Value of each cutout in input order (0 for skipped cutouts)
    pub per_cutout_values: Vec<f64>,
    pub validation: ValidationResult,
}

impl CutoutResolution {
    fn failed(error: GeometryError, cutout_count: usize) -> Self {
        Self {
            net_value: 0.0,
            per_cutout_values: vec![0.0; cutout_count],
            validation: ValidationResult::failed(error.to_string()),
        }
    }
}

/// Subtract cutouts from a parent value
///
/// Cutouts whose points cannot be measured contribute nothing and add a
/// warning. An unusable scale or a non-positive volume depth is an error and
/// yields a zero net value.
pub fn apply_cutouts(
    calculator: &MeasurementCalculator,
    shape_value: f64,
    target: CutoutTarget,
    cutouts: &[Cutout],
    scale: &ScaleContext,
) -> CutoutResolution {
    if let Err(e) = check_scale(scale) {
        return CutoutResolution::failed(e, cutouts.len());
    }
    if let CutoutTarget::Volume { depth } = target {
        if !depth.is_finite() || depth <= 0.0 {
            return CutoutResolution::failed(GeometryError::InvalidDepth(depth), cutouts.len());
        }
    }

    let mut validation = ValidationResult::valid();
    let per_cutout_values: Vec<f64> = cutouts
        .iter()
        .map(|cutout| {
            let area = calculator.area(&cutout.points, scale);
            if !area.is_valid() {
                validation.warn(format!(
                    "Cutout {} skipped: {}",
                    cutout.id,
                    area.validation.errors.join("; ")
                ));
                return 0.0;
            }
            match target {
                CutoutTarget::Area => area.calculated_value,
                CutoutTarget::Volume { depth } => area.calculated_value * depth,
            }
        })
        .collect();

    let removed: f64 = per_cutout_values.iter().sum();
    if removed > shape_value {
        validation.warn(format!(
            "Cutouts ({removed:.2}) exceed the measured value ({shape_value:.2}); net value clamped to zero"
        ));
    }

    CutoutResolution {
        net_value: round2((shape_value - removed).max(0.0)),
        per_cutout_values,
        validation,
    }
}
