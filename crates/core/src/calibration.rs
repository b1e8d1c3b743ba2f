//! Two-point scale calibration
//!
//! The user clicks two points on a drawing and types the real distance
//! between them. The pixel distance between the clicks (measured with the
//! same transform used for drawing) yields a scale factor in real units per
//! pixel. Dubious results are returned with warnings so the caller can ask
//! for confirmation; impossible results are rejected.

use crate::config::CalibrationThresholds;
use crate::coordinate::{to_pixel, NormalizedPoint, Viewport};
use crate::units::{canonical_unit, CALIBRATION_UNITS};
use crate::validation::ValidationResult;

/// Scale information every geometry calculation requires
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleContext {
    /// Real-world units per pixel (> 0)
    pub scale_factor: f64,
    /// Linear unit the scale factor yields (e.g. "ft")
    pub unit: String,
    /// Reliability of the scale (0.0-1.0)
    pub confidence: f64,
    /// Unrotated page width in pixels when the scale was derived
    pub viewport_width: f64,
    /// Unrotated page height in pixels when the scale was derived
    pub viewport_height: f64,
}

impl ScaleContext {
    /// Create a new scale context
    pub fn new(
        scale_factor: f64,
        unit: impl Into<String>,
        confidence: f64,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Self {
        Self {
            scale_factor,
            unit: unit.into(),
            confidence,
            viewport_width,
            viewport_height,
        }
    }

    /// Same scale with a different confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Reasons a calibration is rejected outright
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("known distance must be a positive number, got {0}")]
    InvalidKnownDistance(f64),

    #[error("calibration unit is missing")]
    MissingUnit,

    #[error("viewport dimensions {width}x{height} are not usable for calibration")]
    InvalidViewport { width: f64, height: f64 },

    #[error("calibration points must be finite numbers")]
    NonFinitePoint,

    #[error("calibration points are {pixel_distance}px apart; cannot divide by a zero pixel distance")]
    DegeneratePoints { pixel_distance: f64 },

    #[error("scale factor {0} is not a finite number")]
    NonFiniteScale(f64),

    #[error("scale factor {0} is extremely small; check the known distance and points")]
    ScaleTooSmall(f64),

    #[error("scale factor {0} is extremely large; check the known distance and points")]
    ScaleTooLarge(f64),

    #[error("calibration accuracy {accuracy:.3} is too low, recalibrate")]
    AccuracyTooLow { accuracy: f64 },
}

/// Successful calibration with any warnings to confirm
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationOutcome {
    /// Scale to use for geometry on this page or document
    pub scale_context: ScaleContext,
    /// Pixel distance between the two clicked points
    pub pixel_distance: f64,
    /// Round-trip accuracy (1.0 = exact)
    pub accuracy: f64,
    /// Rotation the points were clicked at
    pub rotation: u16,
    /// Soft findings the user must acknowledge
    pub warnings: Vec<String>,
}

impl CalibrationOutcome {
    /// Whether the caller must ask the user to confirm before saving
    pub fn requires_confirmation(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Validation view of this outcome
    pub fn validation(&self) -> ValidationResult {
        ValidationResult {
            is_valid: true,
            warnings: self.warnings.clone(),
            errors: Vec::new(),
        }
    }
}

/// Derives scale factors under a set of thresholds
#[derive(Debug, Clone, Default)]
pub struct ScaleCalibrator {
    thresholds: CalibrationThresholds,
}

impl ScaleCalibrator {
    /// Create a calibrator with custom thresholds
    pub fn new(thresholds: CalibrationThresholds) -> Self {
        Self { thresholds }
    }

    /// Get the thresholds in use
    pub fn thresholds(&self) -> &CalibrationThresholds {
        &self.thresholds
    }

    /// Derive a scale factor from two clicked points and a known distance
    ///
    /// `base_viewport` is the page as displayed when the points were clicked,
    /// including its rotation. The returned scale context carries the
    /// unrotated page size, which is what geometry measures against.
    ///
    /// # Errors
    /// Returns `CalibrationError` for invalid input or a scale factor or
    /// accuracy outside the hard bounds. No scale is produced in that case.
    pub fn derive(
        &self,
        p1: NormalizedPoint,
        p2: NormalizedPoint,
        known_distance: f64,
        unit: &str,
        base_viewport: &Viewport,
    ) -> Result<CalibrationOutcome, CalibrationError> {
        let t = &self.thresholds;

        if !known_distance.is_finite() || known_distance <= 0.0 {
            return Err(CalibrationError::InvalidKnownDistance(known_distance));
        }
        if unit.trim().is_empty() {
            return Err(CalibrationError::MissingUnit);
        }
        if !base_viewport.has_valid_dimensions() {
            return Err(CalibrationError::InvalidViewport {
                width: base_viewport.width,
                height: base_viewport.height,
            });
        }
        if !p1.is_finite() || !p2.is_finite() {
            return Err(CalibrationError::NonFinitePoint);
        }

        let pixel_distance = to_pixel(p1, base_viewport).distance_to(&to_pixel(p2, base_viewport));
        if !pixel_distance.is_finite() || pixel_distance <= 0.0 {
            return Err(CalibrationError::DegeneratePoints { pixel_distance });
        }

        let scale_factor = known_distance / pixel_distance;
        if !scale_factor.is_finite() {
            return Err(CalibrationError::NonFiniteScale(scale_factor));
        }
        if scale_factor < t.min_scale_factor {
            log::warn!("rejecting calibration: scale factor {scale_factor} below {}", t.min_scale_factor);
            return Err(CalibrationError::ScaleTooSmall(scale_factor));
        }
        if scale_factor > t.max_scale_factor {
            log::warn!("rejecting calibration: scale factor {scale_factor} above {}", t.max_scale_factor);
            return Err(CalibrationError::ScaleTooLarge(scale_factor));
        }

        let mut warnings = Vec::new();
        if scale_factor < t.warn_small_scale_factor {
            warnings.push(format!(
                "Scale factor {scale_factor:.6} is very small; verify the known distance"
            ));
        } else if scale_factor > t.warn_large_scale_factor {
            warnings.push(format!(
                "Scale factor {scale_factor:.2} is very large; verify the known distance"
            ));
        }

        let test_distance = pixel_distance * scale_factor;
        let accuracy = 1.0 - (test_distance - known_distance).abs() / known_distance;
        if accuracy < t.min_accuracy {
            log::warn!("rejecting calibration: accuracy {accuracy:.3} below {}", t.min_accuracy);
            return Err(CalibrationError::AccuracyTooLow { accuracy });
        }
        if accuracy < t.warn_accuracy {
            warnings.push(format!(
                "Calibration accuracy {:.1}% is marginal; consider recalibrating",
                accuracy * 100.0
            ));
        }

        let pixels_per_unit = 1.0 / scale_factor;
        if pixels_per_unit < t.min_pixels_per_unit || pixels_per_unit > t.max_pixels_per_unit {
            warnings.push(format!(
                "{pixels_per_unit:.2} pixels per {unit} is outside the expected resolution range"
            ));
        }

        if scale_factor < t.typical_min_scale_factor || scale_factor > t.typical_max_scale_factor {
            warnings.push(format!(
                "Scale factor {scale_factor:.6} is outside the typical architectural range ({} to {})",
                t.typical_min_scale_factor, t.typical_max_scale_factor
            ));
        }

        let unit = canonical_unit(unit);
        if !CALIBRATION_UNITS.contains(&unit.as_str()) {
            warnings.push(format!(
                "Unit \"{unit}\" is not a standard calibration unit ({})",
                CALIBRATION_UNITS.join(", ")
            ));
        }

        log::debug!(
            "derived scale {scale_factor} {unit}/px from {pixel_distance:.2}px at {}°, {} warning(s)",
            base_viewport.rotation,
            warnings.len()
        );

        // Geometry works on unrotated pages, so store the page's own axes
        let (page_width, page_height) = base_viewport.page_dimensions();
        Ok(CalibrationOutcome {
            scale_context: ScaleContext::new(
                scale_factor,
                unit,
                t.calibrated_confidence,
                page_width,
                page_height,
            ),
            pixel_distance,
            accuracy,
            rotation: base_viewport.rotation,
            warnings,
        })
    }
}

/// Derive a scale factor with the default thresholds
///
/// # Example
/// ```
/// use takeoff_core::{derive_scale, NormalizedPoint, Viewport};
///
/// let viewport = Viewport::new(1000.0, 800.0);
/// let outcome = derive_scale(
///     NormalizedPoint::new(0.1, 0.5),
///     NormalizedPoint::new(0.9, 0.5),
///     20.0,
///     "ft",
///     &viewport,
/// )
/// .unwrap();
/// assert!((outcome.scale_context.scale_factor - 0.025).abs() < 1e-12);
/// assert!(!outcome.requires_confirmation());
/// ```
pub fn derive_scale(
    p1: NormalizedPoint,
    p2: NormalizedPoint,
    known_distance: f64,
    unit: &str,
    base_viewport: &Viewport,
) -> Result<CalibrationOutcome, CalibrationError> {
    ScaleCalibrator::default().derive(p1, p2, known_distance, unit, base_viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::SUPPORTED_ROTATIONS;
    use crate::geometry::MeasurementCalculator;
    use approx::assert_relative_eq;

    fn page() -> Viewport {
        Viewport::new(1000.0, 800.0)
    }

    #[test]
    fn test_horizontal_calibration() {
        let outcome = derive_scale(
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
            20.0,
            "ft",
            &page(),
        )
        .unwrap();

        assert_relative_eq!(outcome.pixel_distance, 800.0, max_relative = 1e-12);
        assert_relative_eq!(outcome.scale_context.scale_factor, 0.025, max_relative = 1e-12);
        assert_relative_eq!(outcome.accuracy, 1.0, max_relative = 1e-12);
        assert!(outcome.warnings.is_empty());
        assert!(outcome.scale_context.confidence >= 0.9);
        assert_eq!(outcome.scale_context.unit, "ft");
        assert_eq!(outcome.scale_context.viewport_width, 1000.0);
        assert_eq!(outcome.scale_context.viewport_height, 800.0);
    }

    #[test]
    fn test_rotated_page_uses_displayed_orientation() {
        // A vertical pair on a page shown at 90° spans the horizontal pixel axis.
        let outcome = derive_scale(
            NormalizedPoint::new(0.5, 0.1),
            NormalizedPoint::new(0.5, 0.9),
            20.0,
            "ft",
            &page().with_rotation(90),
        )
        .unwrap();

        assert_relative_eq!(outcome.pixel_distance, 800.0, max_relative = 1e-12);
        assert_relative_eq!(outcome.scale_context.scale_factor, 0.025, max_relative = 1e-12);
        assert_eq!(outcome.rotation, 90);
        assert_eq!(outcome.scale_context.viewport_width, 800.0);
        assert_eq!(outcome.scale_context.viewport_height, 1000.0);
    }

    #[test]
    fn test_calibration_line_remeasures_at_every_rotation() {
        let calc = MeasurementCalculator::default();
        let pairs = [
            (NormalizedPoint::new(0.5, 0.1), NormalizedPoint::new(0.5, 0.9)),
            (NormalizedPoint::new(0.1, 0.5), NormalizedPoint::new(0.9, 0.5)),
            (NormalizedPoint::new(0.2, 0.3), NormalizedPoint::new(0.7, 0.8)),
        ];

        for rotation in SUPPORTED_ROTATIONS {
            for (p1, p2) in pairs {
                let outcome =
                    derive_scale(p1, p2, 20.0, "ft", &page().with_rotation(rotation)).unwrap();
                let line = calc.linear(&[p1, p2], &outcome.scale_context);

                assert!(line.is_valid());
                assert_relative_eq!(line.calculated_value, 20.0, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_identical_points_are_rejected() {
        let p = NormalizedPoint::new(0.4, 0.4);
        let err = derive_scale(p, p, 10.0, "ft", &page()).unwrap_err();
        assert_eq!(err, CalibrationError::DegeneratePoints { pixel_distance: 0.0 });
        assert!(err.to_string().contains("divide"));
    }

    #[test]
    fn test_invalid_known_distance() {
        let p1 = NormalizedPoint::new(0.1, 0.1);
        let p2 = NormalizedPoint::new(0.2, 0.1);
        assert!(matches!(
            derive_scale(p1, p2, 0.0, "ft", &page()),
            Err(CalibrationError::InvalidKnownDistance(_))
        ));
        assert!(matches!(
            derive_scale(p1, p2, f64::NAN, "ft", &page()),
            Err(CalibrationError::InvalidKnownDistance(_))
        ));
    }

    #[test]
    fn test_missing_viewport_and_unit() {
        let p1 = NormalizedPoint::new(0.1, 0.1);
        let p2 = NormalizedPoint::new(0.2, 0.1);
        assert!(matches!(
            derive_scale(p1, p2, 5.0, "ft", &Viewport::new(0.0, 800.0)),
            Err(CalibrationError::InvalidViewport { .. })
        ));
        assert_eq!(
            derive_scale(p1, p2, 5.0, "  ", &page()),
            Err(CalibrationError::MissingUnit)
        );
    }

    #[test]
    fn test_extreme_scale_factors_are_errors() {
        let p1 = NormalizedPoint::new(0.1, 0.5);
        let p2 = NormalizedPoint::new(0.9, 0.5);

        // 0.001 / 800px
        assert!(matches!(
            derive_scale(p1, p2, 0.001, "ft", &page()),
            Err(CalibrationError::ScaleTooSmall(_))
        ));
        // 10_000_000 / 800px
        assert!(matches!(
            derive_scale(p1, p2, 10_000_000.0, "ft", &page()),
            Err(CalibrationError::ScaleTooLarge(_))
        ));
    }

    #[test]
    fn test_small_scale_warns_but_succeeds() {
        // 0.4 / 800px = 0.0005 units per pixel
        let outcome = derive_scale(
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
            0.4,
            "ft",
            &page(),
        )
        .unwrap();

        assert!(outcome.requires_confirmation());
        // too small, resolution (2000 px/unit), outside typical range
        assert_eq!(outcome.warnings.len(), 3);
        assert!(outcome.validation().is_valid);
    }

    #[test]
    fn test_large_scale_warns() {
        // 1_600_000 / 800px = 2000 units per pixel
        let outcome = derive_scale(
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
            1_600_000.0,
            "ft",
            &page(),
        )
        .unwrap();

        assert!(outcome.warnings.iter().any(|w| w.contains("very large")));
        assert!(outcome.warnings.iter().any(|w| w.contains("resolution")));
        assert!(outcome.warnings.iter().any(|w| w.contains("typical architectural")));
    }

    #[test]
    fn test_outside_typical_range_only() {
        // 800 / 800px = 1 unit per pixel: fine resolution, but not architectural
        let outcome = derive_scale(
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
            800.0,
            "ft",
            &page(),
        )
        .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("typical architectural"));
    }

    #[test]
    fn test_accuracy_threshold_is_enforced() {
        let calibrator = ScaleCalibrator::new(CalibrationThresholds {
            min_accuracy: 1.5,
            warn_accuracy: 1.5,
            ..CalibrationThresholds::default()
        });
        let result = calibrator.derive(
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
            20.0,
            "ft",
            &page(),
        );
        assert!(matches!(result, Err(CalibrationError::AccuracyTooLow { .. })));
    }

    #[test]
    fn test_marginal_accuracy_warns() {
        let calibrator = ScaleCalibrator::new(CalibrationThresholds {
            min_accuracy: 0.9,
            warn_accuracy: 1.5,
            ..CalibrationThresholds::default()
        });
        let outcome = calibrator
            .derive(
                NormalizedPoint::new(0.1, 0.5),
                NormalizedPoint::new(0.9, 0.5),
                20.0,
                "ft",
                &page(),
            )
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("marginal"));
        assert!(outcome.requires_confirmation());
    }

    #[test]
    fn test_nonstandard_unit_warns() {
        let outcome = derive_scale(
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
            20.0,
            "furlong",
            &page(),
        )
        .unwrap();

        assert_eq!(outcome.scale_context.unit, "furlong");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("not a standard calibration unit"));
    }

    #[test]
    fn test_unit_is_canonicalized() {
        let outcome = derive_scale(
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
            20.0,
            "Feet",
            &page(),
        )
        .unwrap();
        assert_eq!(outcome.scale_context.unit, "ft");
    }
}
