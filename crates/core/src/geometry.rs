//! Scale-aware geometry for takeoff measurements
//!
//! Converts normalized point sequences into real-world quantities using a
//! [`ScaleContext`]. Every calculation returns a [`CalculationResult`]; bad
//! input never panics and never produces NaN, it produces a zero value with
//! `is_valid = false` and the reason attached.

use crate::calibration::ScaleContext;
use crate::config::GeometryConfig;
use crate::coordinate::{normalized_path_length, NormalizedPoint};
use crate::units::{quantity_unit, QuantityKind, COUNT_UNIT};
use crate::validation::ValidationResult;

/// Precondition failures for a geometry calculation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("{kind} measurement requires at least {required} point(s), got {actual}")]
    NotEnoughPoints {
        kind: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("scale context is missing viewport dimensions ({width}x{height})")]
    MissingViewport { width: f64, height: f64 },

    #[error("scale factor must be a positive number, got {0}")]
    InvalidScaleFactor(f64),

    #[error("depth must be a positive number, got {0}")]
    InvalidDepth(f64),

    #[error("measurement points must be finite numbers")]
    NonFinitePoint,

    #[error("calculated value is not a finite number")]
    NonFiniteResult,
}

/// Value, derived values, and validation for one calculation
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalculationResult {
    /// Primary quantity (always >= 0; 0 when invalid)
    pub calculated_value: f64,
    /// Unit token of `calculated_value` (e.g. "LF", "SF")
    pub unit: String,
    /// Closed-loop perimeter for areas and volumes
    pub perimeter_value: Option<f64>,
    /// Plan area for volumes
    pub area_value: Option<f64>,
    /// Reliability of the value (0.1-1.0)
    pub confidence: f64,
    pub validation: ValidationResult,
}

impl CalculationResult {
    fn failed(unit: String, error: GeometryError) -> Self {
        Self {
            calculated_value: 0.0,
            unit,
            perimeter_value: None,
            area_value: None,
            confidence: 0.0,
            validation: ValidationResult::failed(error.to_string()),
        }
    }

    /// Whether the value may be stored and displayed
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }
}

/// Computes lengths, areas, volumes, and counts from normalized points
#[derive(Debug, Clone, Default)]
pub struct MeasurementCalculator {
    config: GeometryConfig,
}

impl MeasurementCalculator {
    /// Create a calculator with custom thresholds
    pub fn new(config: GeometryConfig) -> Self {
        Self { config }
    }

    /// Get the configuration in use
    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// Length along an open polyline
    pub fn linear(&self, points: &[NormalizedPoint], scale: &ScaleContext) -> CalculationResult {
        let unit = quantity_unit(QuantityKind::Linear, &scale.unit);
        if let Err(e) = check_scale(scale).and_then(|_| check_points("linear", points, 2)) {
            return CalculationResult::failed(unit, e);
        }

        let mut validation = ValidationResult::valid();
        let mut pixel_length = 0.0;
        for (i, pair) in points.windows(2).enumerate() {
            let segment = segment_pixel_length(&pair[0], &pair[1], scale);
            if segment > 0.0 && segment < self.config.short_segment_px {
                validation.warn(format!(
                    "Segment {} is only {:.2}px long; possible duplicate point",
                    i + 1,
                    segment
                ));
            }
            pixel_length += segment;
        }

        let value = pixel_length * scale.scale_factor;
        if !value.is_finite() {
            return CalculationResult::failed(unit, GeometryError::NonFiniteResult);
        }
        if pixel_length == 0.0 {
            validation.warn("Measurement has zero length");
        } else {
            self.check_consistency(value / pixel_length, scale, &mut validation);
        }

        CalculationResult {
            calculated_value: value,
            unit,
            perimeter_value: None,
            area_value: None,
            confidence: self.confidence(points, false, scale),
            validation,
        }
    }

    /// Area enclosed by a polygon, with its perimeter
    pub fn area(&self, points: &[NormalizedPoint], scale: &ScaleContext) -> CalculationResult {
        let unit = quantity_unit(QuantityKind::Area, &scale.unit);
        if let Err(e) = check_scale(scale).and_then(|_| check_points("area", points, 3)) {
            return CalculationResult::failed(unit, e);
        }

        let mut validation = ValidationResult::valid();
        let pixel_area =
            normalized_polygon_area(points) * scale.viewport_width * scale.viewport_height;
        let value = pixel_area * scale.scale_factor * scale.scale_factor;
        let perimeter = pixel_path_length(points, scale, true) * scale.scale_factor;
        if !value.is_finite() || !perimeter.is_finite() {
            return CalculationResult::failed(unit, GeometryError::NonFiniteResult);
        }

        if value < self.config.min_reasonable_area {
            validation.warn(format!("Area {value:.2} {unit} is unusually small"));
        } else if value > self.config.max_reasonable_area {
            validation.warn(format!("Area {value:.2} {unit} is unusually large"));
        }
        if has_self_intersection(points, self.config.intersection_epsilon) {
            validation.warn("Polygon edges cross each other; area may be inaccurate");
        }
        if pixel_area > 0.0 {
            self.check_consistency((value / pixel_area).sqrt(), scale, &mut validation);
        }

        CalculationResult {
            calculated_value: value,
            unit,
            perimeter_value: Some(perimeter),
            area_value: None,
            confidence: self.confidence(points, true, scale),
            validation,
        }
    }

    /// Plan area multiplied by a depth in the same linear unit
    pub fn volume(
        &self,
        points: &[NormalizedPoint],
        scale: &ScaleContext,
        depth: f64,
    ) -> CalculationResult {
        let unit = quantity_unit(QuantityKind::Volume, &scale.unit);
        if !depth.is_finite() || depth <= 0.0 {
            return CalculationResult::failed(unit, GeometryError::InvalidDepth(depth));
        }

        let area = self.area(points, scale);
        if !area.is_valid() {
            return CalculationResult {
                unit,
                ..area
            };
        }

        let value = area.calculated_value * depth;
        if !value.is_finite() {
            return CalculationResult::failed(unit, GeometryError::NonFiniteResult);
        }

        CalculationResult {
            calculated_value: value,
            unit,
            perimeter_value: area.perimeter_value,
            area_value: Some(area.calculated_value),
            confidence: area.confidence.min(self.config.volume_confidence_cap),
            validation: area.validation,
        }
    }

    /// A single counted item
    pub fn count(&self, points: &[NormalizedPoint]) -> CalculationResult {
        let unit = COUNT_UNIT.to_string();
        if let Err(e) = check_points("count", points, 1) {
            return CalculationResult::failed(unit, e);
        }
        CalculationResult {
            calculated_value: 1.0,
            unit,
            perimeter_value: None,
            area_value: None,
            confidence: 1.0,
            validation: ValidationResult::valid(),
        }
    }

    fn confidence(&self, points: &[NormalizedPoint], closed: bool, scale: &ScaleContext) -> f64 {
        let mut confidence = 1.0;
        if points.len() < 3 {
            confidence *= self.config.few_points_penalty;
        }
        confidence *= scale.confidence;
        if normalized_path_length(points, closed) < self.config.short_path_threshold {
            confidence *= self.config.short_path_penalty;
        }
        confidence.clamp(self.config.min_confidence, 1.0)
    }

    // Scale back-derived from the computed value
    fn check_consistency(&self, derived: f64, scale: &ScaleContext, validation: &mut ValidationResult) {
        let drift = (derived - scale.scale_factor).abs() / scale.scale_factor;
        if drift > self.config.scale_consistency_tolerance {
            validation.warn(format!(
                "Scale factor inconsistency: expected {:.6}, derived {:.6}",
                scale.scale_factor, derived
            ));
        }
    }
}

pub(crate) fn check_scale(scale: &ScaleContext) -> Result<(), GeometryError> {
    if !(scale.scale_factor.is_finite() && scale.scale_factor > 0.0) {
        return Err(GeometryError::InvalidScaleFactor(scale.scale_factor));
    }
    let (w, h) = (scale.viewport_width, scale.viewport_height);
    if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
        return Err(GeometryError::MissingViewport { width: w, height: h });
    }
    Ok(())
}

fn check_points(
    kind: &'static str,
    points: &[NormalizedPoint],
    required: usize,
) -> Result<(), GeometryError> {
    if points.len() < required {
        return Err(GeometryError::NotEnoughPoints {
            kind,
            required,
            actual: points.len(),
        });
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinitePoint);
    }
    Ok(())
}

fn segment_pixel_length(a: &NormalizedPoint, b: &NormalizedPoint, scale: &ScaleContext) -> f64 {
    let dx = (b.x - a.x) * scale.viewport_width;
    let dy = (b.y - a.y) * scale.viewport_height;
    (dx * dx + dy * dy).sqrt()
}

/// Pixel length of a path over the scale's viewport
pub fn pixel_path_length(points: &[NormalizedPoint], scale: &ScaleContext, closed: bool) -> f64 {
    let open: f64 = points
        .windows(2)
        .map(|w| segment_pixel_length(&w[0], &w[1], scale))
        .sum();
    match (closed, points.first(), points.last()) {
        (true, Some(first), Some(last)) if points.len() > 2 => {
            open + segment_pixel_length(last, first, scale)
        }
        _ => open,
    }
}

/// Unsigned shoelace area in normalized units
///
/// Multiply by `viewport_width * viewport_height` for pixel area.
pub fn normalized_polygon_area(points: &[NormalizedPoint]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x * points[j].y;
        twice_area -= points[j].x * points[i].y;
    }
    twice_area.abs() / 2.0
}

/// Whether any two non-adjacent edges of a closed polygon cross
///
/// Edges that share a vertex (including the closing edge and the first edge)
/// are never compared, and touching at an endpoint does not count.
pub fn has_self_intersection(points: &[NormalizedPoint], epsilon: f64) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a1 = points[i];
        let a2 = points[(i + 1) % n];
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = points[j];
            let b2 = points[(j + 1) % n];
            if segments_cross(a1, a2, b1, b2, epsilon) {
                return true;
            }
        }
    }
    false
}

/// Strict interior crossing of segments `a1-a2` and `b1-b2`
///
/// Both parametric positions must fall strictly inside `(0, 1)`; parallel
/// and collinear segments never cross.
pub fn segments_cross(
    a1: NormalizedPoint,
    a2: NormalizedPoint,
    b1: NormalizedPoint,
    b2: NormalizedPoint,
    epsilon: f64,
) -> bool {
    let (rx, ry) = (a2.x - a1.x, a2.y - a1.y);
    let (sx, sy) = (b2.x - b1.x, b2.y - b1.y);
    let denom = rx * sy - ry * sx;
    if denom.abs() < epsilon {
        return false;
    }
    let (qx, qy) = (b1.x - a1.x, b1.y - a1.y);
    let t = (qx * sy - qy * sx) / denom;
    let u = (qx * ry - qy * rx) / denom;
    t > epsilon && t < 1.0 - epsilon && u > epsilon && u < 1.0 - epsilon
}
