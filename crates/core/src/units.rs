//! Quantity unit tokens and label formatting
//!
//! Calibrations carry a linear unit (e.g. "ft"); measurements report in the
//! takeoff token for their dimension (e.g. "LF", "SF").

/// Units offered when calibrating a sheet
pub const CALIBRATION_UNITS: [&str; 6] = ["ft", "in", "yd", "m", "cm", "mm"];

/// Token used for counted items
pub const COUNT_UNIT: &str = "EA";

/// Dimension of a reported quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityKind {
    Linear,
    Area,
    Volume,
    Count,
}

/// Canonical form of a calibration unit string
///
/// Accepts common spellings case-insensitively; unknown units are returned
/// trimmed but otherwise untouched.
pub fn canonical_unit(unit: &str) -> String {
    let trimmed = unit.trim();
    let lower = trimmed.to_ascii_lowercase();
    let canonical = match lower.as_str() {
        "ft" | "feet" | "foot" | "'" | "lf" => "ft",
        "in" | "inch" | "inches" | "\"" => "in",
        "yd" | "yard" | "yards" => "yd",
        "m" | "meter" | "meters" | "metre" | "metres" => "m",
        "cm" | "centimeter" | "centimeters" => "cm",
        "mm" | "millimeter" | "millimeters" => "mm",
        _ => return trimmed.to_string(),
    };
    canonical.to_string()
}

/// Token a quantity of the given kind is reported in
pub fn quantity_unit(kind: QuantityKind, linear_unit: &str) -> String {
    if kind == QuantityKind::Count {
        return COUNT_UNIT.to_string();
    }
    let unit = canonical_unit(linear_unit);
    match (unit.as_str(), kind) {
        ("ft", QuantityKind::Linear) => "LF".to_string(),
        ("ft", QuantityKind::Area) => "SF".to_string(),
        ("ft", QuantityKind::Volume) => "CF".to_string(),
        ("yd", QuantityKind::Linear) => "LY".to_string(),
        ("yd", QuantityKind::Area) => "SY".to_string(),
        ("yd", QuantityKind::Volume) => "CY".to_string(),
        (_, QuantityKind::Area) => format!("{unit}²"),
        (_, QuantityKind::Volume) => format!("{unit}³"),
        _ => unit,
    }
}

/// Format a value with its unit for labels and reports
pub fn format_quantity(value: f64, unit: &str) -> String {
    format!("{:.2} {}", value, unit)
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
