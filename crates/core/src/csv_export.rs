//! CSV export for takeoff quantities and calibrations
//!
//! Produces the quantity sheet estimators paste into pricing tools.

use crate::measurement::{Measurement, MeasurementShape};
use crate::scope::{Calibration, CalibrationScope};
use crate::units::{format_quantity, QuantityKind};
use std::io::Write;

/// Error types for CSV export
#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CsvExportResult<T> = Result<T, CsvExportError>;

/// Configuration for CSV export
#[derive(Debug, Clone)]
pub struct CsvExportConfig {
    /// Include column headers in the output
    pub include_headers: bool,

    /// CSV delimiter character
    pub delimiter: u8,

    /// Export only rows from specific pages (None = all pages)
    pub page_filter: Option<Vec<u32>>,
}

impl Default for CsvExportConfig {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
            page_filter: None,
        }
    }
}

impl CsvExportConfig {
    fn includes_page(&self, page: u32) -> bool {
        self.page_filter
            .as_ref()
            .map_or(true, |pages| pages.contains(&page))
    }
}

/// Export measurements to CSV format
///
/// CSV columns:
/// - ID: Measurement identifier
/// - Sheet: Sheet identifier
/// - Page: Page number (1-based)
/// - Type: linear, area, volume, or count
/// - Value: Gross calculated value
/// - Unit: Unit token (LF, SF, CF, EA, ...)
/// - Formatted: Reported value with unit (net when cutouts apply)
/// - Perimeter: Perimeter for areas and volumes
/// - Area: Plan area for volumes
/// - Net: Value after cutouts
/// - Cutouts: Number of cutouts
/// - Points: Normalized outline as `x y` pairs separated by `;`
pub fn export_measurements_csv<W: Write>(
    writer: W,
    measurements: &[Measurement],
    config: &CsvExportConfig,
) -> CsvExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.include_headers)
        .from_writer(writer);

    if config.include_headers {
        csv_writer.write_record([
            "ID",
            "Sheet",
            "Page",
            "Type",
            "Value",
            "Unit",
            "Formatted",
            "Perimeter",
            "Area",
            "Net",
            "Cutouts",
            "Points",
        ])?;
    }

    for measurement in measurements
        .iter()
        .filter(|m| config.includes_page(m.page_number))
    {
        csv_writer.write_record(&[
            measurement.id.to_string(),
            measurement.sheet_id.to_string(),
            measurement.page_number.to_string(),
            kind_name(measurement.kind()).to_string(),
            measurement.calculated_value.to_string(),
            measurement.unit.clone(),
            format_quantity(measurement.reported_value(), &measurement.unit),
            optional(measurement.perimeter_value()),
            optional(measurement.area_value()),
            optional(measurement.net_calculated_value()),
            measurement.shape.cutouts().len().to_string(),
            format_points(&measurement.shape),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Export calibrations to CSV format
///
/// CSV columns:
/// - Project, Sheet: Owning identifiers
/// - Scope: `document` or `page N`
/// - Scale Factor: Real units per pixel
/// - Unit: Linear unit
/// - Viewport Width, Viewport Height: Unrotated page size in pixels
/// - Rotation: Display rotation in degrees
/// - Calibrated At: Unix timestamp (seconds)
pub fn export_calibrations_csv<W: Write>(
    writer: W,
    calibrations: &[Calibration],
    config: &CsvExportConfig,
) -> CsvExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.include_headers)
        .from_writer(writer);

    if config.include_headers {
        csv_writer.write_record([
            "Project",
            "Sheet",
            "Scope",
            "Scale Factor",
            "Unit",
            "Viewport Width",
            "Viewport Height",
            "Rotation",
            "Calibrated At",
        ])?;
    }

    // Document-level calibrations apply to every page, so they are never filtered out
    for calibration in calibrations
        .iter()
        .filter(|c| c.page_number.map_or(true, |page| config.includes_page(page)))
    {
        let scope = match calibration.scope() {
            CalibrationScope::Document => "document".to_string(),
            CalibrationScope::Page(page) => format!("page {page}"),
        };
        csv_writer.write_record(&[
            calibration.project_id.to_string(),
            calibration.sheet_id.to_string(),
            scope,
            calibration.scale_factor.to_string(),
            calibration.unit.clone(),
            calibration.viewport_width.to_string(),
            calibration.viewport_height.to_string(),
            calibration.rotation.to_string(),
            calibration.calibrated_at.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn kind_name(kind: QuantityKind) -> &'static str {
    match kind {
        QuantityKind::Linear => "linear",
        QuantityKind::Area => "area",
        QuantityKind::Volume => "volume",
        QuantityKind::Count => "count",
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_points(shape: &MeasurementShape) -> String {
    shape
        .points()
        .iter()
        .map(|p| format!("{} {}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(";")
}
