//! Takeoff Core Library
//!
//! Measurement core for construction takeoff: plan coordinates, scale
//! calibration, geometric quantities, cutouts, and recalibration of stored
//! measurements.
//!
//! Points are stored page-normalized (`0..=1` on both axes, unrotated) so
//! values can always be rebuilt from them under any scale.

pub mod calibration;
pub mod config;
pub mod coordinate;
pub mod csv_export;
pub mod cutout;
pub mod geometry;
pub mod measurement;
pub mod recalibration;
pub mod scope;
pub mod units;
pub mod validation;

pub use calibration::{
    derive_scale, CalibrationError, CalibrationOutcome, ScaleCalibrator, ScaleContext,
};
pub use config::{CalibrationThresholds, ConfigError, EngineConfig, GeometryConfig};
pub use coordinate::{
    normalized_path_length, to_normalized, to_pixel, NormalizedPoint, PixelPoint, Viewport,
};
pub use csv_export::{
    export_calibrations_csv, export_measurements_csv, CsvExportConfig, CsvExportError,
    CsvExportResult,
};
pub use cutout::{apply_cutouts, CutoutResolution, CutoutTarget};
pub use geometry::{CalculationResult, GeometryError, MeasurementCalculator};
pub use measurement::{
    Cutout, CutoutId, Measurement, MeasurementId, MeasurementShape, MeasurementUpdate, ProjectId,
    SheetId,
};
pub use recalibration::{
    measurements_in_scope, recalculate, RecalculationFailure, RecalculationReport,
};
pub use scope::{active_scale, resolve, ActiveScale, Calibration, CalibrationId, CalibrationScope};
pub use units::{format_quantity, quantity_unit, QuantityKind};
pub use validation::ValidationResult;
