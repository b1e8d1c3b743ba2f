//! Calibration records and scope resolution
//!
//! A calibration applies either to one page of a sheet or, as a fallback, to
//! the whole sheet. Page calibrations win over document calibrations, and a
//! newer record for the same key supersedes older ones.

use crate::calibration::{CalibrationOutcome, ScaleContext};
use crate::coordinate::Viewport;
use crate::measurement::{ProjectId, SheetId};

/// Unique identifier for calibration records
pub type CalibrationId = uuid::Uuid;

/// What a calibration applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationScope {
    /// Every page of the sheet without its own calibration
    Document,
    /// A single page (1-based)
    Page(u32),
}

/// A persisted scale calibration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Calibration {
    pub id: CalibrationId,
    pub project_id: ProjectId,
    pub sheet_id: SheetId,
    /// `None` for a document-level calibration
    pub page_number: Option<u32>,
    /// Real-world units per pixel
    pub scale_factor: f64,
    pub unit: String,
    /// Confidence assigned when the scale was derived
    pub confidence: f64,
    /// Unrotated page size in pixels the scale was derived against
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Rotation the calibration points were clicked at
    pub rotation: u16,
    /// Unix timestamp (seconds)
    pub calibrated_at: i64,
}

impl Calibration {
    /// Build a record from a derived calibration
    pub fn from_outcome(
        project_id: ProjectId,
        sheet_id: SheetId,
        scope: CalibrationScope,
        outcome: &CalibrationOutcome,
        calibrated_at: i64,
    ) -> Self {
        let context = &outcome.scale_context;
        Self {
            id: CalibrationId::new_v4(),
            project_id,
            sheet_id,
            page_number: match scope {
                CalibrationScope::Document => None,
                CalibrationScope::Page(page) => Some(page),
            },
            scale_factor: context.scale_factor,
            unit: context.unit.clone(),
            confidence: context.confidence,
            viewport_width: context.viewport_width,
            viewport_height: context.viewport_height,
            rotation: outcome.rotation,
            calibrated_at,
        }
    }

    /// What this calibration applies to
    pub fn scope(&self) -> CalibrationScope {
        match self.page_number {
            Some(page) => CalibrationScope::Page(page),
            None => CalibrationScope::Document,
        }
    }

    /// Whether this record has the same (project, sheet, page) key as another
    pub fn same_key(&self, other: &Calibration) -> bool {
        self.project_id == other.project_id
            && self.sheet_id == other.sheet_id
            && self.page_number == other.page_number
    }

    /// Scale context for geometry calculations
    pub fn scale_context(&self) -> ScaleContext {
        ScaleContext::new(
            self.scale_factor,
            self.unit.clone(),
            self.confidence,
            self.viewport_width,
            self.viewport_height,
        )
    }
}

/// Find the calibration in effect for a page
///
/// Exact page match first, then the sheet's document-level calibration.
/// Among records with the same key, the latest `calibrated_at` wins.
pub fn resolve(
    calibrations: &[Calibration],
    project_id: ProjectId,
    sheet_id: SheetId,
    page_number: u32,
) -> Option<&Calibration> {
    let latest = |page: Option<u32>| {
        calibrations
            .iter()
            .filter(|c| c.project_id == project_id && c.sheet_id == sheet_id && c.page_number == page)
            .max_by_key(|c| c.calibrated_at)
    };
    latest(Some(page_number)).or_else(|| latest(None))
}

/// Scale to use for a page, calibrated or not
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveScale {
    /// A calibration applies; values may be stored
    Calibrated(ScaleContext),
    /// No calibration; 1 unit per pixel for display only
    Uncalibrated(ScaleContext),
}

impl ActiveScale {
    /// The scale context, whichever state applies
    pub fn context(&self) -> &ScaleContext {
        match self {
            ActiveScale::Calibrated(context) | ActiveScale::Uncalibrated(context) => context,
        }
    }

    /// Whether values computed under this scale may be persisted
    pub fn is_persistable(&self) -> bool {
        matches!(self, ActiveScale::Calibrated(_))
    }
}

/// Resolve the scale for a page, falling back to an uncalibrated display scale
///
/// The fallback uses the page viewport with a scale of 1 and a low
/// confidence; its values are informational only.
pub fn active_scale(
    calibrations: &[Calibration],
    project_id: ProjectId,
    sheet_id: SheetId,
    page_number: u32,
    viewport: &Viewport,
) -> ActiveScale {
    match resolve(calibrations, project_id, sheet_id, page_number) {
        Some(calibration) => ActiveScale::Calibrated(calibration.scale_context()),
        None => {
            let (width, height) = viewport.page_dimensions();
            ActiveScale::Uncalibrated(ScaleContext::new(1.0, "px", 0.1, width, height))
        }
    }
}
