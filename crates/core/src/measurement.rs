//! Takeoff measurement records
//!
//! A measurement is stored as normalized geometry plus the values last
//! derived from it. Values are always recomputed from the stored points,
//! never from earlier values.

use crate::calibration::ScaleContext;
use crate::coordinate::NormalizedPoint;
use crate::geometry::{CalculationResult, MeasurementCalculator};
use crate::units::QuantityKind;

/// Unique identifier for measurements
pub type MeasurementId = uuid::Uuid;

/// Unique identifier for cutouts
pub type CutoutId = uuid::Uuid;

/// Unique identifier for projects
pub type ProjectId = uuid::Uuid;

/// Unique identifier for sheets (one uploaded drawing set)
pub type SheetId = uuid::Uuid;

/// A hole subtracted from an area or volume (e.g. a slab opening)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cutout {
    pub id: CutoutId,
    /// Outline in normalized page space (>= 3 points)
    pub points: Vec<NormalizedPoint>,
}

impl Cutout {
    /// Create a cutout with a fresh ID
    pub fn new(points: Vec<NormalizedPoint>) -> Self {
        Self {
            id: CutoutId::new_v4(),
            points,
        }
    }
}

/// Geometry and type-specific values of a measurement
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MeasurementShape {
    /// Length along a polyline
    Linear { points: Vec<NormalizedPoint> },

    /// Area of a closed polygon
    Area {
        points: Vec<NormalizedPoint>,
        #[serde(default)]
        perimeter_value: Option<f64>,
        #[serde(default)]
        net_calculated_value: Option<f64>,
        #[serde(default)]
        cutouts: Vec<Cutout>,
    },

    /// Plan area extruded by a depth
    Volume {
        points: Vec<NormalizedPoint>,
        /// Depth in the calibration's linear unit
        depth: f64,
        #[serde(default)]
        perimeter_value: Option<f64>,
        #[serde(default)]
        area_value: Option<f64>,
        #[serde(default)]
        net_calculated_value: Option<f64>,
        #[serde(default)]
        cutouts: Vec<Cutout>,
    },

    /// A single counted item
    Count { point: NormalizedPoint },
}

impl MeasurementShape {
    /// Dimension of the quantity this shape produces
    pub fn kind(&self) -> QuantityKind {
        match self {
            MeasurementShape::Linear { .. } => QuantityKind::Linear,
            MeasurementShape::Area { .. } => QuantityKind::Area,
            MeasurementShape::Volume { .. } => QuantityKind::Volume,
            MeasurementShape::Count { .. } => QuantityKind::Count,
        }
    }

    /// Stored points of the primary outline
    pub fn points(&self) -> &[NormalizedPoint] {
        match self {
            MeasurementShape::Linear { points }
            | MeasurementShape::Area { points, .. }
            | MeasurementShape::Volume { points, .. } => points,
            MeasurementShape::Count { point } => std::slice::from_ref(point),
        }
    }

    /// Cutouts, empty for linear and count shapes
    pub fn cutouts(&self) -> &[Cutout] {
        match self {
            MeasurementShape::Area { cutouts, .. } | MeasurementShape::Volume { cutouts, .. } => {
                cutouts
            }
            MeasurementShape::Linear { .. } | MeasurementShape::Count { .. } => &[],
        }
    }
}

/// A measurement drawn on one page of a sheet
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Measurement {
    pub id: MeasurementId,
    pub project_id: ProjectId,
    pub sheet_id: SheetId,
    /// 1-based page number within the sheet
    pub page_number: u32,
    /// Last computed primary value (>= 0)
    pub calculated_value: f64,
    /// Unit token of `calculated_value`
    pub unit: String,
    #[serde(flatten)]
    pub shape: MeasurementShape,
}

impl Measurement {
    /// Create a measurement with no computed value yet
    pub fn new(project_id: ProjectId, sheet_id: SheetId, page_number: u32, shape: MeasurementShape) -> Self {
        Self {
            id: MeasurementId::new_v4(),
            project_id,
            sheet_id,
            page_number,
            calculated_value: 0.0,
            unit: String::new(),
            shape,
        }
    }

    /// Create a linear measurement
    pub fn linear(project_id: ProjectId, sheet_id: SheetId, page_number: u32, points: Vec<NormalizedPoint>) -> Self {
        Self::new(project_id, sheet_id, page_number, MeasurementShape::Linear { points })
    }

    /// Create an area measurement
    pub fn area(
        project_id: ProjectId,
        sheet_id: SheetId,
        page_number: u32,
        points: Vec<NormalizedPoint>,
        cutouts: Vec<Cutout>,
    ) -> Self {
        Self::new(
            project_id,
            sheet_id,
            page_number,
            MeasurementShape::Area {
                points,
                perimeter_value: None,
                net_calculated_value: None,
                cutouts,
            },
        )
    }

    /// Create a volume measurement
    pub fn volume(
        project_id: ProjectId,
        sheet_id: SheetId,
        page_number: u32,
        points: Vec<NormalizedPoint>,
        depth: f64,
        cutouts: Vec<Cutout>,
    ) -> Self {
        Self::new(
            project_id,
            sheet_id,
            page_number,
            MeasurementShape::Volume {
                points,
                depth,
                perimeter_value: None,
                area_value: None,
                net_calculated_value: None,
                cutouts,
            },
        )
    }

    /// Create a count measurement
    pub fn count(project_id: ProjectId, sheet_id: SheetId, page_number: u32, point: NormalizedPoint) -> Self {
        Self::new(project_id, sheet_id, page_number, MeasurementShape::Count { point })
    }

    /// Dimension of this measurement
    pub fn kind(&self) -> QuantityKind {
        self.shape.kind()
    }

    /// Gross value computed from the stored points
    pub fn calculate(&self, calculator: &MeasurementCalculator, scale: &ScaleContext) -> CalculationResult {
        match &self.shape {
            MeasurementShape::Linear { points } => calculator.linear(points, scale),
            MeasurementShape::Area { points, .. } => calculator.area(points, scale),
            MeasurementShape::Volume { points, depth, .. } => calculator.volume(points, scale, *depth),
            MeasurementShape::Count { point } => calculator.count(std::slice::from_ref(point)),
        }
    }

    /// Perimeter of an area or volume outline
    pub fn perimeter_value(&self) -> Option<f64> {
        match &self.shape {
            MeasurementShape::Area { perimeter_value, .. }
            | MeasurementShape::Volume { perimeter_value, .. } => *perimeter_value,
            _ => None,
        }
    }

    /// Plan area of a volume
    pub fn area_value(&self) -> Option<f64> {
        match &self.shape {
            MeasurementShape::Volume { area_value, .. } => *area_value,
            _ => None,
        }
    }

    /// Value after cutouts for areas and volumes
    pub fn net_calculated_value(&self) -> Option<f64> {
        match &self.shape {
            MeasurementShape::Area { net_calculated_value, .. }
            | MeasurementShape::Volume { net_calculated_value, .. } => *net_calculated_value,
            _ => None,
        }
    }

    /// Value to report: net when cutouts were applied, gross otherwise
    pub fn reported_value(&self) -> f64 {
        self.net_calculated_value().unwrap_or(self.calculated_value)
    }

    /// Write recomputed values back onto this record
    ///
    /// Fields that do not exist on this shape are ignored.
    pub fn apply_update(&mut self, update: &MeasurementUpdate) {
        if update.id != self.id {
            return;
        }
        self.calculated_value = update.calculated_value;
        self.unit = update.unit.clone();
        match &mut self.shape {
            MeasurementShape::Area {
                perimeter_value,
                net_calculated_value,
                ..
            } => {
                *perimeter_value = update.perimeter_value;
                *net_calculated_value = update.net_calculated_value;
            }
            MeasurementShape::Volume {
                perimeter_value,
                area_value,
                net_calculated_value,
                ..
            } => {
                *perimeter_value = update.perimeter_value;
                *area_value = update.area_value;
                *net_calculated_value = update.net_calculated_value;
            }
            MeasurementShape::Linear { .. } | MeasurementShape::Count { .. } => {}
        }
    }
}

/// Recomputed values for one measurement, to be written by the store
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeasurementUpdate {
    pub id: MeasurementId,
    pub calculated_value: f64,
    pub unit: String,
    pub perimeter_value: Option<f64>,
    pub area_value: Option<f64>,
    pub net_calculated_value: Option<f64>,
    /// Warnings raised while recomputing
    pub warnings: Vec<String>,
}
