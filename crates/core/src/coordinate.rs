//! Normalized page coordinates and the viewport transform
//!
//! Stored geometry lives in normalized space: `x` and `y` in `[0, 1]`
//! relative to the page width and height, independent of zoom. Pixel
//! coordinates only exist transiently, derived from a [`Viewport`] at the
//! rotation active when the page was displayed.

/// Rotations the viewer can display pages at (degrees, clockwise)
pub const SUPPORTED_ROTATIONS: [u16; 4] = [0, 90, 180, 270];

/// Point in normalized page space
///
/// - Origin (0, 0) at the top-left of the page
/// - `x` grows to the right, `y` grows downward
/// - Both axes span `[0, 1]` across the page
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    /// Create a new normalized point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point in normalized units
    pub fn distance_to(&self, other: &NormalizedPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether both components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Point in rendered pixel space
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    /// Create a new pixel point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another pixel point
    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Rendered page dimensions supplied by the viewer
///
/// Owned by the rendering side; this crate only reads it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: f64,

    /// Height in pixels
    pub height: f64,

    /// Zoom factor the page was rendered at (1.0 = 100%)
    pub scale: f64,

    /// Display rotation in degrees (0, 90, 180, 270)
    pub rotation: u16,
}

impl Viewport {
    /// Create an unrotated viewport at 100% zoom
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            rotation: 0,
        }
    }

    /// Set the display rotation
    pub fn with_rotation(mut self, rotation: u16) -> Self {
        self.rotation = rotation;
        self
    }

    /// Pixel width and height of the page with the rotation removed
    ///
    /// Normalized `x` spans the first value and `y` the second. At 90° and
    /// 270° the displayed width runs along the page's `y` axis.
    pub fn page_dimensions(&self) -> (f64, f64) {
        match self.rotation {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }

    /// Whether the rotation is one the transform handles explicitly
    pub fn has_supported_rotation(&self) -> bool {
        SUPPORTED_ROTATIONS.contains(&self.rotation)
    }

    /// Whether width and height are finite and strictly positive
    pub fn has_valid_dimensions(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Map a normalized point to pixel space for the given viewport
///
/// This is the only mapping used for both recording clicks and re-deriving
/// distances, so scale stays consistent across rotations. Rotations other
/// than 0/90/180/270 fall back to the 0° mapping.
pub fn to_pixel(point: NormalizedPoint, viewport: &Viewport) -> PixelPoint {
    let w = viewport.width;
    let h = viewport.height;
    match viewport.rotation {
        0 => PixelPoint::new(point.x * w, point.y * h),
        90 => PixelPoint::new(w * (1.0 - point.y), h * point.x),
        180 => PixelPoint::new(w * (1.0 - point.x), h * (1.0 - point.y)),
        270 => PixelPoint::new(w * point.y, h * (1.0 - point.x)),
        other => {
            log::warn!("unsupported viewport rotation {other}°, using 0° mapping");
            PixelPoint::new(point.x * w, point.y * h)
        }
    }
}

/// Map a pixel position back to normalized page space
///
/// Exact inverse of [`to_pixel`] for the supported rotations. Returns `None`
/// when the viewport has no usable dimensions.
pub fn to_normalized(pixel: PixelPoint, viewport: &Viewport) -> Option<NormalizedPoint> {
    if !viewport.has_valid_dimensions() {
        return None;
    }
    let u = pixel.x / viewport.width;
    let v = pixel.y / viewport.height;
    let point = match viewport.rotation {
        0 => NormalizedPoint::new(u, v),
        90 => NormalizedPoint::new(v, 1.0 - u),
        180 => NormalizedPoint::new(1.0 - u, 1.0 - v),
        270 => NormalizedPoint::new(1.0 - v, u),
        other => {
            log::warn!("unsupported viewport rotation {other}°, using 0° mapping");
            NormalizedPoint::new(u, v)
        }
    };
    Some(point)
}

/// Total length of a path in normalized units
pub fn normalized_path_length(points: &[NormalizedPoint], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
    match (closed, points.first(), points.last()) {
        (true, Some(first), Some(last)) if points.len() > 2 => open + last.distance_to(first),
        _ => open,
    }
}
