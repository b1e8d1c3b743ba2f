//! Tunable thresholds for calibration and geometry validation.
//!
//! Defaults reproduce the production thresholds exactly. Configuration can be
//! created programmatically, parsed from JSON, or overridden from environment
//! variables.

/// Bounds applied when deriving a scale factor from two points.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CalibrationThresholds {
    /// Scale factors below this are rejected
    pub min_scale_factor: f64,
    /// Scale factors above this are rejected
    pub max_scale_factor: f64,
    /// Scale factors below this (but above the hard minimum) warn
    pub warn_small_scale_factor: f64,
    /// Scale factors above this (but below the hard maximum) warn
    pub warn_large_scale_factor: f64,
    /// Round-trip accuracy below this is rejected
    pub min_accuracy: f64,
    /// Round-trip accuracy below this warns
    pub warn_accuracy: f64,
    /// Pixels per real unit below this warns
    pub min_pixels_per_unit: f64,
    /// Pixels per real unit above this warns
    pub max_pixels_per_unit: f64,
    /// Lower edge of the typical architectural scale range
    pub typical_min_scale_factor: f64,
    /// Upper edge of the typical architectural scale range
    pub typical_max_scale_factor: f64,
    /// Confidence assigned to a successful two-point calibration
    pub calibrated_confidence: f64,
}

impl Default for CalibrationThresholds {
    fn default() -> Self {
        Self {
            min_scale_factor: 0.0001,
            max_scale_factor: 10000.0,
            warn_small_scale_factor: 0.001,
            warn_large_scale_factor: 1000.0,
            min_accuracy: 0.90,
            warn_accuracy: 0.95,
            min_pixels_per_unit: 1.0,
            max_pixels_per_unit: 1000.0,
            typical_min_scale_factor: 0.001,
            typical_max_scale_factor: 0.5,
            calibrated_confidence: 0.95,
        }
    }
}

/// Thresholds and weights used by the geometry calculator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Segments shorter than this many pixels (and longer than zero) warn
    pub short_segment_px: f64,
    /// Areas below this (in square units) warn
    pub min_reasonable_area: f64,
    /// Areas above this (in square units) warn
    pub max_reasonable_area: f64,
    /// Normalized path length below which a drawing counts as very short
    pub short_path_threshold: f64,
    /// Confidence multiplier for fewer than three points
    pub few_points_penalty: f64,
    /// Confidence multiplier for very short drawings
    pub short_path_penalty: f64,
    /// Lowest confidence ever reported
    pub min_confidence: f64,
    /// Highest confidence reported for volumes
    pub volume_confidence_cap: f64,
    /// Tolerance for the parametric edge intersection test
    pub intersection_epsilon: f64,
    /// Relative drift between back-derived and supplied scale that warns
    pub scale_consistency_tolerance: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            short_segment_px: 2.0,
            min_reasonable_area: 1.0,
            max_reasonable_area: 100_000.0,
            short_path_threshold: 0.01,
            few_points_penalty: 0.8,
            short_path_penalty: 0.7,
            min_confidence: 0.1,
            volume_confidence_cap: 0.9,
            intersection_epsilon: 1e-10,
            scale_consistency_tolerance: 0.01,
        }
    }
}

/// Combined configuration for the measurement engine.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub calibration: CalibrationThresholds,
    pub geometry: GeometryConfig,
}

impl EngineConfig {
    /// Replaces the calibration thresholds.
    pub fn with_calibration(mut self, calibration: CalibrationThresholds) -> Self {
        self.calibration = calibration;
        self
    }

    /// Replaces the geometry configuration.
    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    /// Parses configuration from JSON; missing keys keep their defaults.
    ///
    /// ```
    /// use takeoff_core::EngineConfig;
    ///
    /// let config = EngineConfig::from_json(r#"{"geometry": {"short_segment_px": 3.0}}"#).unwrap();
    /// assert_eq!(config.geometry.short_segment_px, 3.0);
    /// assert_eq!(config.calibration.min_accuracy, 0.90);
    /// ```
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a value has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TAKEOFF_SHORT_SEGMENT_PX`: short segment warning threshold (default: 2)
    /// - `TAKEOFF_MIN_REASONABLE_AREA`: lower area sanity bound (default: 1)
    /// - `TAKEOFF_MAX_REASONABLE_AREA`: upper area sanity bound (default: 100000)
    /// - `TAKEOFF_CALIBRATION_MIN_ACCURACY`: rejected calibration accuracy (default: 0.90)
    /// - `TAKEOFF_CALIBRATION_WARN_ACCURACY`: warned calibration accuracy (default: 0.95)
    ///
    /// # Errors
    /// Returns an error if any variable holds something other than a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = env_f64("TAKEOFF_SHORT_SEGMENT_PX")? {
            config.geometry.short_segment_px = value;
        }
        if let Some(value) = env_f64("TAKEOFF_MIN_REASONABLE_AREA")? {
            config.geometry.min_reasonable_area = value;
        }
        if let Some(value) = env_f64("TAKEOFF_MAX_REASONABLE_AREA")? {
            config.geometry.max_reasonable_area = value;
        }
        if let Some(value) = env_f64("TAKEOFF_CALIBRATION_MIN_ACCURACY")? {
            config.calibration.min_accuracy = value;
        }
        if let Some(value) = env_f64("TAKEOFF_CALIBRATION_WARN_ACCURACY")? {
            config.calibration.warn_accuracy = value;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that ranges are ordered and multipliers are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.calibration;
        if !(c.min_scale_factor > 0.0 && c.min_scale_factor < c.max_scale_factor) {
            return Err(ConfigError::InvalidRange("scale factor bounds"));
        }
        if c.min_accuracy > c.warn_accuracy || c.warn_accuracy > 1.0 {
            return Err(ConfigError::InvalidRange("calibration accuracy bounds"));
        }
        if !(0.0..=1.0).contains(&c.calibrated_confidence) {
            return Err(ConfigError::InvalidRange("calibrated confidence"));
        }

        let g = &self.geometry;
        if g.min_reasonable_area > g.max_reasonable_area {
            return Err(ConfigError::InvalidRange("reasonable area bounds"));
        }
        if !(0.0..=1.0).contains(&g.min_confidence) || !(0.0..=1.0).contains(&g.volume_confidence_cap) {
            return Err(ConfigError::InvalidRange("confidence clamp"));
        }
        Ok(())
    }
}

fn env_f64(key: &'static str) -> Result<Option<f64>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(None),
    }
}

/// Errors that can occur while building configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for configuration key: {0}")]
    InvalidValue(String),

    #[error("Inconsistent configuration: {0}")]
    InvalidRange(&'static str),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
