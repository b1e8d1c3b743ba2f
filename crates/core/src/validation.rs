//! Validation outcome attached to every calculation
//!
//! Errors block a value from being stored or shown; warnings travel with a
//! valid value and are surfaced to the user.

/// Warnings and errors collected while computing a value
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationResult {
    /// False whenever `errors` is non-empty
    pub is_valid: bool,
    /// Soft findings; the value is still usable
    pub warnings: Vec<String>,
    /// Hard failures; the value must not be used
    pub errors: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

impl ValidationResult {
    /// A passing result with no findings
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// A failing result carrying a single error
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            warnings: Vec::new(),
            errors: vec![error.into()],
        }
    }

    /// Record a warning
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Fold another result's findings into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.warnings.extend(other.warnings);
        if !other.errors.is_empty() {
            self.errors.extend(other.errors);
            self.is_valid = false;
        }
    }

    /// Whether any warning was recorded
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
