use crate::error::{Error, Result};

/// Largest number of integer or decimal digits a coordinate may carry.
pub const MAX_DIGITS: u8 = 6;

/// Fixed-point layout of every coordinate in a document, e.g. 4.6 is `%FSLAX46Y46*%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumberFormat {
    pub integer: u8,
    pub decimal: u8,
}

impl NumberFormat {
    pub const fn new(integer: u8, decimal: u8) -> Self {
        Self {
            integer,
            decimal,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, digits) in [("integer", self.integer), ("decimal", self.decimal)] {
            if digits == 0 || digits > MAX_DIGITS {
                return Err(Error::Configuration(format!(
                    "{} digits must be between 1 and {}, got {}",
                    name, MAX_DIGITS, digits
                )));
            }
        }
        Ok(())
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::new(4, 6)
    }
}

/// Output unit. Inputs are always millimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
}

impl Units {
    pub fn from_millimeters(&self, value: f64) -> f64 {
        match self {
            Units::Millimeters => value,
            Units::Inches => value / 25.4,
        }
    }
}

impl From<Units> for gerber_types::Unit {
    fn from(value: Units) -> Self {
        match value {
            Units::Millimeters => gerber_types::Unit::Millimeters,
            Units::Inches => gerber_types::Unit::Inches,
        }
    }
}

/// How arcs reach the output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArcMode {
    /// `G02`/`G03` circular interpolation with an explicit center offset.
    Native,
    /// A sequence of linear draws within the tessellation tolerance.
    #[default]
    Tessellated,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentConfig {
    pub format: NumberFormat,
    pub units: Units,
    pub arc_mode: ArcMode,
    /// Maximum distance, in millimeters, between a tessellated arc and its chords.
    pub tolerance: f64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            format: NumberFormat::default(),
            units: Units::default(),
            arc_mode: ArcMode::default(),
            tolerance: 0.005,
        }
    }
}

impl DocumentConfig {
    pub fn with_arc_mode(mut self, arc_mode: ArcMode) -> Self {
        self.arc_mode = arc_mode;
        self
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.format.validate()?;
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::Configuration(format!(
                "tessellation tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}
