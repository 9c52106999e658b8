//! Conversion of millimeter coordinates into the fixed-point integers written to the output files.

use crate::config::{NumberFormat, Units};
use crate::error::{Error, Result};
use crate::Position;

/// Scales `value` by `10^decimal` and rounds to the nearest integer, ties away from zero.
pub fn quantize(value: f64, decimal: u8) -> i64 {
    (value * 10f64.powi(decimal as i32)).round() as i64
}

pub fn dequantize(value: i64, decimal: u8) -> f64 {
    value as f64 / 10f64.powi(decimal as i32)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    format: NumberFormat,
    units: Units,
}

impl Quantizer {
    pub fn new(format: NumberFormat, units: Units) -> Self {
        Self {
            format,
            units,
        }
    }

    pub fn format(&self) -> NumberFormat {
        self.format
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Quantizes a millimeter coordinate, failing when it needs more integer digits than the format declares.
    pub fn coordinate(&self, millimeters: f64) -> Result<i64> {
        if !millimeters.is_finite() {
            return Err(Error::Geometry(format!("coordinate {} is not finite", millimeters)));
        }

        let value = self.units.from_millimeters(millimeters);
        let scaled = (value * 10f64.powi(self.format.decimal as i32)).round();
        let limit = 10f64.powi((self.format.integer + self.format.decimal) as i32);
        if scaled.abs() >= limit {
            return Err(Error::Overflow {
                value,
                integer: self.format.integer,
                decimal: self.format.decimal,
            });
        }

        Ok(scaled as i64)
    }

    pub fn position(&self, position: Position) -> Result<(i64, i64)> {
        Ok((self.coordinate(position.x)?, self.coordinate(position.y)?))
    }

    /// Quantizes a size (diameter, width), which must stay positive at the declared precision.
    pub fn dimension(&self, millimeters: f64) -> Result<i64> {
        let value = self.coordinate(millimeters)?;
        if value <= 0 {
            return Err(Error::Geometry(format!(
                "dimension {} mm is not representable with {} decimal digits",
                millimeters, self.format.decimal
            )));
        }
        Ok(value)
    }

    /// The value of a quantized number in output units.
    pub fn to_units(&self, value: i64) -> f64 {
        dequantize(value, self.format.decimal)
    }
}
