//! Excellon drill output.
//!
//! Tools are defined in the `M48` header, keyed by hole diameter, then every hole is listed under its tool.
//! Coordinates carry an explicit decimal point, so no zero suppression mode applies to them.

use std::io::Write;

use log::{debug, trace};

use crate::aperture::ToolTable;
use crate::config::Units;
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::primitive::{Circle, Primitive};
use crate::quantize::Quantizer;

pub struct ExcellonWriter {
    quantizer: Quantizer,
}

impl ExcellonWriter {
    pub fn new(quantizer: Quantizer) -> Self {
        Self {
            quantizer,
        }
    }

    fn hole<'p>(&self, primitive: &'p Primitive) -> Result<&'p Circle> {
        match primitive {
            Primitive::Circle(circle) => {
                circle.validate()?;
                Ok(circle)
            }
            other => Err(Error::Geometry(format!(
                "drill layers only hold circles, found a {}",
                other.kind()
            ))),
        }
    }

    /// Scans the layer once, returning the tool table and the tool of every hole, in layer order.
    pub fn tool_table<'l>(&self, layer: &'l Layer) -> Result<(ToolTable, Vec<(i32, &'l Circle)>)> {
        let mut tools = ToolTable::new(self.quantizer);
        let mut holes = Vec::with_capacity(layer.len());
        for (index, primitive) in layer.primitives().iter().enumerate() {
            let hole = self
                .hole(primitive)
                .and_then(|hole| Ok((tools.register(hole.diameter)?, hole)))
                .map_err(|error| error.at(layer.role(), index))?;
            holes.push(hole);
        }
        debug!("{} layer, tools: {}, holes: {}", layer.role(), tools.len(), holes.len());
        Ok((tools, holes))
    }

    #[profiling::function]
    pub fn write<W: Write>(&self, layer: &Layer, out: &mut W) -> Result<()> {
        let (tools, holes) = self.tool_table(layer)?;
        let decimal = self.quantizer.format().decimal;

        writeln!(out, "M48")?;
        match self.quantizer.units() {
            Units::Millimeters => writeln!(out, "METRIC,TZ")?,
            Units::Inches => writeln!(out, "INCH,TZ")?,
        }
        for (tool, diameter) in tools.tools() {
            writeln!(out, "T{}C{:.*}", tool, decimal as usize, diameter)?;
        }
        writeln!(out, "%")?;
        // absolute coordinates, drill mode
        writeln!(out, "G90")?;
        writeln!(out, "G05")?;

        for (tool, _) in tools.tools() {
            writeln!(out, "T{}", tool)?;
            for (index, (_, hole)) in holes
                .iter()
                .enumerate()
                .filter(|(_, (hole_tool, _))| *hole_tool == tool)
            {
                let (x, y) = self
                    .quantizer
                    .position(hole.center)
                    .map_err(|error| error.at(layer.role(), index))?;
                trace!("T{} hole {} at {:?}", tool, index, hole.center);
                writeln!(out, "X{}Y{}", decimal_string(x, decimal), decimal_string(y, decimal))?;
            }
        }

        writeln!(out, "M30")?;
        Ok(())
    }
}

/// Formats a quantized value with its decimal point restored, e.g. `-1250` with 3 decimals is `-1.250`.
pub fn decimal_string(value: i64, decimal: u8) -> String {
    let scale = 10u64.pow(decimal as u32);
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    format!(
        "{}{}.{:0width$}",
        sign,
        magnitude / scale,
        magnitude % scale,
        width = decimal as usize
    )
}
