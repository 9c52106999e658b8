//! RS-274X output for one layer.
//!
//! Mode and aperture statements are serialized through `gerber_types`, coordinate words are formatted here so
//! that rounding and overflow follow the document [`Quantizer`].

use std::io::Write;

use gerber_types::{
    Command, CoordinateFormat, DCode, ExtendedCode, FunctionCode, GCode, GerberCode, InterpolationMode, MCode, Polarity,
    QuadrantMode,
};
use log::{debug, trace};

use crate::aperture::ApertureTable;
use crate::config::ArcMode;
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::primitive::{Arc, Polygon, Primitive, RenderContext};
use crate::quantize::Quantizer;
use crate::types::Exposure;
use crate::Position;

type Point = (i64, i64);

/// Writes Gerber layers for one document.
#[derive(Debug, Clone, Copy)]
pub struct GerberWriter<'a> {
    context: RenderContext<'a>,
    quantizer: Quantizer,
    copper_layers: u8,
}

impl<'a> GerberWriter<'a> {
    pub fn new(context: RenderContext<'a>, copper_layers: u8) -> Self {
        let quantizer = Quantizer::new(context.config.format, context.config.units);
        Self {
            context,
            quantizer,
            copper_layers,
        }
    }

    /// Scans the layer once, registering every aperture it needs in first-use order.
    pub fn aperture_table(&self, layer: &Layer) -> Result<ApertureTable> {
        let mut table = ApertureTable::new(self.quantizer);
        for (index, primitive) in layer.primitives().iter().enumerate() {
            self.check(primitive)
                .and_then(|_| match primitive.aperture() {
                    Some(aperture) => table.register(&aperture).map(|_| ()),
                    None => Ok(()),
                })
                .map_err(|error| error.at(layer.role(), index))?;
        }
        debug!("{} layer, apertures: {}", layer.role(), table.len());
        Ok(table)
    }

    fn check(&self, primitive: &Primitive) -> Result<()> {
        primitive.validate()?;
        if let Primitive::Arc(arc) = primitive {
            if self.context.config.arc_mode == ArcMode::Native && arc.radius == 0.0 && arc.sweep() != 0.0 {
                return Err(Error::Geometry(format!(
                    "zero radius arc sweeping {} degrees has no circular interpolation",
                    arc.sweep()
                )));
            }
        }
        Ok(())
    }

    #[profiling::function]
    pub fn write<W: Write>(&self, layer: &Layer, out: &mut W) -> Result<()> {
        let apertures = self.aperture_table(layer)?;

        let mut emitter = Emitter::new(out, self.quantizer);
        emitter.header(layer, self.copper_layers, &apertures)?;

        for (index, primitive) in layer.primitives().iter().enumerate() {
            self.primitive(&mut emitter, &apertures, primitive)
                .map_err(|error| error.at(layer.role(), index))?;
        }

        emitter.command(FunctionCode::MCode(MCode::EndOfFile).into())?;
        Ok(())
    }

    fn primitive<W: Write>(&self, emitter: &mut Emitter<W>, apertures: &ApertureTable, primitive: &Primitive) -> Result<()> {
        trace!("primitive: {:?}", primitive);

        if let Some(aperture) = primitive.aperture() {
            let code = apertures
                .code(&aperture)?
                .ok_or_else(|| Error::Geometry(format!("aperture {:?} was not registered", aperture)))?;
            emitter.select(code)?;
        }

        match primitive {
            Primitive::Circle(circle) => emitter.flash(circle.center),
            Primitive::Line(line) => {
                emitter.move_to(line.start)?;
                emitter.draw(line.end)
            }
            Primitive::Arc(arc) => self.arc(emitter, arc),
            Primitive::Polygon(polygon) => emitter.region(polygon),
            Primitive::Text(text) => {
                let layout = text.layout(self.context.fonts)?;
                for polygon in &layout.polygons {
                    emitter.region(polygon)?;
                }
                Ok(())
            }
        }
    }

    fn arc<W: Write>(&self, emitter: &mut Emitter<W>, arc: &Arc) -> Result<()> {
        let native = match self.context.config.arc_mode {
            ArcMode::Native if arc.is_circular() => true,
            ArcMode::Native => {
                debug!(
                    "arc with scale {}x{} is not circular, tessellating",
                    arc.x_scale, arc.y_scale
                );
                false
            }
            ArcMode::Tessellated => false,
        };

        if native && arc.sweep() != 0.0 {
            emitter.move_to(arc.start())?;
            emitter.circular(arc.end(), arc.center, arc.is_clockwise(), arc.is_full_circle())
        } else {
            let points = arc.points(arc.tolerance_or(self.context.config.tolerance))?;
            let mut points = points.into_iter();
            if let Some(first) = points.next() {
                emitter.move_to(first)?;
            }
            for point in points {
                emitter.draw(point)?;
            }
            Ok(())
        }
    }
}

/// Serializes statements while tracking the graphics state, so no mode or aperture is selected twice in a row.
struct Emitter<'w, W: Write> {
    out: &'w mut W,
    quantizer: Quantizer,
    aperture: Option<i32>,
    interpolation: InterpolationMode,
    position: Option<Point>,
}

impl<'w, W: Write> Emitter<'w, W> {
    fn new(out: &'w mut W, quantizer: Quantizer) -> Self {
        Self {
            out,
            quantizer,
            aperture: None,
            interpolation: InterpolationMode::Linear,
            position: None,
        }
    }

    fn command(&mut self, command: Command) -> Result<()> {
        command.serialize(&mut *self.out)?;
        Ok(())
    }

    fn header(&mut self, layer: &Layer, copper_layers: u8, apertures: &ApertureTable) -> Result<()> {
        if let Some(function) = layer.role().file_function(copper_layers) {
            writeln!(self.out, "%TF.FileFunction,{}*%", function)?;
        }

        let format = self.quantizer.format();
        let mut commands = vec![
            Command::ExtendedCode(ExtendedCode::CoordinateFormat(CoordinateFormat::new(
                format.integer,
                format.decimal,
            ))),
            Command::ExtendedCode(ExtendedCode::Unit(self.quantizer.units().into())),
            Command::ExtendedCode(ExtendedCode::LoadPolarity(Polarity::Dark)),
            GCode::QuadrantMode(QuadrantMode::Multi).into(),
            GCode::InterpolationMode(InterpolationMode::Linear).into(),
        ];
        commands.extend(
            apertures
                .definitions()
                .into_iter()
                .map(|definition| Command::ExtendedCode(ExtendedCode::ApertureDefinition(definition))),
        );
        commands.serialize(&mut *self.out)?;
        Ok(())
    }

    fn select(&mut self, code: i32) -> Result<()> {
        if self.aperture == Some(code) {
            return Ok(());
        }
        self.command(DCode::SelectAperture(code).into())?;
        self.aperture = Some(code);
        Ok(())
    }

    fn interpolation(&mut self, mode: InterpolationMode) -> Result<()> {
        if self.interpolation == mode {
            return Ok(());
        }
        self.command(GCode::InterpolationMode(mode).into())?;
        self.interpolation = mode;
        Ok(())
    }

    fn flash(&mut self, position: Position) -> Result<()> {
        let (x, y) = self.quantizer.position(position)?;
        writeln!(self.out, "X{}Y{}D03*", x, y)?;
        self.position = Some((x, y));
        Ok(())
    }

    /// Moves with the exposure off, skipped when already there.
    fn move_to(&mut self, position: Position) -> Result<()> {
        let point = self.quantizer.position(position)?;
        self.move_to_point(point)
    }

    fn move_to_point(&mut self, point: Point) -> Result<()> {
        if self.position == Some(point) {
            return Ok(());
        }
        self.start_at(point)
    }

    /// Always writes the `D02`, every region contour has to open with one.
    fn start_at(&mut self, point: Point) -> Result<()> {
        writeln!(self.out, "X{}Y{}D02*", point.0, point.1)?;
        self.position = Some(point);
        Ok(())
    }

    fn draw(&mut self, position: Position) -> Result<()> {
        let point = self.quantizer.position(position)?;
        self.draw_to_point(point)
    }

    fn draw_to_point(&mut self, point: Point) -> Result<()> {
        self.interpolation(InterpolationMode::Linear)?;
        writeln!(self.out, "X{}Y{}D01*", point.0, point.1)?;
        self.position = Some(point);
        Ok(())
    }

    /// Circular interpolation from the current point, the center given as an offset from it.
    ///
    /// In multi quadrant mode equal start and end points draw a full circle, so a partial arc whose ends meet at
    /// the output resolution is written as a straight draw instead.
    fn circular(&mut self, end: Position, center: Position, clockwise: bool, full_circle: bool) -> Result<()> {
        let start = self
            .position
            .ok_or_else(|| Error::Geometry("circular interpolation without a current point".to_string()))?;
        let end = self.quantizer.position(end)?;
        let center = self.quantizer.position(center)?;

        if end == start && !full_circle {
            trace!("arc ends meet at {:?}, drawing a line", end);
            return self.draw_to_point(end);
        }

        let mode = match clockwise {
            true => InterpolationMode::ClockwiseCircular,
            false => InterpolationMode::CounterclockwiseCircular,
        };
        self.interpolation(mode)?;
        writeln!(
            self.out,
            "X{}Y{}I{}J{}D01*",
            end.0,
            end.1,
            center.0 - start.0,
            center.1 - start.1
        )?;
        self.position = Some(end);
        Ok(())
    }

    /// A `G36`/`G37` region drawn back to its first vertex, cleared with `%LPC*%` for cut-out polygons.
    fn region(&mut self, polygon: &Polygon) -> Result<()> {
        let mut points: Vec<Point> = polygon
            .vertices()
            .into_iter()
            .map(|vertex| self.quantizer.position(vertex))
            .collect::<Result<_>>()?;
        points.dedup();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return Err(Error::Geometry(format!(
                "polygon collapses to {} distinct vertices at the output resolution",
                points.len()
            )));
        }

        let clear = polygon.exposure == Exposure::CutOut;
        if clear {
            self.command(Command::ExtendedCode(ExtendedCode::LoadPolarity(Polarity::Clear)))?;
        }

        self.command(GCode::RegionMode(true).into())?;
        self.start_at(points[0])?;
        for point in &points[1..] {
            self.draw_to_point(*point)?;
        }
        self.draw_to_point(points[0])?;
        self.command(GCode::RegionMode(false).into())?;

        if clear {
            self.command(Command::ExtendedCode(ExtendedCode::LoadPolarity(Polarity::Dark)))?;
        }
        Ok(())
    }
}
