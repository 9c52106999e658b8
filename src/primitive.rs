use log::trace;

use crate::aperture::Aperture;
use crate::config::DocumentConfig;
use crate::error::{Error, Result};
use crate::font::FontRegistry;
use crate::geometry::flattening::segment_count;
use crate::geometry::BoundingBox;
use crate::spacial::deduplicate::DedupEpsilon;
use crate::spacial::{is_finite, Rotate};
use crate::text::{self, Anchor, TextLayout};
use crate::types::{Exposure, Shape};
use crate::{Position, Vector};

/// What a primitive needs from its document to be measured or emitted.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub config: &'a DocumentConfig,
    pub fonts: &'a FontRegistry,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a DocumentConfig, fonts: &'a FontRegistry) -> Self {
        Self {
            config,
            fonts,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Circle(Circle),
    Line(Line),
    Arc(Arc),
    Polygon(Polygon),
    Text(Text),
}

impl Primitive {
    pub fn bounding_box(&self, context: &RenderContext) -> Result<BoundingBox> {
        match self {
            Primitive::Circle(circle) => Ok(circle.bounding_box()),
            Primitive::Line(line) => Ok(line.bounding_box()),
            Primitive::Arc(arc) => arc.bounding_box(arc.tolerance_or(context.config.tolerance)),
            Primitive::Polygon(polygon) => Ok(polygon.bounding_box()),
            Primitive::Text(text) => Ok(text.layout(context.fonts)?.bounding_box),
        }
    }

    /// The aperture drawing this primitive, regions need none.
    pub fn aperture(&self) -> Option<Aperture> {
        match self {
            Primitive::Circle(circle) => Some(Aperture::circle(circle.diameter)),
            Primitive::Line(line) => Some(Aperture::new(line.shape, line.width)),
            Primitive::Arc(arc) => Some(Aperture::new(arc.shape, arc.width)),
            Primitive::Polygon(_) | Primitive::Text(_) => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Primitive::Circle(circle) => circle.validate(),
            Primitive::Line(line) => line.validate(),
            Primitive::Arc(arc) => arc.validate(),
            Primitive::Polygon(polygon) => polygon.validate(),
            Primitive::Text(text) => text.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Circle(_) => "circle",
            Primitive::Line(_) => "line",
            Primitive::Arc(_) => "arc",
            Primitive::Polygon(_) => "polygon",
            Primitive::Text(_) => "text",
        }
    }
}

fn require_finite(position: &Position, what: &str) -> Result<()> {
    if !is_finite(position) {
        return Err(Error::Geometry(format!("{} {:?} is not finite", what, position)));
    }
    Ok(())
}

fn require_positive(value: f64, what: &str) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(Error::Geometry(format!("{} must be positive, got {}", what, value)));
    }
    Ok(())
}

/// A round pad, flashed with a round aperture. On the drill layer, a hole.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Position,
    pub diameter: f64,
}

impl Circle {
    pub fn new(center: Position, diameter: f64) -> Self {
        Self {
            center,
            diameter,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.center, self.diameter / 2.0)
    }

    pub fn validate(&self) -> Result<()> {
        require_finite(&self.center, "center")?;
        require_positive(self.diameter, "diameter")
    }
}

/// A straight trace stroked with an aperture of the cap shape and trace width.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Position,
    pub end: Position,
    pub shape: Shape,
    pub width: f64,
}

impl Line {
    pub fn new(start: Position, end: Position, shape: Shape, width: f64) -> Self {
        Self {
            start,
            end,
            shape,
            width,
        }
    }

    /// Exact for both cap shapes, the stroke of a square aperture is the widest along either axis at its end-points.
    pub fn bounding_box(&self) -> BoundingBox {
        let half_width = self.width / 2.0;
        BoundingBox::around(self.start, half_width).merge(&BoundingBox::around(self.end, half_width))
    }

    pub fn validate(&self) -> Result<()> {
        require_finite(&self.start, "start")?;
        require_finite(&self.end, "end")?;
        require_positive(self.width, "trace width")
    }
}

/// A circular or elliptical arc trace.
///
/// Angles are in degrees, counter-clockwise from the positive x axis. A start angle greater than the end
/// angle sweeps clockwise. The axis scales stretch (or, when negative, mirror) the circle along each axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub center: Position,
    pub radius: f64,
    pub shape: Shape,
    pub x_scale: f64,
    pub y_scale: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub width: f64,
    /// Maximum chord deviation when tessellated, the document tolerance when `None`.
    pub tolerance: Option<f64>,
}

impl Arc {
    pub fn new(center: Position, radius: f64, shape: Shape, start_angle: f64, end_angle: f64, width: f64) -> Self {
        Self {
            center,
            radius,
            shape,
            x_scale: 1.0,
            y_scale: 1.0,
            start_angle,
            end_angle,
            width,
            tolerance: None,
        }
    }

    pub fn with_scale(mut self, x_scale: f64, y_scale: f64) -> Self {
        self.x_scale = x_scale;
        self.y_scale = y_scale;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn tolerance_or(&self, default: f64) -> f64 {
        self.tolerance.unwrap_or(default)
    }

    /// Signed sweep in degrees, positive counter-clockwise.
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    pub fn is_full_circle(&self) -> bool {
        self.sweep().abs() >= 360.0
    }

    pub fn point_at(&self, degrees: f64) -> Position {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.center + Vector::new(self.radius * cos * self.x_scale, self.radius * sin * self.y_scale)
    }

    pub fn start(&self) -> Position {
        self.point_at(self.start_angle)
    }

    pub fn end(&self) -> Position {
        self.point_at(self.end_angle)
    }

    /// True when the scaled arc is still a circle, so it can be written as a circular interpolation.
    pub fn is_circular(&self) -> bool {
        self.x_scale.abs() == self.y_scale.abs()
    }

    /// An axis mirrored by a negative scale reverses the drawing direction.
    pub fn is_mirrored(&self) -> bool {
        self.x_scale * self.y_scale < 0.0
    }

    /// Drawing direction as written, after mirroring.
    pub fn is_clockwise(&self) -> bool {
        (self.sweep() < 0.0) != self.is_mirrored()
    }

    /// Radius of the largest scaled axis, which bounds the curvature.
    pub fn scaled_radius(&self) -> f64 {
        self.radius * self.x_scale.abs().max(self.y_scale.abs())
    }

    /// Chord end-points, starting at the start angle and ending at the end angle, each chord within `tolerance`.
    pub fn points(&self, tolerance: f64) -> Result<Vec<Position>> {
        let sweep = self.sweep().clamp(-360.0, 360.0);
        let count = segment_count(self.scaled_radius(), sweep.to_radians(), tolerance)?;
        let step = sweep / count as f64;
        trace!("arc points, sweep: {}, segments: {}", sweep, count);

        Ok((0..=count)
            .map(|index| self.point_at(self.start_angle + step * index as f64))
            .collect())
    }

    pub fn bounding_box(&self, tolerance: f64) -> Result<BoundingBox> {
        let half_width = self.width / 2.0;

        if self.is_full_circle() {
            let half_x = self.radius * self.x_scale.abs() + half_width;
            let half_y = self.radius * self.y_scale.abs() + half_width;
            return Ok(BoundingBox::new(
                self.center - Vector::new(half_x, half_y),
                self.center + Vector::new(half_x, half_y),
            ));
        }

        let mut points = self.points(tolerance)?;
        points.extend(self.axis_extremes().into_iter().map(|angle| self.point_at(angle)));

        let mut bbox = BoundingBox::default();
        for point in points {
            bbox.expand(&BoundingBox::around(point, half_width));
        }
        Ok(bbox)
    }

    /// The multiples of 90 degrees strictly inside the sweep, where the arc touches its box.
    fn axis_extremes(&self) -> Vec<f64> {
        let (from, to) = match self.start_angle <= self.end_angle {
            true => (self.start_angle, self.end_angle),
            false => (self.end_angle, self.start_angle),
        };
        let first = (from / 90.0).floor() + 1.0;
        let last = (to / 90.0).ceil() - 1.0;
        // a sweep under a full turn crosses at most four axes
        (0..4)
            .map(|offset| first + offset as f64)
            .take_while(|quadrant| *quadrant <= last)
            .map(|quadrant| quadrant * 90.0)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        require_finite(&self.center, "center")?;
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            return Err(Error::Geometry(format!("radius must not be negative, got {}", self.radius)));
        }
        if !(self.start_angle.is_finite() && self.end_angle.is_finite()) {
            return Err(Error::Geometry(format!(
                "arc angles {}..{} are not finite",
                self.start_angle, self.end_angle
            )));
        }
        for (axis, scale) in [("x", self.x_scale), ("y", self.y_scale)] {
            if !scale.is_finite() || scale == 0.0 {
                return Err(Error::Geometry(format!("{} scale must be finite and non-zero, got {}", axis, scale)));
            }
        }
        if let Some(tolerance) = self.tolerance {
            require_positive(tolerance, "arc tolerance")?;
        }
        require_positive(self.width, "trace width")
    }
}

/// A filled region, or a cleared one when its exposure is [`Exposure::CutOut`].
///
/// Vertices are rotated about the coordinate origin, then moved by `origin`. The contour is closed implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub origin: Position,
    pub points: Vec<Position>,
    pub exposure: Exposure,
    /// Degrees, counter-clockwise.
    pub rotation: f64,
}

impl Polygon {
    pub fn new(points: Vec<Position>) -> Self {
        Self {
            origin: Position::new(0.0, 0.0),
            points,
            exposure: Exposure::Add,
            rotation: 0.0,
        }
    }

    pub fn with_origin(mut self, origin: Position) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_exposure(mut self, exposure: Exposure) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn with_filled(self, filled: bool) -> Self {
        self.with_exposure(Exposure::from(filled))
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Vertices in board coordinates.
    pub fn vertices(&self) -> Vec<Position> {
        let offset = self.origin.coords;
        self.points
            .iter()
            .map(|point| point.rotate_degrees(self.rotation) + offset)
            .collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices())
    }

    pub fn validate(&self) -> Result<()> {
        require_finite(&self.origin, "origin")?;
        if !self.rotation.is_finite() {
            return Err(Error::Geometry(format!("rotation {} is not finite", self.rotation)));
        }
        for point in &self.points {
            require_finite(point, "vertex")?;
        }
        let distinct = self
            .points
            .clone()
            .dedup_with_epsilon(f64::EPSILON)
            .len();
        if distinct < 3 {
            return Err(Error::Geometry(format!(
                "polygon needs at least 3 distinct vertices, got {}",
                distinct
            )));
        }
        Ok(())
    }
}

/// Vector text, compiled into glyph polygons by [`text::layout`] when measured or written.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub origin: Position,
    pub scale: f64,
    pub message: String,
    pub font: String,
    pub point_size: f64,
    pub anchor: Anchor,
}

impl Text {
    pub fn new(origin: Position, message: impl Into<String>, font: impl Into<String>, point_size: f64) -> Self {
        Self {
            origin,
            scale: 1.0,
            message: message.into(),
            font: font.into(),
            point_size,
            anchor: Anchor::default(),
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn layout(&self, fonts: &FontRegistry) -> Result<TextLayout> {
        let font = fonts.get(&self.font)?;
        text::layout(&self.message, font, self.point_size, self.scale, self.anchor, self.origin)
    }

    /// Text box size `(width, height)` in millimeters.
    pub fn size(&self, fonts: &FontRegistry) -> Result<(f64, f64)> {
        let font = fonts.get(&self.font)?;
        text::measure(&self.message, font, self.point_size, self.scale)
    }

    pub fn validate(&self) -> Result<()> {
        require_finite(&self.origin, "origin")?;
        require_positive(self.point_size, "point size")?;
        require_positive(self.scale, "text scale")
    }
}

impl From<Circle> for Primitive {
    fn from(value: Circle) -> Self {
        Primitive::Circle(value)
    }
}

impl From<Line> for Primitive {
    fn from(value: Line) -> Self {
        Primitive::Line(value)
    }
}

impl From<Arc> for Primitive {
    fn from(value: Arc) -> Self {
        Primitive::Arc(value)
    }
}

impl From<Polygon> for Primitive {
    fn from(value: Polygon) -> Self {
        Primitive::Polygon(value)
    }
}

impl From<Text> for Primitive {
    fn from(value: Text) -> Self {
        Primitive::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::geometry::flattening::chord_deviation;
    use crate::testing::{block_font, BLOCK_FONT};

    const EPSILON: f64 = 1e-9;

    fn context_parts() -> (DocumentConfig, FontRegistry) {
        let mut fonts = FontRegistry::new();
        fonts.register(block_font());
        (DocumentConfig::default(), fonts)
    }

    #[rstest]
    #[case(Position::new(0.0, 0.0), 2.0)]
    #[case(Position::new(-3.5, 12.25), 0.5)]
    #[case(Position::new(100.0, -100.0), 0.001)]
    fn circle_box_is_diameter_square_around_center(#[case] center: Position, #[case] diameter: f64) {
        let bbox = Circle::new(center, diameter).bounding_box();

        assert!((bbox.width() - diameter).abs() < EPSILON);
        assert!((bbox.height() - diameter).abs() < EPSILON);
        assert!((bbox.center() - center).norm() < EPSILON);
    }

    #[rstest]
    #[case(Shape::Circle)]
    #[case(Shape::Rect)]
    fn line_box_covers_both_caps(#[case] shape: Shape) {
        let line = Line::new(Position::new(0.0, 0.0), Position::new(10.0, 5.0), shape, 0.5);

        let bbox = line.bounding_box();

        assert_eq!(bbox.min, Position::new(-0.25, -0.25));
        assert_eq!(bbox.max, Position::new(10.25, 5.25));
    }

    #[test]
    fn line_aperture_is_cap_shape_and_width() {
        let primitive = Primitive::from(Line::new(Position::new(0.0, 0.0), Position::new(1.0, 0.0), Shape::Rect, 0.15));

        assert_eq!(primitive.aperture(), Some(Aperture::new(Shape::Rect, 0.15)));
    }

    #[test]
    fn regions_need_no_aperture() {
        let polygon = Primitive::from(Polygon::new(vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(0.0, 1.0),
        ]));
        let text = Primitive::from(Text::new(Position::new(0.0, 0.0), "0", BLOCK_FONT, 10.0));

        assert_eq!(polygon.aperture(), None);
        assert_eq!(text.aperture(), None);
    }

    #[test]
    fn arc_points_run_from_start_to_end() {
        let arc = Arc::new(Position::new(1.0, 1.0), 2.0, Shape::Circle, 0.0, 90.0, 0.1);

        let points = arc.points(0.01).unwrap();

        assert!((points[0] - Position::new(3.0, 1.0)).norm() < EPSILON);
        assert!((points[points.len() - 1] - Position::new(1.0, 3.0)).norm() < EPSILON);
    }

    #[rstest]
    #[case(1.0, 0.0, 360.0, 0.01)]
    #[case(25.0, 45.0, 300.0, 0.005)]
    #[case(3.0, 90.0, -180.0, 0.001)]
    #[case(0.2, 0.0, 30.0, 0.5)]
    fn tessellated_chords_stay_within_tolerance(
        #[case] radius: f64,
        #[case] start: f64,
        #[case] end: f64,
        #[case] tolerance: f64,
    ) {
        // given
        let arc = Arc::new(Position::new(0.0, 0.0), radius, Shape::Circle, start, end, 0.1);

        // when
        let points = arc.points(tolerance).unwrap();

        // then
        for chord in points.windows(2) {
            let length = (chord[1] - chord[0]).norm();
            let step = 2.0 * (length / (2.0 * radius)).min(1.0).asin();
            assert!(chord_deviation(radius, step) <= tolerance + 1e-9);

            // the midpoint of the chord is the point farthest from the arc
            let midpoint = Position::from((chord[0].coords + chord[1].coords) / 2.0);
            assert!(radius - midpoint.coords.norm() <= tolerance + 1e-9);
        }
    }

    #[test]
    fn full_circle_arc_box_is_the_enclosing_square() {
        let arc = Arc::new(Position::new(5.0, 5.0), 10.0, Shape::Circle, 0.0, 360.0, 0.2);

        let bbox = arc.bounding_box(0.01).unwrap();

        assert!((bbox.min - Position::new(-5.1, -5.1)).norm() < EPSILON);
        assert!((bbox.max - Position::new(15.1, 15.1)).norm() < EPSILON);
    }

    #[test]
    fn partial_arc_box_includes_axis_extremes() {
        // a quarter arc from 45 to 135 degrees peaks at 90 degrees
        let arc = Arc::new(Position::new(0.0, 0.0), 1.0, Shape::Circle, 45.0, 135.0, 0.2);

        let bbox = arc.bounding_box(0.5).unwrap();

        assert!((bbox.max.y - 1.1).abs() < EPSILON);
        let corner = 45f64.to_radians().cos();
        assert!((bbox.min.x + corner + 0.1).abs() < EPSILON);
        assert!((bbox.max.x - corner - 0.1).abs() < EPSILON);
        assert!((bbox.min.y - (corner - 0.1)).abs() < EPSILON);
    }

    #[test]
    fn tolerance_too_fine_for_the_radius_is_an_error() {
        let arc = Arc::new(Position::new(0.0, 0.0), 1.0, Shape::Circle, 0.0, 90.0, 0.1).with_tolerance(1e-17);
        let fonts = FontRegistry::new();
        let config = DocumentConfig::default();

        let result = Primitive::from(arc).bounding_box(&RenderContext::new(&config, &fonts));

        assert!(matches!(result, Err(Error::Geometry(_))));
    }

    #[test]
    fn arc_far_from_angle_zero_has_a_bounded_box() {
        let arc = Arc::new(Position::new(0.0, 0.0), 1.0, Shape::Circle, 1.0e300, 1.0e300, 0.2);

        let bbox = arc.bounding_box(0.01).unwrap();

        assert!(bbox.width() <= 2.2 + EPSILON);
        assert!(bbox.height() <= 2.2 + EPSILON);
    }

    #[test]
    fn mirrored_arc_reverses_direction() {
        let arc = Arc::new(Position::new(0.0, 0.0), 1.0, Shape::Circle, 0.0, 90.0, 0.1);
        let mirrored = arc.clone().with_scale(-1.0, 1.0);

        assert!(!arc.is_clockwise());
        assert!(mirrored.is_clockwise());
        assert!(mirrored.is_circular());
        assert!((mirrored.end() - Position::new(0.0, 1.0)).norm() < EPSILON);
        assert!((mirrored.start() - Position::new(-1.0, 0.0)).norm() < EPSILON);
    }

    #[test]
    fn elliptical_arc_is_not_circular() {
        let arc = Arc::new(Position::new(0.0, 0.0), 1.0, Shape::Circle, 0.0, 90.0, 0.1).with_scale(2.0, 1.0);

        assert!(!arc.is_circular());
        assert!((arc.start() - Position::new(2.0, 0.0)).norm() < EPSILON);
    }

    #[test]
    fn polygon_vertices_are_rotated_then_moved() {
        let polygon = Polygon::new(vec![
            Position::new(1.0, 0.0),
            Position::new(0.0, 1.0),
            Position::new(-1.0, 0.0),
        ])
        .with_origin(Position::new(10.0, 10.0))
        .with_rotation(90.0);

        let vertices = polygon.vertices();

        assert!((vertices[0] - Position::new(10.0, 11.0)).norm() < EPSILON);
        assert!((vertices[1] - Position::new(9.0, 10.0)).norm() < EPSILON);
        assert!((vertices[2] - Position::new(10.0, 9.0)).norm() < EPSILON);
    }

    #[rstest]
    #[case(Primitive::from(Circle::new(Position::new(0.0, 0.0), 0.0)))]
    #[case(Primitive::from(Circle::new(Position::new(f64::NAN, 0.0), 1.0)))]
    #[case(Primitive::from(Line::new(Position::new(0.0, 0.0), Position::new(1.0, 0.0), Shape::Circle, -0.1)))]
    #[case(Primitive::from(Arc::new(Position::new(0.0, 0.0), -1.0, Shape::Circle, 0.0, 90.0, 0.1)))]
    #[case(Primitive::from(Arc::new(Position::new(0.0, 0.0), 1.0, Shape::Circle, 0.0, 90.0, 0.1).with_scale(0.0, 1.0)))]
    #[case(Primitive::from(Polygon::new(vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0), Position::new(0.0, 0.0)])))]
    #[case(Primitive::from(Text::new(Position::new(0.0, 0.0), "0", BLOCK_FONT, 0.0)))]
    fn degenerate_primitives_are_geometry_errors(#[case] primitive: Primitive) {
        assert!(matches!(primitive.validate(), Err(Error::Geometry(_))));
    }

    #[test]
    fn text_box_translates_with_its_origin() {
        let (config, fonts) = context_parts();
        let context = RenderContext::new(&config, &fonts);

        for anchor in [Anchor::BOTTOM_LEFT, Anchor::CENTER, Anchor::TOP_RIGHT, Anchor::CENTER_LEFT] {
            let at_origin = Primitive::from(Text::new(Position::new(0.0, 0.0), "012", BLOCK_FONT, 18.0).with_anchor(anchor));
            let moved = Primitive::from(Text::new(Position::new(4.0, -2.0), "012", BLOCK_FONT, 18.0).with_anchor(anchor));

            let a = at_origin.bounding_box(&context).unwrap();
            let b = moved.bounding_box(&context).unwrap();

            assert!((b.min - (a.min + Vector::new(4.0, -2.0))).norm() < 1e-6);
            assert!((b.width() - a.width()).abs() < 1e-6);
            assert!((b.height() - a.height()).abs() < 1e-6);
        }
    }

    #[test]
    fn text_with_unknown_font_fails_lookup() {
        let (config, fonts) = context_parts();
        let context = RenderContext::new(&config, &fonts);
        let text = Primitive::from(Text::new(Position::new(0.0, 0.0), "012", "freeserif", 18.0));

        assert!(matches!(text.bounding_box(&context), Err(Error::Lookup(_))));
    }
}
