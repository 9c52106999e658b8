//! Lays out a message into positioned glyph polygons.

use log::{debug, trace};

use crate::error::Result;
use crate::font::Font;
use crate::geometry::BoundingBox;
use crate::primitive::Polygon;
use crate::types::{signed_area, Exposure, Winding};
use crate::{Position, Vector};

/// Millimeters per point, 72 points to the inch.
pub const MM_PER_POINT: f64 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VAlign {
    Top,
    Center,
    #[default]
    Bottom,
}

/// The point of the text box that is placed on the text origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Anchor {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

impl Anchor {
    pub const TOP_LEFT: Anchor = Anchor::new(HAlign::Left, VAlign::Top);
    pub const TOP_CENTER: Anchor = Anchor::new(HAlign::Center, VAlign::Top);
    pub const TOP_RIGHT: Anchor = Anchor::new(HAlign::Right, VAlign::Top);
    pub const CENTER_LEFT: Anchor = Anchor::new(HAlign::Left, VAlign::Center);
    pub const CENTER: Anchor = Anchor::new(HAlign::Center, VAlign::Center);
    pub const CENTER_RIGHT: Anchor = Anchor::new(HAlign::Right, VAlign::Center);
    pub const BOTTOM_LEFT: Anchor = Anchor::new(HAlign::Left, VAlign::Bottom);
    pub const BOTTOM_CENTER: Anchor = Anchor::new(HAlign::Center, VAlign::Bottom);
    pub const BOTTOM_RIGHT: Anchor = Anchor::new(HAlign::Right, VAlign::Bottom);

    pub const fn new(horizontal: HAlign, vertical: VAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Offset from the bottom-left corner of a `width` x `height` box to the anchor point, negated.
    pub fn offset(&self, width: f64, height: f64) -> Vector {
        let dx = match self.horizontal {
            HAlign::Left => 0.0,
            HAlign::Center => -width / 2.0,
            HAlign::Right => -width,
        };
        let dy = match self.vertical {
            VAlign::Bottom => 0.0,
            VAlign::Center => -height / 2.0,
            VAlign::Top => -height,
        };
        Vector::new(dx, dy)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Filled glyph contours, each glyph's holes following its filled contours.
    pub polygons: Vec<Polygon>,
    pub width: f64,
    pub height: f64,
    /// The anchored text box, which is not the tight box around the glyph outlines.
    pub bounding_box: BoundingBox,
}

/// Size of one em in millimeters.
pub fn millimeters_per_em(point_size: f64, scale: f64) -> f64 {
    point_size * scale * MM_PER_POINT
}

/// Text box size in millimeters, without looking up any outlines.
pub fn measure(message: &str, font: &dyn Font, point_size: f64, scale: f64) -> Result<(f64, f64)> {
    let em = millimeters_per_em(point_size, scale);
    let metrics = font.metrics();

    let mut width: f64 = 0.0;
    let mut lines = 0;
    for line in message.split('\n') {
        let mut advance = 0.0;
        for ch in line.chars() {
            advance += font.glyph(ch)?.advance;
        }
        width = width.max(advance);
        lines += 1;
    }

    Ok((width * em, lines as f64 * metrics.line_height() * em))
}

/// Lays out `message` with the pen starting on the first line, the last line's descent on the bottom of the box,
/// then moves the box so the `anchor` point lands on `origin`.
pub fn layout(
    message: &str,
    font: &dyn Font,
    point_size: f64,
    scale: f64,
    anchor: Anchor,
    origin: Position,
) -> Result<TextLayout> {
    let em = millimeters_per_em(point_size, scale);
    let metrics = font.metrics();
    let line_height = metrics.line_height();

    let lines: Vec<&str> = message.split('\n').collect();
    let line_count = lines.len();

    // at the origin, in em units
    let mut polygons: Vec<(Vec<Position>, Exposure)> = Vec::new();
    let mut width: f64 = 0.0;
    for (index, line) in lines.iter().enumerate() {
        let baseline = (line_count - 1 - index) as f64 * line_height - metrics.descent;
        let mut pen = 0.0;
        for ch in line.chars() {
            let glyph = font.glyph(ch)?;
            let offset = Vector::new(pen, baseline);
            for (contour, exposure) in classify_contours(&glyph.contours) {
                let contour = contour
                    .iter()
                    .map(|vertex| *vertex + offset)
                    .collect();
                polygons.push((contour, exposure));
            }
            pen += glyph.advance;
        }
        width = width.max(pen);
    }

    let width = width * em;
    let height = line_count as f64 * line_height * em;
    let translation = anchor.offset(width, height) + origin.coords;

    debug!(
        "text layout, message: {:?}, width: {}, height: {}, polygons: {}",
        message,
        width,
        height,
        polygons.len()
    );

    let polygons = polygons
        .into_iter()
        .map(|(contour, exposure)| {
            let points = contour
                .into_iter()
                .map(|vertex| Position::new(vertex.x * em, vertex.y * em) + translation)
                .collect();
            Polygon::new(points).with_exposure(exposure)
        })
        .collect();

    let min = Position::new(translation.x, translation.y);
    let bounding_box = BoundingBox::new(min, min + Vector::new(width, height));

    Ok(TextLayout {
        polygons,
        width,
        height,
        bounding_box,
    })
}

/// Splits one glyph's contours into filled outlines and holes.
///
/// Contours wound like the largest one are filled, the rest are holes. Filled contours come first.
fn classify_contours(contours: &[Vec<Position>]) -> Vec<(&Vec<Position>, Exposure)> {
    let Some(outer) = contours
        .iter()
        .max_by(|a, b| signed_area(a).abs().total_cmp(&signed_area(b).abs()))
    else {
        return Vec::new();
    };
    let outer = Winding::from_vertices(outer);

    let (filled, holes): (Vec<_>, Vec<_>) = contours
        .iter()
        .partition(|contour| Winding::from_vertices(contour) == outer);
    trace!("glyph contours, filled: {}, holes: {}", filled.len(), holes.len());

    filled
        .into_iter()
        .map(|contour| (contour, Exposure::Add))
        .chain(
            holes
                .into_iter()
                .map(|contour| (contour, Exposure::CutOut)),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::error::{Error, LookupError};
    use crate::testing::block_font;

    const EPSILON: f64 = 1e-6;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn layout_012_at_72_points() {
        // given
        let font = block_font();

        // when
        let layout = layout("012", &font, 72.0, 1.0, Anchor::default(), Position::new(0.0, 0.0)).unwrap();

        // then
        // 72 points is one inch per em, three glyphs advancing 0.5 em, one line of 1.0 em
        assert_close(layout.width, 38.1);
        assert_close(layout.height, 25.4);
        assert_close(layout.bounding_box.min.x, 0.0);
        assert_close(layout.bounding_box.min.y, 0.0);
        assert_close(layout.bounding_box.max.x, 38.1);
        assert_close(layout.bounding_box.max.y, 25.4);
    }

    #[test]
    fn center_anchor_centers_the_box_on_the_origin() {
        let font = block_font();

        let layout = layout("012", &font, 72.0, 1.0, Anchor::CENTER, Position::new(10.0, 20.0)).unwrap();

        let center = layout.bounding_box.center();
        assert_close(center.x, 10.0);
        assert_close(center.y, 20.0);
        assert_close(layout.bounding_box.width(), 38.1);
        assert_close(layout.bounding_box.height(), 25.4);
    }

    #[rstest]
    #[case(Anchor::TOP_LEFT, (0.0, -1.0))]
    #[case(Anchor::TOP_CENTER, (-0.5, -1.0))]
    #[case(Anchor::TOP_RIGHT, (-1.0, -1.0))]
    #[case(Anchor::CENTER_LEFT, (0.0, -0.5))]
    #[case(Anchor::CENTER, (-0.5, -0.5))]
    #[case(Anchor::CENTER_RIGHT, (-1.0, -0.5))]
    #[case(Anchor::BOTTOM_LEFT, (0.0, 0.0))]
    #[case(Anchor::BOTTOM_CENTER, (-0.5, 0.0))]
    #[case(Anchor::BOTTOM_RIGHT, (-1.0, 0.0))]
    fn anchor_offsets(#[case] anchor: Anchor, #[case] factors: (f64, f64)) {
        let offset = anchor.offset(8.0, 4.0);

        assert_eq!(offset, Vector::new(factors.0 * 8.0, factors.1 * 4.0));
    }

    #[rstest]
    #[case(Anchor::BOTTOM_LEFT)]
    #[case(Anchor::CENTER)]
    #[case(Anchor::TOP_RIGHT)]
    fn translation_only_moves_the_layout(#[case] anchor: Anchor) {
        let font = block_font();
        let at_origin = layout("10\n2", &font, 12.0, 2.0, anchor, Position::new(0.0, 0.0)).unwrap();
        let moved = layout("10\n2", &font, 12.0, 2.0, anchor, Position::new(-3.5, 7.25)).unwrap();

        assert_close(moved.bounding_box.min.x, at_origin.bounding_box.min.x - 3.5);
        assert_close(moved.bounding_box.min.y, at_origin.bounding_box.min.y + 7.25);
        assert_close(moved.width, at_origin.width);
        assert_close(moved.height, at_origin.height);

        for (a, b) in at_origin.polygons.iter().zip(moved.polygons.iter()) {
            for (p, q) in a.points.iter().zip(b.points.iter()) {
                assert_close(q.x - p.x, -3.5);
                assert_close(q.y - p.y, 7.25);
            }
        }
    }

    #[test]
    fn multi_line_text_takes_the_widest_line() {
        let font = block_font();

        let layout = layout("0\n012\n01", &font, 72.0, 1.0, Anchor::default(), Position::new(0.0, 0.0)).unwrap();

        assert_close(layout.width, 38.1);
        assert_close(layout.height, 3.0 * 25.4);
    }

    #[test]
    fn glyph_polygons_lie_inside_the_box() {
        let font = block_font();

        let layout = layout("012\n21", &font, 36.0, 1.0, Anchor::CENTER, Position::new(5.0, 5.0)).unwrap();

        let mut outline = BoundingBox::default();
        for polygon in &layout.polygons {
            for point in &polygon.points {
                outline.expand_to_include(*point);
            }
        }
        assert!(outline.min.x >= layout.bounding_box.min.x - EPSILON);
        assert!(outline.min.y >= layout.bounding_box.min.y - EPSILON);
        assert!(outline.max.x <= layout.bounding_box.max.x + EPSILON);
        assert!(outline.max.y <= layout.bounding_box.max.y + EPSILON);
    }

    #[test]
    fn holes_follow_filled_outlines() {
        // given
        let font = block_font();

        // when
        let layout = layout("0", &font, 72.0, 1.0, Anchor::default(), Position::new(0.0, 0.0)).unwrap();

        // then
        let exposures: Vec<Exposure> = layout
            .polygons
            .iter()
            .map(|polygon| polygon.exposure)
            .collect();
        assert_eq!(exposures, vec![Exposure::Add, Exposure::CutOut]);
    }

    #[test]
    fn unknown_glyph_aborts_the_layout() {
        let font = block_font();

        let result = layout("01x", &font, 10.0, 1.0, Anchor::default(), Position::new(0.0, 0.0));

        assert!(matches!(
            result,
            Err(Error::Lookup(LookupError::Glyph {
                ch: 'x',
                ..
            }))
        ));
    }

    #[test]
    fn measure_agrees_with_layout() {
        let font = block_font();

        let (width, height) = measure("01\n2", &font, 20.0, 1.5).unwrap();
        let layout = layout("01\n2", &font, 20.0, 1.5, Anchor::default(), Position::new(0.0, 0.0)).unwrap();

        assert_close(width, layout.width);
        assert_close(height, layout.height);
    }
}
