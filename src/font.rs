//! Glyph outline sources.
//!
//! All glyph geometry is expressed in em units (1.0 = the point size), with a y-up axis and the
//! origin on the baseline at the start of the glyph.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use lyon::geom::{point, CubicBezierSegment, QuadraticBezierSegment};

use crate::error::{Error, LookupError, Result};
use crate::spacial::deduplicate::DedupEpsilon;
use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the tallest glyph, positive.
    pub ascent: f64,
    /// Distance from the baseline to the bottom of the deepest glyph, negative.
    pub descent: f64,
    pub line_gap: f64,
}

impl FontMetrics {
    pub fn line_height(&self) -> f64 {
        self.ascent - self.descent + self.line_gap
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Glyph {
    /// Closed contours, without a repeated closing vertex.
    pub contours: Vec<Vec<Position>>,
    pub advance: f64,
}

/// A registered source of glyph outlines.
pub trait Font: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn metrics(&self) -> FontMetrics;

    /// Fails with [`LookupError::Glyph`] when the font cannot render `ch`.
    fn glyph(&self, ch: char) -> std::result::Result<Glyph, LookupError>;
}

/// Fonts available to text primitives, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    fonts: HashMap<String, Arc<dyn Font>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `font` under its own name, replacing any font previously registered with that name.
    pub fn register(&mut self, font: impl Font + 'static) -> &mut Self {
        let font: Arc<dyn Font> = Arc::new(font);
        debug!("registering font '{}'", font.name());
        self.fonts
            .insert(font.name().to_string(), font);
        self
    }

    pub fn get(&self, name: &str) -> std::result::Result<&dyn Font, LookupError> {
        self.fonts
            .get(name)
            .map(|font| font.as_ref())
            .ok_or_else(|| LookupError::Font(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fonts.contains_key(name)
    }
}

/// A font built in memory from polygonal glyph outlines, e.g. a stroke font or a font converted ahead of time.
#[derive(Debug, Clone)]
pub struct OutlineFont {
    name: String,
    metrics: FontMetrics,
    glyphs: HashMap<char, Glyph>,
}

impl OutlineFont {
    pub fn new(name: impl Into<String>, metrics: FontMetrics) -> Self {
        Self {
            name: name.into(),
            metrics,
            glyphs: HashMap::new(),
        }
    }

    pub fn with_glyph(mut self, ch: char, glyph: Glyph) -> Self {
        self.insert(ch, glyph);
        self
    }

    pub fn insert(&mut self, ch: char, glyph: Glyph) {
        self.glyphs.insert(ch, glyph);
    }
}

impl Font for OutlineFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph(&self, ch: char) -> std::result::Result<Glyph, LookupError> {
        self.glyphs
            .get(&ch)
            .cloned()
            .ok_or_else(|| LookupError::Glyph {
                font: self.name.clone(),
                ch,
            })
    }
}

/// Default curve flattening tolerance, in em units.
pub const DEFAULT_CURVE_TOLERANCE: f64 = 0.0005;

/// A TrueType/OpenType font whose curved outlines are flattened into polygons on lookup.
#[derive(Clone)]
pub struct TrueTypeFont {
    name: String,
    data: Arc<Vec<u8>>,
    index: u32,
    units_per_em: f64,
    metrics: FontMetrics,
    tolerance: f64,
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("units_per_em", &self.units_per_em)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl TrueTypeFont {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        Self::from_collection(name, data, 0)
    }

    /// Loads face `index` of a font collection.
    pub fn from_collection(name: impl Into<String>, data: Vec<u8>, index: u32) -> Result<Self> {
        let name = name.into();
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|error| Error::Configuration(format!("font '{}' could not be parsed: {}", name, error)))?;

        let units_per_em = face.units_per_em() as f64;
        let metrics = FontMetrics {
            ascent: face.ascender() as f64 / units_per_em,
            descent: face.descender() as f64 / units_per_em,
            line_gap: face.line_gap() as f64 / units_per_em,
        };
        debug!(
            "loaded font '{}', units_per_em: {}, metrics: {:?}",
            name, units_per_em, metrics
        );

        Ok(Self {
            name,
            data: Arc::new(data),
            index,
            units_per_em,
            metrics,
            tolerance: DEFAULT_CURVE_TOLERANCE,
        })
    }

    /// Maximum distance, in em units, between a curve and the polyline replacing it.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn lookup_error(&self, ch: char) -> LookupError {
        LookupError::Glyph {
            font: self.name.clone(),
            ch,
        }
    }
}

impl Font for TrueTypeFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph(&self, ch: char) -> std::result::Result<Glyph, LookupError> {
        // the data was parsed successfully when the font was loaded
        let face = ttf_parser::Face::parse(&self.data, self.index).map_err(|_| self.lookup_error(ch))?;
        let id = face
            .glyph_index(ch)
            .ok_or_else(|| self.lookup_error(ch))?;
        let advance = face
            .glyph_hor_advance(id)
            .ok_or_else(|| self.lookup_error(ch))? as f64
            / self.units_per_em;

        let mut builder = ContourBuilder::new(1.0 / self.units_per_em, self.tolerance);
        // glyphs without an outline, e.g. a space, only advance the pen
        face.outline_glyph(id, &mut builder);
        let contours = builder.finish();
        trace!("glyph {:?}: {} contours, advance: {}", ch, contours.len(), advance);

        Ok(Glyph {
            contours,
            advance,
        })
    }
}

/// Collects flattened outline contours, scaling font units to em units.
struct ContourBuilder {
    scale: f64,
    tolerance: f64,
    current: Vec<Position>,
    contours: Vec<Vec<Position>>,
}

impl ContourBuilder {
    fn new(scale: f64, tolerance: f64) -> Self {
        Self {
            scale,
            tolerance,
            current: Vec::new(),
            contours: Vec::new(),
        }
    }

    fn scaled(&self, x: f32, y: f32) -> Position {
        Position::new(x as f64 * self.scale, y as f64 * self.scale)
    }

    fn last(&self) -> Position {
        self.current
            .last()
            .copied()
            .unwrap_or_else(|| Position::new(0.0, 0.0))
    }

    fn finish_contour(&mut self) {
        let contour = std::mem::take(&mut self.current).dedup_with_epsilon(1e-9);
        if contour.len() >= 3 {
            self.contours.push(contour);
        }
    }

    fn finish(mut self) -> Vec<Vec<Position>> {
        self.finish_contour();
        self.contours
    }
}

impl ttf_parser::OutlineBuilder for ContourBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish_contour();
        let position = self.scaled(x, y);
        self.current.push(position);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let position = self.scaled(x, y);
        self.current.push(position);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let from = self.last();
        let ctrl = self.scaled(x1, y1);
        let to = self.scaled(x, y);
        let segment = QuadraticBezierSegment {
            from: point(from.x, from.y),
            ctrl: point(ctrl.x, ctrl.y),
            to: point(to.x, to.y),
        };
        for p in segment.flattened(self.tolerance) {
            self.current.push(Position::new(p.x, p.y));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let from = self.last();
        let ctrl1 = self.scaled(x1, y1);
        let ctrl2 = self.scaled(x2, y2);
        let to = self.scaled(x, y);
        let segment = CubicBezierSegment {
            from: point(from.x, from.y),
            ctrl1: point(ctrl1.x, ctrl1.y),
            ctrl2: point(ctrl2.x, ctrl2.y),
            to: point(to.x, to.y),
        };
        for p in segment.flattened(self.tolerance) {
            self.current.push(Position::new(p.x, p.y));
        }
    }

    fn close(&mut self) {
        self.finish_contour();
    }
}
