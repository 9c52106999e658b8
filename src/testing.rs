use crate::document::Document;
use crate::font::{FontMetrics, Glyph, OutlineFont};
use crate::layer::LayerRole;
use crate::Position;

pub const BLOCK_FONT: &str = "block";

fn contour(points: &[(f64, f64)]) -> Vec<Position> {
    points
        .iter()
        .map(|(x, y)| Position::new(*x, *y))
        .collect()
}

/// A tiny font with square digits, every glyph advancing half an em, lines one em apart.
///
/// At 72 points an em is 25.4mm, so "012" is 38.1mm wide and 25.4mm high.
pub fn block_font() -> OutlineFont {
    let metrics = FontMetrics {
        ascent: 0.8,
        descent: -0.2,
        line_gap: 0.0,
    };

    let zero = Glyph {
        contours: vec![
            contour(&[(0.05, 0.0), (0.45, 0.0), (0.45, 0.7), (0.05, 0.7)]),
            // hole, wound the other way
            contour(&[(0.15, 0.1), (0.15, 0.6), (0.35, 0.6), (0.35, 0.1)]),
        ],
        advance: 0.5,
    };
    let one = Glyph {
        contours: vec![contour(&[(0.2, 0.0), (0.3, 0.0), (0.3, 0.7), (0.2, 0.7)])],
        advance: 0.5,
    };
    let two = Glyph {
        contours: vec![contour(&[
            (0.05, 0.0),
            (0.45, 0.0),
            (0.45, 0.1),
            (0.2, 0.1),
            (0.45, 0.6),
            (0.45, 0.7),
            (0.05, 0.7),
            (0.05, 0.6),
            (0.3, 0.6),
            (0.05, 0.1),
        ])],
        advance: 0.5,
    };
    let space = Glyph {
        contours: vec![],
        advance: 0.5,
    };

    OutlineFont::new(BLOCK_FONT, metrics)
        .with_glyph('0', zero)
        .with_glyph('1', one)
        .with_glyph('2', two)
        .with_glyph(' ', space)
}

/// Renders one layer of `document` into a string.
pub fn render_to_string(document: &Document, role: LayerRole) -> String {
    let mut out = Vec::new();
    document
        .render_layer(role, &mut out)
        .expect("Could not render layer");
    String::from_utf8(out).expect("Layer output is not UTF-8")
}

pub const SQUARE_TRUETYPE: &str = "square";

fn be16(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&(value as u16).to_be_bytes());
}

fn be32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// The smallest TrueType face `ttf-parser` accepts with outlines: 1000 units per em, ascender 800,
/// descender -200.
///
/// `'0'` is a square from (100, 0) to (500, 700) advancing 600 units, `' '` has no outline and advances 250.
pub fn square_truetype() -> Vec<u8> {
    let mut head = Vec::new();
    be32(&mut head, 0x0001_0000);
    be32(&mut head, 0x0001_0000);
    be32(&mut head, 0);
    be32(&mut head, 0x5F0F_3CF5);
    be16(&mut head, 0);
    // units per em
    be16(&mut head, 1000);
    head.extend_from_slice(&[0; 16]);
    for bound in [0, -200, 600, 800] {
        be16(&mut head, bound);
    }
    be16(&mut head, 0);
    be16(&mut head, 8);
    be16(&mut head, 2);
    // short loca offsets
    be16(&mut head, 0);
    be16(&mut head, 0);

    let mut hhea = Vec::new();
    be32(&mut hhea, 0x0001_0000);
    for value in [800, -200, 0, 600, 0, 0, 500, 1, 0, 0, 0, 0, 0, 0, 0] {
        be16(&mut hhea, value);
    }
    // advance widths for every glyph
    be16(&mut hhea, 3);

    let mut maxp = Vec::new();
    be32(&mut maxp, 0x0000_5000);
    be16(&mut maxp, 3);

    let mut hmtx = Vec::new();
    for (advance, bearing) in [(500, 0), (600, 100), (250, 0)] {
        be16(&mut hmtx, advance);
        be16(&mut hmtx, bearing);
    }

    let mut square = Vec::new();
    be16(&mut square, 1);
    for bound in [100, 0, 500, 700] {
        be16(&mut square, bound);
    }
    be16(&mut square, 3);
    be16(&mut square, 0);
    // four on-curve points, clockwise, with 16 bit deltas
    square.extend_from_slice(&[1, 1, 1, 1]);
    for dx in [100, 0, 400, 0] {
        be16(&mut square, dx);
    }
    for dy in [0, 700, 0, -700] {
        be16(&mut square, dy);
    }

    let mut loca = Vec::new();
    for offset in [0, 0, square.len(), square.len()] {
        be16(&mut loca, (offset / 2) as i32);
    }

    let mut cmap = Vec::new();
    be16(&mut cmap, 0);
    be16(&mut cmap, 1);
    be16(&mut cmap, 3);
    be16(&mut cmap, 10);
    be32(&mut cmap, 12);
    be16(&mut cmap, 12);
    be16(&mut cmap, 0);
    be32(&mut cmap, 40);
    be32(&mut cmap, 0);
    be32(&mut cmap, 2);
    for (ch, glyph) in [(' ', 2), ('0', 1)] {
        be32(&mut cmap, ch as u32);
        be32(&mut cmap, ch as u32);
        be32(&mut cmap, glyph);
    }

    // table records are looked up by binary search, so they are sorted by tag
    let tables: [(&[u8; 4], Vec<u8>); 7] = [
        (b"cmap", cmap),
        (b"glyf", square),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"loca", loca),
        (b"maxp", maxp),
    ];

    let mut font = Vec::new();
    be32(&mut font, 0x0001_0000);
    be16(&mut font, tables.len() as i32);
    be16(&mut font, 64);
    be16(&mut font, 2);
    be16(&mut font, 48);

    let mut offset = 12 + 16 * tables.len();
    let mut data = Vec::new();
    for (tag, table) in &tables {
        font.extend_from_slice(*tag);
        be32(&mut font, 0);
        be32(&mut font, offset as u32);
        be32(&mut font, table.len() as u32);

        data.extend_from_slice(table);
        while data.len() % 4 != 0 {
            data.push(0);
        }
        offset = 12 + 16 * tables.len() + data.len();
    }
    font.extend_from_slice(&data);
    font
}
