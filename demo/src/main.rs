//! Four bifilar coils, one per copper layer of a four layer board, joined by vias into one winding.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use gerber_writer::{
    Anchor, Arc, Circle, Document, DocumentConfig, Layer, LayerRole, Line, Polygon, Position, Shape, Text,
    TrueTypeFont,
};
use log::info;

const VIA_PAD_DIAMETER: f64 = 0.5;
const VIA_DRILL_DIAMETER: f64 = 0.25;
const PAD_DIAMETER: f64 = 2.0;
const PAD_DRILL_DIAMETER: f64 = 1.0;
const LABEL_SIZE: f64 = 6.0;

const MESSAGE: &str = "With a trace and gap size of 0.15mm, this
quad bifilar coil should have a DC resistance
of approx. 928.8Ω. Each spiral has 100 coils.";

const ROUTE: &str = "Top layer: hole5 ⇨ hole6
Bottom layer: hole6 ⇨ hole2
Top layer: hole2 ⇨ hole7
Bottom layer: hole7 ⇨ hole4
Layer 3: hole4 ⇨ hole3
Layer 2: hole3 ⇨ hole8
Layer 3: hole8 ⇨ hole1
Layer 2: hole1 ⇨ hole9";

#[derive(Parser)]
#[command(name = "quad-bifilar-coil", about = "Generate Gerber files for a four layer bifilar coil")]
struct Cli {
    /// Angular resolution of each spiral, in radians
    #[arg(long, default_value_t = 0.02)]
    step: f64,

    /// Number of full winds in each spiral
    #[arg(short, long, default_value_t = 100)]
    n: u32,

    /// Gap between traces in mm (6mil = 0.15mm)
    #[arg(long, default_value_t = 0.15)]
    gap: f64,

    /// Width of traces in mm
    #[arg(long, default_value_t = 0.15)]
    trace: f64,

    /// File name prefix for all Gerber files and the zip
    #[arg(short, long, default_value = "quad-bifilar-coil")]
    prefix: String,

    /// TrueType font for the silkscreen notes, no silkscreen when absent
    #[arg(short, long)]
    font: Option<PathBuf>,

    /// Font point size (72 pts = 1 inch = 25.4 mm)
    #[arg(long, default_value_t = 18.0)]
    pts: f64,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

/// Spiral geometry shared by every layer.
struct Spiral {
    step: f64,
    trace: f64,
    gap: f64,
    start_angle: f64,
    end_angle: f64,
    size: f64,
}

impl Spiral {
    fn new(cli: &Cli) -> Self {
        let mut spiral = Self {
            step: cli.step,
            trace: cli.trace,
            gap: cli.gap,
            start_angle: 2.5 * PI,
            end_angle: 2.0 * PI + cli.n as f64 * 2.0 * PI,
            size: 0.0,
        };
        let half_width = 0.5 * cli.trace;
        let right = spiral.point(1.0, spiral.end_angle, half_width, 0.0);
        let left = spiral.point(1.0, spiral.end_angle, half_width, PI);
        spiral.size = 2.0 * right.x.abs().max(left.x.abs());
        spiral
    }

    /// A point on the spiral centerline, pushed outwards by `offset_out`, rotated by `rotation`.
    fn point(&self, x_scale: f64, angle: f64, offset_out: f64, rotation: f64) -> Position {
        let radius = (angle + self.trace + self.gap) / (3.0 * PI) + offset_out;
        let (sin, cos) = (angle + rotation).sin_cos();
        Position::new(radius * cos * x_scale, radius * sin)
    }

    fn start(&self, x_scale: f64, rotation: f64) -> Position {
        self.point(x_scale, self.start_angle, 0.0, rotation)
    }

    /// The outline of one spiral trace and the centerline point its outer end is joined at.
    ///
    /// A non-zero `trim_y` cuts the outer end off horizontally where it last crosses that height, a negative one
    /// extends the spiral by a quarter turn first.
    fn outline(&self, x_scale: f64, rotation: f64, trim_y: f64) -> (Vec<Position>, Position) {
        let half_width = 0.5 * self.trace;
        let end_angle = match trim_y < 0.0 {
            true => self.end_angle + FRAC_PI_2,
            false => self.end_angle,
        };
        let steps = ((end_angle - self.start_angle) / self.step + 0.5) as usize;
        let angle_at = |index: usize| self.start_angle + self.step * index as f64;

        let mut points: Vec<Position> = (0..steps)
            .map(|index| self.point(x_scale, angle_at(index), half_width, rotation))
            .collect();

        let (end, last_step) = if trim_y == 0.0 {
            let end = self.point(x_scale, end_angle, 0.0, rotation);
            points.push(self.point(x_scale, end_angle, half_width, rotation));
            points.push(self.point(x_scale, end_angle, -half_width, rotation));
            (end, steps - 1)
        } else {
            let crossed = |point: &Position| match trim_y > 0.0 {
                true => point.y > trim_y,
                false => point.y < trim_y,
            };
            let last_step = points
                .iter()
                .rposition(crossed)
                .unwrap_or(0);
            let angle = angle_at(last_step);
            let outer_x = points[last_step].x;

            points.truncate(last_step + 1);
            points.push(Position::new(outer_x, trim_y));
            points.push(Position::new(self.point(x_scale, angle, -half_width, rotation).x, trim_y));
            (Position::new(self.point(x_scale, angle, 0.0, rotation).x, trim_y), last_step)
        };

        for index in (0..=last_step).rev() {
            points.push(self.point(x_scale, angle_at(index), -half_width, rotation));
        }

        (points, end)
    }
}

/// Every via and pad of the board, numbered like the silkscreen labels.
struct Holes([Position; 9]);

impl Holes {
    fn hole(&self, number: usize) -> Position {
        self.0[number - 1]
    }

    fn drill_diameter(number: usize) -> f64 {
        match number {
            5 | 9 => PAD_DRILL_DIAMETER,
            _ => VIA_DRILL_DIAMETER,
        }
    }

    fn pad_diameter(number: usize) -> f64 {
        match number {
            5 | 9 => PAD_DIAMETER,
            _ => VIA_PAD_DIAMETER,
        }
    }

    fn add_pads(&self, layer: &mut Layer) {
        for number in 1..=9 {
            layer.add(Circle::new(self.hole(number), Self::pad_diameter(number)));
        }
    }

    fn add_drills(&self, layer: &mut Layer) {
        for number in 1..=9 {
            layer.add(Circle::new(self.hole(number), Self::drill_diameter(number)));
        }
    }
}

fn trace(from: Position, to: Position, width: f64) -> Line {
    Line::new(from, to, Shape::Rect, width)
}

fn build(cli: &Cli) -> Result<Document, Box<dyn std::error::Error>> {
    let mut document = Document::new(cli.prefix.as_str(), DocumentConfig::default())?;
    let spiral = Spiral::new(cli);
    let width = cli.trace;
    let pad_offset = width + PAD_DIAMETER;

    let (top_right, end_right) = spiral.outline(1.0, 0.0, 0.0);
    let (top_left, end_left) = spiral.outline(1.0, PI, 0.0);
    let (bottom_right, _) = spiral.outline(-1.0, 0.0, 0.0);
    let (bottom_left, bottom_end_left) = spiral.outline(-1.0, PI, pad_offset);

    let shift = FRAC_PI_2;
    let (layer2_right, layer2_end_right) = spiral.outline(1.0, shift, 0.0);
    let (layer2_left, layer2_end_left) = spiral.outline(1.0, PI + shift, -pad_offset);
    let (layer3_right, _) = spiral.outline(-1.0, shift, 0.0);
    let (layer3_left, layer3_end_left) = spiral.outline(-1.0, PI + shift, pad_offset);

    let start_right = spiral.start(1.0, 0.0);
    let start_left = spiral.start(1.0, PI);
    let start_layer2_right = spiral.start(1.0, shift);
    let start_layer2_left = spiral.start(1.0, PI + shift);

    let via_offset = (0.5 * (width + VIA_PAD_DIAMETER).powi(2)).sqrt();
    let via_pad_offset = 0.5 * (width + VIA_PAD_DIAMETER);
    let pad_half_offset = 0.5 * (PAD_DIAMETER + width);

    let holes = Holes([
        Position::new(via_offset, 0.0),
        Position::new(end_left.x - via_pad_offset, end_left.y),
        Position::new(-via_offset, 0.0),
        Position::new(end_right.x + via_pad_offset, pad_offset),
        Position::new(end_right.x + pad_half_offset, end_right.y),
        Position::new(0.0, via_offset),
        Position::new(0.0, -via_offset),
        Position::new(layer2_end_right.x, layer2_end_right.y + via_pad_offset),
        Position::new(layer2_end_left.x + pad_half_offset, -pad_offset),
    ]);

    let top = document.top_copper();
    top.add(Polygon::new(top_right))
        .add(Polygon::new(top_left));
    holes.add_pads(top);
    top.add(trace(end_left, holes.hole(2), width))
        .add(trace(end_right, holes.hole(5), width))
        .add(trace(start_right, holes.hole(6), width))
        .add(trace(start_left, holes.hole(7), width));

    let layer2 = document.inner_copper(2);
    layer2
        .add(Polygon::new(layer2_right))
        .add(Polygon::new(layer2_left));
    holes.add_pads(layer2);
    layer2
        .add(trace(start_layer2_right, holes.hole(3), width))
        .add(trace(start_layer2_left, holes.hole(1), width))
        .add(trace(layer2_end_right, holes.hole(8), width))
        .add(trace(layer2_end_left, holes.hole(9), width));

    let layer3 = document.inner_copper(3);
    layer3
        .add(Polygon::new(layer3_right))
        .add(Polygon::new(layer3_left));
    holes.add_pads(layer3);
    layer3
        .add(trace(layer3_end_left, holes.hole(4), width))
        .add(trace(start_layer2_right, holes.hole(3), width))
        .add(trace(start_layer2_left, holes.hole(1), width))
        .add(trace(layer2_end_right, holes.hole(8), width));

    let bottom = document.bottom_copper();
    bottom
        .add(Polygon::new(bottom_right))
        .add(Polygon::new(bottom_left));
    holes.add_pads(bottom);
    bottom
        .add(trace(end_left, holes.hole(2), width))
        .add(trace(bottom_end_left, holes.hole(4), width))
        .add(trace(start_right, holes.hole(6), width))
        .add(trace(start_left, holes.hole(7), width));

    holes.add_pads(document.top_solder_mask());
    holes.add_pads(document.bottom_solder_mask());
    holes.add_drills(document.drill());

    let radius = 0.5 * spiral.size + PAD_DIAMETER + width;
    document
        .outline()
        .add(Arc::new(Position::new(0.0, 0.0), radius, Shape::Circle, 0.0, 360.0, 0.1));
    println!("n={}: ({:.2},{:.2})", cli.n, 2.0 * radius, 2.0 * radius);

    if let Some(path) = &cli.font {
        let font = TrueTypeFont::from_bytes("notes", std::fs::read(path)?)?;
        document.register_font(font);

        let text_radius = -end_left.x;
        let label = |number: usize, offset: (f64, f64), anchor: Anchor| {
            let hole = holes.hole(number);
            Text::new(
                Position::new(hole.x + offset.0, hole.y + offset.1),
                format!("hole{}", number),
                "notes",
                LABEL_SIZE,
            )
            .with_anchor(anchor)
        };

        document
            .top_silkscreen()
            .add(Text::new(Position::new(0.0, 0.3 * text_radius), MESSAGE, "notes", cli.pts).with_anchor(Anchor::CENTER))
            .add(label(1, (VIA_PAD_DIAMETER, 0.0), Anchor::CENTER_LEFT))
            .add(label(2, (VIA_PAD_DIAMETER, 0.0), Anchor::CENTER_LEFT))
            .add(label(3, (-VIA_PAD_DIAMETER, 0.0), Anchor::CENTER_RIGHT))
            .add(label(4, (-PAD_DIAMETER, 0.0), Anchor::CENTER_RIGHT))
            .add(label(5, (-PAD_DIAMETER, 0.0), Anchor::CENTER_RIGHT))
            .add(label(6, (0.0, VIA_PAD_DIAMETER), Anchor::BOTTOM_CENTER))
            .add(label(7, (0.0, -VIA_PAD_DIAMETER), Anchor::TOP_CENTER))
            .add(label(8, (0.0, -VIA_PAD_DIAMETER), Anchor::TOP_CENTER))
            .add(label(9, (-PAD_DIAMETER, 0.0), Anchor::CENTER_RIGHT))
            .add(Text::new(Position::new(0.0, -0.5 * text_radius), ROUTE, "notes", cli.pts).with_anchor(Anchor::CENTER));
    }

    Ok(document)
}

fn bundle(paths: &[PathBuf], archive: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut zip = zip::ZipWriter::new(File::create(archive)?);
    let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in paths {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"))?;
        zip.start_file(name, options)?;
        zip.write_all(&std::fs::read(path)?)?;
    }

    zip.finish()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init(); // Log to stderr (optional).
    let cli = Cli::parse();

    let mut document = build(&cli)?;
    let bbox = document.bounding_box()?;
    info!("board size: {:.2} x {:.2} mm", bbox.width(), bbox.height());

    let paths = document.write(&cli.output)?;
    let archive = cli.output.join(format!("{}.zip", cli.prefix));
    bundle(&paths, &archive)?;
    info!("bundled {} files into {}", paths.len(), archive.display());

    for role in [LayerRole::TopCopper, LayerRole::Drill] {
        if let Some(layer) = document.get(role) {
            info!("{} layer, primitives: {}", role, layer.len());
        }
    }

    println!("Done.");
    Ok(())
}
