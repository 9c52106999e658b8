use std::fs;

use gerber_writer::testing::{block_font, render_to_string, BLOCK_FONT};
use gerber_writer::{
    Anchor, Arc, ArcMode, Circle, Document, DocumentConfig, Error, LayerRole, Line, Polygon, Position, Shape, Text,
};

fn board(config: DocumentConfig) -> Document {
    let mut document = Document::new("coil", config).unwrap();
    document.register_font(block_font());

    document
        .top_copper()
        .add(Circle::new(Position::new(0.0, 0.0), 2.0))
        .add(Line::new(Position::new(0.0, 0.0), Position::new(5.0, 5.0), Shape::Rect, 0.15))
        .add(Polygon::new(vec![
            Position::new(1.0, 1.0),
            Position::new(2.0, 1.0),
            Position::new(2.0, 2.0),
            Position::new(1.0, 2.0),
        ]));
    document
        .bottom_copper()
        .add(Arc::new(Position::new(0.0, 0.0), 3.0, Shape::Circle, 0.0, 270.0, 0.15).with_scale(-1.0, 1.0));
    document
        .inner_copper(2)
        .add(Circle::new(Position::new(3.0, 0.0), 0.5));
    document
        .inner_copper(3)
        .add(Circle::new(Position::new(-3.0, 0.0), 0.5));
    document
        .top_silkscreen()
        .add(Text::new(Position::new(0.0, 10.0), "012\n21", BLOCK_FONT, 18.0).with_anchor(Anchor::CENTER));
    document
        .outline()
        .add(Arc::new(Position::new(0.0, 0.0), 15.0, Shape::Circle, 0.0, 360.0, 0.1));
    document
        .drill()
        .add(Circle::new(Position::new(0.0, 0.0), 1.0))
        .add(Circle::new(Position::new(3.0, 0.0), 0.25))
        .add(Circle::new(Position::new(-3.0, 0.0), 0.25));

    // requested, never filled
    document.bottom_silkscreen();

    document
}

#[test]
fn writes_one_file_per_non_empty_layer() {
    // given
    let _ = env_logger::builder().is_test(true).try_init();
    let directory = tempfile::tempdir().unwrap();
    let mut document = board(DocumentConfig::default());

    // when
    let paths = document.write(directory.path()).unwrap();

    // then
    let names: Vec<String> = paths
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec![
        "coil.gtl", "coil.g2", "coil.g3", "coil.gbl", "coil.gto", "coil.gko", "coil.xln"
    ]);
    assert!(!directory.path().join("coil.gbo").exists());

    for path in &paths {
        let source = fs::read_to_string(path).unwrap();
        if path.extension().unwrap() == "xln" {
            assert!(source.starts_with("M48\n"));
            assert!(source.ends_with("M30\n"));
        } else {
            assert_eq!(source.matches("%FSLAX46Y46*%").count(), 1);
            assert_eq!(source.matches("M02*").count(), 1);
            assert!(source.ends_with("M02*\n"));
        }
    }

    let bottom = fs::read_to_string(directory.path().join("coil.gbl")).unwrap();
    assert!(bottom.starts_with("%TF.FileFunction,Copper,L4,Bot*%"));
}

#[test]
fn second_write_is_rejected() {
    let directory = tempfile::tempdir().unwrap();
    let mut document = board(DocumentConfig::default());

    document.write(directory.path()).unwrap();
    let result = document.write(directory.path());

    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn rendering_is_deterministic() {
    let first = board(DocumentConfig::default().with_arc_mode(ArcMode::Native));
    let second = board(DocumentConfig::default().with_arc_mode(ArcMode::Native));

    for role in [LayerRole::TopCopper, LayerRole::BottomCopper, LayerRole::TopSilkscreen, LayerRole::Drill] {
        assert_eq!(render_to_string(&first, role), render_to_string(&second, role));
    }
}

#[test]
fn identical_apertures_on_two_layers_get_independent_codes() {
    let mut document = Document::new("pads", DocumentConfig::default()).unwrap();
    document
        .top_copper()
        .add(Circle::new(Position::new(0.0, 0.0), 1.6));
    document
        .top_solder_mask()
        .add(Circle::new(Position::new(0.0, 0.0), 0.5))
        .add(Circle::new(Position::new(0.0, 0.0), 1.6));

    let copper = render_to_string(&document, LayerRole::TopCopper);
    let mask = render_to_string(&document, LayerRole::TopSolderMask);

    assert!(copper.contains("%ADD10C,"));
    assert!(!copper.contains("%ADD11"));
    assert!(mask.contains("%ADD10C,"));
    assert!(mask.contains("%ADD11C,"));
}

#[test]
fn failing_layer_reports_role_and_index() {
    let directory = tempfile::tempdir().unwrap();
    let mut document = Document::new("broken", DocumentConfig::default()).unwrap();
    document
        .top_silkscreen()
        .add(Circle::new(Position::new(0.0, 0.0), 1.0))
        .add(Text::new(Position::new(0.0, 0.0), "012", "unregistered", 10.0));

    let error = document.write(directory.path()).unwrap_err();

    assert!(matches!(
        error,
        Error::Primitive {
            role: LayerRole::TopSilkscreen,
            index: 1,
            ..
        }
    ));
    assert!(error.to_string().contains("unregistered"));
}

#[test]
fn file_that_cannot_be_created_reports_its_layer() {
    // given
    let directory = tempfile::tempdir().unwrap();
    // a directory where the bottom copper file should go
    fs::create_dir(directory.path().join("coil.gbl")).unwrap();
    let mut document = board(DocumentConfig::default());

    // when
    let error = document.write(directory.path()).unwrap_err();

    // then
    assert!(matches!(
        error,
        Error::Layer {
            role: LayerRole::BottomCopper,
            ..
        }
    ));
    assert!(matches!(error.root(), Error::Io(_)));
    assert!(directory.path().join("coil.gtl").is_file());
}
