use std::path::PathBuf;

use dxf2svg_core::{document::Entity, geometry::Point2};
use dxf2svg_io::{DocumentLoader, DxfFacade, IoError};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_basic_entities_in_file_order() {
    let loader = DxfFacade::new();
    let doc = loader.load(&fixture("basic_entities.dxf")).expect("读取 DXF 失败");

    let kinds: Vec<&str> = doc.entities().map(|(_, entity)| entity.kind_name()).collect();
    assert_eq!(kinds, vec!["LINE", "CIRCLE", "ARC", "POLYLINE", "TEXT"]);

    let layers: Vec<&str> = doc.layers().collect();
    assert_eq!(layers, vec!["0", "ANNOT", "GEOM", "REBAR"]);
}

#[test]
fn load_line_keeps_color_and_layer() {
    let doc = DxfFacade::new()
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");
    let line = doc
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::Line(line) => Some(line),
            _ => None,
        })
        .expect("未找到直线实体");

    assert_eq!(line.layer, "REBAR");
    assert_eq!(line.color, Some(1));
    assert_eq!(line.start, Point2::new(0.0, 0.0));
    assert_eq!(line.end, Point2::new(100.0, 0.0));
}

#[test]
fn load_arc_keeps_angles_in_degrees() {
    let doc = DxfFacade::new()
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");
    let arc = doc
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::Arc(arc) => Some(arc),
            _ => None,
        })
        .expect("未找到圆弧实体");

    assert!((arc.radius - 50.0).abs() < 1e-9);
    assert!(arc.start_angle.abs() < 1e-9);
    assert!((arc.end_angle - 90.0).abs() < 1e-9);
    assert_eq!(arc.color, Some(5));
}

#[test]
fn load_lwpolyline_closed_flag() {
    let doc = DxfFacade::new()
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");
    let polyline = doc
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::Polyline(polyline) => Some(polyline),
            _ => None,
        })
        .expect("未找到多段线实体");

    assert!(polyline.is_closed);
    assert_eq!(polyline.vertices.len(), 4);
    assert_eq!(polyline.vertices[2], Point2::new(20.0, 30.0));
    assert_eq!(polyline.color, None);
}

#[test]
fn unknown_entities_are_kept_as_unsupported() {
    let doc = DxfFacade::new()
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");
    let unsupported: Vec<_> = doc
        .entities()
        .filter_map(|(_, entity)| match entity {
            Entity::Unsupported(other) => Some(other),
            _ => None,
        })
        .collect();
    assert_eq!(unsupported.len(), 1);
    assert_eq!(unsupported[0].kind, "TEXT");
    assert_eq!(unsupported[0].layer, "ANNOT");
}

#[test]
fn missing_file_reports_read_error() {
    let err = DxfFacade::new()
        .load(&fixture("does_not_exist.dxf"))
        .expect_err("缺失文件应当失败");
    assert!(matches!(err, IoError::ReadError { .. }));
}

#[test]
fn truncated_file_reports_invalid_document() {
    let err = DxfFacade::new()
        .load(&fixture("truncated.dxf"))
        .expect_err("截断文件应当失败");
    match err {
        IoError::InvalidDocument(message) => assert!(message.contains("缺少与组码对应的值行")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_entity_does_not_discard_its_neighbours() {
    let source = "0\nSECTION\n2\nENTITIES\n\
0\nLINE\n8\nREBAR\n10\n0\n20\n0\n11\n50\n21\n0\n\
0\nLINE\n8\nREBAR\n10\n0\n20\n0\n11\n50\n\
0\nCIRCLE\n8\nREBAR\n62\nabc\n10\n5\n20\n5\n40\n1\n\
0\nLWPOLYLINE\n8\n0\n90\n0\n70\n0\n\
0\nLINE\n8\nGEOM\n10\n1\n20\n1\n11\n2\n21\n2\n\
0\nENDSEC\n0\nEOF\n";
    let doc = DxfFacade::new().load_str(source).expect("单个坏实体不应导致整体失败");

    let kinds: Vec<&str> = doc.entities().map(|(_, entity)| entity.kind_name()).collect();
    assert_eq!(kinds, vec!["LINE", "POLYLINE", "LINE"]);

    let lines: Vec<_> = doc
        .entities()
        .filter_map(|(_, entity)| match entity {
            Entity::Line(line) => Some(line),
            _ => None,
        })
        .collect();
    assert_eq!(lines[0].end, Point2::new(50.0, 0.0));
    assert_eq!(lines[1].layer, "GEOM");
}
