//! Whole-file tests: export through the public API and compare against the
//! exact expected bytes.

use byteorder::{ByteOrder, LittleEndian};
use cgmath::{Matrix4, Point3, Vector3};

use crate::{
    Exporter, Format, MemSink, SimpleMesh, SimpleObject, VertexAttribute,
    schema::{AttributeProperty, Convert},
};


fn triangle() -> SimpleMesh {
    SimpleMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 5.0, 8.0),
            Point3::new(1.5, 2.25, 4.125),
        ],
        vec![[0, 1, 2]],
    )
}

/// Splits an exported file into its header (everything up to and including
/// the `end_header` line) and the body bytes.
fn split_header(file: &[u8]) -> (&str, &[u8]) {
    let marker = b"end_header\n";
    let at = file.windows(marker.len())
        .position(|w| w == marker)
        .expect("no end_header in exported file");
    let end = at + marker.len();

    (std::str::from_utf8(&file[..end]).unwrap(), &file[end..])
}

#[test]
fn simple_triangle_ascii() {
    let mut sink = MemSink::new();
    Exporter::ascii()
        .with_vertex_attributes(vec![])
        .export_mesh(&triangle(), "triangle", &mut sink)
        .unwrap();

    assert_eq!(sink.file("triangle.ply").unwrap(), b"\
        ply\n\
        format ascii 1.0\n\
        comment plywright generated\n\
        element vertex 3\n\
        property float x\n\
        property float y\n\
        property float z\n\
        element face 1\n\
        property list uchar int vertex_indices\n\
        end_header\n\
        0 0 0\n\
        3 5 8\n\
        1.5 2.25 4.125\n\
        3 0 1 2\n\
        " as &[u8]
    );
    assert!(sink.is_finalized("triangle.ply"));
}

#[test]
fn simple_triangle_binary() {
    let mut sink = MemSink::new();
    Exporter::binary()
        .with_vertex_attributes(vec![])
        .export_mesh(&triangle(), "triangle", &mut sink)
        .unwrap();

    let file = sink.file("triangle.ply").unwrap();
    let (header, body) = split_header(file);

    assert!(header.starts_with("ply\nformat binary_little_endian 1.0\n"));
    assert_eq!(body.len(), 3 * 12 + 13);

    // Decoding the fixed layout has to recover the input exactly.
    let expected = [
        [0.0, 0.0, 0.0],
        [3.0, 5.0, 8.0],
        [1.5, 2.25, 4.125],
    ];
    for (i, pos) in expected.iter().enumerate() {
        for (j, &v) in pos.iter().enumerate() {
            let at = i * 12 + j * 4;
            assert_eq!(LittleEndian::read_f32(&body[at..at + 4]), v as f32);
        }
    }

    let faces = &body[3 * 12..];
    assert_eq!(faces[0], 3);
    assert_eq!(LittleEndian::read_u32(&faces[1..5]), 0);
    assert_eq!(LittleEndian::read_u32(&faces[5..9]), 1);
    assert_eq!(LittleEndian::read_u32(&faces[9..13]), 2);
}

#[test]
fn rgb_color_ascii() {
    let mesh = triangle().with_attribute("color", vec![
        1.0, 0.0, 0.0,
        0.0, 0.5, 0.0,
        0.0, 0.0, 1.0,
    ]);

    let mut sink = MemSink::new();
    Exporter::ascii()
        .export_mesh(&mesh, "colored", &mut sink)
        .unwrap();

    let file = sink.file("colored.ply").unwrap();
    let (header, body) = split_header(file);

    assert!(header.contains("property uchar red\nproperty uchar green\nproperty uchar blue\n"));
    assert_eq!(body, b"\
        0 0 0 255 0 0\n\
        3 5 8 0 127 0\n\
        1.5 2.25 4.125 0 0 255\n\
        3 0 1 2\n\
        " as &[u8]
    );
}

#[test]
fn rgb_color_binary_vertex_size() {
    let mesh = triangle().with_attribute("color", vec![
        1.0, 0.0, 0.0,
        0.0, 0.5, 0.0,
        0.0, 0.0, 1.0,
    ]);

    let mut sink = MemSink::new();
    Exporter::binary()
        .export_mesh(&mesh, "colored", &mut sink)
        .unwrap();

    let (_, body) = split_header(sink.file("colored.ply").unwrap());
    assert_eq!(body.len(), 3 * 15 + 13);

    // Color bytes of the second vertex: directly behind its position.
    assert_eq!(&body[15 + 12..15 + 15], &[0, 127, 0]);
}

#[test]
fn multi_mesh_concatenation_offsets_face_indices() {
    // Mesh A has 5 vertices, so all of mesh B's indices shift by exactly 5.
    let a = SimpleMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ],
        vec![[0, 1, 4], [2, 3, 4]],
    );
    let b = SimpleMesh::new(
        vec![
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2], [1, 3, 2]],
    );
    let object = SimpleObject::from_meshes(vec![a, b]);

    let mut sink = MemSink::new();
    Exporter::ascii()
        .with_vertex_attributes(vec![])
        .export(&[object], "pair", &mut sink)
        .unwrap();

    let file = sink.file("pair.ply").unwrap();
    let (header, body) = split_header(file);

    assert!(header.contains("element vertex 9\n"));
    assert!(header.contains("element face 4\n"));

    let body = std::str::from_utf8(body).unwrap();
    let face_lines = body.lines().skip(9).collect::<Vec<_>>();
    assert_eq!(face_lines, [
        "3 0 1 4",
        "3 2 3 4",
        "3 5 6 7",
        "3 6 8 7",
    ]);
}

#[test]
fn child_instances_are_excluded_by_default() {
    let object = SimpleObject::from_meshes(vec![triangle()])
        .with_child_instance(SimpleObject::from_meshes(vec![triangle()]));

    let mut sink = MemSink::new();
    Exporter::ascii()
        .with_vertex_attributes(vec![])
        .export(&[object.clone()], "root-only", &mut sink)
        .unwrap();

    let (header, _) = split_header(sink.file("root-only.ply").unwrap());
    assert!(header.contains("element vertex 3\n"));
    assert!(header.contains("element face 1\n"));

    let mut sink = MemSink::new();
    Exporter::ascii()
        .with_vertex_attributes(vec![])
        .include_child_instances(true)
        .export(&[object], "with-children", &mut sink)
        .unwrap();

    let (header, _) = split_header(sink.file("with-children.ply").unwrap());
    assert!(header.contains("element vertex 6\n"));
    assert!(header.contains("element face 2\n"));
}

#[test]
fn transforms_compose() {
    let mesh = triangle()
        .with_transform(Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)));

    let mut sink = MemSink::new();
    Exporter::ascii()
        .with_vertex_attributes(vec![])
        .with_transform(Matrix4::from_translation(Vector3::new(0.0, 20.0, 0.0)))
        .export_mesh(&mesh, "moved", &mut sink)
        .unwrap();

    let (_, body) = split_header(sink.file("moved.ply").unwrap());
    let first_line = std::str::from_utf8(body).unwrap().lines().next().unwrap();
    assert_eq!(first_line, "10 20 0");
}

#[test]
fn unknown_attribute_type_degrades_gracefully() {
    let attr = VertexAttribute {
        name: "curvature".to_string(),
        stride: 1,
        properties: vec![
            AttributeProperty::new("curvature", "half", Convert::Identity(0)),
        ],
    };
    let mesh = triangle().with_attribute("curvature", vec![0.1, 0.2, 0.3]);

    let mut sink = MemSink::new();
    Exporter::binary()
        .with_vertex_attributes(vec![attr])
        .export_mesh(&mesh, "degraded", &mut sink)
        .unwrap();

    let file = sink.file("degraded.ply").unwrap();
    let (header, body) = split_header(file);

    // The header still declares the property, but the payload only holds
    // the 12 position bytes per vertex.
    assert!(header.contains("property half curvature\n"));
    assert_eq!(body.len(), 3 * 12 + 13);
}

#[test]
fn empty_name_defaults_to_scene() {
    let mut sink = MemSink::new();
    Exporter::ascii()
        .with_vertex_attributes(vec![])
        .export_mesh(&triangle(), "", &mut sink)
        .unwrap();

    assert!(sink.file("scene.ply").is_some());
}

#[test]
fn unsupported_format_is_rejected_before_io() {
    let err = "binary_big_endian".parse::<Format>().unwrap_err();
    match err {
        crate::Error::UnsupportedFormat(name) => assert_eq!(name, "binary_big_endian"),
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!("ascii".parse::<Format>().unwrap(), Format::Ascii);
    assert_eq!(
        "binary_little_endian".parse::<Format>().unwrap(),
        Format::BinaryLittleEndian,
    );
}

#[test]
fn id_attributes_round_trip_through_ascii() {
    let mesh = triangle()
        .with_attribute("Object", vec![7.0, 7.0, 7.0])
        .with_attribute("Segment", vec![1.0, 2.0, 3.0]);

    let mut sink = MemSink::new();
    Exporter::ascii()
        .with_vertex_attributes(vec![
            VertexAttribute::object_id(),
            VertexAttribute::segment_id(),
        ])
        .export_mesh(&mesh, "segmented", &mut sink)
        .unwrap();

    let file = sink.file("segmented.ply").unwrap();
    let (header, body) = split_header(file);

    assert!(header.contains("property uint16 objectId\nproperty uint16 segmentId\n"));
    let body = std::str::from_utf8(body).unwrap();
    assert_eq!(body.lines().next().unwrap(), "0 0 0 7 1");
}
