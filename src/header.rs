//! Rendering the PLY file header.
//!
//! The header is always ASCII, regardless of the body encoding, and has to
//! byte-match what standard PLY readers expect. Property type names are the
//! raw tokens from the schema, not normalized.

use crate::{
    Format,
    schema::CompiledSchema,
};


/// The comment written as the first comment line of every exported file.
pub const GENERATOR_COMMENT: &str = "plywright generated";

/// Renders the complete header for the given schema and element counts,
/// newline-joined with a trailing newline.
///
/// Extra `comments` are emitted after the generator comment, one line each.
/// They must not contain `'\n'`; [`Exporter::add_comment`][crate::Exporter::add_comment]
/// enforces that.
pub fn render(
    schema: &CompiledSchema,
    format: Format,
    nverts: u32,
    nfaces: u32,
    comments: &[String],
) -> String {
    let mut lines = vec![
        "ply".to_string(),
        format!("format {} 1.0", format.name()),
        format!("comment {}", GENERATOR_COMMENT),
    ];

    for comment in comments {
        lines.push(format!("comment {}", comment));
    }

    lines.push(format!("element vertex {}", nverts));
    for prop in &schema.vertex_properties {
        lines.push(format!("property {} {}", prop.ty, prop.name));
    }

    lines.push(format!("element face {}", nfaces));
    for prop in &schema.face_properties {
        lines.push(format!("property {} {}", prop.ty, prop.name));
    }

    lines.push("end_header".to_string());

    lines.join("\n") + "\n"
}
