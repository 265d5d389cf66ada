//! Exporting triangle meshes as PLY files.
//!
//! This library serializes meshes (vertex positions, optional per-vertex
//! attributes and triangular faces) into the PLY format, either as ASCII text
//! or as binary data in little endian byte order. Scene traversal, raw
//! geometry access and the actual byte destination are behind the traits in
//! [`scene`] and [`sink`]; the crate ships simple implementations of those
//! ([`SimpleMesh`], [`SimpleObject`], [`FileSink`], [`MemSink`]) so that
//! everything works out of the box.
//!
//! # Random notes on the format
//!
//! The PLY format is terribly underspecified (as are most mesh formats), so a
//! few notes on the choices made here:
//!
//! - The header is a series of `'\n'` terminated lines. The original specs
//!   mention carriage returns, but every file in the wild uses `'\n'`.
//! - For ASCII encoding we simply use the `fmt::Display` impl of `f64` for
//!   all values. It's not clear if that's OK, but other programs haven't had
//!   issues with it so far.
//! - Face index lists are always written as `uchar` count + `int` indices,
//!   since faces are restricted to triangles.
//!
//! # Example
//!
//! ```
//! use plywright::{Exporter, MemSink, SimpleMesh};
//!
//! let mesh = SimpleMesh::new(
//!     vec![[0.0, 0.0, 0.0].into(), [1.0, 0.0, 0.0].into(), [0.0, 1.0, 0.0].into()],
//!     vec![[0, 1, 2]],
//! );
//!
//! let mut sink = MemSink::new();
//! Exporter::ascii()
//!     .with_vertex_attributes(vec![])
//!     .export_mesh(&mesh, "triangle", &mut sink)
//!     .expect("failed to export");
//!
//! assert!(sink.file("triangle.ply").is_some());
//! ```

use std::str::FromStr;

pub mod encode;
pub mod error;
pub mod export;
pub mod header;
pub mod scene;
pub mod schema;
pub mod sink;

#[cfg(test)]
mod tests;

pub use self::{
    error::Error,
    export::Exporter,
    schema::{CompiledSchema, Convert, ScalarType, VertexAttribute},
    scene::{MeshSource, ObjectSource, ObjectStats, SimpleMesh, SimpleObject},
    sink::{ExportSink, FileSink, MemSink},
};


/// The encoding of a PLY file.
///
/// Only the two encodings below are supported. Big endian PLY files exist in
/// the wild, but no exporter here produces them; requesting one via
/// [`Format::from_str`] results in [`Error::UnsupportedFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ascii,
    BinaryLittleEndian,
}

impl Format {
    /// The name of this format as it appears in the header's `format` line.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Ascii => "ascii",
            Format::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

impl FromStr for Format {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" => Ok(Format::Ascii),
            "binary_little_endian" => Ok(Format::BinaryLittleEndian),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}
