//! The export orchestrator: walks meshes, drives an encoder and a sink.

use cgmath::Matrix4;
use log::info;
use smallvec::SmallVec;

use crate::{
    Format,
    encode::{AsciiEncoder, BinaryEncoder, Encoder, Payloads},
    error::Error,
    header,
    scene::{MeshSource, ObjectSource},
    schema::{self, CompiledSchema, VertexAttribute},
    sink::ExportSink,
};


/// The destination base name used when the caller passes an empty one.
pub const DEFAULT_NAME: &str = "scene";

/// Serializes meshes into PLY files.
///
/// An exporter holds the static configuration of an export: the encoding,
/// the vertex attributes to emit, traversal behavior and optional extras.
/// One exporter can be reused for any number of exports; all per-export
/// state (schema, encoder, offsets) is created fresh inside the `export_*`
/// methods.
///
/// # Example
///
/// ```
/// use plywright::{Exporter, MemSink, SimpleMesh, VertexAttribute};
///
/// let mesh = SimpleMesh::new(
///     vec![[0.0, 0.0, 0.0].into(), [1.0, 0.0, 0.0].into(), [0.0, 1.0, 0.0].into()],
///     vec![[0, 1, 2]],
/// ).with_attribute("color", vec![
///     1.0, 0.0, 0.0,
///     0.0, 1.0, 0.0,
///     0.0, 0.0, 1.0,
/// ]);
///
/// let mut sink = MemSink::new();
/// Exporter::binary()
///     .with_vertex_attributes(vec![VertexAttribute::rgb_color()])
///     .export_mesh(&mesh, "triangle", &mut sink)
///     .expect("failed to export");
/// ```
#[derive(Debug, Clone)]
pub struct Exporter {
    format: Format,
    vertex_attributes: Vec<VertexAttribute>,
    include_child_instances: bool,
    transform: Option<Matrix4<f32>>,
    comments: Vec<String>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::binary()
    }
}

impl Exporter {
    /// Creates an exporter for the given format with the default
    /// configuration: RGB color as the only vertex attribute, child model
    /// instances excluded, no extra transform or comments.
    pub fn new(format: Format) -> Self {
        Self {
            format,
            vertex_attributes: vec![VertexAttribute::rgb_color()],
            include_child_instances: false,
            transform: None,
            comments: Vec::new(),
        }
    }

    /// Creates an exporter producing binary little endian files.
    pub fn binary() -> Self {
        Self::new(Format::BinaryLittleEndian)
    }

    /// Creates an exporter producing ASCII files. *Try to avoid ASCII*: it
    /// is a lot less space efficient and slower to read and write.
    pub fn ascii() -> Self {
        Self::new(Format::Ascii)
    }

    /// Replaces the requested vertex attributes. Order matters: it
    /// determines both header declaration order and physical byte order.
    /// Pass an empty vector to export bare positions.
    pub fn with_vertex_attributes(mut self, attributes: Vec<VertexAttribute>) -> Self {
        self.vertex_attributes = attributes;
        self
    }

    /// Sets a transform that is applied on top of every mesh's own world
    /// transform.
    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Also exports meshes of model instances nested inside exported
    /// objects. Off by default.
    pub fn include_child_instances(mut self, include: bool) -> Self {
        self.include_child_instances = include;
        self
    }

    /// Adds a `comment` line to the file header.
    ///
    /// The given string must not contain `'\n'` or else this method panics.
    /// Note that there are probably other characters that could confuse some
    /// parsers, so take care what strings you pass in.
    pub fn add_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();

        assert!(!comment.contains('\n'), "PLY comments must not contain '\\n'!");

        self.comments.push(comment);
        self
    }

    /// Encodes one mesh into `enc`: one row per vertex (position followed by
    /// the converted attribute values, in request order), then one entry per
    /// face with all indices shifted by `vertex_offset`.
    ///
    /// Returns the offset for the next mesh, i.e. `vertex_offset` advanced
    /// by this mesh's vertex count. Threading that value through consecutive
    /// calls is what makes face indices line up when several meshes are
    /// concatenated into one file.
    pub fn append_mesh<M, E>(
        &self,
        mesh: &M,
        enc: &mut E,
        vertex_offset: u32,
    ) -> Result<u32, Error>
    where
        M: MeshSource,
        E: Encoder,
    {
        let world = match self.transform {
            Some(transform) => transform * mesh.world_transform(),
            None => mesh.world_transform(),
        };

        let attributes = &self.vertex_attributes;
        let mut row: SmallVec<[f64; 8]> = SmallVec::new();

        mesh.for_each_vertex(&world, attributes, |position, values| {
            row.clear();
            row.push(position.x as f64);
            row.push(position.y as f64);
            row.push(position.z as f64);

            let mut at = 0;
            for attribute in attributes {
                let value = &values[at..at + attribute.stride];
                at += attribute.stride;

                for property in &attribute.properties {
                    row.push(property.convert.apply(value));
                }
            }

            enc.append_vertex(&row)
        })?;

        mesh.for_each_face(|_, [a, b, c]| {
            enc.append_face([a + vertex_offset, b + vertex_offset, c + vertex_offset])
        })?;

        Ok(vertex_offset + mesh.vertex_count())
    }

    /// Exports a single mesh to `sink` under `name` (with `.ply` appended if
    /// it's not already there).
    pub fn export_mesh<M, S>(&self, mesh: &M, name: &str, sink: &mut S) -> Result<(), Error>
    where
        M: MeshSource,
        S: ExportSink,
    {
        let filename = with_ply_extension(name);
        let compiled = schema::compile(&self.vertex_attributes);
        let nverts = mesh.vertex_count();
        let nfaces = mesh.face_count();

        match self.format {
            Format::Ascii => {
                let mut enc = AsciiEncoder::new();
                self.append_mesh(mesh, &mut enc, 0)?;
                self.finish(&compiled, nverts, nfaces, enc, &filename, sink)
            }
            Format::BinaryLittleEndian => {
                let mut enc = BinaryEncoder::new(&compiled, nverts, nfaces);
                self.append_mesh(mesh, &mut enc, 0)?;
                self.finish(&compiled, nverts, nfaces, enc, &filename, sink)
            }
        }
    }

    /// Exports all meshes of all `objects` into one file, concatenated in
    /// traversal order with correctly offset face indices.
    pub fn export<O, S>(&self, objects: &[O], name: &str, sink: &mut S) -> Result<(), Error>
    where
        O: ObjectSource,
        S: ExportSink,
    {
        let filename = with_ply_extension(name);
        let compiled = schema::compile(&self.vertex_attributes);

        // The totals have to be known before any encoding happens: the
        // binary payload buffers are sized from them.
        let mut nverts = 0;
        let mut nfaces = 0;
        for object in objects {
            let stats = object.stats(self.include_child_instances);
            nverts += stats.nverts;
            nfaces += stats.nfaces;
        }

        info!(
            "exporting {} objects with a total of {} vertices, {} faces",
            objects.len(), nverts, nfaces,
        );

        match self.format {
            Format::Ascii => {
                let mut enc = AsciiEncoder::new();
                self.append_objects(objects, &mut enc)?;
                self.finish(&compiled, nverts, nfaces, enc, &filename, sink)
            }
            Format::BinaryLittleEndian => {
                let mut enc = BinaryEncoder::new(&compiled, nverts, nfaces);
                self.append_objects(objects, &mut enc)?;
                self.finish(&compiled, nverts, nfaces, enc, &filename, sink)
            }
        }
    }

    fn append_objects<O, E>(&self, objects: &[O], enc: &mut E) -> Result<(), Error>
    where
        O: ObjectSource,
        E: Encoder,
    {
        let mut vertex_offset = 0;
        for object in objects {
            object.for_each_mesh(self.include_child_instances, |mesh| {
                vertex_offset = self.append_mesh(mesh, &mut *enc, vertex_offset)?;
                Ok(())
            })?;
        }

        Ok(())
    }

    /// Renders the header and hands everything to the sink, in the fixed
    /// order write(header), append(vertices), append(faces), finalize.
    fn finish<E, S>(
        &self,
        compiled: &CompiledSchema,
        nverts: u32,
        nfaces: u32,
        enc: E,
        filename: &str,
        sink: &mut S,
    ) -> Result<(), Error>
    where
        E: Encoder,
        S: ExportSink,
    {
        let header = header::render(compiled, self.format, nverts, nfaces, &self.comments);
        let Payloads { vertex, face } = enc.into_payloads();

        sink.write(filename, header.as_bytes())?;
        sink.append(filename, &vertex)?;
        sink.append(filename, &face)?;
        sink.finalize(filename, filename)?;

        info!("finished exporting mesh to {}", filename);
        Ok(())
    }
}

fn with_ply_extension(name: &str) -> String {
    let base = if name.is_empty() { DEFAULT_NAME } else { name };
    if base.ends_with(".ply") {
        base.to_string()
    } else {
        format!("{}.ply", base)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ply_extension_handling() {
        assert_eq!(with_ply_extension("scan"), "scan.ply");
        assert_eq!(with_ply_extension("scan.ply"), "scan.ply");
        assert_eq!(with_ply_extension(""), "scene.ply");
    }
}
