//! Contracts for the mesh and scene collaborators, plus simple concrete
//! implementations of both.
//!
//! The export engine never inspects geometry storage itself: it talks to a
//! [`MeshSource`] for raw vertex/face access and to an [`ObjectSource`] for
//! scene traversal. [`SimpleMesh`] and [`SimpleObject`] are small indexed
//! implementations that cover tests, examples and basic standalone use;
//! anything with its own mesh representation implements the traits instead.

use std::iter;

use cgmath::{Matrix4, Point3, SquareMatrix, Transform};
use smallvec::SmallVec;

use crate::{
    error::Error,
    schema::VertexAttribute,
};


/// Per-object element totals.
///
/// Multi-object exports need these *before* any encoding starts, since the
/// binary payload buffers are sized from the grand totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectStats {
    pub nverts: u32,
    pub nfaces: u32,
}

/// Raw geometry access to one triangle mesh.
pub trait MeshSource {
    fn vertex_count(&self) -> u32;

    fn face_count(&self) -> u32;

    /// The mesh's local-to-world transform.
    fn world_transform(&self) -> Matrix4<f32>;

    /// Visits every vertex in the mesh's native definition order, with its
    /// position mapped through `transform`.
    ///
    /// `values` holds the per-vertex source data for the requested
    /// attributes as one flat slice: `stride` many `f64` components per
    /// attribute, in request order. Implementations that lack data for an
    /// attribute must still fill its components (zeros are fine) so the
    /// slice layout stays intact.
    fn for_each_vertex<F>(
        &self,
        transform: &Matrix4<f32>,
        attributes: &[VertexAttribute],
        visit: F,
    ) -> Result<(), Error>
    where
        F: FnMut(Point3<f32>, &[f64]) -> Result<(), Error>;

    /// Visits every face as a triple of mesh-local vertex indices. Sources
    /// holding larger polygons have to fan-triangulate before handing faces
    /// out; only triangles cross this boundary.
    fn for_each_face<F>(&self, visit: F) -> Result<(), Error>
    where
        F: FnMut(u32, [u32; 3]) -> Result<(), Error>;
}

/// Traversal over an object (a scene node) and the meshes it contains.
pub trait ObjectSource {
    type Mesh: MeshSource;

    /// Element totals over all meshes this object contributes. Must agree
    /// with what [`for_each_mesh`][ObjectSource::for_each_mesh] visits for
    /// the same `include_child_instances` value.
    fn stats(&self, include_child_instances: bool) -> ObjectStats;

    /// Visits every mesh of this object. Meshes of nested model instances
    /// are only visited when `include_child_instances` is set.
    fn for_each_mesh<F>(&self, include_child_instances: bool, visit: F) -> Result<(), Error>
    where
        F: FnMut(&Self::Mesh) -> Result<(), Error>;
}


// ===============================================================================================
// ===== Simple implementations
// ===============================================================================================

/// An indexed triangle mesh with optional named per-vertex attribute data.
#[derive(Debug, Clone)]
pub struct SimpleMesh {
    positions: Vec<Point3<f32>>,
    triangles: Vec<[u32; 3]>,
    transform: Matrix4<f32>,
    attributes: Vec<(String, Vec<f64>)>,
}

impl SimpleMesh {
    pub fn new(positions: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
            transform: Matrix4::identity(),
            attributes: Vec::new(),
        }
    }

    /// Sets the mesh's local-to-world transform.
    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    /// Attaches per-vertex source data for the attribute named `name`.
    ///
    /// `values` is expected to hold the attribute's `stride` components per
    /// vertex, flattened. Vertices past the end of `values` read as zeros.
    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.attributes.push((name.into(), values));
        self
    }

    fn attribute(&self, name: &str) -> Option<&[f64]> {
        self.attributes.iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }
}

impl MeshSource for SimpleMesh {
    fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    fn face_count(&self) -> u32 {
        self.triangles.len() as u32
    }

    fn world_transform(&self) -> Matrix4<f32> {
        self.transform
    }

    fn for_each_vertex<F>(
        &self,
        transform: &Matrix4<f32>,
        attributes: &[VertexAttribute],
        mut visit: F,
    ) -> Result<(), Error>
    where
        F: FnMut(Point3<f32>, &[f64]) -> Result<(), Error>,
    {
        let mut values: SmallVec<[f64; 8]> = SmallVec::new();

        for (i, &position) in self.positions.iter().enumerate() {
            values.clear();
            for attribute in attributes {
                let start = i * attribute.stride;
                let chunk = self.attribute(&attribute.name)
                    .and_then(|data| data.get(start..start + attribute.stride));

                match chunk {
                    Some(chunk) => values.extend_from_slice(chunk),
                    None => values.extend(iter::repeat(0.0).take(attribute.stride)),
                }
            }

            visit(transform.transform_point(position), &values)?;
        }

        Ok(())
    }

    fn for_each_face<F>(&self, mut visit: F) -> Result<(), Error>
    where
        F: FnMut(u32, [u32; 3]) -> Result<(), Error>,
    {
        for (i, &triangle) in self.triangles.iter().enumerate() {
            visit(i as u32, triangle)?;
        }

        Ok(())
    }
}


/// A flat scene node: a list of meshes plus nested model instances.
#[derive(Debug, Clone, Default)]
pub struct SimpleObject {
    meshes: Vec<SimpleMesh>,
    child_instances: Vec<SimpleObject>,
}

impl SimpleObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_meshes(meshes: Vec<SimpleMesh>) -> Self {
        Self {
            meshes,
            child_instances: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: SimpleMesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Adds a nested model instance. Its meshes are only exported when the
    /// exporter is configured to include child instances.
    pub fn with_child_instance(mut self, child: SimpleObject) -> Self {
        self.child_instances.push(child);
        self
    }

    fn visit_meshes(
        &self,
        include_child_instances: bool,
        visit: &mut dyn FnMut(&SimpleMesh) -> Result<(), Error>,
    ) -> Result<(), Error> {
        for mesh in &self.meshes {
            visit(mesh)?;
        }

        if include_child_instances {
            for child in &self.child_instances {
                child.visit_meshes(include_child_instances, visit)?;
            }
        }

        Ok(())
    }
}

impl ObjectSource for SimpleObject {
    type Mesh = SimpleMesh;

    fn stats(&self, include_child_instances: bool) -> ObjectStats {
        let mut stats = ObjectStats::default();
        for mesh in &self.meshes {
            stats.nverts += mesh.vertex_count();
            stats.nfaces += mesh.face_count();
        }

        if include_child_instances {
            for child in &self.child_instances {
                let child_stats = child.stats(include_child_instances);
                stats.nverts += child_stats.nverts;
                stats.nfaces += child_stats.nfaces;
            }
        }

        stats
    }

    fn for_each_mesh<F>(&self, include_child_instances: bool, mut visit: F) -> Result<(), Error>
    where
        F: FnMut(&SimpleMesh) -> Result<(), Error>,
    {
        self.visit_meshes(include_child_instances, &mut visit)
    }
}
