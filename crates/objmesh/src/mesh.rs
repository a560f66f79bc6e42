//! CPU-side mesh representations: the raw parse result and the two
//! GPU-ready output buffers built from it.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// One triangle corner as 1-based indices into the attribute arrays.
///
/// Field order is the sort key used for welding: position, then texture
/// coordinate, then normal. Index 0 is the sentinel (attribute absent).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceCorner {
    pub position: u32,
    pub tex_coord: u32,
    pub normal: u32,
}

impl FaceCorner {
    pub const fn new(position: u32, tex_coord: u32, normal: u32) -> Self {
        Self {
            position,
            tex_coord,
            normal,
        }
    }
}

/// A named contiguous run of face corners started by a `g` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: String,
    /// Material active (`usemtl`) when the group's first face was read.
    pub material: Option<String>,
    pub start_offset: u32,
    pub count: u32,
}

impl GroupInfo {
    /// Corner range for a sub-draw (index range for indexed meshes).
    pub fn range(&self) -> Range<usize> {
        let start = self.start_offset as usize;
        start..start + self.count as usize
    }
}

/// Vertex with position/normal/uv. Values are in object space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Flat attribute arrays and triangulated corners, as parsed from an OBJ file.
///
/// # Sentinel
/// Every attribute array holds a zero-valued element at index 0, so the
/// 1-based OBJ indices stored in [`FaceCorner`] index the arrays directly and
/// an omitted texture coordinate or normal (index 0) resolves to zero. The
/// parser only stores indices that refer to defined attributes, which makes
/// [`RawMesh::resolve`] infallible.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    corners: Vec<FaceCorner>,
    groups: Vec<GroupInfo>,
    material_libraries: Vec<String>,
}

impl Default for RawMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl RawMesh {
    pub fn new() -> Self {
        Self {
            positions: vec![Vec3::ZERO],
            normals: vec![Vec3::ZERO],
            tex_coords: vec![Vec2::ZERO],
            corners: Vec::new(),
            groups: Vec::new(),
            material_libraries: Vec::new(),
        }
    }

    /// Resolve a corner against the attribute arrays.
    #[inline]
    pub fn resolve(&self, corner: FaceCorner) -> MeshVertex {
        MeshVertex {
            position: self.positions[corner.position as usize].to_array(),
            normal: self.normals[corner.normal as usize].to_array(),
            uv: self.tex_coords[corner.tex_coord as usize].to_array(),
        }
    }

    /// Number of `v` directives read (sentinel excluded).
    pub fn position_count(&self) -> usize {
        self.positions.len() - 1
    }

    /// Number of `vn` directives read (sentinel excluded).
    pub fn normal_count(&self) -> usize {
        self.normals.len() - 1
    }

    /// Number of `vt` directives read (sentinel excluded).
    pub fn tex_coord_count(&self) -> usize {
        self.tex_coords.len() - 1
    }

    pub fn corners(&self) -> &[FaceCorner] {
        &self.corners
    }

    pub fn groups(&self) -> &[GroupInfo] {
        &self.groups
    }

    /// Material library file names referenced by `mtllib`.
    pub fn material_libraries(&self) -> &[String] {
        &self.material_libraries
    }

    pub(crate) fn push_position(&mut self, p: Vec3) {
        self.positions.push(p);
    }

    pub(crate) fn push_normal(&mut self, n: Vec3) {
        self.normals.push(n);
    }

    pub(crate) fn push_tex_coord(&mut self, t: Vec2) {
        self.tex_coords.push(t);
    }

    pub(crate) fn push_corner(&mut self, corner: FaceCorner) {
        self.corners.push(corner);
    }

    pub(crate) fn push_material_library(&mut self, name: String) {
        self.material_libraries.push(name);
    }

    pub(crate) fn set_groups(&mut self, groups: Vec<GroupInfo>) {
        self.groups = groups;
    }

    /// Split off the descriptive parts so output buffers can take ownership.
    pub(crate) fn take_metadata(&mut self) -> (Vec<GroupInfo>, Vec<String>) {
        (
            std::mem::take(&mut self.groups),
            std::mem::take(&mut self.material_libraries),
        )
    }
}

/// Unindexed triangle list: one vertex per face corner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitMesh {
    pub vertices: Vec<MeshVertex>,
    pub groups: Vec<GroupInfo>,
    pub material_libraries: Vec<String>,
}

impl SplitMesh {
    /// Vertex buffer as raw bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Indexed triangle mesh with tightly-packed unique vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub groups: Vec<GroupInfo>,
    pub material_libraries: Vec<String>,
}

impl IndexedMesh {
    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    /// Vertex buffer as raw bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes (`u32` per index).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
