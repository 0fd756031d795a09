//! Interleaved vertex format for terrain meshes.

use cgmath::{Point3, Vector2, Vector3};

/// A terrain vertex ready to be copied into a vertex buffer.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Normal: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
///
/// Total size: 32 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in chunk-local space
    position: [f32; 3],
    /// Face normal of the triangle this vertex belongs to
    normal: [f32; 3],
    /// UV texture coordinates
    tex_coords: [f32; 2],
}

impl Vertex {
    /// Byte offset of the normal inside a vertex.
    pub const NORMAL_OFFSET: usize = std::mem::size_of::<[f32; 3]>();
    /// Byte offset of the texture coordinates inside a vertex.
    pub const TEX_COORDS_OFFSET: usize = std::mem::size_of::<[f32; 6]>();

    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - Position of the vertex
    /// * `normal` - Normal to shade the vertex with
    /// * `uv` - Texture coordinates
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, uv: Vector2<f32>) -> Self {
        Vertex {
            position: position.into(),
            normal: normal.into(),
            tex_coords: uv.into(),
        }
    }

    /// Position in chunk-local space.
    pub fn position(&self) -> Point3<f32> {
        self.position.into()
    }

    /// Shading normal.
    pub fn normal(&self) -> Vector3<f32> {
        self.normal.into()
    }

    /// UV texture coordinates.
    pub fn tex_coords(&self) -> Vector2<f32> {
        self.tex_coords.into()
    }

    /// Views a vertex slice as raw bytes for a buffer upload.
    pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}
