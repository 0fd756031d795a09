//! # Mesh Buffers
//!
//! The output of one march. Every three consecutive vertices form a triangle and
//! `uvs[i]` belongs to `vertices[i]`.

use std::collections::HashMap;

use cgmath::{InnerSpace, Point3, Vector2, Vector3};

use super::vertex::Vertex;
use crate::voxels::marching::Triangle;

/// Squared length under which a face counts as degenerate and gets a zero normal.
const DEGENERATE_NORMAL_EPSILON: f32 = 1e-12;

/// Parallel vertex and UV buffers in chunk-local space.
///
/// Buffers only grow a whole triangle at a time, so the vertex count is always a
/// multiple of three.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// Triangle soup, three vertices per triangle.
    vertices: Vec<Point3<f32>>,
    /// Texture coordinates, one per vertex.
    uvs: Vec<Vector2<f32>>,
}

impl MeshBuffers {
    /// Creates empty buffers.
    pub fn new() -> Self {
        MeshBuffers::default()
    }

    /// Vertex positions, three per triangle.
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Texture coordinates, `uvs()[i]` belongs to `vertices()[i]`.
    pub fn uvs(&self) -> &[Vector2<f32>] {
        &self.uvs
    }

    /// Builds buffers from triangles, projecting UVs from the horizontal plane.
    ///
    /// # Arguments
    /// * `triangles` - Triangles in chunk-local space
    /// * `uv_scale` - Divisor for the local `x` and `z` of each vertex, normally the
    ///   volume size
    pub fn from_triangles(triangles: &[Triangle], uv_scale: f32) -> Self {
        let mut buffers = MeshBuffers {
            vertices: Vec::with_capacity(triangles.len() * 3),
            uvs: Vec::with_capacity(triangles.len() * 3),
        };
        for triangle in triangles {
            buffers.push_triangle(triangle, uv_scale);
        }
        buffers
    }

    /// Appends one triangle and its projected UVs.
    pub fn push_triangle(&mut self, triangle: &Triangle, uv_scale: f32) {
        for vertex in triangle {
            self.vertices.push(*vertex);
            self.uvs
                .push(Vector2::new(vertex.x / uv_scale, vertex.z / uv_scale));
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Whether the march produced no geometry.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates the triangles in emission order.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|triangle| [triangle[0], triangle[1], triangle[2]])
    }

    /// Vertex positions as `[x0, y0, z0, x1, ...]`.
    pub fn flat_vertices(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|vertex| [vertex.x, vertex.y, vertex.z])
            .collect()
    }

    /// UVs as `[u0, v0, u1, ...]`.
    pub fn flat_uvs(&self) -> Vec<f32> {
        self.uvs.iter().flat_map(|uv| [uv.x, uv.y]).collect()
    }

    /// One normal per triangle, from its winding. Degenerate triangles get a zero vector.
    pub fn face_normals(&self) -> Vec<Vector3<f32>> {
        self.triangles().map(|triangle| face_normal(&triangle)).collect()
    }

    /// Smooth normals, one per vertex.
    ///
    /// Soup vertices at bit-identical positions are treated as one, and each gets
    /// the area-weighted sum of the faces around it. Vertices only touched by
    /// degenerate faces get a zero vector.
    pub fn vertex_normals(&self) -> Vec<Vector3<f32>> {
        let mut accumulated: HashMap<[u32; 3], Vector3<f32>> = HashMap::new();
        for triangle in self.triangles() {
            // Cross product length is twice the area
            let weighted = (triangle[1] - triangle[0]).cross(triangle[2] - triangle[0]);
            for vertex in triangle {
                *accumulated
                    .entry(position_key(vertex))
                    .or_insert(Vector3::new(0.0, 0.0, 0.0)) += weighted;
            }
        }

        self.vertices
            .iter()
            .map(|vertex| {
                let normal = accumulated
                    .get(&position_key(*vertex))
                    .copied()
                    .unwrap_or(Vector3::new(0.0, 0.0, 0.0));
                if normal.magnitude2() < DEGENERATE_NORMAL_EPSILON {
                    Vector3::new(0.0, 0.0, 0.0)
                } else {
                    normal.normalize()
                }
            })
            .collect()
    }

    /// Vertex positions translated by `offset`, usually the chunk's world offset.
    pub fn world_vertices(&self, offset: Vector3<f32>) -> Vec<Point3<f32>> {
        self.vertices.iter().map(|vertex| *vertex + offset).collect()
    }

    /// Interleaves positions, flat face normals and UVs into upload-ready vertices.
    pub fn interleaved(&self) -> Vec<Vertex> {
        self.vertices
            .chunks_exact(3)
            .zip(self.uvs.chunks_exact(3))
            .flat_map(|(positions, uvs)| {
                let normal = face_normal(&[positions[0], positions[1], positions[2]]);
                positions
                    .iter()
                    .zip(uvs)
                    .map(move |(position, uv)| Vertex::new(*position, normal, *uv))
            })
            .collect()
    }
}

fn position_key(position: Point3<f32>) -> [u32; 3] {
    [position.x.to_bits(), position.y.to_bits(), position.z.to_bits()]
}

fn face_normal(triangle: &Triangle) -> Vector3<f32> {
    let normal = (triangle[1] - triangle[0]).cross(triangle[2] - triangle[0]);
    if normal.magnitude2() < DEGENERATE_NORMAL_EPSILON {
        Vector3::new(0.0, 0.0, 0.0)
    } else {
        normal.normalize()
    }
}
