//! # Meshing Module
//!
//! The hand-off between marching and whatever draws or exports the surface.
//!
//! * **MeshBuffers**: the triangle soup a volume produces, kept in chunk-local space
//! * **Vertex**: an interleaved, `Pod` vertex for uploading straight to a GPU buffer
//!
//! Marching never talks to a renderer. A consumer reads the buffers after a march
//! and decides how to use them.

pub mod mesh_buffers;
pub mod vertex;

pub use mesh_buffers::MeshBuffers;
pub use vertex::Vertex;
