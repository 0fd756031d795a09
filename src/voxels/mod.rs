//! # Voxels Module
//!
//! Turning a density field into chunked triangle meshes.
//!
//! * `marching` - the case table and single-cell triangulation
//! * `volume` - one chunk: corner lattice, edge policy and mesh buffers
//! * `neighbours` - neighbour directions and presence snapshots
//! * `world` - the chunk arena and whole-world marching
//! * `tasks` - worker tasks for parallel marching

pub mod marching;
pub mod neighbours;
pub mod tasks;
pub mod volume;
pub mod world;
