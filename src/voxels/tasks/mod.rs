//! Background tasks for the voxel terrain.

pub mod chunk_march_task;

pub use chunk_march_task::ChunkMarchTask;
