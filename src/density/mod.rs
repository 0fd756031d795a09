//! # Density Module
//!
//! Everything that decides what is solid and what is air.
//!
//! * **NoiseContext**: a seeded Perlin or Simplex primitive
//! * **NoiseConfig**: one fractal noise stack and its correction rules
//! * **NoiseDensityField**: the terrain density function built from both
//!
//! Volumes only see the [`DensitySource`] trait, so any pure function of world
//! position can stand in for the noise field.

use cgmath::Point3;

pub mod density_field;
pub mod noise_config;
pub mod noise_context;

pub use density_field::NoiseDensityField;
pub use noise_config::NoiseConfig;
pub use noise_context::{NoiseAlgorithm, NoiseContext};

/// A scalar field sampled at lattice corners.
///
/// Implementations must be pure: the same world position always returns the same
/// density. Chunk seams rely on this.
pub trait DensitySource: Send + Sync {
    /// Returns the density at `world_position`. Values at or below the volume's
    /// threshold are inside the surface.
    fn density(&self, world_position: Point3<f32>) -> f32;
}

impl<F> DensitySource for F
where
    F: Fn(Point3<f32>) -> f32 + Send + Sync,
{
    fn density(&self, world_position: Point3<f32>) -> f32 {
        self(world_position)
    }
}
