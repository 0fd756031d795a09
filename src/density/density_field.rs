//! # Density Field Module
//!
//! The terrain density function: averaged fractal noise pulled down by a height
//! bias, so space is solid near the floor of a volume and open towards its top.
//!
//! The field only depends on world position, which is what lets two chunks agree on
//! the density of a shared face without exchanging any data.

use cgmath::{Point3, Vector3};

use super::{noise_config::NoiseConfig, noise_context::NoiseContext, DensitySource};

/// Substituted for a zero or negative vertical bias.
pub const Y_BIAS_EPSILON: f32 = 1e-4;

/// Sums `config.octaves` layers of noise at `world_position`.
///
/// # Returns
/// The raw fBm value, roughly in `[-sum(amplitudes), sum(amplitudes)]`.
pub fn fbm(noise: &NoiseContext, config: &NoiseConfig, world_position: Point3<f32>) -> f64 {
    let mut amplitude = 1.0f64;
    let mut frequency = config.scale as f64;
    let mut total = 0.0f64;

    for _ in 0..config.octaves {
        let point = [
            world_position.x as f64 * frequency + config.offset.x as f64,
            world_position.y as f64 * frequency + config.offset.y as f64,
            world_position.z as f64 * frequency + config.offset.z as f64,
        ];
        total += noise.sample3d(point) * amplitude;

        amplitude *= config.persistence as f64;
        frequency *= config.lacunarity as f64;
    }

    total
}

/// Evaluates the terrain density at a point.
///
/// # Arguments
/// * `position` - Sample position in the chunk's local frame
/// * `volume_scale` - Size of a volume in cells, divides the height bias
/// * `configs` - Noise stacks averaged with equal weight
/// * `chunk_offset` - World translation of the chunk, added to `position`
/// * `y_bias` - Vertical falloff, replaced by [`Y_BIAS_EPSILON`] when not positive
/// * `noise` - The seeded noise primitive
///
/// # Returns
/// `height_bias * (y / y_bias) - noise`, where `noise` is the config average
/// remapped into `[0, 1]`. Lower values are inside the terrain.
pub fn sample(
    position: Point3<f32>,
    volume_scale: f32,
    configs: &[NoiseConfig],
    chunk_offset: Vector3<f32>,
    y_bias: f32,
    noise: &NoiseContext,
) -> f32 {
    let world_position = position + chunk_offset;

    let averaged = if configs.is_empty() {
        0.0
    } else {
        configs
            .iter()
            .map(|config| fbm(noise, config, world_position))
            .sum::<f64>()
            / configs.len() as f64
    };
    let noise_value = ((averaged + 1.0) / 2.0) as f32;

    let height_bias = world_position.y / volume_scale;
    height_bias * (world_position.y / y_bias.max(Y_BIAS_EPSILON)) - noise_value
}

/// A [`DensitySource`] built from noise stacks and a height bias.
#[derive(Debug)]
pub struct NoiseDensityField {
    noise: NoiseContext,
    noise_configs: Vec<NoiseConfig>,
    volume_scale: f32,
    y_bias: f32,
}

impl NoiseDensityField {
    /// Creates a density field. Out-of-range noise parameters are corrected here.
    ///
    /// # Arguments
    /// * `noise` - The seeded noise primitive, owned by the field from now on
    /// * `noise_configs` - Noise stacks averaged together
    /// * `volume_scale` - Size of a volume in cells
    /// * `y_bias` - Vertical falloff, usually half the volume size
    pub fn new(
        noise: NoiseContext,
        mut noise_configs: Vec<NoiseConfig>,
        volume_scale: f32,
        y_bias: f32,
    ) -> Self {
        for config in noise_configs.iter_mut() {
            config.normalize();
        }

        NoiseDensityField {
            noise,
            noise_configs,
            volume_scale,
            y_bias,
        }
    }

    /// The noise stacks after correction.
    pub fn noise_configs(&self) -> &[NoiseConfig] {
        &self.noise_configs
    }

    /// The seeded noise primitive.
    pub fn noise(&self) -> &NoiseContext {
        &self.noise
    }

    /// Samples the field at a chunk-local `position` of a chunk translated by `chunk_offset`.
    pub fn sample(&self, position: Point3<f32>, chunk_offset: Vector3<f32>) -> f32 {
        sample(
            position,
            self.volume_scale,
            &self.noise_configs,
            chunk_offset,
            self.y_bias,
            &self.noise,
        )
    }
}

impl DensitySource for NoiseDensityField {
    fn density(&self, world_position: Point3<f32>) -> f32 {
        self.sample(world_position, Vector3::new(0.0, 0.0, 0.0))
    }
}
