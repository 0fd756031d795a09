//! # Noise Config Module
//!
//! Tuning parameters for one fractal noise layer stack. Bad values are corrected in
//! place instead of rejected, so a typo in a config file never stops generation.

use cgmath::Vector3;
use log::warn;
use serde::{Deserialize, Serialize};

/// Smallest scale a noise layer may use. Anything at or below zero is raised to this.
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// Parameters for one fractal Brownian motion stack.
///
/// Every layer samples the noise primitive at
/// `world_position * scale * lacunarity^layer + offset` and contributes with an
/// amplitude of `persistence^layer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Added to every sample coordinate after scaling.
    pub offset: Vector3<f32>,
    /// Base frequency of the first layer. Must be positive.
    pub scale: f32,
    /// Number of layers summed together. At least one.
    pub octaves: u32,
    /// Amplitude multiplier between consecutive layers, in `(0, 1]`.
    pub persistence: f32,
    /// Frequency multiplier between consecutive layers, at least `1`.
    pub lacunarity: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            offset: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
            octaves: 1,
            persistence: 1.0,
            lacunarity: 1.0,
        }
    }
}

impl NoiseConfig {
    /// Creates a config with no offset.
    pub fn new(scale: f32, octaves: u32, persistence: f32, lacunarity: f32) -> Self {
        NoiseConfig {
            offset: Vector3::new(0.0, 0.0, 0.0),
            scale,
            octaves,
            persistence,
            lacunarity,
        }
    }

    /// Returns the same config with `offset` replaced.
    pub fn with_offset(mut self, offset: Vector3<f32>) -> Self {
        self.offset = offset;
        self
    }

    /// Pulls every parameter back into its valid range.
    ///
    /// # Returns
    /// `true` if anything had to be changed.
    pub fn normalize(&mut self) -> bool {
        let mut corrected = false;

        if !(self.scale > 0.0) {
            warn!(
                "Noise scale {} is not positive, using {}",
                self.scale, MIN_NOISE_SCALE
            );
            self.scale = MIN_NOISE_SCALE;
            corrected = true;
        }

        if self.octaves == 0 {
            warn!("Noise octaves is 0, using 1");
            self.octaves = 1;
            corrected = true;
        }

        if !(self.persistence > 0.0 && self.persistence <= 1.0) {
            let persistence = if self.persistence > 1.0 { 1.0 } else { f32::EPSILON };
            warn!(
                "Noise persistence {} is outside (0, 1], using {}",
                self.persistence, persistence
            );
            self.persistence = persistence;
            corrected = true;
        }

        if !(self.lacunarity >= 1.0) {
            warn!("Noise lacunarity {} is below 1, using 1", self.lacunarity);
            self.lacunarity = 1.0;
            corrected = true;
        }

        corrected
    }
}
