//! # Config Module
//!
//! Terrain generation settings, loaded from JSON. Every field has a default, so an
//! empty object (`{}`) is a valid config.
//!
//! ```json
//! {
//!     "size": 16,
//!     "seed": 42,
//!     "noise_algorithm": "simplex",
//!     "noise_configs": [{ "scale": 0.05, "octaves": 4, "persistence": 0.5, "lacunarity": 2.0 }],
//!     "show_edges": true,
//!     "grid_radius": 1
//! }
//! ```

use std::{fs, path::Path, sync::Arc};

use cgmath::{Point3, Vector3};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    density::{DensitySource, NoiseAlgorithm, NoiseConfig, NoiseContext, NoiseDensityField},
    error::TerrainResult,
    voxels::volume::EdgeBehavior,
};

/// Default number of lattice points per chunk axis.
pub const DEFAULT_SIZE: u32 = 16;

/// Settings for a world of marched chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Lattice points per chunk axis
    pub size: u32,
    /// Grid coordinate of the centre chunk
    pub position: Point3<i32>,
    /// Noise seed. A random one is drawn when unset.
    pub seed: Option<u32>,
    /// Iso level of the surface
    pub density_threshold: f32,
    /// Noise primitive shared by every noise stack
    pub noise_algorithm: NoiseAlgorithm,
    /// Noise stacks averaged into the density field
    pub noise_configs: Vec<NoiseConfig>,
    /// Cap open chunk faces with walls
    pub show_edges: bool,
    /// Density forced onto open faces when `show_edges` is set
    pub edge_sharpness: f32,
    /// Vertical falloff of the density field, half the chunk size when unset
    pub y_bias: Option<f32>,
    /// Chunks generated on each horizontal side of `position`
    pub grid_radius: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            size: DEFAULT_SIZE,
            position: Point3::new(0, 0, 0),
            seed: None,
            density_threshold: 0.0,
            noise_algorithm: NoiseAlgorithm::default(),
            noise_configs: vec![NoiseConfig::new(0.05, 4, 0.5, 2.0)],
            show_edges: true,
            edge_sharpness: 1.0,
            y_bias: None,
            grid_radius: 0,
        }
    }
}

impl TerrainConfig {
    /// Parses a config from a JSON string.
    pub fn from_json_str(json: &str) -> TerrainResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = TerrainConfig::from_json_str(&json)?;
        info!("Loaded terrain config from {}", path.display());
        Ok(config)
    }

    /// The configured seed, or a freshly drawn one.
    pub fn resolve_seed(&self) -> u32 {
        match self.seed {
            Some(seed) => seed,
            None => {
                let seed = fastrand::u32(..);
                info!("No seed configured, using {}", seed);
                seed
            }
        }
    }

    /// The vertical falloff, defaulting to half the chunk size.
    pub fn y_bias(&self) -> f32 {
        self.y_bias.unwrap_or(self.size as f32 / 2.0)
    }

    /// The edge behaviour selected by `show_edges` and `edge_sharpness`.
    pub fn edge_behavior(&self) -> EdgeBehavior {
        EdgeBehavior::from_flags(self.show_edges, self.edge_sharpness)
    }

    /// Builds the density field for `seed`. Noise configs are corrected on the way.
    pub fn density_field(&self, seed: u32) -> NoiseDensityField {
        NoiseDensityField::new(
            NoiseContext::new(seed, self.noise_algorithm),
            self.noise_configs.clone(),
            self.size as f32,
            self.y_bias(),
        )
    }

    /// [`TerrainConfig::density_field`] behind a shareable trait object.
    pub fn density_source(&self, seed: u32) -> Arc<dyn DensitySource> {
        Arc::new(self.density_field(seed))
    }

    /// Grid coordinates of every chunk in the square of `grid_radius` around
    /// `position`, row by row.
    pub fn chunk_positions(&self) -> Vec<Point3<i32>> {
        let radius = self.grid_radius as i32;
        (-radius..=radius)
            .flat_map(|dz| (-radius..=radius).map(move |dx| Vector3::new(dx, 0, dz)))
            .map(|step| self.position + step)
            .collect()
    }
}
