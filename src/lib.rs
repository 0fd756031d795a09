#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! Marching cubes isosurface extraction for noise-driven voxel terrain.
//!
//! A seeded fractal noise field decides what is solid. Chunks of that field are
//! sampled on a regular lattice and every lattice cell is triangulated with the
//! classic 256-case table. Adjacent chunks sample their shared faces from the same
//! world positions, so the surface closes across chunk borders without a stitching
//! pass.
//!
//! ## Key Modules
//!
//! * `density` - noise primitives, noise configs and the terrain density field
//! * `voxels` - cells, volumes (chunks), neighbours and the world arena
//! * `meshing` - mesh buffers and the interleaved vertex format
//! * `task_management` - the worker pool used for parallel marching
//! * `config` - JSON terrain settings
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_terrain::{config::TerrainConfig, task_management::TaskManager, voxels::world::World};
//!
//! let config = TerrainConfig::from_path("config/terrain.json")?;
//! let mut world = World::from_config(&config)?;
//! world.march_all_parallel(&mut TaskManager::with_available_parallelism())?;
//!
//! for position in world.positions() {
//!     let volume = world.get_volume_at(position).unwrap();
//!     let upload = volume.mesh().interleaved();
//!     println!("{:?}: {} vertices", position, upload.len());
//! }
//! # Ok::<(), voxel_terrain::error::TerrainError>(())
//! ```

use std::env;

use log::info;

pub mod config;
pub mod density;
pub mod error;
pub mod meshing;
pub mod task_management;
pub mod voxels;

use config::TerrainConfig;
use error::TerrainResult;
use task_management::TaskManager;
use voxels::world::World;

/// Builds and marches the world described by `config` on a pool of `num_workers`.
pub fn generate(config: &TerrainConfig, num_workers: usize) -> TerrainResult<World> {
    let mut world = World::from_config(config)?;
    let mut task_manager = TaskManager::new(num_workers);
    world.march_all_parallel(&mut task_manager)?;

    for position in world.positions() {
        if let Some(volume) = world.get_volume_at(position) {
            info!(
                "Chunk {:?}: {} triangles",
                position,
                volume.mesh().triangle_count()
            );
        }
    }
    Ok(world)
}

/// Command line entry point.
///
/// Loads the config file named by the first argument, or the defaults when there
/// is none, then generates and marches the world on one worker per core.
pub fn run() -> TerrainResult<()> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match env::args().nth(1) {
        Some(path) => TerrainConfig::from_path(path)?,
        None => {
            info!("No config file given, using defaults");
            TerrainConfig::default()
        }
    };

    let num_workers = std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1);
    let world = generate(&config, num_workers)?;
    info!(
        "Generated {} chunk(s), {} triangles in total",
        world.len(),
        world.triangle_count()
    );
    Ok(())
}
