//! # Voxel Terrain Entry Point
//!
//! Generates and marches a terrain world from a JSON config.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- config/terrain.json
//! ```

fn main() {
    if let Err(err) = voxel_terrain::run() {
        log::error!("Terrain generation failed: {}", err);
        std::process::exit(1);
    }
}
