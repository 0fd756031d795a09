//! # World Module
//!
//! The `World` is an arena of volumes keyed by chunk grid coordinate.
//!
//! ## Architecture
//!
//! Chunks never hold references to each other. A chunk's neighbours are found by
//! looking up the adjacent grid coordinates here, and the result is handed to the
//! chunk as a [`Neighbours`] snapshot when it is marched. Adding or removing a
//! chunk therefore only affects later marches.
//!
//! ## Marching
//!
//! - [`World::march_all`] marches every chunk on the calling thread
//! - [`World::march_all_parallel`] snapshots every neighbour set first, then fans
//!   the chunks out over a [`TaskManager`]
//!
//! Both produce the same buffers because marching a chunk only depends on its
//! parameters and its neighbour snapshot.

use std::{collections::HashMap, sync::Arc};

use cgmath::Point3;
use log::{debug, info};
use web_time::Instant;

use crate::{
    config::TerrainConfig,
    density::DensitySource,
    error::{TerrainError, TerrainResult},
    task_management::TaskManager,
    voxels::{
        neighbours::Neighbours,
        tasks::ChunkMarchTask,
        volume::{EdgeBehavior, Volume, VolumeParams, MIN_VOLUME_SIZE},
    },
};

/// A set of terrain chunks sharing one density field.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cgmath::Point3;
/// use voxel_terrain::voxels::{volume::EdgeBehavior, world::World};
///
/// let mut world = World::new(4, 0.0, EdgeBehavior::TrueDensity, Arc::new(|p: Point3<f32>| p.y - 1.5))?;
/// world.add_chunk_at(Point3::new(0, 0, 0));
/// world.add_chunk_at(Point3::new(1, 0, 0));
///
/// let triangles = world.march_all();
/// assert!(triangles > 0);
/// # Ok::<(), voxel_terrain::error::TerrainError>(())
/// ```
pub struct World {
    /// Chunks by grid coordinate.
    pub volumes: HashMap<Point3<i32>, Volume>,
    /// Parameters for chunks created by [`World::add_chunk_at`]. The position is
    /// replaced per chunk.
    template: VolumeParams,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Arguments
    /// * `chunk_size` - Lattice points per chunk axis, also the chunk spacing
    /// * `density_threshold` - Iso level of the surface
    /// * `edge_behavior` - How open chunk faces are treated
    /// * `density_source` - The field shared by every chunk
    pub fn new(
        chunk_size: u32,
        density_threshold: f32,
        edge_behavior: EdgeBehavior,
        density_source: Arc<dyn DensitySource>,
    ) -> TerrainResult<Self> {
        if chunk_size < MIN_VOLUME_SIZE {
            return Err(TerrainError::InvalidVolumeSize(chunk_size));
        }

        Ok(World {
            volumes: HashMap::new(),
            template: VolumeParams {
                size: chunk_size,
                position: Point3::new(0, 0, 0),
                density_threshold,
                edge_behavior,
                density_source,
            },
        })
    }

    /// Creates a world and fills it with the chunks around `config.position`.
    ///
    /// Nothing is marched yet.
    pub fn from_config(config: &TerrainConfig) -> TerrainResult<Self> {
        let seed = config.resolve_seed();
        let mut world = World::new(
            config.size,
            config.density_threshold,
            config.edge_behavior(),
            config.density_source(seed),
        )?;

        for position in config.chunk_positions() {
            world.add_chunk_at(position);
        }

        info!(
            "Created world of {} chunk(s) around {:?}, seed {}, {:?} noise",
            world.len(),
            config.position,
            seed,
            config.noise_algorithm
        );
        Ok(world)
    }

    /// Lattice points per chunk axis.
    pub fn chunk_size(&self) -> u32 {
        self.template.size
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether the world has no chunks.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Adds an unmarched chunk at `position` if the slot is free.
    ///
    /// # Returns
    /// `true` if a chunk was added.
    pub fn add_chunk_at(&mut self, position: Point3<i32>) -> bool {
        if self.volumes.contains_key(&position) {
            return false;
        }

        let params = VolumeParams {
            position,
            ..self.template.clone()
        };
        // The template size was validated in `World::new`.
        let volume = match Volume::from_params(params) {
            Ok(volume) => volume,
            Err(_) => return false,
        };
        self.volumes.insert(position, volume);
        true
    }

    /// Inserts a volume built elsewhere, for example with its own threshold.
    ///
    /// Volumes of a different size than the world's chunks will not line up with
    /// their neighbours.
    pub fn insert_volume(&mut self, volume: Volume) -> TerrainResult<()> {
        let position = volume.position();
        if self.volumes.contains_key(&position) {
            return Err(TerrainError::DuplicateChunk(position));
        }
        self.volumes.insert(position, volume);
        Ok(())
    }

    /// Takes the chunk at `position` out of the world. Its neighbours keep their
    /// meshes until they are marched again.
    pub fn remove_chunk_at(&mut self, position: Point3<i32>) -> Option<Volume> {
        self.volumes.remove(&position)
    }

    /// Whether a chunk occupies `position`.
    pub fn has_chunk_at(&self, position: Point3<i32>) -> bool {
        self.volumes.contains_key(&position)
    }

    /// The chunk at `position`.
    pub fn get_volume_at(&self, position: Point3<i32>) -> Option<&Volume> {
        self.volumes.get(&position)
    }

    /// The chunk at `position`, mutably.
    pub fn get_volume_at_mut(&mut self, position: Point3<i32>) -> Option<&mut Volume> {
        self.volumes.get_mut(&position)
    }

    /// Which neighbour slots around `position` hold a chunk right now.
    pub fn neighbours_of(&self, position: Point3<i32>) -> Neighbours {
        Neighbours::from_lookup(position, |neighbour| self.has_chunk_at(neighbour))
    }

    /// Chunk coordinates in a stable order: by x, then y, then z.
    pub fn positions(&self) -> Vec<Point3<i32>> {
        let mut positions: Vec<_> = self.volumes.keys().copied().collect();
        positions.sort_by_key(|p| (p.x, p.y, p.z));
        positions
    }

    /// Total triangles across every chunk's current buffers.
    pub fn triangle_count(&self) -> usize {
        self.volumes
            .values()
            .map(|volume| volume.mesh().triangle_count())
            .sum()
    }

    /// Marches one chunk against its current neighbours.
    ///
    /// # Returns
    /// The chunk's triangle count, or `None` if there is no chunk at `position`.
    pub fn march_chunk(&mut self, position: Point3<i32>) -> Option<usize> {
        let neighbours = self.neighbours_of(position);
        self.volumes
            .get_mut(&position)
            .map(|volume| volume.march(&neighbours).triangle_count())
    }

    /// Marches every chunk on the calling thread.
    ///
    /// # Returns
    /// The total triangle count.
    pub fn march_all(&mut self) -> usize {
        let started = Instant::now();
        let snapshots = self.neighbour_snapshots();

        let mut triangles = 0;
        for (position, neighbours) in snapshots {
            if let Some(volume) = self.volumes.get_mut(&position) {
                triangles += volume.march(&neighbours).triangle_count();
            }
        }

        info!(
            "Marched {} chunk(s) into {} triangles in {:?}",
            self.len(),
            triangles,
            started.elapsed()
        );
        triangles
    }

    /// Marches every chunk on the task manager's workers and waits for the results.
    ///
    /// The neighbour topology is frozen before the first task is published.
    ///
    /// # Returns
    /// The total triangle count, or `TerrainError::WorkerDisconnected` if a worker
    /// died before finishing.
    pub fn march_all_parallel(&mut self, task_manager: &mut TaskManager) -> TerrainResult<usize> {
        let started = Instant::now();
        let snapshots = self.neighbour_snapshots();

        for (position, neighbours) in snapshots {
            if let Some(volume) = self.volumes.get(&position) {
                task_manager.publish_task(Box::new(ChunkMarchTask::new(
                    volume.params().clone(),
                    neighbours,
                )));
            }
        }
        debug!(
            "Published {} march task(s), {} queued",
            self.len(),
            task_manager.queued_tasks()
        );

        task_manager.wait_for_all(self)?;

        let triangles = self.triangle_count();
        info!(
            "Marched {} chunk(s) on {} worker(s) into {} triangles in {:?}",
            self.len(),
            task_manager.num_workers(),
            triangles,
            started.elapsed()
        );
        Ok(triangles)
    }

    fn neighbour_snapshots(&self) -> Vec<(Point3<i32>, Neighbours)> {
        self.positions()
            .into_iter()
            .map(|position| (position, self.neighbours_of(position)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::neighbours::NeighbourDirection;

    fn flat_world(size: u32) -> World {
        World::new(
            size,
            0.0,
            EdgeBehavior::TrueDensity,
            Arc::new(|p: Point3<f32>| p.y - 1.5),
        )
        .unwrap()
    }

    #[test]
    fn undersized_chunks_are_rejected() {
        let result = World::new(1, 0.0, EdgeBehavior::TrueDensity, Arc::new(|p: Point3<f32>| p.y));
        assert!(matches!(result, Err(TerrainError::InvalidVolumeSize(1))));
    }

    #[test]
    fn add_chunk_at_ignores_occupied_slots() {
        let mut world = flat_world(4);
        assert!(world.add_chunk_at(Point3::new(0, 0, 0)));
        assert!(!world.add_chunk_at(Point3::new(0, 0, 0)));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn insert_volume_rejects_duplicates() {
        let mut world = flat_world(4);
        world.add_chunk_at(Point3::new(2, 0, 3));

        let volume = Volume::new(
            4,
            Point3::new(2, 0, 3),
            0.5,
            EdgeBehavior::TrueDensity,
            Arc::new(|p: Point3<f32>| p.y),
        )
        .unwrap();
        let result = world.insert_volume(volume);
        assert!(matches!(
            result,
            Err(TerrainError::DuplicateChunk(p)) if p == Point3::new(2, 0, 3)
        ));
    }

    #[test]
    fn neighbours_follow_the_arena() {
        let mut world = flat_world(4);
        for position in [
            Point3::new(0, 0, 0),
            Point3::new(1, 0, 0),
            Point3::new(0, 0, -1),
            Point3::new(-1, 0, 1),
        ] {
            world.add_chunk_at(position);
        }

        let neighbours = world.neighbours_of(Point3::new(0, 0, 0));
        assert!(neighbours.has(NeighbourDirection::Back));
        assert!(neighbours.has(NeighbourDirection::Left));
        assert!(neighbours.has(NeighbourDirection::FrontRight));
        assert!(!neighbours.has(NeighbourDirection::Front));
        assert_eq!(neighbours.count(), 3);

        world.remove_chunk_at(Point3::new(1, 0, 0));
        assert!(!world.neighbours_of(Point3::new(0, 0, 0)).has(NeighbourDirection::Back));
    }

    #[test]
    fn neighbour_bridges_the_gap() {
        let mut world = flat_world(4);
        world.add_chunk_at(Point3::new(0, 0, 0));
        let alone = world.march_chunk(Point3::new(0, 0, 0)).unwrap();

        world.add_chunk_at(Point3::new(1, 0, 0));
        let bridged = world.march_chunk(Point3::new(0, 0, 0)).unwrap();

        // A flat plane gives two triangles per horizontal cell.
        assert_eq!(alone, 3 * 3 * 2);
        assert_eq!(bridged, 4 * 3 * 2);
        assert_eq!(world.march_chunk(Point3::new(5, 0, 5)), None);
    }

    #[test]
    fn march_all_covers_every_chunk() {
        let mut world = flat_world(3);
        for x in 0..3 {
            world.add_chunk_at(Point3::new(x, 0, 0));
        }
        let triangles = world.march_all();

        assert_eq!(triangles, world.triangle_count());
        assert!(world.volumes.values().all(|volume| !volume.mesh().is_empty()));
        assert_eq!(
            world.positions(),
            vec![Point3::new(0, 0, 0), Point3::new(1, 0, 0), Point3::new(2, 0, 0)]
        );
    }

    #[test]
    fn parallel_march_matches_serial_march() {
        let mut serial = flat_world(4);
        let mut parallel = flat_world(4);
        for x in -1..=1 {
            for z in -1..=1 {
                serial.add_chunk_at(Point3::new(x, 0, z));
                parallel.add_chunk_at(Point3::new(x, 0, z));
            }
        }

        let serial_triangles = serial.march_all();
        let mut task_manager = TaskManager::new(3);
        let parallel_triangles = parallel.march_all_parallel(&mut task_manager).unwrap();

        assert_eq!(serial_triangles, parallel_triangles);
        for position in serial.positions() {
            assert_eq!(
                serial.get_volume_at(position).unwrap().mesh(),
                parallel.get_volume_at(position).unwrap().mesh()
            );
        }
    }
}
