//! # Task Traits
//!
//! A [`Task`] runs on a worker thread and owns everything it needs. Its
//! [`TaskResult`] travels back to the thread that owns the [`World`] and is applied
//! there, so workers never touch shared terrain state.
//!
//! ## Task Lifecycle
//! 1. A task is published via `TaskManager::publish_task()`
//! 2. `process()` runs on a worker thread and returns a boxed result
//! 3. `handle_result()` runs on the owning thread with mutable access to the world
//! 4. Any follow-up tasks it returns are published in turn

use crate::voxels::world::World;

/// A unit of work that can run on a worker thread.
///
/// Tasks should be coarse-grained (a whole chunk, not a single cell) and must not
/// borrow anything: they are moved across threads.
pub trait Task: Send {
    /// Does the work and returns a result to be applied on the owning thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// The output of a [`Task`], applied back on the thread that owns the world.
pub trait TaskResult: Send {
    /// Applies the result.
    ///
    /// # Returns
    /// Follow-up tasks to publish, usually empty.
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>>;
}
