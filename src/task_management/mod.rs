//! # Task Management System
//!
//! A small worker pool for marching chunks in parallel.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: owns the workers, distributes tasks and collects results
//! - `Task`: a self-contained unit of work that runs on a worker
//! - `TaskResult`: the output of a task, applied to the [`World`] by the owner thread
//! - `TaskChannel`: the pair of channels connecting the owner thread to one worker
//!
//! Each worker is a `std::thread` fed over its own `mpsc` channel. Tasks are handed
//! out round-robin with at most [`MAX_TASKS_IN_FLIGHT`] per worker; the rest wait
//! in a FIFO queue.
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager sends each task to the next free worker, or queues it
//! 3. Workers process tasks and send the results back
//! 4. Results are applied on the owner thread in `process_completed_tasks()` or
//!    `wait_for_all()`
//! 5. Results may return follow-up tasks, which are published in turn
//!
//! ## Example Usage
//! ```no_run
//! use voxel_terrain::{config::TerrainConfig, task_management::TaskManager, voxels::world::World};
//!
//! let mut world = World::from_config(&TerrainConfig::default())?;
//! let mut task_manager = TaskManager::new(4);
//! world.march_all_parallel(&mut task_manager)?;
//! # Ok::<(), voxel_terrain::error::TerrainError>(())
//! ```

pub mod task;

use std::{
    collections::VecDeque,
    sync::mpsc::{channel, Receiver, Sender},
    thread::{self, JoinHandle},
};

use log::{error, info};
use task::{Task, TaskResult};

use crate::{
    error::{TerrainError, TerrainResult},
    voxels::world::World,
};

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Kept at 1 so a slow chunk never holds other work hostage behind it on the same
/// worker while the rest of the pool is idle.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// The link between the owner thread and one worker thread.
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    /// Set once a send to this worker failed
    disconnected: bool,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

impl TaskManager {
    /// Creates a `TaskManager` with `num_workers` worker threads, at least one.
    pub fn new(num_workers: usize) -> Self {
        let num_workers = num_workers.max(1);
        let mut channels = Vec::with_capacity(num_workers);

        for _ in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let worker = thread::spawn(move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                disconnected: false,
                _worker: worker,
            });
        }

        info!("Started {} march worker(s)", num_workers);

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Creates one worker per available core.
    pub fn with_available_parallelism() -> Self {
        let available = thread::available_parallelism();
        info!("Available parallelism: {:?}", available);
        TaskManager::new(available.map(|count| count.get()).unwrap_or(1))
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Tasks sent to workers whose results have not been applied yet.
    pub fn tasks_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Tasks waiting for a free worker.
    pub fn queued_tasks(&self) -> usize {
        self.queued_tasks.len()
    }

    /// No queued tasks and nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.tasks_in_flight() == 0
    }

    /// Tries to send a task to a specific worker.
    ///
    /// # Returns
    /// - `Ok(())` if the worker accepted the task
    /// - `Err(task)` if the worker has hung up; the channel is marked disconnected
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        let channel = &mut self.channels[channel_idx];
        match channel.task_sender.send(task) {
            Ok(_) => {
                channel.num_tasks_in_flight += 1;
                Ok(())
            }
            Err(failed) => {
                error!("March worker {} is gone, requeueing its task", channel_idx);
                channel.disconnected = true;
                Err(failed.0)
            }
        }
    }

    fn is_available(channel: &TaskChannel) -> bool {
        !channel.disconnected && channel.num_tasks_in_flight < MAX_TASKS_IN_FLIGHT
    }

    /// Finds the next worker that can take a task, round-robin from the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|step| (self.current_channel + step) % count)
            .find(|&idx| Self::is_available(&self.channels[idx]))
    }

    /// Publishes a task for execution.
    ///
    /// # Returns
    /// - `true` if the task went straight to a worker
    /// - `false` if it was queued because every worker is busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to free workers, oldest first, until either runs out.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => self.queued_tasks.push_front(task),
            }
        }
    }

    /// Applies every result that is already available, without blocking.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn process_completed_tasks(&mut self, world: &mut World) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut handled = 0;
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                tasks_to_queue.extend(result.handle_result(world));
                handled += 1;
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
        self.process_queued_tasks();
        handled
    }

    /// Blocks until every published task, and every follow-up it spawns, has been
    /// processed and applied.
    ///
    /// # Returns
    /// The number of results applied, or `TerrainError::WorkerDisconnected` if a
    /// worker died with work outstanding.
    pub fn wait_for_all(&mut self, world: &mut World) -> TerrainResult<usize> {
        let mut handled = 0;

        loop {
            self.process_queued_tasks();
            if self.is_idle() {
                return Ok(handled);
            }
            if self.tasks_in_flight() == 0 {
                let idx = self
                    .channels
                    .iter()
                    .position(|channel| channel.disconnected)
                    .unwrap_or(self.current_channel);
                error!(
                    "No march worker left for {} queued task(s)",
                    self.queued_tasks.len()
                );
                return Err(TerrainError::WorkerDisconnected(idx));
            }

            let mut tasks_to_queue = Vec::new();
            for (idx, channel) in self.channels.iter_mut().enumerate() {
                if channel.num_tasks_in_flight == 0 {
                    continue;
                }
                let result = channel.result_receiver.recv().map_err(|_| {
                    error!(
                        "March worker {} hung up with {} task(s) in flight",
                        idx, channel.num_tasks_in_flight
                    );
                    TerrainError::WorkerDisconnected(idx)
                })?;
                channel.num_tasks_in_flight -= 1;
                tasks_to_queue.extend(result.handle_result(world));
                handled += 1;
            }

            for task in tasks_to_queue {
                self.publish_task(task);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::volume::EdgeBehavior;
    use cgmath::Point3;
    use std::sync::Arc;

    fn empty_world() -> World {
        World::new(2, 0.0, EdgeBehavior::TrueDensity, Arc::new(|p: Point3<f32>| p.y)).unwrap()
    }

    /// Adds a chunk at `x`, then asks for the next one until `last`.
    struct AddChunkTask {
        x: i32,
        last: i32,
    }

    struct AddChunkResult {
        x: i32,
        last: i32,
    }

    impl Task for AddChunkTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            Box::new(AddChunkResult {
                x: self.x,
                last: self.last,
            })
        }
    }

    impl TaskResult for AddChunkResult {
        fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>> {
            world.add_chunk_at(Point3::new(self.x, 0, 0));
            if self.x < self.last {
                vec![Box::new(AddChunkTask {
                    x: self.x + 1,
                    last: self.last,
                })]
            } else {
                Vec::new()
            }
        }
    }

    struct PanickingTask;

    impl Task for PanickingTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            panic!("worker failure");
        }
    }

    #[test]
    fn overflow_is_queued_and_drained() {
        let mut world = empty_world();
        let mut task_manager = TaskManager::new(2);

        for x in 0..6 {
            task_manager.publish_task(Box::new(AddChunkTask { x: x * 10, last: x * 10 }));
        }
        assert!(task_manager.tasks_in_flight() <= 2 * MAX_TASKS_IN_FLIGHT);
        assert!(task_manager.queued_tasks() >= 4);

        assert_eq!(task_manager.wait_for_all(&mut world).unwrap(), 6);
        assert!(task_manager.is_idle());
        assert_eq!(world.len(), 6);
    }

    #[test]
    fn follow_up_tasks_are_run() {
        let mut world = empty_world();
        let mut task_manager = TaskManager::new(3);

        task_manager.publish_task(Box::new(AddChunkTask { x: 0, last: 4 }));
        assert_eq!(task_manager.wait_for_all(&mut world).unwrap(), 5);
        for x in 0..=4 {
            assert!(world.has_chunk_at(Point3::new(x, 0, 0)));
        }
    }

    #[test]
    fn zero_workers_still_runs_tasks() {
        let mut world = empty_world();
        let mut task_manager = TaskManager::new(0);
        assert_eq!(task_manager.num_workers(), 1);

        task_manager.publish_task(Box::new(AddChunkTask { x: 0, last: 1 }));
        assert_eq!(task_manager.wait_for_all(&mut world).unwrap(), 2);
    }

    #[test]
    fn dead_worker_is_reported() {
        let mut world = empty_world();
        let mut task_manager = TaskManager::new(1);

        task_manager.publish_task(Box::new(PanickingTask));
        let result = task_manager.wait_for_all(&mut world);
        assert!(matches!(result, Err(TerrainError::WorkerDisconnected(0))));
    }
}
