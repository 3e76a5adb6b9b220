/// World-level batched queries: terrain heights, point and sphere collisions.
///
/// `WorldQueries` shares a compute device with the rest of the engine and
/// drives one [`QueryPipeline`] per query kind. Call [`WorldQueries::fixed_update`]
/// once per physics step.

use std::sync::{Arc, Mutex, MutexGuard};
use crate::config::QueryConfig;
use crate::{engine_err, engine_warn};
use crate::error::{Error, Result};
use crate::schedule::FrameScheduler;
use super::batch_query::{TerrainHeightQuery, PointCollisionQuery, SphereCollisionQuery};
use super::device::{ComputeDevice, QueryKind};
use super::pipeline::{PerformReport, QueryKey, QueryPipeline};
use super::requester::{TerrainHeightRequester, PointCollisionRequester, SphereCollisionRequester};

/// Per-kind reports of one fixed step
///
/// A kind that failed keeps a default report and appears in `failures`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedUpdateReport {
    pub frame: u64,
    pub terrain_heights: PerformReport,
    pub point_collisions: PerformReport,
    pub sphere_collisions: PerformReport,
    pub failures: Vec<(QueryKind, Error)>,
}

impl FixedUpdateReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, kind: QueryKind, result: Result<PerformReport>) {
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                engine_warn!("strato::WorldQueries",
                    "{} skipped on frame {}: {}", kind.name(), self.frame, err);
                self.failures.push((kind, err));
                return;
            }
        };
        match kind {
            QueryKind::TerrainHeight => self.terrain_heights = report,
            QueryKind::PointCollision => self.point_collisions = report,
            QueryKind::SphereCollision => self.sphere_collisions = report,
        }
    }
}

pub struct WorldQueries {
    /// Compute device shared with the rest of the engine
    device: Arc<Mutex<dyn ComputeDevice>>,
    config: QueryConfig,
    /// Execution pools advanced at the start of every fixed step
    scheduler: FrameScheduler,
    terrain_heights: QueryPipeline<TerrainHeightQuery>,
    point_collisions: QueryPipeline<PointCollisionQuery>,
    sphere_collisions: QueryPipeline<SphereCollisionQuery>,
}

impl WorldQueries {
    /// Create world queries on `device`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `config` does not validate.
    pub fn new(device: Arc<Mutex<dyn ComputeDevice>>, config: QueryConfig) -> Result<Self> {
        config.validate()?;

        crate::engine_info!("strato::WorldQueries",
            "Created (thread group size {}, {} collision steps)",
            config.thread_group_size, config.terrain_collision_max_steps);

        Ok(Self {
            device,
            config,
            scheduler: FrameScheduler::default(),
            terrain_heights: QueryPipeline::new(),
            point_collisions: QueryPipeline::new(),
            sphere_collisions: QueryPipeline::new(),
        })
    }

    /// Replace the frame scheduler (builder style)
    pub fn with_scheduler(mut self, scheduler: FrameScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn device(&self) -> Arc<Mutex<dyn ComputeDevice>> {
        Arc::clone(&self.device)
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut FrameScheduler {
        &mut self.scheduler
    }

    // ===== REQUESTERS =====

    pub fn add_terrain_height_sampler(
        &mut self,
        sampler: Arc<Mutex<dyn TerrainHeightRequester>>,
    ) -> QueryKey {
        self.terrain_heights.add(sampler)
    }

    pub fn remove_terrain_height_sampler(&mut self, key: QueryKey) -> bool {
        self.terrain_heights.remove(key)
    }

    pub fn terrain_height_sampler_count(&self) -> usize {
        self.terrain_heights.len()
    }

    pub fn add_point_collider(&mut self, collider: Arc<Mutex<dyn PointCollisionRequester>>) -> QueryKey {
        self.point_collisions.add(collider)
    }

    pub fn remove_point_collider(&mut self, key: QueryKey) -> bool {
        self.point_collisions.remove(key)
    }

    pub fn point_collider_count(&self) -> usize {
        self.point_collisions.len()
    }

    pub fn add_sphere_collider(&mut self, collider: Arc<Mutex<dyn SphereCollisionRequester>>) -> QueryKey {
        self.sphere_collisions.add(collider)
    }

    pub fn remove_sphere_collider(&mut self, key: QueryKey) -> bool {
        self.sphere_collisions.remove(key)
    }

    pub fn sphere_collider_count(&self) -> usize {
        self.sphere_collisions.len()
    }

    // ===== PERFORM =====

    pub fn perform_terrain_height_samples(&mut self, frame: u64) -> Result<PerformReport> {
        let mut device = lock_device(&self.device)?;
        self.terrain_heights.perform(&mut *device, frame, &self.config)
    }

    pub fn perform_point_collisions(&mut self, frame: u64) -> Result<PerformReport> {
        let mut device = lock_device(&self.device)?;
        self.point_collisions.perform(&mut *device, frame, &self.config)
    }

    pub fn perform_sphere_collisions(&mut self, frame: u64) -> Result<PerformReport> {
        let mut device = lock_device(&self.device)?;
        self.sphere_collisions.perform(&mut *device, frame, &self.config)
    }

    /// Run one physics step.
    ///
    /// Advances the execution pools, then performs terrain heights, point
    /// collisions and sphere collisions in that order. Every kind runs each
    /// step; a device error in one kind is reported without holding back
    /// the others.
    pub fn fixed_update(&mut self) -> FixedUpdateReport {
        self.scheduler.advance_frame();
        let frame = self.scheduler.frame();
        let mut report = FixedUpdateReport { frame, ..Default::default() };

        let terrain = self.perform_terrain_height_samples(frame);
        report.record(QueryKind::TerrainHeight, terrain);
        let points = self.perform_point_collisions(frame);
        report.record(QueryKind::PointCollision, points);
        let spheres = self.perform_sphere_collisions(frame);
        report.record(QueryKind::SphereCollision, spheres);

        report
    }

    /// Free every device buffer and abandon in-flight batches.
    ///
    /// Requesters stay registered; the next step reallocates.
    pub fn release(&mut self) {
        let mut device = match self.device.lock() {
            Ok(device) => device,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.terrain_heights.release(&mut *device);
        self.point_collisions.release(&mut *device);
        self.sphere_collisions.release(&mut *device);
    }
}

impl Drop for WorldQueries {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock_device<'a>(
    device: &'a Mutex<dyn ComputeDevice + 'static>,
) -> Result<MutexGuard<'a, dyn ComputeDevice + 'static>> {
    device.lock().map_err(|_| engine_err!("strato::WorldQueries", "Compute device lock poisoned"))
}

#[cfg(test)]
#[path = "world_queries_tests.rs"]
mod tests;
