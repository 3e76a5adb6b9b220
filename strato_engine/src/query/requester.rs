/// Callbacks implemented by objects registered with the query pipelines.
///
/// Requesters are shared as `Arc<Mutex<dyn ...>>`: the pipeline reads the
/// probe input when it snapshots a batch and calls back when results arrive.

use glam::{Vec2, Vec3};
use super::collision::WorldCollision;

/// Terrain height probe
pub trait TerrainHeightRequester: Send {
    /// Horizontal (x, z) location to sample in the next batch
    fn requested_location(&self) -> Vec2;

    /// Height measured at `location` (the location that was dispatched)
    fn record_sample(&mut self, location: Vec2, height: f32);
}

/// Point collision probe
pub trait PointCollisionRequester: Send {
    fn position(&self) -> Vec3;

    /// Current velocity; also used to judge closing contacts on delivery
    fn velocity(&self) -> Vec3;

    /// Called only when the decoded record reports a contact
    fn on_world_collision(&mut self, collision: &WorldCollision);
}

/// Sphere collision probe
pub trait SphereCollisionRequester: PointCollisionRequester {
    fn radius(&self) -> f32;
}
