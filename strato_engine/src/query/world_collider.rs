use glam::Vec3;
use super::collision::WorldCollision;
use super::requester::{PointCollisionRequester, SphereCollisionRequester};

// Share of the penetration depth corrected in one response
const GROUND_LEVEL_RATIO: f32 = 0.5;
const VELOCITY_RATIO: f32 = 1.0 - GROUND_LEVEL_RATIO;

/// Rigid collider probed by the point or sphere collision pipeline.
///
/// Registered as a point collider, only `position` and `velocity` are
/// sent; as a sphere collider, `radius` too. When enabled, every delivered
/// collision also moves the collider out of the terrain and bounces it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldCollider {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    /// Fraction of velocity kept when bouncing off a moving body
    pub bounciness: f32,
    /// Vertical gravity (negative points down)
    pub gravity: f32,
    pub enabled: bool,
    last_collision: Option<WorldCollision>,
    collision_count: u64,
}

impl WorldCollider {
    pub fn new(position: Vec3, velocity: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
            bounciness: 0.5,
            gravity: -9.81,
            enabled: true,
            last_collision: None,
            collision_count: 0,
        }
    }

    /// Most recent collision delivered, if any
    pub fn last_collision(&self) -> Option<&WorldCollision> {
        self.last_collision.as_ref()
    }

    /// Number of collisions delivered since creation or the last clear
    pub fn collision_count(&self) -> u64 {
        self.collision_count
    }

    pub fn clear_collisions(&mut self) {
        self.last_collision = None;
        self.collision_count = 0;
    }

    fn respond(&mut self, collision: &WorldCollision) {
        let start_velocity = self.velocity;
        let mut response = Vec3::ZERO;

        if collision.dynamic_collision() {
            let normal = collision.dynamic_normal;
            response = (start_velocity - 2.0 * start_velocity.dot(normal) * normal) * self.bounciness;
        }

        if collision.static_collision() {
            self.position.y -= collision.static_height * GROUND_LEVEL_RATIO;

            let escape_speed = (self.gravity * collision.static_height).max(0.0).sqrt();
            if collision.dynamic_collision() {
                response.y = response.y.max(escape_speed);
            } else {
                response.x = start_velocity.x + collision.static_normal.x * escape_speed;
                response.z = start_velocity.z + collision.static_normal.z * escape_speed;
                response.y = start_velocity.y.max(escape_speed * VELOCITY_RATIO);
            }
        }

        self.velocity = response;
    }
}

impl PointCollisionRequester for WorldCollider {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn on_world_collision(&mut self, collision: &WorldCollision) {
        self.last_collision = Some(*collision);
        self.collision_count += 1;
        if self.enabled && collision.is_collision() {
            self.respond(collision);
        }
    }
}

impl SphereCollisionRequester for WorldCollider {
    fn radius(&self) -> f32 {
        self.radius
    }
}

#[cfg(test)]
#[path = "world_collider_tests.rs"]
mod tests;
