/// CPU versions of the query compute kernels.
///
/// Each kernel maps one input record to one output record; the device runs
/// them over a whole batch at submission time.

use strato_engine::glam::{Vec2, Vec3};
use strato_engine::strato::QueryUniforms;
use strato_engine::strato::query::{PointWorldTest, SphereWorldTest, TerrainHeightLocation, WorldCollisionRecord};
use crate::height_field::HeightField;

/// Moving body the dynamic collision test is run against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicBody {
    pub center: Vec3,
    pub radius: f32,
}

impl DynamicBody {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Everything a kernel reads besides its input record
pub struct KernelContext<'a> {
    pub height_field: &'a dyn HeightField,
    pub bodies: &'a [DynamicBody],
    pub uniforms: &'a QueryUniforms,
}

impl KernelContext<'_> {
    fn terrain_height(&self, location: Vec2) -> f32 {
        self.height_field.height(location) * self.uniforms.terrain_height_adjustment
    }

    fn terrain_normal(&self, location: Vec2) -> Vec3 {
        let e = self.uniforms.terrain_collision_step_delta * 0.5;
        let left = self.terrain_height(location - Vec2::new(e, 0.0));
        let right = self.terrain_height(location + Vec2::new(e, 0.0));
        let back = self.terrain_height(location - Vec2::new(0.0, e));
        let front = self.terrain_height(location + Vec2::new(0.0, e));
        Vec3::new(left - right, 2.0 * e, back - front).normalize_or(Vec3::Y)
    }

    /// Maximum distance covered by one collision test
    fn reach(&self) -> f32 {
        self.uniforms.terrain_collision_max_steps.saturating_sub(1) as f32
            * self.uniforms.terrain_collision_step_delta
    }
}

pub fn terrain_height(ctx: &KernelContext, input: &TerrainHeightLocation) -> f32 {
    ctx.terrain_height(input.location)
}

pub fn point_world_test(ctx: &KernelContext, input: &PointWorldTest) -> WorldCollisionRecord {
    world_test(ctx, input.position, input.velocity, 0.0)
}

pub fn sphere_world_test(ctx: &KernelContext, input: &SphereWorldTest) -> WorldCollisionRecord {
    world_test(ctx, input.position, input.velocity, input.radius)
}

fn world_test(ctx: &KernelContext, position: Vec3, velocity: Vec3, radius: f32) -> WorldCollisionRecord {
    let mut record = WorldCollisionRecord::miss();
    static_test(ctx, position, velocity, radius, &mut record);
    dynamic_test(ctx, position, velocity, radius, &mut record);
    record
}

// March along the velocity; the first sample below the terrain wins.
// Without penetration the record keeps the height above terrain at the start.
fn static_test(ctx: &KernelContext, position: Vec3, velocity: Vec3, radius: f32, record: &mut WorldCollisionRecord) {
    let direction = velocity.normalize_or_zero();
    let steps = if direction == Vec3::ZERO { 1 } else { ctx.uniforms.terrain_collision_max_steps };

    for step in 0..steps {
        let sample = position + direction * (step as f32 * ctx.uniforms.terrain_collision_step_delta);
        let location = Vec2::new(sample.x, sample.z);
        let ground = ctx.terrain_height(location);
        let height = sample.y - radius - ground;

        if step == 0 || height < 0.0 {
            record.static_position = Vec3::new(sample.x, ground, sample.z);
            record.static_height = height;
            record.static_normal = ctx.terrain_normal(location);
        }
        if height < 0.0 {
            return;
        }
    }
}

// Ray-cast against bodies inflated by the probe radius; nearest hit wins
fn dynamic_test(ctx: &KernelContext, position: Vec3, velocity: Vec3, radius: f32, record: &mut WorldCollisionRecord) {
    let direction = velocity.normalize_or_zero();
    let reach = ctx.reach();

    for body in ctx.bodies {
        let inflated = body.radius + radius;
        let offset = position - body.center;

        let distance = if offset.length_squared() <= inflated * inflated {
            Some(0.0)
        } else if direction == Vec3::ZERO {
            None
        } else {
            let b = offset.dot(direction);
            let discriminant = b * b - (offset.length_squared() - inflated * inflated);
            if b > 0.0 || discriminant < 0.0 {
                None
            } else {
                Some(-b - discriminant.sqrt())
            }
        };

        let Some(distance) = distance else { continue };
        if distance > reach || distance >= record.dynamic_distance {
            continue;
        }

        let hit = position + direction * distance;
        let normal = (hit - body.center).normalize_or(Vec3::Y);
        record.dynamic_position = body.center + normal * body.radius;
        record.dynamic_distance = distance;
        record.dynamic_normal = normal;
    }
}

#[cfg(test)]
#[path = "kernels_tests.rs"]
mod tests;
