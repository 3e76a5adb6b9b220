//! Query pipeline configuration
//!
//! Constants shared between the host and the compute kernels, plus the
//! pending read-back policy.

use crate::error::{Error, Result};

/// Configuration for [`crate::query::WorldQueries`]
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Threads per compute group; dispatch size is `ceil(count / thread_group_size)`
    pub thread_group_size: u32,

    /// Number of samples marched along the velocity for static collisions
    pub terrain_collision_max_steps: u32,

    /// Distance between two static collision samples
    pub terrain_collision_step_delta: f32,

    /// Scale applied to sampled terrain heights
    pub terrain_height_adjustment: f32,

    /// Frames a read-back may stay pending before the batch is dropped.
    ///
    /// `None` waits forever.
    pub max_pending_frames: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            thread_group_size: 32,
            terrain_collision_max_steps: 8,
            terrain_collision_step_delta: 1.0,
            terrain_height_adjustment: 1.0,
            max_pending_frames: None,
        }
    }
}

impl QueryConfig {
    /// Check the configuration before handing it to a pipeline
    pub fn validate(&self) -> Result<()> {
        if self.thread_group_size == 0 {
            return Err(Error::InvalidConfig("thread_group_size must be > 0".to_string()));
        }
        if self.terrain_collision_max_steps == 0 {
            return Err(Error::InvalidConfig(
                "terrain_collision_max_steps must be > 0".to_string(),
            ));
        }
        if !self.terrain_collision_step_delta.is_finite() || self.terrain_collision_step_delta <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "terrain_collision_step_delta must be finite and > 0 (got {})",
                self.terrain_collision_step_delta
            )));
        }
        if !self.terrain_height_adjustment.is_finite() {
            return Err(Error::InvalidConfig(
                "terrain_height_adjustment must be finite".to_string(),
            ));
        }
        if self.max_pending_frames == Some(0) {
            return Err(Error::InvalidConfig(
                "max_pending_frames must be None or > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-dispatch constants uploaded with every submission
    pub fn uniforms(&self) -> QueryUniforms {
        QueryUniforms {
            terrain_collision_max_steps: self.terrain_collision_max_steps,
            terrain_collision_step_delta: self.terrain_collision_step_delta,
            terrain_height_adjustment: self.terrain_height_adjustment,
        }
    }
}

/// Kernel constants passed to [`crate::query::ComputeDevice::submit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryUniforms {
    pub terrain_collision_max_steps: u32,
    pub terrain_collision_step_delta: f32,
    pub terrain_height_adjustment: f32,
}

impl Default for QueryUniforms {
    fn default() -> Self {
        QueryConfig::default().uniforms()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
