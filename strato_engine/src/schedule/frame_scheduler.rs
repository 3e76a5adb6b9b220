/// Owner of the execution pools advanced once per frame.
///
/// The scheduler is handed the pools it is responsible for; there is no
/// process-wide pool list.

use super::ExecutionPool;

pub struct FrameScheduler {
    pools: Vec<ExecutionPool>,
    frame: u64,
}

impl FrameScheduler {
    /// Create a scheduler advancing `pools`
    pub fn new(pools: Vec<ExecutionPool>) -> Self {
        Self { pools, frame: 0 }
    }

    /// Take over another pool. Adding the same pool twice is ignored.
    pub fn add_pool(&mut self, pool: ExecutionPool) {
        if self.pools.iter().any(|p| p.ptr_eq(&pool)) {
            crate::engine_warn!("strato::FrameScheduler", "Pool already scheduled");
            return;
        }
        self.pools.push(pool);
    }

    /// Number of pools advanced per frame
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Frames advanced so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance every owned pool's admission window once
    pub fn advance_frame(&mut self) {
        for pool in &self.pools {
            pool.advance_frame();
        }
        self.frame += 1;
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
#[path = "frame_scheduler_tests.rs"]
mod tests;
