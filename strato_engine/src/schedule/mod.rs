/// Frame-throttled execution: admission pools and the scheduler advancing them

pub mod execution_pool;
pub mod frame_scheduler;

pub use execution_pool::{ExecutionPool, Registration};
pub use frame_scheduler::FrameScheduler;
