/*!
# Strato Engine

Frame-throttled scheduling and batched asynchronous world queries.

The crate is backend-agnostic: compute work goes through the
[`ComputeDevice`](strato::query::ComputeDevice) trait, implemented by a
backend crate (`strato_engine_device_cpu`) or by a test mock.

## Architecture

- **ExecutionPool / FrameScheduler**: admit a bounded number of registered
  agents per frame, round-robin
- **ObjectPool**: fixed-capacity set of reusable entities
- **QueryPipeline**: per-kind registry plus dispatch / completion state
  machine with at most one batch in flight
- **WorldQueries**: terrain height, point collision and sphere collision
  pipelines driven once per fixed step
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod utils;
pub mod schedule;
pub mod pool;
pub mod query;

// Main strato namespace module
pub mod strato {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger host
    pub use crate::engine::Engine;

    // Query configuration
    pub use crate::config::{QueryConfig, QueryUniforms};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod schedule {
        pub use crate::schedule::*;
    }

    pub mod pool {
        pub use crate::pool::*;
    }

    pub mod query {
        pub use crate::query::*;
    }
}

// Re-export math library at crate root
pub use glam;
