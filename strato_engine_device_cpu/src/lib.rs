/*!
# Strato Engine - CPU Compute Backend

CPU implementation of the strato_engine [`ComputeDevice`] trait.

Kernels run on the calling thread when a batch is submitted; results are
held back for a configurable number of polls so the engine's asynchronous
read-back path is exercised exactly as with a GPU backend. Useful for
headless servers, tools and tests.

[`ComputeDevice`]: strato_engine::strato::query::ComputeDevice
*/

mod cpu_device;
mod height_field;
mod kernels;
mod stats;

pub use cpu_device::CpuComputeDevice;
pub use height_field::{HeightField, FlatTerrain, HeightMap};
pub use kernels::DynamicBody;

// Re-export stats utilities
pub use stats::{DeviceStats, print_device_stats_report};
