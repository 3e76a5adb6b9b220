/// Compute device capability used by the query pipelines.
///
/// A device owns fixed-stride input/output buffer pairs, runs one kernel
/// per [`QueryKind`], and exposes the result through a non-blocking
/// read-back that is polled on later frames. Implemented by backend crates
/// (e.g. `strato_engine_device_cpu`).

use slotmap::new_key_type;
use crate::config::QueryUniforms;
use crate::error::Result;
use super::records::{
    TerrainHeightLocation, PointWorldTest, SphereWorldTest, WorldCollisionRecord,
    TERRAIN_HEIGHT_ELEMENT_SIZE,
};

new_key_type! {
    /// Key of an input/output buffer pair owned by a compute device
    pub struct DeviceBufferKey;
}

/// The three batched query kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    TerrainHeight,
    PointCollision,
    SphereCollision,
}

impl QueryKind {
    pub const ALL: [QueryKind; 3] = [
        QueryKind::TerrainHeight,
        QueryKind::PointCollision,
        QueryKind::SphereCollision,
    ];

    /// Input record size in f32
    pub fn input_stride(&self) -> usize {
        match self {
            QueryKind::TerrainHeight => TerrainHeightLocation::ELEMENT_SIZE,
            QueryKind::PointCollision => PointWorldTest::ELEMENT_SIZE,
            QueryKind::SphereCollision => SphereWorldTest::ELEMENT_SIZE,
        }
    }

    /// Output record size in f32
    pub fn output_stride(&self) -> usize {
        match self {
            QueryKind::TerrainHeight => TERRAIN_HEIGHT_ELEMENT_SIZE,
            QueryKind::PointCollision | QueryKind::SphereCollision => {
                WorldCollisionRecord::ELEMENT_SIZE
            }
        }
    }

    /// Kernel name, as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            QueryKind::TerrainHeight => "ComputeTerrainHeights",
            QueryKind::PointCollision => "ComputePointCollisions",
            QueryKind::SphereCollision => "ComputeSphereCollisions",
        }
    }
}

/// Token for one outstanding read-back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadbackHandle {
    id: u64,
    kind: QueryKind,
}

impl ReadbackHandle {
    /// Built by devices; `id` must be unique per device
    pub fn new(id: u64, kind: QueryKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }
}

/// Result of polling a read-back
#[derive(Debug, Clone, PartialEq)]
pub enum ReadbackStatus {
    /// Not complete yet; poll again next frame
    Pending,
    /// Complete; flat output buffer of `count * output_stride` floats
    Done(Vec<f32>),
    /// The device reported a failure; the results are lost
    Error(String),
}

/// Compute backend trait
///
/// All calls are non-blocking. A handle returned by `submit` is polled
/// until it reports `Done` or `Error`, after which it is no longer valid.
pub trait ComputeDevice: Send {
    /// Allocate an input/output buffer pair sized for `count` records
    fn create_query_buffers(&mut self, kind: QueryKind, count: usize) -> Result<DeviceBufferKey>;

    /// Release a buffer pair. Unknown keys are ignored.
    fn destroy_query_buffers(&mut self, key: DeviceBufferKey);

    /// Upload `input`, dispatch the kernel and request a read-back of the output
    ///
    /// # Arguments
    ///
    /// * `kind` - Kernel to run
    /// * `buffers` - Buffer pair created for this kind and batch size
    /// * `input` - Raw input records (`count * input_stride` floats)
    /// * `uniforms` - Kernel constants
    /// * `dispatch_size` - Number of thread groups
    fn submit(
        &mut self,
        kind: QueryKind,
        buffers: DeviceBufferKey,
        input: &[u8],
        uniforms: &QueryUniforms,
        dispatch_size: u32,
    ) -> Result<ReadbackHandle>;

    /// Check a read-back without blocking
    fn poll(&mut self, handle: &ReadbackHandle) -> ReadbackStatus;

    /// Forget a read-back the caller gave up on
    fn discard(&mut self, _handle: &ReadbackHandle) {}
}

/// Thread groups needed to cover `count` records
pub fn dispatch_size(count: usize, thread_group_size: u32) -> u32 {
    let group = thread_group_size.max(1) as usize;
    count.div_ceil(group) as u32
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
