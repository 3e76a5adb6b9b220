/// CpuComputeDevice - CPU implementation of the ComputeDevice trait
///
/// Kernels run synchronously at submission; the result is then held back
/// for a configurable number of polls to mimic an asynchronous GPU
/// read-back.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use strato_engine::glam::Vec3;
use strato_engine::strato::{Error, QueryUniforms, Result};
use strato_engine::strato::query::{
    ComputeDevice, DeviceBufferKey, PointWorldTest, QueryKind, ReadbackHandle, ReadbackStatus,
    SphereWorldTest, TerrainHeightLocation,
};
use strato_engine::{engine_debug, engine_error, engine_trace};
use crate::height_field::HeightField;
use crate::kernels::{self, DynamicBody, KernelContext};
use crate::stats::DeviceStats;

/// Input/output buffer pair for one query kind and batch size
struct QueryBuffers {
    kind: QueryKind,
    count: usize,
    input: Vec<f32>,
    output: Vec<f32>,
}

struct PendingReadback {
    polls_left: u32,
    result: std::result::Result<Vec<f32>, String>,
}

/// Compute device running the query kernels on the CPU
pub struct CpuComputeDevice {
    height_field: Box<dyn HeightField>,
    bodies: Vec<DynamicBody>,
    buffers: SlotMap<DeviceBufferKey, QueryBuffers>,
    readbacks: FxHashMap<u64, PendingReadback>,
    /// Polls needed before a read-back reports its result
    latency: u32,
    fail_next_readback: bool,
    next_readback_id: u64,
    stats: DeviceStats,
}

impl CpuComputeDevice {
    /// Create a device sampling `height_field`
    ///
    /// Read-backs complete on the first poll after submission.
    pub fn new(height_field: impl HeightField + 'static) -> Self {
        Self {
            height_field: Box::new(height_field),
            bodies: Vec::new(),
            buffers: SlotMap::with_key(),
            readbacks: FxHashMap::default(),
            latency: 1,
            fail_next_readback: false,
            next_readback_id: 0,
            stats: DeviceStats::default(),
        }
    }

    /// Hold every read-back for `polls` polls (0 behaves like 1)
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = polls.max(1);
        self
    }

    pub fn latency(&self) -> u32 {
        self.latency
    }

    /// Add a moving body for the dynamic collision test
    pub fn add_dynamic_body(&mut self, center: Vec3, radius: f32) -> usize {
        self.bodies.push(DynamicBody::new(center, radius));
        self.bodies.len() - 1
    }

    /// Move a body added with [`Self::add_dynamic_body`]. Returns false if unknown.
    pub fn set_dynamic_body_center(&mut self, index: usize, center: Vec3) -> bool {
        match self.bodies.get_mut(index) {
            Some(body) => {
                body.center = center;
                true
            }
            None => false,
        }
    }

    pub fn clear_dynamic_bodies(&mut self) {
        self.bodies.clear();
    }

    pub fn dynamic_bodies(&self) -> &[DynamicBody] {
        &self.bodies
    }

    /// Make the next submitted read-back report an error
    pub fn fail_next_readback(&mut self) {
        self.fail_next_readback = true;
    }

    /// Live buffer pairs
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Read-backs not yet polled to completion
    pub fn pending_count(&self) -> usize {
        self.readbacks.len()
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }
}

/// Zero-filled buffer of `count * stride` floats, `None` if it cannot be allocated
fn zeroed_buffer(count: usize, stride: usize) -> Option<Vec<f32>> {
    let len = count.checked_mul(stride)?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).ok()?;
    buffer.resize(len, 0.0);
    Some(buffer)
}

fn run_kernel(ctx: &KernelContext, buffers: &mut QueryBuffers) {
    match buffers.kind {
        QueryKind::TerrainHeight => {
            let inputs: &[TerrainHeightLocation] = bytemuck::cast_slice(&buffers.input);
            for (output, input) in buffers.output.iter_mut().zip(inputs) {
                *output = kernels::terrain_height(ctx, input);
            }
        }
        QueryKind::PointCollision => {
            let inputs: &[PointWorldTest] = bytemuck::cast_slice(&buffers.input);
            let stride = QueryKind::PointCollision.output_stride();
            for (output, input) in buffers.output.chunks_exact_mut(stride).zip(inputs) {
                let record = kernels::point_world_test(ctx, input);
                output.copy_from_slice(bytemuck::cast_slice(std::slice::from_ref(&record)));
            }
        }
        QueryKind::SphereCollision => {
            let inputs: &[SphereWorldTest] = bytemuck::cast_slice(&buffers.input);
            let stride = QueryKind::SphereCollision.output_stride();
            for (output, input) in buffers.output.chunks_exact_mut(stride).zip(inputs) {
                let record = kernels::sphere_world_test(ctx, input);
                output.copy_from_slice(bytemuck::cast_slice(std::slice::from_ref(&record)));
            }
        }
    }
}

impl ComputeDevice for CpuComputeDevice {
    fn create_query_buffers(&mut self, kind: QueryKind, count: usize) -> Result<DeviceBufferKey> {
        let (Some(input), Some(output)) = (
            zeroed_buffer(count, kind.input_stride()),
            zeroed_buffer(count, kind.output_stride()),
        ) else {
            engine_error!("strato::cpu", "{}: cannot allocate buffers for {} records", kind.name(), count);
            return Err(Error::OutOfMemory);
        };
        let buffers = QueryBuffers { kind, count, input, output };
        let key = self.buffers.insert(buffers);
        self.stats.buffers_created += 1;

        engine_debug!("strato::cpu", "{}: buffers created for {} records", kind.name(), count);
        Ok(key)
    }

    fn destroy_query_buffers(&mut self, key: DeviceBufferKey) {
        if self.buffers.remove(key).is_some() {
            self.stats.buffers_destroyed += 1;
        }
    }

    fn submit(
        &mut self,
        kind: QueryKind,
        buffers: DeviceBufferKey,
        input: &[u8],
        uniforms: &QueryUniforms,
        dispatch_size: u32,
    ) -> Result<ReadbackHandle> {
        let Some(target) = self.buffers.get_mut(buffers) else {
            engine_error!("strato::cpu", "{}: unknown buffers {:?}", kind.name(), buffers);
            return Err(Error::InvalidResource(format!("Unknown query buffers {:?}", buffers)));
        };

        if target.kind != kind {
            let message = format!("Buffers were created for {}, not {}", target.kind.name(), kind.name());
            engine_error!("strato::cpu", "{}", message);
            return Err(Error::InvalidResource(message));
        }
        let expected = target.input.len() * std::mem::size_of::<f32>();
        if input.len() != expected {
            let message = format!("{}: input holds {} bytes, buffers expect {}",
                kind.name(), input.len(), expected);
            engine_error!("strato::cpu", "{}", message);
            return Err(Error::InvalidResource(message));
        }

        target.input = bytemuck::pod_collect_to_vec(input);
        let ctx = KernelContext {
            height_field: &*self.height_field,
            bodies: &self.bodies,
            uniforms,
        };
        run_kernel(&ctx, target);
        let output = target.output.clone();
        let count = target.count;

        let handle = ReadbackHandle::new(self.next_readback_id, kind);
        self.next_readback_id += 1;

        let result = if std::mem::take(&mut self.fail_next_readback) {
            Err("injected read-back failure".to_string())
        } else {
            Ok(output)
        };
        self.readbacks.insert(handle.id(), PendingReadback { polls_left: self.latency, result });

        self.stats.submissions += 1;
        self.stats.records_processed += count as u64;

        engine_trace!("strato::cpu", "{}: {} records in {} groups (read-back {})",
            kind.name(), count, dispatch_size, handle.id());
        Ok(handle)
    }

    fn poll(&mut self, handle: &ReadbackHandle) -> ReadbackStatus {
        let Some(readback) = self.readbacks.get_mut(&handle.id()) else {
            return ReadbackStatus::Error(format!("Unknown read-back {}", handle.id()));
        };

        if readback.polls_left > 1 {
            readback.polls_left -= 1;
            return ReadbackStatus::Pending;
        }

        match self.readbacks.remove(&handle.id()).map(|readback| readback.result) {
            Some(Ok(data)) => {
                self.stats.readbacks_completed += 1;
                ReadbackStatus::Done(data)
            }
            Some(Err(message)) => {
                self.stats.readbacks_failed += 1;
                ReadbackStatus::Error(message)
            }
            None => ReadbackStatus::Error(format!("Unknown read-back {}", handle.id())),
        }
    }

    fn discard(&mut self, handle: &ReadbackHandle) {
        if self.readbacks.remove(&handle.id()).is_some() {
            self.stats.readbacks_discarded += 1;
        }
    }
}

#[cfg(test)]
#[path = "cpu_device_tests.rs"]
mod tests;
