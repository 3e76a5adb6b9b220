/// Batched asynchronous query pipeline.
///
/// One pipeline per query kind. Requesters register once and stay in the
/// registry until removed. Each fixed step, [`QueryPipeline::perform`]:
///
/// 1. Skips everything if a batch was already dispatched this frame, so a
///    request and its completion are never observed in the same frame.
/// 2. Polls the in-flight read-back, if any:
///    - `Pending`: waits (or drops the batch once `max_pending_frames` is exceeded),
///    - `Done`: delivers record `i` to snapshot requester `i`,
///    - `Error`: drops the batch and frees its device buffers, so the next
///      dispatch reallocates them.
/// 3. With nothing in flight and a non-empty registry, snapshots the
///    registry, reallocates device buffers only if the batch size changed,
///    uploads the inputs, dispatches and requests a read-back.
///
/// At most one batch is in flight per pipeline. The snapshot is a copy:
/// requesters added or removed while a batch is in flight are only seen by
/// the next batch, and a removed requester still receives the results of
/// the batch it was part of.

use std::sync::{Arc, Mutex, MutexGuard};
use slotmap::{new_key_type, SlotMap};
use crate::config::QueryConfig;
use crate::error::Result;
use super::batch_query::{BatchQuery, Delivery};
use super::device::{dispatch_size, ComputeDevice, DeviceBufferKey, ReadbackHandle, ReadbackStatus};

new_key_type! {
    /// Stable key of a registered requester
    pub struct QueryKey;
}

/// What one call to [`QueryPipeline::perform`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformReport {
    /// Output records decoded from a completed batch
    pub completed: usize,
    /// Requester callbacks invoked
    pub delivered: usize,
    /// Size of the batch dispatched this call (0 if none)
    pub dispatched: usize,
    /// Size of the batch dropped after an error or timeout (0 if none)
    pub dropped: usize,
}

struct InFlightBatch<Q: BatchQuery> {
    requesters: Vec<Arc<Mutex<Q::Requester>>>,
    inputs: Vec<Q::Input>,
    handle: ReadbackHandle,
    frame: u64,
}

/// Registry plus dispatch/completion state machine for one query kind
pub struct QueryPipeline<Q: BatchQuery> {
    registry: SlotMap<QueryKey, Arc<Mutex<Q::Requester>>>,
    in_flight: Option<InFlightBatch<Q>>,
    buffers: Option<DeviceBufferKey>,
    last_count: usize,
    request_frame: Option<u64>,
}

fn lock<R: ?Sized>(requester: &Mutex<R>) -> MutexGuard<'_, R> {
    requester.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<Q: BatchQuery> QueryPipeline<Q> {
    /// Create an idle pipeline with an empty registry
    pub fn new() -> Self {
        Self {
            registry: SlotMap::with_key(),
            in_flight: None,
            buffers: None,
            last_count: 0,
            request_frame: None,
        }
    }

    /// Register a requester for every following batch
    pub fn add(&mut self, requester: Arc<Mutex<Q::Requester>>) -> QueryKey {
        self.registry.insert(requester)
    }

    /// Unregister a requester. Returns false if the key is unknown.
    pub fn remove(&mut self, key: QueryKey) -> bool {
        self.registry.remove(key).is_some()
    }

    /// Whether `key` is registered
    pub fn contains(&self, key: QueryKey) -> bool {
        self.registry.contains_key(key)
    }

    /// Number of registered requesters
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Whether a batch is waiting for its read-back
    pub fn is_dispatched(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Size of the in-flight batch (0 when idle)
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.as_ref().map_or(0, |batch| batch.requesters.len())
    }

    /// Batch size the current device buffers were allocated for
    pub fn buffer_len(&self) -> usize {
        self.last_count
    }

    /// Run one fixed step of the state machine
    ///
    /// # Errors
    ///
    /// Returns an error if the device fails to allocate buffers or to accept
    /// the submission. Read-back errors are recovered and never returned.
    pub fn perform(
        &mut self,
        device: &mut dyn ComputeDevice,
        frame: u64,
        config: &QueryConfig,
    ) -> Result<PerformReport> {
        let mut report = PerformReport::default();

        if self.request_frame == Some(frame) {
            return Ok(report);
        }

        self.handle_completion(device, frame, config, &mut report);

        if self.in_flight.is_none() && !self.registry.is_empty() {
            report.dispatched = self.dispatch(device, frame, config)?;
        }

        Ok(report)
    }

    /// Free device buffers and abandon the in-flight batch, if any
    pub fn release(&mut self, device: &mut dyn ComputeDevice) {
        if let Some(batch) = self.in_flight.take() {
            device.discard(&batch.handle);
        }
        if let Some(key) = self.buffers.take() {
            device.destroy_query_buffers(key);
        }
        self.last_count = 0;
        self.request_frame = None;
    }

    fn handle_completion(
        &mut self,
        device: &mut dyn ComputeDevice,
        frame: u64,
        config: &QueryConfig,
        report: &mut PerformReport,
    ) {
        let (handle, dispatch_frame) = match &self.in_flight {
            Some(batch) => (batch.handle, batch.frame),
            None => return,
        };

        match device.poll(&handle) {
            ReadbackStatus::Pending => {
                let waited = frame.saturating_sub(dispatch_frame);
                if let Some(max_pending) = config.max_pending_frames {
                    if waited > max_pending {
                        crate::engine_warn!("strato::QueryPipeline",
                            "{}: read-back {} pending for {} frames, dropping batch",
                            Q::KIND.name(), handle.id(), waited);
                        device.discard(&handle);
                        report.dropped = self.drop_batch(device);
                    }
                }
            }
            ReadbackStatus::Done(data) => {
                if let Some(batch) = self.in_flight.take() {
                    Self::deliver(batch, &data, report);
                }
            }
            ReadbackStatus::Error(message) => {
                crate::engine_warn!("strato::QueryPipeline",
                    "{}: read-back {} failed ({}), dropping batch",
                    Q::KIND.name(), handle.id(), message);
                report.dropped = self.drop_batch(device);
            }
        }
    }

    fn drop_batch(&mut self, device: &mut dyn ComputeDevice) -> usize {
        // The next dispatch allocates fresh buffers
        if let Some(key) = self.buffers.take() {
            device.destroy_query_buffers(key);
        }
        self.last_count = 0;
        self.in_flight.take().map_or(0, |batch| batch.requesters.len())
    }

    fn deliver(batch: InFlightBatch<Q>, data: &[f32], report: &mut PerformReport) {
        let expected = batch.requesters.len() * Q::KIND.output_stride();
        if data.len() < expected {
            crate::engine_warn!("strato::QueryPipeline",
                "{}: read-back holds {} floats, expected {}",
                Q::KIND.name(), data.len(), expected);
        }

        for (index, (requester, input)) in batch.requesters.iter().zip(&batch.inputs).enumerate() {
            match Q::deliver(&mut lock(requester), input, data, index) {
                Delivery::Delivered => {
                    report.completed += 1;
                    report.delivered += 1;
                }
                Delivery::Skipped => report.completed += 1,
                Delivery::Missing => {}
            }
        }
    }

    fn dispatch(
        &mut self,
        device: &mut dyn ComputeDevice,
        frame: u64,
        config: &QueryConfig,
    ) -> Result<usize> {
        let requesters: Vec<_> = self.registry.values().cloned().collect();
        let inputs: Vec<Q::Input> = requesters.iter().map(|r| Q::input(&lock(r))).collect();
        let count = requesters.len();

        let buffers = match self.buffers {
            Some(key) if self.last_count == count => key,
            previous => {
                if let Some(old) = previous {
                    device.destroy_query_buffers(old);
                }
                self.buffers = None;

                let key = device.create_query_buffers(Q::KIND, count)?;
                self.buffers = Some(key);
                self.last_count = count;

                crate::engine_debug!("strato::QueryPipeline",
                    "{}: buffers reallocated for {} requests", Q::KIND.name(), count);
                key
            }
        };

        let handle = device.submit(
            Q::KIND,
            buffers,
            bytemuck::cast_slice(&inputs),
            &config.uniforms(),
            dispatch_size(count, config.thread_group_size),
        )?;

        crate::engine_trace!("strato::QueryPipeline",
            "{}: dispatched {} requests at frame {}", Q::KIND.name(), count, frame);

        self.in_flight = Some(InFlightBatch {
            requesters,
            inputs,
            handle,
            frame,
        });
        self.request_frame = Some(frame);

        Ok(count)
    }
}

impl<Q: BatchQuery> Default for QueryPipeline<Q> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
