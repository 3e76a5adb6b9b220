/// Mock compute device for unit tests (no backend required)
///
/// Read-backs stay `Pending` until a test completes or fails them.
/// Every allocation and submission is recorded for inspection.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use crate::config::QueryUniforms;
use crate::error::{Error, Result};
use crate::engine_bail;
use super::device::{ComputeDevice, DeviceBufferKey, QueryKind, ReadbackHandle, ReadbackStatus};

#[derive(Debug, Clone)]
pub struct MockSubmission {
    pub handle: ReadbackHandle,
    pub kind: QueryKind,
    pub buffers: DeviceBufferKey,
    pub input: Vec<f32>,
    pub uniforms: QueryUniforms,
    pub dispatch_size: u32,
}

#[derive(Default)]
pub struct MockComputeDevice {
    pub buffers: SlotMap<DeviceBufferKey, (QueryKind, usize)>,
    pub created_buffers: usize,
    pub destroyed_buffers: usize,
    pub submissions: Vec<MockSubmission>,
    pub discarded: Vec<ReadbackHandle>,
    pub fail_next_submit: bool,
    /// Kind whose buffer allocation always fails with `OutOfMemory`
    pub fail_buffers_for: Option<QueryKind>,
    statuses: FxHashMap<u64, ReadbackStatus>,
    next_id: u64,
}

impl MockComputeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_submission(&self) -> &MockSubmission {
        self.submissions.last().expect("no submission recorded")
    }

    /// Complete a read-back with `data`
    pub fn complete(&mut self, handle: ReadbackHandle, data: Vec<f32>) {
        self.statuses.insert(handle.id(), ReadbackStatus::Done(data));
    }

    /// Fail a read-back
    pub fn fail(&mut self, handle: ReadbackHandle, message: &str) {
        self.statuses.insert(handle.id(), ReadbackStatus::Error(message.to_string()));
    }

    /// Complete the latest submission with `data`
    pub fn complete_last(&mut self, data: Vec<f32>) {
        let handle = self.last_submission().handle;
        self.complete(handle, data);
    }

    /// Fail the latest submission
    pub fn fail_last(&mut self, message: &str) {
        let handle = self.last_submission().handle;
        self.fail(handle, message);
    }
}

impl ComputeDevice for MockComputeDevice {
    fn create_query_buffers(&mut self, kind: QueryKind, count: usize) -> Result<DeviceBufferKey> {
        if self.fail_buffers_for == Some(kind) {
            return Err(Error::OutOfMemory);
        }
        self.created_buffers += 1;
        Ok(self.buffers.insert((kind, count)))
    }

    fn destroy_query_buffers(&mut self, key: DeviceBufferKey) {
        if self.buffers.remove(key).is_some() {
            self.destroyed_buffers += 1;
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
        if self.fail_next_submit {
            self.fail_next_submit = false;
            engine_bail!("strato::mock", "submit: scripted failure");
        }
        if !self.buffers.contains_key(buffers) {
            engine_bail!("strato::mock", "submit: unknown buffers {:?}", buffers);
        }

        let handle = ReadbackHandle::new(self.next_id, kind);
        self.next_id += 1;
        self.statuses.insert(handle.id(), ReadbackStatus::Pending);
        self.submissions.push(MockSubmission {
            handle,
            kind,
            buffers,
            input: bytemuck::pod_collect_to_vec(input),
            uniforms: *uniforms,
            dispatch_size,
        });
        Ok(handle)
    }

    fn poll(&mut self, handle: &ReadbackHandle) -> ReadbackStatus {
        self.statuses
            .get(&handle.id())
            .cloned()
            .unwrap_or_else(|| ReadbackStatus::Error(format!("unknown read-back {}", handle.id())))
    }

    fn discard(&mut self, handle: &ReadbackHandle) {
        self.statuses.remove(&handle.id());
        self.discarded.push(*handle);
    }
}
