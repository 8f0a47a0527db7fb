//! CPU-side backend that executes command streams with full validation.
//!
//! Every resource's state is tracked as commands execute, so a stream
//! whose transitions disagree with reality is rejected at the exact
//! command that went wrong. Buffer writes and texture copies move real
//! bytes, which lets tests read back what a frame uploaded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::command::{Command, TimestampQuery};
use crate::descriptor::{DescriptorHeapId, DescriptorHeapKind};
use crate::error::GraphicsError;
use crate::pipeline::{PipelineId, PrimitiveTopology, RootParam, RootParamKind, RootSignature};
use crate::resource::ResourceId;
use crate::types::{BufferDescriptor, HeapKind, ResourceState, TextureDescriptor};

use super::Backend;

#[derive(Debug)]
struct BufferEntry {
    bytes: Vec<u8>,
    heap: HeapKind,
    state: ResourceState,
    label: String,
    mapped: bool,
}

#[derive(Debug)]
struct TextureEntry {
    byte_size: u64,
    state: ResourceState,
    label: String,
    data: Vec<u8>,
}

#[derive(Default)]
struct DeviceState {
    buffers: HashMap<u64, BufferEntry>,
    textures: HashMap<u64, TextureEntry>,
    heaps: HashMap<u64, (DescriptorHeapKind, Vec<ResourceId>)>,
    used_bytes: u64,
    /// Synthetic tick counter, advanced once per executed command.
    clock: u64,
    open_timestamps: HashMap<TimestampQuery, u64>,
    timestamps: HashMap<TimestampQuery, (u64, u64)>,
    copy_count: u64,
}

/// Root bindings and fixed state of one submission.
#[derive(Default)]
struct ExecState {
    root_signature: Option<RootSignature>,
    pipeline: Option<PipelineId>,
    topology: Option<PrimitiveTopology>,
    bound_color: Option<ResourceId>,
    bound_depth: Option<ResourceId>,
    root_srvs: HashMap<u32, ResourceId>,
    root_constants: HashMap<u32, Vec<u32>>,
    root_table: Option<DescriptorHeapId>,
}

/// Validating CPU backend.
pub struct HeadlessBackend {
    device: Mutex<DeviceState>,
    fence_value: Mutex<u64>,
    fence_signal: Condvar,
    next_id: AtomicU64,
    /// When set, submissions execute but the fence only advances through
    /// [`retire_to`](Self::retire_to).
    manual_retirement: bool,
    memory_limit: Option<u64>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            device: Mutex::new(DeviceState::default()),
            fence_value: Mutex::new(0),
            fence_signal: Condvar::new(),
            next_id: AtomicU64::new(1),
            manual_retirement: false,
            memory_limit: None,
        }
    }

    /// A backend whose fence only advances through [`retire_to`](Self::retire_to).
    pub fn with_manual_retirement() -> Self {
        Self {
            manual_retirement: true,
            ..Self::new()
        }
    }

    /// A backend that reports `OutOfMemory` once allocations exceed `bytes`.
    pub fn with_memory_limit(bytes: u64) -> Self {
        Self {
            memory_limit: Some(bytes),
            ..Self::new()
        }
    }

    /// Advance the fence to `value` and wake waiters.
    pub fn retire_to(&self, value: u64) {
        let mut completed = self.fence_value.lock();
        if value > *completed {
            *completed = value;
            self.fence_signal.notify_all();
        }
    }

    /// Tracked state of a resource, if it exists. Test hook.
    pub fn resource_state(&self, id: ResourceId) -> Option<ResourceState> {
        let device = self.device.lock();
        device
            .buffers
            .get(&id.0)
            .map(|b| b.state)
            .or_else(|| device.textures.get(&id.0).map(|t| t.state))
    }

    /// Texel bytes currently held by a texture. Test hook.
    pub fn texture_data(&self, id: ResourceId) -> Option<Vec<u8>> {
        self.device.lock().textures.get(&id.0).map(|t| t.data.clone())
    }

    /// Buffer-to-texture copies executed so far. Test hook.
    pub fn copy_count(&self) -> u64 {
        self.device.lock().copy_count
    }

    /// Whether an upload buffer is currently mapped. Test hook.
    pub fn is_mapped(&self, id: ResourceId) -> bool {
        self.device
            .lock()
            .buffers
            .get(&id.0)
            .map(|b| b.mapped)
            .unwrap_or(false)
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check_memory(&self, device: &DeviceState, size: u64) -> Result<(), GraphicsError> {
        if let Some(limit) = self.memory_limit {
            if device.used_bytes.saturating_add(size) > limit {
                return Err(GraphicsError::OutOfMemory);
            }
        }
        Ok(())
    }

    fn execute(
        &self,
        device: &mut DeviceState,
        exec: &mut ExecState,
        command: &Command,
    ) -> Result<(), GraphicsError> {
        device.clock += 1;
        match command {
            Command::Transition {
                resource,
                before,
                after,
            } => {
                let (state, label) = if let Some(buffer) = device.buffers.get_mut(&resource.0) {
                    (&mut buffer.state, buffer.label.as_str())
                } else if let Some(texture) = device.textures.get_mut(&resource.0) {
                    (&mut texture.state, texture.label.as_str())
                } else {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "transition names unknown resource {resource}"
                    )));
                };
                if *state != *before {
                    return Err(GraphicsError::InvalidStateTransition(format!(
                        "'{label}' is in {state}, stream claims {before}"
                    )));
                }
                log::trace!("transition '{label}': {before} -> {after}");
                *state = *after;
            }
            Command::SetViewport(_) | Command::SetScissor(_) => {}
            Command::SetDescriptorHeap(heap) => {
                if !device.heaps.contains_key(&heap.0) {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "unknown descriptor heap {}",
                        heap.0
                    )));
                }
            }
            Command::SetRootSignature => {
                exec.root_signature = Some(RootSignature::standard());
                exec.root_srvs.clear();
                exec.root_constants.clear();
                exec.root_table = None;
            }
            Command::BindRenderTargets { color, depth } => {
                let target = device.textures.get(&color.0).ok_or_else(|| {
                    GraphicsError::SubmissionRejected(format!("unknown render target {color}"))
                })?;
                if target.state != ResourceState::RenderTarget {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "render target '{}' bound in state {}",
                        target.label, target.state
                    )));
                }
                let depth_target = device.textures.get(&depth.0).ok_or_else(|| {
                    GraphicsError::SubmissionRejected(format!("unknown depth target {depth}"))
                })?;
                if depth_target.state != ResourceState::DepthWrite {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "depth target '{}' bound in state {}",
                        depth_target.label, depth_target.state
                    )));
                }
                exec.bound_color = Some(*color);
                exec.bound_depth = Some(*depth);
            }
            Command::ClearRenderTarget { target, .. } => {
                if exec.bound_color != Some(*target) {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "clear of unbound render target {target}"
                    )));
                }
            }
            Command::ClearDepth { target, .. } => {
                if exec.bound_depth != Some(*target) {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "clear of unbound depth target {target}"
                    )));
                }
            }
            Command::SetPipelineState(id) => {
                exec.pipeline = Some(*id);
            }
            Command::SetPrimitiveTopology(topology) => {
                exec.topology = Some(*topology);
            }
            Command::SetRootShaderResource { param, resource } => {
                let signature = Self::require_signature(exec)?;
                if signature.param(*param).kind != RootParamKind::ShaderResourceView {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "root param {param:?} is not a shader resource view"
                    )));
                }
                let buffer = device.buffers.get(&resource.0).ok_or_else(|| {
                    GraphicsError::SubmissionRejected(format!("unknown buffer srv {resource}"))
                })?;
                if buffer.state != ResourceState::GenericRead {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "buffer srv '{}' is in {}",
                        buffer.label, buffer.state
                    )));
                }
                exec.root_srvs.insert(*param as u32, *resource);
            }
            Command::SetRootConstants { param, values } => {
                let signature = Self::require_signature(exec)?;
                match signature.param(*param).kind {
                    RootParamKind::Constants { count } if count as usize == values.len() => {}
                    RootParamKind::Constants { count } => {
                        return Err(GraphicsError::SubmissionRejected(format!(
                            "root param {param:?} takes {count} constants, stream set {}",
                            values.len()
                        )));
                    }
                    _ => {
                        return Err(GraphicsError::SubmissionRejected(format!(
                            "root param {param:?} does not take constants"
                        )));
                    }
                }
                exec.root_constants.insert(*param as u32, values.clone());
            }
            Command::SetRootDescriptorTable { param, heap } => {
                let signature = Self::require_signature(exec)?;
                if signature.param(*param).kind != RootParamKind::DescriptorTable {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "root param {param:?} is not a descriptor table"
                    )));
                }
                match device.heaps.get(&heap.0) {
                    Some((DescriptorHeapKind::CbvSrvUav, _)) => {}
                    Some(_) => {
                        return Err(GraphicsError::SubmissionRejected(format!(
                            "descriptor table bound to non-shader-visible heap {}",
                            heap.0
                        )));
                    }
                    None => {
                        return Err(GraphicsError::SubmissionRejected(format!(
                            "unknown descriptor heap {}",
                            heap.0
                        )));
                    }
                }
                exec.root_table = Some(*heap);
            }
            Command::CopyBufferToTexture { src, dst, .. } => {
                let src_bytes = {
                    let buffer = device.buffers.get(&src.0).ok_or_else(|| {
                        GraphicsError::SubmissionRejected(format!("unknown copy source {src}"))
                    })?;
                    if buffer.heap != HeapKind::Upload {
                        return Err(GraphicsError::SubmissionRejected(format!(
                            "copy source '{}' is not an upload buffer",
                            buffer.label
                        )));
                    }
                    buffer.bytes.clone()
                };
                let texture = device.textures.get_mut(&dst.0).ok_or_else(|| {
                    GraphicsError::SubmissionRejected(format!("unknown copy target {dst}"))
                })?;
                if texture.state != ResourceState::CopyDest {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "copy target '{}' is in {}",
                        texture.label, texture.state
                    )));
                }
                if (src_bytes.len() as u64) < texture.byte_size {
                    return Err(GraphicsError::SubmissionRejected(format!(
                        "copy source holds {} bytes, target '{}' needs {}",
                        src_bytes.len(),
                        texture.label,
                        texture.byte_size
                    )));
                }
                texture.data = src_bytes[..texture.byte_size as usize].to_vec();
                device.copy_count += 1;
            }
            Command::Draw { vertex_count, .. } => {
                self.check_draw(device, exec, *vertex_count)?;
            }
            Command::BeginTimestamp(query) => {
                device.open_timestamps.insert(*query, device.clock);
            }
            Command::EndTimestamp(query) => {
                let begin = device.open_timestamps.remove(query).ok_or_else(|| {
                    GraphicsError::SubmissionRejected(format!(
                        "end timestamp {query:?} without a begin"
                    ))
                })?;
                device.timestamps.insert(*query, (begin, device.clock));
            }
        }
        Ok(())
    }

    fn require_signature(exec: &ExecState) -> Result<&RootSignature, GraphicsError> {
        exec.root_signature.as_ref().ok_or_else(|| {
            GraphicsError::SubmissionRejected("root binding before SetRootSignature".to_string())
        })
    }

    fn check_draw(
        &self,
        device: &DeviceState,
        exec: &ExecState,
        vertex_count: u32,
    ) -> Result<(), GraphicsError> {
        if exec.pipeline.is_none() {
            return Err(GraphicsError::SubmissionRejected(
                "draw without a pipeline state".to_string(),
            ));
        }
        if exec.topology.is_none() {
            return Err(GraphicsError::SubmissionRejected(
                "draw without a primitive topology".to_string(),
            ));
        }
        if exec.bound_color.is_none() || exec.bound_depth.is_none() {
            return Err(GraphicsError::SubmissionRejected(
                "draw without bound render targets".to_string(),
            ));
        }
        for param in [RootParam::Positions, RootParam::Uv] {
            if !exec.root_srvs.contains_key(&(param as u32)) {
                return Err(GraphicsError::SubmissionRejected(format!(
                    "draw without root srv {param:?}"
                )));
            }
        }
        for param in [RootParam::Wvp, RootParam::TextureIndex] {
            if !exec.root_constants.contains_key(&(param as u32)) {
                return Err(GraphicsError::SubmissionRejected(format!(
                    "draw without root constants {param:?}"
                )));
            }
        }
        let table = exec.root_table.ok_or_else(|| {
            GraphicsError::SubmissionRejected("draw without a texture table".to_string())
        })?;
        // Every view in the sampled table must be shader-readable, and the
        // active index must address one of them.
        let (_, views) = device.heaps.get(&table.0).ok_or_else(|| {
            GraphicsError::SubmissionRejected(format!("unknown descriptor heap {}", table.0))
        })?;
        for view in views {
            let texture = device.textures.get(&view.0).ok_or_else(|| {
                GraphicsError::SubmissionRejected(format!("table view {view} is gone"))
            })?;
            if texture.state != ResourceState::PixelShaderResource {
                return Err(GraphicsError::SubmissionRejected(format!(
                    "sampled texture '{}' is in {}",
                    texture.label, texture.state
                )));
            }
        }
        if let Some(index) = exec
            .root_constants
            .get(&(RootParam::TextureIndex as u32))
            .and_then(|v| v.first())
        {
            if *index as usize >= views.len() {
                return Err(GraphicsError::SubmissionRejected(format!(
                    "texture index {index} out of range ({} views)",
                    views.len()
                )));
            }
        }
        if vertex_count % 3 != 0 {
            log::warn!("draw of {vertex_count} vertices is not a whole number of triangles");
        }
        Ok(())
    }
}

static_assertions::assert_impl_all!(HeadlessBackend: Send, Sync);

impl Backend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<ResourceId, GraphicsError> {
        let mut device = self.device.lock();
        self.check_memory(&device, desc.size)?;
        let id = self.alloc_id();
        device.used_bytes += desc.size;
        device.buffers.insert(
            id,
            BufferEntry {
                bytes: vec![0; desc.size as usize],
                heap: desc.heap,
                state: desc.initial_state,
                label: desc.label.clone(),
                mapped: false,
            },
        );
        Ok(ResourceId(id))
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> Result<ResourceId, GraphicsError> {
        let byte_size = desc.byte_size();
        let mut device = self.device.lock();
        self.check_memory(&device, byte_size)?;
        let id = self.alloc_id();
        device.used_bytes += byte_size;
        device.textures.insert(
            id,
            TextureEntry {
                byte_size,
                state: desc.initial_state,
                label: desc.label.clone(),
                data: vec![0; byte_size as usize],
            },
        );
        Ok(ResourceId(id))
    }

    fn release(&self, id: ResourceId) {
        let mut device = self.device.lock();
        if let Some(buffer) = device.buffers.remove(&id.0) {
            device.used_bytes = device.used_bytes.saturating_sub(buffer.bytes.len() as u64);
        } else if let Some(texture) = device.textures.remove(&id.0) {
            device.used_bytes = device.used_bytes.saturating_sub(texture.byte_size);
        }
    }

    fn register_descriptor_heap(
        &self,
        id: DescriptorHeapId,
        kind: DescriptorHeapKind,
        views: Vec<ResourceId>,
    ) -> Result<(), GraphicsError> {
        let mut device = self.device.lock();
        for view in &views {
            if !device.buffers.contains_key(&view.0) && !device.textures.contains_key(&view.0) {
                return Err(GraphicsError::InvalidParameter(format!(
                    "descriptor heap view {view} does not exist"
                )));
            }
        }
        device.heaps.insert(id.0, (kind, views));
        Ok(())
    }

    fn release_descriptor_heap(&self, id: DescriptorHeapId) {
        self.device.lock().heaps.remove(&id.0);
    }

    fn write_buffer(&self, id: ResourceId, offset: u64, data: &[u8]) -> Result<(), GraphicsError> {
        let mut device = self.device.lock();
        let buffer = device.buffers.get_mut(&id.0).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("write to unknown buffer {id}"))
        })?;
        if buffer.heap != HeapKind::Upload {
            return Err(GraphicsError::InvalidParameter(format!(
                "'{}' is not CPU-writable",
                buffer.label
            )));
        }
        // Map, copy, and always unmap, even when the range check fails.
        buffer.mapped = true;
        let end = offset.saturating_add(data.len() as u64);
        if end > buffer.bytes.len() as u64 {
            buffer.mapped = false;
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at {} overruns '{}' ({} bytes)",
                data.len(),
                offset,
                buffer.label,
                buffer.bytes.len()
            )));
        }
        buffer.bytes[offset as usize..end as usize].copy_from_slice(data);
        buffer.mapped = false;
        Ok(())
    }

    fn read_buffer(&self, id: ResourceId, offset: u64, size: u64) -> Result<Vec<u8>, GraphicsError> {
        let device = self.device.lock();
        let buffer = device.buffers.get(&id.0).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("read from unknown buffer {id}"))
        })?;
        let end = offset.saturating_add(size);
        if end > buffer.bytes.len() as u64 {
            return Err(GraphicsError::InvalidParameter(format!(
                "read of {size} bytes at {offset} overruns '{}'",
                buffer.label
            )));
        }
        Ok(buffer.bytes[offset as usize..end as usize].to_vec())
    }

    fn submit(&self, commands: &[Command], signal_value: u64) -> Result<(), GraphicsError> {
        {
            let mut device = self.device.lock();
            let mut exec = ExecState::default();
            for (i, command) in commands.iter().enumerate() {
                self.execute(&mut device, &mut exec, command).map_err(|e| {
                    log::error!("command {i} rejected: {e}");
                    e
                })?;
            }
        }
        if !self.manual_retirement {
            self.retire_to(signal_value);
        }
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        *self.fence_value.lock()
    }

    fn wait(&self, value: u64) {
        let mut completed = self.fence_value.lock();
        while *completed < value {
            self.fence_signal.wait(&mut completed);
        }
    }

    fn timestamp_frequency(&self) -> u64 {
        // One tick per executed command; report megahertz so averages land
        // in a readable microsecond range.
        1_000_000
    }

    fn timestamp_pair(&self, query: TimestampQuery) -> Option<(u64, u64)> {
        self.device.lock().timestamps.get(&query).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BufferUsage, TextureFormat, TextureUsage};

    fn upload_buffer(backend: &HeadlessBackend, size: u64) -> ResourceId {
        backend
            .create_buffer(
                &BufferDescriptor::upload(size, BufferUsage::COPY_SRC).with_label("staging"),
            )
            .unwrap()
    }

    #[test]
    fn transition_with_wrong_before_state_is_rejected() {
        let backend = HeadlessBackend::new();
        let texture = backend
            .create_texture(
                &TextureDescriptor::new_2d(
                    2,
                    2,
                    TextureFormat::Rgba8Unorm,
                    TextureUsage::SHADER_RESOURCE | TextureUsage::COPY_DST,
                    ResourceState::CopyDest,
                )
                .with_label("tex"),
            )
            .unwrap();

        let bad = Command::Transition {
            resource: texture,
            before: ResourceState::PixelShaderResource,
            after: ResourceState::CopyDest,
        };
        assert!(matches!(
            backend.submit(&[bad], 1),
            Err(GraphicsError::InvalidStateTransition(_))
        ));
        // Nothing was signalled.
        assert_eq!(backend.completed_value(), 0);

        let good = Command::Transition {
            resource: texture,
            before: ResourceState::CopyDest,
            after: ResourceState::PixelShaderResource,
        };
        backend.submit(&[good], 1).unwrap();
        assert_eq!(backend.completed_value(), 1);
        assert_eq!(
            backend.resource_state(texture),
            Some(ResourceState::PixelShaderResource)
        );
    }

    #[test]
    fn copy_moves_staged_bytes_into_the_texture() {
        let backend = HeadlessBackend::new();
        let staging = upload_buffer(&backend, 16);
        backend.write_buffer(staging, 0, &[7u8; 16]).unwrap();
        let texture = backend
            .create_texture(
                &TextureDescriptor::new_2d(
                    2,
                    2,
                    TextureFormat::Rgba8Unorm,
                    TextureUsage::COPY_DST,
                    ResourceState::CopyDest,
                )
                .with_label("tex"),
            )
            .unwrap();

        backend
            .submit(
                &[Command::CopyBufferToTexture {
                    src: staging,
                    dst: texture,
                    row_pitch: 8,
                }],
                1,
            )
            .unwrap();
        assert_eq!(backend.texture_data(texture), Some(vec![7u8; 16]));
        assert_eq!(backend.copy_count(), 1);
    }

    #[test]
    fn overrunning_write_fails_and_unmaps() {
        let backend = HeadlessBackend::new();
        let buffer = upload_buffer(&backend, 8);
        let err = backend.write_buffer(buffer, 4, &[0u8; 8]).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
        assert!(!backend.is_mapped(buffer));
    }

    #[test]
    fn memory_limit_reports_out_of_memory() {
        let backend = HeadlessBackend::with_memory_limit(1024);
        upload_buffer(&backend, 1000);
        let err = backend
            .create_buffer(&BufferDescriptor::upload(100, BufferUsage::COPY_SRC))
            .unwrap_err();
        assert_eq!(err, GraphicsError::OutOfMemory);
    }

    #[test]
    fn timestamps_bracket_the_commands_between_them() {
        let backend = HeadlessBackend::new();
        let query = TimestampQuery::FRAME;
        backend
            .submit(
                &[
                    Command::BeginTimestamp(query),
                    Command::SetViewport(crate::types::Viewport::new(4.0, 4.0)),
                    Command::EndTimestamp(query),
                ],
                1,
            )
            .unwrap();
        let (begin, end) = backend.timestamp_pair(query).unwrap();
        assert_eq!(end - begin, 2);
    }
}
