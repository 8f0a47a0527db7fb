//! Owning wrapper around a backend resource with state tracking.

use std::sync::Arc;

use crate::backend::Backend;
use crate::command::Command;
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, HeapKind, ResourceState, TextureDescriptor};

/// Opaque backend identifier of a buffer or texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u64);

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A GPU buffer or texture together with its tracked access state.
///
/// The tracked state is the frontend's model of the resource; the backend
/// keeps its own and rejects streams where the two disagree. Dropping the
/// wrapper releases the backend resource.
pub struct GpuResource {
    backend: Arc<dyn Backend>,
    id: ResourceId,
    heap: HeapKind,
    size: u64,
    state: ResourceState,
    label: String,
}

impl GpuResource {
    pub fn new_buffer(
        backend: &Arc<dyn Backend>,
        desc: &BufferDescriptor,
    ) -> Result<Self, GraphicsError> {
        let id = backend.create_buffer(desc)?;
        log::trace!("created buffer '{}' ({} bytes)", desc.label, desc.size);
        Ok(Self {
            backend: backend.clone(),
            id,
            heap: desc.heap,
            size: desc.size,
            state: desc.initial_state,
            label: desc.label.clone(),
        })
    }

    pub fn new_texture(
        backend: &Arc<dyn Backend>,
        desc: &TextureDescriptor,
    ) -> Result<Self, GraphicsError> {
        let id = backend.create_texture(desc)?;
        log::trace!(
            "created texture '{}' ({}x{})",
            desc.label,
            desc.size.width,
            desc.size.height
        );
        Ok(Self {
            backend: backend.clone(),
            id,
            heap: HeapKind::Default,
            size: desc.byte_size(),
            state: desc.initial_state,
            label: desc.label.clone(),
        })
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> ResourceState {
        self.state
    }

    #[inline]
    pub fn heap(&self) -> HeapKind {
        self.heap
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Record a transition from `before` to `after`.
    ///
    /// Fails if `before` does not match the tracked state; the tracked
    /// state only advances when the check passes.
    pub fn transition(
        &mut self,
        before: ResourceState,
        after: ResourceState,
    ) -> Result<Command, GraphicsError> {
        if self.state != before {
            return Err(GraphicsError::InvalidStateTransition(format!(
                "'{}' is in {}, not {}",
                self.label, self.state, before
            )));
        }
        self.state = after;
        Ok(Command::Transition {
            resource: self.id,
            before,
            after,
        })
    }

    /// Write bytes through the CPU mapping. Upload-heap resources only.
    pub fn write(&self, offset: u64, bytes: &[u8]) -> Result<(), GraphicsError> {
        if self.heap != HeapKind::Upload {
            return Err(GraphicsError::InvalidParameter(format!(
                "'{}' is not an upload-heap resource",
                self.label
            )));
        }
        self.backend.write_buffer(self.id, offset, bytes)
    }
}

impl Drop for GpuResource {
    fn drop(&mut self) {
        self.backend.release(self.id);
    }
}

impl std::fmt::Debug for GpuResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuResource")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("heap", &self.heap)
            .field("size", &self.size)
            .field("state", &self.state)
            .finish()
    }
}
