use bitflags::bitflags;

use super::ResourceState;

/// Memory heap a resource lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapKind {
    /// Device-local memory. Not CPU-visible; filled through copies.
    Default,
    /// CPU-visible memory for staging and per-frame data. Resources here
    /// are permanently in [`ResourceState::GenericRead`].
    Upload,
}

bitflags! {
    /// How a buffer may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const SHADER_RESOURCE = 1 << 0;
        const CONSTANT = 1 << 1;
        const COPY_SRC = 1 << 2;
        const COPY_DST = 1 << 3;
    }
}

/// Description of a buffer to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub label: String,
    pub size: u64,
    pub heap: HeapKind,
    pub usage: BufferUsage,
    pub initial_state: ResourceState,
}

impl BufferDescriptor {
    pub fn new(size: u64, heap: HeapKind, usage: BufferUsage, initial_state: ResourceState) -> Self {
        Self {
            label: String::new(),
            size,
            heap,
            usage,
            initial_state,
        }
    }

    /// An upload-heap buffer, born and kept in `GenericRead`.
    pub fn upload(size: u64, usage: BufferUsage) -> Self {
        Self::new(size, HeapKind::Upload, usage, ResourceState::GenericRead)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
