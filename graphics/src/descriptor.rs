//! Descriptor heaps: shader-visible tables of resource views.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::Backend;
use crate::error::GraphicsError;
use crate::resource::ResourceId;

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a registered descriptor heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHeapId(pub u64);

/// What kind of views a heap holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapKind {
    RenderTarget,
    DepthStencil,
    CbvSrvUav,
}

/// A fixed table of resource views registered with the backend.
///
/// The view list is immutable after creation; an indexed texture set keeps
/// exactly one view per texture so that shader-side indexing stays in
/// bounds for any index below the set length.
pub struct DescriptorHeap {
    backend: Arc<dyn Backend>,
    id: DescriptorHeapId,
    kind: DescriptorHeapKind,
    views: Vec<ResourceId>,
    label: String,
}

impl DescriptorHeap {
    pub fn new(
        backend: &Arc<dyn Backend>,
        kind: DescriptorHeapKind,
        views: Vec<ResourceId>,
        label: impl Into<String>,
    ) -> Result<Self, GraphicsError> {
        let label = label.into();
        if views.is_empty() {
            return Err(GraphicsError::InvalidParameter(format!(
                "descriptor heap '{label}' has no views"
            )));
        }
        let id = DescriptorHeapId(NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed));
        backend.register_descriptor_heap(id, kind, views.clone())?;
        Ok(Self {
            backend: backend.clone(),
            id,
            kind,
            views,
            label,
        })
    }

    #[inline]
    pub fn id(&self) -> DescriptorHeapId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> DescriptorHeapKind {
        self.kind
    }

    #[inline]
    pub fn descriptor_count(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn views(&self) -> &[ResourceId] {
        &self.views
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for DescriptorHeap {
    fn drop(&mut self) {
        self.backend.release_descriptor_heap(self.id);
    }
}

impl std::fmt::Debug for DescriptorHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorHeap")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("views", &self.views.len())
            .finish()
    }
}
