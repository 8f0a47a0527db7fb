//! Per-frame resource slots.
//!
//! The renderer double-buffers: two slots, each owning a back buffer, a
//! depth target, and an upload-heap constant buffer. A slot's resources
//! may only be written once the fence value recorded at its last
//! submission has retired.

use std::sync::Arc;

use static_assertions::const_assert;

use crate::backend::Backend;
use crate::descriptor::{DescriptorHeap, DescriptorHeapKind};
use crate::error::GraphicsError;
use crate::resource::GpuResource;
use crate::types::{
    BufferDescriptor, BufferUsage, ResourceState, TextureDescriptor, TextureFormat, TextureUsage,
};

/// Number of swap buffers, and therefore frame slots.
pub const SWAP_BUFFER_COUNT: usize = 2;

const_assert!(SWAP_BUFFER_COUNT >= 2);

/// Constant-buffer sizes are multiples of 256 bytes.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// Round `size` up to the constant-buffer alignment.
pub const fn align_constant_buffer_size(size: u64) -> u64 {
    (size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

/// Resources owned by one frame in flight.
#[derive(Debug)]
pub struct FrameSlot {
    index: u32,
    render_target: GpuResource,
    depth_stencil: GpuResource,
    constant_buffer: GpuResource,
    cbv_heap: DescriptorHeap,
    /// Fence value of the last submission that used this slot.
    last_fence: u64,
}

impl FrameSlot {
    fn new(
        backend: &Arc<dyn Backend>,
        index: u32,
        width: u32,
        height: u32,
        constant_size: u64,
    ) -> Result<Self, GraphicsError> {
        let render_target = GpuResource::new_texture(
            backend,
            &TextureDescriptor::new_2d(
                width,
                height,
                TextureFormat::Rgba8Unorm,
                TextureUsage::RENDER_TARGET,
                ResourceState::Present,
            )
            .with_label(format!("back buffer {index}")),
        )?;
        let depth_stencil = GpuResource::new_texture(
            backend,
            &TextureDescriptor::new_2d(
                width,
                height,
                TextureFormat::D32Float,
                TextureUsage::DEPTH_STENCIL,
                ResourceState::DepthWrite,
            )
            .with_label(format!("depth buffer {index}")),
        )?;
        let constant_buffer = GpuResource::new_buffer(
            backend,
            &BufferDescriptor::upload(
                align_constant_buffer_size(constant_size),
                BufferUsage::CONSTANT,
            )
            .with_label(format!("frame constants {index}")),
        )?;
        let cbv_heap = DescriptorHeap::new(
            backend,
            DescriptorHeapKind::CbvSrvUav,
            vec![constant_buffer.id()],
            format!("frame cbv heap {index}"),
        )?;
        Ok(Self {
            index,
            render_target,
            depth_stencil,
            constant_buffer,
            cbv_heap,
            last_fence: 0,
        })
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn render_target(&self) -> &GpuResource {
        &self.render_target
    }

    #[inline]
    pub fn render_target_mut(&mut self) -> &mut GpuResource {
        &mut self.render_target
    }

    #[inline]
    pub fn depth_stencil(&self) -> &GpuResource {
        &self.depth_stencil
    }

    #[inline]
    pub fn cbv_heap(&self) -> &DescriptorHeap {
        &self.cbv_heap
    }

    #[inline]
    pub fn last_fence(&self) -> u64 {
        self.last_fence
    }

    /// Record the fence value of the submission that just used this slot.
    pub fn set_last_fence(&mut self, value: u64) {
        self.last_fence = value;
    }

    /// Write this frame's constants.
    ///
    /// Refused while the slot's last submission has not retired, since the
    /// device may still be reading the buffer.
    pub fn write_constants(
        &mut self,
        completed_value: u64,
        bytes: &[u8],
    ) -> Result<(), GraphicsError> {
        if completed_value < self.last_fence {
            return Err(GraphicsError::ResourceInFlight(format!(
                "frame slot {} awaits fence value {} (completed {})",
                self.index, self.last_fence, completed_value
            )));
        }
        self.constant_buffer.write(0, bytes)
    }
}

/// The full ring of frame slots.
#[derive(Debug)]
pub struct FrameSet {
    slots: Vec<FrameSlot>,
}

impl FrameSet {
    pub fn new(
        backend: &Arc<dyn Backend>,
        width: u32,
        height: u32,
        constant_size: u64,
    ) -> Result<Self, GraphicsError> {
        let mut slots = Vec::with_capacity(SWAP_BUFFER_COUNT);
        for index in 0..SWAP_BUFFER_COUNT {
            slots.push(FrameSlot::new(
                backend,
                index as u32,
                width,
                height,
                constant_size,
            )?);
        }
        Ok(Self { slots })
    }

    pub fn slot_mut(&mut self, index: u32) -> Result<&mut FrameSlot, GraphicsError> {
        let count = self.slots.len();
        self.slots.get_mut(index as usize).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "frame slot index {index} out of range ({count} slots)"
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
