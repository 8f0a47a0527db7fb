//! GPU texture sets: single textures and indexed animation flipbooks.

use std::sync::Arc;

use glimt_core::CpuTexture;

use crate::backend::Backend;
use crate::command::Command;
use crate::descriptor::{DescriptorHeap, DescriptorHeapKind};
use crate::error::GraphicsError;
use crate::resource::GpuResource;
use crate::types::{
    BufferDescriptor, BufferUsage, ResourceState, TextureDescriptor, TextureFormat, TextureUsage,
};

/// One texture with its staged upload source.
///
/// The default-heap texture is created in `CopyDest`; the staging buffer
/// holds the texel bytes until the first frame copies them across.
#[derive(Debug)]
pub struct TextureSlot {
    texture: GpuResource,
    staging: GpuResource,
    row_pitch: u32,
}

impl TextureSlot {
    pub fn new(
        backend: &Arc<dyn Backend>,
        pixels: &CpuTexture,
        label: &str,
    ) -> Result<Self, GraphicsError> {
        let desc = TextureDescriptor::new_2d(
            pixels.width,
            pixels.height,
            TextureFormat::Rgba8Unorm,
            TextureUsage::SHADER_RESOURCE | TextureUsage::COPY_DST,
            ResourceState::CopyDest,
        )
        .with_label(label);
        let texture = GpuResource::new_texture(backend, &desc)?;

        let staging = GpuResource::new_buffer(
            backend,
            &BufferDescriptor::upload(pixels.byte_size(), BufferUsage::COPY_SRC)
                .with_label(format!("{label} staging")),
        )?;
        staging.write(0, &pixels.pixels)?;

        Ok(Self {
            texture,
            staging,
            row_pitch: pixels.row_pitch(),
        })
    }

    #[inline]
    pub fn texture(&self) -> &GpuResource {
        &self.texture
    }
}

/// The textures an object samples from.
///
/// `Single` binds one texture at index 0. `Indexed` binds one view per
/// animation frame and cycles `active` through them; the descriptor heap
/// holds exactly one view per texture so the active index is always in
/// bounds.
#[derive(Debug)]
pub enum TextureSet {
    Single {
        slot: TextureSlot,
        heap: DescriptorHeap,
    },
    Indexed {
        slots: Vec<TextureSlot>,
        heap: DescriptorHeap,
        active: usize,
    },
}

impl TextureSet {
    /// Build a set from decoded texel data. One texture makes a `Single`
    /// set, several make an `Indexed` one. An empty list is refused;
    /// callers substitute a placeholder before getting here.
    pub fn new(
        backend: &Arc<dyn Backend>,
        textures: &[CpuTexture],
        label: &str,
    ) -> Result<Self, GraphicsError> {
        if textures.is_empty() {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture set '{label}' has no textures"
            )));
        }

        let mut slots = Vec::with_capacity(textures.len());
        for (i, pixels) in textures.iter().enumerate() {
            slots.push(TextureSlot::new(backend, pixels, &format!("{label}[{i}]"))?);
        }
        let views = slots.iter().map(|s| s.texture.id()).collect();
        let heap = DescriptorHeap::new(
            backend,
            DescriptorHeapKind::CbvSrvUav,
            views,
            format!("{label} srv heap"),
        )?;

        if slots.len() == 1 {
            let slot = slots.pop().ok_or_else(|| {
                GraphicsError::Internal("texture slot vanished".to_string())
            })?;
            Ok(Self::Single { slot, heap })
        } else {
            Ok(Self::Indexed {
                slots,
                heap,
                active: 0,
            })
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single { .. } => 1,
            Self::Indexed { slots, .. } => slots.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn heap(&self) -> &DescriptorHeap {
        match self {
            Self::Single { heap, .. } | Self::Indexed { heap, .. } => heap,
        }
    }

    /// Index the shader samples this frame.
    pub fn active_index(&self) -> u32 {
        match self {
            Self::Single { .. } => 0,
            Self::Indexed { active, .. } => *active as u32,
        }
    }

    /// Advance the animation by one frame if `ticked`, then return the
    /// active index. Wraps back to 0 past the last frame. Single sets
    /// ignore the tick.
    pub fn select_active(&mut self, ticked: bool) -> u32 {
        match self {
            Self::Single { .. } => 0,
            Self::Indexed { slots, active, .. } => {
                if ticked {
                    *active += 1;
                    if *active >= slots.len() {
                        *active = 0;
                    }
                }
                *active as u32
            }
        }
    }

    fn slots(&self) -> std::slice::Iter<'_, TextureSlot> {
        match self {
            Self::Single { slot, .. } => std::slice::from_ref(slot).iter(),
            Self::Indexed { slots, .. } => slots.iter(),
        }
    }

    fn slots_mut(&mut self) -> std::slice::IterMut<'_, TextureSlot> {
        match self {
            Self::Single { slot, .. } => std::slice::from_mut(slot).iter_mut(),
            Self::Indexed { slots, .. } => slots.iter_mut(),
        }
    }

    /// Resource ids of all textures, heap order.
    pub fn texture_ids(&self) -> Vec<crate::resource::ResourceId> {
        self.slots().map(|s| s.texture.id()).collect()
    }

    /// Record staging-to-texture copies for every slot. Every texture is
    /// in `CopyDest` when this is recorded: at creation by construction,
    /// afterwards because each draw returns it there.
    pub fn record_upload(&self, out: &mut Vec<Command>) {
        for slot in self.slots() {
            out.push(Command::CopyBufferToTexture {
                src: slot.staging.id(),
                dst: slot.texture.id(),
                row_pitch: slot.row_pitch,
            });
        }
    }

    /// Record a state transition for every texture in the set.
    pub fn transition_all(
        &mut self,
        before: ResourceState,
        after: ResourceState,
    ) -> Result<Vec<Command>, GraphicsError> {
        let mut commands = Vec::with_capacity(self.len());
        for slot in self.slots_mut() {
            commands.push(slot.texture.transition(before, after)?);
        }
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    fn backend() -> Arc<dyn Backend> {
        Arc::new(HeadlessBackend::new())
    }

    fn pixels(w: u32, h: u32) -> CpuTexture {
        CpuTexture {
            width: w,
            height: h,
            pixels: vec![0xAB; (w * h * 4) as usize],
        }
    }

    #[test]
    fn one_descriptor_per_texture() {
        let backend = backend();
        let set = TextureSet::new(&backend, &[pixels(2, 2), pixels(2, 2), pixels(2, 2)], "anim")
            .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.heap().descriptor_count(), 3);
    }

    #[test]
    fn empty_set_is_refused() {
        let backend = backend();
        assert!(matches!(
            TextureSet::new(&backend, &[], "none"),
            Err(GraphicsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn animation_wraps_to_zero() {
        let backend = backend();
        let mut set =
            TextureSet::new(&backend, &[pixels(2, 2), pixels(2, 2), pixels(2, 2)], "anim")
                .unwrap();
        assert_eq!(set.select_active(true), 1);
        assert_eq!(set.select_active(true), 2);
        // The frame after the last wraps straight to 0, never out of range.
        assert_eq!(set.select_active(true), 0);
        assert_eq!(set.select_active(false), 0);
    }

    #[test]
    fn single_set_ignores_ticks() {
        let backend = backend();
        let mut set = TextureSet::new(&backend, &[pixels(2, 2)], "still").unwrap();
        assert_eq!(set.select_active(true), 0);
        assert_eq!(set.select_active(true), 0);
    }
}
