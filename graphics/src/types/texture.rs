use bitflags::bitflags;

use super::ResourceState;

/// Texel format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA, unsigned normalized.
    Rgba8Unorm,
    /// 32-bit float depth.
    D32Float,
}

impl TextureFormat {
    pub fn bytes_per_texel(&self) -> u32 {
        match self {
            Self::Rgba8Unorm => 4,
            Self::D32Float => 4,
        }
    }
}

/// Texture dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent3d {
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }
}

bitflags! {
    /// How a texture may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const RENDER_TARGET = 1 << 0;
        const DEPTH_STENCIL = 1 << 1;
        const SHADER_RESOURCE = 1 << 2;
        const COPY_DST = 1 << 3;
    }
}

/// Description of a texture to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub label: String,
    pub size: Extent3d,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub initial_state: ResourceState,
}

impl TextureDescriptor {
    pub fn new_2d(
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsage,
        initial_state: ResourceState,
    ) -> Self {
        Self {
            label: String::new(),
            size: Extent3d::new_2d(width, height),
            format,
            usage,
            initial_state,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Bytes in one row of texels.
    pub fn row_pitch(&self) -> u32 {
        self.size.width * self.format.bytes_per_texel()
    }

    /// Total bytes of texel data.
    pub fn byte_size(&self) -> u64 {
        self.row_pitch() as u64 * self.size.height as u64 * self.size.depth as u64
    }
}
