//! Root signature and pipeline state objects.
//!
//! There is a single root-signature layout in the whole renderer; every
//! pipeline draws through the same five parameters. See
//! [`RootSignature::standard`].

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::TextureFormat;

static NEXT_PIPELINE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(pub u64);

/// Root parameter slots, in signature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RootParam {
    /// Vertex positions, raw shader resource view.
    Positions = 0,
    /// Texture coordinates, raw shader resource view.
    Uv = 1,
    /// World-view-projection matrix as 16 root constants.
    Wvp = 2,
    /// Unbounded texture table.
    TextureTable = 3,
    /// Active texture index, one root constant.
    TextureIndex = 4,
}

impl RootParam {
    pub const COUNT: usize = 5;

    /// Number of 32-bit constants carried by the WVP slot.
    pub const WVP_CONSTANTS: u32 = 16;
}

/// Shader stages a root parameter is visible to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderVisibility {
    Vertex,
    Pixel,
}

/// Kind of a root parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootParamKind {
    /// Directly bound buffer view.
    ShaderResourceView,
    /// Inline 32-bit constants.
    Constants { count: u32 },
    /// Descriptor table of unbounded size.
    DescriptorTable,
}

/// One slot of the root signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootParamDesc {
    pub kind: RootParamKind,
    pub visibility: ShaderVisibility,
}

/// The fixed root-signature layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSignature {
    params: [RootParamDesc; RootParam::COUNT],
}

impl RootSignature {
    /// The renderer's one layout: positions SRV, uv SRV, 16 WVP constants,
    /// unbounded texture table, texture-index constant, plus a point-wrap
    /// static sampler.
    pub fn standard() -> Self {
        Self {
            params: [
                RootParamDesc {
                    kind: RootParamKind::ShaderResourceView,
                    visibility: ShaderVisibility::Vertex,
                },
                RootParamDesc {
                    kind: RootParamKind::ShaderResourceView,
                    visibility: ShaderVisibility::Vertex,
                },
                RootParamDesc {
                    kind: RootParamKind::Constants {
                        count: RootParam::WVP_CONSTANTS,
                    },
                    visibility: ShaderVisibility::Vertex,
                },
                RootParamDesc {
                    kind: RootParamKind::DescriptorTable,
                    visibility: ShaderVisibility::Pixel,
                },
                RootParamDesc {
                    kind: RootParamKind::Constants { count: 1 },
                    visibility: ShaderVisibility::Pixel,
                },
            ],
        }
    }

    pub fn param(&self, param: RootParam) -> RootParamDesc {
        self.params[param as usize]
    }
}

/// Compiled shader blob, treated as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBytecode {
    pub bytes: Vec<u8>,
    pub entry_point: String,
}

impl ShaderBytecode {
    pub fn new(bytes: Vec<u8>, entry_point: impl Into<String>) -> Self {
        Self {
            bytes,
            entry_point: entry_point.into(),
        }
    }
}

/// Vertex and pixel shader pair shared by all objects.
#[derive(Debug, Clone)]
pub struct ShaderSet {
    pub vertex: ShaderBytecode,
    pub pixel: ShaderBytecode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Solid,
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunc {
    Never,
    Less,
    Greater,
    Always,
}

/// Description of a pipeline state object.
#[derive(Debug, Clone)]
pub struct PipelineDesc {
    pub label: String,
    pub vertex_shader: ShaderBytecode,
    pub pixel_shader: ShaderBytecode,
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub topology: PrimitiveTopology,
    pub alpha_blend: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_func: CompareFunc,
    pub color_format: TextureFormat,
    pub depth_format: TextureFormat,
}

impl PipelineDesc {
    /// The renderer's default fixed-function configuration: no culling,
    /// counter-clockwise front faces, alpha blending, depth test on.
    pub fn standard(shaders: &ShaderSet, fill_mode: FillMode) -> Self {
        Self {
            label: String::new(),
            vertex_shader: shaders.vertex.clone(),
            pixel_shader: shaders.pixel.clone(),
            fill_mode,
            cull_mode: CullMode::None,
            front_counter_clockwise: true,
            topology: PrimitiveTopology::TriangleList,
            alpha_blend: true,
            depth_test: true,
            depth_write: true,
            depth_func: CompareFunc::Less,
            color_format: TextureFormat::Rgba8Unorm,
            depth_format: TextureFormat::D32Float,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A created pipeline state object.
#[derive(Debug, Clone)]
pub struct PipelineState {
    id: PipelineId,
    desc: PipelineDesc,
}

impl PipelineState {
    pub fn new(desc: PipelineDesc) -> Self {
        Self {
            id: PipelineId(NEXT_PIPELINE_ID.fetch_add(1, Ordering::Relaxed)),
            desc,
        }
    }

    #[inline]
    pub fn id(&self) -> PipelineId {
        self.id
    }

    #[inline]
    pub fn desc(&self) -> &PipelineDesc {
        &self.desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_signature_layout() {
        let sig = RootSignature::standard();
        assert_eq!(
            sig.param(RootParam::Positions).kind,
            RootParamKind::ShaderResourceView
        );
        assert_eq!(
            sig.param(RootParam::Wvp).kind,
            RootParamKind::Constants { count: 16 }
        );
        assert_eq!(
            sig.param(RootParam::TextureTable).kind,
            RootParamKind::DescriptorTable
        );
        assert_eq!(
            sig.param(RootParam::TextureIndex).kind,
            RootParamKind::Constants { count: 1 }
        );
        assert_eq!(
            sig.param(RootParam::TextureIndex).visibility,
            ShaderVisibility::Pixel
        );
    }

    #[test]
    fn pipeline_ids_are_unique() {
        let shaders = ShaderSet {
            vertex: ShaderBytecode::new(vec![1], "vs_main"),
            pixel: ShaderBytecode::new(vec![2], "ps_main"),
        };
        let a = PipelineState::new(PipelineDesc::standard(&shaders, FillMode::Solid));
        let b = PipelineState::new(PipelineDesc::standard(&shaders, FillMode::Wireframe));
        assert_ne!(a.id(), b.id());
    }
}
