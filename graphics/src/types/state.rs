/// Access state of a GPU resource.
///
/// Every resource is in exactly one state at any time; commands that read
/// or write a resource are only legal in the matching state, and moving
/// between states requires an explicit transition naming both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// No particular access; freshly created resources without a more
    /// specific initial state start here.
    Common,
    /// Ready for presentation through a swap surface.
    Present,
    /// Bound as a color render target.
    RenderTarget,
    /// Bound as a depth target with writes enabled.
    DepthWrite,
    /// Destination of a copy operation.
    CopyDest,
    /// Sampled by the pixel shader.
    PixelShaderResource,
    /// CPU-visible read state of upload-heap resources. Upload resources
    /// stay here for their whole lifetime.
    GenericRead,
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Common => "Common",
            Self::Present => "Present",
            Self::RenderTarget => "RenderTarget",
            Self::DepthWrite => "DepthWrite",
            Self::CopyDest => "CopyDest",
            Self::PixelShaderResource => "PixelShaderResource",
            Self::GenericRead => "GenericRead",
        };
        f.write_str(name)
    }
}
