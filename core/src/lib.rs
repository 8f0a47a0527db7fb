//! # Glimt Core
//!
//! CPU-side utilities for the Glimt renderer. Everything in this crate is
//! GPU-agnostic: math helpers in the row-vector convention the shaders
//! expect, mesh/material text-format loading, texture pixel decoding,
//! the camera, and frame timing statistics.

pub mod camera;
pub mod error;
pub mod material;
pub mod math;
pub mod mesh;
pub mod texture;
pub mod timing;

pub use camera::Camera;
pub use error::AssetError;
pub use material::MaterialDesc;
pub use mesh::CpuMesh;
pub use texture::CpuTexture;
pub use timing::FrameClock;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
