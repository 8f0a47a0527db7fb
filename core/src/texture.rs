//! Texture pixel data decoded from image files.

use std::path::Path;

use crate::error::AssetError;

/// Bytes per pixel of decoded texture data (always RGBA8).
pub const BYTES_PER_PIXEL: u32 = 4;

/// Decoded pixel data ready for upload to the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuTexture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 pixel rows, top to bottom.
    pub pixels: Vec<u8>,
}

impl CpuTexture {
    /// Load and decode an image file into RGBA8 pixels.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let image = image::open(path).map_err(|e| AssetError::Image {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let rgba = image.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    /// A 1x1 opaque white texture, used when a material names no image.
    pub fn white_placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255, 255, 255, 255],
        }
    }

    /// Bytes per row of pixel data.
    pub fn row_pitch(&self) -> u32 {
        self.width * BYTES_PER_PIXEL
    }

    /// Total size of the pixel data in bytes.
    pub fn byte_size(&self) -> u64 {
        self.pixels.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_one_white_pixel() {
        let t = CpuTexture::white_placeholder();
        assert_eq!(t.width, 1);
        assert_eq!(t.height, 1);
        assert_eq!(t.row_pitch(), 4);
        assert_eq!(t.pixels, vec![255; 4]);
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let err = CpuTexture::load(Path::new("does-not-exist.bmp")).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }
}
