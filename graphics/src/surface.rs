//! Presentation surface abstraction.

use crate::error::GraphicsError;
use crate::frame::SWAP_BUFFER_COUNT;

/// A swap surface the renderer presents to.
///
/// `current_index` names the back buffer to render into; `present` flips
/// to the next one. The index cycles through `image_count` values.
pub trait PresentSurface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn image_count(&self) -> u32;
    fn current_index(&self) -> u32;
    fn present(&mut self) -> Result<(), GraphicsError>;
}

/// Window-less surface; flips an index without displaying anything.
#[derive(Debug)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    index: u32,
    presented: u64,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            index: 0,
            presented: 0,
        }
    }

    /// Frames presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }
}

impl PresentSurface for HeadlessSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn image_count(&self) -> u32 {
        SWAP_BUFFER_COUNT as u32
    }

    fn current_index(&self) -> u32 {
        self.index
    }

    fn present(&mut self) -> Result<(), GraphicsError> {
        self.index = (self.index + 1) % self.image_count();
        self.presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_alternates_between_the_two_buffers() {
        let mut surface = HeadlessSurface::new(4, 4);
        assert_eq!(surface.current_index(), 0);
        surface.present().unwrap();
        assert_eq!(surface.current_index(), 1);
        surface.present().unwrap();
        assert_eq!(surface.current_index(), 0);
        assert_eq!(surface.presented_frames(), 2);
    }
}
