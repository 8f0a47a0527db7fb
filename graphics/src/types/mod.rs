//! Plain-data descriptor and state types shared by resources, the command
//! recorder, and backends.

mod buffer;
mod common;
mod state;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage, HeapKind};
pub use common::{ScissorRect, Viewport};
pub use state::ResourceState;
pub use texture::{Extent3d, TextureDescriptor, TextureFormat, TextureUsage};
