//! Glimt graphics: a minimal explicit-API renderer core.
//!
//! The crate models an explicit GPU API frontend: resources carry tracked
//! access states, frames are recorded through a strict protocol into
//! command streams, and a monotonic fence orders CPU reuse of per-frame
//! resources behind GPU completion. Backends execute the streams; the
//! built-in [`backend::HeadlessBackend`] executes them on the CPU with
//! full validation.

pub mod backend;
pub mod benchmark;
pub mod command;
pub mod descriptor;
pub mod error;
pub mod frame;
pub mod object;
pub mod pipeline;
pub mod renderer;
pub mod resource;
pub mod surface;
pub mod sync;
pub mod texture;
pub mod types;

pub use backend::{Backend, BackendHandle, HeadlessBackend};
pub use command::{Command, CommandRecorder, TimerSet, TimestampQuery};
pub use error::GraphicsError;
pub use frame::{FrameSet, FrameSlot, SWAP_BUFFER_COUNT};
pub use object::{ObjectDesc, SceneObject};
pub use pipeline::{PipelineState, RootParam, RootSignature, ShaderBytecode, ShaderSet};
pub use renderer::{Renderer, RendererConfig};
pub use resource::{GpuResource, ResourceId};
pub use surface::{HeadlessSurface, PresentSurface};
pub use sync::SyncGate;
pub use texture::TextureSet;
pub use types::ResourceState;
