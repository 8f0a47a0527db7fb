//! Backend abstraction.
//!
//! Frontend types never talk to a device directly; they record [`Command`]
//! streams and hand them to a [`Backend`] for execution. The headless
//! backend executes streams on the CPU with full state validation, which is
//! what the test suite runs against.

mod headless;

use std::sync::Arc;

use crate::command::{Command, TimestampQuery};
use crate::descriptor::{DescriptorHeapId, DescriptorHeapKind};
use crate::error::GraphicsError;
use crate::resource::ResourceId;
use crate::types::{BufferDescriptor, TextureDescriptor};

pub use headless::HeadlessBackend;

/// A device that owns GPU resources and executes command streams.
///
/// Resources are identified by opaque ids; the frontend wrappers own the
/// ids and release them on drop. Submission signals a monotonically
/// increasing fence value when the stream has fully executed.
pub trait Backend: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<ResourceId, GraphicsError>;

    fn create_texture(&self, desc: &TextureDescriptor) -> Result<ResourceId, GraphicsError>;

    /// Release a resource. Ignores ids that are already gone.
    fn release(&self, id: ResourceId);

    /// Make `views` visible to shaders as a descriptor heap.
    fn register_descriptor_heap(
        &self,
        id: DescriptorHeapId,
        kind: DescriptorHeapKind,
        views: Vec<ResourceId>,
    ) -> Result<(), GraphicsError>;

    fn release_descriptor_heap(&self, id: DescriptorHeapId);

    /// Write bytes into an upload-heap buffer. The mapping is undone on
    /// every exit path, including errors.
    fn write_buffer(&self, id: ResourceId, offset: u64, data: &[u8]) -> Result<(), GraphicsError>;

    /// Read bytes back from a buffer. Test and tooling path.
    fn read_buffer(&self, id: ResourceId, offset: u64, size: u64) -> Result<Vec<u8>, GraphicsError>;

    /// Execute a command stream, then signal `signal_value` on the fence.
    ///
    /// On error nothing is signalled and the stream is discarded.
    fn submit(&self, commands: &[Command], signal_value: u64) -> Result<(), GraphicsError>;

    /// Highest fence value the device has signalled so far.
    fn completed_value(&self) -> u64;

    /// Block until the fence reaches `value`.
    fn wait(&self, value: u64);

    /// Timestamp ticks per second.
    fn timestamp_frequency(&self) -> u64;

    /// Begin/end tick pair of the most recent submission that wrote the
    /// query, if any.
    fn timestamp_pair(&self, query: TimestampQuery) -> Option<(u64, u64)>;
}

/// Shared handle to a backend.
pub type BackendHandle = Arc<dyn Backend>;
