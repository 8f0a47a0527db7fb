//! Graphics error types.

use glimt_core::AssetError;

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to initialize a device-level object.
    InitializationFailed(String),
    /// Failed to create a resource.
    ResourceCreationFailed(String),
    /// Out of GPU memory.
    OutOfMemory,
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// A resource-state transition named a "before" state that does not
    /// match the resource's actual state.
    InvalidStateTransition(String),
    /// A command recorder step was issued out of protocol order.
    InvalidRecorderState(String),
    /// A frame slot's resources were touched while the GPU may still be
    /// reading them.
    ResourceInFlight(String),
    /// The backend refused a recorded command stream.
    SubmissionRejected(String),
    /// An asset failed to load.
    AssetLoad(String),
    /// An internal error occurred.
    Internal(String),
}

impl std::fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::OutOfMemory => write!(f, "out of GPU memory"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::InvalidStateTransition(msg) => write!(f, "invalid state transition: {msg}"),
            Self::InvalidRecorderState(msg) => write!(f, "invalid recorder state: {msg}"),
            Self::ResourceInFlight(msg) => write!(f, "resource still in flight: {msg}"),
            Self::SubmissionRejected(msg) => write!(f, "submission rejected: {msg}"),
            Self::AssetLoad(msg) => write!(f, "asset load failed: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

impl From<AssetError> for GraphicsError {
    fn from(err: AssetError) -> Self {
        Self::AssetLoad(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::OutOfMemory;
        assert_eq!(err.to_string(), "out of GPU memory");

        let err = GraphicsError::InvalidRecorderState("close before reset".to_string());
        assert_eq!(err.to_string(), "invalid recorder state: close before reset");
    }
}
