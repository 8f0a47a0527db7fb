//! Asset loading error types.

/// Errors raised while loading mesh, material, or texture assets.
///
/// Per-record problems inside an otherwise readable file (for example a
/// malformed face line) are *not* errors: they are reported through the
/// log and the asset loads with partially-populated data. Only failures
/// that leave nothing usable surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The file could not be opened or read.
    Io { path: String, message: String },
    /// An image file could not be decoded.
    Image { path: String, message: String },
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "failed to read '{path}': {message}"),
            Self::Image { path, message } => write!(f, "failed to decode image '{path}': {message}"),
        }
    }
}

impl std::error::Error for AssetError {}

impl AssetError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
