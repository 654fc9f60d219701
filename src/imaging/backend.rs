//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the materializer
//! needs from a codec: identify (read dimensions) and resize (optional crop,
//! exact resize, encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: one backend is shared by every request a
/// materializer serves, including parallel batches.
pub trait ImageBackend: Sync {
    /// Get image dimensions. Fails if the file is not a readable image.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Crop (if requested), resize to exactly `width` x `height`, and write
    /// the result to `params.output` in the format implied by its extension.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
