//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, resize (shrink-to-fit) and fill (cover + centre crop).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, no
//! ImageMagick. Everything is statically linked into the binary.

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
    /// Width divided by height.
    pub fn aspect(self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// Trait for image processing backends.
///
/// The output format is chosen from the output path's extension.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Fit inside `width`×`height`, preserving aspect ratio, never enlarging.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Cover `width`×`height`, then centre-crop to exactly that size.
    fn fill(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
