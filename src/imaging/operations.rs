//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a request, compute parameters, and call the backend once per
//! output file. Independent outputs are encoded in parallel with rayon.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_target_dimensions;
use super::params::{Quality, ResizeParams};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &dyn ImageBackend, path: &Path) -> Result<Dimensions> {
    backend.identify(path)
}

/// One source image rendered at one width, in one or more formats.
#[derive(Debug, Clone)]
pub struct CompressRequest<'a> {
    pub source: &'a Path,
    /// Output path without extension; each format appends its own.
    pub output_stem: &'a Path,
    /// Target width in pixels (may be fractional before rounding).
    pub width: f64,
    /// Aspect ratio (width / height) of the output box.
    pub aspect: f64,
    pub quality: Quality,
    /// Cover and centre-crop to the exact box instead of shrinking to fit.
    pub force_size: bool,
    pub extensions: &'a [String],
}

/// Plan the backend calls for a request without executing them.
pub fn plan_compress(request: &CompressRequest<'_>) -> Vec<ResizeParams> {
    let (width, height) = calculate_target_dimensions(request.width, request.aspect);
    request
        .extensions
        .iter()
        .map(|ext| ResizeParams {
            source: request.source.to_path_buf(),
            output: with_extension(request.output_stem, ext),
            width,
            height,
            quality: request.quality,
        })
        .collect()
}

/// Render one image at one size into every requested format.
///
/// Returns the written output paths in extension order.
pub fn compress_image(backend: &dyn ImageBackend, request: &CompressRequest<'_>) -> Result<Vec<PathBuf>> {
    let plans = plan_compress(request);
    plans
        .par_iter()
        .map(|params| {
            let result = if request.force_size {
                backend.fill(params)
            } else {
                backend.resize(params)
            };
            match result {
                Ok(()) => {
                    info!(
                        "Processed image: {} -> {}",
                        params.source.display(),
                        params.output.display()
                    );
                    Ok(params.output.clone())
                }
                Err(e) => {
                    error!("Error processing image: {}\n{}", params.source.display(), e);
                    Err(e)
                }
            }
        })
        .collect()
}

/// Scale one source into several fixed boxes, e.g. a PWA icon set.
///
/// Outputs are named `{output_dir}/{name}-{w}x{h}.{source ext}`. Files that
/// already exist are left alone. Sources are only ever shrunk.
pub fn scale_images(
    backend: &dyn ImageBackend,
    source: &Path,
    dimensions: &[(u32, u32)],
    quality: Quality,
    output_dir: &Path,
    name: &str,
) -> Result<Vec<PathBuf>> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_string();

    dimensions
        .par_iter()
        .map(|&(width, height)| {
            let output = output_dir.join(format!("{name}-{width}x{height}.{ext}"));
            if output.exists() {
                return Ok(output);
            }
            backend.resize(&ResizeParams {
                source: source.to_path_buf(),
                output: output.clone(),
                width,
                height,
                quality,
            })?;
            info!("Processed image: {}", output.display());
            Ok(output)
        })
        .collect()
}

fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}
