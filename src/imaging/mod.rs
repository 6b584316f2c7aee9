//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Shrink to fit** (`WxH>`) | fit calculation + Lanczos3 |
//! | **Fill** (`WxH^` + centre extent) | `resize_to_fill` |
//! | **Encode** | JPEG, PNG, WebP (lossless), AVIF (rav1e) |
//!
//! The module is split into:
//! - **Calculations**: Responsive set table and dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    DENSITIES, IMAGE_SCALES, STANDARD_WIDTHS, calculate_fit_dimensions,
    calculate_target_dimensions, resolve_ratios, scales_for,
};
pub use operations::{CompressRequest, compress_image, get_dimensions, scale_images};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
