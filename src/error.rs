//! Crate-level error type.
//!
//! Each concern owns a `thiserror` enum (`ConfigError`, `BackendError`,
//! `CssError`, `SvgError`, `FetchError`); importers return [`Error`], which
//! wraps all of them so callers can use `?` across asset kinds.

use crate::css::CssError;
use crate::fetch::FetchError;
use crate::imaging::BackendError;
use crate::settings::ConfigError;
use crate::svg::SvgError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error(transparent)]
    Css(#[from] CssError),
    #[error("SASS compilation failed for {path}: {message}")]
    Sass { path: PathBuf, message: String },
    #[error(transparent)]
    Svg(#[from] SvgError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
