//! Stylesheet imports.
//!
//! Local stylesheets are vendor-prefixed (see [`CssPrefixer`]) and inlined as
//! a `<style>` block. External stylesheets are downloaded once per toolkit
//! and kept in the memory LRU.

mod prefixer;

pub use prefixer::{CSS_NAMESPACE, CssPrefixer};

use crate::error::Result;
use crate::once::{ImportKind, RenderPass};
use crate::toolkit::{StaticPageUtils, read_source};
use maud::{PreEscaped, html};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CssError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid browserslist query: {0}")]
    Browserslist(String),
    #[error("CSS parse error: {0}")]
    Parse(String),
    #[error("CSS transform failed: {0}")]
    Transform(String),
}

/// Wrap CSS in a `<style>` element without escaping it.
pub fn style_block(css: &str) -> String {
    html! { style { (PreEscaped(css)) } }.into_string()
}

/// Memory-cache key for a downloaded stylesheet.
fn external_key(url: &str) -> String {
    format!("css:{url}")
}

/// Stylesheet importer handle, see [`StaticPageUtils::css`].
pub struct Css<'a> {
    pub(crate) kit: &'a StaticPageUtils,
}

impl Css<'_> {
    /// Prefix a local stylesheet and return it as a `<style>` block.
    pub fn import(&self, path: impl AsRef<Path>) -> Result<String> {
        let (_, css) = read_source(path.as_ref())?;
        let prefixed = self.kit.prefixer.prefix(&self.kit.disk, &css)?;
        Ok(style_block(&prefixed))
    }

    /// [`import`](Self::import), at most once per render pass.
    pub fn import_once(&self, pass: &mut RenderPass, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        pass.import_once(ImportKind::Css, &path.to_string_lossy(), || self.import(path))
    }

    /// Download a stylesheet and return it as a `<style>` block.
    ///
    /// The downloaded HTML stays in the memory LRU, keyed by URL.
    pub fn import_external(&self, url: &str) -> Result<String> {
        let key = external_key(url);
        if let Some(cached) = self.kit.memory.get(&key) {
            debug!("Using cached CSS: {url}");
            return Ok(cached);
        }

        debug!("Downloading CSS: {url}");
        let body = self.kit.fetcher.fetch_text(url)?;
        let html = style_block(&body);
        self.kit.memory.insert(key, html.clone());
        Ok(html)
    }

    /// [`import_external`](Self::import_external), at most once per render pass.
    pub fn import_external_once(&self, pass: &mut RenderPass, url: &str) -> Result<String> {
        pass.import_once(ImportKind::ExternalCss, url, || self.import_external(url))
    }
}
