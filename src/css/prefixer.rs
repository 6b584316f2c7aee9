//! Vendor prefixing with lightningcss.
//!
//! Stylesheets are parsed, run through lightningcss's property handlers for
//! the configured browserslist targets (which add `-webkit-`/`-moz-`/`-ms-`
//! fallbacks where the targets need them) and printed back non-minified.

use super::CssError;
use crate::cache::{DiskCache, cache_key, hash_params, hash_str};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

/// Cache namespace shared by prefixed CSS and compiled SASS.
pub const CSS_NAMESPACE: &str = "css";

/// Prefixes CSS for a fixed set of browserslist queries.
#[derive(Debug, Clone)]
pub struct CssPrefixer {
    queries: Vec<String>,
    targets: Targets,
    params_hash: String,
}

impl CssPrefixer {
    /// Resolve browserslist queries into lightningcss targets.
    ///
    /// An empty query list means "no targets": CSS passes through unprefixed.
    pub fn new(queries: Vec<String>) -> Result<Self, CssError> {
        let browsers = if queries.is_empty() {
            None
        } else {
            Browsers::from_browserslist(queries.iter().map(String::as_str))
                .map_err(|e| CssError::Browserslist(e.to_string()))?
        };
        let params_hash = hash_params(CSS_NAMESPACE, &queries);
        Ok(Self {
            queries,
            targets: Targets {
                browsers,
                ..Targets::default()
            },
            params_hash,
        })
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Hash of the queries; part of every cache key this prefixer produces.
    pub fn params_hash(&self) -> &str {
        &self.params_hash
    }

    /// Prefix without touching the cache.
    pub fn prefix_uncached(&self, css: &str) -> Result<String, CssError> {
        let mut sheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| CssError::Parse(e.to_string()))?;
        sheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| CssError::Transform(e.to_string()))?;
        let result = sheet
            .to_css(PrinterOptions {
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| CssError::Transform(e.to_string()))?;
        Ok(result.code)
    }

    /// Prefix `css`, memoized in the `css/` namespace of `cache`.
    pub fn prefix(&self, cache: &DiskCache, css: &str) -> Result<String, CssError> {
        let key = cache_key(&hash_str(css), &self.params_hash);
        cache.memoize(CSS_NAMESPACE, &key, "css", || {
            debug!("Prefixing CSS");
            self.prefix_uncached(css)
        })
    }
}
