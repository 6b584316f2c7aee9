//! Script imports. Scripts are inlined verbatim; nothing is bundled or minified.

use crate::error::Result;
use crate::once::{ImportKind, RenderPass};
use crate::toolkit::{StaticPageUtils, read_source};
use maud::{PreEscaped, html};
use std::path::Path;
use tracing::debug;

/// Wrap JavaScript in a `<script>` element without escaping it.
pub fn script_block(js: &str) -> String {
    html! { script { (PreEscaped(js)) } }.into_string()
}

/// Script importer handle, see [`StaticPageUtils::js`].
pub struct Js<'a> {
    pub(crate) kit: &'a StaticPageUtils,
}

impl Js<'_> {
    pub fn import(&self, path: impl AsRef<Path>) -> Result<String> {
        let (_, js) = read_source(path.as_ref())?;
        Ok(script_block(&js))
    }

    pub fn import_once(&self, pass: &mut RenderPass, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        pass.import_once(ImportKind::Js, &path.to_string_lossy(), || self.import(path))
    }

    /// Download a script and inline it. Cached in the memory LRU by URL.
    pub fn import_external(&self, url: &str) -> Result<String> {
        let key = format!("js:{url}");
        if let Some(cached) = self.kit.memory.get(&key) {
            debug!("Using cached JS: {url}");
            return Ok(cached);
        }

        debug!("Downloading JS: {url}");
        let body = self.kit.fetcher.fetch_text(url)?;
        let html = script_block(&body);
        self.kit.memory.insert(key, html.clone());
        Ok(html)
    }

    pub fn import_external_once(&self, pass: &mut RenderPass, url: &str) -> Result<String> {
        pass.import_once(ImportKind::ExternalJs, url, || self.import_external(url))
    }
}
