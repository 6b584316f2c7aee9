//! Import-once de-duplication for a single page render.
//!
//! Pages are assembled from components that each pull in their own styles and
//! scripts. A [`RenderPass`] remembers which resources were already emitted so
//! the second component asking for `nav.css` gets an empty string instead of a
//! duplicate `<style>` block.

use crate::settings::absolutize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Asset kind, used as the key prefix so a stylesheet and a script with the
/// same path never shadow each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Css,
    Sass,
    Js,
    ExternalCss,
    ExternalJs,
}

impl ImportKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ImportKind::Css => "css",
            ImportKind::Sass => "sass",
            ImportKind::Js => "js",
            ImportKind::ExternalCss => "external-css",
            ImportKind::ExternalJs => "external-js",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ImportKind::Css => "CSS",
            ImportKind::Sass => "SASS",
            ImportKind::Js => "JS",
            ImportKind::ExternalCss => "external CSS",
            ImportKind::ExternalJs => "external JS",
        }
    }

    fn is_external(self) -> bool {
        matches!(self, ImportKind::ExternalCss | ImportKind::ExternalJs)
    }
}

/// Keys emitted during one page render.
#[derive(Debug, Default, Clone)]
pub struct RenderPass {
    emitted: HashSet<String>,
}

impl RenderPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// De-duplication key: the absolute path for local files, the URL verbatim
    /// for external resources.
    pub fn key(kind: ImportKind, source: &str) -> String {
        let resolved = if kind.is_external() {
            source.to_string()
        } else {
            absolutize(Path::new(source)).to_string_lossy().to_string()
        };
        format!("{}-{}", kind.prefix(), resolved)
    }

    pub fn contains(&self, kind: ImportKind, source: &str) -> bool {
        self.emitted.contains(&Self::key(kind, source))
    }

    pub fn len(&self) -> usize {
        self.emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitted.is_empty()
    }

    /// Run `importer` unless `source` was already emitted in this pass.
    ///
    /// Returns an empty string for repeats. The key is only recorded once the
    /// importer succeeds, so a failed import can be retried.
    pub fn import_once<E, F>(&mut self, kind: ImportKind, source: &str, importer: F) -> Result<String, E>
    where
        F: FnOnce() -> Result<String, E>,
    {
        let key = Self::key(kind, source);
        if self.emitted.contains(&key) {
            debug!("Skipping already imported {}: {source}", kind.label());
            return Ok(String::new());
        }
        let html = importer()?;
        self.emitted.insert(key);
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(html: &str) -> Result<String, String> {
        Ok(html.to_string())
    }

    #[test]
    fn first_import_runs_importer() {
        let mut pass = RenderPass::new();
        let html = pass
            .import_once(ImportKind::Css, "styles/a.css", || ok("<style>a</style>"))
            .unwrap();
        assert_eq!(html, "<style>a</style>");
        assert!(pass.contains(ImportKind::Css, "styles/a.css"));
    }

    #[test]
    fn repeat_import_returns_empty_without_calling_importer() {
        let mut pass = RenderPass::new();
        pass.import_once(ImportKind::Js, "a.js", || ok("x")).unwrap();

        let mut called = false;
        let html = pass
            .import_once(ImportKind::Js, "a.js", || {
                called = true;
                ok("x")
            })
            .unwrap();
        assert_eq!(html, "");
        assert!(!called);
    }

    #[test]
    fn relative_and_absolute_paths_share_a_key() {
        let abs = absolutize(Path::new("a.css"));
        assert_eq!(
            RenderPass::key(ImportKind::Css, "a.css"),
            RenderPass::key(ImportKind::Css, &abs.to_string_lossy())
        );
    }

    #[test]
    fn kinds_do_not_collide() {
        let mut pass = RenderPass::new();
        pass.import_once(ImportKind::Css, "x", || ok("css")).unwrap();
        let html = pass.import_once(ImportKind::Sass, "x", || ok("sass")).unwrap();
        assert_eq!(html, "sass");
        assert_eq!(pass.len(), 2);
    }

    #[test]
    fn external_keys_keep_the_url() {
        assert_eq!(
            RenderPass::key(ImportKind::ExternalJs, "https://cdn.example/x.js"),
            "external-js-https://cdn.example/x.js"
        );
    }

    #[test]
    fn failed_import_is_not_recorded() {
        let mut pass = RenderPass::new();
        let failed: Result<String, String> =
            pass.import_once(ImportKind::Css, "a.css", || Err("boom".into()));
        assert!(failed.is_err());
        assert!(pass.is_empty());

        let html = pass.import_once(ImportKind::Css, "a.css", || ok("retry")).unwrap();
        assert_eq!(html, "retry");
    }

    #[test]
    fn separate_passes_are_independent() {
        let mut first = RenderPass::new();
        let mut second = RenderPass::new();
        first.import_once(ImportKind::Css, "a.css", || ok("a")).unwrap();
        let html = second.import_once(ImportKind::Css, "a.css", || ok("a")).unwrap();
        assert_eq!(html, "a");
    }
}
