//! SASS/SCSS imports.
//!
//! Compiled with `grass`, then run through the same prefixer as plain CSS.
//! The compiled and prefixed result is cached in the `css/` namespace, keyed
//! by the entry file's content.
//!
//! Only the entry file is hashed: editing a partial pulled in with `@use`
//! does not invalidate the entry. Run `cache clean` after changing partials.

use crate::cache::{cache_key, hash_params, hash_str};
use crate::css::{CSS_NAMESPACE, style_block};
use crate::error::{Error, Result};
use crate::once::{ImportKind, RenderPass};
use crate::toolkit::{StaticPageUtils, read_source};
use std::path::Path;
use tracing::debug;

/// SASS importer handle, see [`StaticPageUtils::sass`].
pub struct Sass<'a> {
    pub(crate) kit: &'a StaticPageUtils,
}

impl Sass<'_> {
    /// Compile, prefix and inline a SASS/SCSS file as a `<style>` block.
    pub fn import(&self, path: impl AsRef<Path>) -> Result<String> {
        let (abs, source) = read_source(path.as_ref())?;
        let prefixer = &self.kit.prefixer;
        let params = hash_params("sass", &[prefixer.params_hash()]);
        let key = cache_key(&hash_str(&source), &params);

        let css = self.kit.disk.memoize(CSS_NAMESPACE, &key, "css", || {
            debug!("Compiling SASS: {}", abs.display());
            let compiled = grass::from_path(&abs, &grass::Options::default()).map_err(|e| {
                Error::Sass {
                    path: abs.clone(),
                    message: e.to_string(),
                }
            })?;
            Ok::<_, Error>(prefixer.prefix_uncached(&compiled)?)
        })?;
        Ok(style_block(&css))
    }

    /// [`import`](Self::import), at most once per render pass.
    pub fn import_once(&self, pass: &mut RenderPass, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        pass.import_once(ImportKind::Sass, &path.to_string_lossy(), || self.import(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestSite;

    #[test]
    fn compiles_nesting_and_variables() {
        let site = TestSite::new();
        let path = site.write("main.scss", "$c: red;\n.nav { a { color: $c; } }\n");

        let html = site.kit().sass().import(&path).unwrap();

        assert!(html.starts_with("<style>"));
        assert!(html.contains(".nav a"));
        assert!(html.contains("color: red"));
    }

    #[test]
    fn second_import_hits_cache() {
        let site = TestSite::new();
        let path = site.write("main.scss", ".a { .b { color: blue; } }");
        let kit = site.kit();

        let first = kit.sass().import(&path).unwrap();
        let second = kit.sass().import(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(kit.cache_stats().hits(), 1);
        assert_eq!(kit.cache_stats().misses(), 1);
    }

    #[test]
    fn resolves_partials_relative_to_entry() {
        let site = TestSite::new();
        site.write("_colors.scss", "$brand: #336699;");
        let path = site.write("main.scss", "@use 'colors';\n.a { color: colors.$brand; }");

        let html = site.kit().sass().import(&path).unwrap();
        assert!(html.contains("#369") || html.contains("#336699"), "{html}");
    }

    #[test]
    fn syntax_error_is_sass_error() {
        let site = TestSite::new();
        let path = site.write("broken.scss", ".a { color: $undefined; }");

        let result = site.kit().sass().import(&path);
        assert!(matches!(result, Err(Error::Sass { .. })));
    }

    #[test]
    fn import_once_uses_sass_prefix() {
        let site = TestSite::new();
        let path = site.write("main.scss", ".a { color: red; }");
        let kit = site.kit();
        let mut pass = RenderPass::new();

        kit.sass().import_once(&mut pass, &path).unwrap();
        assert!(pass.contains(ImportKind::Sass, &path.to_string_lossy()));
        assert!(!pass.contains(ImportKind::Css, &path.to_string_lossy()));
    }
}
