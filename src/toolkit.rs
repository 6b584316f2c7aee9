//! The toolkit facade.
//!
//! [`StaticPageUtils`] is assembled once from [`Settings`] and owns everything
//! the importers share: the disk cache, the memory LRU, the CSS prefixer, the
//! image backend and the HTTP fetcher. Each asset kind is reached through a
//! borrowed handle:
//!
//! ```no_run
//! # use static_page_utils::{Settings, StaticPageUtils, RenderPass};
//! # fn main() -> static_page_utils::Result<()> {
//! let kit = StaticPageUtils::new(Settings::new("public", "cache"))?;
//! let mut pass = RenderPass::new();
//! let head = kit.css().import_once(&mut pass, "styles/main.css")?;
//! let again = kit.css().import_once(&mut pass, "styles/main.css")?;
//! assert!(again.is_empty());
//! # let _ = head;
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheStats, DiskCache, MemoryCache};
use crate::css::{Css, CssPrefixer};
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::font::Font;
use crate::imaging::{ImageBackend, RustBackend};
use crate::img::Img;
use crate::js::Js;
use crate::pwa::Pwa;
use crate::res::Res;
use crate::sass::Sass;
use crate::settings::{Settings, absolutize};
use crate::shell::{PageShell, PageShellOptions};
use crate::svg::Svg;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Asset-import toolkit. See the [module docs](self).
pub struct StaticPageUtils {
    pub(crate) settings: Settings,
    pub(crate) disk: DiskCache,
    pub(crate) memory: MemoryCache,
    pub(crate) prefixer: CssPrefixer,
    pub(crate) backend: Arc<dyn ImageBackend>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
}

impl StaticPageUtils {
    /// Build a toolkit with the production image backend and HTTP client,
    /// prefixing CSS for `settings.css.browserslist`.
    pub fn new(settings: Settings) -> Result<Self> {
        let queries = settings.css.browserslist.clone();
        Self::new_with_browserslist(settings, queries)
    }

    /// Like [`new`](Self::new), with explicit browserslist queries, e.g. from
    /// [`browserslist_queries`](crate::settings::browserslist_queries).
    pub fn new_with_browserslist(settings: Settings, queries: Vec<String>) -> Result<Self> {
        settings.validate()?;
        let fetcher = HttpFetcher::new(&settings.http)?;
        Ok(Self {
            disk: DiskCache::new(absolutize(&settings.cache_dir)),
            memory: MemoryCache::new(settings.memory_cache.max_bytes),
            prefixer: CssPrefixer::new(queries)?,
            backend: Arc::new(RustBackend::new()),
            fetcher: Arc::new(fetcher),
            settings,
        })
    }

    /// Replace the image backend.
    pub fn with_backend(mut self, backend: Arc<dyn ImageBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Replace the HTTP fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replace the browserslist queries used for CSS prefixing.
    pub fn with_browserslist(mut self, queries: Vec<String>) -> Result<Self> {
        self.prefixer = CssPrefixer::new(queries)?;
        Ok(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Disk cache hit/miss counters since construction.
    pub fn cache_stats(&self) -> &CacheStats {
        self.disk.stats()
    }

    pub fn css(&self) -> Css<'_> {
        Css { kit: self }
    }

    pub fn sass(&self) -> Sass<'_> {
        Sass { kit: self }
    }

    pub fn js(&self) -> Js<'_> {
        Js { kit: self }
    }

    pub fn img(&self) -> Img<'_> {
        Img { kit: self }
    }

    pub fn svg(&self) -> Svg<'_> {
        Svg { kit: self }
    }

    pub fn font(&self) -> Font<'_> {
        Font { kit: self }
    }

    pub fn res(&self) -> Res<'_> {
        Res { kit: self }
    }

    pub fn pwa(&self) -> Pwa<'_> {
        Pwa { kit: self }
    }

    /// Start a page shell for one document.
    pub fn shell(&self, options: PageShellOptions) -> PageShell<'_> {
        PageShell::new(self, options)
    }

    /// Create `dir` if it is missing, logging the creation.
    pub(crate) fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            debug!("Created directory: {}", dir.display());
        }
        Ok(())
    }
}

/// Absolute path of an existing source file.
pub(crate) fn resolve_source(path: &Path) -> Result<PathBuf> {
    let abs = absolutize(path);
    if !abs.is_file() {
        return Err(Error::SourceNotFound(abs));
    }
    Ok(abs)
}

/// Read an existing source file as UTF-8.
pub(crate) fn read_source(path: &Path) -> Result<(PathBuf, String)> {
    let abs = resolve_source(path)?;
    let content = fs::read_to_string(&abs)?;
    Ok((abs, content))
}
