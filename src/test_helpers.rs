//! Shared test utilities.
//!
//! [`TestSite`] is a throwaway project directory with a `public/` webroot and
//! a `cache/` directory, plus a toolkit wired to mock imaging and HTTP so
//! tests never encode real images or touch the network.
//!
//! ```rust,ignore
//! let site = TestSite::new();
//! let path = site.write("styles/main.css", "a { color: red }");
//! let html = site.kit().css().import(&path).unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::fetch::tests::MockFetcher;
use crate::imaging::backend::tests::MockBackend;
use crate::settings::Settings;
use crate::toolkit::StaticPageUtils;

pub struct TestSite {
    tmp: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn webroot(&self) -> PathBuf {
        self.root().join("public")
    }

    /// Write a file relative to the site root and return its absolute path.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Toolkit for this site with mock imaging and HTTP.
    ///
    /// Targets are pinned so prefixing output does not depend on a
    /// `.browserslistrc` in the working directory.
    pub fn kit(&self) -> StaticPageUtils {
        let settings = Settings::new(self.webroot(), self.root().join("cache"));
        StaticPageUtils::new(settings)
            .unwrap()
            .with_browserslist(vec!["> 0.01%".to_string()])
            .unwrap()
            .with_backend(Arc::new(MockBackend::new()))
            .with_fetcher(Arc::new(MockFetcher::new()))
    }
}

/// Write a real image whose format follows the path's extension.
pub fn write_test_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128])
    });
    img.save(path).unwrap();
}
