use super::CacheStats;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

/// File-per-entry cache rooted at the configured cache directory.
///
/// Entries live at `<root>/<namespace>/<key>.<ext>`. Each write goes through
/// its own temporary sibling and a rename, so concurrent readers and writers
/// never observe a half-written entry.
#[derive(Debug)]
pub struct DiskCache {
    root: PathBuf,
    stats: CacheStats,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stats: CacheStats::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Location of an entry, whether or not it exists.
    pub fn path(&self, namespace: &str, key: &str, ext: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{key}.{ext}"))
    }

    /// Read an entry. Missing or unreadable entries are a miss.
    pub fn get(&self, namespace: &str, key: &str, ext: &str) -> Option<String> {
        fs::read_to_string(self.path(namespace, key, ext)).ok()
    }

    /// Store an entry, creating the namespace directory as needed.
    pub fn put(&self, namespace: &str, key: &str, ext: &str, content: &str) -> io::Result<PathBuf> {
        let path = self.path(namespace, key, ext);
        if let Some(dir) = path.parent()
            && !dir.exists()
        {
            fs::create_dir_all(dir)?;
            debug!("Created cache directory: {}", dir.display());
        }
        let dir = path.parent().unwrap_or(self.root.as_path());
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }

    /// Return the cached entry, or run `compute`, store its output and return it.
    ///
    /// A failing `compute` leaves the cache untouched.
    pub fn memoize<E, F>(&self, namespace: &str, key: &str, ext: &str, compute: F) -> Result<String, E>
    where
        E: From<io::Error>,
        F: FnOnce() -> Result<String, E>,
    {
        if let Some(cached) = self.get(namespace, key, ext) {
            self.stats.hit();
            debug!("Cache hit: {namespace}/{key}.{ext}");
            return Ok(cached);
        }
        self.stats.miss();
        let content = compute()?;
        self.put(namespace, key, ext, &content)?;
        Ok(content)
    }
}

/// Per-namespace totals for one cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceReport {
    pub files: u64,
    pub bytes: u64,
}

/// Summary of a cache directory, keyed by namespace (first path component).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheReport {
    pub namespaces: BTreeMap<String, NamespaceReport>,
}

impl CacheReport {
    pub fn total_files(&self) -> u64 {
        self.namespaces.values().map(|n| n.files).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.namespaces.values().map(|n| n.bytes).sum()
    }
}

/// Walk a cache directory and count entries per namespace.
///
/// A missing directory yields an empty report.
pub fn scan_cache_dir(root: &Path) -> io::Result<CacheReport> {
    let mut report = CacheReport::default();
    if !root.exists() {
        return Ok(report);
    }
    for entry in WalkDir::new(root).min_depth(2) {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let namespace = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(|rel| rel.components().next())
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .unwrap_or_default();
        let bytes = entry.metadata().map_err(io::Error::other)?.len();
        let ns = report.namespaces.entry(namespace).or_default();
        ns.files += 1;
        ns.bytes += bytes;
    }
    Ok(report)
}

/// Delete a cache directory. Returns `false` if there was nothing to delete.
pub fn clean_cache_dir(root: &Path) -> io::Result<bool> {
    if !root.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(root)?;
    debug!("Removed cache directory: {}", root.display());
    Ok(true)
}
