//! Content-hash caching.
//!
//! Every importer memoizes its expensive step (prefixing, SASS compilation,
//! SVG optimization, font CSS downloads) so repeated builds only pay for
//! inputs that actually changed.
//!
//! ## Cache keys
//!
//! The disk cache is **content-addressed**: entries are named after a SHA-256
//! of the input content, combined with a hash of every parameter that affects
//! the output. Content-based rather than mtime-based so it survives
//! `git checkout` (which resets modification times), and parameter-aware so
//! a config change (browserslist targets, SVG options) invalidates the entry.
//!
//! ## Storage
//!
//! ```text
//! cache/
//! ├── css/<hash>.css      # Prefixed CSS and compiled SASS
//! ├── svg/<hash>.svg      # Optimized inline SVG
//! └── fonts/<hash>.css    # Google Fonts <link>+<style> fragments
//! ```
//!
//! Downloaded external CSS/JS only lives in the [`MemoryCache`], an LRU
//! bounded by total bytes, for the lifetime of one toolkit instance.

mod disk;
mod memory;

pub use disk::{CacheReport, DiskCache, NamespaceReport, clean_cache_dir, scan_cache_dir};
pub use memory::MemoryCache;

use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

/// SHA-256 of a byte slice, returned as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of a string, returned as a hex string.
pub fn hash_str(value: &str) -> String {
    hash_bytes(value.as_bytes())
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

/// SHA-256 of an operation's parameters.
///
/// The namespace tag and every part are NUL-terminated so `["ab", "c"]` and
/// `["a", "bc"]` hash differently.
pub fn hash_params<S: AsRef<str>>(namespace: &str, parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b"\0");
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

/// Combine a content hash with a parameter hash into a single cache key.
pub fn cache_key(content_hash: &str, params_hash: &str) -> String {
    hash_str(&format!("{content_hash}:{params_hash}"))
}

/// Hit/miss counters, shared across threads.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU32,
    misses: AtomicU32,
}

impl CacheStats {
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u32 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u32 {
        self.hits() + self.misses()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits() > 0 {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.hits(),
                self.misses(),
                self.total()
            )
        } else {
            write!(f, "{} generated", self.misses())
        }
    }
}
