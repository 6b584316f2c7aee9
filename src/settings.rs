//! Toolkit settings.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a user `config.toml` in the project root; only the keys that
//! differ need to be written.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! webroot = "public"        # Published site root (relative to the project root)
//! cache_dir = "cache"       # Content-hash cache directory
//!
//! [images]
//! quality = 65              # Lossy encoding quality (1-100)
//! extensions = ["jpg", "webp"]
//!
//! [css]
//! browserslist = ["> 0.01%"] # Used when no .browserslistrc exists
//!
//! [memory_cache]
//! max_bytes = 104857600     # Budget for downloaded CSS/JS (100 MiB)
//!
//! [http]
//! timeout_secs = 30
//! user_agent = "Mozilla/5.0 ..."
//!
//! [processing]
//! max_processes = 4         # Max parallel encoders (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional browserslist file read from the project root.
pub const BROWSERSLIST_FILE: &str = ".browserslistrc";

/// Output formats the imaging backend can encode.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings shared by every importer.
///
/// `webroot` and `cache_dir` are resolved against the project root by
/// [`load_config`]; a `Settings` built in code uses them as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Published site root. Generated images and manifests land under it.
    pub webroot: PathBuf,
    /// Root of the content-hash disk cache.
    pub cache_dir: PathBuf,
    pub images: ImagesConfig,
    pub css: CssConfig,
    pub memory_cache: MemoryCacheConfig,
    pub http: HttpConfig,
    pub processing: ProcessingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webroot: PathBuf::from("public"),
            cache_dir: PathBuf::from("cache"),
            images: ImagesConfig::default(),
            css: CssConfig::default(),
            memory_cache: MemoryCacheConfig::default(),
            http: HttpConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl Settings {
    /// Settings rooted at `webroot` and `cache_dir`, everything else stock.
    pub fn new(webroot: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            webroot: webroot.into(),
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "images.extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self
            .images
            .extensions
            .iter()
            .find(|ext| !is_supported_extension(ext))
        {
            return Err(ConfigError::Validation(format!(
                "images.extensions: unsupported format '{ext}' (expected one of {})",
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }
        if self.memory_cache.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "memory_cache.max_bytes must be greater than 0".into(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Absolute webroot (falls back to the configured path if it cannot be resolved).
    pub fn webroot_abs(&self) -> PathBuf {
        absolutize(&self.webroot)
    }

    /// Directory for generated resources: `<webroot>/res`.
    pub fn res_dir(&self) -> PathBuf {
        self.webroot_abs().join("res")
    }
}

/// Check an output extension against the formats the backend can write.
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(ext))
}

/// Resolve a path against the current directory without touching the filesystem.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Responsive image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Output formats generated for every breakpoint.
    pub extensions: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: 65,
            extensions: vec!["jpg".to_string(), "webp".to_string()],
        }
    }
}

/// CSS prefixing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CssConfig {
    /// Browserslist queries, used when the project has no `.browserslistrc`.
    pub browserslist: Vec<String>,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            browserslist: vec!["> 0.01%".to_string()],
        }
    }
}

/// In-process cache for downloaded resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryCacheConfig {
    /// Total size budget in bytes, measured as the length of the cached HTML.
    pub max_bytes: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
        }
    }
}

/// HTTP client settings for external CSS/JS and Google Fonts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Google Fonts serves woff2 only to user agents it recognises as modern.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36"
        .to_string()
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image encoders.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load settings for the project rooted at `root`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// validates the result and resolves `webroot`/`cache_dir` against `root`.
pub fn load_config(root: &Path) -> Result<Settings, ConfigError> {
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let mut settings: Settings = merged.try_into()?;
    settings.validate()?;
    settings.webroot = root.join(&settings.webroot);
    settings.cache_dir = root.join(&settings.cache_dir);
    Ok(settings)
}

/// Browserslist queries for the project rooted at `root`.
///
/// `.browserslistrc` wins over `css.browserslist`. Blank lines and `#`
/// comments are ignored; an empty file falls back to the configured list.
pub fn browserslist_queries(root: &Path, css: &CssConfig) -> Vec<String> {
    let from_file: Vec<String> = fs::read_to_string(root.join(BROWSERSLIST_FILE))
        .map(|content| {
            content
                .lines()
                .map(|line| line.split('#').next().unwrap_or("").trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if from_file.is_empty() {
        css.browserslist.clone()
    } else {
        from_file
    }
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# static-page-utils configuration
# ===============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Published site root, relative to the project root. Processed images go to
# <webroot>/res, the PWA manifest and service worker to <webroot>.
webroot = "public"

# Content-hash cache directory, relative to the project root.
cache_dir = "cache"

# ---------------------------------------------------------------------------
# Responsive images
# ---------------------------------------------------------------------------
[images]
# Lossy encoding quality (1 = worst, 100 = best).
quality = 65

# Output formats generated for every breakpoint: jpg, png, webp, avif.
extensions = ["jpg", "webp"]

# ---------------------------------------------------------------------------
# CSS prefixing
# ---------------------------------------------------------------------------
[css]
# Browserslist queries. A .browserslistrc file in the project root wins.
browserslist = ["> 0.01%"]

# ---------------------------------------------------------------------------
# Downloaded CSS/JS
# ---------------------------------------------------------------------------
[memory_cache]
# In-memory budget for downloaded resources, in bytes (100 MiB).
max_bytes = 104857600

[http]
timeout_secs = 30
user_agent = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image encoders.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings_values() {
        let s = Settings::default();
        assert_eq!(s.webroot, PathBuf::from("public"));
        assert_eq!(s.cache_dir, PathBuf::from("cache"));
        assert_eq!(s.images.quality, 65);
        assert_eq!(s.images.extensions, vec!["jpg", "webp"]);
        assert_eq!(s.css.browserslist, vec!["> 0.01%"]);
        assert_eq!(s.memory_cache.max_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn validate_default_settings_passes() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_zero() {
        let mut s = Settings::default();
        s.images.quality = 0;
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_quality_too_high() {
        let mut s = Settings::default();
        s.images.quality = 101;
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_unknown_extension() {
        let mut s = Settings::default();
        s.images.extensions = vec!["jpg".into(), "bmp".into()];
        let err = s.validate().unwrap_err().to_string();
        assert!(err.contains("bmp"));
    }

    #[test]
    fn validate_empty_extensions() {
        let mut s = Settings::default();
        s.images.extensions.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_zero_memory_budget() {
        let mut s = Settings::default();
        s.memory_cache.max_bytes = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn extensions_are_case_insensitive() {
        assert!(is_supported_extension("JPG"));
        assert!(is_supported_extension("webp"));
        assert!(!is_supported_extension("gif"));
    }

    #[test]
    fn load_config_returns_defaults_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let s = load_config(tmp.path()).unwrap();
        assert_eq!(s.webroot, tmp.path().join("public"));
        assert_eq!(s.cache_dir, tmp.path().join("cache"));
        assert_eq!(s.images.quality, 65);
    }

    #[test]
    fn load_config_merges_partial_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
webroot = "dist"

[images]
quality = 80
"#,
        )
        .unwrap();

        let s = load_config(tmp.path()).unwrap();
        assert_eq!(s.webroot, tmp.path().join("dist"));
        assert_eq!(s.images.quality, 80);
        // Untouched keys keep their defaults
        assert_eq!(s.images.extensions, vec!["jpg", "webp"]);
        assert_eq!(s.http.timeout_secs, 30);
    }

    #[test]
    fn load_config_rejects_unknown_key() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[images]\nqualty = 80\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "webroot = [").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[images]\nquality = 150\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\nz = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        let a = merged.get("a").unwrap();
        assert_eq!(a.get("x").unwrap().as_integer(), Some(1));
        assert_eq!(a.get("y").unwrap().as_integer(), Some(3));
        assert_eq!(a.get("z").unwrap().as_integer(), Some(4));
    }

    #[test]
    fn merge_toml_array_replaces() {
        let base: toml::Value = toml::from_str("list = [1, 2]").unwrap();
        let overlay: toml::Value = toml::from_str("list = [3]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("list").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn browserslist_file_wins() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(BROWSERSLIST_FILE),
            "# targets\nlast 2 versions\n\nnot dead # keep\n",
        )
        .unwrap();
        let queries = browserslist_queries(tmp.path(), &CssConfig::default());
        assert_eq!(queries, vec!["last 2 versions", "not dead"]);
    }

    #[test]
    fn browserslist_falls_back_to_config() {
        let tmp = TempDir::new().unwrap();
        let queries = browserslist_queries(tmp.path(), &CssConfig::default());
        assert_eq!(queries, vec!["> 0.01%"]);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(10_000),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let parsed: Settings = value.try_into().unwrap();
        let defaults = Settings::default();
        assert_eq!(parsed.webroot, defaults.webroot);
        assert_eq!(parsed.images.quality, defaults.images.quality);
        assert_eq!(parsed.images.extensions, defaults.images.extensions);
        assert_eq!(parsed.memory_cache.max_bytes, defaults.memory_cache.max_bytes);
        assert_eq!(parsed.http.user_agent, defaults.http.user_agent);
    }
}
