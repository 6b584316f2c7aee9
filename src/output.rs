//! CLI output formatting.
//!
//! Each command has a `format_*` function returning lines, so output is
//! testable without capturing stdout, and a `print_*` wrapper.
//!
//! ## Cache stats
//!
//! ```text
//! Cache /site/cache
//!     css     12 files   48.2 KiB
//!     fonts    2 files    3.1 KiB
//!     svg      7 files   20.0 KiB
//! 21 files, 71.3 KiB
//! ```
//!
//! ## Page
//!
//! ```text
//! Home → public/index.html
//!     3 imports, 1 skipped as duplicate
//! Cache: 4 cached, 2 generated (6 total)
//! ```

use crate::cache::{CacheReport, CacheStats};
use std::path::Path;

/// Human-readable byte count using binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn plural(n: u64, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Per-namespace lines for `cache stats`.
pub fn format_cache_report(report: &CacheReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!("Cache {}", root.display())];
    if report.namespaces.is_empty() {
        lines.push("    (empty)".to_string());
        return lines;
    }

    let width = report.namespaces.keys().map(String::len).max().unwrap_or(0);
    for (name, ns) in &report.namespaces {
        lines.push(format!(
            "    {name:<width$} {:>9} {:>10}",
            plural(ns.files, "file"),
            format_bytes(ns.bytes)
        ));
    }
    lines.push(format!(
        "{}, {}",
        plural(report.total_files(), "file"),
        format_bytes(report.total_bytes())
    ));
    lines
}

pub fn print_cache_report(report: &CacheReport, root: &Path) {
    for line in format_cache_report(report, root) {
        println!("{line}");
    }
}

/// Summary for `cache clean`.
pub fn format_cache_clean(root: &Path, removed: bool) -> String {
    if removed {
        format!("Removed {}", root.display())
    } else {
        format!("Nothing to clean at {}", root.display())
    }
}

/// Summary for the `page` command.
pub fn format_page_output(
    title: &str,
    output: &Path,
    imports: usize,
    duplicates: usize,
    stats: &CacheStats,
) -> Vec<String> {
    let mut lines = vec![format!("{title} → {}", output.display())];
    let mut detail = plural(imports as u64, "import");
    if duplicates > 0 {
        detail.push_str(&format!(", {duplicates} skipped as duplicate"));
    }
    lines.push(format!("    {detail}"));
    lines.push(format!("Cache: {stats}"));
    lines
}

pub fn print_page_output(
    title: &str,
    output: &Path,
    imports: usize,
    duplicates: usize,
    stats: &CacheStats,
) {
    for line in format_page_output(title, output, imports, duplicates, stats) {
        println!("{line}");
    }
}
