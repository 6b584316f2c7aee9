//! # Static Page Utils
//!
//! Asset-import helpers for static site generators. A page template calls an
//! importer, and the importer returns the HTML fragment to drop into the
//! page: an inline `<style>` or `<script>`, a responsive `<picture>`, an
//! inline `<svg>`, a Google Font block, or a `/res/...` URL. The side effects
//! (resized images, PWA icons, `manifest.json`) land under the webroot.
//!
//! Everything expensive is cached. The disk cache is content-addressed, so a
//! rebuild only pays for inputs that changed. Downloaded CSS/JS lives in a
//! byte-bounded memory LRU for the lifetime of one toolkit.
//!
//! ```text
//! page template ──► StaticPageUtils ──► css / sass / js / img / svg / font / res / pwa
//!                        │                          │
//!                        ├── DiskCache (cache/)     └──► HTML fragment
//!                        ├── MemoryCache (LRU)
//!                        ├── ImageBackend
//!                        └── Fetcher (HTTP)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`toolkit`] | [`StaticPageUtils`] facade owning caches, backend and fetcher |
//! | [`settings`] | `config.toml` loading, merging and validation |
//! | [`cache`] | Content-hash disk cache, memory LRU, hashing helpers |
//! | [`once`] | [`RenderPass`]: import each asset at most once per page |
//! | [`css`] | Local and external CSS with vendor prefixing |
//! | [`sass`] | SCSS compilation followed by prefixing |
//! | [`js`] | Local and external scripts |
//! | [`img`] | Responsive `<picture>` elements |
//! | [`imaging`] | Resize/fill backend and breakpoint calculations |
//! | [`svg`] | SVG optimization, inline and data-URI import |
//! | [`font`] | Google Fonts CSS with optional glyph subsetting |
//! | [`res`] | Publish arbitrary files under `/res` |
//! | [`shell`] | HTML document shell with SEO metadata |
//! | [`pwa`] | Web app manifest, icons and service worker |
//! | [`fetch`] | HTTP client seam |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Handles Borrow the Toolkit
//!
//! Importers are short-lived handles (`kit.css()`, `kit.img()`) borrowing one
//! [`StaticPageUtils`]. Shared state lives in exactly one place and there is
//! no global configuration: two toolkits with different webroots can coexist
//! in one process, which is how the tests run in parallel.
//!
//! ## Maud for Fragments
//!
//! Every fragment is produced with [Maud](https://maud.lambda.xyz/), so
//! attribute values (alt text, titles, URLs) are escaped at the single point
//! where they become HTML.
//!
//! ## Import Once Is Explicit
//!
//! De-duplication state is a [`RenderPass`] value passed by the caller. A
//! page renderer creates one per page; nothing has to be reset between pages.

pub mod cache;
pub mod css;
pub mod error;
pub mod fetch;
pub mod font;
pub mod img;
pub mod imaging;
pub mod js;
pub mod once;
pub mod output;
pub mod pwa;
pub mod res;
pub mod sass;
pub mod settings;
pub mod shell;
pub mod svg;
pub mod toolkit;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{Error, Result};
pub use once::{ImportKind, RenderPass};
pub use settings::Settings;
pub use toolkit::StaticPageUtils;
