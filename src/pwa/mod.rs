//! Progressive web app support: manifest, icons and service worker.
//!
//! ## Output Structure
//!
//! ```text
//! <webroot>/
//! ├── manifest.json
//! ├── service-worker.js
//! └── res/pwa/
//!     ├── icon.svg
//!     ├── icon-16x16.png ... icon-512x512.png
//!     ├── maskable-icon.svg
//!     └── maskable-icon-16x16.png ... maskable-icon-512x512.png
//! ```

mod manifest;

pub use manifest::{
    DisplayMode, ManifestIcon, Orientation, Platform, ProtocolHandler, PwaIcons, PwaManifest,
    RelatedApplication, Shortcut, TextDirection, manifest_json,
};

use crate::error::Result;
use crate::imaging::{Quality, scale_images};
use crate::img::mime_type;
use crate::shell::PageShell;
use crate::svg::dimensions;
use crate::toolkit::{StaticPageUtils, resolve_source};
use maud::html;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Square sizes every PNG icon is scaled to.
pub const ICON_SIZES: [u32; 10] = [16, 32, 72, 96, 128, 144, 152, 192, 384, 512];
const ICON_QUALITY: u32 = 90;
const MASKABLE: &str = "any maskable";

const SERVICE_WORKER_FILE: &str = "service-worker.js";

/// PWA handle, see [`StaticPageUtils::pwa`].
pub struct Pwa<'a> {
    pub(crate) kit: &'a StaticPageUtils,
}

impl Pwa<'_> {
    /// Write `<webroot>/manifest.json` and its icons, and link them from `page`.
    ///
    /// Returns the manifest as written.
    pub fn create_manifest(&self, manifest: &PwaManifest, page: &mut PageShell<'_>) -> Result<Value> {
        debug!("Creating PWA Manifest");
        let webroot = self.kit.settings.webroot_abs();
        let pwa_dir = self.kit.settings.res_dir().join("pwa");
        self.kit.ensure_dir(&pwa_dir)?;

        let mut icons = Vec::new();
        if let Some(svg) = &manifest.icon.svg {
            icons.push(self.copy_svg_icon(svg, &pwa_dir, "icon", None)?);
        }
        if let Some(svg) = &manifest.icon.maskable_svg {
            icons.push(self.copy_svg_icon(svg, &pwa_dir, "maskable-icon", Some(MASKABLE))?);
        }
        if let Some(png) = &manifest.icon.png {
            let ext = self.scale_icon(png, &pwa_dir, "icon")?;
            icons.extend(raster_icons("icon", &ext, None));
            page.append_to_head(&favicon_links(&ext));
        }
        if let Some(png) = &manifest.icon.maskable_png {
            let ext = self.scale_icon(png, &pwa_dir, "maskable-icon")?;
            icons.extend(raster_icons("maskable-icon", &ext, Some(MASKABLE)));
        }

        if let Some(colour) = &manifest.theme_colour {
            let metas = html! {
                meta name="theme-color" content=(colour);
                meta name="apple-mobile-web-app-status-bar" content=(colour);
            };
            page.append_to_head(&metas.into_string());
        }

        let json = manifest_json(manifest, &icons);
        fs::write(webroot.join("manifest.json"), serde_json::to_string(&json)?)?;
        page.append_to_head(&html! { link rel="manifest" href="/manifest.json"; }.into_string());
        Ok(json)
    }

    /// Copy a service worker to `<webroot>/service-worker.js` and return the
    /// script that registers it.
    pub fn import_service_worker(&self, path: impl AsRef<Path>) -> Result<String> {
        let source = resolve_source(path.as_ref())?;
        let webroot = self.kit.settings.webroot_abs();
        self.kit.ensure_dir(&webroot)?;
        fs::copy(&source, webroot.join(SERVICE_WORKER_FILE))?;
        debug!("Copied service worker: {}", source.display());

        let register = format!(
            "if ('serviceWorker' in navigator) {{ navigator.serviceWorker.register('/{SERVICE_WORKER_FILE}') }}"
        );
        Ok(crate::js::script_block(&register))
    }

    fn copy_svg_icon(
        &self,
        source: &Path,
        pwa_dir: &Path,
        name: &str,
        purpose: Option<&str>,
    ) -> Result<ManifestIcon> {
        let source = resolve_source(source)?;
        let svg = fs::read_to_string(&source)?;
        let sizes = dimensions(&svg)
            .map(|(w, h)| format!("{w}x{h}"))
            .unwrap_or_else(|| "any".to_string());
        fs::copy(&source, pwa_dir.join(format!("{name}.svg")))?;

        Ok(ManifestIcon {
            src: format!("/res/pwa/{name}.svg"),
            sizes,
            mime: mime_type("svg").to_string(),
            purpose: purpose.map(str::to_string),
        })
    }

    /// Scale a raster icon to every [`ICON_SIZES`] square; returns the output extension.
    fn scale_icon(&self, source: &Path, pwa_dir: &Path, name: &str) -> Result<String> {
        let source = resolve_source(source)?;
        let dims: Vec<(u32, u32)> = ICON_SIZES.iter().map(|&s| (s, s)).collect();
        scale_images(
            self.kit.backend.as_ref(),
            &source,
            &dims,
            Quality::new(ICON_QUALITY),
            pwa_dir,
            name,
        )?;
        Ok(source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png")
            .to_string())
    }
}

fn raster_icons(name: &str, ext: &str, purpose: Option<&str>) -> Vec<ManifestIcon> {
    ICON_SIZES
        .iter()
        .map(|size| ManifestIcon {
            src: format!("/res/pwa/{name}-{size}x{size}.{ext}"),
            sizes: format!("{size}x{size}"),
            mime: mime_type(ext).to_string(),
            purpose: purpose.map(str::to_string),
        })
        .collect()
}

/// Favicon and apple-touch-icon links for the scaled `icon-*` set.
fn favicon_links(ext: &str) -> String {
    let mime = mime_type(ext);
    let href = |size: u32| format!("/res/pwa/icon-{size}x{size}.{ext}");
    html! {
        @for size in [16u32, 32, 96] {
            link rel="icon" type=(mime) href=(href(size)) sizes=(format!("{size}x{size}"));
        }
        link rel="apple-touch-icon" type=(mime) href=(href(192)) sizes="192x192";
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::shell::PageShellOptions;
    use crate::test_helpers::TestSite;
    use std::sync::Arc;

    fn named(name: &str) -> PwaManifest {
        PwaManifest {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn writes_manifest_and_links_it() {
        let site = TestSite::new();
        let kit = site.kit();
        let mut page = kit.shell(PageShellOptions::default());

        kit.pwa().create_manifest(&named("Notes"), &mut page).unwrap();

        let written = fs::read_to_string(site.webroot().join("manifest.json")).unwrap();
        assert_eq!(written, r#"{"name":"Notes"}"#);
        assert!(page.head().ends_with(r#"<link rel="manifest" href="/manifest.json">"#));
    }

    #[test]
    fn svg_icons_are_copied_with_sizes() {
        let site = TestSite::new();
        let icon = site.write("icon.svg", r#"<svg viewBox="0 0 512 512"/>"#);
        let mask = site.write("mask.svg", "<svg/>");
        let kit = site.kit();
        let mut page = kit.shell(PageShellOptions::default());
        let manifest = PwaManifest {
            icon: PwaIcons {
                svg: Some(icon),
                maskable_svg: Some(mask),
                ..Default::default()
            },
            ..named("App")
        };

        let json = kit.pwa().create_manifest(&manifest, &mut page).unwrap();

        assert_eq!(json["icons"][0]["src"], "/res/pwa/icon.svg");
        assert_eq!(json["icons"][0]["sizes"], "512x512");
        assert_eq!(json["icons"][0]["type"], "image/svg+xml");
        assert_eq!(json["icons"][1]["sizes"], "any");
        assert_eq!(json["icons"][1]["purpose"], "any maskable");
        assert!(site.webroot().join("res/pwa/icon.svg").exists());
        assert!(site.webroot().join("res/pwa/maskable-icon.svg").exists());
    }

    #[test]
    fn png_icon_is_scaled_to_every_size() {
        let site = TestSite::new();
        let png = site.write("icon.png", "pixels");
        let backend = Arc::new(MockBackend::touching(Dimensions {
            width: 1024,
            height: 1024,
        }));
        let kit = site.kit().with_backend(backend.clone());
        let mut page = kit.shell(PageShellOptions::default());
        let manifest = PwaManifest {
            icon: PwaIcons {
                png: Some(png),
                ..Default::default()
            },
            ..named("App")
        };

        let json = kit.pwa().create_manifest(&manifest, &mut page).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), ICON_SIZES.len());
        assert!(ops.iter().any(|op| matches!(
            op,
            RecordedOp::Resize { width: 192, height: 192, quality: 90, .. }
        )));
        let icons = json["icons"].as_array().unwrap();
        assert_eq!(icons.len(), ICON_SIZES.len());
        assert_eq!(icons[9]["src"], "/res/pwa/icon-512x512.png");
        assert_eq!(icons[9]["type"], "image/png");

        let head = page.head();
        assert!(head.contains(
            r#"<link rel="icon" type="image/png" href="/res/pwa/icon-32x32.png" sizes="32x32">"#
        ));
        assert!(head.contains(
            r#"<link rel="apple-touch-icon" type="image/png" href="/res/pwa/icon-192x192.png" sizes="192x192">"#
        ));
    }

    #[test]
    fn maskable_png_gets_purpose_and_no_favicons() {
        let site = TestSite::new();
        let png = site.write("mask.png", "pixels");
        let backend = Arc::new(MockBackend::touching(Dimensions {
            width: 512,
            height: 512,
        }));
        let kit = site.kit().with_backend(backend);
        let mut page = kit.shell(PageShellOptions::default());
        let manifest = PwaManifest {
            icon: PwaIcons {
                maskable_png: Some(png),
                ..Default::default()
            },
            ..named("App")
        };

        let json = kit.pwa().create_manifest(&manifest, &mut page).unwrap();

        assert_eq!(json["icons"][0]["src"], "/res/pwa/maskable-icon-16x16.png");
        assert_eq!(json["icons"][0]["purpose"], "any maskable");
        assert!(!page.head().contains("rel=\"icon\""));
    }

    #[test]
    fn theme_colour_adds_meta_tags() {
        let site = TestSite::new();
        let kit = site.kit();
        let mut page = kit.shell(PageShellOptions::default());
        let manifest = PwaManifest {
            theme_colour: Some("#336699".into()),
            ..named("App")
        };

        let json = kit.pwa().create_manifest(&manifest, &mut page).unwrap();

        assert_eq!(json["theme_color"], "#336699");
        assert!(page.head().contains(r##"<meta name="theme-color" content="#336699">"##));
    }

    #[test]
    fn service_worker_is_copied_and_registered() {
        let site = TestSite::new();
        let sw = site.write("sw.js", "self.addEventListener('fetch', () => {});");
        let kit = site.kit();

        let script = kit.pwa().import_service_worker(&sw).unwrap();

        assert_eq!(
            fs::read_to_string(site.webroot().join("service-worker.js")).unwrap(),
            "self.addEventListener('fetch', () => {});"
        );
        assert!(script.starts_with("<script>"));
        assert!(script.contains("navigator.serviceWorker.register('/service-worker.js')"));
    }
}
