//! Responsive raster images.
//!
//! Every imported image is rendered at each of the standard widths
//! ([`STANDARD_WIDTHS`]) scaled by the width ratio, in every configured
//! format. The returned `<picture>` has one `<source>` per breakpoint and
//! format; each source's `srcset` lists the renders for 1x through 3x
//! displays as given by [`IMAGE_SCALES`].
//!
//! ## Output Structure
//!
//! ```text
//! <webroot>/res/
//! ├── 3f2a…c9-1-640.webp        # sha256(absolute source path)-ratio-width.ext
//! ├── 3f2a…c9-1-640.jpg
//! ├── 3f2a…c9-1-960.webp
//! └── ...
//! ```
//!
//! Files are named after the source *path*, not its content. An image is
//! considered processed when every width × format file exists; delete the
//! outputs to force a re-render after editing a source in place.

use crate::cache::hash_str;
use crate::error::{Error, Result};
use crate::imaging::calculations::format_ratio;
use crate::imaging::{
    BackendError, CompressRequest, DENSITIES, IMAGE_SCALES, Quality, STANDARD_WIDTHS,
    compress_image, resolve_ratios,
};
use crate::toolkit::{StaticPageUtils, resolve_source};
use maud::{Markup, html};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `cache-age` query parameter appended to every image URL (one week).
pub const CACHE_AGE_SECS: u32 = 604_800;

/// Options for [`Img::import`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportImageOptions {
    /// Fraction of the viewport width the image occupies (default 1).
    pub width_ratio: Option<f64>,
    /// Fraction of the viewport height; derives the width ratio when that is absent.
    pub height_ratio: Option<f64>,
    /// Overrides `images.quality`.
    pub quality: Option<u32>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub alt: String,
    /// Overrides `images.extensions`.
    pub extensions: Option<Vec<String>>,
    /// Cover and crop to the exact box instead of shrinking to fit.
    pub force_size: bool,
}

/// MIME type for an image file extension.
pub fn mime_type(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Lowercase and dedupe requested formats, keeping first-seen order.
fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let ext = ext.to_ascii_lowercase();
        if !normalized.contains(&ext) {
            normalized.push(ext);
        }
    }
    normalized
}

/// Order formats so browsers see the smallest candidates first.
fn modern_first(extensions: &[String]) -> Vec<String> {
    let rank = |ext: &str| match ext {
        "avif" => 0,
        "webp" => 1,
        _ => 2,
    };
    let mut ordered = normalize_extensions(extensions);
    ordered.sort_by_key(|ext| rank(ext));
    ordered
}

/// Format for the `<img>` fallback: the first universally supported one.
fn fallback_extension(ordered: &[String]) -> &str {
    ordered
        .iter()
        .find(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png"))
        .or(ordered.last())
        .map(String::as_str)
        .unwrap_or("jpg")
}

/// Public URL of one render.
pub fn image_url(name: &str, width: u32, ext: &str) -> String {
    format!("/res/{name}-{width}.{ext}?cache-age={CACHE_AGE_SECS}")
}

fn srcset(name: &str, ext: &str, scales: &[u32; 5]) -> String {
    scales
        .iter()
        .zip(DENSITIES)
        .map(|(width, density)| format!("{} {density}", image_url(name, *width, ext)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The `<picture>` element for a processed image.
pub fn render_picture(name: &str, extensions: &[String], options: &ImportImageOptions) -> Markup {
    let ordered = modern_first(extensions);
    let fallback = image_url(name, STANDARD_WIDTHS[0], fallback_extension(&ordered));
    let class = (!options.classes.is_empty()).then(|| options.classes.join(" "));

    html! {
        picture {
            @for (breakpoint, scales) in IMAGE_SCALES {
                @for ext in &ordered {
                    source type=(mime_type(ext))
                        media=(format!("(max-width: {breakpoint}px)"))
                        srcset=(srcset(name, ext, &scales));
                }
            }
            img src=(fallback) alt=(options.alt) id=[options.id.as_deref()] class=[class];
        }
    }
}

/// Output path without extension for one standard width.
fn output_stem(res_dir: &Path, name: &str, width: u32) -> PathBuf {
    res_dir.join(format!("{name}-{width}"))
}

fn is_processed(res_dir: &Path, name: &str, extensions: &[String]) -> bool {
    STANDARD_WIDTHS.iter().all(|&width| {
        extensions.iter().all(|ext| {
            let mut path = output_stem(res_dir, name, width).into_os_string();
            path.push(format!(".{ext}"));
            Path::new(&path).exists()
        })
    })
}

/// Image importer handle, see [`StaticPageUtils::img`].
pub struct Img<'a> {
    pub(crate) kit: &'a StaticPageUtils,
}

impl Img<'_> {
    /// Render a responsive image set and return its `<picture>` element.
    pub fn import(&self, path: impl AsRef<Path>, options: &ImportImageOptions) -> Result<String> {
        let settings = &self.kit.settings;
        let source = resolve_source(path.as_ref())?;
        debug!("Importing image: {}", source.display());

        let extensions = normalize_extensions(
            options
                .extensions
                .as_deref()
                .unwrap_or(&settings.images.extensions),
        );
        if extensions.is_empty() {
            return Err(Error::Imaging(BackendError::ProcessingFailed(
                "no output formats requested".to_string(),
            )));
        }
        let quality = Quality::new(options.quality.unwrap_or(settings.images.quality));

        let aspect = self.kit.backend.identify(&source)?.aspect();
        let (width_ratio, _) = resolve_ratios(options.width_ratio, options.height_ratio, aspect);
        let name = format!(
            "{}-{}",
            hash_str(&source.to_string_lossy()),
            format_ratio(width_ratio)
        );

        let res_dir = settings.res_dir();
        self.kit.ensure_dir(&res_dir)?;

        if is_processed(&res_dir, &name, &extensions) {
            debug!("Images already processed: {}", source.display());
        } else {
            let backend = self.kit.backend.as_ref();
            STANDARD_WIDTHS.par_iter().try_for_each(|&width| {
                let stem = output_stem(&res_dir, &name, width);
                compress_image(
                    backend,
                    &CompressRequest {
                        source: &source,
                        output_stem: &stem,
                        width: f64::from(width) * width_ratio,
                        aspect,
                        quality,
                        force_size: options.force_size,
                        extensions: &extensions,
                    },
                )
                .map(|_| ())
            })?;
        }

        Ok(render_picture(&name, &extensions, options).into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::TestSite;
    use std::sync::Arc;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn landscape() -> Arc<MockBackend> {
        Arc::new(MockBackend::touching(Dimensions {
            width: 3000,
            height: 2000,
        }))
    }

    #[test]
    fn mime_types() {
        assert_eq!(mime_type("jpg"), "image/jpeg");
        assert_eq!(mime_type("JPEG"), "image/jpeg");
        assert_eq!(mime_type("webp"), "image/webp");
        assert_eq!(mime_type("avif"), "image/avif");
        assert_eq!(mime_type("tiff"), "application/octet-stream");
    }

    #[test]
    fn modern_formats_come_first() {
        assert_eq!(
            modern_first(&exts(&["jpg", "webp", "avif", "webp"])),
            exts(&["avif", "webp", "jpg"])
        );
    }

    #[test]
    fn fallback_prefers_jpeg_or_png() {
        assert_eq!(fallback_extension(&exts(&["webp", "png"])), "png");
        assert_eq!(fallback_extension(&exts(&["avif", "webp"])), "webp");
    }

    #[test]
    fn url_format() {
        assert_eq!(
            image_url("abc-1", 640, "jpg"),
            "/res/abc-1-640.jpg?cache-age=604800"
        );
    }

    #[test]
    fn srcset_lists_every_density() {
        let set = srcset("n", "webp", &[640, 960, 1280, 1920, 1920]);
        assert_eq!(
            set,
            "/res/n-640.webp?cache-age=604800 1x, \
             /res/n-960.webp?cache-age=604800 1.5x, \
             /res/n-1280.webp?cache-age=604800 2x, \
             /res/n-1920.webp?cache-age=604800 2.5x, \
             /res/n-1920.webp?cache-age=604800 3x"
        );
    }

    #[test]
    fn picture_has_source_per_breakpoint_and_format() {
        let options = ImportImageOptions {
            alt: "A \"quoted\" cat".into(),
            id: Some("hero".into()),
            classes: vec!["wide".into(), "rounded".into()],
            ..Default::default()
        };
        let html = render_picture("n", &exts(&["jpg", "webp"]), &options).into_string();

        assert_eq!(html.matches("<source").count(), 12);
        let webp_640 = html.find(r#"type="image/webp" media="(max-width: 640px)""#).unwrap();
        let jpg_640 = html.find(r#"type="image/jpeg" media="(max-width: 640px)""#).unwrap();
        let webp_960 = html.find(r#"type="image/webp" media="(max-width: 960px)""#).unwrap();
        assert!(webp_640 < jpg_640 && jpg_640 < webp_960);
        assert!(html.contains(
            r#"<img src="/res/n-640.jpg?cache-age=604800" alt="A &quot;quoted&quot; cat" id="hero" class="wide rounded">"#
        ));
    }

    #[test]
    fn picture_omits_empty_id_and_class() {
        let options = ImportImageOptions {
            alt: "x".into(),
            ..Default::default()
        };
        let html = render_picture("n", &exts(&["jpg"]), &options).into_string();
        assert!(html.contains(r#"<img src="/res/n-640.jpg?cache-age=604800" alt="x">"#));
    }

    #[test]
    fn import_renders_every_width_and_format() {
        let site = TestSite::new();
        let source = site.write("photo.jpg", "pixels");
        let backend = landscape();
        let kit = site.kit().with_backend(backend.clone());

        let html = kit
            .img()
            .import(&source, &ImportImageOptions::default())
            .unwrap();

        let ops = backend.get_operations();
        let resizes: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Resize {
                    output,
                    width,
                    height,
                    quality,
                    ..
                } => Some((output.clone(), *width, *height, *quality)),
                _ => None,
            })
            .collect();
        assert_eq!(resizes.len(), STANDARD_WIDTHS.len() * 2);

        let name = format!("{}-1", hash_str(&source.to_string_lossy()));
        let res = site.webroot().join("res");
        let expected = res.join(format!("{name}-1920.webp")).to_string_lossy().to_string();
        assert!(resizes.contains(&(expected, 1920, 1280, 65)));
        assert!(html.contains(&format!("/res/{name}-640.jpg?cache-age=604800")));
    }

    #[test]
    fn import_scales_widths_by_ratio() {
        let site = TestSite::new();
        let source = site.write("photo.jpg", "pixels");
        let backend = landscape();
        let kit = site.kit().with_backend(backend.clone());
        let options = ImportImageOptions {
            width_ratio: Some(0.5),
            extensions: Some(exts(&["jpg"])),
            quality: Some(80),
            ..Default::default()
        };

        kit.img().import(&source, &options).unwrap();

        let name = format!("{}-0.5", hash_str(&source.to_string_lossy()));
        let out = site.webroot().join("res").join(format!("{name}-640.jpg"));
        assert!(backend.get_operations().contains(&RecordedOp::Resize {
            source: source.to_string_lossy().to_string(),
            output: out.to_string_lossy().to_string(),
            width: 320,
            height: 213,
            quality: 80,
        }));
    }

    #[test]
    fn import_skips_processed_images() {
        let site = TestSite::new();
        let source = site.write("photo.jpg", "pixels");
        let backend = landscape();
        let kit = site.kit().with_backend(backend.clone());
        let options = ImportImageOptions::default();

        let first = kit.img().import(&source, &options).unwrap();
        let encodes_after_first = backend.get_operations().len();
        let second = kit.img().import(&source, &options).unwrap();

        assert_eq!(first, second);
        // Only the identify call is repeated.
        assert_eq!(backend.get_operations().len(), encodes_after_first + 1);
    }

    #[test]
    fn force_size_uses_fill() {
        let site = TestSite::new();
        let source = site.write("photo.jpg", "pixels");
        let backend = landscape();
        let kit = site.kit().with_backend(backend.clone());
        let options = ImportImageOptions {
            force_size: true,
            extensions: Some(exts(&["jpg"])),
            ..Default::default()
        };

        kit.img().import(&source, &options).unwrap();
        assert!(
            backend
                .get_operations()
                .iter()
                .all(|op| !matches!(op, RecordedOp::Resize { .. }))
        );
    }

    #[test]
    fn import_writes_lowercase_files_matching_urls() {
        let site = TestSite::new();
        let source = site.write("photo.jpg", "pixels");
        let backend = landscape();
        let kit = site.kit().with_backend(backend.clone());
        let options = ImportImageOptions {
            extensions: Some(exts(&["JPG", "jpg"])),
            ..Default::default()
        };

        let html = kit.img().import(&source, &options).unwrap();

        let name = format!("{}-1", hash_str(&source.to_string_lossy()));
        let res = site.webroot().join("res");
        for width in STANDARD_WIDTHS {
            assert!(res.join(format!("{name}-{width}.jpg")).exists());
        }
        assert_eq!(backend.get_operations().len(), 1 + STANDARD_WIDTHS.len());
        assert!(html.contains(&format!("/res/{name}-640.jpg?cache-age=604800")));
    }

    #[test]
    fn import_missing_source() {
        let site = TestSite::new();
        let result = site
            .kit()
            .img()
            .import(site.root().join("nope.jpg"), &ImportImageOptions::default());
        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }
}
