//! Page shell: the HTML document around a rendered body.
//!
//! Importers return fragments; the shell collects whatever belongs in
//! `<head>` (styles, fonts, manifest links) and before `</body>` (scripts),
//! then renders the full document with title and SEO metadata.

use crate::cache::hash_str;
use crate::error::Result;
use crate::imaging::{CompressRequest, Quality, compress_image};
use crate::toolkit::{StaticPageUtils, resolve_source};
use maud::{DOCTYPE, PreEscaped, html};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_LANG: &str = "en";

/// Social card size (`og:image`).
pub const SEO_IMAGE_WIDTH: u32 = 1200;
pub const SEO_IMAGE_HEIGHT: u32 = 630;
const SEO_IMAGE_ASPECT: f64 = 1.905;
const SEO_IMAGE_QUALITY: u32 = 65;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageShellOptions {
    pub head: Option<String>,
    pub tail: Option<String>,
    pub body_classes: Vec<String>,
}

/// Search and social metadata for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Seo {
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    /// Source image for the social card.
    pub image: Option<PathBuf>,
    /// `og:type`, e.g. `article` or `website`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Absolute site origin prefixed to the card URL, e.g. `https://example.com`.
    pub site_url: Option<String>,
}

/// One HTML document under construction. See [`StaticPageUtils::shell`].
pub struct PageShell<'a> {
    kit: &'a StaticPageUtils,
    options: PageShellOptions,
}

impl<'a> PageShell<'a> {
    pub(crate) fn new(kit: &'a StaticPageUtils, options: PageShellOptions) -> Self {
        Self { kit, options }
    }

    pub fn append_to_head(&mut self, html: &str) {
        self.options.head.get_or_insert_with(String::new).push_str(html);
    }

    pub fn append_to_tail(&mut self, html: &str) {
        self.options.tail.get_or_insert_with(String::new).push_str(html);
    }

    pub fn head(&self) -> &str {
        self.options.head.as_deref().unwrap_or("")
    }

    pub fn tail(&self) -> &str {
        self.options.tail.as_deref().unwrap_or("")
    }

    /// Render the document with the default language.
    pub fn render(&self, title: &str, body: &str, seo: &Seo) -> Result<String> {
        self.render_lang(title, body, seo, DEFAULT_LANG)
    }

    /// Render the document.
    ///
    /// When `seo.image` is set, a 1200×630 centre-cropped JPEG card is written
    /// to `<webroot>/res/seo/` (once) and advertised through `og:image`.
    pub fn render_lang(&self, title: &str, body: &str, seo: &Seo, lang: &str) -> Result<String> {
        let card_url = match &seo.image {
            Some(image) => Some(self.seo_card(image, seo.site_url.as_deref())?),
            None => None,
        };
        let body_class = (!self.options.body_classes.is_empty())
            .then(|| self.options.body_classes.join(" "));

        let markup = html! {
            (DOCTYPE)
            html lang=(lang) dir="ltr" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (title) }
                    meta property="og:title" content=(title);
                    @if let Some(kind) = &seo.kind {
                        meta property="og:type" content=(kind);
                    }
                    @if let Some(url) = &card_url {
                        meta name="thumbnail" content=(url);
                        meta property="og:image" content=(url);
                        meta property="og:image:width" content=(SEO_IMAGE_WIDTH);
                        meta property="og:image:height" content=(SEO_IMAGE_HEIGHT);
                    }
                    meta name="description" content=(seo.description);
                    meta property="og:description" content=(seo.description);
                    meta name="keywords" content=(seo.keywords.join(", "));
                    meta name="author" content=(seo.author);
                    (PreEscaped(self.head()))
                }
                body class=[body_class] {
                    (PreEscaped(body))
                    (PreEscaped(self.tail()))
                }
            }
        };
        Ok(markup.into_string())
    }

    /// Produce the social card for `image` and return its public URL.
    fn seo_card(&self, image: &std::path::Path, site_url: Option<&str>) -> Result<String> {
        let source = resolve_source(image)?;
        let hash = hash_str(&source.to_string_lossy());
        let seo_dir = self.kit.settings.res_dir().join("seo");
        self.kit.ensure_dir(&seo_dir)?;

        let stem = seo_dir.join(format!("{hash}-wide"));
        if stem.with_extension("jpg").exists() {
            debug!("SEO image already processed: {}", source.display());
        } else {
            compress_image(
                self.kit.backend.as_ref(),
                &CompressRequest {
                    source: &source,
                    output_stem: &stem,
                    width: f64::from(SEO_IMAGE_WIDTH),
                    aspect: SEO_IMAGE_ASPECT,
                    quality: Quality::new(SEO_IMAGE_QUALITY),
                    force_size: true,
                    extensions: &["jpg".to_string()],
                },
            )?;
        }

        let origin = site_url.unwrap_or("").trim_end_matches('/');
        Ok(format!("{origin}/res/seo/{hash}-wide.jpg"))
    }
}
