//! Google Fonts imports.
//!
//! The font CSS is downloaded once, inlined as a `<style>` block behind a
//! `preconnect` hint, and cached on disk under `fonts/` so later builds work
//! offline. Passing character sets adds Google's `text=` parameter, which
//! makes the served font files contain only those glyphs.

use crate::cache::hash_params;
use crate::error::Result;
use crate::toolkit::StaticPageUtils;
use maud::html;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tracing::debug;

/// Inclusive range of Unicode code points.
pub type CharacterSet = (u32, u32);

pub const BASIC_LATIN: CharacterSet = (0x20, 0x7f);
pub const ALL_LATIN: CharacterSet = (0x20, 0x24f);

/// Named character sets, as accepted in page files.
pub const CHARACTER_SETS: &[(&str, CharacterSet)] =
    &[("basic_latin", BASIC_LATIN), ("all_latin", ALL_LATIN)];

/// Look up a named character set.
pub fn character_set(name: &str) -> Option<CharacterSet> {
    CHARACTER_SETS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, set)| *set)
}

const GOOGLE_FONTS_CSS: &str = "https://fonts.googleapis.com/css2";
const GOOGLE_FONTS_STATIC: &str = "https://fonts.gstatic.com";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One weight/slant combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontStyle {
    pub weight: u16,
    #[serde(default)]
    pub italic: bool,
}

impl FontStyle {
    pub fn new(weight: u16) -> Self {
        Self {
            weight,
            italic: false,
        }
    }

    pub fn italic(weight: u16) -> Self {
        Self {
            weight,
            italic: true,
        }
    }
}

/// The `ital,wght@` tuple list: upright before italic, then by weight.
pub fn styles_param(styles: &[FontStyle]) -> String {
    let mut sorted = styles.to_vec();
    sorted.sort_by_key(|s| (s.italic, s.weight));
    sorted.dedup();
    sorted
        .iter()
        .map(|s| format!("{},{}", u8::from(s.italic), s.weight))
        .collect::<Vec<_>>()
        .join(";")
}

/// Every character in the given sets, in order.
pub fn characters(char_sets: &[CharacterSet]) -> String {
    char_sets
        .iter()
        .flat_map(|&(start, end)| (start..=end).filter_map(char::from_u32))
        .collect()
}

/// Google Fonts CSS2 URL for a family.
pub fn google_fonts_url(family: &str, styles: &[FontStyle], char_sets: &[CharacterSet]) -> String {
    let mut url = format!(
        "{GOOGLE_FONTS_CSS}?family={}:ital,wght@{}&display=swap",
        family.trim().replace(' ', "+"),
        styles_param(styles)
    );
    if !char_sets.is_empty() {
        url.push_str("&text=");
        url.push_str(&utf8_percent_encode(&characters(char_sets), URI_COMPONENT).to_string());
    }
    url
}

/// Font importer handle, see [`StaticPageUtils::font`].
pub struct Font<'a> {
    pub(crate) kit: &'a StaticPageUtils,
}

impl Font<'_> {
    /// Inline a Google Font's CSS.
    ///
    /// The cache key covers the family, the styles and the character sets.
    pub fn import_google(
        &self,
        family: &str,
        styles: &[FontStyle],
        char_sets: &[CharacterSet],
    ) -> Result<String> {
        let sets: Vec<String> = char_sets
            .iter()
            .map(|(start, end)| format!("{start:x}-{end:x}"))
            .collect();
        let key = hash_params(
            "font",
            &[family.to_string(), styles_param(styles), sets.join(",")],
        );

        self.kit.disk.memoize("fonts", &key, "css", || {
            debug!("Importing Google Font: {family}");
            let url = google_fonts_url(family, styles, char_sets);
            debug!("Downloading font: {url}");
            let preconnect = html! { link rel="preconnect" href=(GOOGLE_FONTS_STATIC); };
            let css = self.kit.css().import_external(&url)?;
            Ok(format!("{}{css}", preconnect.into_string()))
        })
    }
}
