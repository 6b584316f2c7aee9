//! Inline SVG imports and data URIs.

mod optimize;

pub use optimize::{OptimizeOptions, compact, optimize};

use crate::cache::{cache_key, hash_params, hash_str};
use crate::error::Result;
use crate::toolkit::{StaticPageUtils, read_source};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum SvgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse SVG: {0}")]
    Parse(String),
    #[error("Failed to write SVG: {0}")]
    Write(String),
    #[error("Document has no root element")]
    NoRoot,
    #[error("Root element is <{0}>, expected <svg>")]
    NotSvg(String),
}

/// Options for [`Svg::import`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportSvgOptions {
    /// Accessible name, inserted as the first child `<title>`.
    pub alt: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl ImportSvgOptions {
    fn params_hash(&self) -> String {
        let tagged = |value: Option<&str>| value.map(|v| format!("+{v}")).unwrap_or_default();
        hash_params(
            "svg",
            &[
                tagged(self.alt.as_deref()),
                tagged(self.id.as_deref()),
                self.classes.join(" "),
            ],
        )
    }
}

/// SVG importer handle, see [`StaticPageUtils::svg`].
pub struct Svg<'a> {
    pub(crate) kit: &'a StaticPageUtils,
}

impl Svg<'_> {
    /// Optimize an SVG file for inlining and apply `options` to its root.
    ///
    /// Cached under `svg/`, keyed by file content and options.
    pub fn import(&self, path: impl AsRef<Path>, options: &ImportSvgOptions) -> Result<String> {
        let (abs, source) = read_source(path.as_ref())?;
        let key = cache_key(&hash_str(&source), &options.params_hash());

        self.kit.disk.memoize("svg", &key, "svg", || {
            debug!("Inlining SVG: {}", abs.display());
            let optimized = optimize(&source, &OptimizeOptions::default())
                .and_then(|svg| decorate_root(&svg, options))
                .inspect_err(|e| error!("Failed to parse SVG: {}: {e}", abs.display()))?;
            Ok(optimized)
        })
    }

    /// Compact an SVG file and return it as a base64 `data:` URI.
    ///
    /// Only layout whitespace is removed; the document is not optimized.
    pub fn as_data_string(&self, path: impl AsRef<Path>) -> Result<String> {
        let (abs, source) = read_source(path.as_ref())?;
        let compacted = compact(&source)
            .inspect_err(|e| error!("Failed to parse SVG: {}: {e}", abs.display()))?;
        Ok(data_uri(&compacted))
    }
}

/// `data:image/svg+xml;base64,…` for an SVG document.
pub fn data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

/// Set `id`/`class` on the root element and insert `<title>` as its first child.
fn decorate_root(svg: &str, options: &ImportSvgOptions) -> std::result::Result<String, SvgError> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::new());
    let mut root_done = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SvgError::Parse(e.to_string()))?;
        match event {
            Event::Eof => break,
            Event::Start(start) if !root_done => {
                root_done = true;
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                emit(&mut writer, Event::Start(root_with_options(&start, &name, options)?))?;
                write_title(&mut writer, options)?;
            }
            Event::Empty(start) if !root_done => {
                root_done = true;
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let root = root_with_options(&start, &name, options)?;
                if options.alt.is_some() {
                    emit(&mut writer, Event::Start(root))?;
                    write_title(&mut writer, options)?;
                    emit(&mut writer, Event::End(BytesEnd::new(name)))?;
                } else {
                    emit(&mut writer, Event::Empty(root))?;
                }
            }
            other => emit(&mut writer, other)?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| SvgError::Parse(e.to_string()))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> std::result::Result<(), SvgError> {
    writer
        .write_event(event)
        .map_err(|e| SvgError::Write(e.to_string()))
}

fn root_with_options(
    start: &BytesStart<'_>,
    name: &str,
    options: &ImportSvgOptions,
) -> std::result::Result<BytesStart<'static>, SvgError> {
    let replace_id = options.id.is_some();
    let replace_class = !options.classes.is_empty();

    let mut root = BytesStart::new(name.to_string());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SvgError::Parse(e.to_string()))?;
        let key = attr.key.as_ref();
        if (replace_id && key == b"id") || (replace_class && key == b"class") {
            continue;
        }
        root.push_attribute((key, attr.value.as_ref()));
    }
    if let Some(id) = &options.id {
        root.push_attribute(("id", id.as_str()));
    }
    if replace_class {
        root.push_attribute(("class", options.classes.join(" ").as_str()));
    }
    Ok(root)
}

fn write_title(writer: &mut Writer<Vec<u8>>, options: &ImportSvgOptions) -> std::result::Result<(), SvgError> {
    if let Some(alt) = &options.alt {
        emit(writer, Event::Start(BytesStart::new("title")))?;
        emit(writer, Event::Text(BytesText::new(alt)))?;
        emit(writer, Event::End(BytesEnd::new("title")))?;
    }
    Ok(())
}

/// Intrinsic size of an SVG document.
///
/// Reads `width`/`height` on the root (plain numbers or `px`), falling back to
/// the last two `viewBox` numbers. Returns `None` when neither is usable.
pub fn dimensions(svg: &str) -> Option<(u32, u32)> {
    let mut reader = Reader::from_str(svg);
    let root = loop {
        match reader.read_event().ok()? {
            Event::Start(start) | Event::Empty(start) => break start,
            Event::Eof => return None,
            _ => {}
        }
    };

    let attr_value = |name: &str| {
        root.attributes()
            .flatten()
            .find(|a| a.key.as_ref() == name.as_bytes())
            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
    };

    let width = attr_value("width").and_then(|v| parse_length(&v));
    let height = attr_value("height").and_then(|v| parse_length(&v));
    if let (Some(w), Some(h)) = (width, height) {
        return Some((w.round() as u32, h.round() as u32));
    }

    let view_box = attr_value("viewBox")?;
    let numbers: Vec<f64> = view_box
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((w.round() as u32, h.round() as u32)),
        _ => None,
    }
}

fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|n| *n > 0.0)
}
