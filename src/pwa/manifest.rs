//! Web app manifest input types and JSON assembly.
//!
//! Input fields use this crate's naming (`background_colour`, `theme_colour`,
//! `icon.maskable_png`); the written JSON uses the W3C member names
//! (`background_color`, `theme_color`, `icons`). Members are written in a
//! fixed order and empty lists are left out, so unchanged input always
//! produces a byte-identical `manifest.json`.

use crate::img::mime_type;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Auto,
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    Fullscreen,
    Standalone,
    MinimalUi,
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Any,
    Natural,
    Landscape,
    LandscapePrimary,
    LandscapeSecondary,
    Portrait,
    PortraitPrimary,
    PortraitSecondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    ChromeWebStore,
    Play,
    Itunes,
    Webapp,
    Windows,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolHandler {
    pub protocol: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelatedApplication {
    pub platform: Platform,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Shortcut {
    pub name: String,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub url: String,
    /// Icon URL, as served.
    pub icon: Option<String>,
}

/// Source images for the app icons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PwaIcons {
    pub svg: Option<PathBuf>,
    pub png: Option<PathBuf>,
    pub maskable_svg: Option<PathBuf>,
    pub maskable_png: Option<PathBuf>,
}

/// Web app manifest description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PwaManifest {
    pub name: String,
    pub background_colour: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub dir: Option<TextDirection>,
    pub display: Option<DisplayMode>,
    pub iarc_rating_id: Option<String>,
    #[serde(default)]
    pub icon: PwaIcons,
    pub lang: Option<String>,
    pub orientation: Option<Orientation>,
    pub prefer_related_applications: Option<bool>,
    #[serde(default)]
    pub protocol_handlers: Vec<ProtocolHandler>,
    #[serde(default)]
    pub related_applications: Vec<RelatedApplication>,
    pub scope: Option<String>,
    /// Screenshot URLs, as served.
    #[serde(default)]
    pub screenshots: Vec<String>,
    pub short_name: Option<String>,
    #[serde(default)]
    pub shortcuts: Vec<Shortcut>,
    pub start_url: Option<String>,
    pub theme_colour: Option<String>,
}

/// One entry of the manifest `icons` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Assemble the manifest JSON. `icons` is always present, possibly empty.
pub fn manifest_json(manifest: &PwaManifest, icons: &[ManifestIcon]) -> Value {
    let mut json = Map::new();
    let mut put = |key: &str, value: Value| {
        json.insert(key.to_string(), value);
    };

    if let Some(colour) = &manifest.background_colour {
        put("background_color", json!(colour));
    }
    if !manifest.categories.is_empty() {
        put("categories", json!(manifest.categories));
    }
    if let Some(description) = &manifest.description {
        put("description", json!(description));
    }
    if let Some(dir) = manifest.dir {
        put("dir", json!(dir));
    }
    if let Some(display) = manifest.display {
        put("display", json!(display));
    }
    if let Some(id) = &manifest.iarc_rating_id {
        put("iarc_rating_id", json!(id));
    }
    if !icons.is_empty() {
        put("icons", json!(icons));
    }
    if let Some(lang) = &manifest.lang {
        put("lang", json!(lang));
    }
    put("name", json!(manifest.name));
    if let Some(orientation) = manifest.orientation {
        put("orientation", json!(orientation));
    }
    if let Some(prefer) = manifest.prefer_related_applications {
        put("prefer_related_applications", json!(prefer));
    }
    if !manifest.protocol_handlers.is_empty() {
        put("protocol_handlers", json!(manifest.protocol_handlers));
    }
    if !manifest.related_applications.is_empty() {
        put("related_applications", json!(manifest.related_applications));
    }
    if let Some(scope) = &manifest.scope {
        put("scope", json!(scope));
    }
    if !manifest.screenshots.is_empty() {
        let screenshots: Vec<Value> = manifest
            .screenshots
            .iter()
            .map(|src| json!({ "src": src, "type": mime_type(extension_of(src)) }))
            .collect();
        put("screenshots", Value::Array(screenshots));
    }
    if let Some(short_name) = &manifest.short_name {
        put("short_name", json!(short_name));
    }
    if !manifest.shortcuts.is_empty() {
        let shortcuts: Vec<Value> = manifest.shortcuts.iter().map(shortcut_json).collect();
        put("shortcuts", Value::Array(shortcuts));
    }
    if let Some(start_url) = &manifest.start_url {
        put("start_url", json!(start_url));
    }
    if let Some(colour) = &manifest.theme_colour {
        put("theme_color", json!(colour));
    }

    Value::Object(json)
}

fn shortcut_json(shortcut: &Shortcut) -> Value {
    let mut json = Map::new();
    json.insert("name".into(), json!(shortcut.name));
    if let Some(short_name) = &shortcut.short_name {
        json.insert("short_name".into(), json!(short_name));
    }
    if let Some(description) = &shortcut.description {
        json.insert("description".into(), json!(description));
    }
    json.insert("url".into(), json!(shortcut.url));
    if let Some(icon) = &shortcut.icon {
        json.insert("icons".into(), json!([{ "src": icon }]));
    }
    Value::Object(json)
}

fn extension_of(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}
