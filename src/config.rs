//! Site configuration.
//!
//! Loaded from an optional YAML file. Every key has a default, so an empty
//! file (or no file) yields a working English site.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Locale used when neither `--locale` nor `default_locale` select another.
pub const BUILTIN_LOCALE: &str = "en";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Used for `<title>` suffix and as fallback page title.
    pub site_title: String,
    pub default_locale: String,
    /// Extra or overriding locales, keyed by language tag.
    pub locales: BTreeMap<String, Locale>,
    pub toc: TocSettings,
    /// Base URL under which `mdpage.css` is served.
    pub assets_base: String,
    /// Category sidebars keyed by the record's `fields.type`.
    pub sidebars: BTreeMap<String, Vec<SidebarItem>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: "Docs".to_owned(),
            default_locale: BUILTIN_LOCALE.to_owned(),
            locales: BTreeMap::new(),
            toc: TocSettings::default(),
            assets_base: "/assets".to_owned(),
            sidebars: BTreeMap::new(),
        }
    }
}

/// Localized labels and date format.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Locale {
    /// chrono `strftime` format string.
    pub date_format: String,
    pub posted_at: String,
    pub updated_at: String,
    pub previous: String,
    pub next: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            date_format: "%B %-d, %Y".to_owned(),
            posted_at: "Posted at".to_owned(),
            updated_at: "Updated at".to_owned(),
            previous: "Previous".to_owned(),
            next: "Next".to_owned(),
        }
    }
}

/// Client-side TOC behavior settings, passed through to the page script.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TocSettings {
    /// CSS selector of the TOC container.
    pub selector: String,
    /// Fixed header clearance subtracted from click-scroll targets, in px.
    pub scroll_offset: f64,
    pub throttle_ms: u64,
    pub active_class: String,
    /// URL of the wasm-bindgen JS loader. `None` renders no script.
    ///
    /// The default matches `wasm-pack build --target web --features wasm`
    /// output copied into the site's `assets/` directory.
    pub script: Option<String>,
}

impl Default for TocSettings {
    fn default() -> Self {
        Self {
            selector: ".toc".to_owned(),
            scroll_offset: 102.0,
            throttle_ms: 100,
            active_class: "active".to_owned(),
            script: Some("/assets/mdpage.js".to_owned()),
        }
    }
}

impl TocSettings {
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SidebarItem {
    pub title: String,
    pub slug: String,
}

/// Whether chrono understands every specifier in `format`.
pub fn is_valid_date_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

impl SiteConfig {
    /// Parse configuration from YAML text. Empty text yields defaults.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.check_date_formats(path)?;
        Ok(config)
    }

    fn check_date_formats(&self, path: &Path) -> Result<()> {
        for (tag, locale) in &self.locales {
            if !is_valid_date_format(&locale.date_format) {
                return Err(Error::DateFormat {
                    path: path.to_path_buf(),
                    locale: tag.clone(),
                    format: locale.date_format.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&text, path)
    }

    /// Load `path` when given, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the locale to render with.
    ///
    /// An explicitly requested locale must exist (the built-in `en` always
    /// does). Without a request, `default_locale` is used, falling back to
    /// the built-in when the config names one it does not define.
    pub fn locale(&self, requested: Option<&str>) -> Result<Locale> {
        match requested {
            Some(tag) => self
                .lookup_locale(tag)
                .ok_or_else(|| Error::UnknownLocale(tag.to_owned())),
            None => Ok(self
                .lookup_locale(&self.default_locale)
                .unwrap_or_default()),
        }
    }

    fn lookup_locale(&self, tag: &str) -> Option<Locale> {
        match self.locales.get(tag) {
            Some(l) => Some(l.clone()),
            None if tag == BUILTIN_LOCALE => Some(Locale::default()),
            None => None,
        }
    }

    pub fn sidebar(&self, kind: &str) -> Option<&[SidebarItem]> {
        self.sidebars
            .get(kind)
            .map(Vec::as_slice)
            .filter(|items| !items.is_empty())
    }
}
