//! Locale string lookup for the sign-in surface
//!
//! Translators are built from an explicitly enumerated list of locale
//! resources (no resource scanning). Each resource is a flat JSON map from
//! source string to translation, with the reserved `__name__` key carrying
//! the human-readable locale name. Lookup uses a two-level fallback: exact
//! language+COUNTRY match, else language-only match, else a fixed default
//! that passes source strings through unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

static PATTERN_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z]+$").expect("valid pattern"));
static PATTERN_LANGUAGE_COUNTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z]+_[A-Z]+$").expect("valid pattern"));

/// Reserved key naming the locale inside a resource map.
const DISPLAY_NAME_KEY: &str = "__name__";

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("invalid locale name: {0}")]
    InvalidLocale(String),
    #[error("duplicate locale resource: {0}")]
    DuplicateLocale(String),
    #[error("cannot read locale resource {name}: {detail}")]
    UnreadableResource { name: String, detail: String },
    #[error("malformed locale resource {name}: {detail}")]
    MalformedResource { name: String, detail: String },
}

/// One locale's string lookup.
pub trait Translator: Send + Sync {
    fn locale_name(&self) -> &str;
    fn display_name(&self) -> &str;
    /// Translate a source string; strings without a translation pass
    /// through unchanged.
    fn translate<'a>(&'a self, text: &'a str) -> &'a str;
}

/// Source strings are English, so the default translator is the identity.
#[derive(Debug)]
struct DefaultTranslator;

impl Translator for DefaultTranslator {
    fn locale_name(&self) -> &str {
        "en"
    }

    fn display_name(&self) -> &str {
        "English"
    }

    fn translate<'a>(&'a self, text: &'a str) -> &'a str {
        text
    }
}

#[derive(Debug)]
struct MapTranslator {
    locale_name: String,
    display_name: String,
    map: HashMap<String, String>,
}

impl Translator for MapTranslator {
    fn locale_name(&self) -> &str {
        &self.locale_name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn translate<'a>(&'a self, text: &'a str) -> &'a str {
        self.map.get(text).map_or(text, String::as_str)
    }
}

/// The full set of configured translators plus the fixed default.
#[derive(Debug)]
pub struct Translators {
    default: DefaultTranslator,
    translators: HashMap<String, MapTranslator>,
    names: Vec<String>,
}

impl Translators {
    /// Build from an explicit list of `(locale stem, JSON content)` pairs,
    /// e.g. `("zh_CN", include_str!("../i18n/zh_CN.json"))`.
    ///
    /// # Errors
    ///
    /// Returns `I18nError::InvalidLocale` for a stem matching neither
    /// `^[a-z]+$` nor `^[a-z]+_[A-Z]+$`, `I18nError::DuplicateLocale` for a
    /// stem listed twice, and `I18nError::MalformedResource` when a resource
    /// is not a flat JSON string map.
    pub fn from_resources(resources: &[(&str, &str)]) -> Result<Self, I18nError> {
        let mut translators = HashMap::new();
        let mut loaded: Vec<(String, String)> = Vec::new(); // (locale, display)

        for (stem, content) in resources {
            if !PATTERN_LANGUAGE.is_match(stem) && !PATTERN_LANGUAGE_COUNTRY.is_match(stem) {
                return Err(I18nError::InvalidLocale((*stem).to_string()));
            }
            if translators.contains_key(*stem) {
                return Err(I18nError::DuplicateLocale((*stem).to_string()));
            }

            let mut map: HashMap<String, String> =
                serde_json::from_str(content).map_err(|e| I18nError::MalformedResource {
                    name: (*stem).to_string(),
                    detail: e.to_string(),
                })?;

            let display_name = map.remove(DISPLAY_NAME_KEY).unwrap_or_else(|| {
                log::warn!("no display name found in locale resource {stem}, using {stem}");
                (*stem).to_string()
            });
            log::info!("loaded i18n translator {display_name} for {stem}");

            loaded.push(((*stem).to_string(), display_name.clone()));
            translators.insert(
                (*stem).to_string(),
                MapTranslator {
                    locale_name: (*stem).to_string(),
                    display_name,
                    map,
                },
            );
        }

        loaded.sort_by(|a, b| a.0.cmp(&b.0));
        let default = DefaultTranslator;
        let mut names = vec![default.display_name().to_string()];
        names.extend(loaded.into_iter().map(|(_, display)| display));

        Ok(Self {
            default,
            translators,
            names,
        })
    }

    /// Build from an explicit list of `<locale>.json` files.
    ///
    /// # Errors
    ///
    /// Returns `I18nError::UnreadableResource` for an unreadable path plus
    /// everything `from_resources` can return.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, I18nError> {
        let mut owned: Vec<(String, String)> = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| I18nError::InvalidLocale(path.display().to_string()))?;
            let content =
                std::fs::read_to_string(path).map_err(|e| I18nError::UnreadableResource {
                    name: path.display().to_string(),
                    detail: e.to_string(),
                })?;
            owned.push((stem.to_string(), content));
        }
        let resources: Vec<(&str, &str)> = owned
            .iter()
            .map(|(stem, content)| (stem.as_str(), content.as_str()))
            .collect();
        Self::from_resources(&resources)
    }

    /// Resolve a translator for a locale such as `zh_CN`, `zh-CN` or `zh`:
    /// exact language+COUNTRY match, else language-only match, else the
    /// default.
    #[must_use]
    pub fn translator(&self, locale: &str) -> &dyn Translator {
        let (language, country) = split_locale(locale);

        if !country.is_empty() {
            if let Some(t) = self.translators.get(&format!("{language}_{country}")) {
                return t;
            }
        }
        if let Some(t) = self.translators.get(language.as_str()) {
            return t;
        }
        &self.default
    }

    /// Display names of all translators, default first.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

fn split_locale(locale: &str) -> (String, String) {
    let mut parts = locale.splitn(2, ['_', '-']);
    let language = parts.next().unwrap_or_default().to_lowercase();
    let country = parts.next().unwrap_or_default().to_uppercase();
    (language, country)
}
