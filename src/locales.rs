//! Locale resolution for the verdict page.
//!
//! The language selector offers a locale only when two sources agree on it:
//!
//! - the `locale/` directory, one subdirectory per translation this
//!   deployment actually ships, and
//! - `data/langs`, a cached snapshot of the translation service's language
//!   registry, used to confirm a subdirectory name is a real language code.
//!
//! `en_US` is the built-in source language and is always offered, bypassing
//! the filter. Both inputs are read once at startup and never refreshed.
//!
//! Display names prefer the hand-curated native-script table below over
//! whatever name the registry carries.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One locale record from the registry snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct Locale {
    pub code: String,
    pub name: String,
}

/// Startup configuration failures.
///
/// Only `RegistryUnavailable` is recoverable (see [`get_locale_list`]);
/// the other variants mean a broken build or install step, and the
/// entry point is expected to terminate on them.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `data/langs` could not be opened.
    #[error("cannot open locale registry {path}: {source}")]
    RegistryUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `data/langs` exists but does not decode as JSON locale arrays.
    #[error("malformed locale registry {path}: {source}")]
    MalformedRegistry {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The `locale/` directory could not be listed.
    #[error("cannot list locale directory {path} (try running 'make i18n'): {source}")]
    LocaleDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Curated native-script display names, preferred over registry names.
///
/// Populated from https://en.wikipedia.org/wiki/List_of_ISO_639-1_codes
/// and https://en.wikipedia.org/w/api.php?action=sitematrix&format=json
const TRANSLATED_NAMES: &[(&str, &str)] = &[
    ("ar", "العربية"),
    ("bg", "български"),
    ("bn", "বাংলা"),
    ("bs", "Bosanski jezik"),
    ("ca", "Català"),
    ("cs", "Čeština"),
    ("da", "Dansk"),
    ("de", "Deutsch"),
    ("el", "ελληνικά"),
    ("en_GB", "English (United Kingdom)"),
    ("eo", "Esperanto"),
    ("es", "Español"),
    ("es_AR", "Español (Argentina)"),
    ("es_MX", "Español (Mexico)"),
    ("et", "Eesti"),
    ("eu", "Euskara"),
    ("fa", "فارسی"),
    ("fi", "Suomi"),
    ("fr", "Français"),
    ("ga", "Gaeilge"),
    ("he", "עברית"),
    ("hi", "हिन्दी"),
    ("hr", "Hrvatski jezik"),
    ("hr_HR", "Hrvatski jezik (Croatia)"),
    ("hu", "Magyar"),
    ("id", "Bahasa Indonesia"),
    ("is", "Íslenska"),
    ("it", "Italiano"),
    ("ja", "日本語"),
    ("ka", "ქართული"),
    ("ko", "한국어"),
    ("lt", "lietuvių kalba"),
    ("lv", "Latviešu valoda"),
    ("mk", "македонски јазик"),
    ("ms_MY", "Bahasa Melayu"),
    ("nb", "Norsk bokmål"),
    ("nl", "Nederlands"),
    ("nl_BE", "Vlaams"),
    ("nn", "Norsk nynorsk"),
    ("pa", "ਪੰਜਾਬੀ"),
    ("pl", "Język polski"),
    ("pt", "Português"),
    ("pt_BR", "Português brasileiro"),
    ("pt_PT", "Português europeu"),
    ("ro", "română"),
    ("ru", "русский язык"),
    ("sk", "Slovenčina"),
    ("sq", "shqip"),
    ("sr", "српски језик"),
    ("sv", "Svenska"),
    ("ta", "தமிழ்"),
    ("th", "ไทย"),
    ("tr", "Türkçe"),
    ("uk", "українська мова"),
    ("vi", "Tiếng Việt"),
    ("zh_CN", "简体字"),
    ("zh_HK", "繁體字(香港)"),
    ("zh_TW", "正體字(臺灣)"),
];

/// The curated override table as an owned map.
pub fn translated_names() -> BTreeMap<String, String> {
    TRANSLATED_NAMES
        .iter()
        .map(|&(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

/// Reads the registry snapshot at `<base>/data/langs`.
///
/// The file is a sequence of concatenated JSON arrays of locale records
/// (the upstream API pages its responses; the snapshot just appends the
/// pages). All arrays are decoded to end-of-input and merged into one map
/// keyed by code.
pub fn fetch_translation_locales(base: &Path) -> Result<HashMap<String, Locale>, ConfigError> {
    let path = base.join("data").join("langs");
    let file = File::open(&path).map_err(|source| ConfigError::RegistryUnavailable {
        path: path.clone(),
        source,
    })?;

    let mut registry = HashMap::new();
    let stream = serde_json::Deserializer::from_reader(BufReader::new(file))
        .into_iter::<Vec<Locale>>();
    for batch in stream {
        let batch = batch.map_err(|source| ConfigError::MalformedRegistry {
            path: path.clone(),
            source,
        })?;
        for locale in batch {
            registry.insert(locale.code.clone(), locale);
        }
    }

    Ok(registry)
}

/// Lists the translations this deployment ships, filtered and named.
///
/// Seeds the result with `en_US -> "English"` and never overrides that
/// entry. Every other `locale/` subdirectory is offered only when the
/// registry knows its code; the display name comes from `overrides` when
/// present, otherwise from the registry record.
pub fn get_installed_locales(
    base: &Path,
    registry: &HashMap<String, Locale>,
    overrides: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let dir = base.join("locale");
    let entries = std::fs::read_dir(&dir).map_err(|source| ConfigError::LocaleDir {
        path: dir.clone(),
        source,
    })?;

    let mut locales = BTreeMap::new();
    locales.insert("en_US".to_string(), "English".to_string());

    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::LocaleDir {
            path: dir.clone(),
            source,
        })?;
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let code = entry.file_name().to_string_lossy().into_owned();

        // The seed entry stays "English" even when a catalog directory exists
        if code == "en_US" {
            continue;
        }

        // Only accept directories whose name the registry recognizes
        let Some(known) = registry.get(&code) else {
            continue;
        };

        match overrides.get(&code) {
            Some(name) => {
                locales.insert(code, name.clone());
            }
            None => {
                log::info!("No translated name for code: {code}");
                locales.insert(code, known.name.clone());
            }
        }
    }

    Ok(locales)
}

/// Builds the locale catalog offered to end users.
///
/// A missing or unopenable registry snapshot degrades to offering the
/// whole curated table as-is, regardless of what is actually installed;
/// that is deliberate and logged. A snapshot that opens but fails to
/// decode, or an unlistable `locale/` directory, is a broken deployment
/// and propagates for the entry point to terminate on.
pub fn get_locale_list(base: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let overrides = translated_names();

    match fetch_translation_locales(base) {
        Ok(registry) => get_installed_locales(base, &registry, &overrides),
        Err(err @ ConfigError::RegistryUnavailable { .. }) => {
            log::warn!("Failed to get up to date language list, using fallback: {err}");
            Ok(overrides)
        }
        Err(err) => Err(err),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
