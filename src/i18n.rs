//! Translation lookup over compiled gettext catalogs.
//!
//! One `.mo` catalog per installed locale, loaded from
//! `locale/<code>/LC_MESSAGES/torcheck.mo` at startup and immutable
//! afterwards. Lookup is a plain pass-through contract: an unknown
//! language, a missing catalog, or an untranslated string all yield the
//! source string unchanged.

use gettext::Catalog;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// gettext text domain; the `.mo` filename inside each locale directory.
pub const TEXT_DOMAIN: &str = "torcheck";

/// All compiled catalogs for this deployment.
pub struct I18n {
    catalogs: HashMap<String, Catalog>,
}

impl I18n {
    /// Loads catalogs for the given locale codes from `<base>/locale/`.
    ///
    /// A locale with a missing or unparsable catalog is skipped with a
    /// warning; its strings will render untranslated. The source language
    /// `en_US` needs no catalog and is never looked for.
    pub fn load<'a>(base: &Path, codes: impl IntoIterator<Item = &'a str>) -> I18n {
        let mut catalogs = HashMap::new();

        for code in codes {
            if code == "en_US" {
                continue;
            }

            let path = base
                .join("locale")
                .join(code)
                .join("LC_MESSAGES")
                .join(format!("{TEXT_DOMAIN}.mo"));

            let file = match File::open(&path) {
                Ok(file) => file,
                Err(err) => {
                    log::warn!("No compiled catalog for {code} at {}: {err}", path.display());
                    continue;
                }
            };

            match Catalog::parse(file) {
                Ok(catalog) => {
                    catalogs.insert(code.to_string(), catalog);
                }
                Err(err) => log::warn!("Skipping unparsable catalog for {code}: {err}"),
            }
        }

        I18n { catalogs }
    }

    /// Translates `text` into `lang`, passing it through unchanged when no
    /// catalog or translation exists.
    pub fn gettext<'a>(&'a self, lang: &str, text: &'a str) -> &'a str {
        match self.catalogs.get(lang) {
            Some(catalog) => catalog.gettext(text),
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_language_passes_through() {
        let dir = TempDir::new().unwrap();
        let i18n = I18n::load(dir.path(), ["de", "xx_YY"]);
        assert_eq!(
            i18n.gettext("xx_YY", "Sorry. You are not using Tor."),
            "Sorry. You are not using Tor."
        );
        assert_eq!(i18n.gettext("en_US", "Go"), "Go");
    }

    #[test]
    fn test_missing_catalog_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        // No locale/ tree at all: every lookup degrades to pass-through
        let i18n = I18n::load(dir.path(), ["de"]);
        assert_eq!(i18n.gettext("de", "Go"), "Go");
    }
}
