//! Page rendering over tera templates.
//!
//! The shared layout (`public/base.html` plus the `torbutton.html`
//! fragment) is compiled at most once per process and held in an owned
//! cache. Page compilation clones the compiled layout and parses the
//! page-specific file into the clone, so the shared markup is never
//! re-parsed per request; only the in-memory clone happens on the request
//! path.
//!
//! Translation lookup is exposed to templates as the `gettext(lang=, text=)`
//! function. Raw-HTML marking is tera's builtin `safe` filter, and the
//! boolean combinators templates need (`==`, `not`, `and`) are native tera
//! operators.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tera::{Context, Tera, Value};
use thiserror::Error;

use crate::i18n::I18n;

/// Template failures. Both variants indicate a broken deployment; the
/// entry point compiles the landing page eagerly so they surface at
/// startup rather than mid-traffic.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to compile template {name}: {source}")]
    Compile { name: String, source: tera::Error },

    #[error("failed to render template {name}: {source}")]
    Render { name: String, source: tera::Error },
}

/// Owned cache around the compiled shared layout.
pub struct TemplateCache {
    base_dir: PathBuf,
    i18n: Arc<I18n>,
    layout: OnceCell<Tera>,
}

impl TemplateCache {
    pub fn new(base_dir: impl Into<PathBuf>, i18n: Arc<I18n>) -> TemplateCache {
        TemplateCache {
            base_dir: base_dir.into(),
            i18n,
            layout: OnceCell::new(),
        }
    }

    /// The compiled shared layout.
    ///
    /// Built at most once; concurrent first access from several request
    /// contexts is safe, and a compile failure is returned rather than
    /// cached so a later call can retry.
    fn layout(&self) -> Result<&Tera, RenderError> {
        self.layout.get_or_try_init(|| {
            let mut tera = Tera::default();
            tera.add_template_files(vec![
                (self.base_dir.join("public/base.html"), Some("base.html")),
                (
                    self.base_dir.join("public/torbutton.html"),
                    Some("torbutton.html"),
                ),
            ])
            .map_err(|source| RenderError::Compile {
                name: "base.html".to_string(),
                source,
            })?;
            tera.register_function("gettext", gettext_fn(Arc::clone(&self.i18n)));
            Ok(tera)
        })
    }

    /// Clones the compiled layout and parses the named page file from
    /// `public/` into the clone.
    pub fn compile(&self, page: &str) -> Result<Tera, RenderError> {
        let mut tera = self.layout()?.clone();
        tera.add_template_file(self.base_dir.join("public").join(page), Some(page))
            .map_err(|source| RenderError::Compile {
                name: page.to_string(),
                source,
            })?;
        Ok(tera)
    }

    /// Renders the named page with the given context.
    pub fn render(&self, page: &str, ctx: &Context) -> Result<String, RenderError> {
        self.compile(page)?
            .render(page, ctx)
            .map_err(|source| RenderError::Render {
                name: page.to_string(),
                source,
            })
    }
}

/// The `gettext(lang=, text=)` template function.
fn gettext_fn(i18n: Arc<I18n>) -> impl tera::Function {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let lang = args
            .get("lang")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("gettext: missing `lang` argument"))?;
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("gettext: missing `text` argument"))?;
        Ok(Value::String(i18n.gettext(lang, text).to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_templates(base: &Path) {
        fs::create_dir_all(base.join("public")).unwrap();
        fs::write(
            base.join("public/base.html"),
            "<body>{% block content %}{% endblock content %}\
             {% include \"torbutton.html\" %}</body>",
        )
        .unwrap();
        fs::write(
            base.join("public/torbutton.html"),
            "<div id=\"torbutton\"></div>",
        )
        .unwrap();
        fs::write(
            base.join("public/index.html"),
            "{% extends \"base.html\" %}{% block content %}\
             <p>{{ gettext(lang=lang, text=\"Hello\") }} {{ host }}</p>\
             {% endblock content %}",
        )
        .unwrap();
    }

    fn cache_over(base: &Path) -> TemplateCache {
        let i18n = Arc::new(I18n::load(base, ["de"]));
        TemplateCache::new(base, i18n)
    }

    #[test]
    fn test_render_composes_layout_page_and_fragment() {
        let dir = TempDir::new().unwrap();
        write_templates(dir.path());
        let cache = cache_over(dir.path());

        let mut ctx = Context::new();
        ctx.insert("lang", "en_US");
        ctx.insert("host", "198.51.100.7");

        let html = cache.render("index.html", &ctx).unwrap();
        assert!(html.contains("Hello 198.51.100.7"));
        assert!(html.contains("torbutton"));
    }

    #[test]
    fn test_layout_is_compiled_at_most_once() {
        let dir = TempDir::new().unwrap();
        write_templates(dir.path());
        let cache = cache_over(dir.path());

        cache.compile("index.html").unwrap();

        // Corrupt the layout on disk; the memoized compile must keep working
        fs::write(dir.path().join("public/base.html"), "{% broken").unwrap();
        cache.compile("index.html").unwrap();
    }

    #[test]
    fn test_missing_page_is_a_compile_error() {
        let dir = TempDir::new().unwrap();
        write_templates(dir.path());
        let cache = cache_over(dir.path());

        assert!(matches!(
            cache.compile("no-such-page.html"),
            Err(RenderError::Compile { .. })
        ));
    }

    #[test]
    fn test_missing_layout_is_a_compile_error() {
        let dir = TempDir::new().unwrap();
        let cache = cache_over(dir.path());
        assert!(matches!(
            cache.compile("index.html"),
            Err(RenderError::Compile { .. })
        ));
    }
}
