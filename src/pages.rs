//! HTTP handlers for the torcheck service.
//!
//! Two surfaces share the same detection pipeline:
//! - `GET /` renders the localized HTML verdict page, and
//! - `GET /api/ip` answers programmatic clients with a JSON verdict.
//!
//! The API endpoint is documented with OpenAPI/Swagger via `utoipa`;
//! Swagger UI is available at `/swagger-ui/`.

use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::{OpenApi, ToSchema};

use crate::render::TemplateCache;
use crate::{detect, inspect};

/// Shared application state, built once at startup.
///
/// Wrapped in `web::Data` (an `Arc` internally) and shared across all
/// handlers. Everything here is read-only after startup except the
/// template cache's one-time lazy layout compilation.
pub struct AppState {
    /// Locale code -> display name, as offered in the language selector.
    pub locales: BTreeMap<String, String>,
    /// Compiled-layout cache for page rendering.
    pub templates: TemplateCache,
}

// ---------------------------------------------------------------------------
// OpenAPI definition
// ---------------------------------------------------------------------------

/// OpenAPI documentation for the torcheck API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "torcheck — Tor Browser detection",
        version = "0.1.0",
        description = "Heuristically reports whether the requesting client looks like \
            the Tor Browser Bundle, based on its User-Agent shape and apparent \
            address. The verdict is advisory only and must never be used as an \
            authentication or access-control signal.",
        license(name = "MIT")
    ),
    paths(ip_api),
    components(schemas(IpResponse, ErrorResponse)),
    tags(
        (name = "detection", description = "Tor Browser detection endpoints"),
    )
)]
pub struct ApiDoc;

/// JSON verdict for programmatic clients.
#[derive(Serialize, ToSchema)]
pub struct IpResponse {
    /// Whether the client's User-Agent looks like Tor Browser.
    #[serde(rename = "IsTor")]
    pub is_tor: bool,
    /// The client's apparent IP address.
    #[serde(rename = "IP")]
    pub ip: String,
}

/// Error payload returned by the JSON API.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn user_agent(req: &HttpRequest) -> &str {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// The localized verdict page.
///
/// Query parameters: `lang` selects the translation (free-form,
/// unvalidated), `small` requests the compact embeddable layout.
pub async fn index(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let lang = inspect::lang(&req);
    let small = inspect::is_param_set(&req, "small");
    let is_tor = detect::likely_tbb(user_agent(&req));

    let host = match inspect::get_host(&req) {
        Ok(host) => host,
        Err(err) => {
            log::warn!("Could not resolve client address: {err}");
            return HttpResponse::InternalServerError()
                .body("could not resolve client address");
        }
    };

    let mut ctx = tera::Context::new();
    ctx.insert("is_tor", &is_tor);
    ctx.insert("lang", &lang);
    ctx.insert("small", &small);
    ctx.insert("host", &host);
    ctx.insert("locales", &data.locales);

    match data.templates.render("index.html", &ctx) {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body),
        Err(err) => {
            log::error!("Rendering the verdict page failed: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// JSON detection verdict.
///
/// Reports whether the requesting client looks like Tor Browser, together
/// with its apparent IP address.
#[utoipa::path(
    get,
    path = "/api/ip",
    tag = "detection",
    responses(
        (status = 200, description = "Detection verdict", body = IpResponse),
        (status = 500, description = "Client address could not be resolved", body = ErrorResponse),
    )
)]
pub async fn ip_api(req: HttpRequest) -> impl Responder {
    let is_tor = detect::likely_tbb(user_agent(&req));

    match inspect::get_host(&req) {
        Ok(ip) => HttpResponse::Ok().json(IpResponse { is_tor, ip }),
        Err(err) => {
            log::warn!("Could not resolve client address: {err}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "could not resolve client address".to_string(),
            })
        }
    }
}

/// Registers the page and API routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .service(web::scope("/api").route("/ip", web::get().to(ip_api)));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::I18n;
    use actix_web::{App, test};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    const TBB_UA: &str = "Mozilla/5.0 (Windows NT 10.0; rv:78.0) Gecko/20100101 Firefox/78.0";
    const CHROME_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/109.0";

    fn write_site(base: &Path) {
        fs::create_dir_all(base.join("public")).unwrap();
        fs::create_dir_all(base.join("locale/de")).unwrap();
        fs::write(
            base.join("public/base.html"),
            "<body>{% block content %}{% endblock content %}\
             {% include \"torbutton.html\" %}</body>",
        )
        .unwrap();
        fs::write(base.join("public/torbutton.html"), "").unwrap();
        fs::write(
            base.join("public/index.html"),
            "{% extends \"base.html\" %}{% block content %}\
             {% if is_tor %}using Tor{% else %}not using Tor{% endif %} \
             from {{ host }}{% endblock content %}",
        )
        .unwrap();
    }

    fn state_over(base: &Path) -> web::Data<AppState> {
        let i18n = Arc::new(I18n::load(base, ["de"]));
        web::Data::new(AppState {
            locales: [("en_US".to_string(), "English".to_string())].into(),
            templates: TemplateCache::new(base, i18n),
        })
    }

    #[actix_web::test]
    async fn test_index_reports_tor_browser() {
        let dir = tempfile::TempDir::new().unwrap();
        write_site(dir.path());

        let app = test::init_service(
            App::new()
                .app_data(state_over(dir.path()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::USER_AGENT, TBB_UA))
            .insert_header(("X-Forwarded-For", "10.0.0.1, 203.0.113.5"))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains("using Tor"));
        assert!(!body.contains("not using Tor"));
        assert!(body.contains("203.0.113.5"));
    }

    #[actix_web::test]
    async fn test_index_reports_other_browsers() {
        let dir = tempfile::TempDir::new().unwrap();
        write_site(dir.path());

        let app = test::init_service(
            App::new()
                .app_data(state_over(dir.path()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/?lang=de")
            .insert_header((header::USER_AGENT, CHROME_UA))
            .peer_addr("198.51.100.7:443".parse().unwrap())
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains("not using Tor"));
        assert!(body.contains("198.51.100.7"));
    }

    #[actix_web::test]
    async fn test_ip_api_verdict() {
        let dir = tempfile::TempDir::new().unwrap();
        write_site(dir.path());

        let app = test::init_service(
            App::new()
                .app_data(state_over(dir.path()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/ip")
            .insert_header((header::USER_AGENT, TBB_UA))
            .peer_addr("198.51.100.7:443".parse().unwrap())
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["IsTor"], true);
        assert_eq!(body["IP"], "198.51.100.7");
    }
}
