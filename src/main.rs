//! # torcheck — "Are you using Tor?"
//!
//! torcheck is a small web service that tells visitors whether their
//! browser appears to be using Tor, and serves the answer as a localized
//! HTML page.
//!
//! ## How detection works
//!
//! Tor Browser ships a deliberately uniform `User-Agent` string; the
//! service matches the request's `User-Agent` against that shape, and
//! resolves the client's apparent IP address through the reverse proxy's
//! `X-Forwarded-For` trail. The verdict is a heuristic: it can be spoofed
//! trivially and must never be treated as an authentication or
//! access-control signal.
//!
//! ## Localization
//!
//! Translations live as gettext catalogs under `locale/<code>/`. At
//! startup the service intersects the installed catalogs with the
//! translation service's language registry snapshot (`data/langs`) to
//! build the language selector, preferring curated native-script names
//! over registry names. `en_US` is always offered.
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default: http://0.0.0.0:8080)
//! torcheck serve
//!
//! # Custom port and site directory
//! torcheck serve --port 3000 --base-dir /srv/torcheck
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path           | Description                         |
//! |--------|----------------|-------------------------------------|
//! | GET    | `/`            | Localized HTML verdict page         |
//! | GET    | `/api/ip`      | JSON verdict for programmatic use   |
//! | GET    | `/static/...`  | Static assets                       |
//! | GET    | `/swagger-ui/` | Swagger UI documentation            |

pub mod detect;
pub mod i18n;
pub mod inspect;
pub mod locales;
pub mod pages;
pub mod render;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::pages::{ApiDoc, AppState};

/// torcheck — a web service that tells visitors whether their browser
/// appears to be using Tor.
#[derive(Parser, Debug)]
#[command(name = "torcheck")]
#[command(about = "Tor Browser detection service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Site directory holding `public/`, `locale/` and `data/langs`.
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
    },
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            base_dir,
        } => run_server(&host, port, base_dir).await,
    }
}

/// Starts the HTTP server with the page, API and Swagger UI routes.
///
/// All startup configuration problems (unlistable `locale/`, malformed
/// registry snapshot, uncompilable templates) are fatal here; the core
/// modules only ever return them.
async fn run_server(host: &str, port: u16, base_dir: PathBuf) -> std::io::Result<()> {
    let openapi = ApiDoc::openapi();

    let locales = locales::get_locale_list(&base_dir).map_err(|err| {
        log::error!("Broken deployment: {err}");
        std::io::Error::other(err)
    })?;

    let i18n = Arc::new(i18n::I18n::load(
        &base_dir,
        locales.keys().map(String::as_str),
    ));
    let templates = render::TemplateCache::new(&base_dir, i18n);

    // Compile the landing page eagerly so template problems surface now
    // instead of on the first request
    templates.compile("index.html").map_err(|err| {
        log::error!("Broken deployment: {err}");
        std::io::Error::other(err)
    })?;

    let state = web::Data::new(AppState { locales, templates });
    let static_dir = base_dir.join("public").join("static");

    log::info!("Starting torcheck server on {}:{}", host, port);
    log::info!("Site directory: {}", base_dir.display());
    log::info!(
        "Offering {} locales in the language selector",
        state.locales.len()
    );
    log::info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        // Permissive CORS so the JSON verdict is embeddable anywhere
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(pages::configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(actix_files::Files::new("/static", static_dir.clone()))
    })
    .bind((host, port))?
    .run()
    .await
}
