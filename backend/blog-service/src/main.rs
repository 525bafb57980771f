use actix_web::{web, App, HttpServer};
use blog_service::cache::FeedCache;
use blog_service::db::{EntityStore, MemoryStore, PgStore};
use blog_service::media::MediaStorage;
use blog_service::middleware::MetricsMiddleware;
use blog_service::pagination::Paginator;
use blog_service::security::JwtKeys;
use blog_service::{routes, telemetry, AppState, Config};
use std::io;
use std::sync::Arc;

/// Blog Service
///
/// Serves the blog pages (home, groups, profiles, posts, follow feed), the
/// signup/login endpoints and the admin group endpoint. Uses PostgreSQL when
/// `DATABASE_URL` is set and an in-process store otherwise.
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let production = std::env::var("APP_ENV")
        .map(|env| env.eq_ignore_ascii_case("production"))
        .unwrap_or(false);
    telemetry::init_tracing(production);

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn EntityStore> = match config.database.url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(
                url,
                config.database.max_connections,
                config.database.min_connections,
            )
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let state = web::Data::new(AppState {
        store,
        feed_cache: Arc::new(FeedCache::new(config.index_cache_ttl())),
        jwt: Arc::new(JwtKeys::new(
            &config.auth.jwt_secret,
            config.auth.jwt_ttl_hours,
        )),
        media: Arc::new(MediaStorage::new(
            &config.media.root,
            config.media.max_upload_bytes,
        )),
        paginator: Paginator::new(config.feed.page_size),
        admin_token: config.auth.admin_token.clone(),
    });

    let bind_address = config.bind_address();
    tracing::info!(
        env = %config.app.env,
        page_size = config.feed.page_size,
        admin_routes = config.auth.admin_token.is_some(),
        media_root = %config.media.root,
        "Starting HTTP server at {}",
        bind_address
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(MetricsMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .workers(config.app.workers)
    .shutdown_timeout(30)
    .run()
    .await
}
