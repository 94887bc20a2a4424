/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use servicehub_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = servicehub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::{ApiConfig, Config}, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use servicehub_shared::{
    auth::middleware::authenticate,
    storage::{ImageStore, LocalImageStore},
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Room for multipart boundaries and part headers around the image bytes
const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Where uploaded service images are stored
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    /// Creates state with images stored under `config.media.root`
    pub fn new(db: PgPool, config: Config) -> Self {
        let images = LocalImageStore::new(config.media.root.clone(), config.media.url.clone());
        Self::with_image_store(db, config, Arc::new(images))
    }

    pub fn with_image_store(db: PgPool, config: Config, images: Arc<dyn ImageStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            images,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// ├── /media/...                     # Stored images (public, static)
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register         # public
///     │   ├── POST /login            # public
///     │   ├── POST /refresh          # public
///     │   └── GET  /me
///     ├── /tags/                     # GET, POST; DELETE /:id
///     ├── /components/               # GET, POST; DELETE /:id
///     └── /services/                 # GET, POST
///         ├── /:id                   # GET, PATCH, PUT, DELETE
///         └── /:id/image             # POST (multipart)
/// ```
///
/// Everything under `/v1` except the three public auth routes requires a
/// bearer access token.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let require_auth = from_fn_with_state(state.clone(), jwt_auth_layer);
    let upload_limit = state.config.media.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(require_auth.clone())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let tag_routes = Router::new()
        .route("/", get(routes::tags::list_tags).post(routes::tags::create_tag))
        .route("/:id", delete(routes::tags::delete_tag));

    let component_routes = Router::new()
        .route(
            "/",
            get(routes::components::list_components).post(routes::components::create_component),
        )
        .route("/:id", delete(routes::components::delete_component));

    let service_routes = Router::new()
        .route(
            "/",
            get(routes::services::list_services).post(routes::services::create_service),
        )
        .route(
            "/:id",
            get(routes::services::get_service)
                .patch(routes::services::patch_service)
                .put(routes::services::put_service)
                .delete(routes::services::delete_service),
        )
        .route(
            "/:id/image",
            post(routes::services::upload_image)
                .layer::<_, std::convert::Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(upload_limit)),
        );

    let catalog_routes = Router::new()
        .nest("/tags", tag_routes)
        .nest("/components", component_routes)
        .nest("/services", service_routes)
        .route_layer(require_auth);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(catalog_routes);

    let media = ServeDir::new(&state.config.media.root);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .nest_service(&state.config.media_mount_path(), media)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive outside production unless origins are configured
fn cors_layer(api: &ApiConfig) -> CorsLayer {
    let wildcard = api.cors_origins.iter().any(|origin| origin == "*");

    if wildcard || (!api.production && api.cors_origins.is_empty()) {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token and injects the caller's
/// [`AuthContext`](servicehub_shared::auth::middleware::AuthContext) into
/// request extensions. Handlers take it from there; nothing reads identity
/// from anywhere else.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;

    tracing::debug!(user_id = %auth.user_id, "Authenticated request");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
