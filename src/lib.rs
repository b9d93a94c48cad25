//! Folio is a lightweight portfolio showcase backend.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
mod crypto;
mod database;
pub mod error;
mod middleware;
mod portfolio;
mod router;
mod storage;
pub mod telemetry;
mod token;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

// Multipart overhead on top of the 10MB per-file cap.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_multipart_request(
    app: Router,
    path: &str,
    token: &str,
    boundary: &str,
    body: Vec<u8>,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub crypto: Arc<crypto::PasswordManager>,
    pub token: token::TokenManager,
    pub storage: Arc<dyn storage::ObjectStore>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    let auth_router = Router::new()
        // `GET /auth/verify` returns the decoded token payload.
        .route("/verify", get(router::auth::verify::handler))
        // `GET /auth/user` returns the account behind the token.
        .route("/user", get(router::auth::user::handler))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::authorization,
        ))
        // `POST /auth/signup` goes to `signup`.
        .route("/signup", post(router::auth::signup::handler))
        // `POST /auth/login` goes to `login`.
        .route("/login", post(router::auth::login::handler));

    let portfolio_router = Router::new()
        // `POST /portfolio` upserts; `GET /portfolio` reads the caller's.
        .route(
            "/",
            post(router::portfolio::update::handler)
                .get(router::portfolio::get::handler),
        )
        // `POST /portfolio/upload` pushes images to the object store.
        .route("/upload", post(router::portfolio::upload::images))
        // `POST /portfolio/upload-resume` pushes a PDF resume.
        .route("/upload-resume", post(router::portfolio::upload::resume))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::authorization,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // `GET /portfolio/{username}` is the only public portfolio route.
        .route("/{username}", get(router::portfolio::get::by_handle));

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .nest("/auth", auth_router)
        .nest("/portfolio", portfolio_router)
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read()?;

    let db = match config.postgres {
        Some(ref postgres) => {
            database::Database::new(
                &postgres.address,
                &postgres
                    .username
                    .clone()
                    .unwrap_or(database::DEFAULT_CREDENTIALS.into()),
                &postgres
                    .password
                    .clone()
                    .unwrap_or(database::DEFAULT_CREDENTIALS.into()),
                &postgres
                    .database
                    .clone()
                    .unwrap_or(database::DEFAULT_DATABASE_NAME.into()),
                postgres.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
            )
            .await?
        },
        None => {
            // Serving without a backing store would 500 every request.
            tracing::error!("missing `postgres` entry on `config.yaml` file");
            std::process::exit(0);
        },
    };

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.postgres).await?;

    // handle jwt.
    let Ok(secret) = std::env::var("JWT_SECRET") else {
        tracing::error!("missing `JWT_SECRET` environment variable");
        std::process::exit(0);
    };
    let token = token::TokenManager::new(&config.url, &secret)?;

    // handle object storage for uploaded assets.
    let storage: Arc<dyn storage::ObjectStore> = match config.s3 {
        Some(ref s3) => Arc::new(storage::S3Store::new(s3)?),
        None => {
            tracing::error!("missing `s3` entry on `config.yaml` file");
            std::process::exit(0);
        },
    };

    let crypto = Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    Ok(AppState {
        config,
        db,
        crypto,
        token,
        storage,
    })
}
