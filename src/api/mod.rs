use crate::{Context, Error, Result};
use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use db::{ShiftSummary, Store};
use std::sync::Arc;
use tokio_graceful_shutdown::SubsystemHandle;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};

pub async fn subsystem(
    addr: std::net::SocketAddr,
    router: Router,
    handle: SubsystemHandle,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server running");
    tokio::select! {
        result = axum::serve(listener, router) => result.map_err(Error::from),
        _ = handle.on_shutdown_requested() => Ok(())
    }
}

/// Routes under `/api`, with CORS for the frontend and baseline security
/// headers on every response.
pub fn router(state: ApiState, frontend_url: &str) -> Result<Router> {
    let api = Router::new()
        .route("/health", get(health))
        .route("/applications", get(open_shifts));

    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))
        .context("FRONTEND_URL is not a valid origin")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_credentials(true);

    let mut router = Router::new().nest("/api", api).layer(cors);
    for (name, value) in security_headers() {
        router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
    }
    Ok(router.with_state(state))
}

fn security_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
    ]
}

async fn health() -> &'static str {
    "Ok"
}

async fn open_shifts(
    State(state): State<ApiState>,
) -> std::result::Result<ApiJson<Vec<ShiftSummary>>, ApiError> {
    let shifts = state.store.open_shifts().await?;
    Ok(ApiJson(shifts))
}

#[derive(Clone)]
pub struct ApiState {
    store: Arc<dyn Store>,
}

impl ApiState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

pub struct ApiJson<T>(T);

impl<T> IntoResponse for ApiJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// Internal error occurred
    Internal(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        tracing::error!(?value, "service error");
        Self::Internal("internal service error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(serde::Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message) = match self {
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, ApiJson(ErrorResponse { message })).into_response()
    }
}
