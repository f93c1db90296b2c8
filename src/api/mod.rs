//! HTTP surface: seed provisioning, code generation and verification.

mod handlers;
mod openapi;

pub use self::openapi::openapi;

use crate::{
    error::Result as CoreResult,
    seed::{self, KeyProvider, SeedStore},
    totp::{Clock, SystemClock, TimeStepCodeEngine, DEFAULT_TOLERANCE_WINDOW},
};
use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request},
    routing::options,
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;

/// Capabilities the handlers work with.
///
/// The seed is never cached here; every request reads it from the store.
#[derive(Clone)]
pub struct AppState {
    keys: Arc<dyn KeyProvider>,
    store: Arc<dyn SeedStore>,
    clock: Arc<dyn Clock>,
    window: u32,
}

impl AppState {
    #[must_use]
    pub fn new(keys: Arc<dyn KeyProvider>, store: Arc<dyn SeedStore>) -> Self {
        Self {
            keys,
            store,
            clock: Arc::new(SystemClock),
            window: DEFAULT_TOLERANCE_WINDOW,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn store(&self) -> &dyn SeedStore {
        self.store.as_ref()
    }

    pub(crate) fn window(&self) -> u32 {
        self.window
    }

    pub(crate) fn provision(&self, ciphertext_b64: &str) -> CoreResult<()> {
        seed::provision(ciphertext_b64, self.keys.as_ref(), self.store.as_ref())
    }

    /// Engine for the currently stored seed.
    pub(crate) fn engine(&self) -> CoreResult<TimeStepCodeEngine> {
        let seed = self.store.get()?;
        Ok(TimeStepCodeEngine::from_seed(&seed)?.with_clock(self.clock.clone()))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

/// Build the application with every route and middleware layer applied.
#[must_use]
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    let (router, _openapi) = openapi::api_router().split_for_parts();

    router
        .route("/health", options(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(Arc::new(state))),
        )
}

/// Serve the API on `[::]:port` until Ctrl-C.
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn new(port: u16, state: AppState) -> Result<()> {
    let app = app(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let path = request.uri().path();
    let method = request.method().as_str();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    // Headers are not recorded.
    debug_span!("http-request", method, path, request_id)
}
