use crate::{api::AppState, error::Error, GIT_COMMIT_HASH};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    /// `provisioned`, `missing` or `error`.
    seed: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Service is up; seed status reported in the body", body = Health),
        (status = 503, description = "Seed store cannot be read", body = Health)
    ),
    tag = "seed",
)]
/// Report build information and whether a seed is provisioned.
///
/// A missing seed is a normal state before provisioning and still answers 200.
pub async fn health(method: Method, Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let shared = Arc::clone(&state);
    let (seed, healthy) = match tokio::task::spawn_blocking(move || shared.store().get()).await {
        Ok(Ok(_)) => ("provisioned", true),
        Ok(Err(Error::SeedNotProvisioned)) => ("missing", true),
        Ok(Err(err)) => {
            error!("Seed store check failed: {err}");
            ("error", false)
        }
        Err(err) => {
            error!("Seed store check task failed: {err}");
            ("error", false)
        }
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        seed: seed.to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        })
        .unwrap_or_else(|err| {
            debug!("Failed to parse X-App header: {}", err);
            HeaderMap::new()
        });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, headers, body)
}
