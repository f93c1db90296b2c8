use crate::{
    api::{
        handlers::{error_response, ErrorResponse},
        AppState,
    },
    error::Error,
    totp::TimeStepCodeEngine,
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub code: String,
    /// Seconds until the code rolls over, `1..=30`.
    pub valid_for: u64,
}

#[derive(ToSchema, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub code: Option<String>,
}

impl std::fmt::Debug for VerifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyRequest").finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
}

type EngineError = (StatusCode, Json<ErrorResponse>);

/// Read the seed and build an engine off the async runtime.
async fn load_engine(state: &Arc<AppState>) -> Result<TimeStepCodeEngine, EngineError> {
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || state.engine())
        .await
        .map_err(|err| {
            error!("Seed load task failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Seed not ready")
        })?;

    result.map_err(|err| match err {
        Error::SeedNotProvisioned => {
            debug!("No seed provisioned");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Seed not decrypted yet")
        }
        other => {
            error!("Stored seed unusable: {other}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Seed not ready")
        }
    })
}

#[utoipa::path(
    get,
    path= "/generate-2fa",
    responses (
        (status = 200, description = "Current code", body = Code),
        (status = 500, description = "No usable seed", body = ErrorResponse)
    ),
    tag = "2fa",
)]
/// Current code and the seconds it stays valid.
#[instrument(skip_all)]
pub async fn generate(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let engine = match load_engine(&state).await {
        Ok(engine) => engine,
        Err(response) => return response.into_response(),
    };

    let current = engine.generate_current();
    Json(Code {
        code: current.code,
        valid_for: current.remaining_seconds,
    })
    .into_response()
}

#[utoipa::path(
    post,
    path= "/verify-2fa",
    request_body = VerifyRequest,
    responses (
        (status = 200, description = "Verification result", body = Verification),
        (status = 400, description = "Missing code", body = ErrorResponse),
        (status = 500, description = "No usable seed", body = ErrorResponse)
    ),
    tag = "2fa",
)]
/// Check a code against the previous, current and next time step.
///
/// A code that is not six digits is reported as invalid, not as a bad request.
#[instrument(skip_all)]
pub async fn verify(
    Extension(state): Extension<Arc<AppState>>,
    payload: Option<Json<VerifyRequest>>,
) -> impl IntoResponse {
    let code = payload
        .and_then(|Json(request)| request.code)
        .filter(|code| !code.is_empty());
    let Some(code) = code else {
        return error_response(StatusCode::BAD_REQUEST, "Missing code").into_response();
    };

    let engine = match load_engine(&state).await {
        Ok(engine) => engine,
        Err(response) => return response.into_response(),
    };

    let valid = match engine.check(&code, state.window()) {
        Ok(valid) => valid,
        Err(err) => {
            debug!("Rejected code: {err}");
            false
        }
    };

    Json(Verification { valid }).into_response()
}
