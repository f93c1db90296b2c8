use crate::api::{
    handlers::{error_response, root::Status, ErrorResponse},
    AppState,
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct DecryptRequest {
    /// Base64 RSA-OAEP ciphertext of the seed.
    pub encrypted_seed: String,
}

impl std::fmt::Debug for DecryptRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptRequest")
            .field("encrypted_seed_len", &self.encrypted_seed.len())
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/decrypt-seed",
    request_body = DecryptRequest,
    responses (
        (status = 200, description = "Seed decrypted and stored", body = Status),
        (status = 400, description = "Missing or malformed payload", body = ErrorResponse),
        (status = 500, description = "Decryption failed", body = ErrorResponse)
    ),
    tag = "seed",
)]
/// Decrypt the posted ciphertext and store the seed.
///
/// Every failure, whatever its cause, answers with the same generic body.
#[instrument(skip_all)]
pub async fn decrypt_seed(
    Extension(state): Extension<Arc<AppState>>,
    payload: Option<Json<DecryptRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let result =
        tokio::task::spawn_blocking(move || state.provision(&request.encrypted_seed)).await;

    match result {
        Ok(Ok(())) => Json(Status {
            status: "ok".to_string(),
        })
        .into_response(),
        Ok(Err(err)) => {
            error!("Seed provisioning failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Decryption failed").into_response()
        }
        Err(err) => {
            error!("Seed provisioning task failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Decryption failed").into_response()
        }
    }
}
