use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub status: String,
}

#[utoipa::path(
    get,
    path= "/",
    responses (
        (status = 200, description = "Service is running", body = Status),
    ),
    tag = "seed",
)]
// axum handler for root
pub async fn root() -> impl IntoResponse {
    Json(Status {
        status: "running".to_string(),
    })
}
