use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bytes::Bytes;

use crate::auth::generate_api_key;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::CreateApiKeyRequest;
use crate::server::response::ApiError;

const MAX_RETRIES: u32 = 3;

/// Bootstrap endpoint: mints a new API key. The body is optional.
pub async fn create_api_key(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: CreateApiKeyRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateApiKeyRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid json: {e}")))?
    };
    let label = req.label.as_deref().filter(|l| !l.is_empty());

    for _ in 0..MAX_RETRIES {
        match state.store.create_api_key(&generate_api_key(), label) {
            Ok(key) => {
                tracing::info!(id = key.id, "created api key");
                return Ok((StatusCode::CREATED, Json(key)));
            }
            Err(Error::AlreadyExists) => continue,
            Err(e) => {
                tracing::error!("Failed to create api key: {e}");
                return Err(ApiError::internal("failed to create api key"));
            }
        }
    }

    Err(ApiError::internal("failed to create api key after retries"))
}
