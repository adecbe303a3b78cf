use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::is_api_key_format;
use crate::server::AppState;
use crate::types::ApiKey;

/// Extractor that requires a valid `Authorization: Bearer <api key>` header.
pub struct RequireApiKey(pub ApiKey);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidKey,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "missing api key"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "invalid authorization scheme"),
            AuthError::InvalidKey => (StatusCode::UNAUTHORIZED, "invalid api key"),
            AuthError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireApiKey {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuth)?
            .to_str()
            .map_err(|_| AuthError::InvalidScheme)?;

        let key = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidScheme)?
            .trim();

        if !is_api_key_format(key) {
            return Err(AuthError::InvalidKey);
        }

        let api_key = state
            .store
            .get_api_key(key)
            .map_err(|e| {
                tracing::error!("Failed to look up api key: {e}");
                AuthError::InternalError
            })?
            .ok_or(AuthError::InvalidKey)?;

        Ok(RequireApiKey(api_key))
    }
}
