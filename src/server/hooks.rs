use std::fmt;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::ingest::UploadEvent;
use crate::server::AppState;
use crate::server::dto::{AuthHookRequest, StatusResponse};
use crate::server::response::ApiJson;
use crate::sftpgo::SftpgoUser;
use crate::types::Tenant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    PublicKey,
    Password,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::PublicKey => write!(f, "public key"),
            AuthMethod::Password => write!(f, "password"),
        }
    }
}

/// Compares the base64 body of two OpenSSH keys, ignoring the algorithm and
/// any trailing comment.
#[must_use]
pub fn public_keys_match(offered: &str, stored: &str) -> bool {
    match (
        offered.split_whitespace().nth(1),
        stored.split_whitespace().nth(1),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Checks the offered credentials against a tenant. The public key is tried
/// first; an empty credential on either side never matches.
#[must_use]
pub fn authenticate(tenant: &Tenant, public_key: &str, password: &str) -> Option<AuthMethod> {
    if let Some(stored) = tenant.public_key.as_deref() {
        if !public_key.is_empty() && public_keys_match(public_key, stored) {
            return Some(AuthMethod::PublicKey);
        }
    }

    if !password.is_empty() && !tenant.password.is_empty() && password == tenant.password {
        return Some(AuthMethod::Password);
    }

    None
}

/// SFTPGo external auth hook. Success returns the user descriptor; every
/// rejection is an empty 403.
pub async fn auth_hook(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let req: AuthHookRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("auth hook: undecodable request: {e}");
            return StatusCode::FORBIDDEN.into_response();
        }
    };

    tracing::info!(
        username = %req.username,
        protocol = %req.protocol,
        ip = %req.ip,
        has_password = !req.password.is_empty(),
        has_public_key = !req.public_key.is_empty(),
        "auth hook"
    );

    let tenant = match state.store.get_tenant_by_username(&req.username) {
        Ok(Some(tenant)) => tenant,
        Ok(None) => {
            tracing::info!(username = %req.username, "auth hook: unknown tenant");
            return StatusCode::FORBIDDEN.into_response();
        }
        Err(e) => {
            tracing::error!("auth hook: tenant lookup failed: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match authenticate(&tenant, &req.public_key, &req.password) {
        Some(method) => {
            tracing::info!(
                username = %tenant.username,
                protocol = %req.protocol,
                "auth hook: authenticated via {method}"
            );
            Json(SftpgoUser::for_tenant(&tenant, state.object_store.as_ref())).into_response()
        }
        None => {
            tracing::info!(username = %req.username, "auth hook: authentication failed");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// SFTPGo upload notification. Ingestion runs detached; the hook is
/// acknowledged whether or not ingestion is enabled.
pub async fn upload_event(
    State(state): State<Arc<AppState>>,
    ApiJson(event): ApiJson<UploadEvent>,
) -> Json<StatusResponse> {
    tracing::info!(
        action = event.action.as_deref().unwrap_or_default(),
        username = event.username.as_deref().unwrap_or_default(),
        path = event.virtual_path.as_deref().unwrap_or_default(),
        "upload event"
    );

    match &state.ingest {
        Some(worker) => {
            let worker = Arc::clone(worker);
            state
                .tasks
                .spawn(async move { worker.process_upload_event(event).await });
        }
        None => tracing::debug!("ingestion disabled, ignoring upload event"),
    }

    Json(StatusResponse::new("ok"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    const KEY_BODY: &str = "AAAAC3NzaC1lZDI1NTE5AAAAIOMqqnkVzrm0SdG6UOoqKLsabgH5C9okWi0dh2l9GKJl";

    fn tenant(password: &str, public_key: Option<&str>) -> Tenant {
        Tenant {
            id: 1,
            token: "0123456789abcdef0123456789abcdef".to_string(),
            username: "acme".to_string(),
            password: password.to_string(),
            public_key: public_key.map(str::to_string),
            home_dir: "/srv/sftpgo/data/0123456789abcdef0123456789abcdef".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_keys_match_ignores_comment() {
        let stored = format!("ssh-ed25519 {KEY_BODY} alice@laptop");
        let offered = format!("ssh-ed25519 {KEY_BODY}");
        assert!(public_keys_match(&offered, &stored));
    }

    #[test]
    fn test_public_keys_match_rejects_other_body_or_single_field() {
        let stored = format!("ssh-ed25519 {KEY_BODY}");
        assert!(!public_keys_match("ssh-ed25519 AAAAother", &stored));
        assert!(!public_keys_match(KEY_BODY, &stored));
        assert!(!public_keys_match("", &stored));
    }

    #[test]
    fn test_authenticate_by_password() {
        let t = tenant("s3cret", None);
        assert_eq!(authenticate(&t, "", "s3cret"), Some(AuthMethod::Password));
        assert_eq!(authenticate(&t, "", "wrong"), None);
    }

    #[test]
    fn test_authenticate_prefers_public_key() {
        let stored = format!("ssh-ed25519 {KEY_BODY} alice@laptop");
        let t = tenant("s3cret", Some(&stored));
        let offered = format!("ssh-ed25519 {KEY_BODY}");

        assert_eq!(
            authenticate(&t, &offered, "s3cret"),
            Some(AuthMethod::PublicKey)
        );
    }

    #[test]
    fn test_public_key_ignores_algorithm_label() {
        let stored = format!("ssh-rsa {KEY_BODY} c");
        let t = tenant("", Some(&stored));
        let offered = format!("ssh-ed25519 {KEY_BODY}");

        assert!(public_keys_match(&offered, &stored));
        assert_eq!(authenticate(&t, &offered, ""), Some(AuthMethod::PublicKey));
    }

    #[test]
    fn test_authenticate_falls_back_to_password_on_key_mismatch() {
        let stored = format!("ssh-ed25519 {KEY_BODY}");
        let t = tenant("s3cret", Some(&stored));

        assert_eq!(
            authenticate(&t, "ssh-ed25519 AAAAother", "s3cret"),
            Some(AuthMethod::Password)
        );
    }

    #[test]
    fn test_empty_credentials_never_match() {
        let t = tenant("", None);
        assert_eq!(authenticate(&t, "", ""), None);

        let t = tenant("s3cret", None);
        assert_eq!(authenticate(&t, "", ""), None);
    }
}
