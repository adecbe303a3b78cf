use serde::{Deserialize, Serialize};

use crate::types::Tenant;

#[derive(Debug, Default, Deserialize)]
pub struct CreateApiKeyRequest {
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateTenantResponse {
    pub tenant: Tenant,
    pub password: String,
    pub tenant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateKeysRequest {
    #[serde(default)]
    pub public_key: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ValidateResponse {
    Checked { valid: bool, username: String },
    Failed { valid: bool, reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    #[must_use]
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

/// Body of SFTPGo's external auth hook.
#[derive(Debug, Default, Deserialize)]
pub struct AuthHookRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// `<algorithm> <base64>` without a comment.
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub ip: String,
}
