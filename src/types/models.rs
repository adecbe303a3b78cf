use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer credential for the management API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: i64,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An isolated SFTP account.
///
/// `token` is the random prefix under which the tenant's objects live in the
/// bucket. It is exposed on the wire as `tenant_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    #[serde(rename = "tenant_id")]
    pub token: String,
    pub username: String,
    // Stored in clear: the hook has to hand it back to SFTPGo.
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    pub home_dir: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a tenant row; the id is assigned by the registry.
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub token: String,
    pub username: String,
    pub password: String,
    pub public_key: Option<String>,
    pub home_dir: String,
    pub created_at: DateTime<Utc>,
}

/// A row ingested from an uploaded CSV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(rename = "tenant_id")]
    pub tenant_token: String,
    pub record_key: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub value: f64,
    pub updated_at: DateTime<Utc>,
}

/// Insert-or-update payload for a record, keyed by `(tenant_token, record_key)`.
#[derive(Debug, Clone)]
pub struct RecordUpsert {
    pub tenant_token: String,
    pub record_key: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub value: f64,
}
