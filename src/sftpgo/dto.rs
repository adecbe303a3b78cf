use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ObjectStoreSettings;
use crate::types::Tenant;

/// SFTPGo user status for an active account.
pub const STATUS_ENABLED: i32 = 1;

const PROVIDER_S3: i32 = 1;

/// Every permission on the whole virtual tree.
#[must_use]
pub fn full_access_permissions() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([("/".to_string(), vec!["*".to_string()])])
}

/// User record as SFTPGo expects it, both on `POST /api/v2/users` and as the
/// answer to an external auth hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SftpgoUser {
    pub status: i32,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_keys: Vec<String>,
    pub home_dir: String,
    pub permissions: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Filesystem>,
}

impl SftpgoUser {
    /// Builds an enabled, full-access user. Empty passwords and keys are
    /// left out; the filesystem is S3 under `<tenant_token>/` when object
    /// storage is configured.
    #[must_use]
    pub fn new(
        username: &str,
        password: &str,
        home_dir: &str,
        public_key: Option<&str>,
        tenant_token: &str,
        object_store: Option<&ObjectStoreSettings>,
    ) -> Self {
        Self {
            status: STATUS_ENABLED,
            username: username.to_string(),
            password: (!password.is_empty()).then(|| password.to_string()),
            public_keys: public_key
                .filter(|k| !k.is_empty())
                .map(|k| vec![k.to_string()])
                .unwrap_or_default(),
            home_dir: home_dir.to_string(),
            permissions: full_access_permissions(),
            filesystem: object_store.map(|s3| Filesystem::s3(s3, tenant_token)),
        }
    }

    /// Descriptor for a registered tenant. Recomputed on every call so the
    /// current object store credentials are always the ones handed out.
    #[must_use]
    pub fn for_tenant(tenant: &Tenant, object_store: Option<&ObjectStoreSettings>) -> Self {
        Self::new(
            &tenant.username,
            &tenant.password,
            &tenant.home_dir,
            tenant.public_key.as_deref(),
            &tenant.token,
            object_store,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filesystem {
    pub provider: i32,
    pub s3config: S3Filesystem,
}

impl Filesystem {
    #[must_use]
    pub fn s3(settings: &ObjectStoreSettings, tenant_token: &str) -> Self {
        Self {
            provider: PROVIDER_S3,
            s3config: S3Filesystem {
                bucket: settings.bucket.clone(),
                region: settings.region.clone(),
                endpoint: settings.endpoint.clone(),
                access_key: settings.access_key.clone(),
                access_secret: SecretPayload::plain(&settings.secret_key),
                key_prefix: format!("{tenant_token}/"),
                force_path_style: true,
                // Local MinIO deployments commonly run with self-signed certs.
                skip_tls_verify: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Filesystem {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub access_secret: SecretPayload,
    pub key_prefix: String,
    pub force_path_style: bool,
    pub skip_tls_verify: bool,
}

/// SFTPGo's envelope for secrets; `Plain` means SFTPGo encrypts it on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretPayload {
    pub status: String,
    pub payload: String,
}

impl SecretPayload {
    #[must_use]
    pub fn plain(payload: &str) -> Self {
        Self {
            status: "Plain".to_string(),
            payload: payload.to_string(),
        }
    }
}

/// The subset of `GET /api/v2/users/{username}` this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUser {
    pub username: String,
    #[serde(default)]
    pub status: i32,
}

impl RemoteUser {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status == STATUS_ENABLED
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct PublicKeysUpdate<'a> {
    pub public_keys: &'a [String],
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn s3_settings() -> ObjectStoreSettings {
        ObjectStoreSettings {
            bucket: "sftpgo".to_string(),
            region: "us-east-1".to_string(),
            endpoint: "http://minio:9000".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
            use_ssl: false,
        }
    }

    fn tenant(public_key: Option<&str>) -> Tenant {
        Tenant {
            id: 1,
            token: "abc123".to_string(),
            username: "acme".to_string(),
            password: "pw".to_string(),
            public_key: public_key.map(str::to_string),
            home_dir: "/srv/sftpgo/data/abc123".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_descriptor_without_object_store() {
        let user = SftpgoUser::for_tenant(&tenant(None), None);
        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(
            value,
            json!({
                "status": 1,
                "username": "acme",
                "password": "pw",
                "home_dir": "/srv/sftpgo/data/abc123",
                "permissions": { "/": ["*"] },
            })
        );
    }

    #[test]
    fn test_descriptor_with_object_store() {
        let settings = s3_settings();
        let user = SftpgoUser::for_tenant(&tenant(Some("ssh-ed25519 AAAA me")), Some(&settings));
        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["public_keys"], json!(["ssh-ed25519 AAAA me"]));
        assert_eq!(value["filesystem"]["provider"], 1);
        let s3 = &value["filesystem"]["s3config"];
        assert_eq!(s3["key_prefix"], "abc123/");
        assert_eq!(s3["endpoint"], "http://minio:9000");
        assert_eq!(s3["access_secret"], json!({ "status": "Plain", "payload": "sk" }));
        assert_eq!(s3["force_path_style"], true);
        assert_eq!(s3["skip_tls_verify"], true);
    }

    #[test]
    fn test_empty_password_omitted() {
        let user = SftpgoUser::new("acme", "", "/home", Some(""), "t", None);

        assert!(user.password.is_none());
        assert!(user.public_keys.is_empty());
    }

    #[test]
    fn test_remote_user_ignores_extra_fields() {
        let user: RemoteUser = serde_json::from_value(json!({
            "id": 7,
            "username": "acme",
            "status": 0,
            "home_dir": "/x",
        }))
        .unwrap();

        assert_eq!(user.username, "acme");
        assert!(!user.is_enabled());
    }
}
