use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::sync::Mutex;
use tracing::debug;

use super::dto::{PublicKeysUpdate, RemoteUser, SftpgoUser, TokenResponse};
use super::error::SftpgoError;
use crate::config::SftpgoSettings;

/// Cached tokens are refreshed this long before SFTPGo says they expire.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

struct CachedToken {
    access_token: String,
    refresh_after: DateTime<Utc>,
}

/// SFTPGo admin API client.
///
/// The bearer token is fetched lazily and cached behind a single async lock.
/// The lock is held across the refresh round-trip, so concurrent callers wait
/// for one token request instead of each issuing their own. No request is
/// retried.
pub struct SftpgoClient {
    http: Client,
    base_url: String,
    admin_user: String,
    admin_password: String,
    token: Mutex<Option<CachedToken>>,
}

impl SftpgoClient {
    pub fn new(settings: &SftpgoSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(http: Client, settings: &SftpgoSettings) -> Self {
        Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            admin_user: settings.admin_user.clone(),
            admin_password: settings.admin_password.clone(),
            token: Mutex::new(None),
        }
    }

    fn user_url(&self, username: &str) -> String {
        format!(
            "{}/api/v2/users/{}",
            self.base_url,
            urlencoding::encode(username)
        )
    }

    async fn bearer_token(&self) -> Result<String, SftpgoError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.refresh_after {
                return Ok(token.access_token.clone());
            }
        }

        debug!("requesting sftpgo admin token");
        let response = self
            .http
            .get(format!("{}/api/v2/token", self.base_url))
            .basic_auth(&self.admin_user, Some(&self.admin_password))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SftpgoError::Token { status, body });
        }

        let token: TokenResponse = response.json().await?;
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            refresh_after: token.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS),
        });

        Ok(access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SftpgoError> {
        let token = self.bearer_token().await?;
        Ok(request.bearer_auth(token).send().await?)
    }

    async fn status_error(operation: &'static str, response: Response) -> SftpgoError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SftpgoError::Status {
            operation,
            status,
            body,
        }
    }

    /// Creates a user. Anything other than `201 Created` is a failure.
    pub async fn create_user(&self, user: &SftpgoUser) -> Result<(), SftpgoError> {
        let request = self
            .http
            .post(format!("{}/api/v2/users", self.base_url))
            .json(user);
        let response = self.send(request).await?;

        if response.status() != StatusCode::CREATED {
            return Err(Self::status_error("create user", response).await);
        }
        Ok(())
    }

    pub async fn get_user(&self, username: &str) -> Result<RemoteUser, SftpgoError> {
        let response = self.send(self.http.get(self.user_url(username))).await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(SftpgoError::UserNotFound(username.to_string())),
            _ => Err(Self::status_error("get user", response).await),
        }
    }

    /// Replaces the user's public key set.
    pub async fn update_public_keys(
        &self,
        username: &str,
        public_keys: &[String],
    ) -> Result<(), SftpgoError> {
        let request = self
            .http
            .put(self.user_url(username))
            .json(&PublicKeysUpdate { public_keys });
        let response = self.send(request).await?;

        if response.status() != StatusCode::OK {
            return Err(Self::status_error("update user keys", response).await);
        }
        Ok(())
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), SftpgoError> {
        let response = self.send(self.http.delete(self.user_url(username))).await?;

        if !response.status().is_success() {
            return Err(Self::status_error("delete user", response).await);
        }
        Ok(())
    }
}
