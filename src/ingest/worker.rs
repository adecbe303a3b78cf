use std::sync::Arc;

use futures::TryStreamExt;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use serde::Deserialize;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::{debug, info, warn};

use super::{IngestError, IngestReport, ingest_csv};
use crate::config::ObjectStoreSettings;
use crate::store::Store;

/// SFTPGo upload event. Only the fields used for ingestion are decoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadEvent {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub virtual_path: Option<String>,
}

#[must_use]
pub fn is_csv_path(virtual_path: &str) -> bool {
    virtual_path.to_lowercase().ends_with(".csv")
}

/// Bucket key of an uploaded file: the tenant prefix plus the virtual path.
#[must_use]
pub fn object_key(tenant_token: &str, virtual_path: &str) -> String {
    format!("{tenant_token}/{}", virtual_path.trim_start_matches('/'))
}

pub struct IngestWorker {
    store: Arc<dyn Store>,
    objects: Arc<dyn ObjectStore>,
}

impl IngestWorker {
    pub fn new(store: Arc<dyn Store>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    /// Connects to the shared bucket with path-style addressing.
    pub fn from_settings(
        store: Arc<dyn Store>,
        settings: &ObjectStoreSettings,
    ) -> Result<Self, IngestError> {
        let objects = AmazonS3Builder::new()
            .with_bucket_name(&settings.bucket)
            .with_region(&settings.region)
            .with_endpoint(settings.endpoint_url())
            .with_access_key_id(&settings.access_key)
            .with_secret_access_key(&settings.secret_key)
            .with_virtual_hosted_style_request(false)
            .with_allow_http(!settings.use_ssl)
            .build()?;

        Ok(Self::new(store, Arc::new(objects)))
    }

    /// Downloads the uploaded object and ingests it row by row.
    ///
    /// The object is streamed into the CSV reader on the blocking pool, where
    /// the registry upserts also run.
    pub async fn ingest(&self, event: &UploadEvent) -> Result<IngestReport, IngestError> {
        let username = event
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(IngestError::MissingField("username"))?;
        let virtual_path = event
            .virtual_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(IngestError::MissingField("virtual_path"))?;

        if !is_csv_path(virtual_path) {
            return Err(IngestError::NotCsv(virtual_path.to_string()));
        }

        let tenant = self
            .store
            .get_tenant_by_username(username)?
            .ok_or_else(|| IngestError::TenantNotFound(username.to_string()))?;

        // `parse` keeps the key as uploaded; `from` would percent-encode it.
        let location = ObjectPath::parse(object_key(&tenant.token, virtual_path))?;
        debug!(%location, "fetching uploaded object");

        let stream = self
            .objects
            .get(&location)
            .await?
            .into_stream()
            .map_err(std::io::Error::other);
        let reader = SyncIoBridge::new(StreamReader::new(stream));

        let store = Arc::clone(&self.store);
        let token = tenant.token;
        let report =
            tokio::task::spawn_blocking(move || ingest_csv(store.as_ref(), &token, reader))
                .await??;

        Ok(report)
    }

    /// Runs [`ingest`](Self::ingest) and logs the outcome. Nothing is
    /// reported back to the caller.
    pub async fn process_upload_event(&self, event: UploadEvent) {
        let path = event.virtual_path.clone().unwrap_or_default();

        match self.ingest(&event).await {
            Ok(report) => info!(
                username = event.username.as_deref().unwrap_or_default(),
                path = %path,
                upserted = report.upserted,
                skipped = report.skipped,
                truncated = report.truncated,
                "processed upload"
            ),
            Err(e) if e.is_skip() => debug!(path = %path, "skipping upload: {e}"),
            Err(e) => warn!(path = %path, "ingestion failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_csv_path() {
        assert!(is_csv_path("/reports/q1.csv"));
        assert!(is_csv_path("/reports/Q1.CSV"));
        assert!(!is_csv_path("/reports/q1.csv.gz"));
        assert!(!is_csv_path("/notes.txt"));
    }

    #[test]
    fn test_object_key_strips_leading_slash() {
        assert_eq!(object_key("tid", "/in/data.csv"), "tid/in/data.csv");
        assert_eq!(object_key("tid", "data.csv"), "tid/data.csv");
    }
}
