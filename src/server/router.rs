use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post, put},
};
use tokio_util::task::TaskTracker;

use super::{hooks, keys, tenants};
use crate::config::ObjectStoreSettings;
use crate::ingest::IngestWorker;
use crate::sftpgo::SftpgoClient;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sftpgo: Arc<SftpgoClient>,
    /// Base directory for tenant home directories.
    pub data_dir: PathBuf,
    /// When set, users get an S3 filesystem under their tenant prefix.
    pub object_store: Option<ObjectStoreSettings>,
    /// `None` disables CSV ingestion; upload events are still acknowledged.
    pub ingest: Option<Arc<IngestWorker>>,
    /// Detached ingestion tasks, awaited on shutdown.
    pub tasks: TaskTracker,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Bootstrap, no auth
        .route("/api/keys", post(keys::create_api_key))
        // Called by SFTPGo itself
        .route("/api/auth/hook", post(hooks::auth_hook))
        .route("/api/events/upload", post(hooks::upload_event))
        // Tenant management, bearer key required
        .route(
            "/api/tenants",
            post(tenants::create_tenant).get(tenants::list_tenants),
        )
        .route(
            "/api/tenants/{id}",
            get(tenants::get_tenant).delete(tenants::delete_tenant),
        )
        .route("/api/tenants/{id}/validate", post(tenants::validate_tenant))
        .route("/api/tenants/{id}/keys", put(tenants::update_tenant_keys))
        .route("/api/tenants/{id}/records", get(tenants::list_tenant_records))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
