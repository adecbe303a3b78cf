//! Shared harness: a fake SFTPGo admin API and the manager app, both served
//! in-process on ephemeral ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use object_store::ObjectStore;
use serde_json::{Value, json};
use sftpgo_manager::config::{ObjectStoreSettings, SftpgoSettings};
use sftpgo_manager::ingest::IngestWorker;
use sftpgo_manager::server::{AppState, create_router};
use sftpgo_manager::sftpgo::SftpgoClient;
use sftpgo_manager::store::{SqliteStore, Store};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;

/// `admin:admin`
const ADMIN_BASIC: &str = "Basic YWRtaW46YWRtaW4=";

#[derive(Default)]
pub struct FakeState {
    pub token_requests: AtomicUsize,
    /// Lifetime of issued tokens; defaults to an hour when zero.
    pub token_ttl_secs: AtomicI64,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
    pub users: Mutex<HashMap<String, Value>>,
}

impl FakeState {
    pub fn user(&self, username: &str) -> Option<Value> {
        self.users.lock().unwrap().get(username).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn insert_user(&self, user: Value) {
        let username = user["username"].as_str().unwrap().to_string();
        self.users.lock().unwrap().insert(username, user);
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer tok-"))
}

async fn issue_token(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let basic = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if basic != Some(ADMIN_BASIC) {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }

    // Slow enough that concurrent callers overlap.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let n = state.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
    let ttl = match state.token_ttl_secs.load(Ordering::SeqCst) {
        0 => 3600,
        ttl => ttl,
    };
    let expires_at = Utc::now() + chrono::Duration::seconds(ttl);
    Json(json!({ "access_token": format!("tok-{n}"), "expires_at": expires_at })).into_response()
}

async fn create_user(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(user): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_create.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "create exploded").into_response();
    }
    let username = user["username"].as_str().unwrap_or_default().to_string();
    let mut users = state.users.lock().unwrap();
    if users.contains_key(&username) {
        return (StatusCode::CONFLICT, "user exists").into_response();
    }
    users.insert(username, user.clone());
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn get_user(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match state.user(&username) {
        Some(user) => Json(user).into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn update_user(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Json(update): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_update.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "update exploded").into_response();
    }
    let mut users = state.users.lock().unwrap();
    match users.get_mut(&username) {
        Some(user) => {
            user["public_keys"] = update["public_keys"].clone();
            (StatusCode::OK, Json(json!({ "message": "User updated" }))).into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn delete_user(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_delete.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "delete exploded").into_response();
    }
    match state.users.lock().unwrap().remove(&username) {
        Some(_) => (StatusCode::OK, Json(json!({ "message": "User deleted" }))).into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

pub struct FakeSftpgo {
    pub state: Arc<FakeState>,
    pub url: String,
}

impl FakeSftpgo {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let router = Router::new()
            .route("/api/v2/token", get(issue_token))
            .route("/api/v2/users", post(create_user))
            .route(
                "/api/v2/users/{username}",
                get(get_user).put(update_user).delete(delete_user),
            )
            .with_state(Arc::clone(&state));

        let url = serve(router).await;
        Self { state, url }
    }

    pub fn settings(&self) -> SftpgoSettings {
        SftpgoSettings {
            url: self.url.clone(),
            admin_user: "admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }

    pub fn client(&self) -> SftpgoClient {
        SftpgoClient::new(&self.settings())
    }
}

pub fn object_store_settings() -> ObjectStoreSettings {
    ObjectStoreSettings {
        bucket: "sftpgo".to_string(),
        region: "us-east-1".to_string(),
        endpoint: "minio:9000".to_string(),
        access_key: "minio".to_string(),
        secret_key: "minio-secret".to_string(),
        use_ssl: false,
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<SqliteStore>,
    pub sftpgo: FakeSftpgo,
    pub tasks: TaskTracker,
    pub data_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn start() -> Self {
        Self::build(None, None).await
    }

    /// Object storage configured and uploads ingested from `objects`.
    pub async fn with_ingest(objects: Arc<dyn ObjectStore>) -> Self {
        Self::build(Some(object_store_settings()), Some(objects)).await
    }

    async fn build(
        object_store: Option<ObjectStoreSettings>,
        objects: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("test.db")).expect("open store"));
        store.initialize().expect("initialize store");

        let sftpgo = FakeSftpgo::start().await;
        let data_dir = temp_dir.path().join("data");
        let tasks = TaskTracker::new();

        let dyn_store: Arc<dyn Store> = store.clone();
        let ingest = objects.map(|objects| Arc::new(IngestWorker::new(Arc::clone(&dyn_store), objects)));

        let state = Arc::new(AppState {
            store: dyn_store,
            sftpgo: Arc::new(sftpgo.client()),
            data_dir: data_dir.clone(),
            object_store,
            ingest,
            tasks: tasks.clone(),
        });
        let base_url = serve(create_router(state)).await;

        Self {
            base_url,
            client: reqwest::Client::new(),
            store,
            sftpgo,
            tasks,
            data_dir,
            _temp_dir: temp_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Mints an API key through the bootstrap endpoint.
    pub async fn bootstrap_key(&self) -> String {
        let resp: Value = self
            .client
            .post(self.url("/api/keys"))
            .json(&json!({ "label": "tests" }))
            .send()
            .await
            .expect("create key")
            .json()
            .await
            .expect("parse key response");
        resp["key"].as_str().expect("key").to_string()
    }

    /// Creates a tenant and returns the full response body.
    pub async fn create_tenant(&self, key: &str, body: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/tenants"))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .expect("create tenant");
        assert_eq!(resp.status(), 201, "create tenant failed");
        resp.json().await.expect("parse tenant response")
    }

    /// Waits for every spawned ingestion task.
    pub async fn drain_tasks(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}
