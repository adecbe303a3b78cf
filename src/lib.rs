//! # sftpgo-manager
//!
//! Multi-tenant management backend for an SFTPGo server: a tenant registry,
//! SFTPGo user provisioning, the external auth hook, and CSV ingestion of
//! uploaded files. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sftpgo_manager::config::AppConfig;
//! use sftpgo_manager::server::{AppState, create_router};
//! use sftpgo_manager::sftpgo::SftpgoClient;
//! use sftpgo_manager::store::{SqliteStore, Store};
//! use tokio_util::task::TaskTracker;
//!
//! let config = AppConfig::from_env();
//! let store = SqliteStore::new(&config.db_path)?;
//! store.initialize()?;
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     sftpgo: Arc::new(SftpgoClient::new(&config.sftpgo)),
//!     data_dir: config.data_dir.clone(),
//!     object_store: config.object_store.clone(),
//!     ingest: None,
//!     tasks: TaskTracker::new(),
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): builds the `sftpgo-manager` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod ingest;
pub mod server;
pub mod sftpgo;
pub mod store;
pub mod types;
