mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the tenant registry interface.
///
/// `get_*` operations return `Ok(None)` for a missing row; operations that
/// modify an existing row return `Error::NotFound` instead.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // API key operations
    fn create_api_key(&self, key: &str, label: Option<&str>) -> Result<ApiKey>;
    fn get_api_key(&self, key: &str) -> Result<Option<ApiKey>>;

    // Tenant operations
    fn create_tenant(&self, tenant: &NewTenant) -> Result<Tenant>;
    fn list_tenants(&self) -> Result<Vec<Tenant>>;
    fn get_tenant(&self, id: i64) -> Result<Option<Tenant>>;
    fn get_tenant_by_username(&self, username: &str) -> Result<Option<Tenant>>;
    fn update_tenant_public_key(&self, id: i64, public_key: &str) -> Result<()>;
    /// Removes the tenant and returns its username, which the caller needs
    /// to deprovision the SFTPGo user.
    fn delete_tenant(&self, id: i64) -> Result<String>;

    // Record operations
    fn upsert_record(&self, record: &RecordUpsert) -> Result<()>;
    fn list_records(&self, tenant_token: &str) -> Result<Vec<Record>>;

    fn close(&self) -> Result<()>;
}
