use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const TENANT_COLUMNS: &str = "id, tenant_id, username, password, public_key, home_dir, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn map_constraint(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Error::AlreadyExists
        }
        e => Error::from(e),
    }
}

fn tenant_from_row(row: &Row<'_>) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: row.get(0)?,
        token: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        public_key: row.get(4)?,
        home_dir: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // API key operations

    fn create_api_key(&self, key: &str, label: Option<&str>) -> Result<ApiKey> {
        let created_at = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO api_keys (key, label, created_at) VALUES (?1, ?2, ?3)",
            params![key, label, format_datetime(&created_at)],
        )
        .map_err(map_constraint)?;

        Ok(ApiKey {
            id: conn.last_insert_rowid(),
            key: key.to_string(),
            label: label.map(str::to_string),
            created_at,
        })
    }

    fn get_api_key(&self, key: &str) -> Result<Option<ApiKey>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, key, label, created_at FROM api_keys WHERE key = ?1",
            params![key],
            |row| {
                Ok(ApiKey {
                    id: row.get(0)?,
                    key: row.get(1)?,
                    label: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Tenant operations

    fn create_tenant(&self, tenant: &NewTenant) -> Result<Tenant> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tenants (tenant_id, username, password, public_key, home_dir, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                tenant.token,
                tenant.username,
                tenant.password,
                tenant.public_key,
                tenant.home_dir,
                format_datetime(&tenant.created_at),
            ],
        )
        .map_err(map_constraint)?;

        Ok(Tenant {
            id: conn.last_insert_rowid(),
            token: tenant.token.clone(),
            username: tenant.username.clone(),
            password: tenant.password.clone(),
            public_key: tenant.public_key.clone(),
            home_dir: tenant.home_dir.clone(),
            created_at: tenant.created_at,
        })
    }

    fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY id"))?;

        let rows = stmt.query_map([], tenant_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_tenant(&self, id: i64) -> Result<Option<Tenant>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1"),
            params![id],
            tenant_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_tenant_by_username(&self, username: &str) -> Result<Option<Tenant>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE username = ?1"),
            params![username],
            tenant_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_tenant_public_key(&self, id: i64, public_key: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE tenants SET public_key = ?1 WHERE id = ?2",
            params![public_key, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_tenant(&self, id: i64) -> Result<String> {
        let conn = self.conn();
        let username: String = conn
            .query_row(
                "SELECT username FROM tenants WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        conn.execute("DELETE FROM tenants WHERE id = ?1", params![id])?;
        Ok(username)
    }

    // Record operations

    fn upsert_record(&self, record: &RecordUpsert) -> Result<()> {
        self.conn().execute(
            "INSERT INTO records (tenant_id, record_key, title, description, category, value, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(tenant_id, record_key) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![
                record.tenant_token,
                record.record_key,
                record.title,
                record.description,
                record.category,
                record.value,
                format_datetime(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    fn list_records(&self, tenant_token: &str) -> Result<Vec<Record>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, record_key, title, description, category, value, updated_at
             FROM records WHERE tenant_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![tenant_token], |row| {
            Ok(Record {
                id: row.get(0)?,
                tenant_token: row.get(1)?,
                record_key: row.get(2)?,
                title: row.get(3)?,
                description: row.get(4)?,
                category: row.get(5)?,
                value: row.get(6)?,
                updated_at: parse_datetime(&row.get::<_, String>(7)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
