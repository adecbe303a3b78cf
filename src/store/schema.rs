pub const SCHEMA: &str = r#"
-- Bearer credentials for the management API
CREATE TABLE IF NOT EXISTS api_keys (
    id INTEGER PRIMARY KEY,
    key TEXT NOT NULL UNIQUE,          -- 64 hex chars
    label TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- One row per SFTPGo user
CREATE TABLE IF NOT EXISTS tenants (
    id INTEGER PRIMARY KEY,
    tenant_id TEXT NOT NULL UNIQUE,    -- random token, also the S3 key prefix
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL DEFAULT '',
    public_key TEXT,                   -- NULL = password-only
    home_dir TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Rows ingested from uploaded CSV files
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    record_key TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    value REAL NOT NULL DEFAULT 0,
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(tenant_id, record_key)
);

CREATE INDEX IF NOT EXISTS idx_records_tenant ON records(tenant_id);
"#;
