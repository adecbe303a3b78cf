use std::net::SocketAddr;
use std::path::PathBuf;

/// Credentials for the SFTPGo administrative API.
#[derive(Debug, Clone)]
pub struct SftpgoSettings {
    pub url: String,
    pub admin_user: String,
    pub admin_password: String,
}

/// S3-compatible bucket shared by all tenants, one key prefix per tenant.
#[derive(Debug, Clone)]
pub struct ObjectStoreSettings {
    pub bucket: String,
    pub region: String,
    /// Endpoint as configured, e.g. `http://minio:9000`. Handed to SFTPGo verbatim.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
}

impl ObjectStoreSettings {
    /// Endpoint URL for the ingestion client. The scheme is decided by
    /// `use_ssl`, whatever scheme the configured endpoint carried.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let host = self
            .endpoint
            .trim_start_matches("http://")
            .trim_start_matches("https://");
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{host}")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub db_path: PathBuf,
    /// Base directory joined with the tenant token to form home directories.
    pub data_dir: PathBuf,
    pub sftpgo: SftpgoSettings,
    /// `None` when `S3_ENDPOINT` is unset, which disables object storage
    /// for new users and CSV ingestion.
    pub object_store: Option<ObjectStoreSettings>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let endpoint = var("S3_ENDPOINT", "");
        let object_store = (!endpoint.is_empty()).then(|| ObjectStoreSettings {
            bucket: var("S3_BUCKET", "sftpgo"),
            region: var("S3_REGION", "us-east-1"),
            endpoint,
            access_key: var("S3_ACCESS_KEY", ""),
            secret_key: var("S3_SECRET_KEY", ""),
            use_ssl: lookup("S3_USE_SSL").as_deref() == Some("true"),
        });

        Self {
            listen_addr: var("LISTEN_ADDR", ":9090"),
            db_path: PathBuf::from(var("DB_PATH", "sftpgo-manager.db")),
            data_dir: PathBuf::from(var("DATA_DIR", "/srv/sftpgo/data")),
            sftpgo: SftpgoSettings {
                url: var("SFTPGO_URL", "http://localhost:8080"),
                admin_user: var("SFTPGO_ADMIN_USER", "admin"),
                admin_password: var("SFTPGO_ADMIN_PASS", "admin"),
            },
            object_store,
        }
    }

    /// Resolves `listen_addr`; a bare `:port` binds every interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        match self.listen_addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}").parse(),
            None => self.listen_addr.parse(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
