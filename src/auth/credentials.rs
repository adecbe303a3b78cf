use rand::RngCore;

/// Length of an encoded API key: 32 random bytes as hex.
pub const API_KEY_LEN: usize = 64;

const API_KEY_BYTES: usize = 32;
const PASSWORD_BYTES: usize = 16;
const TENANT_TOKEN_BYTES: usize = 16;

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generates a management API key (64 hex chars).
#[must_use]
pub fn generate_api_key() -> String {
    random_hex(API_KEY_BYTES)
}

/// Generates an SFTP password for tenants created without one (32 hex chars).
#[must_use]
pub fn generate_password() -> String {
    random_hex(PASSWORD_BYTES)
}

/// Generates the opaque tenant token used as the object key prefix (32 hex chars).
#[must_use]
pub fn generate_tenant_token() -> String {
    random_hex(TENANT_TOKEN_BYTES)
}

/// Checks the shape of a presented key before touching the registry.
#[must_use]
pub fn is_api_key_format(key: &str) -> bool {
    key.len() == API_KEY_LEN && key.bytes().all(|b| b.is_ascii_hexdigit())
}
