mod credentials;
mod middleware;

pub use credentials::{
    API_KEY_LEN, generate_api_key, generate_password, generate_tenant_token, is_api_key_format,
};
pub use middleware::{AuthError, RequireApiKey};
