use crate::server::response::ApiError;

const MAX_USERNAME_LEN: usize = 255;

/// SFTP usernames end up as a path segment in SFTPGo API URLs.
pub fn validate_username(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::bad_request("username is required"));
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(ApiError::bad_request(
            "username cannot contain whitespace or '/'",
        ));
    }
    Ok(())
}
