use thiserror::Error;

#[derive(Debug, Error)]
pub enum SftpgoError {
    #[error("sftpgo request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sftpgo token request failed ({status}): {body}")]
    Token { status: u16, body: String },

    #[error("user {0} not found in sftpgo")]
    UserNotFound(String),

    #[error("sftpgo {operation} ({status}): {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
}
