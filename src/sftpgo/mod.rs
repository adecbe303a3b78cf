//! Client for the SFTPGo administrative REST API and the user descriptor
//! shared by provisioning and the external auth hook.

mod client;
mod dto;
mod error;

pub use client::SftpgoClient;
pub use dto::{
    Filesystem, RemoteUser, S3Filesystem, STATUS_ENABLED, SecretPayload, SftpgoUser,
    full_access_permissions,
};
pub use error::SftpgoError;
