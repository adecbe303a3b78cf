mod server;

pub use server::{AppConfig, ObjectStoreSettings, SftpgoSettings};
