//! Upload-event driven CSV ingestion into the records table.

mod csv;
mod error;
mod worker;

pub use self::csv::{ColumnMap, IngestReport, ingest_csv};
pub use error::IngestError;
pub use worker::{IngestWorker, UploadEvent, is_csv_path, object_key};
