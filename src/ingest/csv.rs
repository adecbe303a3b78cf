use std::collections::HashMap;
use std::io::Read;
use std::num::ParseFloatError;

use ::csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::warn;

use super::IngestError;
use crate::store::Store;
use crate::types::RecordUpsert;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub upserted: usize,
    pub skipped: usize,
    /// Set when a malformed line stopped the read before the end of the file.
    pub truncated: bool,
}

#[derive(Debug, Error)]
enum RowError {
    #[error("row has no {0} field")]
    MissingField(&'static str),

    #[error("invalid value {value:?}: {source}")]
    InvalidValue {
        value: String,
        source: ParseFloatError,
    },
}

/// Header name to field index, matched case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    key: usize,
    title: usize,
    value: usize,
    description: Option<usize>,
    category: Option<usize>,
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> Result<Self, IngestError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();

        let required = |name: &'static str| {
            index
                .get(name)
                .copied()
                .ok_or(IngestError::MissingColumn(name))
        };

        Ok(Self {
            key: required("key")?,
            title: required("title")?,
            value: required("value")?,
            description: index.get("description").copied(),
            category: index.get("category").copied(),
        })
    }

    fn record(&self, tenant_token: &str, row: &StringRecord) -> Result<RecordUpsert, RowError> {
        let field = |idx: usize, name: &'static str| {
            row.get(idx).map(str::trim).ok_or(RowError::MissingField(name))
        };
        let optional = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let raw_value = field(self.value, "value")?;
        let value = raw_value
            .parse::<f64>()
            .map_err(|source| RowError::InvalidValue {
                value: raw_value.to_string(),
                source,
            })?;

        Ok(RecordUpsert {
            tenant_token: tenant_token.to_string(),
            record_key: field(self.key, "key")?.to_string(),
            title: field(self.title, "title")?.to_string(),
            description: optional(self.description),
            category: optional(self.category),
            value,
        })
    }
}

/// Reads a CSV document and upserts every usable row for `tenant_token`.
///
/// A header lacking `key`, `title` or `value` rejects the whole file before
/// anything is written. Rows with an unparseable value or a failed upsert are
/// logged and skipped.
pub fn ingest_csv<R: Read>(
    store: &dyn Store,
    tenant_token: &str,
    reader: R,
) -> Result<IngestReport, IngestError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::from_headers(reader.headers()?)?;

    let mut report = IngestReport::default();
    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(tenant = tenant_token, "csv read error, stopping: {e}");
                report.truncated = true;
                break;
            }
        };
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let record = match columns.record(tenant_token, &row) {
            Ok(record) => record,
            Err(e) => {
                warn!(tenant = tenant_token, line, "skipping row: {e}");
                report.skipped += 1;
                continue;
            }
        };

        if let Err(e) = store.upsert_record(&record) {
            warn!(tenant = tenant_token, line, key = %record.record_key, "upsert failed: {e}");
            report.skipped += 1;
            continue;
        }
        report.upserted += 1;
    }

    Ok(report)
}
