//! Source Reader: loads the whole raw transaction file into memory.
//!
//! The header is checked against [`RAW_SCHEMA`] before any row is parsed, so a
//! renamed or missing column fails here instead of surfacing later as a join
//! mismatch.

pub mod local;
pub mod object_store;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::config::SourceConfig;
use crate::error::ExtractionError;
use crate::types::{self, Discount, FieldType, FieldValue, RawTransaction, RAW_SCHEMA};

pub use local::LocalFileReader;
pub use object_store::ObjectStoreReader;

#[async_trait]
pub trait SourceReader: Send + Sync {
    fn location(&self) -> String;
    async fn read(&self) -> Result<Vec<RawTransaction>, ExtractionError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Local(PathBuf),
    Http(String),
    ObjectStore { bucket: String, key: String },
}

impl SourceLocation {
    pub fn parse(raw: &str) -> Result<Self, ExtractionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ExtractionError::Location("empty source location".to_string()));
        }
        if let Some(rest) = raw.strip_prefix("s3://") {
            return match rest.split_once('/') {
                Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                    Ok(SourceLocation::ObjectStore {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    })
                }
                _ => Err(ExtractionError::Location(format!(
                    "expected s3://<bucket>/<key>, got {raw}"
                ))),
            };
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(SourceLocation::Http(raw.to_string()));
        }
        Ok(SourceLocation::Local(expand_home(raw)))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Local(path) => write!(f, "{}", path.display()),
            SourceLocation::Http(url) => write!(f, "{url}"),
            SourceLocation::ObjectStore { bucket, key } => write!(f, "s3://{bucket}/{key}"),
        }
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(raw),
    }
}

/// Builds the reader matching the configured location.
pub fn reader_for(config: &SourceConfig) -> Result<Box<dyn SourceReader>, ExtractionError> {
    match SourceLocation::parse(&config.location)? {
        SourceLocation::Local(path) => Ok(Box::new(LocalFileReader::new(path))),
        SourceLocation::Http(url) => Ok(Box::new(ObjectStoreReader::new(
            url,
            config.object_store_token.clone(),
            config.timeout_seconds,
        )?)),
        SourceLocation::ObjectStore { bucket, key } => Ok(Box::new(ObjectStoreReader::for_object(
            &config.object_store_endpoint,
            &bucket,
            &key,
            config.object_store_token.clone(),
            config.timeout_seconds,
        )?)),
    }
}

/// Parses a delimited payload into typed rows.
pub fn parse_transactions(bytes: &[u8]) -> Result<Vec<RawTransaction>, ExtractionError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(bytes);

    let columns = validate_header(reader.headers()?)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(parse_record(&record, &columns)?);
    }
    Ok(rows)
}

/// A schema column and where it sits in the source header.
struct Column {
    name: &'static str,
    field_type: FieldType,
    position: usize,
}

fn validate_header(header: &StringRecord) -> Result<Vec<Column>, ExtractionError> {
    let mut positions: HashMap<&'static str, usize> = HashMap::new();
    let mut unexpected = Vec::new();
    let mut duplicated = Vec::new();
    for (idx, name) in header.iter().enumerate() {
        match RAW_SCHEMA.iter().find(|(column, _)| *column == name) {
            Some((column, _)) => {
                if positions.insert(*column, idx).is_some() {
                    duplicated.push(name.to_string());
                }
            }
            None => unexpected.push(name.to_string()),
        }
    }
    let missing: Vec<String> = RAW_SCHEMA
        .iter()
        .filter(|(column, _)| !positions.contains_key(column))
        .map(|(column, _)| column.to_string())
        .collect();

    if !(missing.is_empty() && unexpected.is_empty() && duplicated.is_empty()) {
        return Err(ExtractionError::Schema {
            missing,
            unexpected,
            duplicated,
        });
    }

    Ok(RAW_SCHEMA
        .iter()
        .filter_map(|(name, field_type)| {
            positions.get(name).map(|&position| Column {
                name: *name,
                field_type: *field_type,
                position,
            })
        })
        .collect())
}

/// Fields of one record, parsed per [`RAW_SCHEMA`] and keyed by column.
struct TypedRecord {
    line: u64,
    values: HashMap<&'static str, FieldValue>,
}

impl TypedRecord {
    fn parse(record: &StringRecord, columns: &[Column]) -> Result<Self, ExtractionError> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let mut values = HashMap::with_capacity(columns.len());
        for column in columns {
            let raw = record.get(column.position).unwrap_or("");
            let value = column
                .field_type
                .parse(raw)
                .map_err(|reason| ExtractionError::InvalidField {
                    line,
                    column: column.name,
                    value: raw.to_string(),
                    reason,
                })?;
            values.insert(column.name, value);
        }
        Ok(Self { line, values })
    }

    fn take(&mut self, column: &'static str) -> FieldValue {
        self.values.remove(column).unwrap_or(FieldValue::Null)
    }

    fn mismatch(&self, column: &'static str, expected: &str) -> ExtractionError {
        ExtractionError::InvalidField {
            line: self.line,
            column,
            value: String::new(),
            reason: format!("expected a {expected} value"),
        }
    }

    fn integer(&mut self, column: &'static str) -> Result<i64, ExtractionError> {
        match self.take(column) {
            FieldValue::Integer(v) => Ok(v),
            _ => Err(self.mismatch(column, "integer")),
        }
    }

    fn decimal(&mut self, column: &'static str) -> Result<f64, ExtractionError> {
        match self.take(column) {
            FieldValue::Decimal(v) => Ok(v),
            _ => Err(self.mismatch(column, "decimal")),
        }
    }

    fn timestamp(&mut self, column: &'static str) -> Result<NaiveDateTime, ExtractionError> {
        match self.take(column) {
            FieldValue::Timestamp(v) => Ok(v),
            _ => Err(self.mismatch(column, "timestamp")),
        }
    }

    fn text(&mut self, column: &'static str) -> Result<String, ExtractionError> {
        match self.take(column) {
            FieldValue::Text(v) => Ok(v),
            _ => Err(self.mismatch(column, "text")),
        }
    }

    fn nullable_text(&mut self, column: &'static str) -> Result<Option<String>, ExtractionError> {
        match self.take(column) {
            FieldValue::Text(v) => Ok(Some(v)),
            FieldValue::Null => Ok(None),
            _ => Err(self.mismatch(column, "text")),
        }
    }

    fn discount(&mut self, column: &'static str) -> Result<Discount, ExtractionError> {
        match self.take(column) {
            FieldValue::Discount(v) => Ok(v),
            _ => Err(self.mismatch(column, "flag or decimal")),
        }
    }
}

fn parse_record(record: &StringRecord, columns: &[Column]) -> Result<RawTransaction, ExtractionError> {
    let mut fields = TypedRecord::parse(record, columns)?;

    Ok(RawTransaction {
        transaction_id: fields.integer(types::TRANSACTION_ID)?,
        timestamp: fields.timestamp(types::DATE)?,
        customer_name: fields.text(types::CUSTOMER_NAME)?,
        customer_category: fields.text(types::CUSTOMER_CATEGORY)?,
        season: fields.text(types::SEASON)?,
        store_type: fields.text(types::STORE_TYPE)?,
        city: fields.text(types::CITY)?,
        payment_method: fields.text(types::PAYMENT_METHOD)?,
        promotion: fields.nullable_text(types::PROMOTION)?,
        product: fields.text(types::PRODUCT)?,
        total_items: fields.integer(types::TOTAL_ITEMS)?,
        total_cost: fields.decimal(types::TOTAL_COST)?,
        discount_applied: fields.discount(types::DISCOUNT_APPLIED)?,
    })
}
