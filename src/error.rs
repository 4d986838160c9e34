use thiserror::Error;

/// Failures while obtaining or parsing the raw transaction dataset.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error reading {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object store returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid source location: {0}")]
    Location(String),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Header mismatch: missing columns {missing:?}, unexpected columns {unexpected:?}, duplicated columns {duplicated:?}")]
    Schema {
        missing: Vec<String>,
        unexpected: Vec<String>,
        duplicated: Vec<String>,
    },

    #[error("Line {line}, column {column}: cannot parse {value:?} ({reason})")]
    InvalidField {
        line: u64,
        column: &'static str,
        value: String,
        reason: String,
    },
}

/// An invariant of dimension construction or the fact join was violated.
#[derive(Error, Debug)]
pub enum SchemaBuildError {
    #[error("Transaction {transaction_id}: no {dimension} row for key {key}")]
    UnresolvedKey {
        dimension: &'static str,
        key: String,
        transaction_id: i64,
    },
}

/// The warehouse could not be reached or rejected a write.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to connect to warehouse {target}: {message}")]
    Connect { target: String, message: String },

    #[error("Failed to append to {table}: {message}")]
    Append { table: String, message: String },

    #[error("Failed to apply warehouse schema: {0}")]
    Schema(String),
}

/// Any failure of the extract → transform → load run.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Star schema build failed: {0}")]
    SchemaBuild(#[from] SchemaBuildError),

    #[error("Load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
