use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, instrument};

use super::{parse_transactions, SourceReader};
use crate::error::ExtractionError;
use crate::types::RawTransaction;

/// Reads the transaction file from the local file system.
pub struct LocalFileReader {
    path: PathBuf,
}

impl LocalFileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SourceReader for LocalFileReader {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(location = %self.path.display()))]
    async fn read(&self) -> Result<Vec<RawTransaction>, ExtractionError> {
        info!("Extracting transactions from local file");
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ExtractionError::Io {
                location: self.location(),
                source,
            })?;
        let rows = parse_transactions(&bytes)?;
        info!("Extracted {} transactions", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "Transaction_ID,Date,Customer_Name,Product,Total_Items,Total_Cost,Payment_Method,City,Store_Type,Discount_Applied,Customer_Category,Season,Promotion"
        )
        .unwrap();
        writeln!(
            file,
            "42,2023-03-15 10:00:00,Ann Lee,Milk,1,3.5,Cash,Boston,Pharmacy,False,Student,Spring,Discount10"
        )
        .unwrap();

        let rows = LocalFileReader::new(file.path()).read().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_id, 42);
    }

    #[tokio::test]
    async fn missing_file_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let reader = LocalFileReader::new(dir.path().join("nope.csv"));
        assert!(matches!(reader.read().await, Err(ExtractionError::Io { .. })));
    }
}
