//! Local CSV contact source. Expects a header row with at least `Name`
//! and `Phone` columns.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::{ContactRecord, ContactSource, SourceError};

pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContactSource for CsvSource {
    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }

    async fn fetch(&self) -> Result<Vec<ContactRecord>, SourceError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let fields = headers
                .iter()
                .cloned()
                .zip(record.iter().map(|v| v.to_string()))
                .collect();
            rows.push(ContactRecord::new(fields));
        }
        Ok(rows)
    }
}
