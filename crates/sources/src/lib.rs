//! Contact sources: where the {Name, Phone} rows come from.
//!
//! Providers are tried in priority order (remote sheet, configured CSV,
//! bundled example contacts); a failing provider is reported and the
//! resolver falls through to the next one. Nothing raises past this
//! boundary.

pub mod csv_file;
pub mod sheets;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use wacast_core::config::AppConfig;
use wacast_core::path_utils;

use crate::csv_file::CsvSource;
use crate::sheets::SheetsSource;

/// Example contacts shipped with the repository, used as the last resort.
pub const EXAMPLE_CONTACTS_FILE: &str = "assets/contacts_example.csv";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("credentials error: {message}")]
    Credentials { message: String },

    #[error("unexpected response: {message}")]
    Response { message: String },
}

/// One row from a tabular source, keyed by the header row.
/// Field order is preserved; key lookup is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    fields: Vec<(String, String)>,
}

impl ContactRecord {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

#[async_trait]
pub trait ContactSource: Send + Sync {
    /// Label for log lines ("Google Sheet <id>", "CSV file contacts.csv").
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<ContactRecord>, SourceError>;
}

/// Tries each source in order and returns the first non-empty result
/// together with its label. Failures are logged, never propagated.
pub async fn resolve_contacts(
    sources: &[Box<dyn ContactSource>],
) -> Option<(String, Vec<ContactRecord>)> {
    for source in sources {
        match source.fetch().await {
            Ok(rows) if !rows.is_empty() => {
                info!("Loaded {} rows from {}", rows.len(), source.describe());
                return Some((source.describe(), rows));
            }
            Ok(_) => warn!("{} returned no rows, trying next source", source.describe()),
            Err(e) => warn!("{} unavailable: {}", source.describe(), e),
        }
    }
    None
}

/// Builds the source priority for a run: the remote sheet when a sheet id
/// is configured and the credentials file exists, then the configured CSV,
/// then the bundled example contacts.
pub fn default_sources(config: &AppConfig) -> Vec<Box<dyn ContactSource>> {
    let mut sources: Vec<Box<dyn ContactSource>> = Vec::new();

    if let Some(sheet_id) = config.sheet_id.as_deref().filter(|s| !s.is_empty()) {
        match path_utils::resolve_input_path(&config.credentials_file) {
            Some(creds) => sources.push(Box::new(SheetsSource::new(sheet_id, creds))),
            None => warn!(
                "No credentials file at {}, skipping the Google Sheets source",
                config.credentials_file
            ),
        }
    }

    if let Some(path) = path_utils::resolve_input_path(&config.contacts_file) {
        sources.push(Box::new(CsvSource::new(path)));
    }

    if let Some(path) = path_utils::resolve_input_path(EXAMPLE_CONTACTS_FILE) {
        sources.push(Box::new(CsvSource::new(path)));
    }

    sources
}
