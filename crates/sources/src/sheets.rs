//! Google Sheets contact source.
//!
//! Authenticates with a service-account key file using the OAuth2
//! JWT-bearer grant and reads the first worksheet of the configured
//! spreadsheet. The header row keys the records.

use std::path::PathBuf;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ContactRecord, ContactSource, SourceError};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
/// A sheet-less range addresses the first visible worksheet.
const VALUES_RANGE: &str = "A1:ZZ100000";

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct SheetsSource {
    sheet_id: String,
    key_path: PathBuf,
    api_base: String,
    client: reqwest::Client,
}

impl SheetsSource {
    pub fn new(sheet_id: impl Into<String>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            key_path: key_path.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Points the source at a different API host (used by tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn load_key(&self) -> Result<ServiceAccountKey, SourceError> {
        let content = std::fs::read_to_string(&self.key_path)?;
        let key: ServiceAccountKey = serde_json::from_str(&content)?;
        if key.private_key.is_empty() {
            return Err(SourceError::Credentials {
                message: format!("{} has an empty private_key", self.key_path.display()),
            });
        }
        Ok(key)
    }

    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String, SourceError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &key.client_email,
            scope: SHEETS_SCOPE,
            aud: &key.token_uri,
            iat,
            exp: iat + 3600,
        };
        let assertion = encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &EncodingKey::from_rsa_pem(key.private_key.as_bytes())?,
        )?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Response {
                message: format!("token endpoint returned {}", response.status()),
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetches all rows of the first worksheet with a ready access token.
    pub async fn fetch_values(&self, token: &str) -> Result<Vec<ContactRecord>, SourceError> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.api_base, self.sheet_id, VALUES_RANGE
        );
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Response {
                message: format!("sheets API returned {}", response.status()),
            });
        }

        let values: ValuesResponse = response.json().await?;
        Ok(records_from_values(&values.values))
    }
}

#[async_trait]
impl ContactSource for SheetsSource {
    fn describe(&self) -> String {
        format!("Google Sheet {}", self.sheet_id)
    }

    async fn fetch(&self) -> Result<Vec<ContactRecord>, SourceError> {
        let key = self.load_key()?;
        debug!("Authenticating to Google Sheets as {}", key.client_email);
        let token = self.access_token(&key).await?;
        self.fetch_values(&token).await
    }
}

/// Maps a raw value grid onto header-keyed records. The first row is the
/// header; ragged data rows are padded with empty cells.
pub fn records_from_values(values: &[Vec<serde_json::Value>]) -> Vec<ContactRecord> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let headers: Vec<String> = header.iter().map(cell_to_string).collect();

    rows.iter()
        .map(|row| {
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), row.get(i).map(cell_to_string).unwrap_or_default()))
                .collect();
            ContactRecord::new(fields)
        })
        .collect()
}

fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
