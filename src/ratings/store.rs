//! Rating persistence.
//!
//! Ratings are append-only. They are written either to a Google Sheets
//! spreadsheet through the values API or to a local JSON file. Both stores
//! return rows in the same positional column order so the aggregator does
//! not care where they came from.

use crate::config::{RatingsConfig, StoreBackend};
use crate::models::RatingRecord;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Where submitted ratings live.
pub enum RatingStore {
    Sheets(SheetsStore),
    Local(LocalStore),
}

impl RatingStore {
    /// Build the store selected in the ratings configuration.
    pub fn from_config(config: &RatingsConfig, timeout_seconds: u64) -> Result<Self> {
        match config.backend {
            StoreBackend::Sheets => {
                if config.sheet_id.trim().is_empty() {
                    anyhow::bail!("Sheets backend needs [ratings].sheet_id in the config file");
                }

                let api_key = config
                    .api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .context("Sheets backend needs an API key (set SHEETS_API_KEY or [ratings].api_key)")?;

                let store = SheetsStore::new(
                    config.sheet_id.clone(),
                    config.sheet_name.clone(),
                    api_key,
                    timeout_seconds,
                )?;
                let access_token = config.access_token.clone().filter(|t| !t.is_empty());
                Ok(Self::Sheets(store.with_access_token(access_token)))
            }
            StoreBackend::Local => Ok(Self::Local(LocalStore::new(&config.local_path))),
        }
    }

    /// Append one rating.
    pub async fn append(&self, record: &RatingRecord) -> Result<()> {
        match self {
            Self::Sheets(store) => store.append(record).await,
            Self::Local(store) => store.append(record).await,
        }
    }

    /// All stored rating rows, oldest first, without any header row.
    pub async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
        match self {
            Self::Sheets(store) => store.fetch_rows().await,
            Self::Local(store) => store.fetch_rows().await,
        }
    }

    /// Human-readable location of the store.
    pub fn describe(&self) -> String {
        match self {
            Self::Sheets(store) => format!("Google Sheet {} ({})", store.sheet_id, store.sheet_name),
            Self::Local(store) => store.path.display().to_string(),
        }
    }
}

/// Google Sheets values API response.
#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Ratings stored in a spreadsheet, one row per rating.
///
/// Reads use the API key. Appends need an OAuth access token, since the
/// Sheets API only accepts API keys for reading public sheets.
pub struct SheetsStore {
    http_client: reqwest::Client,
    sheet_id: String,
    sheet_name: String,
    api_key: String,
    access_token: Option<String>,
    timeout_seconds: u64,
}

impl SheetsStore {
    pub fn new(
        sheet_id: String,
        sheet_name: String,
        api_key: String,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            sheet_id,
            sheet_name,
            api_key,
            access_token: None,
            timeout_seconds,
        })
    }

    /// Set the OAuth access token used for appends.
    pub fn with_access_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token;
        self
    }

    fn values_url(&self) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_API_URL, self.sheet_id, self.sheet_name
        )
    }

    fn append_url(&self) -> String {
        format!("{}!A:F:append", self.values_url())
    }

    fn map_send_error(&self, e: reqwest::Error) -> anyhow::Error {
        if e.is_timeout() {
            anyhow::anyhow!("Sheets request timed out after {}s", self.timeout_seconds)
        } else if e.is_connect() {
            anyhow::anyhow!("Cannot connect to the Sheets API")
        } else {
            anyhow::anyhow!("Failed to send Sheets request: {}", e)
        }
    }

    fn append_request(&self, record: &RatingRecord) -> Result<reqwest::RequestBuilder> {
        let access_token = self.access_token.as_deref().context(
            "Appending to Google Sheets needs an OAuth access token \
             (set SHEETS_ACCESS_TOKEN or [ratings].access_token), or use backend = \"local\"",
        )?;

        let body = json!({ "values": [record.to_row()] });

        Ok(self
            .http_client
            .post(self.append_url())
            .query(&[("valueInputOption", "USER_ENTERED")])
            .bearer_auth(access_token)
            .json(&body))
    }

    async fn append(&self, record: &RatingRecord) -> Result<()> {
        let request = self.append_request(record)?;

        debug!("Appending rating row to sheet {}", self.sheet_id);

        let response = request
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Sheets API error {}: {}", status, body));
        }

        info!("Rating appended to sheet {}", self.sheet_id);
        Ok(())
    }

    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
        info!("Fetching ratings from sheet {}", self.sheet_id);

        let response = self
            .http_client
            .get(self.values_url())
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Failed to load ratings: {} {}", status, body));
        }

        let range: ValueRange = response
            .json()
            .await
            .context("Failed to parse Sheets response")?;

        let rows = rows_from_value_range(range);
        debug!("Sheet returned {} rating rows", rows.len());
        Ok(rows)
    }
}

/// Stringify sheet cells and drop the header row.
fn rows_from_value_range(range: ValueRange) -> Vec<Vec<String>> {
    range
        .values
        .into_iter()
        .skip(1)
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect()
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Ratings kept in a JSON file on this machine.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn load(&self) -> Result<Vec<RatingRecord>> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to access ratings file: {}", self.path.display()))?;
        if !exists {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read ratings file: {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse ratings file: {}", self.path.display()))
    }

    async fn append(&self, record: &RatingRecord) -> Result<()> {
        let mut records = self.load().await?;
        records.push(record.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Sibling temp file, then rename over the original
        let content = serde_json::to_string_pretty(&records)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, content)
            .await
            .with_context(|| format!("Failed to write ratings file: {}", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace ratings file: {}", self.path.display()))?;

        info!(
            "Rating saved to {} ({} total)",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
        let records = self.load().await?;
        Ok(records.iter().map(RatingRecord::to_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(feedback: &str) -> RatingRecord {
        RatingRecord {
            timestamp: "2026-10-19T10:00:00.000Z".to_string(),
            mirror: 2,
            novelty: 1,
            actionability: 2,
            average: 72,
            feedback: feedback.to_string(),
        }
    }

    #[test]
    fn test_rows_from_value_range_skips_header() {
        let range: ValueRange = serde_json::from_str(
            r#"{"range":"Sheet1!A1:F3","values":[
                ["Timestamp","Mirror","Novelty","Actionability","Average","Feedback"],
                ["2026-10-19T10:00:00.000Z","3","2","2","100","great"],
                ["2026-10-19T11:00:00.000Z",1,0,null]
            ]}"#,
        )
        .unwrap();

        let rows = rows_from_value_range(range);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][5], "great");
        assert_eq!(rows[1], vec!["2026-10-19T11:00:00.000Z", "1", "0", ""]);
    }

    #[test]
    fn test_rows_from_empty_sheet() {
        let range: ValueRange = serde_json::from_str(r#"{"range":"Sheet1"}"#).unwrap();
        assert!(rows_from_value_range(range).is_empty());
    }

    #[test]
    fn test_sheets_urls() {
        let store = SheetsStore::new(
            "abc123".to_string(),
            "Sheet1".to_string(),
            "key".to_string(),
            30,
        )
        .unwrap();

        assert_eq!(
            store.values_url(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Sheet1"
        );
        assert!(store.append_url().ends_with("/values/Sheet1!A:F:append"));
    }

    fn sheets_store() -> SheetsStore {
        SheetsStore::new(
            "abc123".to_string(),
            "Sheet1".to_string(),
            "read-key".to_string(),
            30,
        )
        .unwrap()
    }

    #[test]
    fn test_sheets_append_requires_access_token() {
        let store = sheets_store();

        let err = tokio_test::block_on(store.append(&record("hi"))).unwrap_err();
        assert!(err.to_string().contains("SHEETS_ACCESS_TOKEN"));
    }

    #[test]
    fn test_sheets_append_uses_bearer_token() {
        let store = sheets_store().with_access_token(Some("oauth-token".to_string()));

        let request = store.append_request(&record("hi")).unwrap().build().unwrap();

        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Bearer oauth-token"
        );
        assert_eq!(request.url().query(), Some("valueInputOption=USER_ENTERED"));
        assert!(request.url().path().ends_with("/values/Sheet1!A:F:append"));
    }

    #[test]
    fn test_local_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("ratings.json"));

        let rows = tokio_test::block_on(store.fetch_rows()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_local_store_append_and_fetch() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("nested").join("ratings.json"));

        tokio_test::block_on(async {
            store.append(&record("first")).await.unwrap();
            store.append(&record("")).await.unwrap();
        });

        let rows = tokio_test::block_on(store.fetch_rows()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec!["2026-10-19T10:00:00.000Z", "2", "1", "2", "72", "first"]
        );
        assert_eq!(rows[1][5], "");
    }

    #[test]
    fn test_local_store_append_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratings.json");
        let store = LocalStore::new(&path);

        tokio_test::block_on(store.append(&record("kept"))).unwrap();

        assert!(path.exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.temp_path(), dir.path().join("ratings.json.tmp"));

        let saved: Vec<RatingRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].feedback, "kept");
    }

    #[cfg(unix)]
    #[test]
    fn test_local_store_reports_inaccessible_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();

        // Stat through a regular file fails with something other than NotFound
        let store = LocalStore::new(blocker.join("ratings.json"));
        let err = tokio_test::block_on(store.fetch_rows()).unwrap_err();
        assert!(err.to_string().contains("Failed to access ratings file"));
    }

    #[test]
    fn test_local_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratings.json");
        std::fs::write(&path, "not json").unwrap();

        let store = LocalStore::new(&path);
        assert!(tokio_test::block_on(store.fetch_rows()).is_err());
    }

    #[test]
    fn test_from_config_sheets_requires_key() {
        let config = RatingsConfig {
            backend: StoreBackend::Sheets,
            sheet_id: "abc123".to_string(),
            api_key: None,
            ..RatingsConfig::default()
        };
        assert!(RatingStore::from_config(&config, 30).is_err());

        let config = RatingsConfig {
            backend: StoreBackend::Sheets,
            api_key: Some("key".to_string()),
            ..RatingsConfig::default()
        };
        assert!(RatingStore::from_config(&config, 30).is_err());

        let config = RatingsConfig {
            backend: StoreBackend::Sheets,
            sheet_id: "abc123".to_string(),
            api_key: Some("key".to_string()),
            access_token: Some("oauth-token".to_string()),
            ..RatingsConfig::default()
        };
        assert!(matches!(
            RatingStore::from_config(&config, 30),
            Ok(RatingStore::Sheets(ref store)) if store.access_token.as_deref() == Some("oauth-token")
        ));

        let config = RatingsConfig {
            backend: StoreBackend::Local,
            ..RatingsConfig::default()
        };
        assert!(matches!(
            RatingStore::from_config(&config, 30),
            Ok(RatingStore::Local(_))
        ));
    }
}
