//! Google Sheets v4 backend for [`RowGrid`].
//!
//! One client per process, explicitly constructed via [`SheetsClient::connect`]
//! and injected where needed; there is no ambient singleton. The service
//! account credential (email + RSA private key) is exchanged for a bearer token
//! once and the token is cached until shortly before expiry. Sheet titles map
//! to numeric sheet ids, which the row-deletion API requires; that mapping is
//! cached from spreadsheet metadata and refreshed on miss.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::config::StoreConfig;
use crate::store::grid::{GridMetadata, RowGrid, StoreError};

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Refresh the access token when it has less than this long to live.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct GrantResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct SheetsClient {
    http: reqwest::Client,
    spreadsheet_id: String,
    service_account_email: String,
    signing_key: EncodingKey,
    token: RwLock<Option<CachedToken>>,
    sheet_ids: RwLock<HashMap<String, i64>>,
}

impl SheetsClient {
    /// Validate credentials and reachability up front, returning a ready handle
    /// or `Unavailable`. Fetches an access token and the spreadsheet metadata.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.spreadsheet_id.is_empty() {
            return Err(StoreError::Unavailable(
                "spreadsheet id is not configured".to_string(),
            ));
        }
        let signing_key = EncodingKey::from_rsa_pem(config.service_account_private_key.as_bytes())
            .map_err(|e| StoreError::Unavailable(format!("invalid service account key: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let client = Self {
            http,
            spreadsheet_id: config.spreadsheet_id.clone(),
            service_account_email: config.service_account_email.clone(),
            signing_key,
            token: RwLock::new(None),
            sheet_ids: RwLock::new(HashMap::new()),
        };

        client.refresh_sheet_ids().await?;
        tracing::info!(spreadsheet = %client.spreadsheet_id, "connected to backing spreadsheet");
        Ok(client)
    }

    async fn bearer_token(&self) -> Result<String, StoreError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                let remaining = token.expires_at - Utc::now();
                if remaining.num_seconds() > TOKEN_REFRESH_MARGIN_SECS {
                    return Ok(token.value.clone());
                }
            }
        }

        let now = Utc::now();
        let claims = GrantClaims {
            iss: &self.service_account_email,
            scope: SHEETS_SCOPE,
            aud: TOKEN_URI,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(1)).timestamp(),
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| StoreError::Unavailable(format!("failed to sign token grant: {e}")))?;

        let response = self
            .http
            .post(TOKEN_URI)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("token grant failed: {e}")))?;
        let response = Self::check_status("token grant", response).await?;
        let grant: GrantResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("malformed token response: {e}")))?;

        let token = CachedToken {
            value: grant.access_token,
            expires_at: now + chrono::Duration::seconds(grant.expires_in),
        };
        let value = token.value.clone();
        *self.token.write().await = Some(token);
        Ok(value)
    }

    async fn check_status(
        context: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Unavailable(format!(
            "{context}: HTTP {status}: {}",
            body.chars().take(300).collect::<String>()
        )))
    }

    async fn get_json(&self, url: &str, context: &str) -> Result<Value, StoreError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("{context}: {e}")))?;
        let response = Self::check_status(context, response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("{context}: malformed response: {e}")))
    }

    async fn post_json(&self, url: &str, body: Value, context: &str) -> Result<Value, StoreError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("{context}: {e}")))?;
        let response = Self::check_status(context, response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("{context}: malformed response: {e}")))
    }

    /// Re-read spreadsheet metadata and rebuild the title -> sheetId map.
    async fn refresh_sheet_ids(&self) -> Result<(), StoreError> {
        let url = format!("{SHEETS_BASE}/{}?fields=sheets.properties", self.spreadsheet_id);
        let body = self.get_json(&url, "spreadsheet metadata").await?;

        let mut ids = HashMap::new();
        if let Some(sheets) = body.get("sheets").and_then(Value::as_array) {
            for sheet in sheets {
                let props = &sheet["properties"];
                if let (Some(title), Some(id)) =
                    (props["title"].as_str(), props["sheetId"].as_i64())
                {
                    ids.insert(title.to_string(), id);
                }
            }
        }
        *self.sheet_ids.write().await = ids;
        Ok(())
    }

    async fn sheet_id(&self, table: &str) -> Result<i64, StoreError> {
        if let Some(id) = self.sheet_ids.read().await.get(table) {
            return Ok(*id);
        }
        self.refresh_sheet_ids().await?;
        self.sheet_ids
            .read()
            .await
            .get(table)
            .copied()
            .ok_or_else(|| StoreError::Unavailable(format!("no sheet titled '{table}'")))
    }

    fn cell_to_string(cell: &Value) -> String {
        match cell {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl RowGrid for SheetsClient {
    async fn fetch_grid(&self, table: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let url = format!(
            "{SHEETS_BASE}/{}/values/{}?majorDimension=ROWS",
            self.spreadsheet_id, table
        );
        let body = self.get_json(&url, "values get").await?;
        let rows = body
            .get("values")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| cells.iter().map(Self::cell_to_string).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn append_row(&self, table: &str, values: Vec<String>) -> Result<(), StoreError> {
        let url = format!(
            "{SHEETS_BASE}/{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.spreadsheet_id, table
        );
        self.post_json(&url, json!({ "values": [values] }), "values append")
            .await?;
        Ok(())
    }

    async fn update_row(
        &self,
        table: &str,
        row_index: usize,
        values: Vec<String>,
    ) -> Result<(), StoreError> {
        // Row indices are 1-based; A0 is not a range
        if row_index == 0 {
            return Err(StoreError::Unavailable(format!(
                "row index 0 out of range for sheet '{table}'"
            )));
        }
        let range = format!("{table}!A{row_index}");
        let url = format!(
            "{SHEETS_BASE}/{}/values/{range}?valueInputOption=RAW",
            self.spreadsheet_id
        );
        let token = self.bearer_token().await?;
        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": [values] }))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("values update: {e}")))?;
        Self::check_status("values update", response).await?;
        Ok(())
    }

    async fn delete_row(&self, table: &str, row_index: usize) -> Result<(), StoreError> {
        // Row indices are 1-based; the 0-based dimension range below would
        // otherwise underflow
        if row_index == 0 {
            return Err(StoreError::Unavailable(format!(
                "row index 0 out of range for sheet '{table}'"
            )));
        }
        let sheet_id = self.sheet_id(table).await?;
        let url = format!("{SHEETS_BASE}/{}:batchUpdate", self.spreadsheet_id);
        // The dimension API is 0-based and end-exclusive
        self.post_json(
            &url,
            json!({
                "requests": [{
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": row_index - 1,
                            "endIndex": row_index
                        }
                    }
                }]
            }),
            "row delete",
        )
        .await?;
        Ok(())
    }

    async fn create_table(&self, table: &str) -> Result<(), StoreError> {
        if self.sheet_ids.read().await.contains_key(table) {
            return Ok(());
        }
        let url = format!("{SHEETS_BASE}/{}:batchUpdate", self.spreadsheet_id);
        self.post_json(
            &url,
            json!({ "requests": [{ "addSheet": { "properties": { "title": table } } }] }),
            "sheet create",
        )
        .await?;
        self.refresh_sheet_ids().await
    }

    async fn grid_metadata(&self, table: &str) -> Result<GridMetadata, StoreError> {
        let url = format!(
            "{SHEETS_BASE}/{}?fields=sheets.properties",
            self.spreadsheet_id
        );
        let body = self.get_json(&url, "spreadsheet metadata").await?;
        let sheets = body
            .get("sheets")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for sheet in &sheets {
            let props = &sheet["properties"];
            if props["title"].as_str() == Some(table) {
                let grid = &props["gridProperties"];
                return Ok(GridMetadata {
                    row_count: grid["rowCount"].as_u64().unwrap_or(0) as usize,
                    column_count: grid["columnCount"].as_u64().unwrap_or(0) as usize,
                });
            }
        }
        Err(StoreError::Unavailable(format!("no sheet titled '{table}'")))
    }
}
