// src/sheets/google/mod.rs
//! Google Sheets v4 backed [`SheetStore`].
//!
//! The client starts uninitialized. The first operation (or an explicit
//! [`GoogleSheetsClient::initialize`]) resolves credentials, validates the key
//! and exchanges the first access token; the resulting session lives until the
//! client is closed. A failed initialization is not remembered, so the next
//! caller tries again and sees the same error.

pub mod credentials;
pub mod token;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::settings::{CredentialSettings, Settings};
use crate::sheets::error::{SheetError, SheetResult};
use crate::sheets::range;
use crate::sheets::record::cell_text;
use crate::sheets::store::{SheetStore, SpreadsheetInfo, WriteReceipt};
use credentials::CredentialSource;
use token::{AssertionSigner, TokenProvider};

const VALUE_INPUT_OPTION: &str = "USER_ENTERED";
const INSERT_DATA_OPTION: &str = "INSERT_ROWS";
const METADATA_FIELDS: &str = "properties.title,sheets.properties.title";

struct Session {
    tokens: TokenProvider,
}

pub struct GoogleSheetsClient {
    spreadsheet_id: String,
    api_base: Url,
    credentials: CredentialSettings,
    http: reqwest::Client,
    session: OnceCell<Session>,
}

impl GoogleSheetsClient {
    pub fn new(settings: &Settings) -> SheetResult<Self> {
        let mut base = settings.api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base = Url::parse(&base)
            .map_err(|e| SheetError::Config(format!("invalid SHEETS_API_BASE {:?}: {}", base, e)))?;
        Ok(Self {
            spreadsheet_id: settings.spreadsheet_id.clone(),
            api_base,
            credentials: settings.credentials.clone(),
            http: reqwest::Client::new(),
            session: OnceCell::new(),
        })
    }

    /// Authenticates once; later calls return immediately.
    pub async fn initialize(&self) -> SheetResult<()> {
        self.session().await.map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.session.initialized()
    }

    /// Drops the authenticated session along with the client.
    pub fn close(self) {
        if self.is_initialized() {
            info!("Closing Google Sheets session for {}", self.spreadsheet_id);
        }
    }

    async fn session(&self) -> SheetResult<&Session> {
        self.session
            .get_or_try_init(|| async {
                let source = CredentialSource::resolve(&self.credentials);
                info!("Using {} for Google Sheets", source.describe());
                let key = source.load()?;
                let tokens = TokenProvider::new(AssertionSigner::new(&key)?);
                tokens.bearer(&self.http).await?;
                info!("Google Sheets authentication successful");
                Ok::<_, SheetError>(Session { tokens })
            })
            .await
            .map_err(|e| {
                error!("Google Sheets authentication error: {}", e);
                e
            })
    }

    fn spreadsheet_url(&self) -> SheetResult<Url> {
        self.url_with(&["spreadsheets", &self.spreadsheet_id])
    }

    fn values_url(&self, range: &str) -> SheetResult<Url> {
        self.url_with(&["spreadsheets", &self.spreadsheet_id, "values", range])
    }

    fn url_with(&self, segments: &[&str]) -> SheetResult<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetError::Config(format!("{} cannot be used as an API base", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> SheetResult<T> {
        let session = self.session().await?;
        let bearer = session.tokens.bearer(&self.http).await?;
        let response = request.bearer_auth(bearer).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Api { status: status.as_u16(), message: parse_api_error(&body) });
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl ValueRange {
    fn into_grid(self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_range: Option<String>,
    #[serde(default)]
    updated_rows: u32,
    #[serde(default)]
    updated_cells: u32,
}

impl From<UpdateValuesResponse> for WriteReceipt {
    fn from(r: UpdateValuesResponse) -> Self {
        WriteReceipt {
            updated_range: r.updated_range,
            updated_rows: r.updated_rows,
            updated_cells: r.updated_cells,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AppendValuesResponse {
    #[serde(default)]
    updates: UpdateValuesResponse,
}

#[derive(Debug, Default, Deserialize)]
struct TitleProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    #[serde(default)]
    properties: TitleProperties,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    properties: TitleProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

impl From<Spreadsheet> for SpreadsheetInfo {
    fn from(s: Spreadsheet) -> Self {
        SpreadsheetInfo {
            success: true,
            title: s.properties.title,
            sheets: s.sheets.into_iter().map(|e| e.properties.title).collect(),
        }
    }
}

/// Best-effort human message from a Google error body.
pub(crate) fn parse_api_error(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = v.pointer("/error/message").and_then(Value::as_str) {
            return msg.to_string();
        }
        if let Some(desc) = v.get("error_description").and_then(Value::as_str) {
            return desc.to_string();
        }
        if let Some(code) = v.get("error").and_then(Value::as_str) {
            return code.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    async fn get_sheet_data(&self, tab: &str, range: Option<&str>) -> SheetResult<Vec<Vec<String>>> {
        let result = async {
            let url = self.values_url(&range::tab_range(tab, range))?;
            let values: ValueRange = self.send(self.http.get(url)).await?;
            Ok::<_, SheetError>(values.into_grid())
        }
        .await;
        result.map_err(|e| {
            error!("Error getting sheet data from {}: {}", tab, e);
            e
        })
    }

    async fn append_to_sheet(&self, tab: &str, values: &[String]) -> SheetResult<WriteReceipt> {
        let result = async {
            let url = self.values_url(&format!("{}:append", range::append_range(tab)))?;
            let request = self
                .http
                .post(url)
                .query(&[
                    ("valueInputOption", VALUE_INPUT_OPTION),
                    ("insertDataOption", INSERT_DATA_OPTION),
                ])
                .json(&json!({ "values": [values] }));
            let response: AppendValuesResponse = self.send(request).await?;
            Ok::<_, SheetError>(WriteReceipt::from(response.updates))
        }
        .await;
        match result {
            Ok(receipt) => {
                info!("Data appended to {}", tab);
                Ok(receipt)
            }
            Err(e) => {
                error!("Error appending to sheet {}: {}", tab, e);
                Err(e)
            }
        }
    }

    async fn update_row(&self, tab: &str, row_index: usize, values: &[String]) -> SheetResult<WriteReceipt> {
        if row_index == 0 {
            return Err(SheetError::InvalidRow(row_index));
        }
        let result = async {
            let range = range::row_range(tab, row_index);
            // values.update keeps cells beyond the end of `values`; clear first.
            let clear_url = self.values_url(&format!("{}:clear", range))?;
            let _: Value = self.send(self.http.post(clear_url).json(&json!({}))).await?;

            let url = self.values_url(&range)?;
            let request = self
                .http
                .put(url)
                .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
                .json(&json!({ "range": range, "majorDimension": "ROWS", "values": [values] }));
            let response: UpdateValuesResponse = self.send(request).await?;
            Ok::<_, SheetError>(WriteReceipt::from(response))
        }
        .await;
        match result {
            Ok(receipt) => {
                info!("Row {} updated in {}", row_index, tab);
                Ok(receipt)
            }
            Err(e) => {
                error!("Error updating row in {}: {}", tab, e);
                Err(e)
            }
        }
    }

    async fn test_connection(&self) -> SheetResult<SpreadsheetInfo> {
        let result = async {
            let url = self.spreadsheet_url()?;
            let request = self.http.get(url).query(&[("fields", METADATA_FIELDS)]);
            let spreadsheet: Spreadsheet = self.send(request).await?;
            Ok::<_, SheetError>(SpreadsheetInfo::from(spreadsheet))
        }
        .await;
        match result {
            Ok(info) => {
                info!("Connected to spreadsheet: {}", info.title);
                Ok(info)
            }
            Err(e) => {
                error!("Google Sheets connection test failed: {}", e);
                Err(e)
            }
        }
    }
}
