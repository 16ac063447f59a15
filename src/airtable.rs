use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::DashboardError;
use crate::models::{FetchQuery, RawRecord};

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RecordPage {
    records: Vec<RawRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Typed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        message: Option<String>,
    },
    Plain(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordDump {
    Page(RecordPage),
    Records(Vec<RawRecord>),
}

/// Read-only client for the hosted table service.
#[derive(Debug, Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    api_url: Url,
    api_key: String,
}

impl AirtableClient {
    pub fn new(api_url: &str, api_key: impl Into<String>) -> Result<Self, DashboardError> {
        let api_url = Url::parse(api_url)
            .map_err(|e| DashboardError::RemoteUnavailable(format!("invalid api url: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(DashboardError::RemoteUnavailable(format!(
                "invalid api url: {api_url}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DashboardError::RemoteUnavailable(format!("http client: {e}")))?;

        Ok(Self {
            http,
            api_url,
            api_key: api_key.into(),
        })
    }

    pub fn page_url(&self, query: &FetchQuery, offset: Option<&str>) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&query.base_id).push(&query.table);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("view", &query.view);
            for field in &query.fields {
                pairs.append_pair("fields[]", field.column_name());
            }
            if let Some(offset) = offset {
                pairs.append_pair("offset", offset);
            }
        }
        url
    }

    /// Reads every record visible through the query's view, following the
    /// pagination cursor until the service stops returning one.
    #[instrument(name = "airtable_fetch", skip(self), fields(base = %query.base_id, table = %query.table, view = %query.view))]
    pub async fn fetch_records(&self, query: &FetchQuery) -> Result<Vec<RawRecord>, DashboardError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let url = self.page_url(query, offset.as_deref());
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.api_key)
                .send()
                .await
                .map_err(|e| DashboardError::RemoteUnavailable(format!("request failed: {e}")))?;

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                DashboardError::RemoteUnavailable(format!("read body failed: {e}"))
            })?;
            if !status.is_success() {
                return Err(classify_failure(status, &body));
            }

            let page: RecordPage = serde_json::from_str(&body).map_err(|e| {
                DashboardError::RemoteUnavailable(format!("undecodable response: {e}"))
            })?;
            pages += 1;
            debug!(page = pages, records = page.records.len(), "received page");
            records.extend(page.records);

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        info!(pages, records = records.len(), "fetched diagnostic records");
        Ok(records)
    }
}

/// Error types the service returns when a base, table, view, or field
/// name is not recognised.
const SCHEMA_ERROR_TYPES: &[&str] = &[
    "UNKNOWN_FIELD_NAME",
    "VIEW_NAME_NOT_FOUND",
    "TABLE_NOT_FOUND",
    "NOT_FOUND",
    "MODEL_ID_NOT_FOUND",
    "INVALID_PERMISSIONS_OR_MODEL_NOT_FOUND",
];

/// Maps a non-success response onto the error taxonomy. A typed error body
/// is classified by its type whatever the status; an untyped one falls back
/// to the status, where 404 and 422 mean an unrecognised name.
pub fn classify_failure(status: StatusCode, body: &str) -> DashboardError {
    let (kind, detail) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: ErrorDetail::Typed { kind, message },
        }) => {
            let detail = match message {
                Some(message) => format!("{kind}: {message}"),
                None => kind.clone(),
            };
            (Some(kind), detail)
        }
        Ok(ErrorBody {
            error: ErrorDetail::Plain(kind),
        }) => (Some(kind.clone()), kind),
        Err(_) => (None, body.trim().to_string()),
    };
    let message = format!("status {status}: {detail}");

    let schema = match kind {
        Some(kind) => SCHEMA_ERROR_TYPES.contains(&kind.as_str()),
        None => matches!(
            status,
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
        ),
    };
    if schema {
        DashboardError::RemoteSchema(message)
    } else {
        DashboardError::RemoteUnavailable(message)
    }
}

/// Where raw records come from: the live service or a saved JSON dump of it.
#[derive(Debug, Clone)]
pub enum RecordSource {
    Remote(AirtableClient),
    Snapshot(PathBuf),
}

impl RecordSource {
    pub async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawRecord>, DashboardError> {
        match self {
            RecordSource::Remote(client) => client.fetch_records(query).await,
            RecordSource::Snapshot(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    DashboardError::RemoteUnavailable(format!(
                        "cannot read snapshot {}: {e}",
                        path.display()
                    ))
                })?;
                let records = parse_snapshot(&text)?;
                info!(path = %path.display(), records = records.len(), "loaded record snapshot");
                Ok(records)
            }
        }
    }
}

/// Accepts either a bare record array or a single page body.
pub fn parse_snapshot(text: &str) -> Result<Vec<RawRecord>, DashboardError> {
    let dump: RecordDump = serde_json::from_str(text)
        .map_err(|e| DashboardError::RemoteUnavailable(format!("undecodable snapshot: {e}")))?;
    Ok(match dump {
        RecordDump::Page(page) => page.records,
        RecordDump::Records(records) => records,
    })
}
