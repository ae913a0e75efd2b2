//! Live-session feed client
//!
//! Read-only GET against the network data feed. Every call is a live
//! fetch: no caching, no inline retry. A failed cycle is simply
//! absorbed into the next scheduled one by the caller.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use sector_engine::{FeedSource, SourceError};
use sector_types::{Callsign, Cid, LiveSession};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_FEED_URL: &str = "https://data.vatsim.net/v3/vatsim-data.json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the live-session feed.
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
}

/// Feed document; only the controller collection matters here.
#[derive(Debug, Deserialize)]
struct FeedDocument {
    controllers: Option<Vec<SessionRecord>>,
}

#[derive(Debug, Deserialize)]
struct SessionRecord {
    callsign: String,
    name: Option<String>,
    cid: Option<u64>,
}

impl FeedClient {
    /// Client against the default feed URL.
    pub fn new() -> ClientResult<Self> {
        Self::with_url(DEFAULT_FEED_URL)
    }

    /// Client against a specific feed URL.
    pub fn with_url(url: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Fetch the current set of live sessions.
    ///
    /// Transport success, a non-empty body, parseable JSON and the
    /// presence of the top-level controller collection are all
    /// required; any violation is an error the caller treats as an
    /// empty cycle.
    pub async fn fetch_sessions(&self) -> ClientResult<Vec<LiveSession>> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(ClientError::EmptyBody);
        }

        let document: FeedDocument = serde_json::from_slice(&body)?;
        let records = document
            .controllers
            .ok_or(ClientError::MissingField("controllers"))?;

        Ok(records
            .into_iter()
            .map(|record| LiveSession {
                callsign: Callsign::new(&record.callsign),
                name: record.name.unwrap_or_else(|| "Unknown".to_string()),
                cid: record.cid.map(Cid::from).unwrap_or_else(|| Cid::from("Unknown")),
            })
            .collect())
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch(&self) -> Result<Vec<LiveSession>, SourceError> {
        self.fetch_sessions().await.map_err(|err| {
            tracing::error!(error = %err, "Failed to fetch live-session feed");
            err.into()
        })
    }
}
