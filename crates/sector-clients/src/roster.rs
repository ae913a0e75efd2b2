//! Authenticated roster service client
//!
//! The upstream sits behind basic anti-automation checks, so the
//! transport presents ordinary browser headers alongside the API key.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use sector_engine::{RosterSnapshot, RosterSource, SourceError};
use sector_types::Cid;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_ROSTER_URL: &str = "https://core.vateud.net/api/facility/roster";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Client for the facility roster service.
pub struct RosterClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    success: bool,
    data: Option<RosterData>,
}

#[derive(Debug, Deserialize)]
struct RosterData {
    #[serde(default)]
    staff: Vec<StaffEntry>,
    #[serde(default)]
    controllers: Vec<IdValue>,
}

/// Staff entries arrive either as flat records or grouped lists.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StaffEntry {
    Group(Vec<StaffMember>),
    Member(StaffMember),
}

#[derive(Debug, Deserialize)]
struct StaffMember {
    cid: Option<IdValue>,
}

/// Identities arrive as numbers or strings; both coerce to [`Cid`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Num(u64),
    Str(String),
}

impl From<IdValue> for Cid {
    fn from(value: IdValue) -> Self {
        match value {
            IdValue::Num(id) => Cid::from(id),
            IdValue::Str(id) => Cid::from(id),
        }
    }
}

impl RosterClient {
    /// Client against the default roster endpoint.
    pub fn new(api_key: impl Into<String>) -> ClientResult<Self> {
        Self::with_url(DEFAULT_ROSTER_URL, api_key)
    }

    /// Client against a specific roster endpoint.
    pub fn with_url(url: impl Into<String>, api_key: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }

    /// Fetch the roster: staff and controller identities.
    ///
    /// Non-200 status or `success != true` is a failure; the caller's
    /// cache stays untouched in that case.
    pub async fn fetch_roster(&self) -> ClientResult<RosterSnapshot> {
        tracing::debug!("Requesting facility roster");

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Roster service responded");

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: RosterResponse = response.json().await?;
        if !parsed.success {
            return Err(ClientError::Api("roster service returned error status".into()));
        }
        let data = parsed.data.ok_or(ClientError::MissingField("data"))?;

        let mut staff = Vec::new();
        for entry in data.staff {
            match entry {
                StaffEntry::Member(member) => {
                    if let Some(cid) = member.cid {
                        staff.push(Cid::from(cid));
                    }
                }
                StaffEntry::Group(members) => {
                    staff.extend(members.into_iter().filter_map(|m| m.cid.map(Cid::from)));
                }
            }
        }

        let controllers: Vec<Cid> = data.controllers.into_iter().map(Cid::from).collect();

        tracing::info!(
            staff = staff.len(),
            controllers = controllers.len(),
            "Roster fetched"
        );

        Ok(RosterSnapshot { staff, controllers })
    }
}

#[async_trait]
impl RosterSource for RosterClient {
    async fn fetch(&self) -> Result<RosterSnapshot, SourceError> {
        self.fetch_roster().await.map_err(SourceError::from)
    }
}
