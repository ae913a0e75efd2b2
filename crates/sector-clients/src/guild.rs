//! Guild platform REST client
//!
//! One client covers the whole platform surface the engine needs:
//! member listing and role mutation for the reconciler, channel
//! messages as the primary notification channel, and an identity
//! probe for the connection supervisor.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use sector_engine::{ChannelError, GatewayError, GuildGateway, GuildMember, MemberId, NotifyChannel};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MEMBER_PAGE_LIMIT: u32 = 1000;

/// Bot-token REST client for the managed guild.
pub struct GuildClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    guild_id: String,
    channel_id: String,
    role_id: String,
}

#[derive(Debug, Deserialize)]
struct MemberRecord {
    user: UserRecord,
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    username: Option<String>,
}

fn member_from_record(record: MemberRecord, role_id: &str) -> GuildMember {
    GuildMember {
        id: MemberId::new(record.user.id),
        display_name: record.nick,
        has_role: record.roles.iter().any(|role| role == role_id),
    }
}

/// Cursor for the next member page: the last member id of this page.
/// The endpoint returns members sorted by id ascending.
fn page_cursor(records: &[MemberRecord]) -> Option<String> {
    records.last().map(|record| record.user.id.clone())
}

impl GuildClient {
    /// Client against the default platform API.
    pub fn new(
        token: impl Into<String>,
        guild_id: impl Into<String>,
        channel_id: impl Into<String>,
        role_id: impl Into<String>,
    ) -> ClientResult<Self> {
        Self::with_base_url(DEFAULT_API_URL, token, guild_id, channel_id, role_id)
    }

    /// Client against a specific base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        guild_id: impl Into<String>,
        channel_id: impl Into<String>,
        role_id: impl Into<String>,
    ) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            role_id: role_id.into(),
        })
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Probe the authenticated identity; used by the connection
    /// supervisor as its session heartbeat. A 401 is unrecoverable.
    pub async fn identity(&self) -> ClientResult<String> {
        let url = format!("{}/users/@me", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let user: UserRecord = response.json().await?;
        Ok(user.username.unwrap_or(user.id))
    }

    /// List the guild's members with their display names and whether
    /// each currently holds the managed role.
    ///
    /// The member endpoint is paginated; pages are fetched with an
    /// `after` cursor until a short page signals the end, so guilds
    /// larger than one page are listed in full.
    pub async fn list_members(&self) -> ClientResult<Vec<GuildMember>> {
        let mut members = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/guilds/{}/members?limit={}",
                self.base_url, self.guild_id, MEMBER_PAGE_LIMIT
            );
            if let Some(cursor) = &after {
                url.push_str("&after=");
                url.push_str(cursor);
            }

            let response = self
                .client
                .get(&url)
                .header("Authorization", self.auth_header())
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ClientError::Status {
                    status: status.as_u16(),
                });
            }

            let records: Vec<MemberRecord> = response.json().await?;
            let full_page = records.len() >= MEMBER_PAGE_LIMIT as usize;
            after = page_cursor(&records);

            members.extend(
                records
                    .into_iter()
                    .map(|record| member_from_record(record, &self.role_id)),
            );

            if !full_page || after.is_none() {
                break;
            }
        }

        Ok(members)
    }

    async fn mutate_role(&self, member: &MemberId, grant: bool) -> Result<(), GatewayError> {
        let url = format!(
            "{}/guilds/{}/members/{}/roles/{}",
            self.base_url, self.guild_id, member, self.role_id
        );

        let request = if grant {
            self.client.put(&url)
        } else {
            self.client.delete(&url)
        };

        let response = request
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 403 {
            return Err(GatewayError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "role mutation returned status {}",
                status.as_u16()
            )));
        }

        Ok(())
    }

    /// Post a message to the configured notification channel.
    pub async fn post_message(&self, content: &str) -> ClientResult<()> {
        let url = format!("{}/channels/{}/messages", self.base_url, self.channel_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl GuildGateway for GuildClient {
    async fn members(&self) -> Result<Vec<GuildMember>, GatewayError> {
        self.list_members()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }

    async fn grant_role(&self, member: &MemberId) -> Result<(), GatewayError> {
        self.mutate_role(member, true).await
    }

    async fn revoke_role(&self, member: &MemberId) -> Result<(), GatewayError> {
        self.mutate_role(member, false).await
    }
}

#[async_trait]
impl NotifyChannel for GuildClient {
    fn name(&self) -> &'static str {
        "guild"
    }

    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        self.post_message(text).await.map_err(|err| match err {
            ClientError::Http(e) if e.is_timeout() => ChannelError::Timeout,
            other => ChannelError::Send(other.to_string()),
        })
    }
}
