//! Configuration for sectord
//!
//! Settings resolve once at startup and are immutable for the process
//! lifetime. Missing required secrets abort startup immediately.

use crate::error::{DaemonError, DaemonResult};
use sector_engine::EngineConfig;
use sector_types::Callsign;
use serde::{Deserialize, Serialize};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Guild platform settings
    #[serde(default)]
    pub guild: GuildConfig,

    /// Secondary messaging channel settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Live-session feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Roster service settings
    #[serde(default)]
    pub roster: RosterConfig,

    /// Weather lookup settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Tracked-callsign list settings
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Engine cycle cadences
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Guild platform configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildConfig {
    /// Bot token
    #[serde(default)]
    pub bot_token: String,

    /// Managed guild id
    #[serde(default)]
    pub guild_id: String,

    /// Notification channel id (primary channel)
    #[serde(default)]
    pub channel_id: String,

    /// Online-controller role id
    #[serde(default)]
    pub role_id: String,

    /// Operator allowed to invoke privileged commands
    #[serde(default)]
    pub owner_id: u64,
}

/// Secondary messaging channel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token
    #[serde(default)]
    pub token: String,

    /// Destination chat id
    #[serde(default)]
    pub chat_id: String,
}

/// Live-session feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed URL
    #[serde(default = "default_feed_url")]
    pub url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
        }
    }
}

/// Roster service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Roster endpoint URL
    #[serde(default = "default_roster_url")]
    pub url: String,

    /// API key for the roster service
    #[serde(default)]
    pub api_key: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            url: default_roster_url(),
            api_key: String::new(),
        }
    }
}

/// Weather lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather API base URL
    #[serde(default = "default_weather_url")]
    pub url: String,

    /// API key for the weather service
    #[serde(default)]
    pub api_key: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            url: default_weather_url(),
            api_key: String::new(),
        }
    }
}

/// Tracked-callsign list configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Line-delimited callsign list file
    #[serde(default = "default_callsigns_file")]
    pub callsigns_file: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            callsigns_file: default_callsigns_file(),
        }
    }
}

/// Engine cadence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Presence poll period in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Membership reconciliation period in seconds
    #[serde(default = "default_poll_interval")]
    pub reconcile_interval_secs: u64,

    /// Roster refresh period in seconds
    #[serde(default = "default_roster_interval")]
    pub roster_refresh_interval_secs: u64,

    /// Pause after a failed cycle in seconds
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            reconcile_interval_secs: default_poll_interval(),
            roster_refresh_interval_secs: default_roster_interval(),
            error_backoff_secs: default_error_backoff(),
        }
    }
}

impl SchedulerConfig {
    /// Map onto the engine's cadence settings.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            poll_interval_secs: self.poll_interval_secs,
            reconcile_interval_secs: self.reconcile_interval_secs,
            roster_refresh_interval_secs: self.roster_refresh_interval_secs,
            error_backoff_secs: self.error_backoff_secs,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Resolve the effective log settings: CLI arguments override the
    /// configuration file, which overrides the defaults.
    pub fn resolve(&self, cli_level: Option<&str>, cli_json: bool) -> (String, bool) {
        let level = cli_level.unwrap_or(&self.level).to_string();
        let json = cli_json || self.json;
        (level, json)
    }
}

// Default value helpers
fn default_feed_url() -> String {
    "https://data.vatsim.net/v3/vatsim-data.json".to_string()
}

fn default_roster_url() -> String {
    "https://core.vateud.net/api/facility/roster".to_string()
}

fn default_weather_url() -> String {
    "https://api.checkwx.com".to_string()
}

fn default_callsigns_file() -> String {
    "callsigns.txt".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_roster_interval() -> u64 {
    3600
}

fn default_error_backoff() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file, and
    /// `SECTOR_`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SECTOR")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject a configuration missing required settings.
    pub fn validate(&self) -> DaemonResult<()> {
        let required = [
            ("guild.bot_token", &self.guild.bot_token),
            ("guild.guild_id", &self.guild.guild_id),
            ("guild.channel_id", &self.guild.channel_id),
            ("guild.role_id", &self.guild.role_id),
            ("telegram.token", &self.telegram.token),
            ("telegram.chat_id", &self.telegram.chat_id),
            ("roster.api_key", &self.roster.api_key),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DaemonError::Config(format!("{name} is not set")));
            }
        }

        Ok(())
    }
}

/// Load the tracked-callsign list from a line-delimited text file.
///
/// Blank lines are skipped. A read failure is logged and yields an
/// empty list rather than aborting startup.
pub fn load_callsigns(path: &str) -> Vec<Callsign> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Callsign::new)
            .collect(),
        Err(err) => {
            tracing::error!(path, error = %err, "Failed to load callsigns");
            Vec::new()
        }
    }
}
