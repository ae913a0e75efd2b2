//! sectord - controller presence monitoring daemon
//!
//! The daemon wires together:
//! - The presence reconciliation and notification engine
//! - HTTP clients for the feed, roster, weather and messaging services
//! - A platform connection supervisor with indefinite reconnect
//! - An operator console for weather/status/shutdown commands

use clap::Parser;
use sector_clients::{FeedClient, GuildClient, RosterClient, TelegramClient, WeatherClient};
use sector_engine::{Dispatcher, Engine, StatusTracker};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod connection;
mod error;

use commands::{Command, CommandContext};
use config::DaemonConfig;
use connection::ConnectionSupervisor;
use error::{DaemonError, DaemonResult};

/// Sector Watch daemon CLI
#[derive(Parser)]
#[command(name = "sectord")]
#[command(about = "Sector Watch - controller presence monitoring daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SECTOR_CONFIG")]
    config: Option<String>,

    /// Log level (overrides the [logging] config section)
    #[arg(long, env = "SECTOR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging (overrides the [logging] config section)
    #[arg(long, env = "SECTOR_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;
    config.validate()?;

    // Initialize tracing; CLI arguments override the [logging] section
    let (level, json) = config.logging.resolve(cli.log_level.as_deref(), cli.json);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let callsigns = config::load_callsigns(&config.tracking.callsigns_file);
    if callsigns.is_empty() {
        tracing::error!(
            path = %config.tracking.callsigns_file,
            "No tracked callsigns loaded; presence monitoring will be idle"
        );
    }

    println!(
        "Sector Watch {} - tracking {} positions",
        env!("CARGO_PKG_VERSION"),
        callsigns.len()
    );

    // Outbound clients
    let guild = Arc::new(GuildClient::new(
        &config.guild.bot_token,
        &config.guild.guild_id,
        &config.guild.channel_id,
        &config.guild.role_id,
    )?);
    let telegram = Arc::new(TelegramClient::new(
        &config.telegram.token,
        &config.telegram.chat_id,
    )?);
    let feed = Arc::new(FeedClient::with_url(&config.feed.url)?);
    let roster = Arc::new(RosterClient::with_url(
        &config.roster.url,
        &config.roster.api_key,
    )?);
    let weather = Arc::new(WeatherClient::with_base_url(
        &config.weather.url,
        &config.weather.api_key,
    )?);

    // Engine
    let dispatcher = Dispatcher::new(guild.clone(), telegram);
    let engine = Engine::new(
        config.scheduler.engine_config(),
        StatusTracker::new(callsigns),
        feed,
        roster,
        guild.clone(),
        dispatcher,
    );

    // Platform connection supervisor
    let supervisor = ConnectionSupervisor::new(guild.clone());

    // Operator console
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let commands = Arc::new(CommandContext::new(
        engine.tracker(),
        weather,
        config.guild.owner_id,
        shutdown_tx,
    ));
    tokio::spawn(operator_console(commands, config.guild.owner_id));

    tracing::info!("Starting daemon tasks");
    let engine_handle = tokio::spawn(engine.clone().start());

    let result = tokio::select! {
        res = supervisor.run() => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
        _ = shutdown_rx.recv() => {
            tracing::info!("Shutdown command received");
            Ok(())
        }
    };

    engine.stop().await;
    engine_handle.abort();

    result
}

/// Read operator commands from stdin, one per line.
///
/// Stdin is only reachable from the daemon's own terminal, so every
/// line is attributed to the configured operator; the per-command
/// permission check still applies for any other transport wired onto
/// [`CommandContext`].
async fn operator_console(commands: Arc<CommandContext>, operator_id: u64) {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Some(command) => {
                let reply = commands.handle(operator_id, command).await;
                println!("{reply}");
            }
            None => println!("Unknown command: {line}"),
        }
    }
}
