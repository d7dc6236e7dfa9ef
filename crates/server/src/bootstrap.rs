use std::sync::Arc;

use peerpost_chat::{ensure_channels, ClientError, MattermostClient, SharedSettings};
use peerpost_core::config::{AppConfig, ChannelConfig, ConfigError, LoadOptions};
use peerpost_core::domain::channel::ChannelDirectory;
use peerpost_core::domain::user::UserId;
use peerpost_core::errors::CollaboratorError;
use peerpost_core::ports::SettingsSnapshot;
use peerpost_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub client: Arc<MattermostClient>,
    pub settings: SharedSettings,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("bot identity lookup failed: {0}")]
    Identity(#[source] CollaboratorError),
    #[error("channel provisioning failed: {0}")]
    Provision(#[source] CollaboratorError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let client = Arc::new(MattermostClient::from_config(&config.mattermost)?);
    let bot = client.me().await.map_err(BootstrapError::Identity)?;
    info!(
        event_name = "system.bootstrap.bot_resolved",
        correlation_id = "bootstrap",
        bot_user_id = %bot.id,
        username = %bot.username,
        "bot identity resolved"
    );
    if let Err(error) = client.sync_bot_profile(&bot.id, &config.bot).await {
        warn!(
            event_name = "system.bootstrap.bot_profile_skipped",
            correlation_id = "bootstrap",
            configured_username = %config.bot.username,
            error = %error,
            "bot profile left unchanged"
        );
    }

    let channels =
        ensure_channels(client.as_ref(), &config.channel.name, &config.channel.display_name)
            .await
            .map_err(BootstrapError::Provision)?;

    let settings = Arc::new(RwLock::new(snapshot(&config, channels, bot.id)));

    Ok(Application { config, db_pool, client, settings })
}

pub fn snapshot(
    config: &AppConfig,
    channels: ChannelDirectory,
    bot_user_id: UserId,
) -> SettingsSnapshot {
    SettingsSnapshot {
        channels,
        bot_user_id,
        utc_offset: config.report.utc_offset(),
        site_url: config.mattermost.site_url.trim_end_matches('/').to_owned(),
        public_url: config.server.public_url.trim_end_matches('/').to_owned(),
    }
}

/// Re-runs channel provisioning on SIGHUP so teams the bot joined later get a channel.
#[cfg(unix)]
pub async fn refresh_on_hangup(
    client: Arc<MattermostClient>,
    channel: ChannelConfig,
    settings: SharedSettings,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(hangups) => hangups,
        Err(error) => {
            warn!(
                event_name = "system.provision.signal_unavailable",
                error = %error,
                "SIGHUP handler could not be installed"
            );
            return;
        }
    };

    while hangups.recv().await.is_some() {
        match ensure_channels(client.as_ref(), &channel.name, &channel.display_name).await {
            Ok(channels) => {
                let teams = channels.len();
                settings.write().await.channels = channels;
                info!(
                    event_name = "system.provision.refreshed",
                    correlation_id = "sighup",
                    teams,
                    "channel directory refreshed"
                );
            }
            Err(error) => warn!(
                event_name = "system.provision.refresh_failed",
                correlation_id = "sighup",
                error = %error,
                "channel directory refresh failed; keeping previous mapping"
            ),
        }
    }
}
