use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub mattermost: MattermostConfig,
    pub bot: BotConfig,
    pub channel: ChannelConfig,
    pub kudos: KudosConfig,
    pub report: ReportConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MattermostConfig {
    pub site_url: String,
    pub bot_token: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    pub username: String,
    pub display_name: String,
    pub description: String,
}

#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub name: String,
    pub display_name: String,
}

#[derive(Clone, Debug)]
pub struct KudosConfig {
    /// Raw hashtag entries; each may hold several newline-separated tags.
    pub hashtags: Vec<String>,
    pub stamps_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub utc_offset_minutes: i32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub public_url: String,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub mattermost_site_url: Option<String>,
    pub mattermost_bot_token: Option<String>,
    pub channel_name: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://peerpost.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            mattermost: MattermostConfig {
                site_url: "http://localhost:8065".to_string(),
                bot_token: String::new().into(),
                timeout_secs: 30,
            },
            bot: BotConfig {
                username: "peerbot".to_string(),
                display_name: "Peer Bot".to_string(),
                description: "Bot account used by the peerpost integration".to_string(),
            },
            channel: ChannelConfig {
                name: "peer-channel".to_string(),
                display_name: "Peer Recognition".to_string(),
            },
            kudos: KudosConfig {
                hashtags: vec![
                    "#challenge".to_string(),
                    "#behind-the-scenes".to_string(),
                    "#across-boundaries".to_string(),
                ],
                stamps_dir: PathBuf::from("assets/stamp"),
            },
            report: ReportConfig { utc_offset_minutes: 0 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                public_url: "http://localhost:8080".to_string(),
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ReportConfig {
    /// Offset whose midnight starts a report window.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("peerpost.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(mattermost) = patch.mattermost {
            if let Some(site_url) = mattermost.site_url {
                self.mattermost.site_url = site_url;
            }
            if let Some(bot_token_value) = mattermost.bot_token {
                self.mattermost.bot_token = secret_value(bot_token_value);
            }
            if let Some(timeout_secs) = mattermost.timeout_secs {
                self.mattermost.timeout_secs = timeout_secs;
            }
        }

        if let Some(bot) = patch.bot {
            if let Some(username) = bot.username {
                self.bot.username = username;
            }
            if let Some(display_name) = bot.display_name {
                self.bot.display_name = display_name;
            }
            if let Some(description) = bot.description {
                self.bot.description = description;
            }
        }

        if let Some(channel) = patch.channel {
            if let Some(name) = channel.name {
                self.channel.name = name;
            }
            if let Some(display_name) = channel.display_name {
                self.channel.display_name = display_name;
            }
        }

        if let Some(kudos) = patch.kudos {
            if let Some(hashtags) = kudos.hashtags {
                self.kudos.hashtags = hashtags;
            }
            if let Some(stamps_dir) = kudos.stamps_dir {
                self.kudos.stamps_dir = stamps_dir;
            }
        }

        if let Some(report) = patch.report {
            if let Some(utc_offset_minutes) = report.utc_offset_minutes {
                self.report.utc_offset_minutes = utc_offset_minutes;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(public_url) = server.public_url {
                self.server.public_url = public_url;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PEERPOST_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("PEERPOST_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_number("PEERPOST_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("PEERPOST_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_number("PEERPOST_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PEERPOST_MATTERMOST_SITE_URL") {
            self.mattermost.site_url = value;
        }
        if let Some(value) = read_env("PEERPOST_MATTERMOST_BOT_TOKEN") {
            self.mattermost.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("PEERPOST_MATTERMOST_TIMEOUT_SECS") {
            self.mattermost.timeout_secs =
                parse_number("PEERPOST_MATTERMOST_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PEERPOST_BOT_USERNAME") {
            self.bot.username = value;
        }
        if let Some(value) = read_env("PEERPOST_BOT_DISPLAY_NAME") {
            self.bot.display_name = value;
        }

        if let Some(value) = read_env("PEERPOST_CHANNEL_NAME") {
            self.channel.name = value;
        }
        if let Some(value) = read_env("PEERPOST_CHANNEL_DISPLAY_NAME") {
            self.channel.display_name = value;
        }

        if let Some(value) = read_env("PEERPOST_KUDOS_HASHTAGS") {
            self.kudos.hashtags = value
                .split([',', '\n'])
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(value) = read_env("PEERPOST_KUDOS_STAMPS_DIR") {
            self.kudos.stamps_dir = PathBuf::from(value);
        }

        if let Some(value) = read_env("PEERPOST_REPORT_UTC_OFFSET_MINUTES") {
            self.report.utc_offset_minutes =
                parse_number("PEERPOST_REPORT_UTC_OFFSET_MINUTES", &value)?;
        }

        if let Some(value) = read_env("PEERPOST_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PEERPOST_SERVER_PORT") {
            self.server.port = parse_number("PEERPOST_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PEERPOST_SERVER_PUBLIC_URL") {
            self.server.public_url = value;
        }
        if let Some(value) = read_env("PEERPOST_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_number("PEERPOST_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("PEERPOST_LOGGING_LEVEL").or_else(|| read_env("PEERPOST_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PEERPOST_LOGGING_FORMAT").or_else(|| read_env("PEERPOST_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(site_url) = overrides.mattermost_site_url {
            self.mattermost.site_url = site_url;
        }
        if let Some(bot_token) = overrides.mattermost_bot_token {
            self.mattermost.bot_token = secret_value(bot_token);
        }
        if let Some(channel_name) = overrides.channel_name {
            self.channel.name = channel_name;
        }
        if let Some(utc_offset_minutes) = overrides.utc_offset_minutes {
            self.report.utc_offset_minutes = utc_offset_minutes;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_mattermost(&self.mattermost)?;
        validate_channel(&self.channel)?;
        validate_kudos(&self.kudos)?;
        validate_report(&self.report)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("peerpost.toml"), PathBuf::from("config/peerpost.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_mattermost(mattermost: &MattermostConfig) -> Result<(), ConfigError> {
    if !is_http_url(&mattermost.site_url) {
        return Err(ConfigError::Validation(
            "mattermost.site_url must start with http:// or https://".to_string(),
        ));
    }

    if mattermost.bot_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "mattermost.bot_token is required. Create it under System Console > Integrations > Bot Accounts".to_string(),
        ));
    }

    if mattermost.timeout_secs == 0 || mattermost.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "mattermost.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_channel(channel: &ChannelConfig) -> Result<(), ConfigError> {
    let name = channel.name.trim();
    let valid = !name.is_empty()
        && name.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_');
    if !valid {
        return Err(ConfigError::Validation(
            "channel.name must be a non-empty lowercase channel handle (a-z, 0-9, `-`, `_`)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_kudos(kudos: &KudosConfig) -> Result<(), ConfigError> {
    let has_tag = kudos
        .hashtags
        .iter()
        .flat_map(|entry| entry.lines())
        .any(|tag| !tag.replace([' ', '#'], "").is_empty());
    if !has_tag {
        return Err(ConfigError::Validation(
            "kudos.hashtags must list at least one team hashtag".to_string(),
        ));
    }

    Ok(())
}

fn validate_report(report: &ReportConfig) -> Result<(), ConfigError> {
    if !(-720..=840).contains(&report.utc_offset_minutes) {
        return Err(ConfigError::Validation(
            "report.utc_offset_minutes must be in range -720..=840".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if !is_http_url(&server.public_url) {
        return Err(ConfigError::Validation(
            "server.public_url must start with http:// or https://".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    mattermost: Option<MattermostPatch>,
    bot: Option<BotPatch>,
    channel: Option<ChannelPatch>,
    kudos: Option<KudosPatch>,
    report: Option<ReportPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MattermostPatch {
    site_url: Option<String>,
    bot_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BotPatch {
    username: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelPatch {
    name: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct KudosPatch {
    hashtags: Option<Vec<String>>,
    stamps_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportPatch {
    utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    public_url: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_MATTERMOST_BOT_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("peerpost.toml");
            fs::write(
                &path,
                r##"
[mattermost]
site_url = "https://chat.example.com"
bot_token = "${TEST_MATTERMOST_BOT_TOKEN}"

[kudos]
hashtags = ["#kaizen", "#ownership"]
"##,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.mattermost.bot_token.expose_secret() == "token-from-env",
                "bot token should be loaded from environment",
            )?;
            ensure(
                config.mattermost.site_url == "https://chat.example.com",
                "site url should come from the file",
            )?;
            ensure(config.kudos.hashtags.len() == 2, "hashtags should come from the file")?;
            Ok(())
        })();

        clear_vars(&["TEST_MATTERMOST_BOT_TOKEN"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PEERPOST_MATTERMOST_BOT_TOKEN", "token-test");
        env::set_var("PEERPOST_LOG_LEVEL", "warn");
        env::set_var("PEERPOST_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["PEERPOST_MATTERMOST_BOT_TOKEN", "PEERPOST_LOG_LEVEL", "PEERPOST_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PEERPOST_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("PEERPOST_MATTERMOST_BOT_TOKEN", "token-from-env");
        env::set_var("PEERPOST_REPORT_UTC_OFFSET_MINUTES", "540");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("peerpost.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[mattermost]
bot_token = "token-from-file"

[report]
utc_offset_minutes = 60

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.mattermost.bot_token.expose_secret() == "token-from-env",
                "env bot token should win over file and defaults",
            )?;
            ensure(
                config.report.utc_offset().local_minus_utc() == 540 * 60,
                "env utc offset should win over the file",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "PEERPOST_DATABASE_URL",
            "PEERPOST_MATTERMOST_BOT_TOKEN",
            "PEERPOST_REPORT_UTC_OFFSET_MINUTES",
        ]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        clear_vars(&["PEERPOST_MATTERMOST_BOT_TOKEN"]);

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure but config load succeeded".to_string()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("mattermost.bot_token")
        );
        ensure(has_message, "validation failure should mention mattermost.bot_token")
    }

    #[test]
    fn empty_hashtag_list_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PEERPOST_MATTERMOST_BOT_TOKEN", "token-test");
        env::set_var("PEERPOST_KUDOS_HASHTAGS", " #, # ");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected hashtag validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("kudos.hashtags")),
                "validation failure should mention kudos.hashtags",
            )
        })();

        clear_vars(&["PEERPOST_MATTERMOST_BOT_TOKEN", "PEERPOST_KUDOS_HASHTAGS"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PEERPOST_MATTERMOST_BOT_TOKEN", "bot-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("bot-secret-value"), "debug output should not contain token")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["PEERPOST_MATTERMOST_BOT_TOKEN"]);
        result
    }
}
