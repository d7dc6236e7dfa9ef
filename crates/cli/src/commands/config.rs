use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use peerpost_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run(options: LoadOptions) -> String {
    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let entries: Vec<(&str, String, &[&str])> = vec![
        ("database.url", config.database.url.clone(), &["PEERPOST_DATABASE_URL"] as &[&str]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["PEERPOST_DATABASE_MAX_CONNECTIONS"] as &[&str],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["PEERPOST_DATABASE_TIMEOUT_SECS"] as &[&str],
        ),
        ("mattermost.site_url", config.mattermost.site_url.clone(), &["PEERPOST_MATTERMOST_SITE_URL"] as &[&str]),
        (
            "mattermost.bot_token",
            redact_token(config.mattermost.bot_token.expose_secret()),
            &["PEERPOST_MATTERMOST_BOT_TOKEN"] as &[&str],
        ),
        (
            "mattermost.timeout_secs",
            config.mattermost.timeout_secs.to_string(),
            &["PEERPOST_MATTERMOST_TIMEOUT_SECS"] as &[&str],
        ),
        ("bot.username", config.bot.username.clone(), &["PEERPOST_BOT_USERNAME"] as &[&str]),
        ("bot.display_name", config.bot.display_name.clone(), &["PEERPOST_BOT_DISPLAY_NAME"] as &[&str]),
        ("channel.name", config.channel.name.clone(), &["PEERPOST_CHANNEL_NAME"] as &[&str]),
        (
            "channel.display_name",
            config.channel.display_name.clone(),
            &["PEERPOST_CHANNEL_DISPLAY_NAME"] as &[&str],
        ),
        ("kudos.hashtags", config.kudos.hashtags.join(", "), &["PEERPOST_KUDOS_HASHTAGS"] as &[&str]),
        (
            "kudos.stamps_dir",
            config.kudos.stamps_dir.display().to_string(),
            &["PEERPOST_KUDOS_STAMPS_DIR"] as &[&str],
        ),
        (
            "report.utc_offset_minutes",
            config.report.utc_offset_minutes.to_string(),
            &["PEERPOST_REPORT_UTC_OFFSET_MINUTES"] as &[&str],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["PEERPOST_SERVER_BIND_ADDRESS"] as &[&str],
        ),
        ("server.port", config.server.port.to_string(), &["PEERPOST_SERVER_PORT"] as &[&str]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["PEERPOST_SERVER_GRACEFUL_SHUTDOWN_SECS"] as &[&str],
        ),
        ("server.public_url", config.server.public_url.clone(), &["PEERPOST_SERVER_PUBLIC_URL"] as &[&str]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["PEERPOST_LOGGING_LEVEL", "PEERPOST_LOG_LEVEL"] as &[&str],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["PEERPOST_LOGGING_FORMAT", "PEERPOST_LOG_FORMAT"] as &[&str],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        entries
            .into_iter()
            .map(|(key, value, env_keys)| render_line(key, &value, source(key, env_keys))),
    );
    lines.join("\n")
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("peerpost.toml"), PathBuf::from("config/peerpost.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the last four characters so operators can tell tokens apart.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}
