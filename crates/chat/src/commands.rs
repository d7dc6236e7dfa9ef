use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use peerpost_core::domain::channel::{ChannelId, TeamId};
use peerpost_core::domain::user::UserId;
use peerpost_core::errors::InterfaceError;

use crate::blocks::CommandResponse;
use crate::dialog::DialogError;

pub const PEER_TRIGGER: &str = "peer";
pub const PEER_REPORT_TRIGGER: &str = "peer-report";

/// Slash command as posted by the platform (form-encoded).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub trigger_id: String,
    /// Assigned on receipt, never sent by the platform.
    #[serde(skip)]
    pub request_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerCommand {
    /// `/peer @username`
    Kudos,
    /// `/peer-report [YYYY/MM/DD]`
    Report,
}

impl PeerCommand {
    pub fn classify(trigger: &str) -> Option<Self> {
        match trigger.trim().trim_start_matches('/') {
            PEER_TRIGGER => Some(Self::Kudos),
            PEER_REPORT_TRIGGER => Some(Self::Report),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kudos => PEER_TRIGGER,
            Self::Report => PEER_REPORT_TRIGGER,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub command: PeerCommand,
    /// Whitespace-separated words after the trigger.
    pub arguments: Vec<String>,
    pub channel_id: ChannelId,
    pub team_id: TeamId,
    pub user_id: UserId,
    pub trigger_id: String,
    pub request_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported command `{0}`")]
    UnsupportedCommand(String),
    #[error("slash command payload is missing `{field}`")]
    MissingField { field: &'static str },
}

#[derive(Debug, Error)]
pub enum CommandRouteError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Dialog(#[from] DialogError),
    #[error(transparent)]
    Service(#[from] InterfaceError),
}

pub fn normalize_peer_command(
    payload: SlashCommandPayload,
) -> Result<CommandEnvelope, CommandParseError> {
    let command = PeerCommand::classify(&payload.command)
        .ok_or_else(|| CommandParseError::UnsupportedCommand(payload.command.clone()))?;

    for (field, value) in [
        ("user_id", &payload.user_id),
        ("channel_id", &payload.channel_id),
        ("team_id", &payload.team_id),
    ] {
        if value.trim().is_empty() {
            return Err(CommandParseError::MissingField { field });
        }
    }

    // Some clients send the trigger inside `text` as well.
    let mut words = payload.text.split_whitespace().peekable();
    if words.peek().and_then(|word| PeerCommand::classify(word)) == Some(command)
        && words.peek().is_some_and(|word| word.starts_with('/'))
    {
        words.next();
    }

    Ok(CommandEnvelope {
        command,
        arguments: words.map(str::to_owned).collect(),
        channel_id: ChannelId(payload.channel_id),
        team_id: TeamId(payload.team_id),
        user_id: UserId(payload.user_id),
        trigger_id: payload.trigger_id,
        request_id: payload.request_id,
    })
}

#[async_trait]
pub trait PeerCommandService: Send + Sync {
    async fn kudos(&self, envelope: &CommandEnvelope) -> Result<CommandResponse, CommandRouteError>;

    async fn report(&self, envelope: &CommandEnvelope)
        -> Result<CommandResponse, CommandRouteError>;
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: PeerCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn route(
        &self,
        envelope: CommandEnvelope,
    ) -> Result<CommandResponse, CommandRouteError> {
        tracing::debug!(
            event_name = "command.received",
            command = envelope.command.as_str(),
            request_id = %envelope.request_id,
            team_id = %envelope.team_id,
            channel_id = %envelope.channel_id,
            arguments = envelope.arguments.len(),
            "routing slash command"
        );

        match envelope.command {
            PeerCommand::Kudos => self.service.kudos(&envelope).await,
            PeerCommand::Report => self.service.report(&envelope).await,
        }
    }

    pub async fn dispatch(
        &self,
        payload: SlashCommandPayload,
    ) -> Result<CommandResponse, CommandRouteError> {
        let envelope = normalize_peer_command(payload)?;
        self.route(envelope).await
    }
}
