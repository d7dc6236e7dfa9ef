use async_trait::async_trait;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::domain::channel::{Channel, ChannelDirectory, ChannelId, Team, TeamId};
use crate::domain::post::{PostId, PostRecord};
use crate::domain::reaction::Reaction;
use crate::domain::user::{UserId, UserProfile};
use crate::errors::CollaboratorError;

#[async_trait]
pub trait PostSource: Send + Sync {
    /// Every post in `channel_id` created at or after `since_millis`.
    async fn fetch_posts_since(
        &self,
        channel_id: &ChannelId,
        since_millis: i64,
    ) -> Result<Vec<PostRecord>, CollaboratorError>;
}

#[async_trait]
pub trait ReactionSource: Send + Sync {
    async fn fetch_reactions(&self, post_id: &PostId) -> Result<Vec<Reaction>, CollaboratorError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, CollaboratorError>;

    /// Profiles whose username matches exactly. More than one match is possible on some hosts.
    async fn find_by_username(&self, username: &str)
        -> Result<Vec<UserProfile>, CollaboratorError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralPost {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub sender_id: UserId,
    pub message: String,
}

#[async_trait]
pub trait EphemeralSender: Send + Sync {
    async fn send_ephemeral(&self, post: EphemeralPost) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait PostPublisher: Send + Sync {
    async fn create_post(&self, post: PostRecord) -> Result<PostRecord, CollaboratorError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewChannel {
    pub team_id: TeamId,
    pub name: String,
    pub display_name: String,
}

#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<Team>, CollaboratorError>;

    async fn get_team(&self, team_id: &TeamId) -> Result<Team, CollaboratorError>;

    async fn find_channel(
        &self,
        team_id: &TeamId,
        name: &str,
    ) -> Result<Option<Channel>, CollaboratorError>;

    async fn create_channel(&self, channel: NewChannel) -> Result<Channel, CollaboratorError>;
}

/// Read-only copy of host settings handed to a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub channels: ChannelDirectory,
    pub bot_user_id: UserId,
    pub utc_offset: FixedOffset,
    /// Base URL of the chat site, used for permalinks and avatars.
    pub site_url: String,
    /// Base URL this integration is reachable under, used for stamps and callbacks.
    pub public_url: String,
}
