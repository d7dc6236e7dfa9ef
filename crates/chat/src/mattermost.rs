use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use peerpost_core::config::{BotConfig, MattermostConfig};
use peerpost_core::domain::channel::{Channel, ChannelId, Team, TeamId};
use peerpost_core::domain::post::{PostId, PostRecord};
use peerpost_core::domain::reaction::Reaction;
use peerpost_core::domain::user::{UserId, UserProfile};
use peerpost_core::errors::CollaboratorError;
use peerpost_core::kudos::apply_hashtag_hook;
use peerpost_core::ports::{
    EphemeralPost, EphemeralSender, NewChannel, PostPublisher, PostSource, ReactionSource,
    TeamDirectory, UserDirectory,
};

use crate::blocks::OpenDialogRequest;
use crate::hooks::message_will_be_posted;
use crate::service::DialogOpener;

const API_PREFIX: &str = "api/v4";
const OPEN_CHANNEL: &str = "O";
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("bot token cannot be used as an authorization header")]
    InvalidToken,
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Mattermost REST v4 client authenticated as the bot.
#[derive(Clone)]
pub struct MattermostClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PostList {
    #[serde(default)]
    order: Vec<String>,
    #[serde(default)]
    posts: HashMap<String, PostRecord>,
}

#[derive(Debug, Serialize)]
struct CreatePostBody<'a> {
    channel_id: &'a ChannelId,
    message: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    props: &'a serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "str::is_empty")]
    hashtags: &'a str,
}

impl MattermostClient {
    pub fn new(
        site_url: &str,
        bot_token: &SecretString,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let mut authorization =
            header::HeaderValue::from_str(&format!("Bearer {}", bot_token.expose_secret()))
                .map_err(|_| ClientError::InvalidToken)?;
        authorization.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization);

        let client = Client::builder().timeout(timeout).default_headers(headers).build()?;

        Ok(Self { client, base_url: site_url.trim_end_matches('/').to_owned() })
    }

    pub fn from_config(config: &MattermostConfig) -> Result<Self, ClientError> {
        Self::new(&config.site_url, &config.bot_token, Duration::from_secs(config.timeout_secs))
    }

    pub fn site_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{API_PREFIX}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The account the token belongs to.
    pub async fn me(&self) -> Result<UserProfile, CollaboratorError> {
        self.get_json("get_me", "users/me").await
    }

    pub async fn ping(&self) -> Result<(), CollaboratorError> {
        let request = self.client.get(self.url("system/ping"));
        send("ping", request).await.map(|_| ())
    }

    /// Aligns the bot account with the configured profile. Needs `manage_bots` on the token owner.
    pub async fn sync_bot_profile(
        &self,
        bot_user_id: &UserId,
        profile: &BotConfig,
    ) -> Result<(), CollaboratorError> {
        let body = json!({
            "username": profile.username,
            "display_name": profile.display_name,
            "description": profile.description,
        });
        let request = self.client.put(self.url(&format!("bots/{bot_user_id}"))).json(&body);
        send("patch_bot", request).await.map(|_| ())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, CollaboratorError> {
        let response = send(operation, self.client.get(self.url(path))).await?;
        decode(operation, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T, CollaboratorError> {
        let response = send(operation, self.client.post(self.url(path)).json(body)).await?;
        decode(operation, response).await
    }

    async fn post_unit<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<(), CollaboratorError> {
        send(operation, self.client.post(self.url(path)).json(body)).await.map(|_| ())
    }
}

async fn send(
    operation: &'static str,
    request: RequestBuilder,
) -> Result<Response, CollaboratorError> {
    let response = request.send().await.map_err(|error| transport(operation, &error))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut message = response.text().await.unwrap_or_default();
    if message.len() > ERROR_BODY_LIMIT {
        let cut = (0..=ERROR_BODY_LIMIT).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
        message.truncate(cut);
    }
    tracing::warn!(
        event_name = "mattermost.rejected",
        operation,
        status = status.as_u16(),
        "platform rejected request"
    );
    Err(CollaboratorError::Rejected { operation, status: status.as_u16(), message })
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, CollaboratorError> {
    response.json::<T>().await.map_err(|error| transport(operation, &error))
}

fn transport(operation: &'static str, error: &reqwest::Error) -> CollaboratorError {
    CollaboratorError::Transport { operation, message: error.to_string() }
}

fn not_found_as(
    entity: &'static str,
    id: &str,
    error: CollaboratorError,
) -> CollaboratorError {
    match error {
        CollaboratorError::Rejected { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
            CollaboratorError::NotFound { entity, id: id.to_owned() }
        }
        other => other,
    }
}

/// Posts in `order`, created at or after `since_millis`, oldest first.
fn posts_in_window(list: PostList, since_millis: i64) -> Vec<PostRecord> {
    let PostList { order, mut posts } = list;
    let mut found: Vec<PostRecord> = order.iter().filter_map(|id| posts.remove(id)).collect();
    found.extend(posts.into_values());
    found.retain(|post| post.create_at >= since_millis);
    // The server re-derives `hashtags` from the (empty) message on create.
    for post in &mut found {
        apply_hashtag_hook(post);
    }
    found.sort_by(|a, b| a.create_at.cmp(&b.create_at).then_with(|| a.id.cmp(&b.id)));
    found
}

#[async_trait]
impl PostSource for MattermostClient {
    async fn fetch_posts_since(
        &self,
        channel_id: &ChannelId,
        since_millis: i64,
    ) -> Result<Vec<PostRecord>, CollaboratorError> {
        let list: PostList = self
            .get_json(
                "get_posts_since",
                &format!("channels/{channel_id}/posts?since={since_millis}"),
            )
            .await?;
        Ok(posts_in_window(list, since_millis))
    }
}

#[async_trait]
impl ReactionSource for MattermostClient {
    async fn fetch_reactions(&self, post_id: &PostId) -> Result<Vec<Reaction>, CollaboratorError> {
        // An empty reaction list comes back as `null`.
        let reactions: Option<Vec<Reaction>> =
            self.get_json("get_reactions", &format!("posts/{post_id}/reactions")).await?;
        Ok(reactions.unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for MattermostClient {
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, CollaboratorError> {
        self.get_json("get_user", &format!("users/{user_id}"))
            .await
            .map_err(|error| not_found_as("user", &user_id.0, error))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<UserProfile>, CollaboratorError> {
        self.post_json("get_users_by_usernames", "users/usernames", &[username]).await
    }
}

#[async_trait]
impl EphemeralSender for MattermostClient {
    /// The platform attributes ephemeral posts to the token owner; `sender_id` is implied.
    async fn send_ephemeral(&self, post: EphemeralPost) -> Result<(), CollaboratorError> {
        let body = json!({
            "user_id": post.user_id,
            "post": {
                "channel_id": post.channel_id,
                "message": post.message,
            },
        });
        self.post_unit("send_ephemeral", "posts/ephemeral", &body).await
    }
}

#[async_trait]
impl PostPublisher for MattermostClient {
    async fn create_post(&self, post: PostRecord) -> Result<PostRecord, CollaboratorError> {
        let post = message_will_be_posted(post);
        let body = CreatePostBody {
            channel_id: &post.channel_id,
            message: &post.message,
            kind: &post.kind,
            props: &post.props,
            hashtags: &post.hashtags,
        };
        self.post_json("create_post", "posts", &body).await
    }
}

#[async_trait]
impl TeamDirectory for MattermostClient {
    /// Teams the bot belongs to; channels can only be created there.
    async fn list_teams(&self) -> Result<Vec<Team>, CollaboratorError> {
        self.get_json("get_teams", "users/me/teams").await
    }

    async fn get_team(&self, team_id: &TeamId) -> Result<Team, CollaboratorError> {
        self.get_json("get_team", &format!("teams/{team_id}"))
            .await
            .map_err(|error| not_found_as("team", &team_id.0, error))
    }

    async fn find_channel(
        &self,
        team_id: &TeamId,
        name: &str,
    ) -> Result<Option<Channel>, CollaboratorError> {
        let path = format!("teams/{team_id}/channels/name/{name}");
        match self.get_json("get_channel_by_name", &path).await {
            Ok(channel) => Ok(Some(channel)),
            Err(CollaboratorError::Rejected { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn create_channel(&self, channel: NewChannel) -> Result<Channel, CollaboratorError> {
        let body = json!({
            "team_id": channel.team_id,
            "name": channel.name,
            "display_name": channel.display_name,
            "type": OPEN_CHANNEL,
        });
        self.post_json("create_channel", "channels", &body).await
    }
}

#[async_trait]
impl DialogOpener for MattermostClient {
    async fn open_dialog(&self, request: &OpenDialogRequest) -> Result<(), CollaboratorError> {
        self.post_unit("open_dialog", "actions/dialogs/open", request).await
    }
}
