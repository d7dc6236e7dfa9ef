use std::sync::Mutex;

use async_trait::async_trait;
use chrono::FixedOffset;
use serde_json::{json, Map};

use peerpost_core::domain::channel::{Channel, ChannelDirectory, ChannelId, Team, TeamId};
use peerpost_core::domain::post::{PostId, PostRecord, FROM_TO_PROP, HASHTAGS_PROP, RECOGNITION_POST_KIND};
use peerpost_core::domain::reaction::Reaction;
use peerpost_core::domain::user::{UserId, UserProfile};
use peerpost_core::errors::CollaboratorError;
use peerpost_core::ports::{
    EphemeralPost, EphemeralSender, NewChannel, PostPublisher, PostSource, ReactionSource,
    SettingsSnapshot, TeamDirectory, UserDirectory,
};

use crate::blocks::OpenDialogRequest;
use crate::service::DialogOpener;

pub fn settings() -> SettingsSnapshot {
    SettingsSnapshot {
        channels: [(TeamId("t1".to_owned()), ChannelId("peer-channel".to_owned()))]
            .into_iter()
            .collect::<ChannelDirectory>(),
        bot_user_id: UserId("bot".to_owned()),
        utc_offset: FixedOffset::east_opt(0).expect("offset"),
        site_url: "https://chat.example.com".to_owned(),
        public_url: "https://peer.example.com".to_owned(),
    }
}

fn user(id: &str, username: &str, nickname: &str) -> UserProfile {
    UserProfile {
        id: UserId(id.to_owned()),
        username: username.to_owned(),
        nickname: nickname.to_owned(),
        first_name: String::new(),
        last_name: String::new(),
    }
}

/// Chat platform double that records what it is asked to send.
#[derive(Default)]
pub struct ChatFake {
    fail_dialog: bool,
    sent: Mutex<Vec<EphemeralPost>>,
    created: Mutex<Vec<PostRecord>>,
    dialogs: Mutex<Vec<OpenDialogRequest>>,
}

impl ChatFake {
    fn users() -> Vec<UserProfile> {
        vec![
            user("A", "alice", "Alice"),
            user("B", "bob", "Bob"),
            user("T1", "twin", ""),
            user("T2", "twin", ""),
        ]
    }

    pub fn failing_dialogs() -> Self {
        Self { fail_dialog: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<EphemeralPost> {
        self.sent.lock().expect("lock").clone()
    }

    pub fn created(&self) -> Vec<PostRecord> {
        self.created.lock().expect("lock").clone()
    }

    pub fn dialogs(&self) -> Vec<OpenDialogRequest> {
        self.dialogs.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PostSource for ChatFake {
    async fn fetch_posts_since(
        &self,
        channel_id: &ChannelId,
        since_millis: i64,
    ) -> Result<Vec<PostRecord>, CollaboratorError> {
        let mut props = Map::new();
        props.insert(FROM_TO_PROP.to_owned(), json!("A B"));
        props.insert(HASHTAGS_PROP.to_owned(), json!("#challenge"));
        let post = PostRecord {
            id: PostId("p1".to_owned()),
            channel_id: channel_id.clone(),
            user_id: UserId("bot".to_owned()),
            kind: RECOGNITION_POST_KIND.to_owned(),
            message: String::new(),
            props,
            hashtags: "#challenge".to_owned(),
            has_reactions: false,
            create_at: 1_705_363_200_000,
            delete_at: 0,
        };
        Ok(if post.create_at >= since_millis { vec![post] } else { Vec::new() })
    }
}

#[async_trait]
impl ReactionSource for ChatFake {
    async fn fetch_reactions(&self, _post_id: &PostId) -> Result<Vec<Reaction>, CollaboratorError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl UserDirectory for ChatFake {
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, CollaboratorError> {
        Self::users()
            .into_iter()
            .find(|user| &user.id == user_id)
            .ok_or_else(|| CollaboratorError::NotFound { entity: "user", id: user_id.0.clone() })
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<UserProfile>, CollaboratorError> {
        Ok(Self::users().into_iter().filter(|user| user.username == username).collect())
    }
}

#[async_trait]
impl EphemeralSender for ChatFake {
    async fn send_ephemeral(&self, post: EphemeralPost) -> Result<(), CollaboratorError> {
        self.sent.lock().expect("lock").push(post);
        Ok(())
    }
}

#[async_trait]
impl PostPublisher for ChatFake {
    async fn create_post(&self, post: PostRecord) -> Result<PostRecord, CollaboratorError> {
        let mut created = self.created.lock().expect("lock");
        let mut post = crate::hooks::message_will_be_posted(post);
        post.id = PostId(format!("created-{}", created.len() + 1));
        created.push(post.clone());
        Ok(post)
    }
}

#[async_trait]
impl TeamDirectory for ChatFake {
    async fn list_teams(&self) -> Result<Vec<Team>, CollaboratorError> {
        Ok(vec![self.get_team(&TeamId("t1".to_owned())).await?])
    }

    async fn get_team(&self, team_id: &TeamId) -> Result<Team, CollaboratorError> {
        if team_id.0 != "t1" {
            return Err(CollaboratorError::NotFound { entity: "team", id: team_id.0.clone() });
        }
        Ok(Team { id: team_id.clone(), name: "core-team".to_owned(), display_name: "Core".to_owned() })
    }

    async fn find_channel(
        &self,
        team_id: &TeamId,
        name: &str,
    ) -> Result<Option<Channel>, CollaboratorError> {
        Ok((team_id.0 == "t1" && name == "peer-channel").then(|| Channel {
            id: ChannelId("peer-channel".to_owned()),
            team_id: team_id.clone(),
            name: name.to_owned(),
            display_name: String::new(),
        }))
    }

    async fn create_channel(&self, channel: NewChannel) -> Result<Channel, CollaboratorError> {
        Ok(Channel {
            id: ChannelId(format!("{}-{}", channel.team_id, channel.name)),
            team_id: channel.team_id,
            name: channel.name,
            display_name: channel.display_name,
        })
    }
}

#[async_trait]
impl DialogOpener for ChatFake {
    async fn open_dialog(&self, request: &OpenDialogRequest) -> Result<(), CollaboratorError> {
        if self.fail_dialog {
            return Err(CollaboratorError::Transport {
                operation: "open_dialog",
                message: "connection reset".to_owned(),
            });
        }
        self.dialogs.lock().expect("lock").push(request.clone());
        Ok(())
    }
}
