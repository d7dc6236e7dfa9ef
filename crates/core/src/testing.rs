//! In-memory stand-ins for the platform ports, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map};

use crate::domain::channel::{Channel, ChannelId, Team, TeamId};
use crate::domain::post::{PostId, PostRecord, FROM_TO_PROP, RECOGNITION_POST_KIND};
use crate::domain::reaction::Reaction;
use crate::domain::user::{UserId, UserProfile};
use crate::errors::CollaboratorError;
use crate::ports::{
    EphemeralPost, EphemeralSender, NewChannel, PostPublisher, PostSource, ReactionSource,
    TeamDirectory, UserDirectory,
};

pub const SCENARIO_MILLIS: i64 = 1_705_363_200_000;

pub fn recognition_post(
    id: &str,
    sender: &str,
    recipient: &str,
    hashtags: &str,
    has_reactions: bool,
) -> PostRecord {
    let mut props = Map::new();
    props.insert(FROM_TO_PROP.to_owned(), json!(format!("{sender} {recipient}")));
    PostRecord {
        id: PostId(id.to_owned()),
        channel_id: ChannelId("peer-channel".to_owned()),
        user_id: UserId("bot".to_owned()),
        kind: RECOGNITION_POST_KIND.to_owned(),
        message: String::new(),
        props,
        hashtags: hashtags.to_owned(),
        has_reactions,
        create_at: SCENARIO_MILLIS,
        delete_at: 0,
    }
}

pub fn reaction(user_id: &str, post_id: &str, emoji: &str) -> Reaction {
    Reaction {
        user_id: UserId(user_id.to_owned()),
        post_id: PostId(post_id.to_owned()),
        emoji_name: emoji.to_owned(),
        create_at: SCENARIO_MILLIS,
    }
}

pub fn profile(id: &str, username: &str, nickname: &str) -> UserProfile {
    UserProfile {
        id: UserId(id.to_owned()),
        username: username.to_owned(),
        nickname: nickname.to_owned(),
        first_name: String::new(),
        last_name: String::new(),
    }
}

/// (A→B `#x`), (A→C `#x #y`), (B→A, one reaction by C).
pub fn scenario_platform() -> FakePlatform {
    let mut platform = FakePlatform::with_posts(vec![
        recognition_post("p1", "A", "B", "#x", false),
        recognition_post("p2", "A", "C", "#x #y", false),
        recognition_post("p3", "B", "A", "", true),
    ]);
    platform.reactions.insert("p3".to_owned(), vec![reaction("C", "p3", "+1")]);
    platform
}

pub struct FakePlatform {
    pub posts: Vec<PostRecord>,
    pub reactions: HashMap<String, Vec<Reaction>>,
    pub users: Vec<UserProfile>,
    pub teams: Vec<Team>,
    pub channels: Mutex<Vec<Channel>>,
    pub fail_posts: bool,
    pub fail_reactions: bool,
    pub fail_send: bool,
    pub sent: Mutex<Vec<EphemeralPost>>,
    pub created: Mutex<Vec<PostRecord>>,
    user_lookups: AtomicUsize,
}

impl FakePlatform {
    pub fn with_posts(posts: Vec<PostRecord>) -> Self {
        Self {
            posts,
            reactions: HashMap::new(),
            users: vec![
                profile("A", "alice", "Alice"),
                profile("B", "bob", "Bob"),
                profile("C", "carol", "Carol"),
                profile("D", "dave", ""),
            ],
            teams: vec![Team {
                id: TeamId("t1".to_owned()),
                name: "core-team".to_owned(),
                display_name: "Core Team".to_owned(),
            }],
            channels: Mutex::new(Vec::new()),
            fail_posts: false,
            fail_reactions: false,
            fail_send: false,
            sent: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            user_lookups: AtomicUsize::new(0),
        }
    }

    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<EphemeralPost> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn created(&self) -> Vec<PostRecord> {
        self.created.lock().expect("created lock").clone()
    }
}

#[async_trait]
impl PostSource for FakePlatform {
    async fn fetch_posts_since(
        &self,
        channel_id: &ChannelId,
        since_millis: i64,
    ) -> Result<Vec<PostRecord>, CollaboratorError> {
        if self.fail_posts {
            return Err(CollaboratorError::Transport {
                operation: "fetch posts",
                message: "connection refused".to_owned(),
            });
        }
        Ok(self
            .posts
            .iter()
            .filter(|post| &post.channel_id == channel_id && post.create_at >= since_millis)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReactionSource for FakePlatform {
    async fn fetch_reactions(&self, post_id: &PostId) -> Result<Vec<Reaction>, CollaboratorError> {
        if self.fail_reactions {
            return Err(CollaboratorError::Transport {
                operation: "fetch reactions",
                message: "connection reset".to_owned(),
            });
        }
        Ok(self.reactions.get(&post_id.0).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for FakePlatform {
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, CollaboratorError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.users
            .iter()
            .find(|user| &user.id == user_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound { entity: "user", id: user_id.0.clone() })
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<UserProfile>, CollaboratorError> {
        Ok(self.users.iter().filter(|user| user.username == username).cloned().collect())
    }
}

#[async_trait]
impl EphemeralSender for FakePlatform {
    async fn send_ephemeral(&self, post: EphemeralPost) -> Result<(), CollaboratorError> {
        if self.fail_send {
            return Err(CollaboratorError::Rejected {
                operation: "send ephemeral post",
                status: 403,
                message: "bot is not a channel member".to_owned(),
            });
        }
        self.sent.lock().expect("sent lock").push(post);
        Ok(())
    }
}

#[async_trait]
impl PostPublisher for FakePlatform {
    async fn create_post(&self, mut post: PostRecord) -> Result<PostRecord, CollaboratorError> {
        let mut created = self.created.lock().expect("created lock");
        post.id = PostId(format!("created-{}", created.len() + 1));
        created.push(post.clone());
        Ok(post)
    }
}

#[async_trait]
impl TeamDirectory for FakePlatform {
    async fn list_teams(&self) -> Result<Vec<Team>, CollaboratorError> {
        Ok(self.teams.clone())
    }

    async fn get_team(&self, team_id: &TeamId) -> Result<Team, CollaboratorError> {
        self.teams
            .iter()
            .find(|team| &team.id == team_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound { entity: "team", id: team_id.0.clone() })
    }

    async fn find_channel(
        &self,
        team_id: &TeamId,
        name: &str,
    ) -> Result<Option<Channel>, CollaboratorError> {
        let channels = self.channels.lock().expect("channel lock");
        Ok(channels.iter().find(|channel| &channel.team_id == team_id && channel.name == name).cloned())
    }

    async fn create_channel(&self, channel: NewChannel) -> Result<Channel, CollaboratorError> {
        let mut channels = self.channels.lock().expect("channel lock");
        let created = Channel {
            id: ChannelId(format!("{}-{}", channel.team_id.0, channel.name)),
            team_id: channel.team_id,
            name: channel.name,
            display_name: channel.display_name,
        };
        channels.push(created.clone());
        Ok(created)
    }
}
