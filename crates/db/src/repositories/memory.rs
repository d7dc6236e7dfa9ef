use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use peerpost_core::domain::channel::ChannelId;
use peerpost_core::domain::post::{PostId, PostRecord};
use peerpost_core::domain::reaction::Reaction;
use peerpost_core::domain::user::{UserId, UserProfile};
use peerpost_core::errors::CollaboratorError;
use peerpost_core::kudos::apply_hashtag_hook;
use peerpost_core::ports::{PostPublisher, PostSource, ReactionSource, UserDirectory};

use super::{PostArchive, RepositoryError};

#[derive(Default)]
pub struct InMemoryPostArchive {
    users: RwLock<HashMap<String, UserProfile>>,
    posts: RwLock<Vec<PostRecord>>,
    reactions: RwLock<HashMap<String, Vec<Reaction>>>,
}

#[async_trait::async_trait]
impl PostArchive for InMemoryPostArchive {
    async fn save_user(&self, user: UserProfile) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(user.id.0.clone(), user);
        Ok(())
    }

    async fn save_post(&self, post: PostRecord) -> Result<(), RepositoryError> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|existing| existing.id == post.id) {
            Some(existing) => *existing = post,
            None => posts.push(post),
        }
        Ok(())
    }

    async fn save_reaction(&self, reaction: Reaction) -> Result<(), RepositoryError> {
        let mut reactions = self.reactions.write().await;
        let entries = reactions.entry(reaction.post_id.0.clone()).or_default();
        let duplicate = entries.iter().any(|existing| {
            existing.user_id == reaction.user_id && existing.emoji_name == reaction.emoji_name
        });
        if !duplicate {
            entries.push(reaction);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PostSource for InMemoryPostArchive {
    async fn fetch_posts_since(
        &self,
        channel_id: &ChannelId,
        since_millis: i64,
    ) -> Result<Vec<PostRecord>, CollaboratorError> {
        let posts = self.posts.read().await;
        let reactions = self.reactions.read().await;
        let mut found: Vec<PostRecord> = posts
            .iter()
            .filter(|post| &post.channel_id == channel_id && post.create_at >= since_millis)
            .cloned()
            .map(|mut post| {
                post.has_reactions = reactions.get(&post.id.0).is_some_and(|r| !r.is_empty());
                post
            })
            .collect();
        found.sort_by(|a, b| a.create_at.cmp(&b.create_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[async_trait::async_trait]
impl ReactionSource for InMemoryPostArchive {
    async fn fetch_reactions(&self, post_id: &PostId) -> Result<Vec<Reaction>, CollaboratorError> {
        let reactions = self.reactions.read().await;
        Ok(reactions.get(&post_id.0).cloned().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryPostArchive {
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, CollaboratorError> {
        let users = self.users.read().await;
        users
            .get(&user_id.0)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound { entity: "user", id: user_id.0.clone() })
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<UserProfile>, CollaboratorError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|user| user.username == username).cloned().collect())
    }
}

#[async_trait::async_trait]
impl PostPublisher for InMemoryPostArchive {
    async fn create_post(&self, mut post: PostRecord) -> Result<PostRecord, CollaboratorError> {
        if post.id.0.is_empty() {
            post.id = PostId(uuid::Uuid::new_v4().simple().to_string());
        }
        if post.create_at == 0 {
            post.create_at = Utc::now().timestamp_millis();
        }
        apply_hashtag_hook(&mut post);

        self.save_post(post.clone()).await?;
        Ok(post)
    }
}
