use chrono::Utc;
use sqlx::Row;

use peerpost_core::domain::channel::ChannelId;
use peerpost_core::domain::post::{PostId, PostRecord};
use peerpost_core::domain::reaction::Reaction;
use peerpost_core::domain::user::{UserId, UserProfile};
use peerpost_core::errors::CollaboratorError;
use peerpost_core::kudos::apply_hashtag_hook;
use peerpost_core::ports::{PostPublisher, PostSource, ReactionSource, UserDirectory};

use super::{PostArchive, RepositoryError};
use crate::DbPool;

const POST_COLUMNS: &str = "p.id, p.channel_id, p.user_id, p.post_type, p.message, p.props_json,
    p.hashtags, p.create_at, p.delete_at,
    EXISTS(SELECT 1 FROM reactions r WHERE r.post_id = p.id) AS has_reactions";

/// SQLite-backed archive of channel posts, reactions and user profiles.
pub struct SqlPostArchive {
    pool: DbPool,
}

impl SqlPostArchive {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_post(&self, id: &PostId) -> Result<Option<PostRecord>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_post).transpose()
    }
}

fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<PostRecord, RepositoryError> {
    let props_json: String = decode(row.try_get("props_json"))?;
    let has_reactions: i64 = decode(row.try_get("has_reactions"))?;
    let props = serde_json::from_str(&props_json)
        .map_err(|e| RepositoryError::Decode(format!("props_json: {e}")))?;

    Ok(PostRecord {
        id: PostId(decode(row.try_get("id"))?),
        channel_id: ChannelId(decode(row.try_get("channel_id"))?),
        user_id: UserId(decode(row.try_get("user_id"))?),
        kind: decode(row.try_get("post_type"))?,
        message: decode(row.try_get("message"))?,
        props,
        hashtags: decode(row.try_get("hashtags"))?,
        has_reactions: has_reactions != 0,
        create_at: decode(row.try_get("create_at"))?,
        delete_at: decode(row.try_get("delete_at"))?,
    })
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, RepositoryError> {
    Ok(UserProfile {
        id: UserId(decode(row.try_get("id"))?),
        username: decode(row.try_get("username"))?,
        nickname: decode(row.try_get("nickname"))?,
        first_name: decode(row.try_get("first_name"))?,
        last_name: decode(row.try_get("last_name"))?,
    })
}

fn row_to_reaction(row: &sqlx::sqlite::SqliteRow) -> Result<Reaction, RepositoryError> {
    Ok(Reaction {
        user_id: UserId(decode(row.try_get("user_id"))?),
        post_id: PostId(decode(row.try_get("post_id"))?),
        emoji_name: decode(row.try_get("emoji_name"))?,
        create_at: decode(row.try_get("create_at"))?,
    })
}

#[async_trait::async_trait]
impl PostArchive for SqlPostArchive {
    async fn save_user(&self, user: UserProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO users (id, username, nickname, first_name, last_name)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 username = excluded.username,
                 nickname = excluded.nickname,
                 first_name = excluded.first_name,
                 last_name = excluded.last_name",
        )
        .bind(&user.id.0)
        .bind(&user.username)
        .bind(&user.nickname)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_post(&self, post: PostRecord) -> Result<(), RepositoryError> {
        let props_json = serde_json::to_string(&post.props)
            .map_err(|e| RepositoryError::Decode(format!("props: {e}")))?;

        sqlx::query(
            "INSERT INTO posts (id, channel_id, user_id, post_type, message, props_json,
                                hashtags, create_at, delete_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 message = excluded.message,
                 props_json = excluded.props_json,
                 hashtags = excluded.hashtags,
                 delete_at = excluded.delete_at",
        )
        .bind(&post.id.0)
        .bind(&post.channel_id.0)
        .bind(&post.user_id.0)
        .bind(&post.kind)
        .bind(&post.message)
        .bind(&props_json)
        .bind(&post.hashtags)
        .bind(post.create_at)
        .bind(post.delete_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_reaction(&self, reaction: Reaction) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT OR IGNORE INTO reactions (post_id, user_id, emoji_name, create_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&reaction.post_id.0)
        .bind(&reaction.user_id.0)
        .bind(&reaction.emoji_name)
        .bind(reaction.create_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl PostSource for SqlPostArchive {
    async fn fetch_posts_since(
        &self,
        channel_id: &ChannelId,
        since_millis: i64,
    ) -> Result<Vec<PostRecord>, CollaboratorError> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts p
             WHERE p.channel_id = ? AND p.create_at >= ?
             ORDER BY p.create_at ASC, p.id ASC"
        ))
        .bind(&channel_id.0)
        .bind(since_millis)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows.iter().map(row_to_post).collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait::async_trait]
impl ReactionSource for SqlPostArchive {
    async fn fetch_reactions(&self, post_id: &PostId) -> Result<Vec<Reaction>, CollaboratorError> {
        let rows = sqlx::query(
            "SELECT post_id, user_id, emoji_name, create_at FROM reactions
             WHERE post_id = ? ORDER BY create_at ASC, user_id ASC",
        )
        .bind(&post_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows.iter().map(row_to_reaction).collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait::async_trait]
impl UserDirectory for SqlPostArchive {
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, CollaboratorError> {
        let row = sqlx::query(
            "SELECT id, username, nickname, first_name, last_name FROM users WHERE id = ?",
        )
        .bind(&user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        match row {
            Some(ref row) => Ok(row_to_user(row)?),
            None => Err(CollaboratorError::NotFound { entity: "user", id: user_id.0.clone() }),
        }
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<UserProfile>, CollaboratorError> {
        let rows = sqlx::query(
            "SELECT id, username, nickname, first_name, last_name FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows.iter().map(row_to_user).collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait::async_trait]
impl PostPublisher for SqlPostArchive {
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
