use serde_json::{json, Map};

use peerpost_core::domain::channel::ChannelId;
use peerpost_core::domain::post::{
    PostId, PostRecord, FROM_TO_PROP, HASHTAGS_PROP, RECOGNITION_POST_KIND,
};
use peerpost_core::domain::reaction::Reaction;
use peerpost_core::domain::user::{UserId, UserProfile};

use crate::connection::DbPool;
use crate::repositories::{PostArchive, RepositoryError};

/// 2024-01-16T00:00:00Z, a Tuesday.
const BASE_MILLIS: i64 = 1_705_363_200_000;

const DEMO_USERS: &[(&str, &str, &str, &str, &str)] = &[
    ("user-a", "alice", "Alice", "", ""),
    ("user-b", "bob", "", "", ""),
    ("user-c", "carol", "", "Carol", "Jones"),
];

/// (id, sender, recipient, hashtags, minutes after base, deleted)
const DEMO_RECOGNITIONS: &[(&str, &str, &str, &str, i64, bool)] = &[
    ("demo-post-1", "user-a", "user-b", "#x", 0, false),
    ("demo-post-2", "user-a", "user-c", "#x #y", 5, false),
    ("demo-post-3", "user-b", "user-a", "", 10, false),
    ("demo-post-4", "user-c", "user-b", "#x", 15, true),
];

const DEMO_REACTIONS: &[(&str, &str, &str)] = &[("demo-post-3", "user-c", "+1")];

/// Small recognition history that exercises every report table: three live
/// recognitions, one deleted recognition and one ordinary chat message.
pub struct DemoDataset;

impl DemoDataset {
    pub const CHANNEL_ID: &'static str = "demo-peer-channel";
    pub const TEAM_ID: &'static str = "demo-team";

    pub fn users() -> Vec<UserProfile> {
        DEMO_USERS
            .iter()
            .map(|(id, username, nickname, first_name, last_name)| UserProfile {
                id: UserId((*id).to_owned()),
                username: (*username).to_owned(),
                nickname: (*nickname).to_owned(),
                first_name: (*first_name).to_owned(),
                last_name: (*last_name).to_owned(),
            })
            .collect()
    }

    pub fn posts() -> Vec<PostRecord> {
        let mut posts: Vec<PostRecord> = DEMO_RECOGNITIONS
            .iter()
            .map(|(id, sender, recipient, hashtags, minutes, deleted)| {
                let mut props = Map::new();
                props.insert(FROM_TO_PROP.to_owned(), json!(format!("{sender} {recipient}")));
                props.insert(HASHTAGS_PROP.to_owned(), json!(hashtags));
                let create_at = BASE_MILLIS + minutes * 60_000;
                PostRecord {
                    id: PostId((*id).to_owned()),
                    channel_id: ChannelId(Self::CHANNEL_ID.to_owned()),
                    user_id: UserId("peerbot".to_owned()),
                    kind: RECOGNITION_POST_KIND.to_owned(),
                    message: String::new(),
                    props,
                    hashtags: (*hashtags).to_owned(),
                    has_reactions: false,
                    create_at,
                    delete_at: if *deleted { create_at + 60_000 } else { 0 },
                }
            })
            .collect();

        posts.push(PostRecord {
            id: PostId("demo-post-5".to_owned()),
            channel_id: ChannelId(Self::CHANNEL_ID.to_owned()),
            user_id: UserId("user-c".to_owned()),
            kind: String::new(),
            message: "Thanks everyone #x".to_owned(),
            props: Map::new(),
            hashtags: "#x".to_owned(),
            has_reactions: false,
            create_at: BASE_MILLIS + 20 * 60_000,
            delete_at: 0,
        });
        posts
    }

    pub fn reactions() -> Vec<Reaction> {
        DEMO_REACTIONS
            .iter()
            .map(|(post_id, user_id, emoji)| Reaction {
                user_id: UserId((*user_id).to_owned()),
                post_id: PostId((*post_id).to_owned()),
                emoji_name: (*emoji).to_owned(),
                create_at: BASE_MILLIS + 30 * 60_000,
            })
            .collect()
    }

    /// Writes the dataset through any archive. Loading twice is harmless.
    pub async fn load_into(archive: &dyn PostArchive) -> Result<SeedResult, RepositoryError> {
        let users = Self::users();
        let posts = Self::posts();
        let reactions = Self::reactions();
        let result = SeedResult {
            users_seeded: users.len(),
            posts_seeded: posts.len(),
            reactions_seeded: reactions.len(),
            channel_id: Self::CHANNEL_ID,
            team_id: Self::TEAM_ID,
        };

        for user in users {
            archive.save_user(user).await?;
        }
        for post in posts {
            archive.save_post(post).await?;
        }
        for reaction in reactions {
            archive.save_reaction(reaction).await?;
        }

        Ok(result)
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let user_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM users WHERE id IN ('user-a', 'user-b', 'user-c')",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("demo-users", user_count == DEMO_USERS.len() as i64));

        let post_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM posts WHERE channel_id = ?1")
                .bind(Self::CHANNEL_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("demo-posts", post_count == Self::posts().len() as i64));

        let deleted_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM posts WHERE channel_id = ?1 AND delete_at != 0",
        )
        .bind(Self::CHANNEL_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("demo-deleted-post", deleted_count == 1));

        let reaction_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM reactions WHERE post_id = 'demo-post-3'")
                .fetch_one(pool)
                .await?;
        checks.push(("demo-reactions", reaction_count == DEMO_REACTIONS.len() as i64));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM reactions WHERE post_id IN (SELECT id FROM posts WHERE channel_id = ?1)",
        )
        .bind(Self::CHANNEL_ID)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM posts WHERE channel_id = ?1")
            .bind(Self::CHANNEL_ID)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id IN ('user-a', 'user-b', 'user-c')")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub users_seeded: usize,
    pub posts_seeded: usize,
    pub reactions_seeded: usize,
    pub channel_id: &'static str,
    pub team_id: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
