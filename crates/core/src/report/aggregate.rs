use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::channel::ChannelId;
use crate::domain::post::RelationError;
use crate::domain::user::UserId;
use crate::errors::CollaboratorError;
use crate::ports::{PostSource, ReactionSource, UserDirectory};
use crate::report::tally::FrequencyTable;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("recognition post `{post_id}` is malformed: {source}")]
    DataIntegrityFault {
        post_id: String,
        #[source]
        source: RelationError,
    },
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// User id to display name. Ids are registered while posts are folded and
/// resolved in one pass afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayNameIndex {
    names: BTreeMap<UserId, Option<String>>,
}

impl DisplayNameIndex {
    pub fn register(&mut self, user_id: &UserId) {
        if !self.names.contains_key(user_id) {
            self.names.insert(user_id.clone(), None);
        }
    }

    pub fn resolve(&mut self, user_id: UserId, display_name: String) {
        self.names.insert(user_id, Some(display_name));
    }

    pub fn pending(&self) -> Vec<UserId> {
        self.names
            .iter()
            .filter(|(_, name)| name.is_none())
            .map(|(user_id, _)| user_id.clone())
            .collect()
    }

    pub fn display_name(&self, user_id: &str) -> Option<&str> {
        self.names.get(&UserId(user_id.to_owned())).and_then(|name| name.as_deref())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregationResult {
    pub senders: FrequencyTable,
    pub recipients: FrequencyTable,
    pub reactors: FrequencyTable,
    pub hashtags: FrequencyTable,
    pub names: DisplayNameIndex,
    pub posts_counted: usize,
}

/// Folds the recognition posts of one channel into frequency tables.
pub struct Aggregator<'a> {
    posts: &'a dyn PostSource,
    reactions: &'a dyn ReactionSource,
    users: &'a dyn UserDirectory,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        posts: &'a dyn PostSource,
        reactions: &'a dyn ReactionSource,
        users: &'a dyn UserDirectory,
    ) -> Self {
        Self { posts, reactions, users }
    }

    pub async fn aggregate(
        &self,
        channel_id: &ChannelId,
        start: DateTime<Utc>,
    ) -> Result<AggregationResult, AggregationError> {
        let posts = self.posts.fetch_posts_since(channel_id, start.timestamp_millis()).await?;
        let mut result = AggregationResult::default();
        let mut skipped = 0_usize;

        for post in &posts {
            let recognition = post.recognition().map_err(|source| {
                AggregationError::DataIntegrityFault { post_id: post.id.0.clone(), source }
            })?;
            let Some(recognition) = recognition else {
                skipped += 1;
                continue;
            };

            result.senders.increment(recognition.sender.0.as_str());
            result.recipients.increment(recognition.recipient.0.as_str());
            result.names.register(&recognition.sender);
            result.names.register(&recognition.recipient);

            for hashtag in recognition.hashtags {
                result.hashtags.increment(hashtag);
            }

            if recognition.has_reactions {
                for reaction in self.reactions.fetch_reactions(&recognition.id).await? {
                    result.reactors.increment(reaction.user_id.0.as_str());
                    result.names.register(&reaction.user_id);
                }
            }

            result.posts_counted += 1;
        }

        for user_id in result.names.pending() {
            let profile = self.users.get_user(&user_id).await?;
            result.names.resolve(user_id, profile.display_name());
        }

        tracing::debug!(
            event_name = "report.aggregated",
            channel_id = %channel_id,
            scanned = posts.len(),
            counted = result.posts_counted,
            skipped,
            users = result.names.len(),
            "aggregated recognition posts"
        );

        Ok(result)
    }
}
