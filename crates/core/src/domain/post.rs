use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::channel::ChannelId;
use crate::domain::user::UserId;

/// Post type the platform stores recognition posts under.
pub const RECOGNITION_POST_KIND: &str = "custom_peer-post";
/// Prop holding `"<sender-id> <recipient-id>"`.
pub const FROM_TO_PROP: &str = "from-to";
pub const HASHTAGS_PROP: &str = "hashtags";
pub const ATTACHMENTS_PROP: &str = "attachments";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(pub String);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A post as handed over by the platform. Only a subset of its shape matters here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub has_reactions: bool,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub delete_at: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognitionPost {
    pub id: PostId,
    pub sender: UserId,
    pub recipient: UserId,
    pub hashtags: Vec<String>,
    pub has_reactions: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RelationError {
    #[error("`from-to` prop must be a string, found {found}")]
    NotAString { found: &'static str },
    #[error("`from-to` prop `{value}` does not name a sender and a recipient")]
    Malformed { value: String },
}

impl PostRecord {
    pub fn is_recognition(&self) -> bool {
        self.kind == RECOGNITION_POST_KIND
    }

    pub fn is_deleted(&self) -> bool {
        self.delete_at != 0
    }

    /// Reads the post as a recognition event.
    ///
    /// Returns `Ok(None)` for posts that are out of scope: another post type, deleted, or
    /// missing the `from-to` prop entirely. A `from-to` prop of the wrong shape is an error.
    pub fn recognition(&self) -> Result<Option<RecognitionPost>, RelationError> {
        if !self.is_recognition() || self.is_deleted() {
            return Ok(None);
        }

        let Some(value) = self.props.get(FROM_TO_PROP) else {
            return Ok(None);
        };
        let Value::String(relation) = value else {
            return Err(RelationError::NotAString { found: json_kind(value) });
        };

        let mut ids = relation.split(' ');
        let (Some(sender), Some(recipient)) = (ids.next(), ids.next()) else {
            return Err(RelationError::Malformed { value: relation.clone() });
        };
        if sender.is_empty() || recipient.is_empty() {
            return Err(RelationError::Malformed { value: relation.clone() });
        }

        Ok(Some(RecognitionPost {
            id: self.id.clone(),
            sender: UserId(sender.to_owned()),
            recipient: UserId(recipient.to_owned()),
            hashtags: self.hashtag_text().split_whitespace().map(str::to_owned).collect(),
            has_reactions: self.has_reactions,
            created_at: Utc.timestamp_millis_opt(self.create_at).single().unwrap_or_default(),
        }))
    }

    /// The platform rebuilds `hashtags` from the message on create, so fall back to the prop.
    fn hashtag_text(&self) -> &str {
        match self.props.get(HASHTAGS_PROP) {
            Some(Value::String(tagged)) if self.hashtags.trim().is_empty() => tagged,
            _ => &self.hashtags,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
