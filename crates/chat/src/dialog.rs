use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use peerpost_core::domain::channel::{ChannelId, TeamId};
use peerpost_core::domain::user::UserId;
use peerpost_core::kudos::KudosSubmission;

use crate::blocks::{ELEMENT_HASHTAG1, ELEMENT_HASHTAG2, ELEMENT_STAMP, ELEMENT_TEXT};

/// Body the platform posts to the dialog callback URL.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SubmitDialogRequest {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub submission: Map<String, Value>,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogOutcome {
    Cancelled { user_id: UserId, channel_id: ChannelId },
    Submitted(KudosSubmission),
}

/// Reply to a dialog submission. Field errors keep the dialog open.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubmitDialogResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl SubmitDialogResponse {
    pub fn accepted() -> Self {
        Self::default()
    }

    pub fn field_error(field: &str, message: impl Into<String>) -> Self {
        Self { error: None, errors: BTreeMap::from([(field.to_owned(), message.into())]) }
    }

    pub fn general_error(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), errors: BTreeMap::new() }
    }

    pub fn is_accepted(&self) -> bool {
        self.error.is_none() && self.errors.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("dialog submission is missing `{field}`")]
    MissingField { field: &'static str },
}

impl SubmitDialogRequest {
    /// Non-string submission values are treated as absent; content checks happen in the kudos service.
    pub fn into_outcome(self) -> Result<DialogOutcome, DialogError> {
        let user_id = required("user_id", self.user_id)?;
        let channel_id = required("channel_id", self.channel_id)?;

        if self.cancelled {
            return Ok(DialogOutcome::Cancelled {
                user_id: UserId(user_id),
                channel_id: ChannelId(channel_id),
            });
        }

        let team_id = required("team_id", self.team_id)?;
        let recipient = required("state", self.state)?;
        let field = |name: &str| self.submission.get(name).and_then(Value::as_str).map(str::to_owned);

        Ok(DialogOutcome::Submitted(KudosSubmission {
            team_id: TeamId(team_id),
            channel_id: ChannelId(channel_id),
            sender: UserId(user_id),
            recipient: UserId(recipient),
            text: field(ELEMENT_TEXT).unwrap_or_default(),
            hashtag1: field(ELEMENT_HASHTAG1).unwrap_or_default(),
            hashtag2: field(ELEMENT_HASHTAG2).filter(|tag| !tag.trim().is_empty()),
            stamp: field(ELEMENT_STAMP).filter(|stamp| !stamp.trim().is_empty()),
        }))
    }
}

fn required(field: &'static str, value: String) -> Result<String, DialogError> {
    if value.trim().is_empty() {
        Err(DialogError::MissingField { field })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(body: Value) -> SubmitDialogRequest {
        serde_json::from_value(body).expect("valid dialog body")
    }

    #[test]
    fn submission_maps_to_kudos() {
        let request = parse(json!({
            "type": "dialog_submission",
            "state": "B",
            "user_id": "A",
            "channel_id": "town-square",
            "team_id": "t1",
            "submission": {
                "text": "Thanks for the review",
                "hashtag1": "#challenge",
                "hashtag2": null,
                "stamp": "/stamp/stamp_9.png",
            },
            "cancelled": false,
        }));

        let outcome = request.into_outcome().expect("outcome");

        assert_eq!(
            outcome,
            DialogOutcome::Submitted(KudosSubmission {
                team_id: TeamId("t1".to_owned()),
                channel_id: ChannelId("town-square".to_owned()),
                sender: UserId("A".to_owned()),
                recipient: UserId("B".to_owned()),
                text: "Thanks for the review".to_owned(),
                hashtag1: "#challenge".to_owned(),
                hashtag2: None,
                stamp: Some("/stamp/stamp_9.png".to_owned()),
            })
        );
    }

    #[test]
    fn cancellation_needs_no_submission() {
        let request = parse(json!({
            "user_id": "A",
            "channel_id": "town-square",
            "cancelled": true,
        }));

        assert_eq!(
            request.into_outcome(),
            Ok(DialogOutcome::Cancelled {
                user_id: UserId("A".to_owned()),
                channel_id: ChannelId("town-square".to_owned()),
            })
        );
    }

    #[test]
    fn accepted_response_serializes_empty() {
        assert_eq!(serde_json::to_value(SubmitDialogResponse::accepted()).expect("json"), json!({}));
        assert_eq!(
            serde_json::to_value(SubmitDialogResponse::field_error("text", "too long")).expect("json"),
            json!({ "errors": { "text": "too long" } })
        );
    }

    #[test]
    fn missing_state_is_rejected() {
        let request = parse(json!({
            "user_id": "A",
            "channel_id": "town-square",
            "team_id": "t1",
            "submission": { "text": "hi", "hashtag1": "#x" },
        }));

        assert_eq!(request.into_outcome(), Err(DialogError::MissingField { field: "state" }));
    }

    #[test]
    fn non_string_values_are_absent() {
        let request = parse(json!({
            "state": "B",
            "user_id": "A",
            "channel_id": "c",
            "team_id": "t1",
            "submission": { "text": 42, "hashtag1": "#x", "hashtag2": "  ", "stamp": "" },
        }));

        let Ok(DialogOutcome::Submitted(submission)) = request.into_outcome() else {
            panic!("expected a submission");
        };
        assert_eq!(submission.text, "");
        assert_eq!(submission.hashtag2, None);
        assert_eq!(submission.stamp, None);
    }
}
