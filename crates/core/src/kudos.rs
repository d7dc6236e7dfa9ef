//! Rules for the `/peer` command and the recognition posts it produces.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::channel::{ChannelId, TeamId};
use crate::domain::post::{
    PostId, PostRecord, ATTACHMENTS_PROP, FROM_TO_PROP, HASHTAGS_PROP, RECOGNITION_POST_KIND,
};
use crate::domain::user::{UserId, UserProfile};
use crate::errors::{CollaboratorError, InterfaceError};
use crate::ports::{
    EphemeralPost, EphemeralSender, PostPublisher, SettingsSnapshot, TeamDirectory, UserDirectory,
};

pub const PEER_USAGE: &str = "** Peer Post Slash Command Help **

  /peer @username

  - You cannot choose yourself.

  - Mentions addressing several people cannot be used (ex: @all, @channel, @here).

  - Only members of the team can be chosen.";

pub const MESSAGE_MAX_CHARS: usize = 500;
const BROADCAST_MENTIONS: [&str; 3] = ["@all", "@channel", "@here"];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KudosError {
    #[error("invalid /peer invocation")]
    Usage,
    #[error("no user matches `{mention}`")]
    UserNotFound { mention: String },
    #[error("`{mention}` matches more than one user")]
    AmbiguousUser { mention: String },
    #[error("users cannot send a recognition to themselves")]
    SelfRecognition,
    #[error("recognition message must be 1..=500 characters")]
    InvalidMessage,
    #[error("a recognition needs at least one hashtag")]
    MissingHashtag,
    #[error("no recognition channel is configured for team `{0}`")]
    ChannelNotConfigured(TeamId),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl KudosError {
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Usage => Some(PEER_USAGE.to_owned()),
            Self::UserNotFound { mention } => {
                Some(format!("Could not find the user. ({mention})\n\n{PEER_USAGE}"))
            }
            Self::AmbiguousUser { mention } => {
                Some(format!("Could not narrow the mention down to one user. ({mention})\n\n{PEER_USAGE}"))
            }
            Self::SelfRecognition => Some("You cannot choose yourself.".to_owned()),
            Self::InvalidMessage => {
                Some(format!("The message must be between 1 and {MESSAGE_MAX_CHARS} characters."))
            }
            Self::MissingHashtag => Some("Choose at least one team hashtag.".to_owned()),
            Self::ChannelNotConfigured(_) => Some(
                "The recognition channel for this team has not been set up yet. Ask an administrator to provision it."
                    .to_owned(),
            ),
            Self::Collaborator(_) => None,
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self {
            Self::Collaborator(_) => InterfaceError::ServiceUnavailable { message, correlation_id },
            _ => InterfaceError::BadRequest { message, correlation_id },
        }
    }
}

/// Username named by the single `@mention` argument.
pub fn parse_mention(arguments: &[String]) -> Result<&str, KudosError> {
    let [mention] = arguments else {
        return Err(KudosError::Usage);
    };
    let Some(username) = mention.strip_prefix('@') else {
        return Err(KudosError::Usage);
    };
    if username.is_empty() || BROADCAST_MENTIONS.contains(&mention.as_str()) {
        return Err(KudosError::Usage);
    }
    Ok(username)
}

/// `#`-prefixed tag with spaces and any existing `#` removed, or `None` when nothing is left.
pub fn normalize_hashtag(raw: &str) -> Option<String> {
    let bare = raw.replace([' ', '#'], "");
    let bare = bare.trim();
    (!bare.is_empty()).then(|| format!("#{bare}"))
}

/// Hashtag choices offered in the kudos dialog. Entries may hold several lines.
pub fn hashtag_options(entries: &[String]) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    for tag in entries.iter().flat_map(|entry| entry.lines()).filter_map(normalize_hashtag) {
        if !options.contains(&tag) {
            options.push(tag);
        }
    }
    options
}

pub fn compose_hashtags(first: &str, second: Option<&str>) -> Result<String, KudosError> {
    let first = normalize_hashtag(first).ok_or(KudosError::MissingHashtag)?;
    Ok(match second.and_then(normalize_hashtag) {
        Some(second) => format!("{first} {second}"),
        None => first,
    })
}

/// Copies the `hashtags` prop into the searchable hashtag field of recognition posts.
///
/// Returns whether the post was changed.
pub fn apply_hashtag_hook(post: &mut PostRecord) -> bool {
    if !post.is_recognition() {
        return false;
    }
    let Some(Value::String(hashtags)) = post.props.get(HASHTAGS_PROP) else {
        return false;
    };
    post.hashtags = hashtags.clone();
    true
}

/// A submitted kudos dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KudosSubmission {
    pub team_id: TeamId,
    /// Channel the `/peer` command was run in.
    pub channel_id: ChannelId,
    pub sender: UserId,
    pub recipient: UserId,
    pub text: String,
    pub hashtag1: String,
    pub hashtag2: Option<String>,
    /// Site-relative stamp path such as `/stamp/stamp_1.png`.
    pub stamp: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognitionDraft {
    pub channel_id: ChannelId,
    pub bot_user_id: UserId,
    pub sender: UserProfile,
    pub recipient: UserProfile,
    pub text: String,
    pub hashtags: String,
    pub author_icon: String,
    pub stamp_url: Option<String>,
}

impl RecognitionDraft {
    pub fn message(&self) -> String {
        format!("@{}\n{}\n{}", self.recipient.display_name(), self.text, self.hashtags)
    }

    pub fn into_post(self) -> PostRecord {
        let message = self.message();
        let mut attachment = Map::new();
        attachment.insert("author_name".to_owned(), json!(self.sender.display_name()));
        attachment.insert("author_icon".to_owned(), json!(self.author_icon));
        attachment.insert("text".to_owned(), json!(message));
        if let Some(stamp_url) = &self.stamp_url {
            attachment.insert("thumb_url".to_owned(), json!(stamp_url));
        }

        let mut props = Map::new();
        props.insert(HASHTAGS_PROP.to_owned(), json!(&self.hashtags));
        props.insert(
            FROM_TO_PROP.to_owned(),
            json!(format!("{} {}", self.sender.id.0, self.recipient.id.0)),
        );
        props.insert(ATTACHMENTS_PROP.to_owned(), Value::Array(vec![Value::Object(attachment)]));

        PostRecord {
            id: PostId(String::new()),
            channel_id: self.channel_id,
            user_id: self.bot_user_id,
            kind: RECOGNITION_POST_KIND.to_owned(),
            message: String::new(),
            props,
            hashtags: self.hashtags,
            has_reactions: false,
            create_at: 0,
            delete_at: 0,
        }
    }
}

pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub struct PeerPostService<P> {
    platform: Arc<P>,
}

impl<P> PeerPostService<P>
where
    P: UserDirectory + PostPublisher + EphemeralSender + TeamDirectory,
{
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// Validates `/peer @username` and returns the chosen recipient.
    pub async fn select_recipient(
        &self,
        requester: &UserId,
        arguments: &[String],
    ) -> Result<UserProfile, KudosError> {
        let username = parse_mention(arguments)?;
        let mention = format!("@{username}");
        let mut matches = self.platform.find_by_username(username).await?;

        let recipient = match matches.len() {
            0 => return Err(KudosError::UserNotFound { mention }),
            1 => matches.remove(0),
            _ => return Err(KudosError::AmbiguousUser { mention }),
        };
        if &recipient.id == requester {
            return Err(KudosError::SelfRecognition);
        }

        Ok(recipient)
    }

    /// Publishes the recognition post for a submitted dialog.
    pub async fn submit(
        &self,
        submission: KudosSubmission,
        settings: &SettingsSnapshot,
    ) -> Result<PostRecord, KudosError> {
        let text_len = submission.text.trim().chars().count();
        if text_len == 0 || text_len > MESSAGE_MAX_CHARS {
            return Err(KudosError::InvalidMessage);
        }
        let hashtags = compose_hashtags(&submission.hashtag1, submission.hashtag2.as_deref())?;
        let target_channel = settings
            .channels
            .channel_for(&submission.team_id)
            .cloned()
            .ok_or_else(|| KudosError::ChannelNotConfigured(submission.team_id.clone()))?;

        let sender = self.platform.get_user(&submission.sender).await?;
        let recipient = self.platform.get_user(&submission.recipient).await?;

        let draft = RecognitionDraft {
            channel_id: target_channel.clone(),
            bot_user_id: settings.bot_user_id.clone(),
            author_icon: join_url(&settings.site_url, &format!("api/v4/users/{}/image", sender.id)),
            sender,
            recipient,
            text: submission.text,
            hashtags,
            stamp_url: submission
                .stamp
                .as_deref()
                .filter(|stamp| !stamp.trim().is_empty())
                .map(|stamp| join_url(&settings.public_url, stamp)),
        };
        let created = self.platform.create_post(draft.into_post()).await?;

        tracing::info!(
            event_name = "kudos.posted",
            post_id = %created.id,
            team_id = %submission.team_id,
            channel_id = %target_channel,
            "recognition post created"
        );

        if submission.channel_id != target_channel {
            let team = self.platform.get_team(&submission.team_id).await?;
            let permalink = join_url(&settings.site_url, &format!("{}/pl/{}", team.name, created.id));
            self.notify(
                &submission.sender,
                &submission.channel_id,
                settings,
                format!("[Posted here.]({permalink})"),
            )
            .await?;
        }

        Ok(created)
    }

    pub async fn cancel(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
        settings: &SettingsSnapshot,
    ) -> Result<(), KudosError> {
        self.notify(user_id, channel_id, settings, "Post cancelled.".to_owned()).await
    }

    async fn notify(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
        settings: &SettingsSnapshot,
        message: String,
    ) -> Result<(), KudosError> {
        let post = EphemeralPost {
            user_id: user_id.clone(),
            channel_id: channel_id.clone(),
            sender_id: settings.bot_user_id.clone(),
            message,
        };
        self.platform.send_ephemeral(post).await.map_err(|error| {
            tracing::error!(
                event_name = "kudos.notify_failed",
                user_id = %user_id,
                error = %error,
                "failed to send ephemeral notice"
            );
            KudosError::from(error)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::FixedOffset;
    use serde_json::json;

    use super::{
        apply_hashtag_hook, compose_hashtags, hashtag_options, parse_mention, KudosError,
        KudosSubmission, PeerPostService,
    };
    use crate::domain::channel::{ChannelDirectory, ChannelId, TeamId};
    use crate::domain::user::UserId;
    use crate::ports::SettingsSnapshot;
    use crate::testing::{profile, recognition_post, FakePlatform};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    fn settings() -> SettingsSnapshot {
        SettingsSnapshot {
            channels: [(TeamId("t1".to_owned()), ChannelId("peer-channel".to_owned()))]
                .into_iter()
                .collect::<ChannelDirectory>(),
            bot_user_id: UserId("bot".to_owned()),
            utc_offset: FixedOffset::east_opt(0).expect("offset"),
            site_url: "https://chat.example.com/".to_owned(),
            public_url: "https://peer.example.com".to_owned(),
        }
    }

    fn submission(channel: &str) -> KudosSubmission {
        KudosSubmission {
            team_id: TeamId("t1".to_owned()),
            channel_id: ChannelId(channel.to_owned()),
            sender: UserId("A".to_owned()),
            recipient: UserId("B".to_owned()),
            text: "Thanks for the review!".to_owned(),
            hashtag1: "challenge".to_owned(),
            hashtag2: Some("#teamwork".to_owned()),
            stamp: Some("/stamp/stamp_1.png".to_owned()),
        }
    }

    #[test]
    fn mention_must_be_a_single_person() {
        assert_eq!(parse_mention(&args(&["@bob"])), Ok("bob"));
        assert_eq!(parse_mention(&args(&[])), Err(KudosError::Usage));
        assert_eq!(parse_mention(&args(&["@bob", "@carol"])), Err(KudosError::Usage));
        assert_eq!(parse_mention(&args(&["bob"])), Err(KudosError::Usage));
        assert_eq!(parse_mention(&args(&["@"])), Err(KudosError::Usage));
        for broadcast in ["@all", "@channel", "@here"] {
            assert_eq!(parse_mention(&args(&[broadcast])), Err(KudosError::Usage));
        }
    }

    #[test]
    fn hashtag_options_are_normalized_once() {
        let options = hashtag_options(&[
            "#challenge\nbehind the scenes".to_owned(),
            "  ".to_owned(),
            "##challenge".to_owned(),
        ]);
        assert_eq!(options, vec!["#challenge".to_owned(), "#behindthescenes".to_owned()]);
    }

    #[test]
    fn composed_hashtags_carry_one_prefix_each() {
        assert_eq!(compose_hashtags("x", Some("#y")), Ok("#x #y".to_owned()));
        assert_eq!(compose_hashtags("#x", Some("")), Ok("#x".to_owned()));
        assert_eq!(compose_hashtags("#", None), Err(KudosError::MissingHashtag));
    }

    #[test]
    fn hook_copies_hashtags_only_for_recognition_posts() {
        let mut post = recognition_post("p1", "A", "B", "", false);
        post.props.insert("hashtags".to_owned(), json!("#x #y"));
        assert!(apply_hashtag_hook(&mut post));
        assert_eq!(post.hashtags, "#x #y");

        let mut plain = recognition_post("p2", "A", "B", "", false);
        plain.kind = String::new();
        plain.props.insert("hashtags".to_owned(), json!("#x"));
        assert!(!apply_hashtag_hook(&mut plain));
        assert!(plain.hashtags.is_empty());

        let mut odd = recognition_post("p3", "A", "B", "", false);
        odd.props.insert("hashtags".to_owned(), json!(["#x"]));
        assert!(!apply_hashtag_hook(&mut odd));
    }

    #[tokio::test]
    async fn recipient_selection_rejects_unknown_ambiguous_and_self() {
        let mut platform = FakePlatform::with_posts(Vec::new());
        platform.users.push(profile("T1", "twin", ""));
        platform.users.push(profile("T2", "twin", ""));
        let service = PeerPostService::new(Arc::new(platform));
        let requester = UserId("A".to_owned());

        let chosen = service.select_recipient(&requester, &args(&["@bob"])).await.expect("bob");
        assert_eq!(chosen.id, UserId("B".to_owned()));

        assert_eq!(
            service.select_recipient(&requester, &args(&["@nobody"])).await,
            Err(KudosError::UserNotFound { mention: "@nobody".to_owned() })
        );
        assert_eq!(
            service.select_recipient(&requester, &args(&["@twin"])).await,
            Err(KudosError::AmbiguousUser { mention: "@twin".to_owned() })
        );
        assert_eq!(
            service.select_recipient(&requester, &args(&["@alice"])).await,
            Err(KudosError::SelfRecognition)
        );
    }

    #[tokio::test]
    async fn submission_posts_to_the_team_channel_and_links_back() {
        let platform = Arc::new(FakePlatform::with_posts(Vec::new()));
        let service = PeerPostService::new(Arc::clone(&platform));

        let created = service.submit(submission("town-square"), &settings()).await.expect("posted");

        let posts = platform.created();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.channel_id, ChannelId("peer-channel".to_owned()));
        assert_eq!(post.user_id, UserId("bot".to_owned()));
        assert_eq!(post.props["from-to"], json!("A B"));
        assert_eq!(post.props["hashtags"], json!("#challenge #teamwork"));
        let attachment = &post.props["attachments"][0];
        assert_eq!(attachment["author_name"], json!("Alice"));
        assert_eq!(attachment["author_icon"], json!("https://chat.example.com/api/v4/users/A/image"));
        assert_eq!(attachment["text"], json!("@Bob\nThanks for the review!\n#challenge #teamwork"));
        assert_eq!(attachment["thumb_url"], json!("https://peer.example.com/stamp/stamp_1.png"));

        let recognition = created.recognition().expect("valid").expect("in scope");
        assert_eq!(recognition.sender, UserId("A".to_owned()));

        let sent = platform.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].message,
            format!("[Posted here.](https://chat.example.com/core-team/pl/{})", created.id)
        );
        assert_eq!(sent[0].channel_id, ChannelId("town-square".to_owned()));
    }

    #[tokio::test]
    async fn submission_from_the_recognition_channel_sends_no_notice() {
        let platform = Arc::new(FakePlatform::with_posts(Vec::new()));
        let service = PeerPostService::new(Arc::clone(&platform));

        service.submit(submission("peer-channel"), &settings()).await.expect("posted");

        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_posting() {
        let platform = Arc::new(FakePlatform::with_posts(Vec::new()));
        let service = PeerPostService::new(Arc::clone(&platform));
        let mut empty = submission("peer-channel");
        empty.text = "   ".to_owned();

        assert_eq!(service.submit(empty, &settings()).await, Err(KudosError::InvalidMessage));
        assert!(platform.created().is_empty());
    }

    #[tokio::test]
    async fn cancellation_notifies_the_user() {
        let platform = Arc::new(FakePlatform::with_posts(Vec::new()));
        let service = PeerPostService::new(Arc::clone(&platform));

        service
            .cancel(&UserId("A".to_owned()), &ChannelId("town-square".to_owned()), &settings())
            .await
            .expect("sent");

        assert_eq!(platform.sent()[0].message, "Post cancelled.");
    }
}
