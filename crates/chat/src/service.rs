use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use peerpost_core::errors::CollaboratorError;
use peerpost_core::kudos::{hashtag_options, join_url, KudosError, PeerPostService};
use peerpost_core::ports::{
    EphemeralSender, PostPublisher, PostSource, ReactionSource, SettingsSnapshot, TeamDirectory,
    UserDirectory,
};
use peerpost_core::report::{PeerReportService, ReportRequest};

use crate::blocks::{kudos_dialog, CommandResponse, OpenDialogRequest, ELEMENT_HASHTAG1, ELEMENT_TEXT};
use crate::commands::{CommandEnvelope, CommandRouteError, PeerCommandService};
use crate::dialog::{DialogOutcome, SubmitDialogRequest, SubmitDialogResponse};

#[async_trait]
pub trait DialogOpener: Send + Sync {
    async fn open_dialog(&self, request: &OpenDialogRequest) -> Result<(), CollaboratorError>;
}

/// Everything the command handler needs from the chat platform.
pub trait ChatPlatform:
    PostSource
    + ReactionSource
    + UserDirectory
    + EphemeralSender
    + PostPublisher
    + TeamDirectory
    + DialogOpener
{
}

impl<T> ChatPlatform for T where
    T: PostSource
        + ReactionSource
        + UserDirectory
        + EphemeralSender
        + PostPublisher
        + TeamDirectory
        + DialogOpener
{
}

/// Settings shared with the provisioning task; requests read a snapshot.
pub type SharedSettings = Arc<RwLock<SettingsSnapshot>>;

pub struct PeerCommandHandler<P> {
    platform: Arc<P>,
    reports: PeerReportService<P>,
    kudos: PeerPostService<P>,
    settings: SharedSettings,
    hashtags: Vec<String>,
}

impl<P> PeerCommandHandler<P>
where
    P: ChatPlatform,
{
    /// `hashtags` are raw configuration entries; they are normalized here.
    pub fn new(platform: Arc<P>, settings: SharedSettings, hashtags: &[String]) -> Self {
        Self {
            reports: PeerReportService::new(Arc::clone(&platform)),
            kudos: PeerPostService::new(Arc::clone(&platform)),
            platform,
            settings,
            hashtags: hashtag_options(hashtags),
        }
    }

    pub fn hashtags(&self) -> &[String] {
        &self.hashtags
    }

    pub async fn settings(&self) -> SettingsSnapshot {
        self.settings.read().await.clone()
    }

    pub async fn submit_dialog(
        &self,
        request: SubmitDialogRequest,
        request_id: &str,
    ) -> Result<SubmitDialogResponse, CommandRouteError> {
        let settings = self.settings().await;

        match request.into_outcome()? {
            DialogOutcome::Cancelled { user_id, channel_id } => {
                match self.kudos.cancel(&user_id, &channel_id, &settings).await {
                    Ok(()) => Ok(SubmitDialogResponse::accepted()),
                    Err(error) => Err(kudos_failure(error, request_id)),
                }
            }
            DialogOutcome::Submitted(submission) => {
                match self.kudos.submit(submission, &settings).await {
                    Ok(_) => Ok(SubmitDialogResponse::accepted()),
                    Err(error) => match dialog_rejection(&error) {
                        Some(response) => Ok(response),
                        None => Err(kudos_failure(error, request_id)),
                    },
                }
            }
        }
    }
}

/// Maps user-fixable kudos errors onto the dialog so it stays open.
fn dialog_rejection(error: &KudosError) -> Option<SubmitDialogResponse> {
    let message = error.user_message()?;
    Some(match error {
        KudosError::InvalidMessage => SubmitDialogResponse::field_error(ELEMENT_TEXT, message),
        KudosError::MissingHashtag => SubmitDialogResponse::field_error(ELEMENT_HASHTAG1, message),
        _ => SubmitDialogResponse::general_error(message),
    })
}

fn kudos_failure(error: KudosError, request_id: &str) -> CommandRouteError {
    tracing::error!(
        event_name = "kudos.failed",
        request_id,
        error = %error,
        "kudos request failed"
    );
    CommandRouteError::Service(error.into_interface(request_id))
}

#[async_trait]
impl<P> PeerCommandService for PeerCommandHandler<P>
where
    P: ChatPlatform,
{
    async fn kudos(&self, envelope: &CommandEnvelope) -> Result<CommandResponse, CommandRouteError> {
        let recipient = match self.kudos.select_recipient(&envelope.user_id, &envelope.arguments).await
        {
            Ok(recipient) => recipient,
            Err(error) => {
                return match error.user_message() {
                    Some(message) => Ok(CommandResponse::ephemeral(message)),
                    None => Err(kudos_failure(error, &envelope.request_id)),
                };
            }
        };

        let settings = self.settings().await;
        let callback_url = join_url(&settings.public_url, crate::blocks::KUDOS_CALLBACK_PATH);
        let request = kudos_dialog(&recipient, &self.hashtags, &envelope.trigger_id, &callback_url);

        if let Err(error) = self.platform.open_dialog(&request).await {
            return Err(kudos_failure(KudosError::from(error), &envelope.request_id));
        }

        tracing::info!(
            event_name = "kudos.dialog_opened",
            request_id = %envelope.request_id,
            recipient = %recipient.id,
            "opened kudos dialog"
        );
        Ok(CommandResponse::empty())
    }

    async fn report(&self, envelope: &CommandEnvelope) -> Result<CommandResponse, CommandRouteError> {
        let settings = self.settings().await;
        let request = ReportRequest {
            user_id: envelope.user_id.clone(),
            channel_id: envelope.channel_id.clone(),
            team_id: envelope.team_id.clone(),
            arguments: envelope.arguments.clone(),
        };

        match self.reports.execute(&request, &settings).await {
            Ok(_) => Ok(CommandResponse::empty()),
            Err(error) => match error.user_message() {
                Some(message) => Ok(CommandResponse::ephemeral(message)),
                None => {
                    tracing::error!(
                        event_name = "report.failed",
                        request_id = %envelope.request_id,
                        error = %error,
                        "peer report failed"
                    );
                    Err(CommandRouteError::Service(error.into_interface(envelope.request_id.clone())))
                }
            },
        }
    }
}
