pub mod aggregate;
pub mod date;
pub mod ranking;
pub mod render;
pub mod tally;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::channel::{ChannelId, TeamId};
use crate::domain::user::UserId;
use crate::errors::ReportError;
use crate::ports::{
    EphemeralPost, EphemeralSender, PostSource, ReactionSource, SettingsSnapshot, UserDirectory,
};
use crate::report::aggregate::{AggregationError, Aggregator};
use crate::report::date::{DateResolver, REPORT_USAGE};
use crate::report::ranking::Rankings;

/// A `/peer-report` invocation after slash-command normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRequest {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub team_id: TeamId,
    pub arguments: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedReport {
    pub start: DateTime<Utc>,
    pub rankings: Rankings,
    pub posts_counted: usize,
    pub text: String,
}

pub struct PeerReportService<P> {
    platform: Arc<P>,
}

impl<P> PeerReportService<P>
where
    P: PostSource + ReactionSource + UserDirectory,
{
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// Builds the report without delivering it.
    pub async fn generate(
        &self,
        channel_id: &ChannelId,
        start: DateTime<Utc>,
    ) -> Result<GeneratedReport, AggregationError> {
        let platform = self.platform.as_ref();
        let aggregator = Aggregator::new(platform, platform, platform);
        let result = aggregator.aggregate(channel_id, start).await?;
        let rankings = Rankings::from_aggregation(&result);
        let text = render::render(&rankings, &result.names);

        Ok(GeneratedReport { start, rankings, posts_counted: result.posts_counted, text })
    }
}

impl<P> PeerReportService<P>
where
    P: PostSource + ReactionSource + UserDirectory + EphemeralSender,
{
    pub async fn execute(
        &self,
        request: &ReportRequest,
        settings: &SettingsSnapshot,
    ) -> Result<GeneratedReport, ReportError> {
        let today = DateResolver::new(settings.utc_offset).today();
        self.execute_on(request, settings, today).await
    }

    /// Runs the command as if it were `today` at the configured offset.
    pub async fn execute_on(
        &self,
        request: &ReportRequest,
        settings: &SettingsSnapshot,
        today: NaiveDate,
    ) -> Result<GeneratedReport, ReportError> {
        if request.arguments.len() > 1 {
            return Err(ReportError::Usage { usage: REPORT_USAGE.to_owned() });
        }

        let resolver = DateResolver::new(settings.utc_offset);
        let start = resolver.resolve(request.arguments.first().map(String::as_str), today)?;
        let channel_id = settings
            .channels
            .channel_for(&request.team_id)
            .ok_or_else(|| ReportError::ChannelNotConfigured(request.team_id.clone()))?;

        let report = self.generate(channel_id, start).await?;

        let delivery = EphemeralPost {
            user_id: request.user_id.clone(),
            channel_id: request.channel_id.clone(),
            sender_id: settings.bot_user_id.clone(),
            message: report.text.clone(),
        };
        if let Err(error) = self.platform.send_ephemeral(delivery).await {
            tracing::error!(
                event_name = "report.delivery_failed",
                user_id = %request.user_id,
                channel_id = %request.channel_id,
                error = %error,
                "failed to deliver peer report"
            );
            return Err(ReportError::Delivery(error));
        }

        tracing::info!(
            event_name = "report.delivered",
            user_id = %request.user_id,
            team_id = %request.team_id,
            start = %report.start,
            posts = report.posts_counted,
            "peer report delivered"
        );

        Ok(report)
    }
}
