pub mod config;
pub mod domain;
pub mod errors;
pub mod kudos;
pub mod ports;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::channel::{Channel, ChannelDirectory, ChannelId, Team, TeamId};
pub use domain::post::{PostId, PostRecord, RecognitionPost, RelationError};
pub use domain::reaction::Reaction;
pub use domain::user::{UserId, UserProfile};
pub use errors::{CollaboratorError, InterfaceError, ReportError};
pub use kudos::{KudosError, KudosSubmission, PeerPostService};
pub use ports::{
    EphemeralPost, EphemeralSender, NewChannel, PostPublisher, PostSource, ReactionSource,
    SettingsSnapshot, TeamDirectory, UserDirectory,
};
pub use report::{GeneratedReport, PeerReportService, ReportRequest};
