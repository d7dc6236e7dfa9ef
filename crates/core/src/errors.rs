use thiserror::Error;

use crate::domain::channel::TeamId;
use crate::report::aggregate::AggregationError;
use crate::report::date::DateError;

/// Failure reported by a collaborator behind one of the ports.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{operation} failed: {message}")]
    Transport { operation: &'static str, message: String },
    #[error("{operation} was rejected with status {status}: {message}")]
    Rejected { operation: &'static str, status: u16, message: String },
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("storage failure: {0}")]
    Storage(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("{usage}")]
    Usage { usage: String },
    #[error(transparent)]
    Date(#[from] DateError),
    #[error("no recognition channel is configured for team `{0}`")]
    ChannelNotConfigured(TeamId),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error("report delivery failed: {0}")]
    Delivery(CollaboratorError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ReportError {
    /// Text shown to the caller when the failure is theirs to fix.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Usage { usage } => Some(usage.clone()),
            Self::Date(error) => Some(error.user_message()),
            Self::ChannelNotConfigured(_) => Some(
                "The recognition channel for this team has not been set up yet. Ask an administrator to provision it."
                    .to_owned(),
            ),
            Self::Aggregation(_) | Self::Delivery(_) => None,
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self {
            Self::Usage { .. } | Self::Date(_) | Self::ChannelNotConfigured(_) => {
                InterfaceError::BadRequest { message, correlation_id }
            }
            Self::Aggregation(AggregationError::DataIntegrityFault { .. }) => {
                InterfaceError::Internal { message, correlation_id }
            }
            Self::Aggregation(AggregationError::Collaborator(_)) | Self::Delivery(_) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
        }
    }
}
