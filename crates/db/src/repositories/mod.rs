use async_trait::async_trait;
use thiserror::Error;

use peerpost_core::domain::post::PostRecord;
use peerpost_core::domain::reaction::Reaction;
use peerpost_core::domain::user::UserProfile;
use peerpost_core::errors::CollaboratorError;

pub mod memory;
pub mod post;

pub use memory::InMemoryPostArchive;
pub use post::SqlPostArchive;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for CollaboratorError {
    fn from(error: RepositoryError) -> Self {
        CollaboratorError::Storage(error.to_string())
    }
}

/// Write side of the local archive. Reads go through the core ports.
#[async_trait]
pub trait PostArchive: Send + Sync {
    async fn save_user(&self, user: UserProfile) -> Result<(), RepositoryError>;
    async fn save_post(&self, post: PostRecord) -> Result<(), RepositoryError>;
    async fn save_reaction(&self, reaction: Reaction) -> Result<(), RepositoryError>;
}
