//! Mattermost-facing side of peerpost.
//!
//! `commands` normalizes slash commands and routes them to a [`commands::PeerCommandService`],
//! `blocks` and `dialog` hold the wire shapes for responses and the kudos dialog,
//! `mattermost` is the REST client behind the core ports, and `provision` makes sure every team
//! has its recognition channel.

pub mod blocks;
pub mod commands;
pub mod dialog;
pub mod hooks;
pub mod mattermost;
pub mod provision;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use blocks::{CommandResponse, OpenDialogRequest};
pub use commands::{
    normalize_peer_command, CommandEnvelope, CommandParseError, CommandRouteError, CommandRouter,
    PeerCommand, PeerCommandService, SlashCommandPayload,
};
pub use dialog::{DialogOutcome, SubmitDialogRequest, SubmitDialogResponse};
pub use mattermost::{ClientError, MattermostClient};
pub use provision::ensure_channels;
pub use service::{ChatPlatform, DialogOpener, PeerCommandHandler, SharedSettings};
