use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use peerpost_chat::blocks::KUDOS_CALLBACK_PATH;
use peerpost_chat::{
    CommandResponse, CommandRouteError, CommandRouter, MattermostClient, PeerCommandHandler,
    SlashCommandPayload, SubmitDialogRequest, SubmitDialogResponse,
};
use peerpost_core::errors::InterfaceError;
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::warn;
use uuid::Uuid;

pub type CommandHandler = PeerCommandHandler<MattermostClient>;

#[derive(Clone)]
pub struct RouteState {
    commands: Arc<CommandRouter<CommandHandler>>,
}

/// Slash commands, dialog callbacks and stamp images.
pub fn router(commands: Arc<CommandRouter<CommandHandler>>, stamps_dir: &Path) -> Router {
    Router::new()
        .route("/commands", post(slash_command))
        .route(KUDOS_CALLBACK_PATH, post(dialog_callback))
        .nest_service("/stamp", ServeDir::new(stamps_dir))
        .with_state(RouteState { commands })
}

async fn slash_command(
    State(state): State<RouteState>,
    Form(mut payload): Form<SlashCommandPayload>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    payload.request_id = request_id.clone();

    match state.commands.dispatch(payload).await {
        Ok(response) => Json(response).into_response(),
        // Mattermost only renders 200 bodies, so service failures become ephemeral text.
        Err(CommandRouteError::Service(error)) => {
            Json(CommandResponse::ephemeral(failure_text(&error))).into_response()
        }
        Err(error) => rejected(error, &request_id),
    }
}

async fn dialog_callback(
    State(state): State<RouteState>,
    Json(request): Json<SubmitDialogRequest>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();

    match state.commands.service().submit_dialog(request, &request_id).await {
        Ok(response) => Json(response).into_response(),
        Err(CommandRouteError::Service(error)) => {
            Json(SubmitDialogResponse::general_error(failure_text(&error))).into_response()
        }
        Err(error) => rejected(error, &request_id),
    }
}

fn failure_text(error: &InterfaceError) -> String {
    format!("{} (ref: {})", error.user_message(), error.correlation_id())
}

fn rejected(error: CommandRouteError, request_id: &str) -> Response {
    warn!(
        event_name = "http.request_rejected",
        request_id,
        error = %error,
        "malformed request from the platform"
    );
    (StatusCode::BAD_REQUEST, Json(json!({ "error": error.to_string(), "request_id": request_id })))
        .into_response()
}
