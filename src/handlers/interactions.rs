use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::discord::{APPLICATION_COMMAND, Interaction, InteractionResponse, PING, parse_story};
use crate::error::CommandError;
use crate::metrics::INTERACTIONS_TOTAL;
use crate::state::AppState;

pub const GENERATING_MESSAGE: &str = "*Generating story (this may take a couple seconds)...*";
pub const UNKNOWN_COMMAND_MESSAGE: &str = "Unknown command";

/// Acknowledge the interaction right away and finish the story in the
/// background, editing the acknowledgement once the outcome is known.
pub async fn interactions_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, StatusCode> {
    INTERACTIONS_TOTAL.inc();

    // user identity comes from the body, so nothing is trusted before this
    if let Err(e) = state.verifier.verify_request(&headers, &body) {
        warn!(error = %e, "rejecting unsigned interaction");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let interaction: Interaction = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "malformed interaction body");
        StatusCode::BAD_REQUEST
    })?;

    match interaction.kind {
        PING => Ok(Json(InteractionResponse::pong())),
        APPLICATION_COMMAND => {
            let req = match parse_story(&interaction) {
                Ok(req) => req,
                Err(CommandError::UnknownCommand(name)) => {
                    warn!(command = %name, "unknown command");
                    return Ok(Json(InteractionResponse::message(UNKNOWN_COMMAND_MESSAGE)));
                }
                Err(e) => {
                    warn!(error = %e, "rejecting interaction");
                    return Ok(Json(InteractionResponse::message(e.to_string())));
                }
            };
            debug!(user_id = %req.user_id, max_tokens = req.max_tokens(), "story requested");

            let token = interaction.token;
            let task_state = state.clone();
            state.tasks.spawn(async move {
                let reply = task_state.dispatcher.handle(&req).await;
                if let Err(e) = task_state.responder.edit_original(&token, &reply.to_string()).await {
                    error!(user_id = %req.user_id, error = %e, "failed to deliver story reply");
                }
            });

            Ok(Json(InteractionResponse::message(GENERATING_MESSAGE)))
        }
        other => {
            warn!(kind = other, "unsupported interaction type");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
