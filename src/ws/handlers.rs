//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! Creation errors go straight back to the sender; everything else is
//! announced through the publisher.

use crate::error::USAGE_HINT;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::VoterId;
use std::sync::Arc;

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    voter_id: &VoterId,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreatePoll {
            question,
            choices,
            window,
        } => {
            match state
                .create_poll(voter_id, &question, &choices, &window)
                .await
            {
                // The ballot reaches everyone through the publisher.
                Ok(_) => None,
                Err(e) => Some(ServerMessage::Error {
                    code: e.code().to_string(),
                    msg: format!("{}. {}", e, USAGE_HINT),
                }),
            }
        }

        ClientMessage::CastVote { poll_id, tag } => {
            // The outcome reaches the voter through their direct line.
            state.submit_vote(voter_id, &poll_id, tag).await;
            None
        }
    }
}
