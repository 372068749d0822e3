//! HTTP API endpoints.
//!
//! Read-only views of the poll registry, for clients that want to list
//! ballots without holding a WebSocket open.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::protocol::PollView;
use crate::state::AppState;

/// List all open polls, oldest first.
///
/// GET /api/polls
///
/// Returns ballots only. Vote counts stay private until a poll
/// finalizes and its results are announced.
pub async fn list_open_polls(State(state): State<Arc<AppState>>) -> Json<Vec<PollView>> {
    let polls = state.open_polls().await;
    Json(polls.iter().map(PollView::render).collect())
}
