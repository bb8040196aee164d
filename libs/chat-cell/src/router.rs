use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers::{self, ChatCellState};

pub fn chat_routes(state: Arc<ChatCellState>) -> Router {
    Router::new()
        .route("/start", post(handlers::start_chat))
        .route("/continue", post(handlers::continue_chat))
        .with_state(state)
}
