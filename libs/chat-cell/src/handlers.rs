use std::sync::Arc;

use axum::{extract::State, Json};
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{ChatRequest, ChatResponse, StartChatRequest, StartChatResponse};
use crate::services::ConversationService;

pub struct ChatCellState {
    pub conversation: Arc<ConversationService>,
}

fn require_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("text must not be empty".to_string()));
    }
    Ok(())
}

/// Opens a new session and processes its first message.
#[axum::debug_handler]
pub async fn start_chat(
    State(state): State<Arc<ChatCellState>>,
    Json(request): Json<StartChatRequest>,
) -> Result<Json<StartChatResponse>, AppError> {
    require_text(&request.text)?;

    let session_id = Uuid::new_v4().to_string();
    let reply = state
        .conversation
        .handle(ChatRequest {
            session_id: session_id.clone(),
            text: request.text,
        })
        .await;

    Ok(Json(StartChatResponse {
        session_id,
        text: reply.text,
    }))
}

#[axum::debug_handler]
pub async fn continue_chat(
    State(state): State<Arc<ChatCellState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.session_id.trim().is_empty() {
        return Err(AppError::BadRequest("session_id must not be empty".to_string()));
    }
    require_text(&request.text)?;

    Ok(Json(state.conversation.handle(request).await))
}
