use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use luno_types::DirectMessage;

use crate::state::AppState;

use super::{ApiResult, AuthUser};

/// GET /api/messages/:user_id - Conversation between the caller and another user, oldest first
pub async fn conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<DirectMessage>>> {
    Ok(Json(state.relay.conversation(&auth.identity.id, &user_id)?))
}
