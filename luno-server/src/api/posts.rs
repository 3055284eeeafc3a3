use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use luno_types::{
    CommentView, CreateCommentRequest, CreateCommentResponse, CreatePostResponse, FeedItem,
    LikeState, OkResponse,
};

use crate::state::AppState;

use super::upload::read_upload;
use super::{ApiResult, AuthUser};

/// POST /api/posts - Publish a photo or video (multipart `media` plus optional `caption`)
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<CreatePostResponse>> {
    let mut form = read_upload(multipart, "media").await?;
    let caption = form.field("caption").unwrap_or_default().to_string();
    let file = form.take_file()?;

    let stored = state
        .media
        .store(&file.bytes, file.content_type.as_deref(), file.file_name.as_deref())
        .await?;

    let post = state
        .content()
        .create_post(&auth.identity.id, &caption, stored.media_type, &stored.media_ref)?;

    Ok(Json(post.into()))
}

/// GET /api/feed - Newest posts by the caller and everyone they follow
pub async fn feed(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<FeedItem>>> {
    Ok(Json(state.feed().compose(&auth.identity.id)?))
}

/// POST /api/posts/:id/like
pub async fn like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    state
        .content()
        .set_like(&auth.identity.id, &post_id, LikeState::Liked)?;
    Ok(Json(OkResponse::ok()))
}

/// POST /api/posts/:id/unlike
pub async fn unlike(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    state
        .content()
        .set_like(&auth.identity.id, &post_id, LikeState::Unliked)?;
    Ok(Json(OkResponse::ok()))
}

/// GET /api/posts/:id/comments - Comments oldest first, with author details
pub async fn list_comments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentView>>> {
    Ok(Json(state.content().list_comments(&post_id)?))
}

/// POST /api/posts/:id/comment - A missing body posts an empty comment
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
    payload: Option<Json<CreateCommentRequest>>,
) -> ApiResult<Json<CreateCommentResponse>> {
    let content = payload.map(|Json(body)| body.content).unwrap_or_default();
    let comment = state
        .content()
        .add_comment(&auth.identity.id, &post_id, &content)?;

    Ok(Json(CreateCommentResponse {
        id: comment.id,
        content: comment.content,
        created_at: comment.created_at,
    }))
}
