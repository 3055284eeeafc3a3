use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use luno_types::{AccountProfile, AvatarResponse, OkResponse, UserProfileView};

use crate::identity::IdentityStore;
use crate::state::AppState;

use super::upload::read_upload;
use super::{ApiResult, AuthUser};

/// GET /api/users/me - The caller's account with follower, following and post counts
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<AccountProfile>> {
    let user = state.accounts.resolve_user(&auth.identity.id)?;
    let graph = state.graph();

    Ok(Json(AccountProfile {
        followers: graph.follower_count(&user.id)?,
        following: graph.following_count(&user.id)?,
        posts: state.content().post_count(&user.id)?,
        id: user.id,
        username: user.username,
        avatar: user.avatar,
    }))
}

/// POST /api/users/avatar - Replace the caller's avatar (multipart field `avatar`)
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<AvatarResponse>> {
    let file = read_upload(multipart, "avatar").await?.take_file()?;

    let stored = state
        .media
        .store(&file.bytes, file.content_type.as_deref(), file.file_name.as_deref())
        .await?;
    state.accounts.set_avatar(&auth.identity.id, &stored.media_ref)?;

    Ok(Json(AvatarResponse {
        avatar: stored.media_ref,
    }))
}

/// GET /api/users/:id - Another user's profile as seen by the caller
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserProfileView>> {
    let user = state.accounts.resolve_user(&user_id)?;
    let graph = state.graph();

    Ok(Json(UserProfileView {
        followers: graph.follower_count(&user.id)?,
        following: graph.following_count(&user.id)?,
        posts: state.content().post_count(&user.id)?,
        is_following: graph.is_following(&auth.identity.id, &user.id)?,
        is_self: auth.identity.id == user.id,
        id: user.id,
        username: user.username,
        avatar: user.avatar,
    }))
}

/// POST /api/users/:id/follow
pub async fn follow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    state.graph().follow(&auth.identity.id, &user_id)?;
    Ok(Json(OkResponse::ok()))
}

/// POST /api/users/:id/unfollow
pub async fn unfollow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    state.graph().unfollow(&auth.identity.id, &user_id)?;
    Ok(Json(OkResponse::ok()))
}
