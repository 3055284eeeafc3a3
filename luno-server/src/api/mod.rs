pub mod auth;
pub mod error;
pub mod extract;
pub mod messages;
pub mod posts;
pub mod stream;
pub mod upload;
pub mod users;

pub use error::{ApiError, ApiResult};
pub use extract::AuthUser;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// All HTTP and WebSocket routes, without the static file services
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        // User routes
        .route("/api/users/me", get(users::me))
        .route("/api/users/avatar", post(users::upload_avatar))
        .route("/api/users/:id", get(users::profile))
        .route("/api/users/:id/follow", post(users::follow))
        .route("/api/users/:id/unfollow", post(users::unfollow))
        // Post routes
        .route("/api/posts", post(posts::create_post))
        .route("/api/feed", get(posts::feed))
        .route("/api/posts/:id/like", post(posts::like))
        .route("/api/posts/:id/unlike", post(posts::unlike))
        .route("/api/posts/:id/comments", get(posts::list_comments))
        .route("/api/posts/:id/comment", post(posts::add_comment))
        // Messaging routes
        .route("/api/messages/:user_id", get(messages::conversation))
        .route("/ws", get(stream::stream_handler))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
