use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::MediaType;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339_opts(SecondsFormat::Millis, true);
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// A registered account. The password hash never leaves the server crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub caption: String,
    pub media_type: MediaType,
    pub media_url: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// A post as it appears in a viewer's feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_avatar: String,
    pub caption: String,
    pub media_type: MediaType,
    pub media_url: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    pub likes: usize,
    /// Whether the viewer who requested the feed has liked this post
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// A comment joined with its author's public details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub username: String,
    pub avatar: String,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// The authenticated user's own profile with aggregate counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub followers: usize,
    pub following: usize,
    pub posts: usize,
}

/// Another user's profile as seen by a viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileView {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub followers: usize,
    pub following: usize,
    pub posts: usize,
    pub is_following: bool,
    pub is_self: bool,
}

// Request/Response types for API
#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostResponse {
    pub id: Uuid,
    pub media_type: MediaType,
    pub media_url: String,
    pub caption: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

impl From<Post> for CreatePostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            media_type: post.media_type,
            media_url: post.media_url,
            caption: post.caption,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentResponse {
    pub id: Uuid,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
