use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::OwnerProfile;

// -- JWT Claims --

/// JWT claims shared by the REST middleware and the auth handlers.
/// Canonical definition lives here in clipstream-types to eliminate
/// duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Videos --

/// The stored-media descriptor (`video_url`, `thumbnail_url`, `duration`)
/// comes from the external upload service; this backend never handles the
/// binary itself.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: u64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

/// Feed entry: video fields plus the owner's public profile.
#[derive(Debug, Serialize)]
pub struct VideoSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerProfile,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_type")]
    pub sort_type: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

fn default_sort_by() -> String {
    "createdAt".into()
}

fn default_sort_type() -> String {
    "desc".into()
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

// -- Reactions --

#[derive(Debug, Serialize)]
pub struct ToggleReactionResponse {
    pub now_liked: bool,
    pub total_count: u64,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub video_id: Uuid,
    pub body: String,
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerProfile,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub body: String,
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
}

// -- Subscriptions --

#[derive(Debug, Serialize)]
pub struct ToggleSubscriptionResponse {
    pub subscribed: bool,
    pub subscriber_count: u64,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionEntry {
    pub user_id: Uuid,
    pub profile: OwnerProfile,
    pub since: DateTime<Utc>,
}

// -- Channel stats --

/// Derived projection, recomputed on every request. Never persisted.
#[derive(Debug, Serialize)]
pub struct ChannelStatsResponse {
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub total_views: u64,
    pub total_videos: u64,
    pub total_likes: u64,
    pub total_subscribers: u64,
    pub total_subscribed_to: u64,
    pub comment_count: u64,
    pub post_count: u64,
}

#[derive(Debug, Serialize)]
pub struct ChannelVideoSummary {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub views: u64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub like_count: u64,
    pub comment_count: u64,
}

// -- Playlists --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistDetailResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub videos: Vec<VideoSummary>,
}
