/// Database row types — these map directly to SQLite rows.
/// Distinct from the clipstream-types API models to keep the DB layer
/// independent; ids and timestamps stay as stored text here and are parsed
/// at the API boundary.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct VideoRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: String,
}

#[derive(Debug)]
pub struct CommentRow {
    pub id: String,
    pub owner_id: String,
    pub video_id: String,
    pub body: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub owner_id: String,
    pub body: String,
    pub created_at: String,
}

/// Feed entry: video columns plus the owner's public profile from a LEFT
/// JOIN. Owner fields are None when the join misses; the row is still
/// returned.
#[derive(Debug)]
pub struct FeedVideoRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: String,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub owner_avatar_url: Option<String>,
}

pub struct CommentWithMetaRow {
    pub comment: CommentRow,
    pub like_count: i64,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub owner_avatar_url: Option<String>,
}

pub struct PostWithMetaRow {
    pub post: PostRow,
    pub like_count: i64,
}

/// Derived per-channel aggregate. Computed fresh on every call, never
/// persisted.
#[derive(Debug)]
pub struct ChannelStatsRow {
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub total_views: i64,
    pub total_videos: i64,
    pub total_likes: i64,
    pub total_subscribers: i64,
    pub total_subscribed_to: i64,
    pub comment_count: i64,
    pub post_count: i64,
}

#[derive(Debug)]
pub struct ChannelVideoRow {
    pub video: VideoRow,
    pub like_count: i64,
    pub comment_count: i64,
}

pub struct SubscriptionEntryRow {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub created_at: String,
}

pub struct PlaylistRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
}
