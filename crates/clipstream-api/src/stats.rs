use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use clipstream_db::models::ChannelVideoRow;
use clipstream_types::api::{ChannelStatsResponse, ChannelVideoSummary};

use crate::auth::AppState;
use crate::convert::{parse_id, parse_ts};
use crate::error::{ApiResult, join_error};

/// Dashboard numbers for a channel. Recomputed from current store contents
/// on every call; nothing here is cached or memoized.
pub async fn channel_stats(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> ApiResult<Json<ChannelStatsResponse>> {
    let row = tokio::task::spawn_blocking(move || state.db.channel_stats(&channel_id.to_string()))
        .await
        .map_err(join_error)??;

    Ok(Json(ChannelStatsResponse {
        username: row.username,
        full_name: row.full_name,
        avatar_url: row.avatar_url,
        total_views: row.total_views.max(0) as u64,
        total_videos: row.total_videos.max(0) as u64,
        total_likes: row.total_likes.max(0) as u64,
        total_subscribers: row.total_subscribers.max(0) as u64,
        total_subscribed_to: row.total_subscribed_to.max(0) as u64,
        comment_count: row.comment_count.max(0) as u64,
        post_count: row.post_count.max(0) as u64,
    }))
}

pub async fn channel_videos(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChannelVideoSummary>>> {
    let rows = tokio::task::spawn_blocking(move || state.db.channel_videos(&channel_id.to_string()))
        .await
        .map_err(join_error)??;

    Ok(Json(rows.into_iter().map(channel_video_summary).collect()))
}

fn channel_video_summary(row: ChannelVideoRow) -> ChannelVideoSummary {
    ChannelVideoSummary {
        id: parse_id(&row.video.id),
        title: row.video.title,
        thumbnail_url: row.video.thumbnail_url,
        views: row.video.views.max(0) as u64,
        published: row.video.published,
        created_at: parse_ts(&row.video.created_at),
        like_count: row.like_count.max(0) as u64,
        comment_count: row.comment_count.max(0) as u64,
    }
}
