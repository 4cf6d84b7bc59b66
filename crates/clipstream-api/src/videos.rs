use axum::http::StatusCode;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use clipstream_db::feed::FeedParams;
use clipstream_types::Error;
use clipstream_types::api::{
    Claims, FeedQuery, PublishVideoRequest, UpdateVideoRequest, VideoResponse, VideoSummary,
};

use crate::auth::AppState;
use crate::convert::{video_response, video_summary};
use crate::error::{ApiResult, join_error};

/// The content feed: text filter, owner filter, allow-listed sort, offset
/// pagination. Query composition lives in the db crate; this handler only
/// shapes parameters and rows.
pub async fn list_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Json<Vec<VideoSummary>>> {
    let params = FeedParams {
        search_text: query.q,
        sort_by: query.sort_by,
        sort_dir: query.sort_type,
        page: query.page,
        page_size: query.limit.min(100),
        owner_id: query.user_id.map(|u| u.to_string()),
    };

    let rows = tokio::task::spawn_blocking(move || state.db.list_videos(&params))
        .await
        .map_err(join_error)??;

    Ok(Json(rows.into_iter().map(video_summary).collect()))
}

pub async fn publish_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PublishVideoRequest>,
) -> ApiResult<(StatusCode, Json<VideoResponse>)> {
    if req.title.trim().is_empty() {
        return Err(Error::invalid("title is required").into());
    }
    if req.video_url.is_empty() || req.thumbnail_url.is_empty() {
        return Err(Error::invalid("video_url and thumbnail_url are required").into());
    }

    let video_id = Uuid::new_v4();
    state.db.insert_video(
        &video_id.to_string(),
        &claims.sub.to_string(),
        req.title.trim(),
        &req.description,
        &req.video_url,
        &req.thumbnail_url,
        req.duration,
    )?;

    let row = state
        .db
        .get_video(&video_id.to_string())?
        .ok_or_else(|| Error::not_found(format!("video {video_id}")))?;

    Ok((StatusCode::CREATED, Json(video_response(row))))
}

/// Fetching a video records a view; the returned counter includes it.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<Json<VideoResponse>> {
    let id = video_id.to_string();
    state
        .db
        .get_video(&id)?
        .ok_or_else(|| Error::not_found(format!("video {video_id}")))?;
    state.db.increment_video_views(&id)?;

    let row = state
        .db
        .get_video(&id)?
        .ok_or_else(|| Error::not_found(format!("video {video_id}")))?;
    Ok(Json(video_response(row)))
}

pub async fn update_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateVideoRequest>,
) -> ApiResult<Json<VideoResponse>> {
    if req.title.is_none() && req.description.is_none() && req.thumbnail_url.is_none() {
        return Err(Error::invalid("at least one field is required").into());
    }

    let row = state.db.update_video(
        &video_id.to_string(),
        &claims.sub.to_string(),
        req.title.as_deref(),
        req.description.as_deref(),
        req.thumbnail_url.as_deref(),
    )?;

    Ok(Json(video_response(row)))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    state
        .db
        .delete_video(&video_id.to_string(), &claims.sub.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<serde_json::Value>> {
    let published = state
        .db
        .toggle_video_published(&video_id.to_string(), &claims.sub.to_string())?;
    Ok(Json(serde_json::json!({ "published": published })))
}
