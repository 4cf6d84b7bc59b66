use axum::http::StatusCode;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use clipstream_db::models::PlaylistRow;
use clipstream_types::Error;
use clipstream_types::api::{
    Claims, CreatePlaylistRequest, PlaylistDetailResponse, PlaylistResponse, UpdatePlaylistRequest,
};

use crate::auth::AppState;
use crate::convert::{parse_id, parse_ts, video_summary};
use crate::error::ApiResult;

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePlaylistRequest>,
) -> ApiResult<(StatusCode, Json<PlaylistResponse>)> {
    if req.name.trim().is_empty() || req.description.trim().is_empty() {
        return Err(Error::invalid("name and description are required").into());
    }

    let playlist_id = Uuid::new_v4();
    let row = state.db.create_playlist(
        &playlist_id.to_string(),
        &claims.sub.to_string(),
        req.name.trim(),
        req.description.trim(),
    )?;

    Ok((StatusCode::CREATED, Json(playlist_response(row))))
}

pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PlaylistResponse>>> {
    let rows = state.db.user_playlists(&user_id.to_string())?;
    Ok(Json(rows.into_iter().map(playlist_response).collect()))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
) -> ApiResult<Json<PlaylistDetailResponse>> {
    let id = playlist_id.to_string();
    let row = state
        .db
        .get_playlist(&id)?
        .ok_or_else(|| Error::not_found(format!("playlist {playlist_id}")))?;
    let videos = state.db.playlist_videos(&id)?;

    Ok(Json(PlaylistDetailResponse {
        id: parse_id(&row.id),
        owner_id: parse_id(&row.owner_id),
        name: row.name,
        description: row.description,
        created_at: parse_ts(&row.created_at),
        videos: videos.into_iter().map(video_summary).collect(),
    }))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> ApiResult<Json<PlaylistResponse>> {
    if req.name.is_none() && req.description.is_none() {
        return Err(Error::invalid("at least one field is required").into());
    }

    let row = state.db.update_playlist(
        &playlist_id.to_string(),
        &claims.sub.to_string(),
        req.name.as_deref(),
        req.description.as_deref(),
    )?;

    Ok(Json(playlist_response(row)))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    state
        .db
        .delete_playlist(&playlist_id.to_string(), &claims.sub.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_playlist_video(
    State(state): State<AppState>,
    Path((playlist_id, video_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    state.db.add_video_to_playlist(
        &playlist_id.to_string(),
        &claims.sub.to_string(),
        &video_id.to_string(),
    )?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_playlist_video(
    State(state): State<AppState>,
    Path((playlist_id, video_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    state.db.remove_video_from_playlist(
        &playlist_id.to_string(),
        &claims.sub.to_string(),
        &video_id.to_string(),
    )?;
    Ok(StatusCode::NO_CONTENT)
}

fn playlist_response(row: PlaylistRow) -> PlaylistResponse {
    PlaylistResponse {
        id: parse_id(&row.id),
        owner_id: parse_id(&row.owner_id),
        name: row.name,
        description: row.description,
        created_at: parse_ts(&row.created_at),
    }
}
