use axum::http::StatusCode;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use clipstream_db::models::CommentWithMetaRow;
use clipstream_types::Error;
use clipstream_types::api::{
    Claims, CommentResponse, CreateCommentRequest, PageQuery, UpdateCommentRequest,
};
use clipstream_types::models::OwnerProfile;

use crate::auth::AppState;
use crate::convert::{parse_id, parse_ts};
use crate::error::{ApiResult, join_error};

pub async fn list_video_comments(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let vid = video_id.to_string();
    let page_size = query.limit.min(100);
    let page = query.page;

    let rows = tokio::task::spawn_blocking(move || {
        state.db.list_video_comments(&vid, page, page_size)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(rows.into_iter().map(comment_response).collect()))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(Error::invalid("comment body is required").into());
    }

    let comment_id = Uuid::new_v4();
    let row = state.db.insert_comment(
        &comment_id.to_string(),
        &claims.sub.to_string(),
        &video_id.to_string(),
        body,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(comment_response(CommentWithMetaRow {
            comment: row,
            like_count: 0,
            owner_username: Some(claims.username.clone()),
            owner_full_name: None,
            owner_avatar_url: None,
        })),
    ))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(Error::invalid("comment body is required").into());
    }

    let row = state
        .db
        .update_comment(&comment_id.to_string(), &claims.sub.to_string(), body)?;

    Ok(Json(comment_response(CommentWithMetaRow {
        comment: row,
        like_count: 0,
        owner_username: Some(claims.username.clone()),
        owner_full_name: None,
        owner_avatar_url: None,
    })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    state
        .db
        .delete_comment(&comment_id.to_string(), &claims.sub.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

fn comment_response(row: CommentWithMetaRow) -> CommentResponse {
    CommentResponse {
        id: parse_id(&row.comment.id),
        video_id: parse_id(&row.comment.video_id),
        body: row.comment.body,
        like_count: row.like_count.max(0) as u64,
        created_at: parse_ts(&row.comment.created_at),
        owner: OwnerProfile {
            username: row.owner_username.unwrap_or_default(),
            full_name: row.owner_full_name.unwrap_or_default(),
            avatar_url: row.owner_avatar_url.unwrap_or_default(),
        },
    }
}
