use axum::http::StatusCode;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use clipstream_db::models::PostWithMetaRow;
use clipstream_types::Error;
use clipstream_types::api::{Claims, CreatePostRequest, PostResponse, UpdatePostRequest};

use crate::auth::AppState;
use crate::convert::{parse_id, parse_ts};
use crate::error::ApiResult;

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(Error::invalid("post body is required").into());
    }

    let post_id = Uuid::new_v4();
    let row = state
        .db
        .insert_post(&post_id.to_string(), &claims.sub.to_string(), body)?;

    Ok((
        StatusCode::CREATED,
        Json(post_response(PostWithMetaRow {
            post: row,
            like_count: 0,
        })),
    ))
}

pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PostResponse>>> {
    let rows = state.db.list_user_posts(&user_id.to_string())?;
    Ok(Json(rows.into_iter().map(post_response).collect()))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<PostResponse>> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(Error::invalid("post body is required").into());
    }

    let row = state
        .db
        .update_post(&post_id.to_string(), &claims.sub.to_string(), body)?;

    Ok(Json(post_response(PostWithMetaRow {
        post: row,
        like_count: 0,
    })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    state
        .db
        .delete_post(&post_id.to_string(), &claims.sub.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

fn post_response(row: PostWithMetaRow) -> PostResponse {
    PostResponse {
        id: parse_id(&row.post.id),
        owner_id: parse_id(&row.post.owner_id),
        body: row.post.body,
        like_count: row.like_count.max(0) as u64,
        created_at: parse_ts(&row.post.created_at),
    }
}
