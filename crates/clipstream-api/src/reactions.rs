use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use clipstream_types::api::{Claims, ToggleReactionResponse, VideoSummary};
use clipstream_types::models::TargetKind;

use crate::auth::AppState;
use crate::convert::video_summary;
use crate::error::{ApiResult, join_error};

/// One route per content kind, all dispatching into the single toggle
/// engine; the path segment only picks the discriminant.
pub async fn toggle_video_reaction(
    state: State<AppState>,
    path: Path<Uuid>,
    claims: Extension<Claims>,
) -> ApiResult<Json<ToggleReactionResponse>> {
    toggle(state, TargetKind::Video, path.0, claims.0).await
}

pub async fn toggle_comment_reaction(
    state: State<AppState>,
    path: Path<Uuid>,
    claims: Extension<Claims>,
) -> ApiResult<Json<ToggleReactionResponse>> {
    toggle(state, TargetKind::Comment, path.0, claims.0).await
}

pub async fn toggle_post_reaction(
    state: State<AppState>,
    path: Path<Uuid>,
    claims: Extension<Claims>,
) -> ApiResult<Json<ToggleReactionResponse>> {
    toggle(state, TargetKind::Post, path.0, claims.0).await
}

async fn toggle(
    State(state): State<AppState>,
    kind: TargetKind,
    target_id: Uuid,
    claims: Claims,
) -> ApiResult<Json<ToggleReactionResponse>> {
    let reaction_id = Uuid::new_v4();
    let outcome = tokio::task::spawn_blocking(move || {
        state.db.toggle_reaction(
            &reaction_id.to_string(),
            kind,
            &target_id.to_string(),
            &claims.sub.to_string(),
        )
    })
    .await
    .map_err(join_error)??;

    Ok(Json(ToggleReactionResponse {
        now_liked: outcome.now_liked,
        total_count: outcome.total_count,
    }))
}

pub async fn list_liked_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<VideoSummary>>> {
    let rows = state.db.list_liked_videos(&claims.sub.to_string())?;
    Ok(Json(rows.into_iter().map(video_summary).collect()))
}
