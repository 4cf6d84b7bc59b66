use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use clipstream_db::models::SubscriptionEntryRow;
use clipstream_types::api::{Claims, SubscriptionEntry, ToggleSubscriptionResponse};
use clipstream_types::models::OwnerProfile;

use crate::auth::AppState;
use crate::convert::{parse_id, parse_ts};
use crate::error::{ApiResult, join_error};

pub async fn toggle_subscription(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<ToggleSubscriptionResponse>> {
    let subscription_id = Uuid::new_v4();
    let outcome = tokio::task::spawn_blocking(move || {
        state.db.toggle_subscription(
            &subscription_id.to_string(),
            &claims.sub.to_string(),
            &channel_id.to_string(),
        )
    })
    .await
    .map_err(join_error)??;

    Ok(Json(ToggleSubscriptionResponse {
        subscribed: outcome.subscribed,
        subscriber_count: outcome.subscriber_count,
    }))
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SubscriptionEntry>>> {
    let rows = state.db.channel_subscribers(&channel_id.to_string())?;
    Ok(Json(rows.into_iter().map(subscription_entry).collect()))
}

pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SubscriptionEntry>>> {
    let rows = state.db.subscribed_channels(&user_id.to_string())?;
    Ok(Json(rows.into_iter().map(subscription_entry).collect()))
}

fn subscription_entry(row: SubscriptionEntryRow) -> SubscriptionEntry {
    SubscriptionEntry {
        user_id: parse_id(&row.user_id),
        profile: OwnerProfile {
            username: row.username,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
        },
        since: parse_ts(&row.created_at),
    }
}
