use chrono::{DateTime, Utc};
use clipstream_db::models::{FeedVideoRow, VideoRow};
use clipstream_types::api::{VideoResponse, VideoSummary};
use clipstream_types::models::OwnerProfile;
use tracing::warn;
use uuid::Uuid;

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; a corrupt value is logged and replaced
/// with the epoch rather than failing the whole response.
pub(crate) fn parse_ts(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{raw}': {e}");
            DateTime::default()
        })
}

pub(crate) fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{raw}': {e}");
        Uuid::default()
    })
}

pub(crate) fn video_response(row: VideoRow) -> VideoResponse {
    VideoResponse {
        id: parse_id(&row.id),
        owner_id: parse_id(&row.owner_id),
        title: row.title,
        description: row.description,
        video_url: row.video_url,
        thumbnail_url: row.thumbnail_url,
        duration: row.duration,
        views: row.views.max(0) as u64,
        published: row.published,
        created_at: parse_ts(&row.created_at),
    }
}

/// A missed owner join leaves the profile fields empty; the summary is
/// still returned.
pub(crate) fn video_summary(row: FeedVideoRow) -> VideoSummary {
    VideoSummary {
        id: parse_id(&row.id),
        title: row.title,
        description: row.description,
        video_url: row.video_url,
        thumbnail_url: row.thumbnail_url,
        duration: row.duration,
        views: row.views.max(0) as u64,
        created_at: parse_ts(&row.created_at),
        owner: OwnerProfile {
            username: row.owner_username.unwrap_or_default(),
            full_name: row.owner_full_name.unwrap_or_default(),
            avatar_url: row.owner_avatar_url.unwrap_or_default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::parse_ts;

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let sqlite = parse_ts("2026-08-26 10:30:00");
        assert_eq!(sqlite.to_rfc3339(), "2026-08-26T10:30:00+00:00");

        let rfc = parse_ts("2026-08-26T10:30:00Z");
        assert_eq!(rfc, sqlite);
    }

    #[test]
    fn corrupt_timestamp_degrades_to_epoch() {
        assert_eq!(parse_ts("not a date").timestamp(), 0);
    }
}
