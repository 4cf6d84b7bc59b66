use crate::StoreResultExt;
use clipstream_types::Result;
use rusqlite::Connection;
use tracing::info;

/// Foreign keys point only at `users` (owner back-references). Polymorphic
/// `reactions.target_id`, `comments.video_id` and `playlist_videos.video_id`
/// are soft references: deleting the target leaves dangling rows that joins
/// simply miss.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            full_name   TEXT NOT NULL,
            avatar_url  TEXT NOT NULL DEFAULT '',
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS videos (
            id              TEXT PRIMARY KEY,
            owner_id        TEXT NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL,
            description     TEXT NOT NULL DEFAULT '',
            video_url       TEXT NOT NULL,
            thumbnail_url   TEXT NOT NULL,
            duration        REAL NOT NULL DEFAULT 0,
            views           INTEGER NOT NULL DEFAULT 0,
            published       INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_videos_owner
            ON videos(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            video_id    TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_video
            ON comments(video_id, created_at);

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_owner
            ON posts(owner_id, created_at);

        -- The unique index is the correctness guarantee for reaction
        -- toggling: at most one row per (kind, target, user) key, enforced
        -- by the store itself rather than by application reads.
        CREATE TABLE IF NOT EXISTS reactions (
            id          TEXT PRIMARY KEY,
            target_kind TEXT NOT NULL CHECK (target_kind IN ('video','comment','post')),
            target_id   TEXT NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(target_kind, target_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_target
            ON reactions(target_kind, target_id);

        CREATE INDEX IF NOT EXISTS idx_reactions_user
            ON reactions(user_id);

        CREATE TABLE IF NOT EXISTS subscriptions (
            id              TEXT PRIMARY KEY,
            subscriber_id   TEXT NOT NULL REFERENCES users(id),
            channel_id      TEXT NOT NULL REFERENCES users(id),
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(subscriber_id, channel_id)
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_channel
            ON subscriptions(channel_id);

        CREATE TABLE IF NOT EXISTS playlists (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS playlist_videos (
            playlist_id TEXT NOT NULL REFERENCES playlists(id),
            video_id    TEXT NOT NULL,
            position    INTEGER NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(playlist_id, video_id)
        );
        ",
    )
    .store()?;

    info!("Database migrations complete");
    Ok(())
}
