use crate::models::{ChannelStatsRow, ChannelVideoRow, VideoRow};
use crate::reactions::count_reactions_by_target;
use crate::{Database, StoreResultExt};
use clipstream_types::models::TargetKind;
use clipstream_types::{Error, Result};
use rusqlite::Connection;

impl Database {
    /// Derived per-channel dashboard numbers, computed fresh on every call
    /// from current store contents. The sub-steps commit independently, so a
    /// concurrent mutation between them can skew the snapshot by one
    /// increment; dashboard reads tolerate that.
    pub fn channel_stats(&self, channel_id: &str) -> Result<ChannelStatsRow> {
        self.with_conn(|conn| {
            let (username, full_name, avatar_url) = conn
                .query_row(
                    "SELECT username, full_name, avatar_url FROM users WHERE id = ?1",
                    [channel_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?
                .ok_or_else(|| Error::not_found(format!("channel {channel_id}")))?;

            let (total_views, total_videos): (i64, i64) = conn
                .query_row(
                    "SELECT COALESCE(SUM(views), 0), COUNT(*) FROM videos WHERE owner_id = ?1",
                    [channel_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .store()?;

            // Two-phase join: reactions carry no owner column, so first
            // collect the channel's video ids, then count reactions against
            // that id set.
            let video_ids = owned_video_ids(conn, channel_id)?;
            let total_likes: i64 = count_reactions_by_target(conn, TargetKind::Video, &video_ids)?
                .values()
                .sum();

            // "Who follows me" and "who do I follow" are different
            // questions; two independent counts over the same table.
            let total_subscribers =
                count_where(conn, "subscriptions", "channel_id = ?1", channel_id)?;
            let total_subscribed_to =
                count_where(conn, "subscriptions", "subscriber_id = ?1", channel_id)?;

            let comment_count = count_where(conn, "comments", "owner_id = ?1", channel_id)?;
            let post_count = count_where(conn, "posts", "owner_id = ?1", channel_id)?;

            Ok(ChannelStatsRow {
                username,
                full_name,
                avatar_url,
                total_views,
                total_videos,
                total_likes,
                total_subscribers,
                total_subscribed_to,
                comment_count,
                post_count,
            })
        })
    }

    /// The channel's uploads with per-video like and comment counts, batched
    /// over the listed ids rather than queried per row.
    pub fn channel_videos(&self, channel_id: &str) -> Result<Vec<ChannelVideoRow>> {
        self.with_conn(|conn| {
            if conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [channel_id], |_| Ok(()))
                .optional()?
                .is_none()
            {
                return Err(Error::not_found(format!("channel {channel_id}")));
            }

            let mut stmt = conn
                .prepare(
                    "SELECT id, owner_id, title, description, video_url, thumbnail_url,
                            duration, views, published, created_at
                     FROM videos WHERE owner_id = ?1
                     ORDER BY created_at DESC, rowid DESC",
                )
                .store()?;
            let videos: Vec<VideoRow> = stmt
                .query_map([channel_id], |row| {
                    Ok(VideoRow {
                        id: row.get(0)?,
                        owner_id: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        video_url: row.get(4)?,
                        thumbnail_url: row.get(5)?,
                        duration: row.get(6)?,
                        views: row.get(7)?,
                        published: row.get(8)?,
                        created_at: row.get(9)?,
                    })
                })
                .store()?
                .collect::<std::result::Result<Vec<_>, _>>()
                .store()?;

            let ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
            let likes = count_reactions_by_target(conn, TargetKind::Video, &ids)?;
            let comments = count_comments_by_video(conn, &ids)?;

            Ok(videos
                .into_iter()
                .map(|video| {
                    let like_count = likes.get(&video.id).copied().unwrap_or(0);
                    let comment_count = comments.get(&video.id).copied().unwrap_or(0);
                    ChannelVideoRow {
                        video,
                        like_count,
                        comment_count,
                    }
                })
                .collect())
        })
    }
}

fn owned_video_ids(conn: &Connection, owner_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT id FROM videos WHERE owner_id = ?1")
        .store()?;
    stmt.query_map([owner_id], |row| row.get(0))
        .store()?
        .collect::<std::result::Result<Vec<_>, _>>()
        .store()
}

fn count_where(conn: &Connection, table: &str, filter: &str, value: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {filter}");
    conn.query_row(&sql, [value], |row| row.get(0)).store()
}

fn count_comments_by_video(
    conn: &Connection,
    video_ids: &[String],
) -> Result<std::collections::HashMap<String, i64>> {
    if video_ids.is_empty() {
        return Ok(Default::default());
    }
    let placeholders: Vec<String> = (1..=video_ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT video_id, COUNT(*) FROM comments
         WHERE video_id IN ({})
         GROUP BY video_id",
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql).store()?;
    let params: Vec<&dyn rusqlite::types::ToSql> = video_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();
    stmt.query_map(params.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })
    .store()?
    .collect::<std::result::Result<std::collections::HashMap<_, _>, _>>()
    .store()
}

#[cfg(test)]
mod tests {
    use crate::test_util::{db, seed_user, seed_video};
    use clipstream_types::Error;
    use clipstream_types::models::TargetKind;
    use uuid::Uuid;

    #[test]
    fn zero_data_channel_is_all_zeros() {
        let db = db();
        let channel = seed_user(&db, "newbie");

        let stats = db.channel_stats(&channel).unwrap();
        assert_eq!(stats.username, "newbie");
        assert_eq!(stats.total_views, 0);
        assert_eq!(stats.total_videos, 0);
        assert_eq!(stats.total_likes, 0);
        assert_eq!(stats.total_subscribers, 0);
        assert_eq!(stats.total_subscribed_to, 0);
        assert_eq!(stats.comment_count, 0);
        assert_eq!(stats.post_count, 0);
    }

    #[test]
    fn unknown_channel_is_not_found() {
        let db = db();
        let missing = Uuid::new_v4().to_string();
        assert!(matches!(
            db.channel_stats(&missing).unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            db.channel_videos(&missing).unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn stats_aggregate_across_collections() {
        let db = db();
        let channel = seed_user(&db, "creator");
        let fan_a = seed_user(&db, "fan_a");
        let fan_b = seed_user(&db, "fan_b");

        let v1 = seed_video(&db, &channel, "One");
        let v2 = seed_video(&db, &channel, "Two");
        db.with_conn(|conn| {
            use crate::StoreResultExt;
            conn.execute("UPDATE videos SET views = 10 WHERE id = ?1", [&v1])
                .store()?;
            conn.execute("UPDATE videos SET views = 5 WHERE id = ?1", [&v2])
                .store()?;
            Ok(())
        })
        .unwrap();

        // Likes on the channel's videos, plus one like by the channel on
        // someone else's post — only the former counts toward total_likes.
        for (fan, vid) in [(&fan_a, &v1), (&fan_b, &v1), (&fan_a, &v2)] {
            let rid = Uuid::new_v4().to_string();
            db.toggle_reaction(&rid, TargetKind::Video, vid, fan).unwrap();
        }
        let pid = Uuid::new_v4().to_string();
        db.insert_post(&pid, &fan_a, "fan post").unwrap();
        let rid = Uuid::new_v4().to_string();
        db.toggle_reaction(&rid, TargetKind::Post, &pid, &channel)
            .unwrap();

        for fan in [&fan_a, &fan_b] {
            let sid = Uuid::new_v4().to_string();
            db.toggle_subscription(&sid, fan, &channel).unwrap();
        }
        let sid = Uuid::new_v4().to_string();
        db.toggle_subscription(&sid, &channel, &fan_a).unwrap();

        let cid = Uuid::new_v4().to_string();
        db.insert_comment(&cid, &channel, &v1, "thanks all").unwrap();
        let pid = Uuid::new_v4().to_string();
        db.insert_post(&pid, &channel, "channel news").unwrap();

        let stats = db.channel_stats(&channel).unwrap();
        assert_eq!(stats.total_views, 15);
        assert_eq!(stats.total_videos, 2);
        assert_eq!(stats.total_likes, 3);
        assert_eq!(stats.total_subscribers, 2);
        assert_eq!(stats.total_subscribed_to, 1);
        assert_eq!(stats.comment_count, 1);
        assert_eq!(stats.post_count, 1);
    }

    #[test]
    fn channel_videos_carry_per_item_counts() {
        let db = db();
        let channel = seed_user(&db, "creator");
        let fan = seed_user(&db, "fan");
        let v1 = seed_video(&db, &channel, "One");
        let v2 = seed_video(&db, &channel, "Two");

        let rid = Uuid::new_v4().to_string();
        db.toggle_reaction(&rid, TargetKind::Video, &v1, &fan).unwrap();
        let cid = Uuid::new_v4().to_string();
        db.insert_comment(&cid, &fan, &v1, "great").unwrap();

        let listed = db.channel_videos(&channel).unwrap();
        assert_eq!(listed.len(), 2);
        let one = listed.iter().find(|r| r.video.id == v1).unwrap();
        assert_eq!(one.like_count, 1);
        assert_eq!(one.comment_count, 1);
        let two = listed.iter().find(|r| r.video.id == v2).unwrap();
        assert_eq!(two.like_count, 0);
        assert_eq!(two.comment_count, 0);
    }

    #[test]
    fn scenario_toggle_pair_leaves_stats_clean() {
        let db = db();
        let a = seed_user(&db, "user_a");
        let b = seed_user(&db, "user_b");
        let v = seed_video(&db, &a, "V");

        let rid = Uuid::new_v4().to_string();
        let first = db.toggle_reaction(&rid, TargetKind::Video, &v, &b).unwrap();
        assert!(first.now_liked);
        assert_eq!(first.total_count, 1);

        let rid = Uuid::new_v4().to_string();
        let second = db.toggle_reaction(&rid, TargetKind::Video, &v, &b).unwrap();
        assert!(!second.now_liked);
        assert_eq!(second.total_count, 0);

        assert_eq!(db.channel_stats(&a).unwrap().total_likes, 0);
    }
}
