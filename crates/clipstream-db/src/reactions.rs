use std::collections::HashMap;

use crate::models::FeedVideoRow;
use crate::{Database, StoreResultExt, is_unique_violation, store_error};
use clipstream_types::models::TargetKind;
use clipstream_types::{Error, Result};
use rusqlite::Connection;
use tracing::debug;

/// Outcome of one toggle: the actor's new state plus the target's total,
/// recomputed independently of the actor.
#[derive(Debug)]
pub struct ToggleOutcome {
    pub now_liked: bool,
    pub total_count: u64,
}

impl Database {
    /// Flip the (kind, target, user) reaction between Absent and Present.
    ///
    /// One implementation for all three content kinds; `kind` only selects
    /// which collection the existence check runs against. The check-then-act
    /// sequence is guarded by the store's unique index: if the INSERT loses a
    /// race to a concurrent toggle, the uniqueness violation is read as
    /// "someone else inserted first" and the call flips to DELETE — exactly
    /// one retry, after which a still-conflicting store surfaces as Conflict.
    pub fn toggle_reaction(
        &self,
        id: &str,
        kind: TargetKind,
        target_id: &str,
        user_id: &str,
    ) -> Result<ToggleOutcome> {
        self.with_conn_mut(|conn| {
            if !target_exists(conn, kind, target_id)? {
                return Err(Error::not_found(format!("{kind} {target_id}")));
            }

            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM reactions
                     WHERE target_kind = ?1 AND target_id = ?2 AND user_id = ?3",
                    rusqlite::params![kind.as_str(), target_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            let now_liked = match existing {
                Some(existing_id) => {
                    // A concurrent delete having gotten there first is a
                    // no-op, not an error.
                    conn.execute("DELETE FROM reactions WHERE id = ?1", [&existing_id])
                        .store()?;
                    false
                }
                None => {
                    let inserted = conn.execute(
                        "INSERT INTO reactions (id, target_kind, target_id, user_id)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![id, kind.as_str(), target_id, user_id],
                    );
                    match inserted {
                        Ok(_) => true,
                        Err(e) if is_unique_violation(&e) => {
                            debug!("toggle lost insert race for {kind} {target_id}, flipping to delete");
                            let deleted = conn
                                .execute(
                                    "DELETE FROM reactions
                                     WHERE target_kind = ?1 AND target_id = ?2 AND user_id = ?3",
                                    rusqlite::params![kind.as_str(), target_id, user_id],
                                )
                                .store()?;
                            if deleted == 0 {
                                return Err(Error::Conflict(format!(
                                    "reaction on {kind} {target_id} changed concurrently"
                                )));
                            }
                            false
                        }
                        Err(e) => return Err(store_error(e)),
                    }
                }
            };

            let total_count = count_reactions(conn, kind, target_id)?;
            Ok(ToggleOutcome {
                now_liked,
                total_count,
            })
        })
    }

    /// All videos a user has reacted to, newest reaction first, with owner
    /// profiles. Two-phase: collect the reaction's target ids, then fetch
    /// the videos in that set. Dangling targets are skipped by the join.
    pub fn list_liked_videos(&self, user_id: &str) -> Result<Vec<FeedVideoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT target_id FROM reactions
                     WHERE user_id = ?1 AND target_kind = 'video'
                     ORDER BY created_at DESC, rowid DESC",
                )
                .store()?;
            let target_ids: Vec<String> = stmt
                .query_map([user_id], |row| row.get(0))
                .store()?
                .collect::<std::result::Result<Vec<_>, _>>()
                .store()?;

            if target_ids.is_empty() {
                return Ok(vec![]);
            }

            let placeholders: Vec<String> =
                (1..=target_ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT v.id, v.owner_id, v.title, v.description, v.video_url,
                        v.thumbnail_url, v.duration, v.views, v.created_at,
                        u.username, u.full_name, u.avatar_url
                 FROM videos v
                 LEFT JOIN users u ON v.owner_id = u.id
                 WHERE v.id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql).store()?;
            let params: Vec<&dyn rusqlite::types::ToSql> = target_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let mut by_id: HashMap<String, FeedVideoRow> = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(FeedVideoRow {
                        id: row.get(0)?,
                        owner_id: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        video_url: row.get(4)?,
                        thumbnail_url: row.get(5)?,
                        duration: row.get(6)?,
                        views: row.get(7)?,
                        created_at: row.get(8)?,
                        owner_username: row.get(9)?,
                        owner_full_name: row.get(10)?,
                        owner_avatar_url: row.get(11)?,
                    })
                })
                .store()?
                .map(|r| r.map(|v| (v.id.clone(), v)))
                .collect::<std::result::Result<HashMap<_, _>, _>>()
                .store()?;

            // Preserve reaction recency order.
            Ok(target_ids
                .into_iter()
                .filter_map(|id| by_id.remove(&id))
                .collect())
        })
    }
}

/// Existence check parameterized by the target kind discriminant.
pub(crate) fn target_exists(conn: &Connection, kind: TargetKind, id: &str) -> Result<bool> {
    let table = match kind {
        TargetKind::Video => "videos",
        TargetKind::Comment => "comments",
        TargetKind::Post => "posts",
    };
    let sql = format!("SELECT 1 FROM {table} WHERE id = ?1");
    Ok(conn
        .query_row(&sql, [id], |_| Ok(()))
        .optional()?
        .is_some())
}

pub(crate) fn count_reactions(conn: &Connection, kind: TargetKind, target_id: &str) -> Result<u64> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reactions WHERE target_kind = ?1 AND target_id = ?2",
            rusqlite::params![kind.as_str(), target_id],
            |row| row.get(0),
        )
        .store()?;
    Ok(n.max(0) as u64)
}

/// Batched per-target reaction counts for a set of ids of one kind.
/// Targets with no reactions are simply absent from the map.
pub(crate) fn count_reactions_by_target(
    conn: &Connection,
    kind: TargetKind,
    target_ids: &[String],
) -> Result<HashMap<String, i64>> {
    if target_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (2..=target_ids.len() + 1).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT target_id, COUNT(*) FROM reactions
         WHERE target_kind = ?1 AND target_id IN ({})
         GROUP BY target_id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql).store()?;
    let kind_str = kind.as_str().to_string();
    let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&kind_str];
    params.extend(
        target_ids
            .iter()
            .map(|id| id as &dyn rusqlite::types::ToSql),
    );

    stmt.query_map(params.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })
    .store()?
    .collect::<std::result::Result<HashMap<_, _>, _>>()
    .store()
}

#[cfg(test)]
mod tests {
    use crate::test_util::{db, seed_user, seed_video};
    use clipstream_types::Error;
    use clipstream_types::models::TargetKind;
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn toggle_pairing_returns_to_original_state() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let viewer = seed_user(&db, "bob");
        let vid = seed_video(&db, &owner, "Intro");

        let rid = Uuid::new_v4().to_string();
        let first = db
            .toggle_reaction(&rid, TargetKind::Video, &vid, &viewer)
            .unwrap();
        assert!(first.now_liked);
        assert_eq!(first.total_count, 1);

        let rid = Uuid::new_v4().to_string();
        let second = db
            .toggle_reaction(&rid, TargetKind::Video, &vid, &viewer)
            .unwrap();
        assert!(!second.now_liked);
        assert_eq!(second.total_count, 0);
    }

    #[test]
    fn missing_target_is_not_found() {
        let db = db();
        let viewer = seed_user(&db, "bob");
        let rid = Uuid::new_v4().to_string();
        let missing = Uuid::new_v4().to_string();

        let err = db
            .toggle_reaction(&rid, TargetKind::Video, &missing, &viewer)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn one_engine_covers_all_three_kinds() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let viewer = seed_user(&db, "bob");
        let vid = seed_video(&db, &owner, "Intro");
        let cid = Uuid::new_v4().to_string();
        db.insert_comment(&cid, &viewer, &vid, "nice").unwrap();
        let pid = Uuid::new_v4().to_string();
        db.insert_post(&pid, &owner, "announcement").unwrap();

        for (kind, target) in [
            (TargetKind::Video, vid.as_str()),
            (TargetKind::Comment, cid.as_str()),
            (TargetKind::Post, pid.as_str()),
        ] {
            let rid = Uuid::new_v4().to_string();
            let out = db.toggle_reaction(&rid, kind, target, &viewer).unwrap();
            assert!(out.now_liked);
            assert_eq!(out.total_count, 1);
        }

        // Counts are scoped per (kind, target): the same id liked as a video
        // does not bleed into other kinds.
        let rid = Uuid::new_v4().to_string();
        let out = db
            .toggle_reaction(&rid, TargetKind::Video, &vid, &owner)
            .unwrap();
        assert_eq!(out.total_count, 2);
    }

    #[test]
    fn store_enforces_at_most_one_row_per_key() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let viewer = seed_user(&db, "bob");
        let vid = seed_video(&db, &owner, "Intro");

        let rid = Uuid::new_v4().to_string();
        db.toggle_reaction(&rid, TargetKind::Video, &vid, &viewer)
            .unwrap();

        // A raw duplicate insert bypassing the engine must hit the unique
        // index, not create a second row.
        let err = db
            .with_conn(|conn| {
                use crate::StoreResultExt;
                conn.execute(
                    "INSERT INTO reactions (id, target_kind, target_id, user_id)
                     VALUES (?1, 'video', ?2, ?3)",
                    rusqlite::params![Uuid::new_v4().to_string(), vid, viewer],
                )
                .store()?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn concurrent_toggles_settle_to_zero_or_one_net_row() {
        let db = Arc::new(db());
        let owner = seed_user(&db, "alice");
        let viewer = seed_user(&db, "bob");
        let vid = seed_video(&db, &owner, "Intro");

        let n = 8;
        let mut handles = Vec::new();
        for _ in 0..n {
            let db = db.clone();
            let vid = vid.clone();
            let viewer = viewer.clone();
            handles.push(std::thread::spawn(move || {
                let rid = Uuid::new_v4().to_string();
                db.toggle_reaction(&rid, TargetKind::Video, &vid, &viewer)
                    .unwrap()
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let remaining: i64 = db
            .with_conn(|conn| {
                use crate::StoreResultExt;
                conn.query_row(
                    "SELECT COUNT(*) FROM reactions WHERE target_id = ?1",
                    [&vid],
                    |row| row.get(0),
                )
                .store()
            })
            .unwrap();
        // An even number of toggles nets zero rows, an odd number one row.
        // Either way, never more than one.
        assert_eq!(remaining, if n % 2 == 0 { 0 } else { 1 });
    }

    #[test]
    fn liked_videos_follow_reaction_recency() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let viewer = seed_user(&db, "bob");
        let v1 = seed_video(&db, &owner, "First");
        let v2 = seed_video(&db, &owner, "Second");

        for vid in [&v1, &v2] {
            let rid = Uuid::new_v4().to_string();
            db.toggle_reaction(&rid, TargetKind::Video, vid, &viewer)
                .unwrap();
        }

        let liked = db.list_liked_videos(&viewer).unwrap();
        assert_eq!(liked.len(), 2);
        assert_eq!(liked[0].id, v2);
        assert_eq!(liked[0].owner_username.as_deref(), Some("alice"));

        // Deleting a liked video leaves a dangling reaction that the join
        // skips rather than erroring on.
        db.delete_video(&v2, &owner).unwrap();
        let liked = db.list_liked_videos(&viewer).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].id, v1);
    }
}
