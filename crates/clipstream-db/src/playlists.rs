use crate::models::{FeedVideoRow, PlaylistRow};
use crate::queries::query_video;
use crate::{Database, StoreResultExt, is_unique_violation, store_error};
use clipstream_types::{Error, Result};
use rusqlite::Connection;

impl Database {
    pub fn create_playlist(
        &self,
        id: &str,
        owner_id: &str,
        name: &str,
        description: &str,
    ) -> Result<PlaylistRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO playlists (id, owner_id, name, description) VALUES (?1, ?2, ?3, ?4)",
                (id, owner_id, name, description),
            )
            .store()?;
            query_playlist(conn, id)?.ok_or_else(|| Error::not_found(format!("playlist {id}")))
        })
    }

    pub fn get_playlist(&self, id: &str) -> Result<Option<PlaylistRow>> {
        self.with_conn(|conn| query_playlist(conn, id))
    }

    pub fn user_playlists(&self, owner_id: &str) -> Result<Vec<PlaylistRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, owner_id, name, description, created_at
                     FROM playlists WHERE owner_id = ?1
                     ORDER BY created_at DESC, rowid DESC",
                )
                .store()?;
            stmt.query_map([owner_id], playlist_from_row)
                .store()?
                .collect::<std::result::Result<Vec<_>, _>>()
                .store()
        })
    }

    /// The playlist's videos in insertion order, with owner profiles.
    /// Dangling entries (video deleted since it was added) are skipped by
    /// the join rather than surfaced as errors.
    pub fn playlist_videos(&self, playlist_id: &str) -> Result<Vec<FeedVideoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT v.id, v.owner_id, v.title, v.description, v.video_url,
                            v.thumbnail_url, v.duration, v.views, v.created_at,
                            u.username, u.full_name, u.avatar_url
                     FROM playlist_videos pv
                     JOIN videos v ON pv.video_id = v.id
                     LEFT JOIN users u ON v.owner_id = u.id
                     WHERE pv.playlist_id = ?1
                     ORDER BY pv.position ASC",
                )
                .store()?;
            stmt.query_map([playlist_id], |row| {
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
            .collect::<std::result::Result<Vec<_>, _>>()
            .store()
        })
    }

    pub fn update_playlist(
        &self,
        id: &str,
        owner_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<PlaylistRow> {
        self.with_conn_mut(|conn| {
            let changed = conn
                .execute(
                    "UPDATE playlists SET
                        name = COALESCE(?3, name),
                        description = COALESCE(?4, description)
                     WHERE id = ?1 AND owner_id = ?2",
                    rusqlite::params![id, owner_id, name, description],
                )
                .store()?;
            if changed == 0 {
                return Err(Error::not_found(format!("playlist {id}")));
            }
            query_playlist(conn, id)?.ok_or_else(|| Error::not_found(format!("playlist {id}")))
        })
    }

    pub fn delete_playlist(&self, id: &str, owner_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM playlists WHERE id = ?1 AND owner_id = ?2",
                    (id, owner_id),
                )
                .store()?;
            if deleted == 0 {
                return Err(Error::not_found(format!("playlist {id}")));
            }
            conn.execute(
                "DELETE FROM playlist_videos WHERE playlist_id = ?1",
                [id],
            )
            .store()?;
            Ok(())
        })
    }

    /// Append a video to the owner's playlist. Adding the same video twice
    /// hits the unique index and surfaces as Conflict.
    pub fn add_video_to_playlist(
        &self,
        playlist_id: &str,
        owner_id: &str,
        video_id: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let owned: Option<()> = conn
                .query_row(
                    "SELECT 1 FROM playlists WHERE id = ?1 AND owner_id = ?2",
                    (playlist_id, owner_id),
                    |_| Ok(()),
                )
                .optional()?;
            if owned.is_none() {
                return Err(Error::not_found(format!("playlist {playlist_id}")));
            }
            if query_video(conn, video_id)?.is_none() {
                return Err(Error::not_found(format!("video {video_id}")));
            }

            let inserted = conn.execute(
                "INSERT INTO playlist_videos (playlist_id, video_id, position)
                 SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1
                 FROM playlist_videos WHERE playlist_id = ?1",
                (playlist_id, video_id),
            );
            match inserted {
                Ok(_) => Ok(()),
                Err(e) if is_unique_violation(&e) => Err(Error::Conflict(format!(
                    "video {video_id} already in playlist"
                ))),
                Err(e) => Err(store_error(e)),
            }
        })
    }

    pub fn remove_video_from_playlist(
        &self,
        playlist_id: &str,
        owner_id: &str,
        video_id: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM playlist_videos
                     WHERE playlist_id = ?1 AND video_id = ?2
                       AND playlist_id IN (SELECT id FROM playlists WHERE owner_id = ?3)",
                    (playlist_id, video_id, owner_id),
                )
                .store()?;
            if deleted == 0 {
                return Err(Error::not_found(format!(
                    "video {video_id} in playlist {playlist_id}"
                )));
            }
            Ok(())
        })
    }
}

fn playlist_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlaylistRow> {
    Ok(PlaylistRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_playlist(conn: &Connection, id: &str) -> Result<Option<PlaylistRow>> {
    conn.query_row(
        "SELECT id, owner_id, name, description, created_at FROM playlists WHERE id = ?1",
        [id],
        playlist_from_row,
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use crate::test_util::{db, seed_user, seed_video};
    use clipstream_types::Error;
    use uuid::Uuid;

    #[test]
    fn playlist_lifecycle() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let pid = Uuid::new_v4().to_string();

        db.create_playlist(&pid, &owner, "Favorites", "the good stuff")
            .unwrap();
        let listed = db.user_playlists(&owner).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Favorites");

        let updated = db
            .update_playlist(&pid, &owner, Some("Top picks"), None)
            .unwrap();
        assert_eq!(updated.name, "Top picks");
        assert_eq!(updated.description, "the good stuff");

        db.delete_playlist(&pid, &owner).unwrap();
        assert!(db.get_playlist(&pid).unwrap().is_none());
    }

    #[test]
    fn videos_keep_insertion_order_and_skip_dangling() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let pid = Uuid::new_v4().to_string();
        db.create_playlist(&pid, &owner, "Watch later", "").unwrap();

        let v1 = seed_video(&db, &owner, "First");
        let v2 = seed_video(&db, &owner, "Second");
        db.add_video_to_playlist(&pid, &owner, &v1).unwrap();
        db.add_video_to_playlist(&pid, &owner, &v2).unwrap();

        let videos = db.playlist_videos(&pid).unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, v1);
        assert_eq!(videos[1].id, v2);

        db.delete_video(&v1, &owner).unwrap();
        let videos = db.playlist_videos(&pid).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, v2);
    }

    #[test]
    fn duplicate_add_is_conflict() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let pid = Uuid::new_v4().to_string();
        db.create_playlist(&pid, &owner, "Watch later", "").unwrap();
        let vid = seed_video(&db, &owner, "Only once");

        db.add_video_to_playlist(&pid, &owner, &vid).unwrap();
        assert!(matches!(
            db.add_video_to_playlist(&pid, &owner, &vid).unwrap_err(),
            Error::Conflict(_)
        ));
    }

    #[test]
    fn non_owner_mutations_are_not_found() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let other = seed_user(&db, "bob");
        let pid = Uuid::new_v4().to_string();
        db.create_playlist(&pid, &owner, "Private", "").unwrap();
        let vid = seed_video(&db, &owner, "Clip");

        assert!(matches!(
            db.add_video_to_playlist(&pid, &other, &vid).unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            db.delete_playlist(&pid, &other).unwrap_err(),
            Error::NotFound(_)
        ));

        db.add_video_to_playlist(&pid, &owner, &vid).unwrap();
        assert!(matches!(
            db.remove_video_from_playlist(&pid, &other, &vid).unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
