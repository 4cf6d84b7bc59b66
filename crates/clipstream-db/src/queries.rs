use crate::models::{CommentRow, CommentWithMetaRow, PostRow, PostWithMetaRow, UserRow, VideoRow};
use crate::{Database, StoreResultExt};
use clipstream_types::models::TargetKind;
use clipstream_types::{Error, Result};
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        full_name: &str,
        avatar_url: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, full_name, avatar_url, password)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, full_name, avatar_url, password_hash),
            )
            .store()?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    // -- Videos --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_video(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        description: &str,
        video_url: &str,
        thumbnail_url: &str,
        duration: f64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO videos (id, owner_id, title, description, video_url, thumbnail_url, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, owner_id, title, description, video_url, thumbnail_url, duration],
            )
            .store()?;
            Ok(())
        })
    }

    pub fn get_video(&self, id: &str) -> Result<Option<VideoRow>> {
        self.with_conn(|conn| query_video(conn, id))
    }

    /// Partial update restricted to the owner. Untouched fields keep their
    /// stored value via COALESCE. Zero rows affected means the video does
    /// not exist or belongs to someone else; both surface as NotFound.
    pub fn update_video(
        &self,
        id: &str,
        owner_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<VideoRow> {
        self.with_conn_mut(|conn| {
            let changed = conn
                .execute(
                    "UPDATE videos SET
                        title = COALESCE(?3, title),
                        description = COALESCE(?4, description),
                        thumbnail_url = COALESCE(?5, thumbnail_url)
                     WHERE id = ?1 AND owner_id = ?2",
                    rusqlite::params![id, owner_id, title, description, thumbnail_url],
                )
                .store()?;
            if changed == 0 {
                return Err(Error::not_found(format!("video {id}")));
            }
            query_video(conn, id)?.ok_or_else(|| Error::not_found(format!("video {id}")))
        })
    }

    pub fn delete_video(&self, id: &str, owner_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM videos WHERE id = ?1 AND owner_id = ?2",
                    (id, owner_id),
                )
                .store()?;
            if deleted == 0 {
                return Err(Error::not_found(format!("video {id}")));
            }
            Ok(())
        })
    }

    /// Flip the publish flag; returns the new state.
    pub fn toggle_video_published(&self, id: &str, owner_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn
                .execute(
                    "UPDATE videos SET published = 1 - published
                     WHERE id = ?1 AND owner_id = ?2",
                    (id, owner_id),
                )
                .store()?;
            if changed == 0 {
                return Err(Error::not_found(format!("video {id}")));
            }
            conn.query_row("SELECT published FROM videos WHERE id = ?1", [id], |row| {
                row.get::<_, bool>(0)
            })
            .store()
        })
    }

    pub fn increment_video_views(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("UPDATE videos SET views = views + 1 WHERE id = ?1", [id])
                .store()?;
            Ok(())
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        owner_id: &str,
        video_id: &str,
        body: &str,
    ) -> Result<CommentRow> {
        self.with_conn_mut(|conn| {
            if query_video(conn, video_id)?.is_none() {
                return Err(Error::not_found(format!("video {video_id}")));
            }
            conn.execute(
                "INSERT INTO comments (id, owner_id, video_id, body) VALUES (?1, ?2, ?3, ?4)",
                (id, owner_id, video_id, body),
            )
            .store()?;
            query_comment(conn, id)?.ok_or_else(|| Error::not_found(format!("comment {id}")))
        })
    }

    /// Per-video comment page with owner profiles and per-comment like
    /// counts (two-phase: page of comments first, then one batched reaction
    /// count over the page's ids).
    pub fn list_video_comments(
        &self,
        video_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<CommentWithMetaRow>> {
        if page < 1 || page_size < 1 {
            return Err(Error::invalid("page and page size must be >= 1"));
        }
        self.with_conn(|conn| {
            let offset = (page as i64 - 1) * page_size as i64;
            let mut stmt = conn
                .prepare(
                    "SELECT c.id, c.owner_id, c.video_id, c.body, c.created_at,
                            u.username, u.full_name, u.avatar_url
                     FROM comments c
                     LEFT JOIN users u ON c.owner_id = u.id
                     WHERE c.video_id = ?1
                     ORDER BY c.created_at DESC, c.rowid DESC
                     LIMIT ?2 OFFSET ?3",
                )
                .store()?;

            let rows = stmt
                .query_map(rusqlite::params![video_id, page_size, offset], |row| {
                    Ok(CommentWithMetaRow {
                        comment: CommentRow {
                            id: row.get(0)?,
                            owner_id: row.get(1)?,
                            video_id: row.get(2)?,
                            body: row.get(3)?,
                            created_at: row.get(4)?,
                        },
                        like_count: 0,
                        owner_username: row.get(5)?,
                        owner_full_name: row.get(6)?,
                        owner_avatar_url: row.get(7)?,
                    })
                })
                .store()?
                .collect::<std::result::Result<Vec<_>, _>>()
                .store()?;

            let ids: Vec<String> = rows.iter().map(|r| r.comment.id.clone()).collect();
            let likes = crate::reactions::count_reactions_by_target(conn, TargetKind::Comment, &ids)?;

            Ok(rows
                .into_iter()
                .map(|mut r| {
                    r.like_count = likes.get(&r.comment.id).copied().unwrap_or(0);
                    r
                })
                .collect())
        })
    }

    pub fn update_comment(&self, id: &str, owner_id: &str, body: &str) -> Result<CommentRow> {
        self.with_conn_mut(|conn| {
            let changed = conn
                .execute(
                    "UPDATE comments SET body = ?3 WHERE id = ?1 AND owner_id = ?2",
                    (id, owner_id, body),
                )
                .store()?;
            if changed == 0 {
                return Err(Error::not_found(format!("comment {id}")));
            }
            query_comment(conn, id)?.ok_or_else(|| Error::not_found(format!("comment {id}")))
        })
    }

    pub fn delete_comment(&self, id: &str, owner_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM comments WHERE id = ?1 AND owner_id = ?2",
                    (id, owner_id),
                )
                .store()?;
            if deleted == 0 {
                return Err(Error::not_found(format!("comment {id}")));
            }
            Ok(())
        })
    }

    // -- Posts --

    pub fn insert_post(&self, id: &str, owner_id: &str, body: &str) -> Result<PostRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, owner_id, body) VALUES (?1, ?2, ?3)",
                (id, owner_id, body),
            )
            .store()?;
            query_post(conn, id)?.ok_or_else(|| Error::not_found(format!("post {id}")))
        })
    }

    pub fn list_user_posts(&self, owner_id: &str) -> Result<Vec<PostWithMetaRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, owner_id, body, created_at FROM posts
                     WHERE owner_id = ?1
                     ORDER BY created_at DESC, rowid DESC",
                )
                .store()?;

            let posts = stmt
                .query_map([owner_id], |row| {
                    Ok(PostRow {
                        id: row.get(0)?,
                        owner_id: row.get(1)?,
                        body: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })
                .store()?
                .collect::<std::result::Result<Vec<_>, _>>()
                .store()?;

            let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
            let likes = crate::reactions::count_reactions_by_target(conn, TargetKind::Post, &ids)?;

            Ok(posts
                .into_iter()
                .map(|post| {
                    let like_count = likes.get(&post.id).copied().unwrap_or(0);
                    PostWithMetaRow { post, like_count }
                })
                .collect())
        })
    }

    pub fn update_post(&self, id: &str, owner_id: &str, body: &str) -> Result<PostRow> {
        self.with_conn_mut(|conn| {
            let changed = conn
                .execute(
                    "UPDATE posts SET body = ?3 WHERE id = ?1 AND owner_id = ?2",
                    (id, owner_id, body),
                )
                .store()?;
            if changed == 0 {
                return Err(Error::not_found(format!("post {id}")));
            }
            query_post(conn, id)?.ok_or_else(|| Error::not_found(format!("post {id}")))
        })
    }

    pub fn delete_post(&self, id: &str, owner_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM posts WHERE id = ?1 AND owner_id = ?2",
                    (id, owner_id),
                )
                .store()?;
            if deleted == 0 {
                return Err(Error::not_found(format!("post {id}")));
            }
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, filter: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, full_name, avatar_url, password, created_at
         FROM users WHERE {filter}"
    );
    conn.query_row(&sql, [value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            full_name: row.get(2)?,
            avatar_url: row.get(3)?,
            password: row.get(4)?,
            created_at: row.get(5)?,
        })
    })
    .optional()
}

pub(crate) fn query_video(conn: &Connection, id: &str) -> Result<Option<VideoRow>> {
    conn.query_row(
        "SELECT id, owner_id, title, description, video_url, thumbnail_url,
                duration, views, published, created_at
         FROM videos WHERE id = ?1",
        [id],
        |row| {
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
        },
    )
    .optional()
}

fn query_comment(conn: &Connection, id: &str) -> Result<Option<CommentRow>> {
    conn.query_row(
        "SELECT id, owner_id, video_id, body, created_at FROM comments WHERE id = ?1",
        [id],
        |row| {
            Ok(CommentRow {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                video_id: row.get(2)?,
                body: row.get(3)?,
                created_at: row.get(4)?,
            })
        },
    )
    .optional()
}

fn query_post(conn: &Connection, id: &str) -> Result<Option<PostRow>> {
    conn.query_row(
        "SELECT id, owner_id, body, created_at FROM posts WHERE id = ?1",
        [id],
        |row| {
            Ok(PostRow {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                body: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use crate::test_util::{db, seed_user, seed_video};
    use clipstream_types::Error;
    use uuid::Uuid;

    #[test]
    fn video_crud_roundtrip() {
        let db = db();
        let owner = seed_user(&db, "carol");
        let vid = seed_video(&db, &owner, "First upload");

        let fetched = db.get_video(&vid).unwrap().unwrap();
        assert_eq!(fetched.title, "First upload");
        assert!(fetched.published);
        assert_eq!(fetched.views, 0);

        let updated = db
            .update_video(&vid, &owner, Some("Renamed"), None, None)
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description, "a description");

        db.delete_video(&vid, &owner).unwrap();
        assert!(db.get_video(&vid).unwrap().is_none());
    }

    #[test]
    fn non_owner_update_is_not_found() {
        let db = db();
        let owner = seed_user(&db, "dave");
        let other = seed_user(&db, "mallory");
        let vid = seed_video(&db, &owner, "Mine");

        let err = db
            .update_video(&vid, &other, Some("Stolen"), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = db.delete_video(&vid, &other).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(db.get_video(&vid).unwrap().is_some());
    }

    #[test]
    fn publish_flag_flips() {
        let db = db();
        let owner = seed_user(&db, "erin");
        let vid = seed_video(&db, &owner, "Draft");

        assert!(!db.toggle_video_published(&vid, &owner).unwrap());
        assert!(db.toggle_video_published(&vid, &owner).unwrap());
    }

    #[test]
    fn comment_requires_existing_video() {
        let db = db();
        let owner = seed_user(&db, "frank");
        let missing = Uuid::new_v4().to_string();
        let cid = Uuid::new_v4().to_string();

        let err = db
            .insert_comment(&cid, &owner, &missing, "first!")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn comment_page_carries_owner_profile() {
        let db = db();
        let owner = seed_user(&db, "grace");
        let vid = seed_video(&db, &owner, "Watch this");
        for i in 0..3 {
            let cid = Uuid::new_v4().to_string();
            db.insert_comment(&cid, &owner, &vid, &format!("comment {i}"))
                .unwrap();
        }

        let page = db.list_video_comments(&vid, 1, 10).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].owner_username.as_deref(), Some("grace"));
        assert!(page.iter().all(|c| c.like_count == 0));

        // Beyond the data: empty page, not an error.
        assert!(db.list_video_comments(&vid, 50, 10).unwrap().is_empty());
    }

    #[test]
    fn post_crud_roundtrip() {
        let db = db();
        let owner = seed_user(&db, "heidi");
        let pid = Uuid::new_v4().to_string();

        db.insert_post(&pid, &owner, "hello world").unwrap();
        let updated = db.update_post(&pid, &owner, "edited").unwrap();
        assert_eq!(updated.body, "edited");

        let posts = db.list_user_posts(&owner).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].like_count, 0);

        db.delete_post(&pid, &owner).unwrap();
        assert!(db.list_user_posts(&owner).unwrap().is_empty());
    }
}
