use crate::models::FeedVideoRow;
use crate::{Database, StoreResultExt};
use clipstream_types::{Error, Result};

/// Sort fields callers may request. Anything else silently falls back to
/// newest-first, matching the platform's default feed order.
const ALLOWED_SORT_FIELDS: &[(&str, &str)] = &[("title", "title"), ("createdAt", "created_at")];

pub struct FeedParams {
    pub search_text: Option<String>,
    pub sort_by: String,
    pub sort_dir: String,
    pub page: u32,
    pub page_size: u32,
    pub owner_id: Option<String>,
}

impl Database {
    /// One deterministic query plan, always composed in the same order:
    /// text filter, owner filter, owner-profile join, allow-listed sort,
    /// offset pagination. Only published videos are listed. A page past the
    /// end of the data is an empty list, not an error.
    pub fn list_videos(&self, params: &FeedParams) -> Result<Vec<FeedVideoRow>> {
        if params.page < 1 || params.page_size < 1 {
            return Err(Error::invalid("page and page size must be >= 1"));
        }

        let mut sql = String::from(
            "SELECT v.id, v.owner_id, v.title, v.description, v.video_url,
                    v.thumbnail_url, v.duration, v.views, v.created_at,
                    u.username, u.full_name, u.avatar_url
             FROM videos v
             LEFT JOIN users u ON v.owner_id = u.id
             WHERE v.published = 1",
        );
        let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        // Case-insensitive substring match over title and description, not
        // tokenized search.
        let needle = params
            .search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        if let Some(needle) = needle {
            args.push(Box::new(needle));
            sql.push_str(&format!(
                " AND (instr(lower(v.title), ?{n}) > 0 OR instr(lower(v.description), ?{n}) > 0)",
                n = args.len()
            ));
        }

        if let Some(owner_id) = &params.owner_id {
            args.push(Box::new(owner_id.clone()));
            sql.push_str(&format!(" AND v.owner_id = ?{}", args.len()));
        }

        let (column, direction) = resolve_sort(&params.sort_by, &params.sort_dir);
        // rowid tie-break keeps pagination stable across rows created in the
        // same second.
        sql.push_str(&format!(
            " ORDER BY v.{column} {direction}, v.rowid DESC"
        ));

        let offset = (params.page as i64 - 1) * params.page_size as i64;
        args.push(Box::new(params.page_size));
        sql.push_str(&format!(" LIMIT ?{}", args.len()));
        args.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ?{}", args.len()));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).store()?;
            let bound: Vec<&dyn rusqlite::types::ToSql> =
                args.iter().map(|a| a.as_ref()).collect();
            stmt.query_map(bound.as_slice(), |row| {
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
}

/// Restrict the sort to the allow-list; any other requested field falls back
/// to createdAt descending. An unrecognized direction means descending.
fn resolve_sort(sort_by: &str, sort_dir: &str) -> (&'static str, &'static str) {
    match ALLOWED_SORT_FIELDS
        .iter()
        .find(|(name, _)| *name == sort_by)
    {
        Some(&(_, column)) => {
            let direction = if sort_dir.eq_ignore_ascii_case("asc") {
                "ASC"
            } else {
                "DESC"
            };
            (column, direction)
        }
        None => ("created_at", "DESC"),
    }
}

#[cfg(test)]
mod tests {
    use super::FeedParams;
    use crate::test_util::{db, seed_user, seed_video};
    use clipstream_types::Error;

    fn params() -> FeedParams {
        FeedParams {
            search_text: None,
            sort_by: "createdAt".into(),
            sort_dir: "desc".into(),
            page: 1,
            page_size: 10,
            owner_id: None,
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let db = db();
        let owner = seed_user(&db, "alice");
        seed_video(&db, &owner, "Rust Tutorial");
        seed_video(&db, &owner, "Cooking Show");

        let mut p = params();
        p.search_text = Some("rUsT".into());
        let got = db.list_videos(&p).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Rust Tutorial");

        // "a description" matches via the description column too.
        p.search_text = Some("DESCRIP".into());
        assert_eq!(db.list_videos(&p).unwrap().len(), 2);

        p.search_text = Some("no such phrase".into());
        assert!(db.list_videos(&p).unwrap().is_empty());
    }

    #[test]
    fn owner_filter_restricts_results() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        seed_video(&db, &alice, "Alice One");
        seed_video(&db, &bob, "Bob One");

        let mut p = params();
        p.owner_id = Some(alice.clone());
        let got = db.list_videos(&p).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Alice One");
        assert_eq!(got[0].owner_username.as_deref(), Some("alice"));
    }

    #[test]
    fn title_sort_ascending() {
        let db = db();
        let owner = seed_user(&db, "alice");
        for title in ["Charlie", "Alpha", "Bravo"] {
            seed_video(&db, &owner, title);
        }

        let mut p = params();
        p.sort_by = "title".into();
        p.sort_dir = "asc".into();
        let titles: Vec<_> = db
            .list_videos(&p)
            .unwrap()
            .into_iter()
            .map(|v| v.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);
    }

    #[test]
    fn disallowed_sort_field_falls_back_to_newest_first() {
        let db = db();
        let owner = seed_user(&db, "alice");
        seed_video(&db, &owner, "Older");
        let newest = seed_video(&db, &owner, "Newest");

        let mut p = params();
        p.sort_by = "owner".into();
        p.sort_dir = "asc".into();
        let got = db.list_videos(&p).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].id, newest);
    }

    #[test]
    fn page_past_the_data_is_empty_not_error() {
        let db = db();
        let owner = seed_user(&db, "alice");
        for i in 0..5 {
            seed_video(&db, &owner, &format!("Video {i}"));
        }

        let mut p = params();
        p.page = 1000;
        assert!(db.list_videos(&p).unwrap().is_empty());
    }

    #[test]
    fn pagination_windows_do_not_overlap() {
        let db = db();
        let owner = seed_user(&db, "alice");
        for i in 0..5 {
            seed_video(&db, &owner, &format!("Video {i}"));
        }

        let mut p = params();
        p.page_size = 2;
        let first = db.list_videos(&p).unwrap();
        p.page = 2;
        let second = db.list_videos(&p).unwrap();
        p.page = 3;
        let third = db.list_videos(&p).unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(third.len(), 1);
        let mut all: Vec<_> = first
            .iter()
            .chain(&second)
            .chain(&third)
            .map(|v| v.id.clone())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn invalid_page_bounds_are_rejected() {
        let db = db();
        let mut p = params();
        p.page = 0;
        assert!(matches!(
            db.list_videos(&p).unwrap_err(),
            Error::InvalidArgument(_)
        ));

        let mut p = params();
        p.page_size = 0;
        assert!(matches!(
            db.list_videos(&p).unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }

    #[test]
    fn unpublished_videos_stay_out_of_the_feed() {
        let db = db();
        let owner = seed_user(&db, "alice");
        let vid = seed_video(&db, &owner, "Draft");
        db.toggle_video_published(&vid, &owner).unwrap();

        assert!(db.list_videos(&params()).unwrap().is_empty());
    }
}
