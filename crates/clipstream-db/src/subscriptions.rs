use crate::models::SubscriptionEntryRow;
use crate::{Database, StoreResultExt, is_unique_violation, store_error};
use clipstream_types::{Error, Result};
use rusqlite::Connection;

/// Outcome of a subscription toggle.
#[derive(Debug)]
pub struct SubscribeOutcome {
    pub subscribed: bool,
    pub subscriber_count: u64,
}

impl Database {
    /// Same Absent/Present state machine as reaction toggling, keyed on
    /// (subscriber, channel) and guarded by the same unique-index-plus-
    /// one-retry pattern. Self-subscription is rejected outright.
    pub fn toggle_subscription(
        &self,
        id: &str,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<SubscribeOutcome> {
        if subscriber_id == channel_id {
            return Err(Error::invalid("cannot subscribe to your own channel"));
        }

        self.with_conn_mut(|conn| {
            if conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [channel_id], |_| Ok(()))
                .optional()?
                .is_none()
            {
                return Err(Error::not_found(format!("channel {channel_id}")));
            }

            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
                    (subscriber_id, channel_id),
                    |row| row.get(0),
                )
                .optional()?;

            let subscribed = match existing {
                Some(existing_id) => {
                    conn.execute("DELETE FROM subscriptions WHERE id = ?1", [&existing_id])
                        .store()?;
                    false
                }
                None => {
                    let inserted = conn.execute(
                        "INSERT INTO subscriptions (id, subscriber_id, channel_id)
                         VALUES (?1, ?2, ?3)",
                        (id, subscriber_id, channel_id),
                    );
                    match inserted {
                        Ok(_) => true,
                        Err(e) if is_unique_violation(&e) => {
                            let deleted = conn
                                .execute(
                                    "DELETE FROM subscriptions
                                     WHERE subscriber_id = ?1 AND channel_id = ?2",
                                    (subscriber_id, channel_id),
                                )
                                .store()?;
                            if deleted == 0 {
                                return Err(Error::Conflict(format!(
                                    "subscription to {channel_id} changed concurrently"
                                )));
                            }
                            false
                        }
                        Err(e) => return Err(store_error(e)),
                    }
                }
            };

            let subscriber_count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?1",
                    [channel_id],
                    |row| row.get(0),
                )
                .store()?;

            Ok(SubscribeOutcome {
                subscribed,
                subscriber_count: subscriber_count.max(0) as u64,
            })
        })
    }

    /// Who follows this channel, newest first.
    pub fn channel_subscribers(&self, channel_id: &str) -> Result<Vec<SubscriptionEntryRow>> {
        self.with_conn(|conn| {
            query_subscription_entries(
                conn,
                "s.channel_id = ?1",
                "s.subscriber_id",
                channel_id,
            )
        })
    }

    /// Which channels this user follows, newest first.
    pub fn subscribed_channels(&self, subscriber_id: &str) -> Result<Vec<SubscriptionEntryRow>> {
        self.with_conn(|conn| {
            query_subscription_entries(
                conn,
                "s.subscriber_id = ?1",
                "s.channel_id",
                subscriber_id,
            )
        })
    }
}

fn query_subscription_entries(
    conn: &Connection,
    filter: &str,
    join_on: &str,
    value: &str,
) -> Result<Vec<SubscriptionEntryRow>> {
    let sql = format!(
        "SELECT {join_on}, u.username, u.full_name, u.avatar_url, s.created_at
         FROM subscriptions s
         LEFT JOIN users u ON {join_on} = u.id
         WHERE {filter}
         ORDER BY s.created_at DESC, s.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql).store()?;
    stmt.query_map([value], |row| {
        Ok(SubscriptionEntryRow {
            user_id: row.get(0)?,
            username: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            full_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            avatar_url: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            created_at: row.get(4)?,
        })
    })
    .store()?
    .collect::<std::result::Result<Vec<_>, _>>()
    .store()
}

#[cfg(test)]
mod tests {
    use crate::test_util::{db, seed_user};
    use clipstream_types::Error;
    use uuid::Uuid;

    #[test]
    fn toggle_is_its_own_inverse() {
        let db = db();
        let fan = seed_user(&db, "fan");
        let channel = seed_user(&db, "channel");

        let sid = Uuid::new_v4().to_string();
        let first = db.toggle_subscription(&sid, &fan, &channel).unwrap();
        assert!(first.subscribed);
        assert_eq!(first.subscriber_count, 1);

        let sid = Uuid::new_v4().to_string();
        let second = db.toggle_subscription(&sid, &fan, &channel).unwrap();
        assert!(!second.subscribed);
        assert_eq!(second.subscriber_count, 0);
    }

    #[test]
    fn self_subscription_is_rejected() {
        let db = db();
        let user = seed_user(&db, "loner");
        let sid = Uuid::new_v4().to_string();
        assert!(matches!(
            db.toggle_subscription(&sid, &user, &user).unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }

    #[test]
    fn unknown_channel_is_not_found() {
        let db = db();
        let fan = seed_user(&db, "fan");
        let sid = Uuid::new_v4().to_string();
        let missing = Uuid::new_v4().to_string();
        assert!(matches!(
            db.toggle_subscription(&sid, &fan, &missing).unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn both_directions_list_the_right_profiles() {
        let db = db();
        let fan = seed_user(&db, "fan");
        let other_fan = seed_user(&db, "other_fan");
        let channel = seed_user(&db, "channel");

        for f in [&fan, &other_fan] {
            let sid = Uuid::new_v4().to_string();
            db.toggle_subscription(&sid, f, &channel).unwrap();
        }

        let subscribers = db.channel_subscribers(&channel).unwrap();
        assert_eq!(subscribers.len(), 2);
        let names: Vec<_> = subscribers.iter().map(|s| s.username.as_str()).collect();
        assert!(names.contains(&"fan") && names.contains(&"other_fan"));

        let followed = db.subscribed_channels(&fan).unwrap();
        assert_eq!(followed.len(), 1);
        assert_eq!(followed[0].username, "channel");
        assert!(db.subscribed_channels(&channel).unwrap().is_empty());
    }
}
