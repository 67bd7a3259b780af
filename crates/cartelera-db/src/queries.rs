use crate::Database;
use crate::models::{AnnouncementRow, EventRow, NotificationRow, ProfileRow, ReactionRow};
use anyhow::Result;
use cartelera_types::models::ReactionKind;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

/// Reaction kinds map onto two identically-shaped tables.
fn reaction_table(kind: ReactionKind) -> &'static str {
    match kind {
        ReactionKind::Like => "likes",
        ReactionKind::Attend => "attendances",
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

impl Database {
    // -- Profiles --

    #[allow(clippy::too_many_arguments)]
    pub fn create_profile(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        full_name: &str,
        avatar: &str,
        instagram: Option<&str>,
        birthdate: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, email, password, full_name, avatar, instagram, birthdate, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![id, email, password_hash, full_name, avatar, instagram, birthdate, now()],
            )?;
            Ok(())
        })
    }

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "id", id))
    }

    pub fn get_profile_by_email(&self, email: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "email", email))
    }

    pub fn update_avatar(&self, id: &str, avatar: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE profiles SET avatar = ?1 WHERE id = ?2",
                rusqlite::params![avatar, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn list_profiles(&self) -> Result<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, password, full_name, avatar, instagram, birthdate, created_at
                 FROM profiles ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], map_profile)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Events --

    pub fn insert_event(&self, row: &EventRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, title, description, event_type, date, province, city, address,
                                     is_free, price_anticipada, price_general, multimedia, organizer_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                rusqlite::params![
                    row.id,
                    row.title,
                    row.description,
                    row.event_type,
                    row.date,
                    row.province,
                    row.city,
                    row.address,
                    row.is_free,
                    row.price_anticipada,
                    row.price_general,
                    row.multimedia,
                    row.organizer_id,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Wholesale field replacement; only the organizer reference and
    /// created_at survive from the original row.
    pub fn update_event(&self, row: &EventRow) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE events SET title = ?2, description = ?3, event_type = ?4, date = ?5,
                                   province = ?6, city = ?7, address = ?8, is_free = ?9,
                                   price_anticipada = ?10, price_general = ?11, multimedia = ?12
                 WHERE id = ?1",
                rusqlite::params![
                    row.id,
                    row.title,
                    row.description,
                    row.event_type,
                    row.date,
                    row.province,
                    row.city,
                    row.address,
                    row.is_free,
                    row.price_anticipada,
                    row.price_general,
                    row.multimedia,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the event together with its reaction rows, so no orphaned
    /// membership survives the event.
    pub fn delete_event(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let tx_result: std::result::Result<usize, rusqlite::Error> = (|| {
                conn.execute("DELETE FROM likes WHERE event_id = ?1", [id])?;
                conn.execute("DELETE FROM attendances WHERE event_id = ?1", [id])?;
                conn.execute("DELETE FROM events WHERE id = ?1", [id])
            })();
            Ok(tx_result? > 0)
        })
    }

    pub fn get_event(&self, id: &str) -> Result<Option<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} WHERE e.id = ?1", EVENT_SELECT))?;
            let row = stmt.query_row([id], map_event).optional()?;
            Ok(row)
        })
    }

    pub fn list_events(&self) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY e.date ASC", EVENT_SELECT))?;
            let rows = stmt
                .query_map([], map_event)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reactions --

    /// Toggle a reaction: removes the row if present, inserts it if not.
    /// Returns true when the reaction was added. The caller supplies the
    /// freshly-read profile snapshot carried by the inserted row.
    pub fn toggle_reaction(
        &self,
        kind: ReactionKind,
        event_id: &str,
        user_id: &str,
        full_name: &str,
        avatar: &str,
    ) -> Result<bool> {
        let table = reaction_table(kind);
        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    &format!("SELECT user_id FROM {table} WHERE event_id = ?1 AND user_id = ?2"),
                    rusqlite::params![event_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                conn.execute(
                    &format!("DELETE FROM {table} WHERE event_id = ?1 AND user_id = ?2"),
                    rusqlite::params![event_id, user_id],
                )?;
                Ok(false)
            } else {
                conn.execute(
                    &format!(
                        "INSERT INTO {table} (event_id, user_id, full_name, avatar, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)"
                    ),
                    rusqlite::params![event_id, user_id, full_name, avatar, now()],
                )?;
                Ok(true)
            }
        })
    }

    /// Authoritative membership for one event/kind, re-read after toggles.
    pub fn reactions_for_event(&self, kind: ReactionKind, event_id: &str) -> Result<Vec<ReactionRow>> {
        let table = reaction_table(kind);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT event_id, user_id, full_name, avatar, created_at
                 FROM {table} WHERE event_id = ?1 ORDER BY created_at ASC"
            ))?;
            let rows = stmt
                .query_map([event_id], map_reaction)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch reactions for a set of event IDs.
    pub fn reactions_for_events(
        &self,
        kind: ReactionKind,
        event_ids: &[String],
    ) -> Result<Vec<ReactionRow>> {
        if event_ids.is_empty() {
            return Ok(vec![]);
        }

        let table = reaction_table(kind);
        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=event_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT event_id, user_id, full_name, avatar, created_at
                 FROM {table} WHERE event_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = event_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), map_reaction)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Communities --

    /// Returns true when the follow row was newly created.
    pub fn follow(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO communities (follower_id, followed_id, created_at)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![follower_id, followed_id, now()],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM communities WHERE follower_id = ?1 AND followed_id = ?2",
                rusqlite::params![follower_id, followed_id],
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let row: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM communities WHERE follower_id = ?1 AND followed_id = ?2",
                    rusqlite::params![follower_id, followed_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(row.is_some())
        })
    }

    pub fn followers_of(&self, followed_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT follower_id FROM communities WHERE followed_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map([followed_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(rows)
        })
    }

    // -- Notifications --

    pub fn insert_notification(
        &self,
        id: &str,
        recipient_id: &str,
        sender_id: &str,
        sender_name: &str,
        kind: &str,
        event_id: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, recipient_id, sender_id, sender_name, kind, event_id, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                rusqlite::params![id, recipient_id, sender_id, sender_name, kind, event_id, now()],
            )?;
            Ok(())
        })
    }

    pub fn notifications_for(&self, recipient_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipient_id, sender_id, sender_name, kind, event_id, read, created_at
                 FROM notifications WHERE recipient_id = ?1
                 ORDER BY created_at DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![recipient_id, limit], map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn unread_notification_count(&self, recipient_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read = 0",
                [recipient_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }

    /// Scoped to the recipient so one user cannot mark another's rows.
    pub fn mark_notification_read(&self, id: &str, recipient_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET read = 1 WHERE id = ?1 AND recipient_id = ?2",
                rusqlite::params![id, recipient_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
                [recipient_id],
            )?;
            Ok(())
        })
    }

    /// Bulk-clear: deletes read rows only, unread ones stay.
    pub fn clear_read_notifications(&self, recipient_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM notifications WHERE recipient_id = ?1 AND read = 1",
                [recipient_id],
            )?;
            Ok(deleted)
        })
    }

    // -- Announcements --

    pub fn insert_announcement(&self, id: &str, title: &str, body: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO announcements (id, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, title, body, now()],
            )?;
            Ok(())
        })
    }

    pub fn delete_announcement(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM announcement_reads WHERE announcement_id = ?1", [id])?;
            let deleted = conn.execute("DELETE FROM announcements WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    /// Newest-first, each row carrying the requesting user's read flag.
    pub fn list_announcements(&self, user_id: &str) -> Result<Vec<AnnouncementRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.title, a.body, a.created_at,
                        r.user_id IS NOT NULL AS read
                 FROM announcements a
                 LEFT JOIN announcement_reads r
                        ON r.announcement_id = a.id AND r.user_id = ?1
                 ORDER BY a.created_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(AnnouncementRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        body: row.get(2)?,
                        created_at: row.get(3)?,
                        read: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn mark_announcement_read(&self, announcement_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO announcement_reads (announcement_id, user_id) VALUES (?1, ?2)",
                rusqlite::params![announcement_id, user_id],
            )?;
            Ok(())
        })
    }
}

// JOIN profiles to resolve the organizer in a single query
const EVENT_SELECT: &str = "SELECT e.id, e.title, e.description, e.event_type, e.date,
        e.province, e.city, e.address, e.is_free, e.price_anticipada, e.price_general,
        e.multimedia, e.organizer_id, p.full_name, p.avatar, e.created_at
 FROM events e
 LEFT JOIN profiles p ON e.organizer_id = p.id";

fn map_event(row: &rusqlite::Row<'_>) -> std::result::Result<EventRow, rusqlite::Error> {
    Ok(EventRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        event_type: row.get(3)?,
        date: row.get(4)?,
        province: row.get(5)?,
        city: row.get(6)?,
        address: row.get(7)?,
        is_free: row.get(8)?,
        price_anticipada: row.get(9)?,
        price_general: row.get(10)?,
        multimedia: row.get(11)?,
        organizer_id: row.get(12)?,
        organizer_name: row
            .get::<_, Option<String>>(13)?
            .unwrap_or_else(|| "unknown".to_string()),
        organizer_avatar: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
        created_at: row.get(15)?,
    })
}

fn map_reaction(row: &rusqlite::Row<'_>) -> std::result::Result<ReactionRow, rusqlite::Error> {
    Ok(ReactionRow {
        event_id: row.get(0)?,
        user_id: row.get(1)?,
        full_name: row.get(2)?,
        avatar: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_notification(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<NotificationRow, rusqlite::Error> {
    Ok(NotificationRow {
        id: row.get(0)?,
        recipient_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_name: row.get(3)?,
        kind: row.get(4)?,
        event_id: row.get(5)?,
        read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_profile(row: &rusqlite::Row<'_>) -> std::result::Result<ProfileRow, rusqlite::Error> {
    Ok(ProfileRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        full_name: row.get(3)?,
        avatar: row.get(4)?,
        instagram: row.get(5)?,
        birthdate: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn query_profile(conn: &Connection, column: &str, value: &str) -> Result<Option<ProfileRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, email, password, full_name, avatar, instagram, birthdate, created_at
         FROM profiles WHERE {column} = ?1"
    ))?;
    let row = stmt.query_row([value], map_profile).optional()?;
    Ok(row)
}
