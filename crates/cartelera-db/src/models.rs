/// Database row types — these map directly to SQLite rows.
/// Distinct from the cartelera-types API models to keep the storage layer
/// independent. Timestamps stay raw strings here; callers convert with
/// `crate::parse_timestamp`.

pub struct ProfileRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub avatar: String,
    pub instagram: Option<String>,
    pub birthdate: Option<String>,
    pub created_at: String,
}

pub struct EventRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_type: String,
    pub date: String,
    pub province: String,
    pub city: String,
    pub address: String,
    pub is_free: bool,
    pub price_anticipada: Option<f64>,
    pub price_general: Option<f64>,
    /// JSON array of media attachments, stored as written
    pub multimedia: String,
    pub organizer_id: String,
    pub organizer_name: String,
    pub organizer_avatar: String,
    pub created_at: String,
}

pub struct ReactionRow {
    pub event_id: String,
    pub user_id: String,
    /// Snapshot of the reacting user's profile at toggle time
    pub full_name: String,
    pub avatar: String,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: String,
    pub recipient_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub kind: String,
    pub event_id: Option<String>,
    pub read: bool,
    pub created_at: String,
}

pub struct AnnouncementRow {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    /// Whether the requesting user has read it (join on announcement_reads)
    pub read: bool,
}
