use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed set of event categories on the billboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Pena,
    Certamen,
    Festival,
    Recital,
    Clase,
    Taller,
    Encuentro,
}

impl EventType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pena" => Some(Self::Pena),
            "certamen" => Some(Self::Certamen),
            "festival" => Some(Self::Festival),
            "recital" => Some(Self::Recital),
            "clase" => Some(Self::Clase),
            "taller" => Some(Self::Taller),
            "encuentro" => Some(Self::Encuentro),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pena => "pena",
            Self::Certamen => "certamen",
            Self::Festival => "festival",
            Self::Recital => "recital",
            Self::Clase => "clase",
            Self::Taller => "taller",
            Self::Encuentro => "encuentro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A media attachment on an event. `id` is the storage object name,
/// `url` the path it is served from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: String,
    pub kind: MediaKind,
    pub url: String,
}

/// Organizer snapshot attached to an event view. Resolved live from the
/// organizer's profile at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organizer {
    pub id: Uuid,
    pub full_name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub date: DateTime<Utc>,
    pub province: String,
    pub city: String,
    pub address: String,
    pub is_free: bool,
    pub price_anticipada: Option<f64>,
    pub price_general: Option<f64>,
    pub multimedia: Vec<MediaFile>,
    pub organizer: Organizer,
    pub created_at: DateTime<Utc>,
}

/// The two reaction kinds a user can place on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Attend,
}

/// A member of an event's reaction list. `full_name` and `avatar` are a
/// snapshot taken when the reaction was written; later profile edits do
/// not update rows already written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionUser {
    pub id: Uuid,
    pub full_name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    pub likes: Vec<ReactionUser>,
    pub attending: Vec<ReactionUser>,
}

/// The aggregate view model: an event with organizer and reaction
/// membership resolved, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub reactions: Reactions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub instagram: Option<String>,
    pub birthdate: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Attend,
    Follow,
}

impl NotificationKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Self::Like),
            "attend" => Some(Self::Attend),
            "follow" => Some(Self::Follow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Attend => "attend",
            Self::Follow => "follow",
        }
    }
}

impl From<ReactionKind> for NotificationKind {
    fn from(kind: ReactionKind) -> Self {
        match kind {
            ReactionKind::Like => Self::Like,
            ReactionKind::Attend => Self::Attend,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub kind: NotificationKind,
    pub event_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
