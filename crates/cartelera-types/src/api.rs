use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Announcement, EventType, MediaFile, Notification, ReactionKind, ReactionUser, Role,
};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the WebSocket
/// gateway authentication. Canonical definition lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub full_name: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub full_name: String,
    pub role: Role,
    pub token: String,
}

// -- Events --

/// Publish and edit share one shape: edits replace the event wholesale.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpsertEventRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub date: chrono::DateTime<chrono::Utc>,
    pub province: String,
    pub city: String,
    pub address: String,
    pub is_free: bool,
    #[serde(default)]
    pub price_anticipada: Option<f64>,
    #[serde(default)]
    pub price_general: Option<f64>,
    #[serde(default)]
    pub multimedia: Vec<MediaFile>,
}

// -- Profile --

/// Points the caller's profile at an already-uploaded image URL.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAvatarRequest {
    pub avatar: String,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleReactionRequest {
    pub kind: ReactionKind,
}

/// The authoritative membership list after a toggle, re-read from storage.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleReactionResponse {
    pub kind: ReactionKind,
    pub added: bool,
    pub members: Vec<ReactionUser>,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

// -- Announcements --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementView {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub read: bool,
}

// -- Media --

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub media: MediaFile,
}

// -- Admin --

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
