use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Announcement, EventView, Notification, ReactionKind, ReactionUser};

/// Events sent over the WebSocket gateway. Clients get pushed the deltas
/// they would otherwise have to poll for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { user_id: Uuid, full_name: String },

    /// A new event was published
    EventCreate { event: Box<EventView> },

    /// An event was edited (fields replaced wholesale)
    EventUpdate { event: Box<EventView> },

    /// An event was deleted by its organizer or an admin
    EventDelete { event_id: Uuid },

    /// A reaction was added to an event. Carries the authoritative
    /// membership re-read so clients never have to guess counts.
    ReactionAdd {
        event_id: Uuid,
        kind: ReactionKind,
        user_id: Uuid,
        members: Vec<ReactionUser>,
    },

    /// A reaction was removed from an event
    ReactionRemove {
        event_id: Uuid,
        kind: ReactionKind,
        user_id: Uuid,
        members: Vec<ReactionUser>,
    },

    /// Targeted: a notification was created for the receiving user.
    /// `alert` is set by the connection's banner gate — true only when the
    /// unread count strictly increased and no banner is showing.
    NotificationCreate {
        notification: Notification,
        unread_count: usize,
        alert: bool,
    },

    /// An administrator published an announcement
    AnnouncementCreate { announcement: Announcement },
}

/// Commands sent FROM client TO server over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },

    /// The client dismissed the notification banner (timeout or swipe);
    /// the server-side gate re-arms for the next unread increase.
    BannerDismissed,
}
