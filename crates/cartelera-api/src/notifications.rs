use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use cartelera_db::models::NotificationRow;
use cartelera_types::api::{Claims, NotificationsResponse};
use cartelera_types::models::{Notification, NotificationKind};

use crate::auth::AppState;
use crate::error::ApiError;

const FEED_LIMIT: u32 = 50;

/// GET /notifications — the caller's feed, newest first, complete-replace.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let (rows, unread_count) = {
        let state = state.clone();
        let recipient = claims.sub.to_string();
        crate::blocking(move || {
            let rows = state.db.notifications_for(&recipient, FEED_LIMIT)?;
            let unread = state.db.unread_notification_count(&recipient)?;
            Ok((rows, unread))
        })
        .await?
    };

    let notifications = rows.into_iter().filter_map(notification_from_row).collect();

    Ok(Json(NotificationsResponse {
        notifications,
        unread_count,
    }))
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = {
        let state = state.clone();
        let (nid, recipient) = (notification_id.to_string(), claims.sub.to_string());
        crate::blocking(move || state.db.mark_notification_read(&nid, &recipient)).await?
    };

    if !changed {
        return Err(ApiError::NotFound("notification"));
    }
    Ok(Json(json!({ "read": true })))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    {
        let state = state.clone();
        let recipient = claims.sub.to_string();
        crate::blocking(move || state.db.mark_all_notifications_read(&recipient)).await?;
    }
    Ok(Json(json!({ "read": true })))
}

/// DELETE /notifications/read — bulk-clear of read items only.
pub async fn clear_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = {
        let state = state.clone();
        let recipient = claims.sub.to_string();
        crate::blocking(move || state.db.clear_read_notifications(&recipient)).await?
    };
    Ok(Json(json!({ "deleted": deleted })))
}

fn notification_from_row(row: NotificationRow) -> Option<Notification> {
    let kind = NotificationKind::parse(&row.kind).or_else(|| {
        warn!("Corrupt notification kind '{}' on '{}'", row.kind, row.id);
        None
    })?;

    Some(Notification {
        id: row.id.parse().ok()?,
        recipient_id: row.recipient_id.parse().ok()?,
        sender_id: row.sender_id.parse().ok()?,
        sender_name: row.sender_name,
        kind,
        event_id: row.event_id.and_then(|id| id.parse().ok()),
        read: row.read,
        created_at: cartelera_db::parse_timestamp(&row.created_at),
    })
}
