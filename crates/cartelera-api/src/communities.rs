use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use cartelera_types::api::Claims;
use cartelera_types::events::GatewayEvent;
use cartelera_types::models::{Notification, NotificationKind};

use crate::auth::AppState;
use crate::error::ApiError;

/// POST /users/{user_id}/follow — join another user's community.
/// At most one row per pair; re-following is a no-op.
pub async fn follow(
    State(state): State<AppState>,
    Path(followed_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if followed_id == claims.sub {
        return Err(ApiError::BadRequest("cannot follow yourself"));
    }

    let newly_followed = {
        let state = state.clone();
        let (follower, followed) = (claims.sub.to_string(), followed_id.to_string());
        crate::blocking(move || {
            if state.db.get_profile(&followed)?.is_none() {
                return Ok(None);
            }
            Ok(Some(state.db.follow(&follower, &followed)?))
        })
        .await?
    }
    .ok_or(ApiError::NotFound("profile"))?;

    if newly_followed {
        notify_followed(&state, followed_id, claims.sub, &claims.full_name).await?;
    }

    Ok(Json(json!({ "following": true })))
}

/// DELETE /users/{user_id}/follow — leave the community.
pub async fn unfollow(
    State(state): State<AppState>,
    Path(followed_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    {
        let state = state.clone();
        let (follower, followed) = (claims.sub.to_string(), followed_id.to_string());
        crate::blocking(move || state.db.unfollow(&follower, &followed)).await?;
    }

    Ok(Json(json!({ "following": false })))
}

/// GET /users/{user_id}/followers — who joined this community.
pub async fn followers(
    State(state): State<AppState>,
    Path(followed_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let follower_ids = {
        let state = state.clone();
        let followed = followed_id.to_string();
        crate::blocking(move || state.db.followers_of(&followed)).await?
    };

    Ok(Json(json!({ "followers": follower_ids })))
}

async fn notify_followed(
    state: &AppState,
    followed_id: Uuid,
    follower_id: Uuid,
    follower_name: &str,
) -> Result<(), ApiError> {
    let notification_id = Uuid::new_v4();
    let created_at = chrono::Utc::now();

    let unread_count = {
        let state = state.clone();
        let (nid, rid, sid, name) = (
            notification_id.to_string(),
            followed_id.to_string(),
            follower_id.to_string(),
            follower_name.to_string(),
        );
        crate::blocking(move || {
            state
                .db
                .insert_notification(&nid, &rid, &sid, &name, NotificationKind::Follow.as_str(), None)?;
            state.db.unread_notification_count(&rid)
        })
        .await?
    };

    state
        .dispatcher
        .send_to_user(
            followed_id,
            GatewayEvent::NotificationCreate {
                notification: Notification {
                    id: notification_id,
                    recipient_id: followed_id,
                    sender_id: follower_id,
                    sender_name: follower_name.to_string(),
                    kind: NotificationKind::Follow,
                    event_id: None,
                    read: false,
                    created_at,
                },
                unread_count,
                alert: false,
            },
        )
        .await;

    Ok(())
}
