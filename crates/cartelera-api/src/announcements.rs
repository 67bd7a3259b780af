use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use cartelera_types::api::{AnnouncementView, Claims, CreateAnnouncementRequest};
use cartelera_types::events::GatewayEvent;
use cartelera_types::models::Announcement;

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /announcements — newest first, with the caller's read receipts.
pub async fn list_announcements(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = {
        let state = state.clone();
        let user = claims.sub.to_string();
        crate::blocking(move || state.db.list_announcements(&user)).await?
    };

    let views: Vec<AnnouncementView> = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id.parse().ok().or_else(|| {
                warn!("Corrupt announcement id '{}'", row.id);
                None
            })?;
            Some(AnnouncementView {
                announcement: Announcement {
                    id,
                    title: row.title,
                    body: row.body,
                    created_at: cartelera_db::parse_timestamp(&row.created_at),
                },
                read: row.read,
            })
        })
        .collect();

    Ok(Json(views))
}

/// POST /announcements — admin broadcast.
pub async fn create_announcement(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() || req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("title and body are required"));
    }

    let announcement = Announcement {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        body: req.body.trim().to_string(),
        created_at: chrono::Utc::now(),
    };

    {
        let state = state.clone();
        let (id, title, body) = (
            announcement.id.to_string(),
            announcement.title.clone(),
            announcement.body.clone(),
        );
        crate::blocking(move || state.db.insert_announcement(&id, &title, &body)).await?;
    }

    state.dispatcher.broadcast(GatewayEvent::AnnouncementCreate {
        announcement: announcement.clone(),
    });

    Ok((StatusCode::CREATED, Json(announcement)))
}

/// DELETE /announcements/{id} — admin only; read receipts go with it.
pub async fn delete_announcement(
    State(state): State<AppState>,
    Path(announcement_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = {
        let state = state.clone();
        let id = announcement_id.to_string();
        crate::blocking(move || state.db.delete_announcement(&id)).await?
    };

    if !deleted {
        return Err(ApiError::NotFound("announcement"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /announcements/{id}/read — per-user receipt, idempotent.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(announcement_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    {
        let state = state.clone();
        let (aid, user) = (announcement_id.to_string(), claims.sub.to_string());
        crate::blocking(move || state.db.mark_announcement_read(&aid, &user)).await?;
    }
    Ok(Json(json!({ "read": true })))
}
