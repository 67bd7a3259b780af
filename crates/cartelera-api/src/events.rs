use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use cartelera_db::models::{EventRow, ReactionRow};
use cartelera_types::api::{Claims, UpsertEventRequest};
use cartelera_types::billboard::{self, EventFilter};
use cartelera_types::events::GatewayEvent;
use cartelera_types::models::{
    Event, EventType, EventView, Organizer, ReactionKind, ReactionUser, Reactions,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::validation::{normalize_prices, validate_event};

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
}

impl EventsQuery {
    fn into_filter(self) -> Result<EventFilter, ApiError> {
        let event_type = match self.event_type.as_deref() {
            None | Some("all") => None,
            Some(raw) => {
                Some(EventType::parse(raw).ok_or(ApiError::BadRequest("unknown event type"))?)
            }
        };
        Ok(EventFilter {
            event_type,
            province: self.province.filter(|p| !p.is_empty()),
            city: self.city.filter(|c| !c.is_empty()),
        })
    }
}

/// GET /events — the aggregate billboard: every event with organizer and
/// reaction membership resolved, ascending by date. The ETag is a digest
/// of the payload; a matching If-None-Match short-circuits to 304 so
/// unchanged fetches cost no re-render downstream.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
    Extension(_claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.into_filter()?;

    let mut views = load_views(&state).await?;
    billboard::sort_by_date(&mut views);
    let views = if filter.is_empty() {
        views
    } else {
        filter.apply(&views)
    };

    let body = serde_json::to_string(&views)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("serialize events: {e}")))?;
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(body.as_bytes())));

    if let Some(previous) = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()) {
        if previous == etag {
            return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
        }
    }

    Ok((
        StatusCode::OK,
        [
            (header::ETAG, etag),
            (header::CONTENT_TYPE, "application/json".to_string()),
        ],
        body,
    )
        .into_response())
}

/// POST /events — publish. The caller becomes the organizer.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpsertEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = chrono::Utc::now();
    validate_event(&req, now, 0).map_err(ApiError::Validation)?;
    let (price_anticipada, price_general) = normalize_prices(&req);

    let event_id = Uuid::new_v4();
    let multimedia = serde_json::to_string(&req.multimedia)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("serialize media: {e}")))?;

    let row = EventRow {
        id: event_id.to_string(),
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        event_type: req.event_type.as_str().to_string(),
        date: req.date.to_rfc3339(),
        province: req.province,
        city: req.city,
        address: req.address,
        is_free: req.is_free,
        price_anticipada,
        price_general,
        multimedia,
        organizer_id: claims.sub.to_string(),
        organizer_name: String::new(),
        organizer_avatar: String::new(),
        created_at: now.to_rfc3339(),
    };

    {
        let state = state.clone();
        crate::blocking(move || state.db.insert_event(&row)).await?;
    }

    let view = load_view(&state, event_id)
        .await?
        .ok_or(ApiError::NotFound("event"))?;

    state.dispatcher.broadcast(GatewayEvent::EventCreate {
        event: Box::new(view.clone()),
    });

    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /events/{id} — wholesale field replacement, organizer only.
/// Omitted media keeps the stored attachments.
pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpsertEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = {
        let state = state.clone();
        let id = event_id.to_string();
        crate::blocking(move || state.db.get_event(&id)).await?
    }
    .ok_or(ApiError::NotFound("event"))?;

    if existing.organizer_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden);
    }

    let existing_media = parse_media(&existing.multimedia, &existing.id);
    let now = chrono::Utc::now();
    validate_event(&req, now, existing_media.len()).map_err(ApiError::Validation)?;
    let (price_anticipada, price_general) = normalize_prices(&req);

    let multimedia = if req.multimedia.is_empty() {
        existing.multimedia.clone()
    } else {
        serde_json::to_string(&req.multimedia)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("serialize media: {e}")))?
    };

    let row = EventRow {
        id: existing.id.clone(),
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        event_type: req.event_type.as_str().to_string(),
        date: req.date.to_rfc3339(),
        province: req.province,
        city: req.city,
        address: req.address,
        is_free: req.is_free,
        price_anticipada,
        price_general,
        multimedia,
        organizer_id: existing.organizer_id,
        organizer_name: String::new(),
        organizer_avatar: String::new(),
        created_at: existing.created_at,
    };

    {
        let state = state.clone();
        crate::blocking(move || state.db.update_event(&row)).await?;
    }

    let view = load_view(&state, event_id)
        .await?
        .ok_or(ApiError::NotFound("event"))?;

    state.dispatcher.broadcast(GatewayEvent::EventUpdate {
        event: Box::new(view.clone()),
    });

    Ok(Json(view))
}

/// DELETE /events/{id} — organizer or admin. Dependent reaction rows go
/// with the event.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = {
        let state = state.clone();
        let id = event_id.to_string();
        crate::blocking(move || state.db.get_event(&id)).await?
    }
    .ok_or(ApiError::NotFound("event"))?;

    if existing.organizer_id != claims.sub.to_string() && !claims.is_admin() {
        return Err(ApiError::Forbidden);
    }

    {
        let state = state.clone();
        let id = event_id.to_string();
        crate::blocking(move || state.db.delete_event(&id)).await?;
    }

    state
        .dispatcher
        .broadcast(GatewayEvent::EventDelete { event_id });

    Ok(StatusCode::NO_CONTENT)
}

/// Fetch every event and attach like/attendance membership in two batch
/// queries, reshaped in memory.
pub(crate) async fn load_views(state: &AppState) -> Result<Vec<EventView>, ApiError> {
    let state_clone = state.clone();
    let (rows, like_rows, attend_rows) = crate::blocking(move || {
        let rows = state_clone.db.list_events()?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let like_rows = state_clone.db.reactions_for_events(ReactionKind::Like, &ids)?;
        let attend_rows = state_clone
            .db
            .reactions_for_events(ReactionKind::Attend, &ids)?;
        Ok((rows, like_rows, attend_rows))
    })
    .await?;

    let mut likes_by_event = group_by_event(like_rows);
    let mut attending_by_event = group_by_event(attend_rows);

    Ok(rows
        .into_iter()
        .map(|row| {
            let likes = likes_by_event.remove(&row.id).unwrap_or_default();
            let attending = attending_by_event.remove(&row.id).unwrap_or_default();
            view_from_row(row, likes, attending)
        })
        .collect())
}

pub(crate) async fn load_view(
    state: &AppState,
    event_id: Uuid,
) -> Result<Option<EventView>, ApiError> {
    let state_clone = state.clone();
    let id = event_id.to_string();
    let result = crate::blocking(move || {
        let Some(row) = state_clone.db.get_event(&id)? else {
            return Ok(None);
        };
        let likes = state_clone.db.reactions_for_event(ReactionKind::Like, &id)?;
        let attending = state_clone.db.reactions_for_event(ReactionKind::Attend, &id)?;
        Ok(Some((row, likes, attending)))
    })
    .await?;

    Ok(result.map(|(row, likes, attending)| {
        view_from_row(
            row,
            likes.into_iter().map(reaction_user).collect(),
            attending.into_iter().map(reaction_user).collect(),
        )
    }))
}

fn group_by_event(rows: Vec<ReactionRow>) -> HashMap<String, Vec<ReactionUser>> {
    let mut map: HashMap<String, Vec<ReactionUser>> = HashMap::new();
    for row in rows {
        let event_id = row.event_id.clone();
        map.entry(event_id).or_default().push(reaction_user(row));
    }
    map
}

pub(crate) fn reaction_user(row: ReactionRow) -> ReactionUser {
    ReactionUser {
        id: parse_uuid(&row.user_id, "reaction user_id"),
        full_name: row.full_name,
        avatar: row.avatar,
    }
}

fn view_from_row(row: EventRow, likes: Vec<ReactionUser>, attending: Vec<ReactionUser>) -> EventView {
    let multimedia = parse_media(&row.multimedia, &row.id);

    let event_type = EventType::parse(&row.event_type).unwrap_or_else(|| {
        warn!("Corrupt event_type '{}' on event '{}'", row.event_type, row.id);
        EventType::Pena
    });

    EventView {
        event: Event {
            id: parse_uuid(&row.id, "event id"),
            title: row.title,
            description: row.description,
            event_type,
            date: cartelera_db::parse_timestamp(&row.date),
            province: row.province,
            city: row.city,
            address: row.address,
            is_free: row.is_free,
            price_anticipada: row.price_anticipada,
            price_general: row.price_general,
            multimedia,
            organizer: Organizer {
                id: parse_uuid(&row.organizer_id, "organizer id"),
                full_name: row.organizer_name,
                avatar: row.organizer_avatar,
            },
            created_at: cartelera_db::parse_timestamp(&row.created_at),
        },
        reactions: Reactions { likes, attending },
    }
}

fn parse_media(raw: &str, event_id: &str) -> Vec<cartelera_types::models::MediaFile> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt multimedia on event '{}': {}", event_id, e);
        vec![]
    })
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}
