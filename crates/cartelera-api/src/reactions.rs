use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use cartelera_types::api::{Claims, ToggleReactionRequest, ToggleReactionResponse};
use cartelera_types::events::GatewayEvent;
use cartelera_types::models::{Notification, NotificationKind, ReactionKind, ReactionUser};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::events::reaction_user;

/// Per-(event, user, kind) async locks serializing toggles. Rapid
/// double-clicks on the same reaction queue up instead of racing the
/// check-then-write; distinct keys stay concurrent. Entries are evicted
/// when the last holder releases, so the map does not grow with every
/// key ever toggled.
pub struct ToggleLocks {
    locks: StdMutex<HashMap<(Uuid, Uuid, ReactionKind), Arc<Mutex<()>>>>,
}

impl ToggleLocks {
    pub fn new() -> Self {
        Self {
            locks: StdMutex::new(HashMap::new()),
        }
    }

    fn key_lock(&self, key: (Uuid, Uuid, ReactionKind)) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("toggle lock map poisoned");
        locks.entry(key).or_default().clone()
    }

    /// Drop the caller's handle and evict the entry once the map holds
    /// the only remaining reference. Acquisition and eviction both take
    /// the map mutex, so a key can never end up with two live locks.
    fn release(&self, key: (Uuid, Uuid, ReactionKind), lock: Arc<Mutex<()>>) {
        drop(lock);
        let mut locks = self.locks.lock().expect("toggle lock map poisoned");
        if locks.get(&key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&key);
        }
    }
}

impl Default for ToggleLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// POST /events/{event_id}/reactions
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ToggleReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (added, members) = toggle(&state, event_id, claims.sub, req.kind).await?;

    let event = if added {
        GatewayEvent::ReactionAdd {
            event_id,
            kind: req.kind,
            user_id: claims.sub,
            members: members.clone(),
        }
    } else {
        GatewayEvent::ReactionRemove {
            event_id,
            kind: req.kind,
            user_id: claims.sub,
            members: members.clone(),
        }
    };
    state.dispatcher.broadcast(event);

    Ok(Json(ToggleReactionResponse {
        kind: req.kind,
        added,
        members,
    }))
}

/// The toggle core from the consistency model: read the caller's profile
/// fresh (the snapshot written into the row), flip the membership row,
/// then re-read the full membership as the new authoritative state.
/// Serialized per (event, user, kind).
pub async fn toggle(
    state: &AppState,
    event_id: Uuid,
    user_id: Uuid,
    kind: ReactionKind,
) -> Result<(bool, Vec<ReactionUser>), ApiError> {
    let key = (event_id, user_id, kind);
    let lock = state.toggle_locks.key_lock(key);
    let result = {
        let _guard = lock.lock().await;
        toggle_locked(state, event_id, user_id, kind).await
    };
    state.toggle_locks.release(key, lock);
    result
}

async fn toggle_locked(
    state: &AppState,
    event_id: Uuid,
    user_id: Uuid,
    kind: ReactionKind,
) -> Result<(bool, Vec<ReactionUser>), ApiError> {
    let (profile, event) = {
        let state = state.clone();
        let (eid, uid) = (event_id.to_string(), user_id.to_string());
        crate::blocking(move || {
            let profile = state.db.get_profile(&uid)?;
            let event = state.db.get_event(&eid)?;
            Ok((profile, event))
        })
        .await?
    };
    // No partial mutation on a failed precondition
    let profile = profile.ok_or(ApiError::NotFound("profile"))?;
    let event = event.ok_or(ApiError::NotFound("event"))?;

    let (added, member_rows) = {
        let state = state.clone();
        let eid = event_id.to_string();
        let uid = user_id.to_string();
        let (name, avatar) = (profile.full_name.clone(), profile.avatar.clone());
        crate::blocking(move || {
            let added = state.db.toggle_reaction(kind, &eid, &uid, &name, &avatar)?;
            let members = state.db.reactions_for_event(kind, &eid)?;
            Ok((added, members))
        })
        .await?
    };

    let members: Vec<ReactionUser> = member_rows.into_iter().map(reaction_user).collect();

    // A fresh reaction notifies the organizer, never oneself
    if added && event.organizer_id != user_id.to_string() {
        notify_organizer(state, &event.organizer_id, user_id, &profile.full_name, kind, event_id)
            .await?;
    }

    Ok((added, members))
}

async fn notify_organizer(
    state: &AppState,
    organizer_id: &str,
    sender_id: Uuid,
    sender_name: &str,
    kind: ReactionKind,
    event_id: Uuid,
) -> Result<(), ApiError> {
    let notification_id = Uuid::new_v4();
    let created_at = chrono::Utc::now();
    let notification_kind = NotificationKind::from(kind);

    let unread_count = {
        let state = state.clone();
        let (nid, rid, sid, name) = (
            notification_id.to_string(),
            organizer_id.to_string(),
            sender_id.to_string(),
            sender_name.to_string(),
        );
        let eid = event_id.to_string();
        crate::blocking(move || {
            state.db.insert_notification(
                &nid,
                &rid,
                &sid,
                &name,
                notification_kind.as_str(),
                Some(&eid),
            )?;
            state.db.unread_notification_count(&rid)
        })
        .await?
    };

    let Ok(recipient_id) = organizer_id.parse::<Uuid>() else {
        return Ok(());
    };

    state
        .dispatcher
        .send_to_user(
            recipient_id,
            GatewayEvent::NotificationCreate {
                notification: Notification {
                    id: notification_id,
                    recipient_id,
                    sender_id,
                    sender_name: sender_name.to_string(),
                    kind: notification_kind,
                    event_id: Some(event_id),
                    read: false,
                    created_at,
                },
                unread_count,
                // The per-connection banner gate decides this
                alert: false,
            },
        )
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AppStateInner;
    use cartelera_db::Database;
    use cartelera_db::models::EventRow;
    use cartelera_gateway::dispatcher::Dispatcher;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        Arc::new(AppStateInner {
            db,
            jwt_secret: "test-secret".into(),
            admin_emails: vec![],
            media_dir: dir.path().join("media"),
            dispatcher: Dispatcher::new(),
            toggle_locks: ToggleLocks::new(),
        })
    }

    fn seed(state: &AppState) -> (Uuid, Uuid, Uuid) {
        let organizer = Uuid::new_v4();
        let fan = Uuid::new_v4();
        let event = Uuid::new_v4();

        state
            .db
            .create_profile(
                &organizer.to_string(),
                "org@example.com",
                "hash",
                "Organizadora",
                "org.png",
                None,
                None,
            )
            .unwrap();
        state
            .db
            .create_profile(
                &fan.to_string(),
                "fan@example.com",
                "hash",
                "Fan",
                "fan.png",
                None,
                None,
            )
            .unwrap();
        state
            .db
            .insert_event(&EventRow {
                id: event.to_string(),
                title: "Peña".into(),
                description: "desc".into(),
                event_type: "pena".into(),
                date: "2026-12-01T21:00:00+00:00".into(),
                province: "Salta".into(),
                city: "Salta".into(),
                address: "Calle 1".into(),
                is_free: true,
                price_anticipada: None,
                price_general: None,
                multimedia: "[]".into(),
                organizer_id: organizer.to_string(),
                organizer_name: String::new(),
                organizer_avatar: String::new(),
                created_at: "2026-08-01T00:00:00+00:00".into(),
            })
            .unwrap();

        (organizer, fan, event)
    }

    #[tokio::test]
    async fn double_toggle_returns_to_the_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (_organizer, fan, event) = seed(&state);

        let before = state
            .db
            .reactions_for_event(ReactionKind::Like, &event.to_string())
            .unwrap();
        assert!(before.is_empty());

        let (added, members) = toggle(&state, event, fan, ReactionKind::Like).await.unwrap();
        assert!(added);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].full_name, "Fan");

        let (added, members) = toggle(&state, event, fan, ReactionKind::Like).await.unwrap();
        assert!(!added);
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn concurrent_toggles_serialize_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (_organizer, fan, event) = seed(&state);

        let (a, b) = tokio::join!(
            toggle(&state, event, fan, ReactionKind::Attend),
            toggle(&state, event, fan, ReactionKind::Attend),
        );
        let (added_a, _) = a.unwrap();
        let (added_b, _) = b.unwrap();

        // One insert and one delete, in either order — never two inserts
        assert_ne!(added_a, added_b);
        assert!(
            state
                .db
                .reactions_for_event(ReactionKind::Attend, &event.to_string())
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn reacting_notifies_the_organizer_but_not_oneself() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (organizer, fan, event) = seed(&state);

        toggle(&state, event, fan, ReactionKind::Like).await.unwrap();
        let rows = state.db.notifications_for(&organizer.to_string(), 50).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "like");
        assert_eq!(rows[0].sender_name, "Fan");

        // Organizer reacting to their own event stays quiet
        toggle(&state, event, organizer, ReactionKind::Like).await.unwrap();
        assert_eq!(state.db.notifications_for(&organizer.to_string(), 50).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreacting_creates_no_notification() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (organizer, fan, event) = seed(&state);

        toggle(&state, event, fan, ReactionKind::Like).await.unwrap();
        toggle(&state, event, fan, ReactionKind::Like).await.unwrap();
        // Only the initial add notified
        assert_eq!(state.db.notifications_for(&organizer.to_string(), 50).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lock_entries_are_evicted_after_the_toggle_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (_organizer, fan, event) = seed(&state);

        toggle(&state, event, fan, ReactionKind::Like).await.unwrap();
        let (a, b) = tokio::join!(
            toggle(&state, event, fan, ReactionKind::Attend),
            toggle(&state, event, fan, ReactionKind::Attend),
        );
        a.unwrap();
        b.unwrap();

        // Quiescent: every key used above has been released
        assert!(state.toggle_locks.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_profile_aborts_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (_organizer, _fan, event) = seed(&state);

        let ghost = Uuid::new_v4();
        let err = toggle(&state, event, ghost, ReactionKind::Like).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("profile")));
        assert!(
            state
                .db
                .reactions_for_event(ReactionKind::Like, &event.to_string())
                .unwrap()
                .is_empty()
        );
    }
}
