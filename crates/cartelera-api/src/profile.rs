use axum::{Extension, Json, extract::State, response::IntoResponse};

use cartelera_db::models::ProfileRow;
use cartelera_types::api::{Claims, UpdateAvatarRequest};
use cartelera_types::models::Profile;

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /profile — the caller's own profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = {
        let state = state.clone();
        let uid = claims.sub.to_string();
        crate::blocking(move || state.db.get_profile(&uid)).await?
    }
    .ok_or(ApiError::NotFound("profile"))?;

    Ok(Json(profile_from_row(&state, row)?))
}

/// PUT /profile/avatar — swap the avatar for an uploaded image URL.
/// Reaction rows written earlier keep their snapshot.
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateAvatarRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let avatar = req.avatar.trim().to_string();
    if avatar.is_empty() {
        return Err(ApiError::BadRequest("avatar url is required"));
    }

    let row = {
        let state = state.clone();
        let uid = claims.sub.to_string();
        crate::blocking(move || {
            if !state.db.update_avatar(&uid, &avatar)? {
                return Ok(None);
            }
            state.db.get_profile(&uid)
        })
        .await?
    }
    .ok_or(ApiError::NotFound("profile"))?;

    Ok(Json(profile_from_row(&state, row)?))
}

fn profile_from_row(state: &AppState, row: ProfileRow) -> Result<Profile, ApiError> {
    let id = row
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt profile id: {e}")))?;
    let role = state.role_for(&row.email);

    Ok(Profile {
        id,
        email: row.email,
        full_name: row.full_name,
        avatar: row.avatar,
        instagram: row.instagram,
        birthdate: row.birthdate,
        role,
        created_at: cartelera_db::parse_timestamp(&row.created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AppStateInner;
    use crate::reactions::ToggleLocks;
    use cartelera_db::Database;
    use cartelera_gateway::dispatcher::Dispatcher;
    use cartelera_types::models::Role;
    use std::sync::Arc;
    use uuid::Uuid;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        Arc::new(AppStateInner {
            db,
            jwt_secret: "test-secret".into(),
            admin_emails: vec!["admin@example.com".into()],
            media_dir: dir.path().join("media"),
            dispatcher: Dispatcher::new(),
            toggle_locks: ToggleLocks::new(),
        })
    }

    fn claims_for(user_id: Uuid) -> Claims {
        Claims {
            sub: user_id,
            full_name: "Ana Paredes".into(),
            role: Role::User,
            exp: usize::MAX,
        }
    }

    #[tokio::test]
    async fn avatar_update_persists_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let user_id = Uuid::new_v4();
        state
            .db
            .create_profile(
                &user_id.to_string(),
                "ana@example.com",
                "hash",
                "Ana Paredes",
                "https://ui-avatars.com/api/?name=Ana+Paredes",
                None,
                None,
            )
            .unwrap();

        update_avatar(
            State(state.clone()),
            Extension(claims_for(user_id)),
            Json(UpdateAvatarRequest {
                avatar: "/media/nuevo.jpg".into(),
            }),
        )
        .await
        .map(|_| ())
        .unwrap();

        let row = state.db.get_profile(&user_id.to_string()).unwrap().unwrap();
        assert_eq!(row.avatar, "/media/nuevo.jpg");
    }

    #[tokio::test]
    async fn unknown_profile_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let ghost = Uuid::new_v4();

        let err = get_profile(State(state.clone()), Extension(claims_for(ghost)))
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("profile")));

        let err = update_avatar(
            State(state.clone()),
            Extension(claims_for(ghost)),
            Json(UpdateAvatarRequest {
                avatar: "/media/nuevo.jpg".into(),
            }),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("profile")));
    }

    #[tokio::test]
    async fn blank_avatar_is_rejected_without_touching_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let user_id = Uuid::new_v4();
        state
            .db
            .create_profile(
                &user_id.to_string(),
                "ana@example.com",
                "hash",
                "Ana Paredes",
                "inicial.png",
                None,
                None,
            )
            .unwrap();

        let err = update_avatar(
            State(state.clone()),
            Extension(claims_for(user_id)),
            Json(UpdateAvatarRequest { avatar: "   ".into() }),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let row = state.db.get_profile(&user_id.to_string()).unwrap().unwrap();
        assert_eq!(row.avatar, "inicial.png");
    }
}
