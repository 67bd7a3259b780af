use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::warn;

use cartelera_types::api::{Claims, UserSummary};

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /admin/users — the registered-user roster for the dashboard.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = {
        let state = state.clone();
        crate::blocking(move || state.db.list_profiles()).await?
    };

    let users: Vec<UserSummary> = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id.parse().ok().or_else(|| {
                warn!("Corrupt profile id '{}'", row.id);
                None
            })?;
            let role = state.role_for(&row.email);
            Some(UserSummary {
                id,
                email: row.email,
                full_name: row.full_name,
                role,
                created_at: cartelera_db::parse_timestamp(&row.created_at),
            })
        })
        .collect();

    Ok(Json(users))
}
