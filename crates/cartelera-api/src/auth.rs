use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use cartelera_db::Database;
use cartelera_gateway::dispatcher::Dispatcher;
use cartelera_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use cartelera_types::models::Role;

use crate::error::ApiError;
use crate::reactions::ToggleLocks;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub admin_emails: Vec<String>,
    pub media_dir: PathBuf,
    pub dispatcher: Dispatcher,
    pub toggle_locks: ToggleLocks,
}

impl AppStateInner {
    /// Admin role comes from the configured email allow-list, computed at
    /// token issue time rather than stored.
    pub fn role_for(&self, email: &str) -> Role {
        if self.admin_emails.iter().any(|e| e == email) {
            Role::Admin
        } else {
            Role::User
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if !req.email.contains('@') || req.email.len() > 254 {
        return Err(ApiError::BadRequest("invalid email"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters"));
    }
    if req.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("full name is required"));
    }

    let email = req.email.to_lowercase();

    // Check if the email is taken
    {
        let db_email = email.clone();
        let existing = {
            let state = state.clone();
            crate::blocking(move || state.db.get_profile_by_email(&db_email)).await?
        };
        if existing.is_some() {
            return Err(ApiError::Conflict("email already registered"));
        }
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hash: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();
    let full_name = req.full_name.trim().to_string();
    let avatar = default_avatar(&full_name);

    let inserted = {
        let state = state.clone();
        let (uid, email, name, avatar) =
            (user_id.to_string(), email.clone(), full_name.clone(), avatar);
        let (instagram, birthdate) = (req.instagram.clone(), req.birthdate.clone());
        crate::blocking(move || {
            state.db.create_profile(
                &uid,
                &email,
                &password_hash,
                &name,
                &avatar,
                instagram.as_deref(),
                birthdate.as_deref(),
            )
        })
        .await
    };
    match inserted {
        Ok(()) => {}
        // Concurrent registration lost the race to the UNIQUE(email)
        // constraint: same outcome as the check above
        Err(ApiError::Internal(e)) if cartelera_db::is_constraint_violation(&e) => {
            return Err(ApiError::Conflict("email already registered"));
        }
        Err(e) => return Err(e),
    }

    let role = state.role_for(&email);
    let token = create_token(&state.jwt_secret, user_id, &full_name, role)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.to_lowercase();
    let profile = {
        let state = state.clone();
        let db_email = email.clone();
        crate::blocking(move || state.db.get_profile_by_email(&db_email)).await?
    }
    .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&profile.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = profile
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt profile id: {e}")))?;

    let role = state.role_for(&email);
    let token = create_token(&state.jwt_secret, user_id, &profile.full_name, role)?;

    Ok(Json(LoginResponse {
        user_id,
        full_name: profile.full_name,
        role,
        token,
    }))
}

fn create_token(
    secret: &str,
    user_id: Uuid,
    full_name: &str,
    role: Role,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        full_name: full_name.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encode: {e}")))
}

/// Placeholder avatar for fresh profiles, overridable later.
fn default_avatar(full_name: &str) -> String {
    let name: String = full_name
        .chars()
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();
    format!("https://ui-avatars.com/api/?name={name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactions::ToggleLocks;
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

    fn request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "guitarreada".into(),
            full_name: "Ana Paredes".into(),
            instagram: None,
            birthdate: None,
        }
    }

    #[tokio::test]
    async fn reregistering_an_email_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        register(State(state.clone()), Json(request("ana@example.com")))
            .await
            .map(|_| ())
            .unwrap();
        // Same address, different casing
        let err = register(State(state.clone()), Json(request("ANA@example.com")))
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn simultaneous_registrations_yield_one_account() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let (a, b) = tokio::join!(
            register(State(state.clone()), Json(request("dup@example.com"))),
            register(State(state.clone()), Json(request("dup@example.com"))),
        );

        // Whichever write lost, by the pre-check or the schema constraint,
        // it surfaces as a conflict rather than an internal error
        let errs: Vec<ApiError> = [a.map(|_| ()), b.map(|_| ())]
            .into_iter()
            .filter_map(Result::err)
            .collect();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ApiError::Conflict(_)));

        assert!(
            state
                .db
                .get_profile_by_email("dup@example.com")
                .unwrap()
                .is_some()
        );
    }
}
