use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use cartelera_api::auth::{self, AppState, AppStateInner};
use cartelera_api::middleware::{require_admin, require_auth};
use cartelera_api::reactions::ToggleLocks;
use cartelera_api::{
    admin, announcements, communities, events, media, notifications, profile, reactions,
};
use cartelera_gateway::connection;
use cartelera_gateway::dispatcher::Dispatcher;

mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cartelera=debug,tower_http=debug".into()),
        )
        .init();

    let config = config::Config::from_env()?;

    // Init database
    let db = cartelera_db::Database::open(&config.db_path)?;

    // Shared state
    let dispatcher = Dispatcher::new();
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        admin_emails: config.admin_emails,
        media_dir: config.media_dir,
        dispatcher: dispatcher.clone(),
        toggle_locks: ToggleLocks::new(),
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/media/{id}", get(media::serve_media))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/profile", get(profile::get_profile))
        .route("/profile/avatar", put(profile::update_avatar))
        .route("/events", get(events::list_events))
        .route("/events", post(events::create_event))
        .route("/events/{event_id}", put(events::update_event))
        .route("/events/{event_id}", delete(events::delete_event))
        .route("/events/{event_id}/reactions", post(reactions::toggle_reaction))
        .route("/users/{user_id}/follow", post(communities::follow))
        .route("/users/{user_id}/follow", delete(communities::unfollow))
        .route("/users/{user_id}/followers", get(communities::followers))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/{notification_id}/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/read", delete(notifications::clear_read))
        .route("/announcements", get(announcements::list_announcements))
        .route("/announcements/{announcement_id}/read", post(announcements::mark_read))
        .route("/media", post(media::upload_media))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state.clone());

    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/announcements", post(announcements::create_announcement))
        .route("/announcements/{announcement_id}", delete(announcements::delete_announcement))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state.clone());

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(app_state.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Cartelera server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(
            socket,
            state.dispatcher.clone(),
            state.jwt_secret.clone(),
        )
    })
}
