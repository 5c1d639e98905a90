//! Web chat shell for the weather agent.
//!
//! A JSON API over [`WeatherAgent`] plus an embedded single-page frontend.
//! Every visitor gets their own transcript, keyed by a session id.

pub mod api;
pub mod frontend;
pub mod session;

use axum::{Json, Router, routing::get};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use weather_core::WeatherAgent;

use session::{Session, SessionStore};

/// Maximum number of in-memory sessions before the oldest is evicted.
pub const MAX_SESSIONS: usize = 1_000;

pub struct AppState {
    /// The agent, or why it could not be built.
    pub agent: Result<WeatherAgent, String>,
    pub sessions: RwLock<SessionStore>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(agent: Result<WeatherAgent, String>) -> SharedState {
        Arc::new(Self { agent, sessions: RwLock::new(SessionStore::with_capacity(MAX_SESSIONS)) })
    }

    /// Start a session, evicting the oldest one when full.
    pub async fn create_session(&self) -> (Uuid, Session) {
        let id = Uuid::new_v4();
        let session = Session::new();

        self.sessions.write().await.insert(id, session.clone());

        (id, session)
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router(state))
        .merge(frontend::frontend_router())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
