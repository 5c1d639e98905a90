//! JSON API used by the embedded frontend.
//!
//! - `GET  /api/status`                 — agent readiness and mode
//! - `GET  /api/catalog`                — known cities and example questions
//! - `POST /api/sessions`               — start a transcript
//! - `GET  /api/sessions/{id}`          — fetch a transcript
//! - `POST /api/sessions/{id}/messages` — ask a question

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use weather_core::{AgentMode, WeatherAgent, WeatherTool, config::DEFAULT_LOCATION};

use crate::{
    SharedState,
    session::{ConversationTurn, Session},
};

pub const EXAMPLE_QUESTIONS: [&str; 5] = [
    "What's the weather in London?",
    "How hot is it in Tokyo?",
    "Is it humid in New York?",
    "What's the temperature in Paris?",
    "How's the weather in San Francisco?",
];

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/catalog", get(catalog_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{id}", get(get_session_handler))
        .route("/sessions/{id}/messages", post(post_message_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

fn to_json(value: &impl Serialize) -> Result<Json<serde_json::Value>, ApiError> {
    serde_json::to_value(value).map(Json).map_err(|err| {
        tracing::error!(error = %err, "failed to serialize response");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to serialize response: {err}"))
    })
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<AgentMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CityDto {
    pub name: String,
    pub temperature: i32,
    pub description: &'static str,
    pub humidity: u8,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub cities: Vec<CityDto>,
    pub fallback: &'static str,
    pub examples: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct SessionResponse<'a> {
    pub id: Uuid,
    pub created_at: String,
    pub transcript: &'a [ConversationTurn],
}

impl<'a> SessionResponse<'a> {
    fn new(id: Uuid, session: &'a Session) -> Self {
        Self {
            id,
            created_at: session.created_at.to_rfc3339(),
            transcript: session.transcript(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    let response = match &state.agent {
        Ok(agent) => StatusResponse {
            ready: true,
            agent: Some(agent.name()),
            mode: Some(agent.mode()),
            model: Some(agent.config().model_name.clone()),
            error: None,
        },
        Err(err) => StatusResponse {
            ready: false,
            agent: None,
            mode: None,
            model: None,
            error: Some(err.clone()),
        },
    };
    Json(response)
}

async fn catalog_handler(State(state): State<SharedState>) -> Json<CatalogResponse> {
    // The catalog is static, so it can be listed even if the agent failed to start.
    let fallback_tool;
    let tool = match &state.agent {
        Ok(agent) => agent.tool(),
        Err(_) => {
            fallback_tool = WeatherTool::new(DEFAULT_LOCATION);
            &fallback_tool
        }
    };

    let cities = tool
        .catalog()
        .iter()
        .map(|entry| CityDto {
            name: tool.get_weather(entry.key).location,
            temperature: entry.temperature,
            description: entry.description,
            humidity: entry.humidity,
        })
        .collect();

    Json(CatalogResponse {
        cities,
        fallback: "Other cities return default pleasant weather",
        examples: &EXAMPLE_QUESTIONS,
    })
}

async fn create_session_handler(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let (id, session) = state.create_session().await;
    tracing::debug!(%id, "session created");

    Ok((StatusCode::CREATED, to_json(&SessionResponse::new(id, &session))?))
}

async fn get_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Unknown session"))?;

    to_json(&SessionResponse::new(id, session))
}

async fn post_message_handler(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<ConversationTurn>, ApiError> {
    let agent: &WeatherAgent = state.agent.as_ref().map_err(|err| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Failed to initialize Weather Agent: {err}"),
        )
    })?;

    let text = payload.text.trim();
    if text.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Message text must not be empty"));
    }

    if !state.sessions.read().await.contains(&id) {
        return Err(api_error(StatusCode::NOT_FOUND, "Unknown session"));
    }

    // The lock is not held while the agent works.
    let answer = agent.answer(text).await;
    let debug_info = (agent.mode() == AgentMode::Mock).then_some(answer.trace);
    let reply = ConversationTurn::assistant(answer.text, debug_info);

    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Unknown session"))?;
    session.push(ConversationTurn::user(text));
    session.push(reply.clone());

    Ok(Json(reply))
}
