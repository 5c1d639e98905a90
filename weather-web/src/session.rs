use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;
use weather_core::TraceStep;

pub const GREETING: &str =
    "Hello! I'm your weather assistant. Ask me about the weather in any city!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry of a visitor's transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    /// Only populated for mock-mode answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<Vec<TraceStep>>,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, text: text.into(), debug_info: None, at: Utc::now() }
    }

    pub fn assistant(text: impl Into<String>, debug_info: Option<Vec<TraceStep>>) -> Self {
        Self { role: TurnRole::Assistant, text: text.into(), debug_info, at: Utc::now() }
    }
}

/// Append-only transcript of a single visitor.
#[derive(Debug, Clone)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    transcript: Vec<ConversationTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            transcript: vec![ConversationTurn::assistant(GREETING, None)],
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.transcript.push(turn);
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Sessions by id, remembering creation order for eviction.
#[derive(Debug)]
pub struct SessionStore {
    capacity: usize,
    sessions: HashMap<Uuid, Session>,
    order: VecDeque<Uuid>,
}

impl SessionStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity, sessions: HashMap::new(), order: VecDeque::new() }
    }

    /// Insert a session, evicting the oldest one when full.
    pub fn insert(&mut self, id: Uuid, session: Session) {
        while self.sessions.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.sessions.remove(&oldest);
                }
                None => break,
            }
        }
        self.sessions.insert(id, session);
        self.order.push_back(id);
    }

    pub fn get(&self, id: &Uuid) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
