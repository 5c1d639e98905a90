//! Core library for the weather agent.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The hardcoded weather catalog and the `get_weather` tool
//! - The remote model boundary (Gemini function calling)
//! - The agent and its real/mock answer strategies
//!
//! It is used by `weather-cli` and `weather-web`.

pub mod agent;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod tool;

pub use agent::{AgentMode, Answer, TraceKind, TraceStep, WeatherAgent};
pub use config::{AgentConfig, StoredConfig};
pub use error::{AnswerError, ToolError};
pub use model::{CatalogEntry, ToolDescriptor, WeatherRecord};
pub use provider::{ModelClient, ModelTurn};
pub use tool::WeatherTool;
