use crate::{AgentConfig, model::ToolDescriptor, provider::gemini::GeminiClient};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;

pub mod gemini;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
    Function,
}

/// A model's request to run a named tool.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse { name: String, response: Value },
}

/// One turn of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self { role: Role::User, parts: vec![Part::Text(text.into())] }
    }

    pub fn model_call(call: FunctionCall) -> Self {
        Self { role: Role::Model, parts: vec![Part::FunctionCall(call)] }
    }

    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            role: Role::Function,
            parts: vec![Part::FunctionResponse { name: name.into(), response }],
        }
    }
}

/// Whether the model may decide to call the advertised tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Auto,
    None,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub tools: Vec<ToolDescriptor>,
    pub tool_mode: ToolMode,
}

/// What the first candidate of a model response asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    Text(String),
    FunctionCall(FunctionCall),
}

#[async_trait]
pub trait ModelClient: Send + Sync + Debug {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<ModelTurn>;
}

/// Construct the remote client for a config that carries an API key.
pub fn client_from_config(config: &AgentConfig) -> anyhow::Result<Box<dyn ModelClient>> {
    if !config.has_api_key() {
        anyhow::bail!(
            "No API key configured.\n\
             Hint: set {} or run `weather-agent configure`.",
            crate::config::API_KEY_ENV
        );
    }

    Ok(Box::new(GeminiClient::from_config(config)?))
}
