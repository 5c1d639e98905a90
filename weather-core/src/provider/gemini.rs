use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AgentConfig, model::ToolDescriptor};

use super::{
    Content, FunctionCall, GenerateRequest, ModelClient, ModelTurn, Part, Role, ToolMode,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini `generateContent` over REST.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("Gemini API key is empty");
        }

        let base_url = base_url.into();
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("Invalid Gemini base URL '{base_url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("Gemini base URL must be http or https, got '{}'", parsed.scheme());
        }

        let http = Client::builder()
            .user_agent(concat!("weather-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for Gemini")?;

        Ok(Self {
            api_key,
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        Self::new(config.api_key(), &config.model_name, &config.api_base_url)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ModelTurn> {
        let payload = GmRequest::from(request);
        tracing::debug!(model = %self.model, turns = payload.contents.len(), "calling Gemini");

        let res = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read Gemini response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Gemini request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: GmResponse =
            serde_json::from_str(&body).context("Failed to parse Gemini response JSON")?;

        parse_turn(parsed)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GmRequest<'a> {
    contents: Vec<GmContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GmTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<GmToolConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GmTool<'a> {
    function_declarations: &'a [ToolDescriptor],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GmToolConfig {
    function_calling_config: GmFunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct GmFunctionCallingConfig {
    mode: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct GmContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GmPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GmFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<GmFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GmFunctionCall {
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GmFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmCandidate {
    content: Option<GmContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmResponse {
    #[serde(default)]
    candidates: Vec<GmCandidate>,
}

impl<'a> From<&'a GenerateRequest> for GmRequest<'a> {
    fn from(request: &'a GenerateRequest) -> Self {
        let contents = request.contents.iter().map(GmContent::from).collect();

        if request.tools.is_empty() {
            return Self { contents, tools: Vec::new(), tool_config: None };
        }

        let mode = match request.tool_mode {
            ToolMode::Auto => "AUTO",
            ToolMode::None => "NONE",
        };

        Self {
            contents,
            tools: vec![GmTool { function_declarations: &request.tools }],
            tool_config: Some(GmToolConfig {
                function_calling_config: GmFunctionCallingConfig { mode },
            }),
        }
    }
}

impl From<&Content> for GmContent {
    fn from(content: &Content) -> Self {
        // Gemini carries function results on the user side of the dialogue.
        let role = match content.role {
            Role::User | Role::Function => "user",
            Role::Model => "model",
        };

        let parts = content
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => GmPart { text: Some(text.clone()), ..GmPart::default() },
                Part::FunctionCall(call) => GmPart {
                    function_call: Some(GmFunctionCall {
                        name: call.name.clone(),
                        args: call.args.clone(),
                    }),
                    ..GmPart::default()
                },
                Part::FunctionResponse { name, response } => GmPart {
                    function_response: Some(GmFunctionResponse {
                        name: name.clone(),
                        response: response.clone(),
                    }),
                    ..GmPart::default()
                },
            })
            .collect();

        Self { role: Some(role.to_string()), parts }
    }
}

/// Reduce the first candidate to a [`ModelTurn`]. A function call anywhere in
/// the parts takes precedence over text.
fn parse_turn(response: GmResponse) -> Result<ModelTurn> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Gemini response contained no candidates"))?;

    let content = candidate.content.ok_or_else(|| {
        anyhow!(
            "Gemini candidate had no content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )
    })?;

    let mut text = String::new();
    for part in content.parts {
        if let Some(call) = part.function_call {
            return Ok(ModelTurn::FunctionCall(FunctionCall { name: call.name, args: call.args }));
        }
        if let Some(t) = part.text {
            text.push_str(&t);
        }
    }

    if text.trim().is_empty() {
        bail!("Gemini response contained no text");
    }
    Ok(ModelTurn::Text(text))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
    format!("{}...", &body[..cut])
}
