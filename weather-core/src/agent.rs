//! The weather agent and its two answer strategies.
//!
//! Which strategy runs is decided once, when the agent is built: a configured
//! API key plus a working remote client selects [`AgentMode::Real`], anything
//! else selects [`AgentMode::Mock`].

use serde::Serialize;
use serde_json::json;

use crate::{
    AgentConfig,
    config::API_KEY_ENV,
    error::{AnswerError, ToolError},
    model::WeatherRecord,
    provider::{Content, GenerateRequest, ModelClient, ModelTurn, ToolMode, client_from_config},
    tool::{GET_WEATHER, WeatherTool},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    Real,
    Mock,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Real => "real",
            AgentMode::Mock => "mock",
        }
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    ToolCall,
    ToolResult,
    ModelResponse,
}

/// One step of how an answer was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    pub kind: TraceKind,
    pub detail: String,
}

impl TraceStep {
    fn new(kind: TraceKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub trace: Vec<TraceStep>,
}

/// Answers by letting the remote model call [`GET_WEATHER`].
#[derive(Debug)]
pub struct RealAnswerStrategy {
    client: Box<dyn ModelClient>,
}

impl RealAnswerStrategy {
    pub fn new(client: Box<dyn ModelClient>) -> Self {
        Self { client }
    }

    pub async fn answer(&self, tool: &WeatherTool, question: &str) -> Result<Answer, AnswerError> {
        self.run(tool, question).await.map_err(AnswerError::from)
    }

    async fn run(&self, tool: &WeatherTool, question: &str) -> anyhow::Result<Answer> {
        let prompt = build_prompt(question);
        let tools = vec![tool.function_schema()];
        let mut trace = Vec::new();

        let first = GenerateRequest {
            contents: vec![Content::user_text(prompt.clone())],
            tools: tools.clone(),
            tool_mode: ToolMode::Auto,
        };

        let call = match self.client.generate(&first).await? {
            ModelTurn::Text(text) => {
                let text = text.trim().to_string();
                trace.push(TraceStep::new(TraceKind::ModelResponse, text.clone()));
                return Ok(Answer { text, trace });
            }
            ModelTurn::FunctionCall(call) => call,
        };

        if call.name != GET_WEATHER {
            return Err(ToolError::UnknownFunction(call.name).into());
        }

        let record = tool.execute(&call.args)?;
        tracing::info!(location = %record.location, "model called {GET_WEATHER}");
        trace.push(TraceStep::new(TraceKind::ToolCall, describe_call(&record.location)));

        let result = serde_json::to_value(&record)?;
        trace.push(TraceStep::new(TraceKind::ToolResult, result.to_string()));

        let follow_up = GenerateRequest {
            contents: vec![
                Content::user_text(prompt),
                Content::model_call(call),
                Content::function_response(GET_WEATHER, json!({ "result": result })),
            ],
            tools,
            tool_mode: ToolMode::None,
        };

        match self.client.generate(&follow_up).await? {
            ModelTurn::Text(text) => {
                let text = text.trim().to_string();
                trace.push(TraceStep::new(TraceKind::ModelResponse, text.clone()));
                Ok(Answer { text, trace })
            }
            ModelTurn::FunctionCall(again) => Err(anyhow::anyhow!(
                "Model requested another function call ('{}') instead of answering",
                again.name
            )),
        }
    }
}

/// Local stand-in for the model: keyword rules over the question text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAnswerStrategy;

impl MockAnswerStrategy {
    pub fn answer(&self, tool: &WeatherTool, question: &str) -> Answer {
        let location = tool.extract_location_fallback(question);
        let mut trace = vec![TraceStep::new(TraceKind::ToolCall, describe_call(&location))];

        let record = tool.get_weather(&location);
        let result = serde_json::to_string(&record).unwrap_or_else(|_| format!("{record:?}"));
        trace.push(TraceStep::new(TraceKind::ToolResult, result));

        let text = format_mock_response(&record, question);
        trace.push(TraceStep::new(TraceKind::ModelResponse, text.clone()));

        for step in &trace {
            tracing::debug!(kind = ?step.kind, detail = %step.detail, "mock step");
        }

        Answer { text, trace }
    }
}

#[derive(Debug)]
enum AnswerStrategy {
    Real(RealAnswerStrategy),
    Mock(MockAnswerStrategy),
}

#[derive(Debug)]
pub struct WeatherAgent {
    config: AgentConfig,
    tool: WeatherTool,
    strategy: AnswerStrategy,
}

impl WeatherAgent {
    pub const NAME: &'static str = "Weather Assistant";

    /// Pick the strategy from the config. Setup failures fall back to mock mode.
    pub fn new(config: AgentConfig) -> Self {
        let strategy = if config.has_api_key() {
            match client_from_config(&config) {
                Ok(client) => {
                    tracing::info!(model = %config.model_name, "Using real LLM ({})", client.name());
                    AnswerStrategy::Real(RealAnswerStrategy::new(client))
                }
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "Failed to set up LLM, falling back to mock mode");
                    AnswerStrategy::Mock(MockAnswerStrategy)
                }
            }
        } else {
            tracing::warn!("No {API_KEY_ENV} found. Using mock mode.");
            AnswerStrategy::Mock(MockAnswerStrategy)
        };

        Self::assemble(config, strategy)
    }

    /// Use `client` for real mode. Without an API key in `config` the
    /// client is dropped and the agent runs in mock mode.
    pub fn with_client(config: AgentConfig, client: Box<dyn ModelClient>) -> Self {
        let strategy = if config.has_api_key() {
            AnswerStrategy::Real(RealAnswerStrategy::new(client))
        } else {
            AnswerStrategy::Mock(MockAnswerStrategy)
        };
        Self::assemble(config, strategy)
    }

    fn assemble(config: AgentConfig, strategy: AnswerStrategy) -> Self {
        let tool = WeatherTool::new(config.default_location.clone());
        Self { config, tool, strategy }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn mode(&self) -> AgentMode {
        match self.strategy {
            AnswerStrategy::Real(_) => AgentMode::Real,
            AnswerStrategy::Mock(_) => AgentMode::Mock,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tool(&self) -> &WeatherTool {
        &self.tool
    }

    /// Answer a question along with how the answer was produced. Never fails:
    /// real-mode errors come back as an apology in `text`.
    pub async fn answer(&self, question: &str) -> Answer {
        match &self.strategy {
            AnswerStrategy::Mock(mock) => mock.answer(&self.tool, question),
            AnswerStrategy::Real(real) => match real.answer(&self.tool, question).await {
                Ok(answer) => answer,
                Err(err) => {
                    tracing::error!(error = %err, "answer pipeline failed");
                    Answer { text: err.to_string(), trace: Vec::new() }
                }
            },
        }
    }

    pub async fn answer_question(&self, question: &str) -> String {
        self.answer(question).await.text
    }
}

fn build_prompt(question: &str) -> String {
    format!(
        "You are a helpful weather assistant. Answer the user's weather question \
         by calling the {GET_WEATHER} function when needed.\n\nUser question: {question}\n"
    )
}

fn describe_call(location: &str) -> String {
    format!("{GET_WEATHER}(location='{location}')")
}

fn format_mock_response(record: &WeatherRecord, question: &str) -> String {
    let question = question.to_lowercase();
    let loc = &record.location;

    if question.contains("temp") {
        format!("The current temperature in {loc} is {}°C.", record.temperature)
    } else if question.contains("humid") {
        format!("The humidity in {loc} is {}%.", record.humidity)
    } else {
        format!(
            "The weather in {loc} is currently {} with a temperature of {}°C.",
            record.description.to_lowercase(),
            record.temperature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Map;
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use crate::provider::{FunctionCall, Part};

    /// Replays canned turns and records every request it sees.
    #[derive(Debug, Default)]
    struct ScriptedClient {
        turns: Mutex<VecDeque<anyhow::Result<ModelTurn>>>,
        requests: Arc<Mutex<Vec<GenerateRequest>>>,
    }

    impl ScriptedClient {
        fn new(turns: Vec<anyhow::Result<ModelTurn>>) -> (Self, Arc<Mutex<Vec<GenerateRequest>>>) {
            let client = Self { turns: Mutex::new(turns.into()), ..Self::default() };
            let requests = client.requests.clone();
            (client, requests)
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<ModelTurn> {
            self.requests.lock().unwrap().push(request.clone());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
        }
    }

    fn weather_call(location: &str) -> ModelTurn {
        let mut args = Map::new();
        args.insert("location".into(), json!(location));
        ModelTurn::FunctionCall(FunctionCall { name: GET_WEATHER.into(), args })
    }

    fn real_agent(turns: Vec<anyhow::Result<ModelTurn>>) -> (WeatherAgent, Arc<Mutex<Vec<GenerateRequest>>>) {
        let (client, requests) = ScriptedClient::new(turns);
        let cfg = AgentConfig::default().with_api_key("TEST_KEY");
        (WeatherAgent::with_client(cfg, Box::new(client)), requests)
    }

    fn mock_agent() -> WeatherAgent {
        WeatherAgent::new(AgentConfig::default())
    }

    #[tokio::test]
    async fn mock_temperature_answer() {
        let answer = mock_agent().answer_question("What's the temperature in Paris?").await;
        assert_eq!(answer, "The current temperature in Paris is 15°C.");
    }

    #[tokio::test]
    async fn mock_humidity_answer() {
        let answer = mock_agent().answer_question("Is it humid in London?").await;
        assert_eq!(answer, "The humidity in London is 80%.");
    }

    #[tokio::test]
    async fn mock_general_answer_uses_description() {
        let answer = mock_agent().answer_question("What's the weather in Tokyo?").await;
        assert_eq!(answer, "The weather in Tokyo is currently clear with a temperature of 22°C.");
    }

    #[tokio::test]
    async fn mock_falls_back_to_default_location() {
        let answer = mock_agent().answer_question("Describe conditions please").await;
        assert_eq!(
            answer,
            "The weather in San Francisco is currently partly cloudy with a temperature of 18°C."
        );
    }

    #[tokio::test]
    async fn mock_answer_carries_trace() {
        let answer = mock_agent().answer("How hot is it in Tokyo").await;
        let kinds: Vec<_> = answer.trace.iter().map(|s| s.kind).collect();

        assert_eq!(kinds, [TraceKind::ToolCall, TraceKind::ToolResult, TraceKind::ModelResponse]);
        assert_eq!(answer.trace[0].detail, "get_weather(location='tokyo')");
        assert!(answer.trace[1].detail.contains("\"temperature\":22"));
        assert_eq!(answer.trace[2].detail, answer.text);
    }

    #[tokio::test]
    async fn no_credential_never_calls_the_model() {
        let (client, requests) = ScriptedClient::new(vec![Ok(ModelTurn::Text("remote".into()))]);
        let agent = WeatherAgent::with_client(AgentConfig::default(), Box::new(client));

        assert_eq!(agent.mode(), AgentMode::Mock);
        for q in ["What's the weather in London?", "hello", ""] {
            let answer = agent.answer_question(q).await;
            assert_ne!(answer, "remote");
        }
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn setup_failure_falls_back_to_mock() {
        let mut cfg = AgentConfig::default().with_api_key("KEY");
        cfg.api_base_url = "not a url".into();

        assert_eq!(WeatherAgent::new(cfg).mode(), AgentMode::Mock);
    }

    #[test]
    fn credential_selects_real_mode() {
        let agent = WeatherAgent::new(AgentConfig::default().with_api_key("KEY"));
        assert_eq!(agent.mode(), AgentMode::Real);
        assert_eq!(agent.name(), "Weather Assistant");
    }

    #[tokio::test]
    async fn real_mode_relays_tool_result_for_final_answer() {
        let (agent, requests) = real_agent(vec![
            Ok(weather_call("Berlin")),
            Ok(ModelTurn::Text("  It's 20°C and pleasant in Berlin.\n".into())),
        ]);

        let answer = agent.answer("What's the weather in Berlin?").await;
        assert_eq!(answer.text, "It's 20°C and pleasant in Berlin.");

        let tool_calls: Vec<_> =
            answer.trace.iter().filter(|s| s.kind == TraceKind::ToolCall).collect();
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].detail, "get_weather(location='Berlin')");

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);

        let first = &requests[0];
        assert_eq!(first.tool_mode, ToolMode::Auto);
        assert_eq!(first.tools[0].name, GET_WEATHER);
        assert!(matches!(&first.contents[0].parts[0], Part::Text(p) if p.contains("What's the weather in Berlin?")));

        let follow_up = &requests[1];
        assert_eq!(follow_up.contents.len(), 3);
        assert_eq!(follow_up.contents[0], first.contents[0]);
        assert!(matches!(&follow_up.contents[1].parts[0], Part::FunctionCall(c) if c.args["location"] == "Berlin"));
        match &follow_up.contents[2].parts[0] {
            Part::FunctionResponse { name, response } => {
                assert_eq!(name, GET_WEATHER);
                assert_eq!(response["result"]["location"], "Berlin");
                assert_eq!(response["result"]["temperature"], 20);
            }
            other => panic!("expected function response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn real_mode_returns_direct_text_without_tool_call() {
        let (agent, requests) = real_agent(vec![Ok(ModelTurn::Text(" I only know weather. ".into()))]);

        let answer = agent.answer_question("Tell me a joke").await;

        assert_eq!(answer, "I only know weather.");
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn real_mode_failures_become_apologies() {
        let (agent, _) = real_agent(vec![Err(anyhow::anyhow!("connection reset"))]);
        assert_eq!(
            agent.answer_question("weather in Paris?").await,
            "Sorry, I encountered an error: connection reset"
        );

        let (agent, _) = real_agent(vec![Ok(weather_call("Paris"))]);
        let answer = agent.answer_question("weather in Paris?").await;
        assert!(answer.starts_with("Sorry, I encountered an error: "));
        assert!(answer.contains("script exhausted"));
    }

    #[tokio::test]
    async fn real_mode_rejects_unknown_function_and_missing_args() {
        let unknown = ModelTurn::FunctionCall(FunctionCall { name: "get_time".into(), args: Map::new() });
        let (agent, requests) = real_agent(vec![Ok(unknown)]);
        let answer = agent.answer_question("what time is it").await;
        assert_eq!(answer, "Sorry, I encountered an error: Unknown function 'get_time'");
        assert_eq!(requests.lock().unwrap().len(), 1);

        let no_args = ModelTurn::FunctionCall(FunctionCall { name: GET_WEATHER.into(), args: Map::new() });
        let (agent, _) = real_agent(vec![Ok(no_args)]);
        let answer = agent.answer_question("weather?").await;
        assert!(answer.contains("Missing required argument 'location'"));
    }

    #[tokio::test]
    async fn real_mode_rejects_second_function_call() {
        let (agent, requests) = real_agent(vec![Ok(weather_call("Tokyo")), Ok(weather_call("Paris"))]);

        let answer = agent.answer_question("weather in Tokyo and Paris").await;

        assert!(answer.contains("another function call"));
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[test]
    fn mode_display() {
        assert_eq!(AgentMode::Real.to_string(), "real");
        assert_eq!(serde_json::to_value(AgentMode::Mock).unwrap(), json!("mock"));
    }
}
