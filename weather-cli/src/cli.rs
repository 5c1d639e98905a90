use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_core::{AgentConfig, StoredConfig, WeatherAgent};

use crate::repl;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-agent", version, about = "Weather agent with LLM function calling")]
pub struct Cli {
    /// Ignore any configured API key and answer locally.
    #[arg(long, global = true)]
    pub mock: bool,

    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat (the default).
    Chat,

    /// Answer a single question and exit.
    Ask {
        /// The question, e.g. "What's the weather in London?".
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Store a Gemini API key in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mock = self.mock;

        match self.command.unwrap_or(Command::Chat) {
            Command::Configure => configure(),
            Command::Ask { question } => {
                let agent = build_agent(mock)?;
                println!("{}", agent.answer_question(&question.join(" ")).await);
                Ok(())
            }
            Command::Chat => {
                repl::print_banner();

                let agent = match build_agent(mock) {
                    Ok(agent) => agent,
                    Err(err) => {
                        println!("Failed to initialize agent: {err:#}");
                        return Ok(());
                    }
                };
                println!("Agent initialized successfully! ({} mode)\n", agent.mode());

                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                let interrupt = async {
                    // If the handler can't be installed, only `quit` ends the loop.
                    if tokio::signal::ctrl_c().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                };

                repl::run(&agent, stdin, &mut std::io::stdout(), interrupt).await
            }
        }
    }
}

fn build_agent(mock: bool) -> anyhow::Result<WeatherAgent> {
    let mut config = AgentConfig::load()?;
    if mock {
        config = config.without_api_key();
    }
    Ok(WeatherAgent::new(config))
}

fn configure() -> anyhow::Result<()> {
    let api_key = Password::new("Gemini API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get one from https://aistudio.google.com/app/apikey")
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    let mut stored = StoredConfig::load()?;
    stored.set_api_key(api_key.to_string());
    let path = stored.save()?;

    println!("API key saved to {}", path.display());
    Ok(())
}
