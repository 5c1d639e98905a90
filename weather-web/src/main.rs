use anyhow::Context;
use clap::Parser;
use tracing::info;
use weather_core::{AgentConfig, WeatherAgent};
use weather_web::{AppState, build_router};

#[derive(Debug, Parser)]
#[command(name = "weather-web", version, about = "Web chat for the weather agent")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "WEATHER_WEB_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "WEATHER_WEB_PORT", default_value_t = 8501)]
    port: u16,

    /// Ignore any configured API key and answer locally.
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // A broken config is reported in the page instead of stopping the server.
    let agent = AgentConfig::load()
        .map(|cfg| if args.mock { cfg.without_api_key() } else { cfg })
        .map(WeatherAgent::new)
        .map_err(|err| {
            tracing::error!(error = %format!("{err:#}"), "Failed to initialize Weather Agent");
            format!("{err:#}")
        });

    if let Ok(agent) = &agent {
        info!(mode = %agent.mode(), "agent ready");
    }

    let app = build_router(AppState::new(agent));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Weather web chat listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Server error")?;

    Ok(())
}
