//! Muhurto - a guided breathing coach server
//! 
//! This is the main entry point for the muhurto application.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use muhurto::{
    config::{Command, Config},
    state::{AppState, FileStore, Settings, SettingsStore},
    api::create_router,
    services::{AdvicePanel, AskAiProxy, GeminiClient, PanelOutcome, RecommendationClient},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("muhurto={},tower_http=info", config.log_level()))
        .init();

    match config.command.take() {
        Some(Command::Ask { query, endpoint, apply }) => ask(&config, &query, &endpoint, apply).await,
        None => serve(config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Starting muhurto server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, settings={}",
          config.host, config.port, config.settings_file.display());

    let proxy = match config.api_key() {
        Some(key) => {
            let client = GeminiClient::new(
                key,
                config.gemini_base_url.as_str(),
                config.gemini_model.as_str(),
                config.upstream_timeout(),
            )
            .context("failed to build upstream HTTP client")?;
            AskAiProxy::new(client)
        }
        None => {
            warn!("GEMINI_API_KEY is not set; the AI guide will be unavailable");
            AskAiProxy::unconfigured()
        }
    };

    let settings = SettingsStore::load(FileStore::new(&config.settings_file));

    // Create application state
    let state = Arc::new(AppState::new(settings, proxy, config.port, config.host.clone()));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await
        .with_context(|| format!("failed to bind {}", addr))?;
    
    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /ask-ai               - AI rhythm recommendation proxy");
    info!("  POST /session/start        - Start a breathing session");
    info!("  POST /session/toggle       - Start or stop the session");
    info!("  POST /session/stop         - Stop the session");
    info!("  GET  /session              - Current session state");
    info!("  GET  /session/plan         - Planned phase transitions");
    info!("  GET  /session/events       - Feedback event stream (SSE)");
    info!("  GET  /settings             - Current settings");
    info!("  POST /recommendation/apply - Apply a suggested rhythm");
    info!("  GET  /status               - Server status");
    info!("  GET  /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);
    
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to listen for shutdown signals: {}", e),
            }
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

async fn ask(config: &Config, query: &str, endpoint: &str, apply: bool) -> anyhow::Result<()> {
    let client = RecommendationClient::new(endpoint, config.upstream_timeout())
        .context("failed to build HTTP client")?;
    let panel = AdvicePanel::new(client);

    println!("{}", panel.open());

    match panel.ask(query).await {
        PanelOutcome::Recommended(recommendation) => {
            let rhythm = recommendation.settings;
            println!("{}", recommendation.recommendation_text);
            println!(
                "Rhythm: inhale {}s, hold {}s, exhale {}s, rest {}s, {} cycles",
                rhythm.inhale, rhythm.hold, rhythm.exhale, rhythm.rest, rhythm.total_cycles
            );

            if apply {
                Settings::validate_rhythm(&rhythm).context("refusing to apply rhythm")?;
                let mut settings = SettingsStore::load(FileStore::new(&config.settings_file));
                settings
                    .try_apply_rhythm(rhythm)
                    .context("failed to save settings")?;
                println!("Applied to {}", config.settings_file.display());
            }
            Ok(())
        }
        PanelOutcome::Failed(e) => anyhow::bail!(e.user_message()),
        PanelOutcome::Dismissed => Ok(()),
    }
}
