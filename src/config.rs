//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::{Parser, Subcommand};

use crate::services::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "muhurto")]
#[command(about = "A guided breathing coach server with an AI rhythm guide")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "8888")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// File the user's settings are persisted in
    #[arg(long, env = "MUHURTO_SETTINGS_FILE", default_value = "muhurto-settings.json")]
    pub settings_file: PathBuf,

    /// Credential for the generative AI upstream
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Base URL of the generative AI upstream
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    /// Model used for recommendations
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub gemini_model: String,

    /// Timeout for upstream requests in seconds
    #[arg(long, default_value = "20")]
    pub upstream_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask a running server's AI guide for a rhythm
    Ask {
        /// How you are feeling
        query: String,

        /// Proxy endpoint to query
        #[arg(long, default_value = "http://127.0.0.1:8888/ask-ai")]
        endpoint: String,

        /// Save the suggested rhythm to the settings file
        #[arg(long)]
        apply: bool,
    },
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// The upstream credential, if one is configured and non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
