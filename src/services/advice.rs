//! Client side of the `ask-ai` proxy

use std::{
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Duration,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Recommendation, UNAVAILABLE_MESSAGE};

/// Greeting shown when the AI panel opens
pub const WELCOME_MESSAGE: &str =
    "Tell me how you're feeling, and I'll suggest a breathing rhythm to help.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdviceError {
    #[error("Please tell me how you are feeling first.")]
    EmptyQuery,
    /// The proxy answered with a structured `{error}` payload
    #[error("{0}")]
    Declined(String),
    /// Network failure, timeout or an unreadable reply
    #[error("The AI guide is currently unavailable. Please try again later.")]
    Unavailable,
}

impl AdviceError {
    /// Text to show the user
    pub fn user_message(&self) -> String {
        match self {
            AdviceError::Unavailable => UNAVAILABLE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProxyReply {
    Failure { error: String },
    Success(Recommendation),
}

/// Sends mood queries to the proxy endpoint
#[derive(Debug, Clone)]
pub struct RecommendationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RecommendationClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Ask the proxy for a rhythm matching `query`
    pub async fn ask(&self, query: &str) -> Result<Recommendation, AdviceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdviceError::EmptyQuery);
        }

        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| {
                warn!("Error fetching AI response: {}", e);
                AdviceError::Unavailable
            })?;

        let status = response.status();
        let reply: ProxyReply = response.json().await.map_err(|e| {
            warn!("Unreadable AI response ({}): {}", status, e);
            AdviceError::Unavailable
        })?;

        match reply {
            ProxyReply::Success(recommendation) => Ok(recommendation),
            ProxyReply::Failure { error } => {
                debug!("AI proxy declined ({}): {}", status, error);
                Err(AdviceError::Declined(error))
            }
        }
    }
}

/// What the AI panel should display after a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelOutcome {
    Recommended(Recommendation),
    Failed(AdviceError),
    /// The panel was closed or reopened while the request was in flight
    Dismissed,
}

/// AI panel with a guard against responses arriving after dismissal
#[derive(Debug)]
pub struct AdvicePanel {
    client: RecommendationClient,
    generation: AtomicU64,
    open: AtomicBool,
}

impl AdvicePanel {
    pub fn new(client: RecommendationClient) -> Self {
        Self {
            client,
            generation: AtomicU64::new(0),
            open: AtomicBool::new(false),
        }
    }

    /// Open the panel and return its greeting
    pub fn open(&self) -> &'static str {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        WELCOME_MESSAGE
    }

    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub async fn ask(&self, query: &str) -> PanelOutcome {
        if !self.is_open() {
            return PanelOutcome::Dismissed;
        }

        let token = self.generation.load(Ordering::SeqCst);
        let result = self.client.ask(query).await;

        if self.generation.load(Ordering::SeqCst) != token {
            debug!("Discarding AI response for a dismissed panel");
            return PanelOutcome::Dismissed;
        }

        match result {
            Ok(recommendation) => PanelOutcome::Recommended(recommendation),
            Err(e) => PanelOutcome::Failed(e),
        }
    }
}
