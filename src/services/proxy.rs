//! `ask-ai` proxy: request validation, credential handling, shape enforcement

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::{parse_recommendation, GeminiClient, Recommendation};

/// Failures of a proxy call, grouped by how the client should treat them
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Method Not Allowed. Please use POST.")]
    MethodNotAllowed,
    #[error("Bad Request. \"query\" is required.")]
    BadRequest,
    #[error("AI credential is not configured")]
    MissingCredential,
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("upstream response was malformed: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    query: Option<String>,
}

/// Stateless proxy between the view and the upstream model
#[derive(Debug, Clone)]
pub struct AskAiProxy {
    upstream: Option<GeminiClient>,
}

impl AskAiProxy {
    /// Proxy without a credential; every valid request fails with 500
    pub fn unconfigured() -> Self {
        Self { upstream: None }
    }

    pub fn new(upstream: GeminiClient) -> Self {
        Self {
            upstream: Some(upstream),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.upstream.is_some()
    }

    /// Extract the mood query from a raw request body
    pub fn parse_query(body: &[u8]) -> Result<String, ProxyError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ProxyError::BadRequest);
        }
        let request: AskRequest = serde_json::from_slice(body).map_err(|_| ProxyError::BadRequest)?;
        request
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or(ProxyError::BadRequest)
    }

    /// Handle one proxy call from its raw JSON body
    pub async fn ask(&self, body: &[u8]) -> Result<Recommendation, ProxyError> {
        let query = Self::parse_query(body)?;
        let upstream = self.upstream.as_ref().ok_or(ProxyError::MissingCredential)?;

        let text = upstream.generate(&query).await?;
        let recommendation = parse_recommendation(&text)?;

        info!(
            "Recommended rhythm {}-{}-{}-{} x{}",
            recommendation.settings.inhale,
            recommendation.settings.hold,
            recommendation.settings.exhale,
            recommendation.settings.rest,
            recommendation.settings.total_cycles
        );
        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_required() {
        assert!(matches!(AskAiProxy::parse_query(b""), Err(ProxyError::BadRequest)));
        assert!(matches!(AskAiProxy::parse_query(b"{}"), Err(ProxyError::BadRequest)));
        assert!(matches!(AskAiProxy::parse_query(br#"{"query":"   "}"#), Err(ProxyError::BadRequest)));
        assert!(matches!(AskAiProxy::parse_query(br#"{"query":42}"#), Err(ProxyError::BadRequest)));
        assert!(matches!(AskAiProxy::parse_query(b"not json"), Err(ProxyError::BadRequest)));
    }

    #[test]
    fn query_is_trimmed() {
        let query = AskAiProxy::parse_query(br#"{"query":"  I can't sleep "}"#).unwrap();
        assert_eq!(query, "I can't sleep");
    }

    #[tokio::test]
    async fn missing_credential_is_reported_after_validation() {
        let proxy = AskAiProxy::unconfigured();
        assert!(matches!(proxy.ask(b"").await, Err(ProxyError::BadRequest)));
        assert!(matches!(
            proxy.ask(br#"{"query":"tired"}"#).await,
            Err(ProxyError::MissingCredential)
        ));
    }
}
