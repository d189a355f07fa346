//! Gemini generateContent client

use std::time::Duration;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::ProxyError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Client for the upstream model, holding the server-side credential
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Ask the model for a rhythm suggestion and return its raw text output
    pub async fn generate(&self, query: &str) -> Result<String, ProxyError> {
        debug!("Requesting rhythm recommendation from {}", self.model);

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(query))
            .send()
            .await
            // the URL carries the credential, keep it out of messages
            .map_err(|e| ProxyError::Upstream(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API request failed: {} {}", status, body);
            return Err(ProxyError::Upstream(format!("upstream returned {}", status)));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProxyError::MalformedResponse(e.without_url().to_string()))?;

        data.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProxyError::MalformedResponse("no candidate text in response".to_string()))
    }
}

fn system_prompt(query: &str) -> String {
    format!(
        r#"You are an API endpoint that turns how a person feels into a breathing exercise.
Reply with exactly one JSON object and nothing else: no prose, no markdown.
The object must have the shape {{ "recommendationText": string, "settings": {{ "inhale": number, "hold": number, "exhale": number, "rest": number, "totalCycles": number }} }}.
"recommendationText" is a short, warm message of at most 25 words written for this person: {query}
All "settings" values are whole numbers: "inhale" and "exhale" from 1 to 20 seconds, "hold" and "rest" from 0 to 20 seconds, "totalCycles" from 1 to 100.

Example for the input "I can't sleep":
{{"recommendationText": "To calm your mind for sleep, let's try the 4-7-8 breath. It is deeply relaxing.", "settings": {{"inhale": 4, "hold": 7, "exhale": 8, "rest": 0, "totalCycles": 10}}}}"#
    )
}

fn request_body(query: &str) -> Value {
    let number = json!({ "type": "NUMBER" });
    json!({
        "contents": [{ "parts": [{ "text": system_prompt(query) }] }],
        "generationConfig": {
            "response_mime_type": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "recommendationText": { "type": "STRING" },
                    "settings": {
                        "type": "OBJECT",
                        "properties": {
                            "inhale": number,
                            "hold": number,
                            "exhale": number,
                            "rest": number,
                            "totalCycles": number
                        },
                        "required": ["inhale", "hold", "exhale", "rest", "totalCycles"]
                    }
                },
                "required": ["recommendationText", "settings"]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key", server.uri(), DEFAULT_MODEL, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn request_embeds_query_and_schema() {
        let body = request_body("I feel anxious");
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("I feel anxious"));
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["recommendationText", "settings"])
        );
    }

    #[tokio::test]
    async fn extracts_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "{\"a\":1}" }] } }]
            })))
            .mount(&server)
            .await;

        let text = client(&server).generate("hello").await.unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let err = client(&server).generate("hello").await.unwrap_err();
        assert!(matches!(err, ProxyError::Upstream(_)));
    }

    #[tokio::test]
    async fn missing_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = client(&server).generate("hello").await.unwrap_err();
        assert!(matches!(err, ProxyError::MalformedResponse(_)));
    }
}
