//! External service module
//!
//! This module contains the generative AI upstream client, the `ask-ai`
//! proxy built on it, and the client used to consume that proxy.

pub mod advice;
pub mod gemini;
pub mod proxy;
pub mod recommendation;

// Re-export main types
pub use advice::{AdviceError, AdvicePanel, PanelOutcome, RecommendationClient};
pub use gemini::GeminiClient;
pub use proxy::{AskAiProxy, ProxyError};
pub use recommendation::{parse_recommendation, Recommendation};

/// Message shown to the user whenever the AI guide cannot answer
pub const UNAVAILABLE_MESSAGE: &str = "The AI guide is currently unavailable. Please try again later.";
