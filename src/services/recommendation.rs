//! Recommendation payload and strict shape validation

use serde::{Deserialize, Serialize};

use super::ProxyError;
use crate::{engine::RhythmConfig, state::Settings};

/// Rhythm suggestion returned by the proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub recommendation_text: String,
    pub settings: RhythmConfig,
}

// Upstream numbers arrive as JSON numbers of any kind; validated below
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    recommendation_text: String,
    settings: RawSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    inhale: f64,
    hold: f64,
    exhale: f64,
    rest: f64,
    total_cycles: f64,
}

fn whole_seconds(name: &str, value: f64) -> Result<u32, ProxyError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(ProxyError::MalformedResponse(format!(
            "{} must be a non-negative whole number, got {}",
            name, value
        )));
    }
    Ok(value as u32)
}

/// Parse the model's text output into a recommendation
///
/// Anything that is not exactly the expected shape is rejected; nothing
/// from a non-conforming payload is passed on.
pub fn parse_recommendation(text: &str) -> Result<Recommendation, ProxyError> {
    let raw: RawRecommendation = serde_json::from_str(text.trim())
        .map_err(|e| ProxyError::MalformedResponse(format!("not a recommendation object: {}", e)))?;

    if raw.recommendation_text.trim().is_empty() {
        return Err(ProxyError::MalformedResponse("empty recommendationText".to_string()));
    }

    let s = raw.settings;
    let settings = RhythmConfig::new(
        whole_seconds("inhale", s.inhale)?,
        whole_seconds("hold", s.hold)?,
        whole_seconds("exhale", s.exhale)?,
        whole_seconds("rest", s.rest)?,
        whole_seconds("totalCycles", s.total_cycles)?,
    );
    Settings::validate_rhythm(&settings)
        .map_err(|e| ProxyError::MalformedResponse(e.to_string()))?;

    Ok(Recommendation {
        recommendation_text: raw.recommendation_text.trim().to_string(),
        settings,
    })
}
