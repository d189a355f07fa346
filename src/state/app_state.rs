//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use tracing::info;

use super::{SessionState, Settings, SettingsStore};
use crate::{
    feedback::{BroadcastFeedback, FeedbackSink, TracingFeedback},
    services::AskAiProxy,
    session::SessionController,
};

/// Buffered feedback events per subscribed view
const FEEDBACK_CHANNEL_CAPACITY: usize = 64;

/// Application state shared by all handlers
#[derive(Debug)]
pub struct AppState {
    /// The single breathing session
    pub session: SessionController,
    /// Persisted user preferences
    pub settings: Mutex<SettingsStore>,
    /// Feedback stream consumed by connected views
    pub feedback: BroadcastFeedback,
    /// Proxy to the generative AI upstream
    pub proxy: AskAiProxy,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    /// Create the application state with a fresh idle session
    pub fn new(settings: SettingsStore, proxy: AskAiProxy, port: u16, host: String) -> Self {
        let feedback = BroadcastFeedback::new(FEEDBACK_CHANNEL_CAPACITY);
        let sinks: Vec<Arc<dyn FeedbackSink>> =
            vec![Arc::new(TracingFeedback), Arc::new(feedback.clone())];

        Self {
            session: SessionController::new(sinks),
            settings: Mutex::new(settings),
            feedback,
            proxy,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    /// Run a closure against the settings store
    pub fn with_settings<F, R>(&self, f: F) -> Result<R, String>
    where
        F: FnOnce(&mut SettingsStore) -> R,
    {
        let mut store = self.settings.lock()
            .map_err(|e| format!("Failed to lock settings store: {}", e))?;
        Ok(f(&mut store))
    }

    /// Get a copy of the current settings
    pub fn get_settings(&self) -> Result<Settings, String> {
        self.with_settings(|store| store.settings().clone())
    }

    /// Start a session from a snapshot of the current settings
    pub fn start_session(&self) -> Result<SessionState, String> {
        let (rhythm, cues) = self.with_settings(|store| (store.rhythm(), store.cue_preferences()))?;
        Ok(self.session.start(rhythm, cues))
    }

    /// Start or stop the session depending on whether it is active
    pub fn toggle_session(&self) -> Result<SessionState, String> {
        let (rhythm, cues) = self.with_settings(|store| (store.rhythm(), store.cue_preferences()))?;
        Ok(self.session.toggle(rhythm, cues))
    }

    /// Flip voice guidance, confirming out loud when it turns on
    pub fn toggle_voice(&self) -> Result<Settings, String> {
        let (enabled, settings) = self.with_settings(|store| {
            let enabled = store.toggle_voice();
            (enabled, store.settings().clone())
        })?;

        if enabled {
            self.session.announce("Voice guidance enabled.");
        }
        Ok(settings)
    }

    /// Stop any running session, e.g. on shutdown
    pub fn shutdown(&self) {
        info!("Stopping session for shutdown");
        self.session.stop();
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;
        
        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
