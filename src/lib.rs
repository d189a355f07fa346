//! Muhurto - a guided breathing coach
//! 
//! This library provides the breathing phase scheduler, the session
//! controller that drives feedback at each phase, persisted user settings,
//! and a proxy that turns a mood into an AI-suggested rhythm.

pub mod config;
pub mod engine;
pub mod feedback;
pub mod state;
pub mod session;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::RhythmConfig;
pub use session::SessionController;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
