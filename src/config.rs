//! Server configuration from environment variables.

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the server listens on
    pub port: u16,
}

impl Config {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        // 7655 spells "poll" on a phone keypad.
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7655);

        Self { port }
    }
}
