// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod error;
pub mod protocol;
pub mod publish;
pub mod state;
pub mod types;
pub mod watcher;
pub mod window;
pub mod ws;
