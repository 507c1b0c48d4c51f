//! # Jarvis
//!
//! A terminal HTTP API client, similar to Postman/Insomnia.
//!
//! ## Features
//! - HTTP methods: GET, POST, PUT, DELETE, PATCH, OPTIONS
//! - Query params, headers, JSON/raw/form bodies
//! - Auth support (Basic, Bearer, API key, OAuth 2.0 token)
//! - Collections with nested folders, request history
//! - Environments with `{{variable}}` substitution
//! - cURL import, code export (cURL, fetch, axios, Node http)
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Host Layer (persistence and HTTP execution on the Tokio runtime)

pub mod app;
pub mod codegen;
pub mod collections;
pub mod config;
pub mod constants;
pub mod curl;
pub mod history;
pub mod host;
pub mod messages;
pub mod models;
pub mod request;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use codegen::{generate, CodeFormat};
pub use config::Config;
pub use curl::parse_curl;
pub use history::History;
pub use host::HostActor;
pub use messages::{HostCommand, HostEvent, RenderState, UiEvent};
pub use models::{ApiRequest, ApiResponse, Collection, Environment, HistoryEntry, HttpMethod};
pub use storage::Storage;
