//! Message types for inter-layer communication in the actor-based architecture.
//!
//! This module defines all messages that flow between the UI, App, and Host layers.

pub mod host;
pub mod render;
pub mod ui_events;

pub use host::{Execution, HostCommand, HostEvent, Notification, NotificationLevel};
pub use render::RenderState;
pub use ui_events::UiEvent;
