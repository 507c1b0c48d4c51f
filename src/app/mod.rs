//! App layer - central state management and command processing
//!
//! The App actor receives UI events and host events,
//! updates state, and emits host commands and render state.

pub mod actor;
pub mod commands;
pub mod state;

pub use actor::AppActor;
pub use state::AppState;
