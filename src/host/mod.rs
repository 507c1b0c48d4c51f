//! Host layer - persistence and HTTP execution
//!
//! The Host actor receives `HostCommand` envelopes and sends back `HostEvent`s.

pub mod actor;
pub mod client;

pub use actor::HostActor;
