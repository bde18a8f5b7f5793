//! Push lifecycle
//!
//! Maps source registration changes onto egress sessions:
//! - a matching "registered" event creates and publishes one session
//! - a matching "unregistered" event releases it
//! - publish results and shutdowns are reported, never fatal
//!
//! The orchestrator owns a [`ManagedSource`] whose session slot holds at
//! most one session at any time.

pub mod event;
pub mod orchestrator;
pub mod source;
pub mod state;

pub use event::{PushEvent, SessionId};
pub use orchestrator::{PushHandle, PushOrchestrator};
pub use source::ManagedSource;
pub use state::PushState;
