//! Push state machine
//!
//! ```text
//! Unregistered --(registered, scheme matches)--> Publishing   [create session]
//! Publishing   --(unregistered, bound source)--> Unregistered [release session]
//! Publishing   --(registered)------------------> Publishing   [no-op]
//! Unregistered --(unregistered)----------------> Unregistered [no-op]
//! Publishing   --(session shutdown)------------> Interrupted  [keep slot]
//! Publishing   --(notifications lagged)--------> Interrupted  [keep slot]
//! Interrupted  --(any matching registration)---> reconciled   [release, then
//!                                                              as Unregistered]
//! ```

/// Push lifecycle state of a managed source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    /// No session
    Unregistered,
    /// A session exists and has not reported a shutdown
    Publishing,
    /// The session reported a shutdown or registration notifications were
    /// lost; it is released on the next registration event for this source
    Interrupted,
}

impl std::fmt::Display for PushState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PushState::Unregistered => "unregistered",
            PushState::Publishing => "publishing",
            PushState::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}
