//! Sender state machine.
//!
//! Nothing here is stored: the state is derived per message from whether a
//! session exists and how long ago the sender last texted.

use std::time::Duration;

/// Where a sender stands when a message arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// No session yet.
    New,
    /// Texted within the inactivity window; NEXT continues the last search.
    Active,
    /// Idle for at least the inactivity window, or never marked active.
    Inactive,
}

impl SenderState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Classify a sender that already has a session.
///
/// An age equal to `threshold` is already inactive.
#[must_use]
pub fn classify(last_active_age: Option<Duration>, threshold: Duration) -> SenderState {
    match last_active_age {
        Some(age) if age < threshold => SenderState::Active,
        _ => SenderState::Inactive,
    }
}

/// What the sender asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// "next", in any case, surrounded by any whitespace.
    Next,
    /// Anything else is an address to search from.
    Search,
}

impl Intent {
    #[must_use]
    pub fn parse(body: &str) -> Self {
        if body.trim().eq_ignore_ascii_case("next") {
            Self::Next
        } else {
            Self::Search
        }
    }
}

/// The branch the orchestrator takes for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create the session and send the welcome text.
    Welcome,
    /// Send the welcome text; the search context expired.
    Help,
    NewSearch,
    ContinueSearch,
}

#[must_use]
pub fn decide(state: SenderState, intent: Intent) -> Action {
    match (state, intent) {
        (SenderState::New, _) => Action::Welcome,
        (SenderState::Active, Intent::Next) => Action::ContinueSearch,
        (SenderState::Inactive, Intent::Next) => Action::Help,
        (_, Intent::Search) => Action::NewSearch,
    }
}
