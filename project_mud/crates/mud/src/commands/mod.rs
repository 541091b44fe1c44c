//! Command tables, one per session state. Each table starts from the base
//! commands and layers its own on top.

pub mod base;
pub mod logged_in;
pub mod logged_out;
pub mod playing;

use session::SessionState;

use crate::context::Session;
use crate::registry::CommandRegistry;

pub fn registry_for(state: SessionState) -> CommandRegistry<Session> {
    match state {
        SessionState::LoggedOut => logged_out::registry(),
        SessionState::LoggedIn => logged_in::registry(),
        SessionState::Playing => playing::registry(),
    }
}

/// Text shown on entering a state and again by `clear`.
pub fn welcome(state: SessionState) -> &'static str {
    match state {
        SessionState::LoggedOut => logged_out::WELCOME,
        SessionState::LoggedIn => logged_in::WELCOME,
        SessionState::Playing => playing::WELCOME,
    }
}
