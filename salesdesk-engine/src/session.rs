use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
        })
    }
}

/// How a `start_call` request was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A media session is open; `connected` follows the SDK's notification.
    Live,
    /// No live session; a timer will mark the call connected.
    Simulated,
    /// A call was already connecting or connected. Nothing changed.
    AlreadyActive,
    /// The call was ended before setup finished.
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("not connected")]
    NotConnected,

    #[error("message is empty")]
    EmptyMessage,
}

/// Display snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub label: String,
    pub headline: String,
    pub detail: String,
    pub muted: bool,
    pub listening: bool,
    pub agent_audio_tracks: u32,
    pub transcript_len: usize,
}

pub fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Disconnected => "Disconnected",
        SessionState::Connecting => "Connecting",
        SessionState::Connected => "Connected",
    }
}

pub fn state_headline(state: SessionState) -> (&'static str, &'static str) {
    match state {
        SessionState::Disconnected => (
            "Start Voice Session",
            "Click to begin conversation with AI sales agent",
        ),
        SessionState::Connecting => (
            "Connecting to Agent...",
            "Please wait while we establish connection",
        ),
        SessionState::Connected => (
            "Connected - Speak Naturally",
            "The AI agent is listening and ready to help",
        ),
    }
}
