use async_trait::async_trait;
use salesdesk_core::offer::{AgentConfig, SalesOffer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Everything the backend needs to configure the agent for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSetupRequest {
    pub agent: AgentConfig,
    pub offer: SalesOffer,
}

/// Credentials for joining a real-time media session.
#[derive(Clone, PartialEq, Eq)]
pub struct CallGrant {
    pub token: String,
    pub ws_url: String,
}

impl std::fmt::Debug for CallGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGrant")
            .field("token", &"[REDACTED]")
            .field("ws_url", &self.ws_url)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("call setup request failed: {0}")]
    Transport(String),

    #[error("call setup rejected with status {status}")]
    Rejected { status: u16 },

    #[error("invalid call setup response: {0}")]
    InvalidResponse(String),

    #[error("media session failed: {0}")]
    Media(String),
}

#[async_trait]
pub trait CallSetup: Send + Sync {
    async fn request_session(&self, request: &CallSetupRequest) -> Result<CallGrant, ConnectError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Notifications a media session pushes while it is alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    Connected,
    Disconnected,
    TrackSubscribed { kind: TrackKind, participant: String },
}

/// Opens sessions on the external real-time media SDK.
#[async_trait]
pub trait MediaConnector: Send + Sync {
    async fn connect(
        &self,
        grant: &CallGrant,
        events: UnboundedSender<MediaEvent>,
    ) -> anyhow::Result<Box<dyn MediaSession>>;
}

#[async_trait]
pub trait MediaSession: Send + Sync {
    async fn disconnect(&self) -> anyhow::Result<()>;
}

/// Chooses which canned reply the simulated agent sends next.
pub trait ReplyPicker: Send + Sync {
    /// Returns an index below `count`, or `None` when there is nothing to pick.
    fn pick(&self, count: usize) -> Option<usize>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomReplyPicker;

impl ReplyPicker for RandomReplyPicker {
    fn pick(&self, count: usize) -> Option<usize> {
        use rand::Rng;
        (count > 0).then(|| rand::thread_rng().gen_range(0..count))
    }
}
