use std::sync::Arc;

use anyhow::Context;
use salesdesk_core::config::DeveloperCredentials;
use thiserror::Error;

use crate::kv::{KEY_DEV_USER, KeyValueStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Gate in front of the developer screen.
///
/// This is a demo lock, not security: credentials are plain config values and
/// the session marker is just the username under `dev_user`.
pub struct DeveloperAuth {
    kv: Arc<dyn KeyValueStore>,
    credentials: DeveloperCredentials,
}

impl DeveloperAuth {
    pub fn new(kv: Arc<dyn KeyValueStore>, credentials: DeveloperCredentials) -> Self {
        Self { kv, credentials }
    }

    pub fn current_user(&self) -> anyhow::Result<Option<String>> {
        Ok(self.kv.get(KEY_DEV_USER)?.filter(|u| !u.is_empty()))
    }

    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if username != self.credentials.username || password != self.credentials.password {
            log::warn!("developer login rejected for {username:?}");
            return Err(AuthError::InvalidCredentials);
        }

        self.kv
            .set(KEY_DEV_USER, username)
            .context("store developer session")?;
        log::info!("developer {username} logged in");
        Ok(username.to_string())
    }

    pub fn logout(&self) -> anyhow::Result<()> {
        self.kv
            .delete(KEY_DEV_USER)
            .context("clear developer session")?;
        log::info!("developer logged out");
        Ok(())
    }
}
