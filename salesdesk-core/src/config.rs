use crate::offer::{AgentProfile, SalesOffer};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub offer: SalesOffer,
    pub agent: AgentProfile,
    pub call: CallSettings,
    pub developer: DeveloperCredentials,
}

/// What to do when the call-setup request or the media connect fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Pretend the call connected, using the timer path.
    #[default]
    MockSuccess,
    /// Try the whole setup up to `attempts` times before giving up.
    Retry { attempts: u32, backoff_ms: u64 },
    Propagate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallSettings {
    // Unset means there is no backend: calls always use the timer path.
    pub start_call_url: Option<String>,
    pub connect_delay_ms: u64,
    pub reply_delay_ms: u64,
    pub listening_interval_ms: u64,
    pub on_failure: FailurePolicy,
    pub greeting: String,
    pub developer_greeting: String,
    pub replies: Vec<String>,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            start_call_url: None,
            connect_delay_ms: 2000,
            reply_delay_ms: 1000,
            listening_interval_ms: 2000,
            on_failure: FailurePolicy::MockSuccess,
            greeting: "Hello! I'm your AI Sales Assistant. How can I help you today?".into(),
            developer_greeting: "Developer mode: AI Sales Assistant connected".into(),
            replies: vec![
                "I understand your concern. Let me explain how our solution addresses that specific challenge.".into(),
                "That's a great question! Our Premium CRM Suite actually helps with exactly that issue.".into(),
                "I can see why that would be important to your business. Here's how we handle that...".into(),
                "Excellent point. Many of our clients had the same consideration before making the switch.".into(),
            ],
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeveloperCredentials {
    pub username: String,
    pub password: String,
}

impl Default for DeveloperCredentials {
    fn default() -> Self {
        Self {
            username: "developer".into(),
            password: "sales123".into(),
        }
    }
}

impl fmt::Debug for DeveloperCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeveloperCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{"call":{"connect_delay_ms":10,"on_failure":{"mode":"retry","attempts":3,"backoff_ms":50}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.call.connect_delay_ms, 10);
        assert_eq!(cfg.call.reply_delay_ms, 1000);
        assert_eq!(
            cfg.call.on_failure,
            FailurePolicy::Retry {
                attempts: 3,
                backoff_ms: 50
            }
        );
        assert_eq!(cfg.call.replies.len(), 4);
        assert_eq!(cfg.offer.product_name, "Premium CRM Suite");
    }

    #[test]
    fn debug_redacts_developer_password() {
        let s = format!("{:?}", DeveloperCredentials::default());
        assert!(!s.contains("sales123"));
        assert!(s.contains("[REDACTED]"));
    }
}
