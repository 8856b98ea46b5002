use salesdesk_engine::traits::{
    CallGrant, CallSetup, CallSetupRequest, ConnectError, MediaConnector, MediaEvent,
    MediaSession,
};
use salesdesk_providers::parse::parse_start_call_response;
use salesdesk_providers::runtime;
use salesdesk_providers::start_call::build_start_call_request;
use tokio::sync::mpsc::UnboundedSender;

/// Asks the dashboard backend for a media-session grant over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCallSetup {
    url: String,
}

impl HttpCallSetup {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait::async_trait]
impl CallSetup for HttpCallSetup {
    async fn request_session(&self, request: &CallSetupRequest) -> Result<CallGrant, ConnectError> {
        let req = build_start_call_request(&self.url, &request.agent, &request.offer)
            .map_err(|e| ConnectError::Transport(format!("{e:#}")))?;
        log::debug!("start-call request: {req:?}");

        let resp = runtime::execute(&req)
            .await
            .map_err(|e| ConnectError::Transport(format!("{e:#}")))?;
        if !resp.is_success() {
            log::warn!(
                "start-call rejected: status={} body={}",
                resp.status,
                String::from_utf8_lossy(&resp.body)
            );
            return Err(ConnectError::Rejected {
                status: resp.status,
            });
        }

        let parsed = parse_start_call_response(&resp.body)
            .map_err(|e| ConnectError::InvalidResponse(format!("{e:#}")))?;
        Ok(CallGrant {
            token: parsed.token,
            ws_url: parsed.ws_url,
        })
    }
}

/// Stand-in for builds that ship without a real-time media SDK.
///
/// Every connect fails, so the simulator's failure policy decides what the
/// user sees.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMediaSdk;

#[async_trait::async_trait]
impl MediaConnector for NoMediaSdk {
    async fn connect(
        &self,
        grant: &CallGrant,
        _events: UnboundedSender<MediaEvent>,
    ) -> anyhow::Result<Box<dyn MediaSession>> {
        Err(anyhow::anyhow!(
            "no real-time media SDK in this build (cannot join {})",
            grant.ws_url
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesdesk_core::offer::{AgentConfig, AgentProfile, SalesOffer};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CallSetupRequest {
        CallSetupRequest {
            agent: AgentConfig::from_profile(&AgentProfile::default(), "Close the deal."),
            offer: SalesOffer::default(),
        }
    }

    #[tokio::test]
    async fn returns_grant_from_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/start-call"))
            .and(body_partial_json(serde_json::json!({
                "agentConfig": { "instructions": "Close the deal." },
                "currentOffer": { "productName": "Premium CRM Suite" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"token":"tok-1","wsUrl":"wss://rtc.example.com"}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let setup = HttpCallSetup::new(format!("{}/start-call", server.uri()));
        let grant = setup.request_session(&request()).await.unwrap();
        assert_eq!(grant.token, "tok-1");
        assert_eq!(grant.ws_url, "wss://rtc.example.com");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/start-call"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let setup = HttpCallSetup::new(format!("{}/start-call", server.uri()));
        let err = setup.request_session(&request()).await.unwrap_err();
        assert!(matches!(err, ConnectError::Rejected { status: 500 }));
    }

    #[tokio::test]
    async fn malformed_body_is_an_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/start-call"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let setup = HttpCallSetup::new(format!("{}/start-call", server.uri()));
        let err = setup.request_session(&request()).await.unwrap_err();
        assert!(matches!(err, ConnectError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let setup = HttpCallSetup::new("http://127.0.0.1:9/start-call");
        let err = setup.request_session(&request()).await.unwrap_err();
        assert!(matches!(err, ConnectError::Transport(_)));
    }

    #[tokio::test]
    async fn missing_sdk_always_fails_to_connect() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let grant = CallGrant {
            token: "t".into(),
            ws_url: "wss://rtc.example.com".into(),
        };
        assert!(NoMediaSdk.connect(&grant, tx).await.is_err());
    }
}
