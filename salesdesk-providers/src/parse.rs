use anyhow::{Context, anyhow};
use serde::Deserialize;

/// Grant returned by the call-setup endpoint.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallResponse {
    pub token: String,
    pub ws_url: String,
}

impl std::fmt::Debug for StartCallResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartCallResponse")
            .field("token", &"[REDACTED]")
            .field("ws_url", &self.ws_url)
            .finish()
    }
}

pub fn parse_start_call_response(body: &[u8]) -> anyhow::Result<StartCallResponse> {
    let resp: StartCallResponse =
        serde_json::from_slice(body).context("decode start-call JSON")?;
    if resp.token.trim().is_empty() {
        return Err(anyhow!("start-call response has an empty token"));
    }
    if resp.ws_url.trim().is_empty() {
        return Err(anyhow!("start-call response has an empty wsUrl"));
    }
    Ok(resp)
}
