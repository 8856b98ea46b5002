use crate::request::HttpRequest;
use salesdesk_core::offer::{AgentConfig, SalesOffer};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartCallPayload<'a> {
    agent_config: &'a AgentConfig,
    current_offer: &'a SalesOffer,
}

/// Builds the request that asks the backend for a media-session grant.
pub fn build_start_call_request(
    url: &str,
    agent: &AgentConfig,
    offer: &SalesOffer,
) -> anyhow::Result<HttpRequest> {
    HttpRequest::post_json(
        url,
        &StartCallPayload {
            agent_config: agent,
            current_offer: offer,
        },
    )
}
