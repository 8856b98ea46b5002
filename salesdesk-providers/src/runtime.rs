use crate::request::{Body, HttpRequest};
use anyhow::{Context, anyhow};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
// A dead backend must not leave a call stuck in "connecting".
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

fn header_map(headers: &[(String, String)]) -> anyhow::Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (k, v) in headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .with_context(|| format!("invalid header name: {k}"))?;
        let value =
            HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
        map.insert(name, value);
    }
    Ok(map)
}

pub async fn execute(req: &HttpRequest) -> anyhow::Result<HttpResponse> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("build http client")?;

    if req.method != "POST" {
        return Err(anyhow!("unsupported method: {}", req.method));
    }
    let mut builder = client.post(&req.url).headers(header_map(&req.headers)?);
    if let Body::Json(s) = &req.body {
        builder = builder.body(s.clone());
    }

    let resp = builder
        .send()
        .await
        .with_context(|| format!("{} {} failed", req.method, req.url))?;
    let status = resp.status().as_u16();
    let body = resp.bytes().await.context("read response body")?.to_vec();

    Ok(HttpResponse { status, body })
}
