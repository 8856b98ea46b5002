use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Body {
    Empty,
    Json(String),
}

/// Transport-neutral description of one outbound call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl HttpRequest {
    pub fn post_json<T: Serialize>(url: impl Into<String>, payload: &T) -> anyhow::Result<Self> {
        Ok(Self {
            method: "POST".into(),
            url: url.into(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Body::Json(serde_json::to_string(payload)?),
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn is_secret_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    matches!(lower.as_str(), "authorization" | "cookie")
        || lower.contains("token")
        || lower.contains("api-key")
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let shown = if is_secret_header(k) { "[REDACTED]" } else { v.as_str() };
                (k.as_str(), shown)
            })
            .collect();

        // Call-setup bodies carry the whole sales prompt; size only.
        let body = match &self.body {
            Body::Empty => "Empty".to_string(),
            Body::Json(s) => format!("Json(len={})", s.len()),
        };

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &body)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_json_sets_content_type() {
        let req = HttpRequest::post_json("https://example.com/start-call", &[1, 2, 3]).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
        assert_eq!(req.body, Body::Json("[1,2,3]".into()));
    }

    #[test]
    fn debug_hides_credentials_and_prompt() {
        let mut req = HttpRequest::post_json(
            "https://example.com/start-call",
            &serde_json::json!({"agentConfig": {"instructions": "top secret pitch"}}),
        )
        .unwrap();
        req.headers
            .push(("Authorization".into(), "Bearer secret-1".into()));
        req.headers
            .push(("X-Session-Token".into(), "secret-2".into()));

        let s = format!("{req:?}");
        assert!(!s.contains("secret-1"));
        assert!(!s.contains("secret-2"));
        assert!(!s.contains("top secret pitch"));
        assert!(s.contains("application/json"));
        assert!(s.contains("Json(len="));
    }
}
